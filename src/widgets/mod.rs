//! Storefront widget state machines.
//!
//! Each widget holds its state explicitly and exposes event methods plus a
//! `render(state)`-style function producing an HTML fragment, so behavior is
//! testable without a browser. The server returns these fragments to the
//! thin client shell, which swaps them into the page.

pub mod cart;
pub mod compare;
pub mod scroll;
pub mod search;

pub use cart::{CartAction, CartEffect, CartNotifier};
pub use compare::{ComparisonTray, ProductSnapshot, ToggleOutcome};
pub use scroll::InfiniteScroll;
pub use search::{FetchRequest, ProductCard, SearchFilters, SearchWidget};
