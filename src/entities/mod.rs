pub mod prelude;

pub mod admin_activity_log;
pub mod admin_password_resets;
pub mod admins;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod user_activity_log;
pub mod users;
