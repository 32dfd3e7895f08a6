/// Pixels from the viewport bottom at which the next page is requested.
pub const LOAD_THRESHOLD_PX: u32 = 300;

/// Infinite-scroll pager.
///
/// Tracks the current page and a latched "has more" flag: once a short page
/// or an explicit end flag arrives, the widget stops permanently. Scrolling
/// back up never reduces the loaded page count.
#[derive(Debug)]
pub struct InfiniteScroll {
    page: u64,
    page_size: u64,
    has_more: bool,
    loading: bool,
}

impl InfiniteScroll {
    #[must_use]
    pub const fn new(page_size: u64) -> Self {
        Self {
            page: 0,
            page_size,
            has_more: true,
            loading: false,
        }
    }

    #[must_use]
    pub const fn loaded_pages(&self) -> u64 {
        self.page
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Scroll position changed. Returns the page number to fetch when the
    /// viewport is near the bottom and no fetch is already in flight.
    pub fn on_scroll(&mut self, distance_to_bottom_px: u32) -> Option<u64> {
        if !self.has_more || self.loading || distance_to_bottom_px > LOAD_THRESHOLD_PX {
            return None;
        }

        self.loading = true;
        Some(self.page + 1)
    }

    /// A page response arrived. A short page or an explicit end flag latches
    /// the widget into its terminal state.
    pub fn on_page_loaded(&mut self, item_count: u64, end_flag: bool) {
        self.loading = false;
        self.page += 1;

        if end_flag || item_count < self.page_size {
            self.has_more = false;
        }
    }

    /// The fetch failed; allow a retry on the next scroll event.
    pub fn on_page_failed(&mut self) {
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetches_next_page_near_bottom() {
        let mut scroll = InfiniteScroll::new(20);
        assert_eq!(scroll.on_scroll(100), Some(1));
    }

    #[test]
    fn far_from_bottom_does_nothing() {
        let mut scroll = InfiniteScroll::new(20);
        assert_eq!(scroll.on_scroll(LOAD_THRESHOLD_PX + 1), None);
    }

    #[test]
    fn no_duplicate_fetch_while_loading() {
        let mut scroll = InfiniteScroll::new(20);
        assert_eq!(scroll.on_scroll(0), Some(1));
        assert_eq!(scroll.on_scroll(0), None);

        scroll.on_page_loaded(20, false);
        assert_eq!(scroll.on_scroll(0), Some(2));
    }

    #[test]
    fn short_page_stops_permanently() {
        let mut scroll = InfiniteScroll::new(20);
        scroll.on_scroll(0);
        scroll.on_page_loaded(7, false);

        assert!(!scroll.has_more());
        assert_eq!(scroll.on_scroll(0), None);
        assert_eq!(scroll.loaded_pages(), 1);
    }

    #[test]
    fn end_flag_stops_even_on_a_full_page() {
        let mut scroll = InfiniteScroll::new(20);
        scroll.on_scroll(0);
        scroll.on_page_loaded(20, true);

        assert!(!scroll.has_more());
    }

    #[test]
    fn failure_allows_retry() {
        let mut scroll = InfiniteScroll::new(20);
        assert_eq!(scroll.on_scroll(0), Some(1));
        scroll.on_page_failed();
        assert_eq!(scroll.on_scroll(0), Some(1));
    }
}
