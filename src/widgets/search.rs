use serde::Serialize;

/// Debounce window between the last keystroke and the fetch it triggers.
pub const DEBOUNCE_MS: u64 = 300;

/// Filter set sent to the product listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchFilters {
    pub query: String,
    pub category_id: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock: bool,
    pub sort: Option<String>,
}

impl SearchFilters {
    /// Query string for the listing endpoint, in a stable order.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();

        if !self.query.trim().is_empty() {
            parts.push(format!("search={}", urlencoding::encode(self.query.trim())));
        }
        if let Some(id) = self.category_id {
            parts.push(format!("category={id}"));
        }
        if let Some(min) = self.min_price {
            parts.push(format!("min_price={min}"));
        }
        if let Some(max) = self.max_price {
            parts.push(format!("max_price={max}"));
        }
        if self.in_stock {
            parts.push("in_stock=true".to_string());
        }
        if let Some(sort) = &self.sort {
            parts.push(format!("sort={sort}"));
        }

        parts.join("&")
    }
}

/// A fetch the widget wants issued. `seq` tags the eventual response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query_string: String,
}

/// Minimal product data the result list renders.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub in_stock: bool,
}

/// Search/filter widget.
///
/// Keystrokes arm a debounce deadline; `tick` fires the fetch once the
/// deadline passes. Responses carry the sequence number of the request that
/// produced them, and a response older than the newest applied one is
/// dropped, so a slow early response can never overwrite fresher results.
#[derive(Debug, Default)]
pub struct SearchWidget {
    filters: SearchFilters,
    due_at: Option<u64>,
    next_seq: u64,
    applied_seq: u64,
    results: Vec<ProductCard>,
}

impl SearchWidget {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    /// Text input changed; (re)arm the debounce window.
    pub fn input_changed(&mut self, text: &str, now_ms: u64) {
        self.filters.query = text.to_string();
        self.due_at = Some(now_ms + DEBOUNCE_MS);
    }

    /// A filter control changed; fires on the next tick without debounce.
    pub fn filters_changed(&mut self, filters: SearchFilters, now_ms: u64) {
        self.filters = filters;
        self.due_at = Some(now_ms);
    }

    /// Advance time. Returns the fetch to issue once the debounce deadline
    /// has passed.
    pub fn tick(&mut self, now_ms: u64) -> Option<FetchRequest> {
        let due = self.due_at?;
        if now_ms < due {
            return None;
        }

        self.due_at = None;
        self.next_seq += 1;
        Some(FetchRequest {
            seq: self.next_seq,
            query_string: self.filters.to_query_string(),
        })
    }

    /// Apply a response. Returns false (and changes nothing) when the
    /// response is stale, i.e. an earlier request resolving late.
    pub fn response(&mut self, seq: u64, results: Vec<ProductCard>) -> bool {
        if seq <= self.applied_seq {
            return false;
        }

        self.applied_seq = seq;
        self.results = results;
        true
    }

    /// Render the result container fragment.
    #[must_use]
    pub fn render(&self) -> String {
        if self.results.is_empty() {
            return "<div class=\"results empty\">No products found</div>".to_string();
        }

        let mut out = String::from("<div class=\"results\">");
        for card in &self.results {
            let stock = if card.in_stock { "" } else { " out-of-stock" };
            out.push_str(&format!(
                "<article class=\"product{stock}\" data-id=\"{}\"><img src=\"/uploads/{}\" alt=\"\"><h3>{}</h3><p class=\"price\">${:.2}</p></article>",
                card.id,
                html_escape::encode_double_quoted_attribute(&card.image),
                html_escape::encode_text(&card.name),
                card.price,
            ));
        }
        out.push_str("</div>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i32, name: &str) -> ProductCard {
        ProductCard {
            id,
            name: name.to_string(),
            price: 25.0,
            image: "a.jpg".to_string(),
            in_stock: true,
        }
    }

    #[test]
    fn debounce_delays_the_fetch() {
        let mut widget = SearchWidget::new();
        widget.input_changed("bob", 1000);

        assert!(widget.tick(1100).is_none());
        let request = widget.tick(1300).unwrap();
        assert_eq!(request.seq, 1);
        assert_eq!(request.query_string, "search=bob");
    }

    #[test]
    fn retyping_rearms_the_debounce() {
        let mut widget = SearchWidget::new();
        widget.input_changed("b", 1000);
        widget.input_changed("bo", 1200);

        assert!(widget.tick(1350).is_none());
        assert!(widget.tick(1500).is_some());
    }

    #[test]
    fn stale_response_is_dropped() {
        let mut widget = SearchWidget::new();

        widget.input_changed("bob", 0);
        let first = widget.tick(300).unwrap();

        widget.input_changed("bobs", 400);
        let second = widget.tick(700).unwrap();
        assert!(second.seq > first.seq);

        // The newer request resolves first.
        assert!(widget.response(second.seq, vec![card(2, "Bobs Deluxe")]));
        // The older one straggles in afterwards and must not win.
        assert!(!widget.response(first.seq, vec![card(1, "Bob")]));

        assert!(widget.render().contains("Bobs Deluxe"));
    }

    #[test]
    fn filter_query_string_is_stable() {
        let filters = SearchFilters {
            query: "lace front".to_string(),
            category_id: Some(2),
            min_price: Some(10.0),
            max_price: None,
            in_stock: true,
            sort: Some("price_asc".to_string()),
        };

        assert_eq!(
            filters.to_query_string(),
            "search=lace%20front&category=2&min_price=10&in_stock=true&sort=price_asc"
        );
    }

    #[test]
    fn render_escapes_product_names() {
        let mut widget = SearchWidget::new();
        widget.input_changed("x", 0);
        let request = widget.tick(300).unwrap();
        widget.response(request.seq, vec![card(1, "<script>alert(1)</script>")]);

        let html = widget.render();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
    }

    #[test]
    fn empty_results_render_placeholder() {
        let widget = SearchWidget::new();
        assert!(widget.render().contains("No products found"));
    }
}
