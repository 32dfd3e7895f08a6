use serde::{Deserialize, Serialize};

use crate::constants::limits::COMPARE_MAX;

/// Product fields captured when a product joins the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub hair_type: Option<String>,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The tray already holds the maximum number of products.
    Full,
}

/// Bounded comparison tray, persisted to client-local storage as JSON.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ComparisonTray {
    items: Vec<ProductSnapshot>,
}

impl ComparisonTray {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, product_id: i32) -> bool {
        self.items.iter().any(|p| p.id == product_id)
    }

    /// Toggle a product's membership. Adding past the bound is refused.
    pub fn toggle(&mut self, snapshot: ProductSnapshot) -> ToggleOutcome {
        if let Some(pos) = self.items.iter().position(|p| p.id == snapshot.id) {
            self.items.remove(pos);
            return ToggleOutcome::Removed;
        }

        if self.items.len() >= COMPARE_MAX {
            return ToggleOutcome::Full;
        }

        self.items.push(snapshot);
        ToggleOutcome::Added
    }

    /// Serialized form written to local storage after every change.
    #[must_use]
    pub fn to_storage_json(&self) -> String {
        serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_string())
    }

    /// Restore from local storage; malformed data yields an empty tray.
    #[must_use]
    pub fn from_storage_json(raw: &str) -> Self {
        let mut items: Vec<ProductSnapshot> = serde_json::from_str(raw).unwrap_or_default();
        items.truncate(COMPARE_MAX);
        Self { items }
    }

    /// Render the sticky tray bar fragment.
    #[must_use]
    pub fn render_bar(&self) -> String {
        let mut out = format!(
            "<div class=\"compare-bar\" data-count=\"{}\">",
            self.items.len()
        );
        for item in &self.items {
            out.push_str(&format!(
                "<span class=\"compare-chip\" data-id=\"{}\">{}</span>",
                item.id,
                html_escape::encode_text(&item.name)
            ));
        }
        out.push_str("</div>");
        out
    }

    /// Render the side-by-side feature table.
    #[must_use]
    pub fn render_table(&self) -> String {
        if self.items.is_empty() {
            return "<p class=\"compare-empty\">No products selected</p>".to_string();
        }

        let mut out = String::from("<table class=\"compare-table\"><thead><tr><th></th>");
        for item in &self.items {
            out.push_str(&format!(
                "<th>{}</th>",
                html_escape::encode_text(&item.name)
            ));
        }
        out.push_str("</tr></thead><tbody>");

        let rows: [(&str, fn(&ProductSnapshot) -> String); 4] = [
            ("Price", |p| format!("${:.2}", p.price)),
            ("Size", |p| p.size.clone().unwrap_or_else(|| "-".into())),
            ("Color", |p| p.color.clone().unwrap_or_else(|| "-".into())),
            ("Hair type", |p| {
                p.hair_type.clone().unwrap_or_else(|| "-".into())
            }),
        ];

        for (label, value_of) in rows {
            out.push_str(&format!("<tr><th>{label}</th>"));
            for item in &self.items {
                out.push_str(&format!(
                    "<td>{}</td>",
                    html_escape::encode_text(&value_of(item))
                ));
            }
            out.push_str("</tr>");
        }

        out.push_str("</tbody></table>");
        out
    }
}
