use anyhow::Result;
use serde::Serialize;

use crate::constants::limits::TOP_PRODUCTS;
use crate::db::{
    BreakdownRow, CategoryPerformanceRow, DailyActivityRow, MonthlyRevenueRow, Store,
    TopProductRow, UserGrowthRow,
};

const REVENUE_MONTHS: u32 = 12;
const GROWTH_MONTHS: u32 = 12;
const ACTIVITY_DAYS: i64 = 30;

/// Everything the dashboard renders, recomputed from source tables on
/// every request.
#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub monthly_revenue: Vec<MonthlyRevenueRow>,
    pub top_products: Vec<TopProductRow>,
    pub category_performance: Vec<CategoryPerformanceRow>,
    pub user_growth: Vec<UserGrowthRow>,
    pub payment_methods: Vec<BreakdownRow>,
    pub order_statuses: Vec<BreakdownRow>,
    pub daily_activity: Vec<DailyActivityRow>,
}

pub struct AnalyticsService {
    store: Store,
}

impl AnalyticsService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn dashboard(&self) -> Result<DashboardData> {
        Ok(DashboardData {
            monthly_revenue: self.store.monthly_revenue(REVENUE_MONTHS).await?,
            top_products: self.store.top_products(TOP_PRODUCTS).await?,
            category_performance: self.store.category_performance().await?,
            user_growth: self.store.user_growth(GROWTH_MONTHS).await?,
            payment_methods: self.store.payment_method_breakdown().await?,
            order_statuses: self.store.status_breakdown().await?,
            daily_activity: self.store.daily_activity(ACTIVITY_DAYS).await?,
        })
    }
}

/// Proportional bar heights for a series, scaled so the series max reaches
/// `max_height`. A series whose max is zero renders every bar at 0.
#[must_use]
pub fn bar_heights(values: &[f64], max_height: u32) -> Vec<u32> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return vec![0; values.len()];
    }

    values
        .iter()
        .map(|v| ((v.max(0.0) / max) * f64::from(max_height)).round() as u32)
        .collect()
}

/// Render a labeled series as an HTML bar-chart fragment. Labels are
/// escaped; heights come from [`bar_heights`].
#[must_use]
pub fn render_bar_chart(series: &[(String, f64)], max_height: u32) -> String {
    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    let heights = bar_heights(&values, max_height);

    let mut out = String::from("<div class=\"chart\">");
    for ((label, value), height) in series.iter().zip(heights) {
        out.push_str(&format!(
            "<div class=\"bar\" style=\"height:{height}px\" title=\"{value}\"><span>{}</span></div>",
            html_escape::encode_text(label)
        ));
    }
    out.push_str("</div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_scale_to_the_series_max() {
        let heights = bar_heights(&[10.0, 5.0, 0.0], 100);
        assert_eq!(heights, vec![100, 50, 0]);
    }

    #[test]
    fn zero_series_renders_all_zero_bars() {
        let heights = bar_heights(&[0.0, 0.0, 0.0], 100);
        assert_eq!(heights, vec![0, 0, 0]);
    }

    #[test]
    fn empty_series_is_empty() {
        assert!(bar_heights(&[], 100).is_empty());
    }

    #[test]
    fn negative_values_clamp_to_zero() {
        let heights = bar_heights(&[-5.0, 10.0], 50);
        assert_eq!(heights, vec![0, 50]);
    }

    #[test]
    fn chart_escapes_labels() {
        let html = render_bar_chart(&[("<b>Jan</b>".to_string(), 3.0)], 10);
        assert!(html.contains("&lt;b&gt;Jan&lt;/b&gt;"));
        assert!(!html.contains("<b>Jan</b>"));
    }
}
