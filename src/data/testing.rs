//! Record builders shared by the data-layer tests.

use super::model::{CellValue, ConversionRecord};

/// A cleaned record with a 1:3 click-through / view-through split.
pub fn record(
    campaign: &str,
    placement: &str,
    month: &str,
    conversions: f64,
    revenue: Option<f64>,
) -> ConversionRecord {
    ConversionRecord {
        activity_group: CellValue::Missing,
        activity_group_id: CellValue::Missing,
        activity: CellValue::Missing,
        activity_id: CellValue::Missing,
        advertiser: CellValue::Text("Acme".to_string()),
        campaign: campaign.to_string(),
        site: CellValue::Missing,
        placement: placement.to_string(),
        month: month.to_string(),
        total_conversions: conversions,
        click_through_conversions: conversions * 0.25,
        view_through_conversions: conversions * 0.75,
        total_revenue: revenue,
        click_through_revenue: CellValue::Missing,
        view_through_revenue: CellValue::Missing,
    }
}
