use std::path::Path;

use super::aggregate::{
    conversion_type_totals, grouped_totals, grouped_totals_by_key, head, popular_campaigns,
    revenue_by_campaign, CampaignConversions, CampaignRevenue, ConversionTypeCount, Dimension,
    GroupTotal, Measure,
};
use super::clean::clean;
use super::error::LoadResult;
use super::filter::FilterSelection;
use super::loader::{load_table, SheetSpec};
use super::model::ConversionTable;

// ---------------------------------------------------------------------------
// Load → clean
// ---------------------------------------------------------------------------

/// Load a report file and clean it into conversion records.
pub fn load_conversions(path: &Path, spec: &SheetSpec) -> LoadResult<ConversionTable> {
    let raw = load_table(path, spec)?;
    let raw_rows = raw.len();
    let table = clean(raw);
    log::info!(
        "Loaded {} ({} rows, {} kept after cleaning)",
        path.display(),
        raw_rows,
        table.len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Everything the charts need for one render of the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    /// Top campaigns by conversions.
    pub popular: Vec<CampaignConversions>,
    /// Top campaigns by revenue per conversion.
    pub revenue: Vec<CampaignRevenue>,
    pub conversion_types: Vec<ConversionTypeCount>,
    /// Filtered conversions by placement, largest first.
    pub placements: Vec<GroupTotal>,
    /// Filtered conversions by month, in month order.
    pub months: Vec<GroupTotal>,
    /// Records left after filtering.
    pub filtered_rows: usize,
}

impl DashboardView {
    /// Recompute all panels from the cleaned table and the current selection.
    pub fn compute(table: &ConversionTable, selection: &FilterSelection, top_n: usize) -> Self {
        let filtered = selection.apply(table);
        Self {
            popular: head(&popular_campaigns(table), top_n),
            revenue: head(&revenue_by_campaign(table), top_n),
            conversion_types: conversion_type_totals(table).to_vec(),
            placements: grouped_totals(&filtered, Dimension::Placement, Measure::TotalConversions),
            months: grouped_totals_by_key(&filtered, Dimension::Month, Measure::TotalConversions),
            filtered_rows: filtered.len(),
        }
    }
}
