use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::model::{ConversionRecord, ConversionTable};

// ---------------------------------------------------------------------------
// Grouping keys and measures
// ---------------------------------------------------------------------------

/// Categorical column a table can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Campaign,
    Placement,
    Month,
}

impl Dimension {
    fn key(self, record: &ConversionRecord) -> &str {
        match self {
            Dimension::Campaign => &record.campaign,
            Dimension::Placement => &record.placement,
            Dimension::Month => &record.month,
        }
    }
}

/// Numeric column summed within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    TotalConversions,
    ClickThroughConversions,
    ViewThroughConversions,
    TotalRevenue,
}

impl Measure {
    /// Value contributed by one record; missing revenue contributes nothing.
    fn value(self, record: &ConversionRecord) -> f64 {
        match self {
            Measure::TotalConversions => record.total_conversions,
            Measure::ClickThroughConversions => record.click_through_conversions,
            Measure::ViewThroughConversions => record.view_through_conversions,
            Measure::TotalRevenue => record.total_revenue.unwrap_or(0.0),
        }
    }

    /// Sum over the whole table.
    pub fn sum(self, table: &ConversionTable) -> f64 {
        table.records.iter().map(|r| self.value(r)).sum()
    }
}

// ---------------------------------------------------------------------------
// Result rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignConversions {
    pub campaign: String,
    pub total_conversions: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignRevenue {
    pub campaign: String,
    pub total_revenue: f64,
    pub total_conversions: f64,
    /// `total_revenue / total_conversions`; infinite or NaN when there are no
    /// conversions.
    pub revenue_per_conversion: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionType {
    ClickThrough,
    ViewThrough,
}

impl fmt::Display for ConversionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionType::ClickThrough => write!(f, "Click-through Conversions"),
            ConversionType::ViewThrough => write!(f, "View-through Conversions"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionTypeCount {
    pub conversion_type: ConversionType,
    pub count: f64,
}

/// One group of a single-measure breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub total: f64,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Descending numeric order with NaN placed last.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Numeric reading of a group key, used when every key of a column is a number.
fn numeric_key(key: &str) -> Option<f64> {
    key.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Sum `measures` per group, groups in ascending key order.
///
/// Keys compare as numbers when all of them parse as numbers (months stored
/// as 1..12), as labels otherwise.
fn group_sums<const N: usize>(
    table: &ConversionTable,
    by: Dimension,
    measures: [Measure; N],
) -> Vec<(&str, [f64; N])> {
    let mut groups: BTreeMap<&str, [f64; N]> = BTreeMap::new();
    for record in &table.records {
        let sums = groups.entry(by.key(record)).or_insert([0.0; N]);
        for (sum, measure) in sums.iter_mut().zip(measures) {
            *sum += measure.value(record);
        }
    }

    let mut groups: Vec<(&str, [f64; N])> = groups.into_iter().collect();
    if groups.iter().all(|(key, _)| numeric_key(key).is_some()) {
        groups.sort_by(|(a, _), (b, _)| {
            numeric_key(a)
                .partial_cmp(&numeric_key(b))
                .unwrap_or(Ordering::Equal)
        });
    }
    groups
}

/// Campaigns by summed Total Conversions, largest first.
///
/// Ties keep ascending campaign order.
pub fn popular_campaigns(table: &ConversionTable) -> Vec<CampaignConversions> {
    grouped_totals(table, Dimension::Campaign, Measure::TotalConversions)
        .into_iter()
        .map(|g| CampaignConversions {
            campaign: g.key,
            total_conversions: g.total,
        })
        .collect()
}

/// Campaigns ranked by revenue per conversion, largest first.
///
/// Missing revenue cells are skipped in the sum. A campaign with zero
/// conversions gets `±inf` (or NaN for zero revenue too); infinities sort at
/// their numeric position and NaN sorts last.
pub fn revenue_by_campaign(table: &ConversionTable) -> Vec<CampaignRevenue> {
    let mut rows: Vec<CampaignRevenue> = group_sums(
        table,
        Dimension::Campaign,
        [Measure::TotalRevenue, Measure::TotalConversions],
    )
    .into_iter()
    .map(|(campaign, [revenue, conversions])| CampaignRevenue {
        campaign: campaign.to_string(),
        total_revenue: revenue,
        total_conversions: conversions,
        revenue_per_conversion: revenue / conversions,
    })
    .collect();

    rows.sort_by(|a, b| descending(a.revenue_per_conversion, b.revenue_per_conversion));
    rows
}

/// Click-through and view-through totals, in that order.
pub fn conversion_type_totals(table: &ConversionTable) -> [ConversionTypeCount; 2] {
    [
        ConversionTypeCount {
            conversion_type: ConversionType::ClickThrough,
            count: Measure::ClickThroughConversions.sum(table),
        },
        ConversionTypeCount {
            conversion_type: ConversionType::ViewThrough,
            count: Measure::ViewThroughConversions.sum(table),
        },
    ]
}

/// `value` summed per `by` group, largest total first.
pub fn grouped_totals(table: &ConversionTable, by: Dimension, value: Measure) -> Vec<GroupTotal> {
    let mut rows = grouped_totals_by_key(table, by, value);
    rows.sort_by(|a, b| descending(a.total, b.total));
    rows
}

/// `value` summed per `by` group, in ascending key order.
///
/// The month breakdown uses this ordering while the placement breakdown is
/// ranked by total.
pub fn grouped_totals_by_key(
    table: &ConversionTable,
    by: Dimension,
    value: Measure,
) -> Vec<GroupTotal> {
    group_sums(table, by, [value])
        .into_iter()
        .map(|(key, [total])| GroupTotal {
            key: key.to_string(),
            total,
        })
        .collect()
}

/// First `n` rows, without re-sorting.
pub fn head<T: Clone>(rows: &[T], n: usize) -> Vec<T> {
    rows.iter().take(n).cloned().collect()
}
