use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Column – positional binding of the report sheet
// ---------------------------------------------------------------------------

/// The fifteen report columns, in sheet order.
///
/// Columns are bound by position, not by the header text found in the sheet:
/// a report with reordered columns is silently mislabelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ActivityGroup,
    ActivityGroupId,
    Activity,
    ActivityId,
    Advertiser,
    Campaign,
    Site,
    Placement,
    Month,
    TotalConversions,
    ClickThroughConversions,
    ViewThroughConversions,
    TotalRevenue,
    ClickThroughRevenue,
    ViewThroughRevenue,
}

impl Column {
    pub const ALL: [Column; 15] = [
        Column::ActivityGroup,
        Column::ActivityGroupId,
        Column::Activity,
        Column::ActivityId,
        Column::Advertiser,
        Column::Campaign,
        Column::Site,
        Column::Placement,
        Column::Month,
        Column::TotalConversions,
        Column::ClickThroughConversions,
        Column::ViewThroughConversions,
        Column::TotalRevenue,
        Column::ClickThroughRevenue,
        Column::ViewThroughRevenue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::ActivityGroup => "Activity Group",
            Column::ActivityGroupId => "Activity Group ID",
            Column::Activity => "Activity",
            Column::ActivityId => "Activity ID",
            Column::Advertiser => "Advertiser",
            Column::Campaign => "Campaign",
            Column::Site => "Site (CM360)",
            Column::Placement => "Placement",
            Column::Month => "Month",
            Column::TotalConversions => "Total Conversions",
            Column::ClickThroughConversions => "Click-through Conversions",
            Column::ViewThroughConversions => "View-through Conversions",
            Column::TotalRevenue => "Total Revenue",
            Column::ClickThroughRevenue => "Click-through Revenue",
            Column::ViewThroughRevenue => "View-through Revenue",
        }
    }

    /// Position of the column in a [`RawTable`] row.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column names in sheet order.
    pub fn names() -> Vec<String> {
        Column::ALL.iter().map(|c| c.name().to_string()).collect()
    }
}

// ---------------------------------------------------------------------------
// CellValue – a single raw spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from the sheet, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Missing,
}

impl CellValue {
    /// Build a text cell, mapping the empty string to `Missing`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            CellValue::Missing
        } else {
            CellValue::Text(s)
        }
    }

    /// Whether the cell holds no value at all.
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Numeric interpretation with coercion: unparseable values become `None`.
    ///
    /// Text is trimmed before parsing; NaN counts as missing.
    pub fn to_number(&self) -> Option<f64> {
        let value = match self {
            CellValue::Number(v) => *v,
            CellValue::Bool(b) => f64::from(u8::from(*b)),
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Missing => return None,
        };
        (!value.is_nan()).then_some(value)
    }

    /// Categorical label of the cell, `None` when missing or NaN.
    pub fn to_label(&self) -> Option<String> {
        match self {
            CellValue::Missing => None,
            CellValue::Number(v) if v.is_nan() => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Missing => write!(f, "<missing>"),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – loader output
// ---------------------------------------------------------------------------

/// Row-oriented table straight out of the loader.
///
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ConversionRecord – one cleaned observation
// ---------------------------------------------------------------------------

/// One campaign / placement / month observation after cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRecord {
    pub activity_group: CellValue,
    pub activity_group_id: CellValue,
    pub activity: CellValue,
    pub activity_id: CellValue,
    pub advertiser: CellValue,
    pub campaign: String,
    pub site: CellValue,
    pub placement: String,
    pub month: String,
    pub total_conversions: f64,
    pub click_through_conversions: f64,
    pub view_through_conversions: f64,
    /// May stay missing; sums skip it.
    pub total_revenue: Option<f64>,
    pub click_through_revenue: CellValue,
    pub view_through_revenue: CellValue,
}

// ---------------------------------------------------------------------------
// ConversionTable – the cleaned dataset
// ---------------------------------------------------------------------------

/// Cleaned records in sheet order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionTable {
    pub records: Vec<ConversionRecord>,
}

impl ConversionTable {
    pub fn new(records: Vec<ConversionRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct Month labels in order of first appearance.
    pub fn distinct_months(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.month.as_str()))
    }

    /// Distinct Placement labels in order of first appearance.
    pub fn distinct_placements(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.placement.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_positions_follow_sheet_order() {
        assert_eq!(Column::ALL.len(), 15);
        for (i, col) in Column::ALL.iter().enumerate() {
            assert_eq!(col.index(), i);
        }
        assert_eq!(Column::Campaign.index(), 5);
        assert_eq!(Column::Site.name(), "Site (CM360)");
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(CellValue::Number(3.0).to_number(), Some(3.0));
        assert_eq!(CellValue::Text(" 12.5 ".into()).to_number(), Some(12.5));
        assert_eq!(CellValue::Text("N/A".into()).to_number(), None);
        assert_eq!(CellValue::Text("NaN".into()).to_number(), None);
        assert_eq!(CellValue::Bool(true).to_number(), Some(1.0));
        assert_eq!(CellValue::Missing.to_number(), None);
    }

    #[test]
    fn labels_render_integral_numbers_without_fraction() {
        assert_eq!(CellValue::Number(202401.0).to_label().as_deref(), Some("202401"));
        assert_eq!(CellValue::Number(1.5).to_label().as_deref(), Some("1.5"));
        assert_eq!(CellValue::text("").to_label(), None);
        assert_eq!(CellValue::Number(f64::NAN).to_label(), None);
    }
}
