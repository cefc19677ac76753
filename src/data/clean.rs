use super::model::{CellValue, Column, ConversionRecord, ConversionTable, RawTable};

// ---------------------------------------------------------------------------
// Cleaning: numeric coercion + required-field drop
// ---------------------------------------------------------------------------

/// Turn the loaded table into typed conversion records.
///
/// The four numeric columns are coerced first (unparseable → missing), then
/// any row missing one of Campaign, Placement, Month or the three conversion
/// counts is dropped. Surviving rows keep their sheet order. Nothing here
/// fails: bad rows are dropped silently and bad revenue cells become missing.
///
/// Because coercion comes first, a count such as `"ten"` drops its whole row
/// (revenue included) instead of surviving as a missing count, so every
/// cleaned record carries all three counts.
pub fn clean(raw: RawTable) -> ConversionTable {
    let total = raw.len();
    let records: Vec<ConversionRecord> = raw.rows.into_iter().filter_map(clean_row).collect();

    let dropped = total - records.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped} of {total} rows missing required fields");
    }

    ConversionTable::new(records)
}

/// Build a record from one row, `None` when a required field is missing.
fn clean_row(row: Vec<CellValue>) -> Option<ConversionRecord> {
    let cell = |row: &[CellValue], col: Column| row.get(col.index()).cloned().unwrap_or(CellValue::Missing);
    let number = |row: &[CellValue], col: Column| row.get(col.index()).and_then(CellValue::to_number);

    let campaign = row.get(Column::Campaign.index())?.to_label()?;
    let placement = row.get(Column::Placement.index())?.to_label()?;
    let month = row.get(Column::Month.index())?.to_label()?;
    let total_conversions = number(&row, Column::TotalConversions)?;
    let click_through_conversions = number(&row, Column::ClickThroughConversions)?;
    let view_through_conversions = number(&row, Column::ViewThroughConversions)?;
    let total_revenue = number(&row, Column::TotalRevenue);

    Some(ConversionRecord {
        activity_group: cell(&row, Column::ActivityGroup),
        activity_group_id: cell(&row, Column::ActivityGroupId),
        activity: cell(&row, Column::Activity),
        activity_id: cell(&row, Column::ActivityId),
        advertiser: cell(&row, Column::Advertiser),
        campaign,
        site: cell(&row, Column::Site),
        placement,
        month,
        total_conversions,
        click_through_conversions,
        view_through_conversions,
        total_revenue,
        click_through_revenue: cell(&row, Column::ClickThroughRevenue),
        view_through_revenue: cell(&row, Column::ViewThroughRevenue),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(campaign: &str, placement: &str, month: &str, total: &str, revenue: &str) -> Vec<CellValue> {
        let mut cells = vec![CellValue::Missing; Column::ALL.len()];
        let set = |v: &str| {
            if v.is_empty() {
                CellValue::Missing
            } else if let Ok(n) = v.parse::<f64>() {
                CellValue::Number(n)
            } else {
                CellValue::Text(v.to_string())
            }
        };
        cells[Column::Campaign.index()] = set(campaign);
        cells[Column::Placement.index()] = set(placement);
        cells[Column::Month.index()] = set(month);
        cells[Column::TotalConversions.index()] = set(total);
        cells[Column::ClickThroughConversions.index()] = CellValue::Number(1.0);
        cells[Column::ViewThroughConversions.index()] = CellValue::Number(2.0);
        cells[Column::TotalRevenue.index()] = set(revenue);
        cells
    }

    fn raw(rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable {
            columns: Column::names(),
            rows,
        }
    }

    #[test]
    fn rows_missing_required_fields_are_dropped() {
        let table = clean(raw(vec![
            row("A", "Top banner", "2024-01", "10", "100"),
            row("B", "", "2024-01", "3", "60"),
            row("C", "Sidebar", "", "3", "60"),
            row("", "Sidebar", "2024-02", "3", "60"),
            row("D", "Sidebar", "2024-02", "", "60"),
            row("E", "Sidebar", "2024-02", "4", "40"),
        ]));

        let campaigns: Vec<&str> = table.records.iter().map(|r| r.campaign.as_str()).collect();
        assert_eq!(campaigns, vec!["A", "E"]);
    }

    #[test]
    fn unparseable_revenue_becomes_missing() {
        let table = clean(raw(vec![
            row("A", "Top banner", "2024-01", "10", "oops"),
            row("A", "Top banner", "2024-01", "5", "50"),
        ]));
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].total_revenue, None);
        assert_eq!(table.records[1].total_revenue, Some(50.0));
    }

    #[test]
    fn unparseable_required_count_drops_the_row() {
        let table = clean(raw(vec![
            row("A", "Top banner", "2024-01", "ten", "100"),
            row("B", "Top banner", "2024-01", " 7 ", "100"),
        ]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].campaign, "B");
        assert_eq!(table.records[0].total_conversions, 7.0);
    }

    #[test]
    fn nan_label_cells_drop_the_row() {
        let mut nan_month = row("A", "Top banner", "", "1", "10");
        nan_month[Column::Month.index()] = CellValue::Number(f64::NAN);
        let table = clean(raw(vec![nan_month, row("B", "Top banner", "3", "2", "")]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].month, "3");
    }

    #[test]
    fn numeric_labels_become_text_keys() {
        let table = clean(raw(vec![row("A", "Top banner", "202401", "1", "")]));
        assert_eq!(table.records[0].month, "202401");
        assert_eq!(table.records[0].total_revenue, None);
    }
}
