use std::collections::BTreeSet;

use super::model::ConversionTable;

// ---------------------------------------------------------------------------
// Month / Placement selection
// ---------------------------------------------------------------------------

/// Which Month and Placement values are selected.
///
/// A record passes when both its Month and its Placement are selected, so an
/// empty set on either dimension filters everything out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub months: BTreeSet<String>,
    pub placements: BTreeSet<String>,
}

impl FilterSelection {
    /// Select every distinct Month and Placement of the table.
    pub fn all(table: &ConversionTable) -> Self {
        Self {
            months: table.distinct_months().into_iter().collect(),
            placements: table.distinct_placements().into_iter().collect(),
        }
    }

    /// Records matching the selection, in their original order.
    pub fn apply(&self, table: &ConversionTable) -> ConversionTable {
        let records = table
            .records
            .iter()
            .filter(|r| self.months.contains(&r.month) && self.placements.contains(&r.placement))
            .cloned()
            .collect();
        ConversionTable::new(records)
    }

    /// Add `value` to `set` if absent, remove it otherwise.
    pub fn toggle(set: &mut BTreeSet<String>, value: &str) {
        if !set.remove(value) {
            set.insert(value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::{grouped_totals, grouped_totals_by_key, Dimension, Measure};
    use crate::data::testing::record;

    fn table() -> ConversionTable {
        ConversionTable::new(vec![
            record("A", "Top banner", "2024-01", 10.0, Some(100.0)),
            record("A", "Sidebar", "2024-02", 5.0, None),
            record("B", "Top banner", "2024-02", 3.0, Some(60.0)),
            record("C", "Footer", "2024-03", 1.0, Some(1.0)),
        ])
    }

    #[test]
    fn full_selection_reproduces_unfiltered_totals() {
        let table = table();
        let filtered = FilterSelection::all(&table).apply(&table);
        assert_eq!(filtered, table);

        for dim in [Dimension::Placement, Dimension::Month] {
            assert_eq!(
                grouped_totals(&filtered, dim, Measure::TotalConversions),
                grouped_totals(&table, dim, Measure::TotalConversions)
            );
            assert_eq!(
                grouped_totals_by_key(&filtered, dim, Measure::TotalConversions),
                grouped_totals_by_key(&table, dim, Measure::TotalConversions)
            );
        }
    }

    #[test]
    fn empty_selection_yields_no_rows() {
        let table = table();

        let mut selection = FilterSelection::all(&table);
        selection.months.clear();
        let filtered = selection.apply(&table);
        assert!(filtered.is_empty());
        assert!(grouped_totals(&filtered, Dimension::Placement, Measure::TotalConversions).is_empty());

        let mut selection = FilterSelection::all(&table);
        selection.placements.clear();
        assert!(selection.apply(&table).is_empty());
    }

    #[test]
    fn both_dimensions_must_match() {
        let table = table();
        let selection = FilterSelection {
            months: ["2024-02".to_string()].into(),
            placements: ["Top banner".to_string(), "Footer".to_string()].into(),
        };
        let filtered = selection.apply(&table);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.records[0].campaign, "B");
    }

    #[test]
    fn toggle_flips_membership() {
        let mut set = BTreeSet::new();
        FilterSelection::toggle(&mut set, "2024-01");
        assert!(set.contains("2024-01"));
        FilterSelection::toggle(&mut set, "2024-01");
        assert!(set.is_empty());
    }
}
