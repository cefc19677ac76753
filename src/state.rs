use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::DashboardConfig;
use crate::data::filter::FilterSelection;
use crate::data::model::ConversionTable;
use crate::data::pipeline::{load_conversions, DashboardView};

// ---------------------------------------------------------------------------
// Filter dimension (UI-side)
// ---------------------------------------------------------------------------

/// The two multi-select controls of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Month,
    Placement,
}

impl FilterField {
    pub fn label(self) -> &'static str {
        match self {
            FilterField::Month => "Months",
            FilterField::Placement => "Placements",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// File the current table was loaded from.
    pub source: PathBuf,

    /// Cleaned report rows.
    pub table: ConversionTable,

    /// Distinct Month / Placement values, in order of first appearance.
    pub month_options: Vec<String>,
    pub placement_options: Vec<String>,

    /// Current filter selection.
    pub selection: FilterSelection,

    /// Chart data for the current table and selection.
    pub view: DashboardView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig, source: PathBuf, table: ConversionTable) -> Self {
        let mut state = Self {
            config,
            source: PathBuf::new(),
            table: ConversionTable::default(),
            month_options: Vec::new(),
            placement_options: Vec::new(),
            selection: FilterSelection::default(),
            view: DashboardView::default(),
            status_message: None,
        };
        state.set_table(source, table);
        state
    }

    /// Ingest a newly loaded table, select everything and recompute.
    pub fn set_table(&mut self, source: PathBuf, table: ConversionTable) {
        self.month_options = table.distinct_months();
        self.placement_options = table.distinct_placements();
        self.selection = FilterSelection::all(&table);
        self.table = table;
        self.source = source;
        self.status_message = None;
        self.recompute();
    }

    /// Load another report with the configured sheet layout.
    ///
    /// On failure the current table stays on screen and the error is shown.
    pub fn open(&mut self, path: &Path) {
        match load_conversions(path, &self.config.sheet_spec()) {
            Ok(table) => self.set_table(path.to_path_buf(), table),
            Err(e) => {
                log::error!("Failed to load file ({:?}): {e}", e.kind());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Recompute the chart data after a table or selection change.
    pub fn recompute(&mut self) {
        self.view = DashboardView::compute(&self.table, &self.selection, self.config.top_n);
    }

    pub fn options(&self, field: FilterField) -> &[String] {
        match field {
            FilterField::Month => &self.month_options,
            FilterField::Placement => &self.placement_options,
        }
    }

    pub fn selected(&self, field: FilterField) -> &BTreeSet<String> {
        match field {
            FilterField::Month => &self.selection.months,
            FilterField::Placement => &self.selection.placements,
        }
    }

    fn selected_mut(&mut self, field: FilterField) -> &mut BTreeSet<String> {
        match field {
            FilterField::Month => &mut self.selection.months,
            FilterField::Placement => &mut self.selection.placements,
        }
    }

    /// Toggle a single value in a field's selection.
    pub fn toggle_filter_value(&mut self, field: FilterField, value: &str) {
        FilterSelection::toggle(self.selected_mut(field), value);
        self.recompute();
    }

    /// Select all values of a field.
    pub fn select_all(&mut self, field: FilterField) {
        let all: BTreeSet<String> = self.options(field).iter().cloned().collect();
        *self.selected_mut(field) = all;
        self.recompute();
    }

    /// Deselect all values of a field.
    pub fn select_none(&mut self, field: FilterField) {
        self.selected_mut(field).clear();
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::record;

    fn state() -> AppState {
        let table = ConversionTable::new(vec![
            record("A", "Top banner", "2024-02", 10.0, Some(100.0)),
            record("A", "Sidebar", "2024-01", 5.0, None),
            record("B", "Top banner", "2024-01", 3.0, Some(60.0)),
        ]);
        AppState::new(DashboardConfig::default(), PathBuf::from("report.xlsx"), table)
    }

    #[test]
    fn starts_with_everything_selected() {
        let state = state();
        assert_eq!(state.month_options, vec!["2024-02", "2024-01"]);
        assert_eq!(state.selected(FilterField::Placement).len(), 2);
        assert_eq!(state.view.filtered_rows, 3);
        assert_eq!(state.view.months.len(), 2);
    }

    #[test]
    fn toggling_recomputes_breakdowns() {
        let mut state = state();
        state.toggle_filter_value(FilterField::Placement, "Sidebar");
        assert_eq!(state.view.filtered_rows, 2);
        assert_eq!(state.view.placements.len(), 1);
        assert_eq!(state.view.placements[0].total, 13.0);
        // Rankings ignore the filter.
        assert_eq!(state.view.popular[0].total_conversions, 15.0);

        state.toggle_filter_value(FilterField::Placement, "Sidebar");
        assert_eq!(state.view.filtered_rows, 3);
    }

    #[test]
    fn select_none_then_all() {
        let mut state = state();
        state.select_none(FilterField::Month);
        assert!(state.view.months.is_empty());
        assert!(state.view.placements.is_empty());

        state.select_all(FilterField::Month);
        assert_eq!(state.view.months.len(), 2);
    }

    #[test]
    fn failed_open_keeps_current_table() {
        let mut state = state();
        state.open(Path::new("/nonexistent/other.xlsx"));
        assert!(state.status_message.is_some());
        assert_eq!(state.table.len(), 3);
        assert_eq!(state.source, PathBuf::from("report.xlsx"));
    }
}
