use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, FilterField};

// ---------------------------------------------------------------------------
// Filter controls – Months / Placements multi-selects
// ---------------------------------------------------------------------------

/// Render the two multi-select controls side by side.
pub fn filter_controls(ui: &mut Ui, state: &mut AppState) {
    ui.columns(2, |columns| {
        multi_select(&mut columns[0], state, FilterField::Month);
        multi_select(&mut columns[1], state, FilterField::Placement);
    });
}

fn multi_select(ui: &mut Ui, state: &mut AppState, field: FilterField) {
    // Clone what we need so we can mutate state inside the loop.
    let options = state.options(field).to_vec();
    let n_selected = state.selected(field).len();
    let header_text = format!("{}  ({n_selected}/{})", field.label(), options.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(field.label())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            // Select all / none buttons
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(field);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(field);
                }
            });

            ScrollArea::vertical()
                .id_salt(field.label())
                .max_height(180.0)
                .auto_shrink([false, true])
                .show(ui, |ui: &mut Ui| {
                    for value in &options {
                        let mut checked = state.selected(field).contains(value);
                        if ui.checkbox(&mut checked, value).changed() {
                            state.toggle_filter_value(field, value);
                        }
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let name = state
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ui.label(format!(
            "{name}: {} rows, {} in filter",
            state.table.len(),
            state.view.filtered_rows
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open conversions report")
        .add_filter("Supported files", &["xlsx", "xlsm", "csv", "parquet", "pq"])
        .add_filter("Excel workbook", &["xlsx", "xlsm"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
