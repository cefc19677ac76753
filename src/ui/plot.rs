use std::f32::consts::{FRAC_PI_2, TAU};
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, Sense, Shape, Stroke, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Plot};

use crate::color::ColorMap;

const CHART_HEIGHT: f32 = 280.0;
const PIE_SIZE: f32 = 240.0;
const BAR_COLOR: Color32 = Color32::from_rgb(99, 110, 250);

// ---------------------------------------------------------------------------
// Value formatting
// ---------------------------------------------------------------------------

/// Integral values without decimals, others with two; non-finite as `inf` / `NaN`.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Axis formatter showing `labels[i]` at integer position `i`.
fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let v = mark.value;
        if (v - v.round()).abs() > 1e-6 || v < 0.0 {
            return String::new();
        }
        labels.get(v.round() as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// Horizontal bars, first row on top. Non-finite values draw as empty bars.
pub fn horizontal_bar_chart(ui: &mut Ui, id: &str, labels: &[String], values: &[f64], value_label: &str) {
    let n = labels.len();
    // Row 0 is drawn at the top.
    let positioned: Vec<String> = labels.iter().rev().cloned().collect();
    let bars: Vec<Bar> = labels
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (label, &value))| {
            let value = if value.is_finite() { value } else { 0.0 };
            Bar::new((n - 1 - i) as f64, value)
                .name(label)
                .width(0.7)
                .fill(BAR_COLOR)
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(value_label)
        .y_axis_formatter(category_formatter(positioned))
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().color(BAR_COLOR));
        });
}

/// Vertical bars in the given order.
pub fn vertical_bar_chart(
    ui: &mut Ui,
    id: &str,
    labels: &[String],
    values: &[f64],
    value_label: &str,
    colors: &ColorMap,
) {
    let bars: Vec<Bar> = labels
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (label, &value))| {
            let value = if value.is_finite() { value } else { 0.0 };
            Bar::new(i as f64, value)
                .name(label)
                .width(0.7)
                .fill(colors.color_for(label))
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label(value_label)
        .x_axis_formatter(category_formatter(labels.to_vec()))
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

// ---------------------------------------------------------------------------
// Pie chart
// ---------------------------------------------------------------------------

/// Pie of `(label, value)` slices with a legend on the right.
///
/// Negative values count as zero.
pub fn pie_chart(ui: &mut Ui, slices: &[(String, f64)], colors: &ColorMap) {
    let total: f64 = slices.iter().map(|(_, v)| v.max(0.0)).sum();

    ui.horizontal(|ui: &mut Ui| {
        let (response, painter) = ui.allocate_painter(egui::vec2(PIE_SIZE, PIE_SIZE), Sense::hover());
        let center = response.rect.center();
        let radius = PIE_SIZE * 0.45;

        if total > 0.0 {
            let mut start = -FRAC_PI_2;
            for (label, value) in slices {
                let sweep = (value.max(0.0) / total) as f32 * TAU;
                let steps = ((sweep / TAU) * 96.0).ceil().max(1.0) as usize;
                let color = colors.color_for(label);
                // Fan of thin triangles; each one is convex.
                for s in 0..steps {
                    let a0 = start + sweep * s as f32 / steps as f32;
                    let a1 = start + sweep * (s + 1) as f32 / steps as f32;
                    let p0 = center + radius * egui::vec2(a0.cos(), a0.sin());
                    let p1 = center + radius * egui::vec2(a1.cos(), a1.sin());
                    painter.add(Shape::convex_polygon(vec![center, p0, p1], color, Stroke::NONE));
                }
                start += sweep;
            }
        } else {
            painter.circle_stroke(center, radius, Stroke::new(1.0, Color32::GRAY));
        }

        ui.vertical(|ui: &mut Ui| {
            for (label, value) in slices {
                let share = if total > 0.0 { value.max(0.0) / total * 100.0 } else { 0.0 };
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(RichText::new("■").color(colors.color_for(label)));
                    ui.label(format!("{label}: {}  ({share:.1}%)", format_number(*value)));
                });
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Table view
// ---------------------------------------------------------------------------

/// Collapsible table of the rows behind a chart.
pub fn data_table(ui: &mut Ui, id: &str, headers: &[&str], rows: &[Vec<String>]) {
    egui::CollapsingHeader::new("Table")
        .id_salt(id)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let mut table = TableBuilder::new(ui).striped(true).vscroll(false);
            for _ in headers {
                table = table.column(TableColumn::auto().at_least(90.0));
            }
            table
                .header(20.0, |mut header| {
                    for h in headers {
                        header.col(|ui: &mut Ui| {
                            ui.strong(*h);
                        });
                    }
                })
                .body(|mut body| {
                    for row in rows {
                        body.row(18.0, |mut table_row| {
                            for cell in row {
                                table_row.col(|ui: &mut Ui| {
                                    ui.label(cell);
                                });
                            }
                        });
                    }
                });
        });
}
