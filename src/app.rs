use eframe::egui::{self, ScrollArea, Ui};

use crate::color::ColorMap;
use crate::state::AppState;
use crate::ui::plot::{self, format_number};
use crate::ui::panels;

pub const PAGE_TITLE: &str = "Marketing Campaign Conversions Dashboard";

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: charts in fixed order ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| dashboard(ui, &mut self.state));
        });
    }
}

fn dashboard(ui: &mut Ui, state: &mut AppState) {
    ui.heading(PAGE_TITLE);
    ui.separator();

    // ---- (1) Top campaigns by conversions ----
    ui.strong("Most popular campaigns by number of conversions");
    let view = &state.view;
    let labels: Vec<String> = view.popular.iter().map(|r| r.campaign.clone()).collect();
    let values: Vec<f64> = view.popular.iter().map(|r| r.total_conversions).collect();
    plot::horizontal_bar_chart(ui, "popular_campaigns", &labels, &values, "Total Conversions");
    let rows: Vec<Vec<String>> = view
        .popular
        .iter()
        .map(|r| vec![r.campaign.clone(), format_number(r.total_conversions)])
        .collect();
    plot::data_table(ui, "popular_campaigns_table", &["Campaign", "Total Conversions"], &rows);
    ui.separator();

    // ---- (2) Top campaigns by revenue per conversion ----
    ui.strong("Most profitable campaigns (revenue per conversion)");
    let labels: Vec<String> = view.revenue.iter().map(|r| r.campaign.clone()).collect();
    let values: Vec<f64> = view.revenue.iter().map(|r| r.revenue_per_conversion).collect();
    plot::horizontal_bar_chart(ui, "revenue_campaigns", &labels, &values, "Revenue per Conversion");
    let rows: Vec<Vec<String>> = view
        .revenue
        .iter()
        .map(|r| {
            vec![
                r.campaign.clone(),
                format_number(r.total_revenue),
                format_number(r.total_conversions),
                format_number(r.revenue_per_conversion),
            ]
        })
        .collect();
    plot::data_table(
        ui,
        "revenue_campaigns_table",
        &["Campaign", "Total Revenue", "Total Conversions", "Revenue per Conversion"],
        &rows,
    );
    ui.separator();

    // ---- (3) Click-through vs view-through ----
    ui.strong("Click-through vs view-through conversions");
    let slices: Vec<(String, f64)> = view
        .conversion_types
        .iter()
        .map(|c| (c.conversion_type.to_string(), c.count))
        .collect();
    let colors = ColorMap::new(slices.iter().map(|(label, _)| label.as_str()));
    plot::pie_chart(ui, &slices, &colors);
    ui.separator();

    // ---- (4) Filters ----
    ui.strong("Placement and month analysis");
    panels::filter_controls(ui, state);
    ui.add_space(8.0);

    // ---- (5) Filtered conversions by placement ----
    let view = &state.view;
    ui.strong("Conversions by placement");
    let labels: Vec<String> = view.placements.iter().map(|g| g.key.clone()).collect();
    let values: Vec<f64> = view.placements.iter().map(|g| g.total).collect();
    plot::horizontal_bar_chart(ui, "placement_totals", &labels, &values, "Total Conversions");
    ui.separator();

    // ---- (6) Filtered conversions by month ----
    ui.strong("Conversions by month");
    let labels: Vec<String> = view.months.iter().map(|g| g.key.clone()).collect();
    let values: Vec<f64> = view.months.iter().map(|g| g.total).collect();
    let colors = ColorMap::new(labels.iter().map(String::as_str));
    plot::vertical_bar_chart(ui, "month_totals", &labels, &values, "Total Conversions", &colors);
}
