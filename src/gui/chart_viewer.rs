//! Chart Viewer Widget
//! Scrollable central panel laying out the dashboard charts in cards.

use crate::charts::{ChartPlotter, Palette};
use crate::dashboard::DashboardViews;
use crate::gui::ControlPanelAction;
use egui::{Color32, RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;
/// Below this width the paired charts stack vertically.
const TWO_COLUMN_WIDTH: f32 = 900.0;

/// Central panel showing the interactive charts for the current views.
#[derive(Default)]
pub struct ChartViewer {
    pub title: String,
    pub palette: Palette,
}

impl ChartViewer {
    pub fn new(title: &str, palette: Palette) -> Self {
        Self {
            title: title.to_string(),
            palette,
        }
    }

    /// Draw every chart. Returns the time-series download action when clicked.
    pub fn show(&self, ui: &mut egui::Ui, views: Option<&DashboardViews>) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        let Some(views) = views else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return action;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Self::draw_summary(ui, &self.title, views);
                ui.add_space(CHART_SPACING);

                let palette = &self.palette;
                if ui.available_width() >= TWO_COLUMN_WIDTH {
                    ui.columns(2, |columns| {
                        Self::card(&mut columns[0], "Category wise Sales", |ui| {
                            ChartPlotter::draw_category_bar(ui, &views.categories, palette)
                        });
                        Self::card(&mut columns[1], "Country wise Sales", |ui| {
                            ChartPlotter::draw_country_donut(ui, &views.countries, palette)
                        });
                    });
                } else {
                    Self::card(ui, "Category wise Sales", |ui| {
                        ChartPlotter::draw_category_bar(ui, &views.categories, palette)
                    });
                    ui.add_space(CHART_SPACING);
                    Self::card(ui, "Country wise Sales", |ui| {
                        ChartPlotter::draw_country_donut(ui, &views.countries, palette)
                    });
                }
                ui.add_space(CHART_SPACING);

                Self::card(ui, "Time Series Analysis", |ui| {
                    ChartPlotter::draw_time_series(ui, &views.monthly, palette);
                    ui.add_space(8.0);
                    egui::CollapsingHeader::new("View Data")
                        .id_salt("time_series_data")
                        .show(ui, |ui| {
                            ChartPlotter::draw_time_series_table(ui, &views.monthly);
                            ui.add_space(5.0);
                            let download = ui.add_enabled(
                                !views.monthly.is_empty(),
                                egui::Button::new("⬇ Download Data"),
                            );
                            if download
                                .on_hover_text("Monthly totals as TimeSeries.csv")
                                .clicked()
                            {
                                action = ControlPanelAction::DownloadTimeSeries;
                            }
                        });
                });
                ui.add_space(CHART_SPACING);

                Self::card(ui, "Hierarchical view of Sales using TreeMap", |ui| {
                    ChartPlotter::draw_treemap(ui, &views.hierarchy, palette)
                });
                ui.add_space(CHART_SPACING);

                Self::card(
                    ui,
                    "Relationship between Sales and Profits using Scatter Plot",
                    |ui| ChartPlotter::draw_scatter(ui, &views.scatter, palette),
                );
            });

        action
    }

    fn draw_summary(ui: &mut egui::Ui, title: &str, views: &DashboardViews) {
        ui.horizontal(|ui| {
            ui.label(RichText::new(title).size(22.0).strong());
            ui.add_space(20.0);
            if let Some(range) = &views.date_range {
                ui.label(
                    RichText::new(format!("{} to {}", range.start, range.end))
                        .size(13.0)
                        .color(Color32::GRAY),
                );
            }
        });
        ui.horizontal(|ui| {
            ui.label(format!("Rows: {}", views.filtered.height()));
            ui.add_space(20.0);
            ui.label(format!(
                "Total Sales: {}",
                ChartPlotter::currency(views.total_sales)
            ));
        });
    }

    /// Framed card with a title above its contents.
    fn card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_gray(90)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(title).size(18.0).strong());
                ui.add_space(8.0);
                add_contents(ui);
            });
    }
}
