//! Control Panel Widget
//! Left side panel: data source, date range, geographic filters and downloads.

use crate::dashboard::FilterState;
use crate::data::{DimensionSelection, FilterOptions};
use chrono::NaiveDate;
use egui::{Color32, RichText, ScrollArea};
use std::collections::BTreeSet;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    /// File name of the loaded dataset.
    pub source_name: Option<String>,
    pub start_text: String,
    pub end_text: String,
    pub selection: DimensionSelection,
    pub status: String,
    pub status_is_error: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            source_name: None,
            start_text: String::new(),
            end_text: String::new(),
            selection: DimensionSelection::default(),
            status: "Ready".to_string(),
            status_is_error: false,
        }
    }
}

impl ControlPanel {
    /// Panel pre-filled from the initial filter state (command line).
    pub fn new(initial: &FilterState) -> Self {
        let format = |d: Option<NaiveDate>| {
            d.map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
        };
        Self {
            start_text: format(initial.start),
            end_text: format(initial.end),
            selection: initial.selection.clone(),
            ..Self::default()
        }
    }

    /// Seed empty date inputs with the table's min/max order date.
    pub fn seed_dates(&mut self, bounds: Option<(NaiveDate, NaiveDate)>) {
        if let Some((min, max)) = bounds {
            if self.start_text.trim().is_empty() {
                self.start_text = min.format(DATE_FORMAT).to_string();
            }
            if self.end_text.trim().is_empty() {
                self.end_text = max.format(DATE_FORMAT).to_string();
            }
        }
    }

    /// Current inputs as a filter state. Unparseable dates fall back to the table bounds.
    pub fn filter_state(&self) -> FilterState {
        FilterState {
            start: Self::parse_date(&self.start_text),
            end: Self::parse_date(&self.end_text),
            selection: self.selection.clone(),
        }
    }

    fn parse_date(text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.status_is_error = false;
    }

    pub fn set_error(&mut self, error: &str) {
        self.status = format!("Error: {}", error);
        self.status_is_error = true;
    }

    /// Draw the control panel
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        options: Option<&FilterOptions>,
        is_loading: bool,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Superstore EDA")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Upload a file").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                let name = self
                    .source_name
                    .clone()
                    .unwrap_or_else(|| "No file loaded".to_string());
                ui.label(RichText::new(name).size(12.0).color(
                    if self.source_name.is_some() {
                        Color32::WHITE
                    } else {
                        Color32::GRAY
                    },
                ));

                ui.add_enabled_ui(!is_loading, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseFile;
                        }
                        if ui.button("Use default").clicked() {
                            action = ControlPanelAction::UseDefault;
                        }
                    });
                });
                ui.label(
                    RichText::new("csv, txt, xlsx, xls")
                        .size(10.0)
                        .color(Color32::GRAY),
                );
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Date Range Section =====
        ui.label(RichText::new("📅 Order Date").size(14.0).strong());
        ui.add_space(5.0);

        let label_width = 80.0;
        for (label, text) in [
            ("Start Date:", &mut self.start_text),
            ("End Date:", &mut self.end_text),
        ] {
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new(label));
                let valid = text.trim().is_empty() || Self::parse_date(text).is_some();
                let edit = egui::TextEdit::singleline(text)
                    .hint_text("YYYY-MM-DD")
                    .desired_width(120.0)
                    .text_color_opt((!valid).then_some(Color32::from_rgb(220, 53, 69)));
                if ui.add(edit).lost_focus() {
                    action = ControlPanelAction::FiltersChanged;
                }
            });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filter Section =====
        ui.label(RichText::new("🔧 Choose your filter").size(14.0).strong());
        ui.add_space(5.0);

        let has_data = options.is_some();
        let empty = FilterOptions::default();
        let options = options.unwrap_or(&empty);
        let dimensions = [
            ("Pick your Region", &options.regions, &mut self.selection.regions),
            ("Pick the State", &options.states, &mut self.selection.states),
            ("Pick the City", &options.cities, &mut self.selection.cities),
        ];
        for (title, offered, chosen) in dimensions {
            if Self::multi_select(ui, title, offered, chosen) {
                action = ControlPanelAction::FiltersChanged;
            }
        }

        ui.add_space(5.0);
        if ui.small_button("Clear All").clicked() {
            self.selection.clear();
            action = ControlPanelAction::FiltersChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Download Section =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(has_data && !is_loading, |ui| {
                let button = egui::Button::new(RichText::new("⬇ Download Data").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui
                    .add(button)
                    .on_hover_text("Date-filtered dataset as Data.csv")
                    .clicked()
                {
                    action = ControlPanelAction::DownloadDataset;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        if is_loading {
            ui.add(egui::Spinner::new());
        }
        let status_color = if self.status_is_error {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Checkbox list in a collapsible header. Returns true when the choice changed.
    fn multi_select(
        ui: &mut egui::Ui,
        title: &str,
        offered: &[String],
        chosen: &mut BTreeSet<String>,
    ) -> bool {
        let mut changed = false;
        let header = if chosen.is_empty() {
            title.to_string()
        } else {
            format!("{} ({})", title, chosen.len())
        };

        egui::CollapsingHeader::new(header)
            .id_salt(title)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt(title)
                    .max_height(150.0)
                    .show(ui, |ui| {
                        for value in offered {
                            let mut checked = chosen.contains(value);
                            if ui.checkbox(&mut checked, value).changed() {
                                if checked {
                                    chosen.insert(value.clone());
                                } else {
                                    chosen.remove(value);
                                }
                                changed = true;
                            }
                        }
                    });
            });
        changed
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseFile,
    UseDefault,
    FiltersChanged,
    DownloadTimeSeries,
    DownloadDataset,
}
