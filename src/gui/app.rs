//! Superstore EDA Main Application
//! Main window with control panel and chart viewer.

use crate::config::DashboardConfig;
use crate::dashboard::{Dashboard, DashboardViews, FilterState};
use crate::data::{
    dataset_csv, monthly_csv, write_csv, DataSource, SalesTable, DATASET_FILE, TIME_SERIES_FILE,
};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use anyhow::Context;
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info};

/// Pruning a stale choice can narrow the next scope; a few passes settle it.
const MAX_PRUNE_PASSES: usize = 3;

/// Dataset loading result from background thread
enum LoadResult {
    Complete { table: SalesTable, name: String },
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    table: Option<SalesTable>,
    views: Option<DashboardViews>,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: DashboardConfig,
        source: DataSource,
        filters: FilterState,
    ) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(&filters),
            chart_viewer: ChartViewer::new(&config.window_title, config.palette.clone()),
            config,
            table: None,
            views: None,
            load_rx: None,
            is_loading: false,
        };
        app.start_load(source);
        app
    }

    /// Load and normalize `source` in a background thread.
    fn start_load(&mut self, source: DataSource) {
        if self.is_loading {
            return;
        }

        self.control_panel
            .set_status(&format!("Loading {}...", source.display_name()));
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let date_formats = self.config.date_formats.clone();

        thread::spawn(move || {
            let result = match Dashboard::load(&source, &date_formats) {
                Ok((table, name)) => LoadResult::Complete { table, name },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            match rx.try_recv() {
                Ok(LoadResult::Complete { table, name }) => {
                    self.is_loading = false;
                    self.control_panel.set_status(&format!(
                        "Loaded {} rows from {}",
                        table.height(),
                        name
                    ));
                    self.control_panel.source_name = Some(name);
                    self.table = Some(table);
                    self.recompute();
                }
                Ok(LoadResult::Error(e)) => {
                    self.is_loading = false;
                    error!(error = %e, "dataset load failed");
                    self.control_panel.set_error(&e);
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => {
                    self.load_rx = Some(rx);
                }
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    self.is_loading = false;
                    self.control_panel.set_error("loader thread stopped");
                }
            }
        }
    }

    /// Re-run the whole filter and aggregate pass for the current controls.
    fn recompute(&mut self) {
        let Some(table) = &self.table else {
            return;
        };

        for _ in 0..MAX_PRUNE_PASSES {
            match Dashboard::render(table, &self.control_panel.filter_state()) {
                Ok(views) => {
                    self.control_panel.seed_dates(views.date_bounds);
                    let pruned = self.control_panel.selection.retain_offered(&views.options);
                    self.views = Some(views);
                    if !pruned {
                        return;
                    }
                }
                Err(e) => {
                    error!(error = %e, "dashboard recompute failed");
                    self.control_panel.set_error(&e.to_string());
                    return;
                }
            }
        }
    }

    fn handle_browse_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Data Files", &["csv", "txt", "xlsx", "xls", "xlsm", "ods"])
            .pick_file()
        {
            self.start_load(DataSource::Upload(path));
        }
    }

    fn handle_use_default(&mut self) {
        self.start_load(DataSource::Default(self.config.default_dataset.clone()));
    }

    fn handle_download(&mut self, time_series: bool) {
        let Some(views) = &self.views else {
            self.control_panel.set_status("No data to download");
            return;
        };

        let result = if time_series {
            Self::save_download(TIME_SERIES_FILE, || Ok(monthly_csv(&views.monthly)?))
        } else {
            Self::save_download(DATASET_FILE, || Ok(dataset_csv(&views.date_filtered)?))
        };

        match result {
            Ok(Some(path)) => self
                .control_panel
                .set_status(&format!("Saved {}", path.display())),
            Ok(None) => {}
            Err(e) => self.control_panel.set_error(&format!("{:#}", e)),
        }
    }

    /// Ask for a destination and write the CSV. `None` when the dialog was cancelled.
    fn save_download(
        file_name: &str,
        bytes: impl FnOnce() -> anyhow::Result<Vec<u8>>,
    ) -> anyhow::Result<Option<PathBuf>> {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name(file_name)
            .save_file()
        else {
            return Ok(None);
        };

        let bytes = bytes().with_context(|| format!("Failed to build {}", file_name))?;
        write_csv(&path, &bytes)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "download saved");
        Ok(Some(path))
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        let mut action = ControlPanelAction::None;

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let options = self.views.as_ref().map(|v| &v.options);
                    action = self.control_panel.show(ui, options, self.is_loading);
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            let viewer_action = self.chart_viewer.show(ui, self.views.as_ref());
            if viewer_action != ControlPanelAction::None {
                action = viewer_action;
            }
        });

        match action {
            ControlPanelAction::BrowseFile => self.handle_browse_file(),
            ControlPanelAction::UseDefault => self.handle_use_default(),
            ControlPanelAction::FiltersChanged => self.recompute(),
            ControlPanelAction::DownloadTimeSeries => self.handle_download(true),
            ControlPanelAction::DownloadDataset => self.handle_download(false),
            ControlPanelAction::None => {}
        }
    }
}
