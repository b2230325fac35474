//! Superstore EDA - Sales Dashboard
//!
//! Opens the interactive dashboard, or with `--export` writes the CSV
//! downloads and PNG charts for the requested filters and exits.

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use std::path::Path;
use superstore_eda::charts::StaticChartRenderer;
use superstore_eda::cli::Args;
use superstore_eda::config::DashboardConfig;
use superstore_eda::dashboard::{Dashboard, FilterState};
use superstore_eda::data::{
    dataset_csv, monthly_csv, write_csv, DataSource, DATASET_FILE, TIME_SERIES_FILE,
};
use superstore_eda::gui::DashboardApp;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = args
        .log_level
        .clone()
        .unwrap_or_else(|| "superstore_eda=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = DashboardConfig::load(args.config.as_deref())?;
    let source = args.data_source(&config.default_dataset);
    let filters = args.filter_state();

    match &args.export {
        Some(dir) => export(&config, &source, &filters, dir, args.open),
        None => run_gui(config, source, filters),
    }
}

/// Headless mode: CSV downloads plus the five charts, written to `dir`.
fn export(
    config: &DashboardConfig,
    source: &DataSource,
    filters: &FilterState,
    dir: &Path,
    open_dir: bool,
) -> anyhow::Result<()> {
    let (table, name) = Dashboard::load(source, &config.date_formats)
        .with_context(|| format!("Failed to load {}", source.path().display()))?;
    let views = Dashboard::render(&table, filters).context("Failed to compute dashboard")?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    write_csv(&dir.join(TIME_SERIES_FILE), &monthly_csv(&views.monthly)?)?;
    write_csv(&dir.join(DATASET_FILE), &dataset_csv(&views.date_filtered)?)?;

    let charts = StaticChartRenderer::render_all(
        &views,
        &config.palette,
        dir,
        (config.chart_width, config.chart_height),
    )
    .context("Failed to render charts")?;

    info!(
        source = %name,
        dir = %dir.display(),
        rows = views.filtered.height(),
        charts = charts.len(),
        "export complete"
    );
    println!(
        "{}: {} rows, total sales {:.2} -> {}",
        name,
        views.filtered.height(),
        views.total_sales,
        dir.display()
    );

    if open_dir {
        open::that(dir).with_context(|| format!("Failed to open {}", dir.display()))?;
    }
    Ok(())
}

fn run_gui(
    config: DashboardConfig,
    source: DataSource,
    filters: FilterState,
) -> anyhow::Result<()> {
    let title = config.window_title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config, source, filters)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}
