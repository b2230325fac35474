//! Command Line Interface
//! clap arguments for the dashboard binary and the filters they seed.

use crate::dashboard::FilterState;
use crate::data::{DataSource, DimensionSelection};
use chrono::NaiveDate;
use clap::Parser;
use std::path::{Path, PathBuf};

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

/// Command-line arguments for superstore_eda
#[derive(Parser, Debug)]
#[command(version, about = "Superstore sales EDA dashboard")]
pub struct Args {
    /// Dataset to load instead of the bundled default (csv, txt, xlsx, xls, ods)
    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    /// JSON settings file (default dataset, date formats, palette, chart size)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// First order date to include (YYYY-MM-DD); defaults to the earliest in the data
    #[arg(long = "start", value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Last order date to include (YYYY-MM-DD); defaults to the latest in the data
    #[arg(long = "end", value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Region to keep; repeat for several
    #[arg(long = "region")]
    pub regions: Vec<String>,

    /// State to keep; repeat for several
    #[arg(long = "state")]
    pub states: Vec<String>,

    /// City to keep; repeat for several
    #[arg(long = "city")]
    pub cities: Vec<String>,

    /// Write TimeSeries.csv, Data.csv and PNG charts to this directory and exit
    /// without opening a window
    #[arg(long = "export")]
    pub export: Option<PathBuf>,

    /// Open the export directory with the system handler when done
    #[arg(long = "open", action, requires = "export")]
    pub open: bool,

    /// Log filter directive, e.g. "debug" or "superstore_eda=trace".
    /// RUST_LOG takes precedence when set.
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

impl Args {
    /// Initial date range and selections.
    pub fn filter_state(&self) -> FilterState {
        FilterState {
            start: self.start,
            end: self.end,
            selection: DimensionSelection {
                regions: self.regions.iter().cloned().collect(),
                states: self.states.iter().cloned().collect(),
                cities: self.cities.iter().cloned().collect(),
            },
        }
    }

    /// `--data` when given, otherwise the configured default dataset.
    pub fn data_source(&self, default_dataset: &Path) -> DataSource {
        match &self.data {
            Some(path) => DataSource::Upload(path.clone()),
            None => DataSource::Default(default_dataset.to_path_buf()),
        }
    }
}
