//! CSV Export Module
//! Time-series and dataset downloads (UTF-8, comma separated, header row).

use crate::data::aggregator::MonthlyTotal;
use crate::data::schema::SALES;
use crate::data::table::{text_values, SalesTable};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const TIME_SERIES_FILE: &str = "TimeSeries.csv";
pub const DATASET_FILE: &str = "Data.csv";
pub const MONTH_COLUMN: &str = "month_year";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid Sales value '{0}' in time series")]
    InvalidValue(String),
}

/// Monthly series as CSV: `month_year,Sales`, chronological rows.
pub fn monthly_csv(series: &[MonthlyTotal]) -> Result<Vec<u8>, ExportError> {
    let labels: Vec<String> = series.iter().map(|m| m.label()).collect();
    let sales: Vec<f64> = series.iter().map(|m| m.sales).collect();
    let mut df = DataFrame::new(vec![
        Column::new(MONTH_COLUMN.into(), labels),
        Column::new(SALES.into(), sales),
    ])?;
    frame_csv(&mut df)
}

/// Parse a monthly series CSV back into `(label, sales)` pairs.
pub fn parse_monthly_csv(bytes: &[u8]) -> Result<Vec<(String, f64)>, ExportError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()?;

    let labels = text_values(&df, MONTH_COLUMN)?;
    let sales = text_values(&df, SALES)?;
    labels
        .into_iter()
        .zip(sales)
        .map(|(label, value)| {
            let sales = value
                .trim()
                .parse::<f64>()
                .map_err(|_| ExportError::InvalidValue(value.clone()))?;
            Ok((label, sales))
        })
        .collect()
}

/// The full table as CSV; dates are written as YYYY-MM-DD.
pub fn dataset_csv(table: &SalesTable) -> Result<Vec<u8>, ExportError> {
    let mut df = table.df().clone();
    frame_csv(&mut df)
}

pub fn write_csv(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "CSV exported");
    Ok(())
}

fn frame_csv(df: &mut DataFrame) -> Result<Vec<u8>, ExportError> {
    let mut buffer: Vec<u8> = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    Ok(buffer)
}
