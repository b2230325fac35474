//! Data Normalizer Module
//! Coerces a raw all-text table into the typed `SalesTable` schema.

use crate::data::loader::RawTable;
use crate::data::schema::*;
use crate::data::table::{text_values, SalesTable};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

/// Date formats tried in order when none are configured. Ambiguous
/// slashed and dashed dates are month-first.
pub const DEFAULT_DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
];

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column '{0}' not found in loaded data")]
    MissingColumn(String),
}

/// Applies type coercion and missing-value defaults.
#[derive(Debug, Clone)]
pub struct Normalizer {
    date_formats: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Normalizer {
    pub fn new(date_formats: &[String]) -> Self {
        if date_formats.is_empty() {
            return Self::default();
        }
        Self {
            date_formats: date_formats.to_vec(),
        }
    }

    /// Normalize a raw table.
    ///
    /// Nulls become empty text first, then `Order Date` is parsed (failures
    /// become null dates) and the metrics are coerced (failures become 0).
    pub fn normalize(&self, raw: &RawTable) -> Result<SalesTable, NormalizeError> {
        let df = &raw.df;
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|required| !names.iter().any(|n| n == *required))
        {
            return Err(NormalizeError::MissingColumn(missing.to_string()));
        }

        let raw_dates = text_values(df, ORDER_DATE)?;
        let mut unparsed = 0usize;
        let days: Vec<Option<i32>> = raw_dates
            .iter()
            .map(|text| {
                let parsed = self.parse_date(text);
                if parsed.is_none() {
                    unparsed += 1;
                }
                parsed.map(to_epoch_days)
            })
            .collect();
        if unparsed > 0 {
            warn!(
                rows = unparsed,
                "order dates could not be parsed; rows excluded from date-bounded views"
            );
        }
        let dates = Column::new(ORDER_DATE.into(), days).cast(&DataType::Date)?;

        // Columns keep their source order; anything outside the schema stays text.
        let mut columns: Vec<Column> = Vec::with_capacity(names.len());
        for name in &names {
            let column = if name == ORDER_DATE {
                dates.clone()
            } else if METRIC_COLUMNS.contains(&name.as_str()) {
                let values: Vec<f64> = text_values(df, name)?
                    .iter()
                    .map(|text| Self::coerce_metric(text))
                    .collect();
                Column::new(name.as_str().into(), values)
            } else {
                Column::new(name.as_str().into(), text_values(df, name)?)
            };
            columns.push(column);
        }

        let table = SalesTable::from_frame(DataFrame::new(columns)?);
        debug!(rows = table.height(), "normalized dataset");
        Ok(table)
    }

    /// Parse an order date with the configured formats; trailing times are ignored.
    pub fn parse_date(&self, text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.try_formats(text).or_else(|| {
            let (date_part, _time) = text.split_once(['T', ' '])?;
            self.try_formats(date_part)
        })
    }

    fn try_formats(&self, text: &str) -> Option<NaiveDate> {
        self.date_formats.iter().find_map(|format| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(text, format)
                        .ok()
                        .map(|dt| dt.date())
                })
        })
    }

    /// Non-numeric, empty, NaN and infinite values all coerce to 0.
    pub fn coerce_metric(text: &str) -> f64 {
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}
