//! Dataset Loader Module
//! Reads an uploaded file or the bundled default dataset into an all-text
//! DataFrame using Polars (CSV) or calamine (spreadsheets).

use crate::data::schema::REQUIRED_COLUMNS;
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to open spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("Spreadsheet has no readable worksheet")]
    NoWorksheet,
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("No data loaded")]
    NoData,
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A file picked by the user.
    Upload(PathBuf),
    /// The bundled dataset used when nothing was uploaded.
    Default(PathBuf),
}

impl DataSource {
    pub fn path(&self) -> &Path {
        match self {
            DataSource::Upload(path) | DataSource::Default(path) => path,
        }
    }

    /// File name shown next to the upload control.
    pub fn display_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path().display().to_string())
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, DataSource::Upload(_))
    }
}

/// Text encoding detected for a CSV payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

/// Loaded but not yet normalized data. Every column is text.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub df: DataFrame,
    pub source_name: String,
}

impl RawTable {
    pub fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }
}

/// Handles dataset loading for both uploads and the bundled default.
pub struct DataLoader;

impl DataLoader {
    /// Load a data source, dispatching on the file extension.
    pub fn load(source: &DataSource) -> Result<RawTable, LoaderError> {
        let path = source.path();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let df = match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Self::load_spreadsheet(path)?,
            _ => {
                let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::load_csv_bytes(bytes)?
            }
        };

        let raw = RawTable {
            df,
            source_name: source.display_name(),
        };
        info!(
            source = %raw.source_name,
            uploaded = source.is_upload(),
            rows = raw.row_count(),
            columns = raw.df.width(),
            "dataset loaded"
        );
        Ok(raw)
    }

    /// Parse CSV bytes. Payloads that are not valid UTF-8 are decoded as ISO-8859-1.
    pub fn load_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        let (text, encoding) = Self::decode_text(bytes);
        debug!(?encoding, "decoded CSV payload");

        let text = text.strip_prefix('\u{feff}').unwrap_or(&text).to_string();
        if text.trim().is_empty() {
            return Err(LoaderError::NoData);
        }

        // Schema inference is disabled so every column arrives as text; the
        // normalizer owns all type coercion.
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
            .finish()?;

        Self::check_schema(df)
    }

    /// Decode raw bytes, falling back to Latin-1 where every byte is its own code point.
    pub fn decode_text(bytes: Vec<u8>) -> (String, TextEncoding) {
        match String::from_utf8(bytes) {
            Ok(text) => (text, TextEncoding::Utf8),
            Err(err) => {
                let text = err.into_bytes().into_iter().map(char::from).collect();
                (text, TextEncoding::Latin1)
            }
        }
    }

    /// Read the first worksheet of a spreadsheet; the first row is the header.
    pub fn load_spreadsheet(path: &Path) -> Result<DataFrame, LoaderError> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| LoaderError::Spreadsheet(e.to_string()))?;

        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(LoaderError::NoWorksheet)?;
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| LoaderError::Spreadsheet(e.to_string()))?;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .ok_or(LoaderError::NoData)?
            .iter()
            .enumerate()
            .map(|(i, cell)| Self::cell_text(cell).unwrap_or_else(|| format!("column_{}", i)))
            .collect();

        let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); header.len()];
        for row in rows {
            for (i, column) in values.iter_mut().enumerate() {
                column.push(row.get(i).and_then(Self::cell_text));
            }
        }

        let columns: Vec<Column> = header
            .iter()
            .zip(values)
            .map(|(name, column)| Column::new(name.as_str().into(), column))
            .collect();

        debug!(sheet = %sheet, "read worksheet");
        Self::check_schema(DataFrame::new(columns)?)
    }

    fn cell_text(cell: &Data) -> Option<String> {
        match cell {
            Data::String(s) => Some(s.clone()),
            Data::Int(i) => Some(i.to_string()),
            Data::Float(f) => Some(f.to_string()),
            Data::Bool(b) => Some(b.to_string()),
            Data::DateTime(dt) => Some(
                dt.as_datetime()
                    .map(|d| d.date().format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| dt.as_f64().to_string()),
            ),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Reject inputs that lack any required column.
    fn check_schema(df: DataFrame) -> Result<DataFrame, LoaderError> {
        if df.width() == 0 {
            return Err(LoaderError::NoData);
        }

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !names.iter().any(|n| n == *required))
            .map(|s| s.to_string())
            .collect();

        if missing.is_empty() {
            Ok(df)
        } else {
            Err(LoaderError::MissingColumns(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Normalizer;
    use chrono::NaiveDate;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
    use std::io::Write;

    const HEADER: &str =
        "Order Date,Region,State,City,Category,Sub-Category,Country,Sales,Profit,Quantity";

    #[test]
    fn loads_csv_as_text_columns() {
        let csv = format!(
            "{}\n2014-01-03,East,New York,New York City,Furniture,Chairs,United States,100.5,10,2\n",
            HEADER
        );
        let df = DataLoader::load_csv_bytes(csv.into_bytes()).unwrap();

        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 10);
        assert_eq!(df.column("Sales").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn decodes_latin1_payloads() {
        let mut bytes = format!("{}\n2014-01-03,East,Qu", HEADER).into_bytes();
        bytes.push(0xE9); // 'é' in ISO-8859-1
        bytes.extend_from_slice(b"bec,Montr");
        bytes.push(0xE9);
        bytes.extend_from_slice(b"al,Office Supplies,Paper,Canada,5,1,1\n");

        let (text, encoding) = DataLoader::decode_text(bytes.clone());
        assert_eq!(encoding, TextEncoding::Latin1);
        assert!(text.contains("Québec"));

        let df = DataLoader::load_csv_bytes(bytes).unwrap();
        let cities = df.column("City").unwrap().as_materialized_series().clone();
        assert_eq!(cities.str().unwrap().get(0), Some("Montréal"));
    }

    #[test]
    fn rejects_missing_columns() {
        let csv = "Order Date,Region,Sales\n2014-01-03,East,1\n";
        let err = DataLoader::load_csv_bytes(csv.as_bytes().to_vec()).unwrap_err();
        match err {
            LoaderError::MissingColumns(missing) => {
                assert!(missing.contains(&"State".to_string()));
                assert!(missing.contains(&"Quantity".to_string()));
                assert!(!missing.contains(&"Sales".to_string()));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn rejects_empty_payload() {
        let err = DataLoader::load_csv_bytes(Vec::new()).unwrap_err();
        assert!(matches!(err, LoaderError::NoData));
    }

    #[test]
    fn missing_file_is_a_load_failure() {
        let source = DataSource::Upload(PathBuf::from("/definitely/not/here.csv"));
        let err = DataLoader::load(&source).unwrap_err();
        assert!(matches!(err, LoaderError::Io { .. }));
    }

    #[test]
    fn loads_from_file_and_names_source() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(
            file,
            "2014-02-01,West,California,Los Angeles,Technology,Phones,United States,50,5,1"
        )
        .unwrap();

        let source = DataSource::Upload(file.path().to_path_buf());
        let raw = DataLoader::load(&source).unwrap();
        assert_eq!(raw.row_count(), 1);
        assert!(raw.source_name.ends_with(".csv"));
        assert!(raw.columns().contains(&"Sub-Category".to_string()));
    }

    /// Write a one-row workbook with `columns` as the header. Cells after the
    /// Order Date are the given strings/numbers; `City` is left empty.
    fn write_workbook(path: &Path, columns: &[&str]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let order_date = ExcelDateTime::from_ymd(2014, 8, 11).unwrap();

        for (col, name) in columns.iter().enumerate() {
            let col = col as u16;
            sheet.write_string(0, col, *name).unwrap();
            match *name {
                "Order Date" => {
                    sheet
                        .write_datetime_with_format(1, col, &order_date, &date_format)
                        .unwrap();
                }
                "City" => {}
                "Sales" => {
                    sheet.write_number(1, col, 100.5).unwrap();
                }
                "Profit" => {
                    sheet.write_number(1, col, -12.25).unwrap();
                }
                "Quantity" => {
                    sheet.write_number(1, col, 3.0).unwrap();
                }
                other => {
                    sheet.write_string(1, col, format!("{} value", other)).unwrap();
                }
            }
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn loads_first_worksheet_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.xlsx");
        let columns: Vec<&str> = HEADER.split(',').collect();
        write_workbook(&path, &columns);

        let raw = DataLoader::load(&DataSource::Upload(path)).unwrap();
        assert_eq!(raw.source_name, "orders.xlsx");
        assert_eq!(raw.row_count(), 1);
        assert_eq!(raw.columns(), columns);

        let text = |name: &str| {
            let column = raw.df.column(name).unwrap().as_materialized_series().clone();
            column.str().unwrap().get(0).map(|s| s.to_string())
        };
        assert_eq!(text("Order Date").as_deref(), Some("2014-08-11"));
        assert_eq!(text("Sales").as_deref(), Some("100.5"));
        assert_eq!(text("Profit").as_deref(), Some("-12.25"));
        assert_eq!(text("Quantity").as_deref(), Some("3"));
        assert_eq!(text("Region").as_deref(), Some("Region value"));
        assert_eq!(text("City"), None);

        let records = Normalizer::default().normalize(&raw).unwrap().records().unwrap();
        assert_eq!(records[0].order_date, NaiveDate::from_ymd_opt(2014, 8, 11));
        assert_eq!(records[0].city, "");
        assert_eq!(records[0].sales, 100.5);
        assert_eq!(records[0].quantity, 3.0);
    }

    #[test]
    fn spreadsheet_missing_columns_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.xlsx");
        let columns: Vec<&str> = HEADER.split(',').filter(|c| *c != "Sales").collect();
        write_workbook(&path, &columns);

        match DataLoader::load(&DataSource::Upload(path)) {
            Err(LoaderError::MissingColumns(missing)) => {
                assert_eq!(missing, vec!["Sales".to_string()]);
            }
            other => panic!("expected missing columns, got {:?}", other.map(|r| r.row_count())),
        }
    }
}
