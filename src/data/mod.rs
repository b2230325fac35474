//! Data module - loading, normalization, filtering, aggregation and export

mod aggregator;
mod export;
mod filter;
mod loader;
mod normalizer;
pub mod schema;
mod table;

pub use aggregator::{
    AggregateError, Aggregator, HierarchyTotal, LabelTotal, MonthlyTotal, ScatterPoint,
};
pub use export::{
    dataset_csv, monthly_csv, parse_monthly_csv, write_csv, ExportError, DATASET_FILE,
    MONTH_COLUMN, TIME_SERIES_FILE,
};
pub use filter::{
    apply_dimensions, filter_by_date, DateRange, DimensionSelection, FilterError, FilterOptions,
};
pub use loader::{DataLoader, DataSource, LoaderError, RawTable, TextEncoding};
pub use normalizer::{NormalizeError, Normalizer, DEFAULT_DATE_FORMATS};
pub use schema::Record;
pub use table::SalesTable;
