//! Dashboard Pipeline
//! `render(table, filters) -> views`: the whole filter and aggregate pass,
//! recomputed from scratch on every control change.

use crate::data::{
    apply_dimensions, filter_by_date, AggregateError, Aggregator, DataLoader, DataSource,
    DateRange, DimensionSelection, FilterError, FilterOptions, HierarchyTotal, LabelTotal,
    LoaderError, MonthlyTotal, NormalizeError, Normalizer, SalesTable, ScatterPoint,
};
use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("Normalization failed: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("Filter failed: {0}")]
    Filter(#[from] FilterError),
    #[error("Aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Every user-controlled input. Unset dates default to the table's bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub selection: DimensionSelection,
}

/// Everything the renderers consume for one pass.
#[derive(Debug, Clone)]
pub struct DashboardViews {
    /// Table-wide min/max order date, used to seed the date inputs.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub date_range: Option<DateRange>,
    pub options: FilterOptions,
    /// After the date filter only; backs the full-dataset download.
    pub date_filtered: SalesTable,
    /// After date and dimension filters; backs every chart.
    pub filtered: SalesTable,
    pub categories: Vec<LabelTotal>,
    pub countries: Vec<LabelTotal>,
    pub monthly: Vec<MonthlyTotal>,
    pub hierarchy: Vec<HierarchyTotal>,
    pub scatter: Vec<ScatterPoint>,
    pub total_sales: f64,
}

pub struct Dashboard;

impl Dashboard {
    /// Load and normalize a source. Returns the table and its display name.
    pub fn load(
        source: &DataSource,
        date_formats: &[String],
    ) -> Result<(SalesTable, String), DashboardError> {
        let raw = DataLoader::load(source)?;
        let table = Normalizer::new(date_formats).normalize(&raw)?;
        Ok((table, raw.source_name))
    }

    pub fn render(
        table: &SalesTable,
        filters: &FilterState,
    ) -> Result<DashboardViews, DashboardError> {
        let date_bounds = table.date_bounds()?;
        let date_range = DateRange::resolve(filters.start, filters.end, date_bounds);

        let date_filtered = filter_by_date(table, date_range.as_ref())?;
        let options = FilterOptions::scoped(&date_filtered, &filters.selection)?;
        let filtered = apply_dimensions(&date_filtered, &filters.selection)?;

        let views = DashboardViews {
            date_bounds,
            date_range,
            options,
            categories: Aggregator::category_totals(&filtered)?,
            countries: Aggregator::country_totals(&filtered)?,
            monthly: Aggregator::monthly_totals(&filtered)?,
            hierarchy: Aggregator::hierarchy_totals(&filtered)?,
            scatter: Aggregator::scatter_points(&filtered)?,
            total_sales: filtered.total_sales()?,
            date_filtered,
            filtered,
        };

        info!(
            rows = table.height(),
            date_filtered = views.date_filtered.height(),
            filtered = views.filtered.height(),
            total_sales = views.total_sales,
            "dashboard recomputed"
        );
        Ok(views)
    }
}
