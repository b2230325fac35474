//! Aggregation Module
//! Grouped sales totals feeding each dashboard chart.

use crate::data::schema::*;
use crate::data::table::{text_values, SalesTable};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Sales summed for one category or country.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTotal {
    pub label: String,
    pub sales: f64,
}

/// Sales summed for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub sales: f64,
}

impl MonthlyTotal {
    /// "YYYY : Mon", e.g. "2014 : Jan".
    pub fn label(&self) -> String {
        let index = (self.month as usize).saturating_sub(1).min(11);
        format!("{} : {}", self.year, MONTH_ABBREVIATIONS[index])
    }
}

/// Sales summed for one Region / Category / Sub-Category path.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyTotal {
    pub region: String,
    pub category: String,
    pub sub_category: String,
    pub sales: f64,
}

/// Row-level values for the Sales vs Profit scatter plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub sales: f64,
    pub profit: f64,
    pub quantity: f64,
}

/// Computes the aggregate views from a filtered table.
pub struct Aggregator;

impl Aggregator {
    /// Sum of Sales per Category, sorted by category.
    pub fn category_totals(table: &SalesTable) -> Result<Vec<LabelTotal>, AggregateError> {
        Self::totals_by(table, CATEGORY)
    }

    /// Sum of Sales per Country, sorted by country.
    pub fn country_totals(table: &SalesTable) -> Result<Vec<LabelTotal>, AggregateError> {
        Self::totals_by(table, COUNTRY)
    }

    fn totals_by(table: &SalesTable, key: &str) -> Result<Vec<LabelTotal>, AggregateError> {
        let grouped = Self::sum_sales(table, &[key])?;
        let labels = text_values(&grouped, key)?;
        let sales = Self::sales_column(&grouped)?;

        let mut totals: Vec<LabelTotal> = labels
            .into_iter()
            .zip(sales)
            .map(|(label, sales)| LabelTotal { label, sales })
            .collect();
        totals.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(totals)
    }

    /// Sum of Sales per (year, month) in chronological order.
    /// Rows without an order date have no bucket.
    pub fn monthly_totals(table: &SalesTable) -> Result<Vec<MonthlyTotal>, AggregateError> {
        let dates = table.order_dates()?;
        let sales = table.metric_values(SALES)?;

        let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for (date, value) in dates.into_iter().zip(sales) {
            if let Some(date) = date {
                *buckets.entry(Self::month_key(date)).or_insert(0.0) += value;
            }
        }

        Ok(buckets
            .into_iter()
            .map(|((year, month), sales)| MonthlyTotal { year, month, sales })
            .collect())
    }

    /// Sum of Sales per Region / Category / Sub-Category, sorted by path.
    pub fn hierarchy_totals(table: &SalesTable) -> Result<Vec<HierarchyTotal>, AggregateError> {
        let grouped = Self::sum_sales(table, &[REGION, CATEGORY, SUB_CATEGORY])?;
        let regions = text_values(&grouped, REGION)?;
        let categories = text_values(&grouped, CATEGORY)?;
        let sub_categories = text_values(&grouped, SUB_CATEGORY)?;
        let sales = Self::sales_column(&grouped)?;

        let mut totals: Vec<HierarchyTotal> = regions
            .into_iter()
            .zip(categories)
            .zip(sub_categories)
            .zip(sales)
            .map(|(((region, category), sub_category), sales)| HierarchyTotal {
                region,
                category,
                sub_category,
                sales,
            })
            .collect();
        totals.sort_by(|a, b| {
            (&a.region, &a.category, &a.sub_category).cmp(&(
                &b.region,
                &b.category,
                &b.sub_category,
            ))
        });
        Ok(totals)
    }

    /// One point per row.
    pub fn scatter_points(table: &SalesTable) -> Result<Vec<ScatterPoint>, AggregateError> {
        let sales = table.metric_values(SALES)?;
        let profit = table.metric_values(PROFIT)?;
        let quantity = table.metric_values(QUANTITY)?;

        Ok(sales
            .into_iter()
            .zip(profit)
            .zip(quantity)
            .map(|((sales, profit), quantity)| ScatterPoint {
                sales,
                profit,
                quantity,
            })
            .collect())
    }

    fn month_key(date: NaiveDate) -> (i32, u32) {
        (date.year(), date.month())
    }

    fn sum_sales(table: &SalesTable, keys: &[&str]) -> Result<DataFrame, AggregateError> {
        let by: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
        let grouped = table
            .df()
            .clone()
            .lazy()
            .group_by(by)
            .agg([col(SALES).sum()])
            .collect()?;
        Ok(grouped)
    }

    /// Summed sales with NaN treated as 0.
    fn sales_column(grouped: &DataFrame) -> Result<Vec<f64>, AggregateError> {
        let sales = grouped.column(SALES)?.cast(&DataType::Float64)?;
        Ok(sales
            .as_materialized_series()
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()).unwrap_or(0.0))
            .collect())
    }
}
