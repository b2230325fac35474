//! Sales Table Module
//! The normalized, typed working table every pipeline stage consumes.

use crate::data::schema::*;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;

/// A normalized sales table.
///
/// Schema: `Order Date` is `Date` (null when unparseable), the text
/// dimensions are non-null `String`, and `Sales`/`Profit`/`Quantity` are
/// non-null `Float64`. Columns keep their source order and any extra
/// source columns stay `String`.
/// Every filter produces a new table; rows are never mutated in place.
#[derive(Debug, Clone)]
pub struct SalesTable {
    df: DataFrame,
}

impl SalesTable {
    /// Wrap a frame that already follows the normalized schema.
    pub(crate) fn from_frame(df: DataFrame) -> Self {
        Self { df }
    }

    /// Build a table from typed records.
    pub fn from_records(records: &[Record]) -> PolarsResult<Self> {
        let days: Vec<Option<i32>> = records
            .iter()
            .map(|r| r.order_date.map(to_epoch_days))
            .collect();
        let text = |name: &str, field: fn(&Record) -> &String| {
            Column::new(
                name.into(),
                records.iter().map(|r| field(r).clone()).collect::<Vec<String>>(),
            )
        };
        let metric = |name: &str, field: fn(&Record) -> f64| {
            Column::new(name.into(), records.iter().map(field).collect::<Vec<f64>>())
        };

        let df = DataFrame::new(vec![
            Column::new(ORDER_DATE.into(), days).cast(&DataType::Date)?,
            text(REGION, |r| &r.region),
            text(STATE, |r| &r.state),
            text(CITY, |r| &r.city),
            text(CATEGORY, |r| &r.category),
            text(SUB_CATEGORY, |r| &r.sub_category),
            text(COUNTRY, |r| &r.country),
            metric(SALES, |r| r.sales),
            metric(PROFIT, |r| r.profit),
            metric(QUANTITY, |r| r.quantity),
        ])?;

        Ok(Self { df })
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Same schema, zero rows.
    pub fn empty_like(&self) -> Self {
        Self {
            df: self.df.clear(),
        }
    }

    pub fn text_values(&self, column: &str) -> PolarsResult<Vec<String>> {
        text_values(&self.df, column)
    }

    pub fn metric_values(&self, column: &str) -> PolarsResult<Vec<f64>> {
        let values = self.df.column(column)?.cast(&DataType::Float64)?;
        Ok(values
            .as_materialized_series()
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()).unwrap_or(0.0))
            .collect())
    }

    pub fn order_dates(&self) -> PolarsResult<Vec<Option<NaiveDate>>> {
        let days = self.df.column(ORDER_DATE)?.cast(&DataType::Int32)?;
        Ok(days
            .as_materialized_series()
            .i32()?
            .into_iter()
            .map(|d| d.and_then(from_epoch_days))
            .collect())
    }

    /// Sorted distinct values of a text column.
    pub fn distinct(&self, column: &str) -> PolarsResult<Vec<String>> {
        let unique: BTreeSet<String> = self.text_values(column)?.into_iter().collect();
        Ok(unique.into_iter().collect())
    }

    /// Earliest and latest parseable order date.
    pub fn date_bounds(&self) -> PolarsResult<Option<(NaiveDate, NaiveDate)>> {
        let dates = self.order_dates()?;
        let mut known = dates.into_iter().flatten();
        let Some(first) = known.next() else {
            return Ok(None);
        };
        Ok(Some(known.fold((first, first), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })))
    }

    pub fn total_sales(&self) -> PolarsResult<f64> {
        Ok(self.metric_values(SALES)?.iter().sum())
    }

    pub fn records(&self) -> PolarsResult<Vec<Record>> {
        let dates = self.order_dates()?;
        let regions = self.text_values(REGION)?;
        let states = self.text_values(STATE)?;
        let cities = self.text_values(CITY)?;
        let categories = self.text_values(CATEGORY)?;
        let sub_categories = self.text_values(SUB_CATEGORY)?;
        let countries = self.text_values(COUNTRY)?;
        let sales = self.metric_values(SALES)?;
        let profit = self.metric_values(PROFIT)?;
        let quantity = self.metric_values(QUANTITY)?;

        Ok((0..self.height())
            .map(|i| Record {
                order_date: dates[i],
                region: regions[i].clone(),
                state: states[i].clone(),
                city: cities[i].clone(),
                category: categories[i].clone(),
                sub_category: sub_categories[i].clone(),
                country: countries[i].clone(),
                sales: sales[i],
                profit: profit[i],
                quantity: quantity[i],
            })
            .collect())
    }
}

/// Values of a column rendered as text, nulls as empty strings.
pub(crate) fn text_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<String>> {
    let values = df.column(column)?.cast(&DataType::String)?;
    Ok(values
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect())
}
