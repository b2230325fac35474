//! Row Filter Module
//! Date-range and Region/State/City filters over a `SalesTable`.

use crate::data::schema::{to_epoch_days, CITY, ORDER_DATE, REGION, STATE};
use crate::data::table::SalesTable;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Inclusive order-date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Fill unset ends from the table's min/max order date.
    /// `None` when an end is unset and the table has no dated rows.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        bounds: Option<(NaiveDate, NaiveDate)>,
    ) -> Option<Self> {
        let start = start.or(bounds.map(|(lo, _)| lo))?;
        let end = end.or(bounds.map(|(_, hi)| hi))?;
        Some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Multi-select state for the three geographic dimensions. Empty = no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionSelection {
    pub regions: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub cities: BTreeSet<String>,
}

impl DimensionSelection {
    pub fn clear(&mut self) {
        self.regions.clear();
        self.states.clear();
        self.cities.clear();
    }

    /// Drop choices no longer offered. Returns true if anything was removed.
    pub fn retain_offered(&mut self, options: &FilterOptions) -> bool {
        let before = self.regions.len() + self.states.len() + self.cities.len();
        self.regions.retain(|v| options.regions.contains(v));
        self.states.retain(|v| options.states.contains(v));
        self.cities.retain(|v| options.cities.contains(v));
        before != self.regions.len() + self.states.len() + self.cities.len()
    }
}

/// Choices offered by each multi-select, scoped to the upstream selections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub states: Vec<String>,
    pub cities: Vec<String>,
}

impl FilterOptions {
    /// Regions come from the date-filtered table, states from the
    /// region-filtered subset and cities from the region+state subset.
    pub fn scoped(
        date_filtered: &SalesTable,
        selection: &DimensionSelection,
    ) -> Result<Self, FilterError> {
        let regions = date_filtered.distinct(REGION)?;

        let by_region = restrict(date_filtered, REGION, &selection.regions)?;
        let states = by_region.distinct(STATE)?;

        let by_state = restrict(&by_region, STATE, &selection.states)?;
        let cities = by_state.distinct(CITY)?;

        Ok(Self {
            regions,
            states,
            cities,
        })
    }
}

/// Keep rows whose order date lies in `range`; rows without a date never pass.
pub fn filter_by_date(
    table: &SalesTable,
    range: Option<&DateRange>,
) -> Result<SalesTable, FilterError> {
    let Some(range) = range else {
        return Ok(table.empty_like());
    };

    let day = || col(ORDER_DATE).cast(DataType::Int32);
    let df = table
        .df()
        .clone()
        .lazy()
        .filter(
            day()
                .gt_eq(lit(to_epoch_days(range.start)))
                .and(day().lt_eq(lit(to_epoch_days(range.end)))),
        )
        .collect()?;

    debug!(
        start = %range.start,
        end = %range.end,
        kept = df.height(),
        of = table.height(),
        "date filter applied"
    );
    Ok(SalesTable::from_frame(df))
}

/// Apply the Region/State/City multi-selects to the date-filtered table.
///
/// | regions | states | cities | predicate                    |
/// |---------|--------|--------|------------------------------|
/// | -       | -      | -      | none                         |
/// | set     | -      | -      | region                       |
/// | -       | set    | -      | state                        |
/// | set     | -      | set    | region and city              |
/// | set     | set    | -      | region and state             |
/// | -       | set    | set    | state and city               |
/// | *       | *      | set    | region and state and city    |
///
/// The last row covers both "cities only" and "all three"; it is evaluated
/// against the region+state scoped subset, where an empty upstream set
/// restricts nothing.
pub fn apply_dimensions(
    table: &SalesTable,
    selection: &DimensionSelection,
) -> Result<SalesTable, FilterError> {
    let regions = &selection.regions;
    let states = &selection.states;
    let cities = &selection.cities;

    let predicate = match (!regions.is_empty(), !states.is_empty(), !cities.is_empty()) {
        (false, false, false) => return Ok(table.clone()),
        (true, false, false) => member_of(REGION, regions),
        (false, true, false) => member_of(STATE, states),
        (true, false, true) => member_of(REGION, regions).and(member_of(CITY, cities)),
        (true, true, false) => member_of(REGION, regions).and(member_of(STATE, states)),
        (false, true, true) => member_of(STATE, states).and(member_of(CITY, cities)),
        (_, _, true) => {
            let scoped = restrict(&restrict(table, REGION, regions)?, STATE, states)?;
            let df = scoped
                .df()
                .clone()
                .lazy()
                .filter(member_of(CITY, cities))
                .collect()?;
            return Ok(log_selection(table, SalesTable::from_frame(df), selection));
        }
    };

    let df = table.df().clone().lazy().filter(predicate).collect()?;
    Ok(log_selection(table, SalesTable::from_frame(df), selection))
}

fn log_selection(
    input: &SalesTable,
    output: SalesTable,
    selection: &DimensionSelection,
) -> SalesTable {
    debug!(
        regions = selection.regions.len(),
        states = selection.states.len(),
        cities = selection.cities.len(),
        kept = output.height(),
        of = input.height(),
        "dimension filter applied"
    );
    output
}

/// `column ∈ values`, built as a chain of equalities.
fn member_of(column: &str, values: &BTreeSet<String>) -> Expr {
    values
        .iter()
        .fold(lit(false), |acc, v| acc.or(col(column).eq(lit(v.as_str()))))
}

/// Filter on one dimension; an empty set leaves the table unchanged.
fn restrict(
    table: &SalesTable,
    column: &str,
    values: &BTreeSet<String>,
) -> Result<SalesTable, FilterError> {
    if values.is_empty() {
        return Ok(table.clone());
    }
    let df = table
        .df()
        .clone()
        .lazy()
        .filter(member_of(column, values))
        .collect()?;
    Ok(SalesTable::from_frame(df))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::Record;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn geo(region: &str, state: &str, city: &str, sales: f64) -> Record {
        Record {
            order_date: Some(date(2015, 6, 1)),
            region: region.to_string(),
            state: state.to_string(),
            city: city.to_string(),
            category: "Office Supplies".to_string(),
            sales,
            ..Default::default()
        }
    }

    fn geo_table() -> SalesTable {
        SalesTable::from_records(&[
            geo("East", "New York", "New York City", 1.0),
            geo("East", "New York", "Buffalo", 2.0),
            geo("East", "Pennsylvania", "Philadelphia", 4.0),
            geo("West", "California", "Los Angeles", 8.0),
            geo("West", "California", "San Francisco", 16.0),
            geo("West", "Washington", "Seattle", 32.0),
            // Same city name in a different region/state.
            geo("Central", "Texas", "Buffalo", 64.0),
        ])
        .unwrap()
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn sales_after(selection: &DimensionSelection) -> f64 {
        apply_dimensions(&geo_table(), selection)
            .unwrap()
            .total_sales()
            .unwrap()
    }

    fn dated(dates: &[Option<NaiveDate>]) -> SalesTable {
        let records: Vec<Record> = dates
            .iter()
            .map(|d| Record {
                order_date: *d,
                sales: 1.0,
                ..Default::default()
            })
            .collect();
        SalesTable::from_records(&records).unwrap()
    }

    #[test]
    fn date_filter_is_inclusive() {
        let table = dated(&[
            Some(date(2014, 1, 1)),
            Some(date(2014, 1, 15)),
            Some(date(2014, 1, 31)),
            Some(date(2014, 2, 1)),
            None,
        ]);
        let range = DateRange::new(date(2014, 1, 1), date(2014, 1, 31));
        let kept = filter_by_date(&table, Some(&range)).unwrap();

        let dates: Vec<_> = kept.order_dates().unwrap().into_iter().flatten().collect();
        assert_eq!(
            dates,
            vec![date(2014, 1, 1), date(2014, 1, 15), date(2014, 1, 31)]
        );
        assert!(dates.iter().all(|d| range.contains(*d)));
    }

    #[test]
    fn reversed_range_is_empty() {
        let table = dated(&[Some(date(2014, 1, 1)), Some(date(2014, 6, 1))]);
        let range = DateRange::new(date(2014, 6, 1), date(2014, 1, 1));
        assert!(filter_by_date(&table, Some(&range)).unwrap().is_empty());
    }

    #[test]
    fn unresolved_range_yields_empty_table() {
        let table = dated(&[None, None]);
        let range = DateRange::resolve(None, None, table.date_bounds().unwrap());
        assert_eq!(range, None);
        assert!(filter_by_date(&table, range.as_ref()).unwrap().is_empty());
    }

    #[test]
    fn resolve_defaults_to_table_bounds() {
        let bounds = Some((date(2014, 1, 1), date(2017, 12, 30)));
        let explicit_start = DateRange::resolve(Some(date(2015, 1, 1)), None, bounds).unwrap();
        assert_eq!(explicit_start.start, date(2015, 1, 1));
        assert_eq!(explicit_start.end, date(2017, 12, 30));
        assert_eq!(
            DateRange::resolve(None, None, bounds),
            Some(DateRange::new(date(2014, 1, 1), date(2017, 12, 30)))
        );
    }

    #[test]
    fn no_selection_is_unrestricted() {
        assert_eq!(sales_after(&DimensionSelection::default()), 127.0);
    }

    #[test]
    fn region_only() {
        let selection = DimensionSelection {
            regions: set(&["East"]),
            ..Default::default()
        };
        assert_eq!(sales_after(&selection), 7.0);
    }

    #[test]
    fn state_only() {
        let selection = DimensionSelection {
            states: set(&["California", "Texas"]),
            ..Default::default()
        };
        assert_eq!(sales_after(&selection), 88.0);
    }

    #[test]
    fn city_only_matches_city_anywhere() {
        let selection = DimensionSelection {
            cities: set(&["Buffalo"]),
            ..Default::default()
        };
        assert_eq!(sales_after(&selection), 66.0);
    }

    #[test]
    fn region_and_city() {
        let selection = DimensionSelection {
            regions: set(&["East"]),
            cities: set(&["Buffalo"]),
            ..Default::default()
        };
        assert_eq!(sales_after(&selection), 2.0);
    }

    #[test]
    fn region_and_state() {
        let selection = DimensionSelection {
            regions: set(&["West"]),
            states: set(&["California", "New York"]),
            ..Default::default()
        };
        assert_eq!(sales_after(&selection), 24.0);
    }

    #[test]
    fn state_and_city() {
        let selection = DimensionSelection {
            states: set(&["Texas"]),
            cities: set(&["Buffalo", "Seattle"]),
            ..Default::default()
        };
        assert_eq!(sales_after(&selection), 64.0);
    }

    #[test]
    fn all_three() {
        let selection = DimensionSelection {
            regions: set(&["East", "West"]),
            states: set(&["New York", "Washington"]),
            cities: set(&["Buffalo", "Seattle", "Los Angeles"]),
        };
        assert_eq!(sales_after(&selection), 34.0);
    }

    #[test]
    fn unknown_values_select_nothing() {
        let selection = DimensionSelection {
            regions: set(&["Atlantis"]),
            ..Default::default()
        };
        assert_eq!(sales_after(&selection), 0.0);
    }

    #[test]
    fn options_are_scoped_to_upstream_choices() {
        let table = geo_table();

        let all = FilterOptions::scoped(&table, &DimensionSelection::default()).unwrap();
        assert_eq!(all.regions, vec!["Central", "East", "West"]);
        assert_eq!(all.states.len(), 5);

        let east = DimensionSelection {
            regions: set(&["East"]),
            ..Default::default()
        };
        let scoped = FilterOptions::scoped(&table, &east).unwrap();
        assert_eq!(scoped.regions, vec!["Central", "East", "West"]);
        assert_eq!(scoped.states, vec!["New York", "Pennsylvania"]);
        assert_eq!(
            scoped.cities,
            vec!["Buffalo", "New York City", "Philadelphia"]
        );

        let new_york = DimensionSelection {
            regions: set(&["East"]),
            states: set(&["New York"]),
            ..Default::default()
        };
        let scoped = FilterOptions::scoped(&table, &new_york).unwrap();
        assert_eq!(scoped.cities, vec!["Buffalo", "New York City"]);
    }

    #[test]
    fn stale_choices_are_pruned() {
        let table = geo_table();
        let mut selection = DimensionSelection {
            regions: set(&["West"]),
            states: set(&["New York"]),
            ..Default::default()
        };

        let options = FilterOptions::scoped(&table, &selection).unwrap();
        assert!(selection.retain_offered(&options));
        assert_eq!(selection.regions, set(&["West"]));
        assert!(selection.states.is_empty());
        assert!(!selection.retain_offered(&options));
    }
}
