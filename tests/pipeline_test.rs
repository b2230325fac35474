//! End-to-end checks over the bundled sample dataset.

use chrono::{Datelike, NaiveDate};
use pretty_assertions::assert_eq;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use superstore_eda::config::{DashboardConfig, DEFAULT_DATASET};
use superstore_eda::dashboard::{Dashboard, FilterState};
use superstore_eda::data::{
    dataset_csv, monthly_csv, parse_monthly_csv, write_csv, DataLoader, DataSource,
    DimensionSelection, LoaderError, SalesTable, DATASET_FILE,
};

fn bundled() -> DataSource {
    DataSource::Default(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_DATASET))
}

fn load() -> SalesTable {
    let config = DashboardConfig::default();
    let (table, name) = Dashboard::load(&bundled(), &config.date_formats).unwrap();
    assert_eq!(name, "GlobalSuperstoreliteOriginal.csv");
    table
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn bundled_dataset_loads_with_every_date_parsed() {
    let table = load();
    assert_eq!(table.height(), 40);
    assert_eq!(
        table.date_bounds().unwrap(),
        Some((date(2014, 1, 4), date(2016, 11, 27)))
    );
    assert!(table.order_dates().unwrap().iter().all(|d| d.is_some()));
    assert_eq!(
        table.distinct("Region").unwrap(),
        vec!["Central", "East", "South", "West"]
    );
}

#[test]
fn default_filters_keep_everything_and_conserve_totals() {
    let table = load();
    let views = Dashboard::render(&table, &FilterState::default()).unwrap();

    assert_eq!(views.filtered.height(), 40);
    let direct: f64 = views
        .filtered
        .records()
        .unwrap()
        .iter()
        .map(|r| r.sales)
        .sum();
    let by_category: f64 = views.categories.iter().map(|t| t.sales).sum();
    let by_country: f64 = views.countries.iter().map(|t| t.sales).sum();
    let by_month: f64 = views.monthly.iter().map(|m| m.sales).sum();
    let by_leaf: f64 = views.hierarchy.iter().map(|h| h.sales).sum();

    assert!(close(views.total_sales, direct));
    assert!(close(by_category, direct));
    assert!(close(by_country, direct));
    assert!(close(by_month, direct));
    assert!(close(by_leaf, direct));
    assert_eq!(views.scatter.len(), 40);
    assert_eq!(
        views.countries.iter().map(|t| t.label.as_str()).collect::<Vec<_>>(),
        vec!["Canada", "Mexico", "United States"]
    );
}

#[test]
fn monthly_buckets_match_rows() {
    let table = load();
    let views = Dashboard::render(&table, &FilterState::default()).unwrap();

    let mut expected: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in views.filtered.records().unwrap() {
        let day = record.order_date.unwrap();
        *expected.entry((day.year(), day.month())).or_insert(0.0) += record.sales;
    }

    let keys: Vec<(i32, u32)> = views.monthly.iter().map(|m| (m.year, m.month)).collect();
    assert_eq!(keys, expected.keys().copied().collect::<Vec<_>>());
    for bucket in &views.monthly {
        assert!(close(bucket.sales, expected[&(bucket.year, bucket.month)]));
    }
    assert_eq!(views.monthly[0].label(), "2014 : Jan");
}

#[test]
fn date_range_is_inclusive() {
    let table = load();
    let filters = FilterState {
        start: Some(date(2015, 1, 1)),
        end: Some(date(2015, 12, 31)),
        ..Default::default()
    };
    let views = Dashboard::render(&table, &filters).unwrap();

    assert_eq!(views.date_filtered.height(), 11);
    assert!(views
        .date_filtered
        .order_dates()
        .unwrap()
        .iter()
        .all(|d| d.map_or(false, |d| d.year() == 2015)));

    let reversed = FilterState {
        start: Some(date(2016, 1, 1)),
        end: Some(date(2015, 1, 1)),
        ..Default::default()
    };
    let views = Dashboard::render(&table, &reversed).unwrap();
    assert!(views.filtered.is_empty());
    assert!(views.categories.is_empty());
}

#[test]
fn region_filter_narrows_charts_but_not_the_download() {
    let table = load();
    let filters = FilterState {
        selection: DimensionSelection {
            regions: BTreeSet::from(["East".to_string()]),
            ..Default::default()
        },
        ..Default::default()
    };
    let views = Dashboard::render(&table, &filters).unwrap();

    assert_eq!(views.filtered.height(), 11);
    assert!(views
        .filtered
        .records()
        .unwrap()
        .iter()
        .all(|r| r.region == "East"));
    assert_eq!(views.date_filtered.height(), 40);
    assert_eq!(views.options.states, vec!["New York", "Pennsylvania"]);
}

#[test]
fn exports_round_trip() {
    let table = load();
    let views = Dashboard::render(&table, &FilterState::default()).unwrap();

    let bytes = monthly_csv(&views.monthly).unwrap();
    let parsed = parse_monthly_csv(&bytes).unwrap();
    let expected: Vec<(String, f64)> = views.monthly.iter().map(|m| (m.label(), m.sales)).collect();
    assert_eq!(parsed, expected);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DATASET_FILE);
    write_csv(&path, &dataset_csv(&views.date_filtered).unwrap()).unwrap();

    let reloaded = DataLoader::load(&DataSource::Upload(path)).unwrap();
    assert_eq!(reloaded.row_count(), 40);
    let source = DataLoader::load(&bundled()).unwrap();
    assert_eq!(reloaded.columns(), source.columns());
    assert_eq!(reloaded.columns()[0], "Row ID");
}

#[test]
fn wrong_schema_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("other.csv");
    std::fs::write(&path, "Name,Value\nwidget,3\n").unwrap();

    match DataLoader::load(&DataSource::Upload(path)) {
        Err(LoaderError::MissingColumns(missing)) => {
            assert!(missing.contains(&"Order Date".to_string()));
            assert!(missing.contains(&"Sales".to_string()));
        }
        other => panic!("expected missing columns, got {:?}", other.map(|t| t.row_count())),
    }
}
