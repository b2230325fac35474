//! Sales Dataset Schema
//! Column names of the superstore dataset and the typed `Record` row.

use chrono::NaiveDate;

pub const ORDER_DATE: &str = "Order Date";
pub const REGION: &str = "Region";
pub const STATE: &str = "State";
pub const CITY: &str = "City";
pub const CATEGORY: &str = "Category";
pub const SUB_CATEGORY: &str = "Sub-Category";
pub const COUNTRY: &str = "Country";
pub const SALES: &str = "Sales";
pub const PROFIT: &str = "Profit";
pub const QUANTITY: &str = "Quantity";

/// Columns an input file must carry to be accepted.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    ORDER_DATE,
    REGION,
    STATE,
    CITY,
    CATEGORY,
    SUB_CATEGORY,
    COUNTRY,
    SALES,
    PROFIT,
    QUANTITY,
];

/// Numeric metrics; always `Float64` after normalization.
pub const METRIC_COLUMNS: [&str; 3] = [SALES, PROFIT, QUANTITY];

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Polars stores `Date` as days since the Unix epoch.
pub fn to_epoch_days(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// One row of the sales dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// `None` when the source value could not be parsed as a date.
    pub order_date: Option<NaiveDate>,
    pub region: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub sub_category: String,
    pub country: String,
    pub sales: f64,
    pub profit: f64,
    pub quantity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_days_round_trip() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(to_epoch_days(epoch), 0);

        let date = NaiveDate::from_ymd_opt(2014, 11, 8).unwrap();
        assert_eq!(from_epoch_days(to_epoch_days(date)), Some(date));

        let before = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        assert_eq!(to_epoch_days(before), -1);
    }
}
