//! Narrowing the order table by purchase date, region and category

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use serde::Serialize;

use crate::data::{
    from_millis, to_millis, OrderTable, CATEGORY_COLUMN, PURCHASED_AT_COLUMN, REGION_COLUMN,
};

/// User selections applied to the order records.
///
/// `None` means "not chosen" and falls back to everything present in the
/// data. An empty set is an explicit selection of nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub regions: Option<BTreeSet<String>>,
    pub categories: Option<BTreeSet<String>>,
}

impl FilterCriteria {
    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// True when an explicit selection rules out every record
    pub fn selects_nothing(&self) -> bool {
        let empty = |set: &Option<BTreeSet<String>>| set.as_ref().is_some_and(BTreeSet::is_empty);
        empty(&self.regions) || empty(&self.categories)
    }

    /// Row predicate for these criteria; `None` when nothing narrows the rows.
    ///
    /// Date bounds are only applied when the table has purchase times.
    fn predicate(&self, has_timestamps: bool) -> Option<Expr> {
        let mut conditions = Vec::new();
        if has_timestamps {
            if let Some(start) = self.start_date {
                conditions.push(col(PURCHASED_AT_COLUMN).gt_eq(lit(day_start_millis(start))));
            }
            if let Some(end) = self.end_date {
                conditions.push(col(PURCHASED_AT_COLUMN).lt(lit(day_start_millis(end) + MILLIS_PER_DAY)));
            }
        }
        if let Some(regions) = &self.regions {
            conditions.push(col(REGION_COLUMN).is_in(lit(selection(REGION_COLUMN, regions))));
        }
        if let Some(categories) = &self.categories {
            conditions.push(col(CATEGORY_COLUMN).is_in(lit(selection(CATEGORY_COLUMN, categories))));
        }
        conditions.into_iter().reduce(|all, condition| all.and(condition))
    }
}

const MILLIS_PER_DAY: i64 = 86_400_000;

fn day_start_millis(date: NaiveDate) -> i64 {
    to_millis(date.and_time(NaiveTime::MIN))
}

fn selection(name: &str, values: &BTreeSet<String>) -> Series {
    let values: Vec<&str> = values.iter().map(String::as_str).collect();
    Series::new(name.into(), values)
}

/// Keep the orders matching every criterion.
///
/// The date range is closed on both ends at day granularity, so anything
/// purchased on `end_date` up to 23:59:59.999 is kept. When the table has no
/// purchase times the date range is ignored. Row order is preserved and
/// `orders` is left untouched.
pub fn filter_records(orders: &OrderTable, criteria: &FilterCriteria) -> PolarsResult<OrderTable> {
    if criteria.selects_nothing() {
        return Ok(OrderTable::from_frame(orders.frame().head(Some(0))));
    }
    let Some(predicate) = criteria.predicate(orders.has_timestamps()) else {
        return Ok(orders.clone());
    };
    let frame = orders.frame().clone().lazy().filter(predicate).collect()?;
    Ok(OrderTable::from_frame(frame))
}

/// Earliest and latest purchase dates, the default bounds of the date filter.
///
/// `None` for an empty table or one without purchase times.
pub fn date_bounds(orders: &OrderTable) -> PolarsResult<Option<(NaiveDate, NaiveDate)>> {
    if !orders.has_timestamps() {
        return Ok(None);
    }
    let purchased_at = orders.frame().column(PURCHASED_AT_COLUMN)?.i64()?;
    let day = |millis: Option<i64>| millis.and_then(from_millis).map(|ts| ts.date());
    Ok(day(purchased_at.min()).zip(day(purchased_at.max())))
}

/// Sorted distinct region codes
pub fn distinct_regions(orders: &OrderTable) -> PolarsResult<Vec<String>> {
    distinct(orders, REGION_COLUMN)
}

/// Sorted distinct category names
pub fn distinct_categories(orders: &OrderTable) -> PolarsResult<Vec<String>> {
    distinct(orders, CATEGORY_COLUMN)
}

fn distinct(orders: &OrderTable, name: &str) -> PolarsResult<Vec<String>> {
    let values = orders
        .frame()
        .clone()
        .lazy()
        .select([col(name).unique().sort(SortOptions::default())])
        .collect()?;
    Ok(values
        .column(name)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{parse_timestamp, OrderRecord};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order(ts: &str, region: &str, category: &str, value: f64) -> OrderRecord {
        OrderRecord {
            purchased_at: parse_timestamp(ts),
            region: region.to_string(),
            category: category.to_string(),
            payment_value: Some(value),
            payment_type: Some("credit_card".to_string()),
        }
    }

    fn sample() -> Vec<OrderRecord> {
        vec![
            order("2018-01-01 08:00:00", "SP", "toys", 50.0),
            order("2018-06-01 12:00:00", "RJ", "toys", 30.0),
            order("2018-01-31 23:59:59", "MG", "housewares", 12.5),
            order("2017-12-31 23:59:59", "SP", "housewares", 99.0),
            order("2018-02-01 00:00:00", "SP", "toys", 7.0),
        ]
    }

    fn filtered(records: &[OrderRecord], criteria: &FilterCriteria) -> Vec<OrderRecord> {
        let table = OrderTable::from_records(records).unwrap();
        filter_records(&table, criteria).unwrap().records().unwrap()
    }

    #[test]
    fn test_date_range_is_inclusive_by_day() {
        let records = sample();
        let criteria = FilterCriteria::default().with_dates(date(2018, 1, 1), date(2018, 1, 31));

        let kept = filtered(&records, &criteria);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], records[0]);
        assert_eq!(kept[1], records[2], "last second of end date is kept");
    }

    #[test]
    fn test_region_and_category_sets() {
        let records = sample();
        let criteria = FilterCriteria::default()
            .with_regions(["SP"])
            .with_categories(["toys"]);

        let kept = filtered(&records, &criteria);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.region == "SP" && r.category == "toys"));
    }

    #[test]
    fn test_empty_selection_yields_nothing() {
        let records = sample();
        let criteria = FilterCriteria::default()
            .with_dates(date(2000, 1, 1), date(2030, 1, 1))
            .with_categories(Vec::<String>::new());
        assert!(filtered(&records, &criteria).is_empty());

        let criteria = FilterCriteria::default().with_regions(Vec::<String>::new());
        let table = OrderTable::from_records(&records).unwrap();
        let empty = filter_records(&table, &criteria).unwrap();
        assert!(empty.is_empty());
        assert!(empty.has_payment_values(), "columns survive an empty result");
    }

    #[test]
    fn test_unknown_region_is_empty_not_error() {
        let criteria = FilterCriteria::default().with_regions(["XX"]);
        assert!(filtered(&sample(), &criteria).is_empty());
    }

    #[test]
    fn test_default_criteria_keeps_everything() {
        let records = sample();
        assert_eq!(filtered(&records, &FilterCriteria::default()), records);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let criteria = FilterCriteria::default().with_dates(date(2018, 6, 1), date(2018, 1, 1));
        assert!(filtered(&sample(), &criteria).is_empty());
    }

    #[test]
    fn test_filter_is_subset_and_idempotent() {
        let records = sample();
        let criteria = FilterCriteria::default()
            .with_dates(date(2017, 12, 1), date(2018, 2, 1))
            .with_regions(["SP", "MG"]);

        let once = filtered(&records, &criteria);
        assert!(once.iter().all(|r| records.contains(r)));
        let twice = filtered(&once, &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_dates_ignored_without_purchase_times() {
        let records: Vec<OrderRecord> = sample()
            .into_iter()
            .map(|record| OrderRecord {
                purchased_at: None,
                ..record
            })
            .collect();
        let criteria = FilterCriteria::default()
            .with_dates(date(2018, 1, 1), date(2018, 1, 31))
            .with_regions(["SP"]);

        let kept = filtered(&records, &criteria);
        assert_eq!(kept.len(), 3, "only the region narrows the rows");
    }

    #[test]
    fn test_vocabulary_helpers() {
        let table = OrderTable::from_records(&sample()).unwrap();
        assert_eq!(
            date_bounds(&table).unwrap(),
            Some((date(2017, 12, 31), date(2018, 6, 1)))
        );
        assert_eq!(distinct_regions(&table).unwrap(), vec!["MG", "RJ", "SP"]);
        assert_eq!(distinct_categories(&table).unwrap(), vec!["housewares", "toys"]);

        let empty = OrderTable::from_records(&[]).unwrap();
        assert_eq!(date_bounds(&empty).unwrap(), None);
        assert!(distinct_regions(&empty).unwrap().is_empty());
    }
}
