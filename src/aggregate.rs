//! Grouped totals and top/bottom-N orderings used by the dashboard sections

use clap::ValueEnum;
use polars::prelude::*;
use serde::Serialize;

use crate::data::{
    OrderTable, ProductSalesSummary, RegionCustomerSummary, RfmSegmentSummary, CATEGORY_COLUMN,
    PAYMENT_TYPE_COLUMN, PAYMENT_VALUE_COLUMN, REGION_COLUMN,
};

/// Summary rows that carry a count to rank by
pub trait Counted {
    fn count(&self) -> u64;
}

impl Counted for ProductSalesSummary {
    fn count(&self) -> u64 {
        self.order_count
    }
}

impl Counted for RegionCustomerSummary {
    fn count(&self) -> u64 {
        self.unique_customer_count
    }
}

impl Counted for RfmSegmentSummary {
    fn count(&self) -> u64 {
        self.segment_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Order column to group by
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Region,
    Category,
    PaymentType,
}

impl GroupField {
    /// Name of the order table column holding this field
    pub fn column(&self) -> &'static str {
        match self {
            GroupField::Region => REGION_COLUMN,
            GroupField::Category => CATEGORY_COLUMN,
            GroupField::PaymentType => PAYMENT_TYPE_COLUMN,
        }
    }
}

/// Numeric quantity summed per group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    PaymentValue,
    /// Every record contributes 1
    Orders,
}

impl ValueField {
    /// Per-group total of this value; `key` is the grouping column
    fn total(&self, key: &str) -> Expr {
        match self {
            ValueField::PaymentValue => col(PAYMENT_VALUE_COLUMN).sum(),
            ValueField::Orders => col(key).count().cast(DataType::Float64),
        }
    }

    fn column(&self) -> Option<&'static str> {
        match self {
            ValueField::PaymentValue => Some(PAYMENT_VALUE_COLUMN),
            ValueField::Orders => None,
        }
    }
}

/// Summed value for one group key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub group: String,
    pub total: f64,
}

/// Number of records for one group key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub group: String,
    pub count: u64,
}

/// First `n` rows of `summary` ranked by count.
///
/// The sort is stable: rows with equal counts keep their input order.
pub fn top_n_by_count<T: Counted + Clone>(summary: &[T], n: usize, order: SortOrder) -> Vec<T> {
    let mut ranked: Vec<&T> = summary.iter().collect();
    match order {
        SortOrder::Ascending => ranked.sort_by_key(|row| row.count()),
        SortOrder::Descending => ranked.sort_by(|a, b| b.count().cmp(&a.count())),
    }
    ranked.into_iter().take(n).cloned().collect()
}

/// Most and least counted `n` rows, in that order
pub fn top_and_least<T: Counted + Clone>(summary: &[T], n: usize) -> (Vec<T>, Vec<T>) {
    (
        top_n_by_count(summary, n, SortOrder::Descending),
        top_n_by_count(summary, n, SortOrder::Ascending),
    )
}

const TOTAL_COLUMN: &str = "total";
const COUNT_COLUMN: &str = "count";

/// Sum `value_field` per `group_field` over `orders`.
///
/// Groups without records never appear, nor do rows whose key is blank. The
/// result is sorted by total, largest first; equal totals keep the order
/// their key first appeared in. A table lacking either column yields an
/// empty result.
pub fn sum_by_group(
    orders: &OrderTable,
    group_field: GroupField,
    value_field: ValueField,
) -> PolarsResult<Vec<GroupTotal>> {
    let key = group_field.column();
    if !orders.has_column(key) || value_field.column().is_some_and(|v| !orders.has_column(v)) {
        return Ok(Vec::new());
    }
    let grouped = grouped(orders, key, value_field.total(key).alias(TOTAL_COLUMN), TOTAL_COLUMN)?;

    let groups = grouped.column(key)?.str()?;
    let totals = grouped.column(TOTAL_COLUMN)?.f64()?;
    Ok(groups
        .into_iter()
        .zip(totals)
        .filter_map(|(group, total)| {
            Some(GroupTotal {
                group: group?.to_string(),
                total: total.unwrap_or_default(),
            })
        })
        .collect())
}

/// Count records per `group_field`, most frequent first
pub fn count_by_group(orders: &OrderTable, group_field: GroupField) -> PolarsResult<Vec<GroupCount>> {
    let key = group_field.column();
    if !orders.has_column(key) {
        return Ok(Vec::new());
    }
    let count = col(key).count().cast(DataType::UInt64).alias(COUNT_COLUMN);
    let grouped = grouped(orders, key, count, COUNT_COLUMN)?;

    let groups = grouped.column(key)?.str()?;
    let counts = grouped.column(COUNT_COLUMN)?.u64()?;
    Ok(groups
        .into_iter()
        .zip(counts)
        .filter_map(|(group, count)| {
            Some(GroupCount {
                group: group?.to_string(),
                count: count.unwrap_or_default(),
            })
        })
        .collect())
}

/// Aggregate `value` per `key` in first-appearance order, then rank by `ranked_by`
fn grouped(orders: &OrderTable, key: &str, value: Expr, ranked_by: &str) -> PolarsResult<DataFrame> {
    orders
        .frame()
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by_stable([col(key)])
        .agg([value])
        .sort(
            [ranked_by],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()
}
