//! Dashboard sections assembled from the prepared data and rendered as text

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{
    count_by_group, sum_by_group, top_and_least, top_n_by_count, GroupCount, GroupField,
    GroupTotal, SortOrder, ValueField,
};
use crate::data::{PreparedData, ProductSalesSummary, RegionCustomerSummary, RfmSegmentSummary};
use crate::error::DashboardError;
use crate::filter::{date_bounds, filter_records, FilterCriteria};

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_REGIONS_SHOWN: usize = 10;

const NO_MATCH_MESSAGE: &str = "No data matches the selected filters.";

/// Display choices for one dashboard render
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub criteria: FilterCriteria,
    /// Rows in the most/least sold product tables
    pub top_n: usize,
    /// Rows in the per-region tables
    pub regions_shown: usize,
    /// Field the revenue table is broken down by
    pub revenue_by: GroupField,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            top_n: DEFAULT_TOP_N,
            regions_shown: DEFAULT_REGIONS_SHOWN,
            revenue_by: GroupField::Region,
        }
    }
}

/// State of one dashboard panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "rows", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(Vec<T>),
    /// The filters removed every record
    NoMatch,
    /// The backing data could not be used; carries the reason
    Unavailable(String),
}

impl<T> Section<T> {
    pub fn rows(&self) -> Option<&[T]> {
        match self {
            Section::Ready(rows) => Some(rows.as_slice()),
            _ => None,
        }
    }
}

/// Applied filter and how much of the order data it kept
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub regions: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub matching_orders: usize,
    pub total_orders: usize,
}

/// Everything one render of the dashboard shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub filter: FilterSummary,
    pub top_n: usize,
    pub top_products: Section<ProductSalesSummary>,
    pub least_products: Section<ProductSalesSummary>,
    pub revenue_by: GroupField,
    pub revenue: Section<GroupTotal>,
    pub customers_per_region: Section<RegionCustomerSummary>,
    pub rfm_segments: Section<RfmSegmentSummary>,
    pub payment_types: Section<GroupCount>,
    pub warnings: Vec<String>,
}

/// Build every dashboard section.
///
/// Product, region and RFM tables come from the precomputed summaries and
/// ignore the filters; revenue and payment types are computed from the
/// filtered order table. Each section degrades on its own when the column it
/// needs is missing.
pub fn build_report(
    data: &PreparedData,
    options: &DashboardOptions,
) -> Result<DashboardReport, DashboardError> {
    let criteria = &options.criteria;

    let (top_products, least_products) = match &data.product_sales {
        Some(summary) => {
            let (top, least) = top_and_least(summary, options.top_n);
            (Section::Ready(top), Section::Ready(least))
        }
        None => (unavailable("product sales"), unavailable("product sales")),
    };

    let customers_per_region = match &data.region_customers {
        Some(summary) => Section::Ready(top_n_by_count(
            summary,
            options.regions_shown,
            SortOrder::Descending,
        )),
        None => unavailable("customers per region"),
    };

    let rfm_segments = match &data.rfm_segments {
        Some(summary) => Section::Ready(top_n_by_count(summary, summary.len(), SortOrder::Descending)),
        None => unavailable("RFM summary"),
    };

    let mut filter = FilterSummary {
        start_date: criteria.start_date,
        end_date: criteria.end_date,
        regions: selection(&criteria.regions),
        categories: selection(&criteria.categories),
        matching_orders: 0,
        total_orders: 0,
    };

    let (revenue, payment_types) = match &data.orders {
        Some(orders) => {
            let filtered = filter_records(orders, criteria)?;
            info!(
                matching = filtered.len(),
                total = orders.len(),
                "order filter applied"
            );
            filter.matching_orders = filtered.len();
            filter.total_orders = orders.len();
            if orders.has_timestamps() {
                let bounds = date_bounds(orders)?;
                filter.start_date = criteria.start_date.or(bounds.map(|(min, _)| min));
                filter.end_date = criteria.end_date.or(bounds.map(|(_, max)| max));
            } else {
                filter.start_date = None;
                filter.end_date = None;
            }

            let revenue = if !orders.has_payment_values() {
                unavailable("payment value")
            } else if !orders.has_column(options.revenue_by.column()) {
                unavailable(group_label(options.revenue_by))
            } else if filtered.is_empty() {
                Section::NoMatch
            } else {
                let mut totals =
                    sum_by_group(&filtered, options.revenue_by, ValueField::PaymentValue)?;
                totals.truncate(options.regions_shown);
                Section::Ready(totals)
            };

            let payment_types = if !orders.has_payment_types() {
                unavailable("payment type")
            } else {
                let counts = count_by_group(&filtered, GroupField::PaymentType)?;
                if counts.is_empty() {
                    Section::NoMatch
                } else {
                    Section::Ready(counts)
                }
            };

            (revenue, payment_types)
        }
        None => {
            debug!("order table unavailable, filtered sections skipped");
            (unavailable("combined orders"), unavailable("combined orders"))
        }
    };

    Ok(DashboardReport {
        filter,
        top_n: options.top_n,
        top_products,
        least_products,
        revenue_by: options.revenue_by,
        revenue,
        customers_per_region,
        rfm_segments,
        payment_types,
        warnings: data.warnings.clone(),
    })
}

fn selection(set: &Option<BTreeSet<String>>) -> Option<Vec<String>> {
    set.as_ref().map(|values| values.iter().cloned().collect())
}

fn unavailable<T>(what: &str) -> Section<T> {
    Section::Unavailable(format!("{what} data is not available"))
}

fn group_label(field: GroupField) -> &'static str {
    match field {
        GroupField::Region => "State",
        GroupField::Category => "Category",
        GroupField::PaymentType => "Payment Type",
    }
}

fn write_section<T>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    section: &Section<T>,
    header: &str,
    row: impl Fn(&T) -> String,
) -> fmt::Result {
    writeln!(f, "\n=== {title} ===")?;
    match section {
        Section::Ready(rows) if rows.is_empty() => writeln!(f, "  (no rows)"),
        Section::Ready(rows) => {
            writeln!(f, "{header}")?;
            writeln!(f, "  {}", "-".repeat(header.len().saturating_sub(2)))?;
            for item in rows {
                writeln!(f, "{}", row(item))?;
            }
            Ok(())
        }
        Section::NoMatch => writeln!(f, "  {NO_MATCH_MESSAGE}"),
        Section::Unavailable(reason) => writeln!(f, "  Warning: {reason}"),
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn format_selection(selection: &Option<Vec<String>>) -> String {
    match selection {
        None => "all".to_string(),
        Some(values) if values.is_empty() => "none selected".to_string(),
        Some(values) => values.join(", "),
    }
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Filter ===")?;
        writeln!(
            f,
            "  Date range: {} to {}",
            format_date(self.filter.start_date),
            format_date(self.filter.end_date)
        )?;
        writeln!(f, "  States: {}", format_selection(&self.filter.regions))?;
        writeln!(f, "  Categories: {}", format_selection(&self.filter.categories))?;
        writeln!(
            f,
            "  Orders matching filter: {} of {}",
            self.filter.matching_orders, self.filter.total_orders
        )?;

        let product_header = format!("  {:<40} | {:>10}", "Product Category", "Orders");
        let product_row = |p: &ProductSalesSummary| format!("  {:<40} | {:>10}", p.category, p.order_count);
        write_section(
            f,
            &format!("Top {} Most Sold Product Categories (all data)", self.top_n),
            &self.top_products,
            &product_header,
            product_row,
        )?;
        write_section(
            f,
            &format!("Top {} Least Sold Product Categories (all data)", self.top_n),
            &self.least_products,
            &product_header,
            product_row,
        )?;

        let label = group_label(self.revenue_by);
        write_section(
            f,
            &format!("Total Revenue per {label} (filtered)"),
            &self.revenue,
            &format!("  {:<40} | {:>14}", label, "Revenue"),
            |g| format!("  {:<40} | {:>14.2}", g.group, g.total),
        )?;

        write_section(
            f,
            "Customers per State (all data)",
            &self.customers_per_region,
            &format!("  {:<10} | {:>16}", "State", "Unique Customers"),
            |r| format!("  {:<10} | {:>16}", r.region, r.unique_customer_count),
        )?;

        write_section(
            f,
            "RFM Segment Summary (all data)",
            &self.rfm_segments,
            &format!(
                "  {:<28} | {:>10} | {:>10} | {:>12} | {:>10}",
                "Segment", "Recency", "Frequency", "Monetary", "Customers"
            ),
            |s| {
                format!(
                    "  {:<28} | {:>10.1} | {:>10.2} | {:>12.2} | {:>10}",
                    s.segment, s.avg_recency, s.avg_frequency, s.avg_monetary, s.segment_size
                )
            },
        )?;

        write_section(
            f,
            "Payment Type Distribution (filtered)",
            &self.payment_types,
            &format!("  {:<20} | {:>12}", "Payment Type", "Transactions"),
            |c| format!("  {:<20} | {:>12}", c.group, c.count),
        )?;

        if !self.warnings.is_empty() {
            writeln!(f, "\n=== Warnings ===")?;
            for warning in &self.warnings {
                writeln!(f, "  {warning}")?;
            }
        }
        Ok(())
    }
}
