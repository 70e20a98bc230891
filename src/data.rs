//! Loading the prepared summary files and order records using Polars

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{DashboardError, SectionKind};

pub const PRODUCT_SALES_FILE: &str = "product_sales_viz_data.csv";
pub const CUSTOMERS_STATE_FILE: &str = "customers_per_state_data.csv";
pub const RFM_SUMMARY_FILE: &str = "rfm_segment_summary_data.csv";
pub const COMBINED_DATA_FILE: &str = "all_data_combined.csv";

pub(crate) const CATEGORY_COLUMN: &str = "product_category_name_english";
const ORDER_COUNT_COLUMN: &str = "order_count";
pub(crate) const REGION_COLUMN: &str = "customer_state";
const UNIQUE_CUSTOMERS_COLUMN: &str = "unique_customer_count";
const SEGMENT_COLUMN: &str = "RFM_Segment";
const AVG_RECENCY_COLUMN: &str = "AvgRecency";
const AVG_FREQUENCY_COLUMN: &str = "AvgFrequency";
const AVG_MONETARY_COLUMN: &str = "AvgMonetary";
const SEGMENT_SIZE_COLUMN: &str = "SegmentSize";
const TIMESTAMP_COLUMN: &str = "order_purchase_timestamp";
pub(crate) const PAYMENT_VALUE_COLUMN: &str = "payment_value";
pub(crate) const PAYMENT_TYPE_COLUMN: &str = "payment_type";
/// Purchase time in the order table, milliseconds since the Unix epoch
pub(crate) const PURCHASED_AT_COLUMN: &str = "purchased_at_ms";

/// Rows inspected by the CSV reader before settling on column types
const SCHEMA_INFERENCE_ROWS: usize = 1000;

/// One order-item event from the combined order data.
///
/// `purchased_at` and `payment_value` are `None` only when the order file
/// has no such column at all; rows with a blank value are dropped on load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub purchased_at: Option<NaiveDateTime>,
    /// Customer region code, e.g. `SP`
    pub region: String,
    pub category: String,
    pub payment_value: Option<f64>,
    pub payment_type: Option<String>,
}

/// Cleaned order rows held as a Polars frame.
///
/// Always carries the region and category columns as strings. The purchase
/// time (epoch milliseconds), payment value and payment type columns are
/// present only when the source file had them.
#[derive(Debug, Clone)]
pub struct OrderTable {
    frame: DataFrame,
}

impl OrderTable {
    pub(crate) fn from_frame(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Build a table from typed records.
    ///
    /// The purchase time and payment value columns are included when every
    /// record has a value; the payment type column is always included.
    pub fn from_records(records: &[OrderRecord]) -> PolarsResult<Self> {
        let regions: Vec<&str> = records.iter().map(|r| r.region.as_str()).collect();
        let categories: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();
        let mut columns = vec![
            Column::new(REGION_COLUMN.into(), regions),
            Column::new(CATEGORY_COLUMN.into(), categories),
        ];
        if records.iter().all(|r| r.purchased_at.is_some()) {
            let millis: Vec<Option<i64>> = records
                .iter()
                .map(|r| r.purchased_at.map(to_millis))
                .collect();
            columns.push(Column::new(PURCHASED_AT_COLUMN.into(), millis));
        }
        if records.iter().all(|r| r.payment_value.is_some()) {
            let values: Vec<Option<f64>> = records.iter().map(|r| r.payment_value).collect();
            columns.push(Column::new(PAYMENT_VALUE_COLUMN.into(), values));
        }
        let payment_types: Vec<Option<&str>> =
            records.iter().map(|r| r.payment_type.as_deref()).collect();
        columns.push(Column::new(PAYMENT_TYPE_COLUMN.into(), payment_types));

        Ok(Self::from_frame(DataFrame::new(columns)?))
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn has_timestamps(&self) -> bool {
        self.has_column(PURCHASED_AT_COLUMN)
    }

    pub fn has_payment_values(&self) -> bool {
        self.has_column(PAYMENT_VALUE_COLUMN)
    }

    pub fn has_payment_types(&self) -> bool {
        self.has_column(PAYMENT_TYPE_COLUMN)
    }

    pub(crate) fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Typed copy of every row, in table order
    pub fn records(&self) -> PolarsResult<Vec<OrderRecord>> {
        let height = self.frame.height();
        let regions = string_values(&self.frame, REGION_COLUMN)?;
        let categories = string_values(&self.frame, CATEGORY_COLUMN)?;
        let purchased_at: Vec<Option<NaiveDateTime>> = if self.has_timestamps() {
            self.frame
                .column(PURCHASED_AT_COLUMN)?
                .i64()?
                .into_iter()
                .map(|millis| millis.and_then(from_millis))
                .collect()
        } else {
            vec![None; height]
        };
        let payment_values = if self.has_payment_values() {
            float_values(&self.frame, PAYMENT_VALUE_COLUMN)?
        } else {
            vec![None; height]
        };
        let payment_types = if self.has_payment_types() {
            string_values(&self.frame, PAYMENT_TYPE_COLUMN)?
        } else {
            vec![None; height]
        };

        Ok((0..height)
            .map(|i| OrderRecord {
                purchased_at: purchased_at[i],
                region: regions[i].clone().unwrap_or_default(),
                category: categories[i].clone().unwrap_or_default(),
                payment_value: payment_values[i],
                payment_type: payment_types[i].clone(),
            })
            .collect())
    }
}

/// Precomputed order count for one product category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSalesSummary {
    pub category: String,
    pub order_count: u64,
}

/// Precomputed number of distinct customers in one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCustomerSummary {
    pub region: String,
    pub unique_customer_count: u64,
}

/// Precomputed averages for one RFM segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfmSegmentSummary {
    pub segment: String,
    /// Average days since last purchase
    pub avg_recency: f64,
    pub avg_frequency: f64,
    pub avg_monetary: f64,
    pub segment_size: u64,
}

/// Locations of the four input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub product_sales: PathBuf,
    pub customers_state: PathBuf,
    pub rfm_summary: PathBuf,
    pub combined_data: PathBuf,
}

impl DataPaths {
    /// Default file names resolved under `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            product_sales: dir.join(PRODUCT_SALES_FILE),
            customers_state: dir.join(CUSTOMERS_STATE_FILE),
            rfm_summary: dir.join(RFM_SUMMARY_FILE),
            combined_data: dir.join(COMBINED_DATA_FILE),
        }
    }

    fn sections(&self) -> [(SectionKind, &Path); 4] {
        [
            (SectionKind::ProductSales, self.product_sales.as_path()),
            (SectionKind::RegionCustomers, self.customers_state.as_path()),
            (SectionKind::RfmSegments, self.rfm_summary.as_path()),
            (SectionKind::Orders, self.combined_data.as_path()),
        ]
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

/// Everything read from disk for one session.
///
/// A `None` section had a schema problem; the matching message is in
/// `warnings` and the rest of the dashboard still renders.
#[derive(Debug, Default)]
pub struct PreparedData {
    pub product_sales: Option<Vec<ProductSalesSummary>>,
    pub region_customers: Option<Vec<RegionCustomerSummary>>,
    pub rfm_segments: Option<Vec<RfmSegmentSummary>>,
    pub orders: Option<OrderTable>,
    pub warnings: Vec<String>,
}

/// Load all four input files.
///
/// # Arguments
/// * `paths` - Locations of the product, region, RFM and order files
///
/// # Returns
/// * `PreparedData` with one entry per section, or `MissingFile` if any file is absent
pub fn load_prepared_data(paths: &DataPaths) -> Result<PreparedData, DashboardError> {
    for (section, path) in paths.sections() {
        if !path.is_file() {
            warn!(%section, path = %path.display(), "required input file not found");
            return Err(DashboardError::MissingFile {
                path: path.to_path_buf(),
            });
        }
    }

    let mut prepared = PreparedData::default();
    let mut warnings = Vec::new();

    let df = read_csv(&paths.product_sales)?;
    prepared.product_sales = keep_section(load_product_sales(&df, &mut warnings), &mut warnings)?;

    let df = read_csv(&paths.customers_state)?;
    prepared.region_customers =
        keep_section(load_region_customers(&df, &mut warnings), &mut warnings)?;

    let df = read_csv(&paths.rfm_summary)?;
    prepared.rfm_segments = keep_section(load_rfm_segments(&df, &mut warnings), &mut warnings)?;

    let df = read_csv(&paths.combined_data)?;
    prepared.orders = keep_section(load_orders(&df, &mut warnings), &mut warnings)?;

    prepared.warnings = warnings;
    info!(
        products = prepared.product_sales.as_ref().map_or(0, Vec::len),
        regions = prepared.region_customers.as_ref().map_or(0, Vec::len),
        segments = prepared.rfm_segments.as_ref().map_or(0, Vec::len),
        orders = prepared.orders.as_ref().map_or(0, OrderTable::len),
        "dashboard data loaded"
    );

    Ok(prepared)
}

/// Parse an order purchase timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, the `T`-separated form, optional
/// fractional seconds, or a bare date (taken as midnight). Returns `None`
/// when nothing matches.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(timestamp);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn read_csv(path: &Path) -> Result<DataFrame, DashboardError> {
    debug!(path = %path.display(), "reading csv");
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(SCHEMA_INFERENCE_ROWS))
        .finish()?
        .collect()?;
    Ok(df)
}

/// Turn a column failure into a skipped section; anything else stays fatal.
fn keep_section<T>(
    loaded: Result<T, DashboardError>,
    warnings: &mut Vec<String>,
) -> Result<Option<T>, DashboardError> {
    match loaded {
        Ok(rows) => Ok(Some(rows)),
        Err(err @ DashboardError::MissingColumns { .. }) => {
            warn!("{err}");
            warnings.push(err.to_string());
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn require_columns(
    df: &DataFrame,
    section: SectionKind,
    columns: &[&str],
) -> Result<(), DashboardError> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|name| df.column(name).is_err())
        .map(|name| name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashboardError::MissingColumns { section, missing })
    }
}

/// Warn about an absent optional order column and what goes without it
fn note_missing_column(column: &str, skipped: &str, warnings: &mut Vec<String>) {
    let message = format!("column '{column}' not found in combined orders data; {skipped}");
    warn!("{message}");
    warnings.push(message);
}

/// Warn about rows dropped for blank or invalid values
fn note_dropped_rows(section: SectionKind, dropped: usize, warnings: &mut Vec<String>) {
    if dropped == 0 {
        return;
    }
    warn!(%section, dropped, "incomplete rows skipped");
    warnings.push(format!("{dropped} incomplete {section} rows were skipped"));
}

fn load_product_sales(
    df: &DataFrame,
    warnings: &mut Vec<String>,
) -> Result<Vec<ProductSalesSummary>, DashboardError> {
    require_columns(
        df,
        SectionKind::ProductSales,
        &[CATEGORY_COLUMN, ORDER_COUNT_COLUMN],
    )?;
    let categories = string_values(df, CATEGORY_COLUMN)?;
    let counts = count_values(df, ORDER_COUNT_COLUMN)?;

    let rows: Vec<ProductSalesSummary> = categories
        .into_iter()
        .zip(counts)
        .filter_map(|(category, order_count)| {
            Some(ProductSalesSummary {
                category: category?,
                order_count: order_count?,
            })
        })
        .collect();
    note_dropped_rows(SectionKind::ProductSales, df.height() - rows.len(), warnings);
    Ok(rows)
}

fn load_region_customers(
    df: &DataFrame,
    warnings: &mut Vec<String>,
) -> Result<Vec<RegionCustomerSummary>, DashboardError> {
    require_columns(
        df,
        SectionKind::RegionCustomers,
        &[REGION_COLUMN, UNIQUE_CUSTOMERS_COLUMN],
    )?;
    let regions = string_values(df, REGION_COLUMN)?;
    let counts = count_values(df, UNIQUE_CUSTOMERS_COLUMN)?;

    let rows: Vec<RegionCustomerSummary> = regions
        .into_iter()
        .zip(counts)
        .filter_map(|(region, unique_customer_count)| {
            Some(RegionCustomerSummary {
                region: region?,
                unique_customer_count: unique_customer_count?,
            })
        })
        .collect();
    note_dropped_rows(SectionKind::RegionCustomers, df.height() - rows.len(), warnings);
    Ok(rows)
}

fn load_rfm_segments(
    df: &DataFrame,
    warnings: &mut Vec<String>,
) -> Result<Vec<RfmSegmentSummary>, DashboardError> {
    require_columns(
        df,
        SectionKind::RfmSegments,
        &[
            SEGMENT_COLUMN,
            AVG_RECENCY_COLUMN,
            AVG_FREQUENCY_COLUMN,
            AVG_MONETARY_COLUMN,
            SEGMENT_SIZE_COLUMN,
        ],
    )?;
    let segments = string_values(df, SEGMENT_COLUMN)?;
    let recency = float_values(df, AVG_RECENCY_COLUMN)?;
    let frequency = float_values(df, AVG_FREQUENCY_COLUMN)?;
    let monetary = float_values(df, AVG_MONETARY_COLUMN)?;
    let sizes = count_values(df, SEGMENT_SIZE_COLUMN)?;

    let mut rows = Vec::with_capacity(df.height());
    for (i, segment) in segments.into_iter().enumerate() {
        let (
            Some(segment),
            Some(avg_recency),
            Some(avg_frequency),
            Some(avg_monetary),
            Some(segment_size),
        ) = (segment, recency[i], frequency[i], monetary[i], sizes[i])
        else {
            continue;
        };
        rows.push(RfmSegmentSummary {
            segment,
            avg_recency,
            avg_frequency,
            avg_monetary,
            segment_size,
        });
    }
    note_dropped_rows(SectionKind::RfmSegments, df.height() - rows.len(), warnings);
    Ok(rows)
}

/// Normalize the combined order file into an [`OrderTable`].
///
/// Region and category are required. A missing timestamp, payment value or
/// payment type column only disables what depends on it. Rows with a blank
/// value in a present required column, or an unparseable timestamp, are
/// dropped and counted.
fn load_orders(df: &DataFrame, warnings: &mut Vec<String>) -> Result<OrderTable, DashboardError> {
    require_columns(df, SectionKind::Orders, &[REGION_COLUMN, CATEGORY_COLUMN])?;

    let mut columns = vec![
        df.column(REGION_COLUMN)?.cast(&DataType::String)?,
        df.column(CATEGORY_COLUMN)?.cast(&DataType::String)?,
    ];
    let mut complete = col(REGION_COLUMN)
        .is_not_null()
        .and(col(CATEGORY_COLUMN).is_not_null());

    if df.column(TIMESTAMP_COLUMN).is_ok() {
        let millis: Vec<Option<i64>> = string_values(df, TIMESTAMP_COLUMN)?
            .iter()
            .map(|raw| raw.as_deref().and_then(parse_timestamp).map(to_millis))
            .collect();
        columns.push(Column::new(PURCHASED_AT_COLUMN.into(), millis));
        complete = complete.and(col(PURCHASED_AT_COLUMN).is_not_null());
    } else {
        note_missing_column(TIMESTAMP_COLUMN, "date filter skipped", warnings);
    }

    if df.column(PAYMENT_VALUE_COLUMN).is_ok() {
        columns.push(df.column(PAYMENT_VALUE_COLUMN)?.cast(&DataType::Float64)?);
        complete = complete.and(col(PAYMENT_VALUE_COLUMN).is_not_null());
    } else {
        note_missing_column(PAYMENT_VALUE_COLUMN, "revenue section skipped", warnings);
    }

    if df.column(PAYMENT_TYPE_COLUMN).is_ok() {
        columns.push(df.column(PAYMENT_TYPE_COLUMN)?.cast(&DataType::String)?);
    } else {
        note_missing_column(
            PAYMENT_TYPE_COLUMN,
            "payment type distribution skipped",
            warnings,
        );
    }

    let frame = DataFrame::new(columns)?.lazy().filter(complete).collect()?;
    note_dropped_rows(SectionKind::Orders, df.height() - frame.height(), warnings);

    Ok(OrderTable::from_frame(frame))
}

pub(crate) fn to_millis(timestamp: NaiveDateTime) -> i64 {
    timestamp.and_utc().timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|timestamp| timestamp.naive_utc())
}

pub(crate) fn string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let values = column
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_owned))
        .collect();
    Ok(values)
}

fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values = column.f64()?.into_iter().collect();
    Ok(values)
}

fn count_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<u64>>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    let values = column
        .i64()?
        .into_iter()
        .map(|value| value.and_then(|count| u64::try_from(count).ok()))
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const PRODUCT_SALES_CSV: &str = "product_category_name_english,order_count\n\
        bed_bath_table,9417\n\
        health_beauty,8836\n\
        security_and_services,2\n";
    const CUSTOMERS_CSV: &str = "customer_state,unique_customer_count\n\
        SP,40302\n\
        RJ,12384\n";
    const RFM_CSV: &str = "RFM_Segment,AvgRecency,AvgFrequency,AvgMonetary,SegmentSize\n\
        Champions,45.2,2.1,540.75,1200\n\
        Hibernating,410.0,1.0,60.5,15000\n";
    const ORDERS_CSV: &str = "order_id,order_purchase_timestamp,customer_state,product_category_name_english,payment_value,payment_type\n\
        a1,2018-01-01 10:00:00,SP,toys,50.0,credit_card\n\
        a2,2018-06-01 09:30:00,RJ,toys,30.0,boleto\n\
        a3,,SP,toys,10.0,voucher\n";

    fn write_fixture(orders_csv: &str, rfm_csv: &str) -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PRODUCT_SALES_FILE), PRODUCT_SALES_CSV).unwrap();
        fs::write(dir.path().join(CUSTOMERS_STATE_FILE), CUSTOMERS_CSV).unwrap();
        fs::write(dir.path().join(RFM_SUMMARY_FILE), rfm_csv).unwrap();
        fs::write(dir.path().join(COMBINED_DATA_FILE), orders_csv).unwrap();
        dir
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2017, 10, 2)
            .unwrap()
            .and_hms_opt(10, 56, 33)
            .unwrap();
        assert_eq!(parse_timestamp("2017-10-02 10:56:33"), Some(expected));
        assert_eq!(parse_timestamp("2017-10-02T10:56:33"), Some(expected));
        assert_eq!(
            parse_timestamp("2017-10-02"),
            NaiveDate::from_ymd_opt(2017, 10, 2).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_timestamp("2017-10-02 10:56:33.250").is_some());
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_load_prepared_data() {
        let dir = write_fixture(ORDERS_CSV, RFM_CSV);
        let prepared = load_prepared_data(&DataPaths::in_dir(dir.path())).unwrap();

        let products = prepared.product_sales.unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].category, "bed_bath_table");
        assert_eq!(products[0].order_count, 9417);

        let regions = prepared.region_customers.unwrap();
        assert_eq!(regions[1].region, "RJ");
        assert_eq!(regions[1].unique_customer_count, 12384);

        let segments = prepared.rfm_segments.unwrap();
        assert_eq!(segments[0].segment, "Champions");
        assert_eq!(segments[1].segment_size, 15000);
        assert!((segments[0].avg_monetary - 540.75).abs() < 1e-9);

        let orders = prepared.orders.unwrap();
        assert_eq!(orders.len(), 2, "row without a timestamp is skipped");
        assert!(orders.has_timestamps() && orders.has_payment_values());
        assert!(orders.has_payment_types());
        let records = orders.records().unwrap();
        assert_eq!(records[0].region, "SP");
        assert_eq!(
            records[0].purchased_at,
            parse_timestamp("2018-01-01 10:00:00")
        );
        assert_eq!(records[1].payment_type.as_deref(), Some("boleto"));
        assert_eq!(prepared.warnings, vec!["1 incomplete combined orders rows were skipped"]);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = write_fixture(ORDERS_CSV, RFM_CSV);
        fs::remove_file(dir.path().join(CUSTOMERS_STATE_FILE)).unwrap();

        let result = load_prepared_data(&DataPaths::in_dir(dir.path()));
        match result {
            Err(DashboardError::MissingFile { path }) => {
                assert!(path.ends_with(CUSTOMERS_STATE_FILE));
            }
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_column_skips_only_that_section() {
        let rfm_without_size = "RFM_Segment,AvgRecency,AvgFrequency,AvgMonetary\n\
            Champions,45.2,2.1,540.75\n";
        let dir = write_fixture(ORDERS_CSV, rfm_without_size);
        let prepared = load_prepared_data(&DataPaths::in_dir(dir.path())).unwrap();

        assert!(prepared.rfm_segments.is_none());
        assert!(prepared.product_sales.is_some());
        assert!(prepared.orders.is_some());
        assert!(prepared
            .warnings
            .iter()
            .any(|warning| warning.contains("SegmentSize")));
    }

    #[test]
    fn test_orders_without_payment_type() {
        let orders = "order_purchase_timestamp,customer_state,product_category_name_english,payment_value\n\
            2018-01-01 10:00:00,SP,toys,50\n";
        let dir = write_fixture(orders, RFM_CSV);
        let prepared = load_prepared_data(&DataPaths::in_dir(dir.path())).unwrap();

        let orders = prepared.orders.unwrap();
        assert!(!orders.has_payment_types());
        let records = orders.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payment_type, None);
        assert_eq!(records[0].payment_value, Some(50.0));
    }

    #[test]
    fn test_orders_without_payment_value_keep_rows() {
        let orders = "order_purchase_timestamp,customer_state,product_category_name_english,payment_type\n\
            2018-01-01 10:00:00,SP,toys,credit_card\n\
            2018-02-01 10:00:00,RJ,toys,boleto\n";
        let dir = write_fixture(orders, RFM_CSV);
        let prepared = load_prepared_data(&DataPaths::in_dir(dir.path())).unwrap();

        let orders = prepared.orders.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(!orders.has_payment_values());
        assert!(orders.has_timestamps() && orders.has_payment_types());
        assert_eq!(orders.records().unwrap()[1].payment_value, None);
        assert!(prepared.warnings[0].contains("'payment_value'"));
    }

    #[test]
    fn test_orders_without_timestamp_keep_rows() {
        let orders = "customer_state,product_category_name_english,payment_value\n\
            SP,toys,50.0\n\
            RJ,auto,12.5\n";
        let dir = write_fixture(orders, RFM_CSV);
        let prepared = load_prepared_data(&DataPaths::in_dir(dir.path())).unwrap();

        let orders = prepared.orders.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(!orders.has_timestamps());
        assert_eq!(orders.records().unwrap()[0].purchased_at, None);
        assert!(prepared
            .warnings
            .iter()
            .any(|warning| warning.contains("date filter skipped")));
    }

    #[test]
    fn test_orders_without_region_are_unavailable() {
        let orders = "order_purchase_timestamp,product_category_name_english,payment_value\n\
            2018-01-01 10:00:00,toys,50.0\n";
        let dir = write_fixture(orders, RFM_CSV);
        let prepared = load_prepared_data(&DataPaths::in_dir(dir.path())).unwrap();

        assert!(prepared.orders.is_none());
        assert!(prepared.warnings[0].contains("customer_state"));
    }

    #[test]
    fn test_incomplete_summary_rows_are_counted() {
        let rfm = "RFM_Segment,AvgRecency,AvgFrequency,AvgMonetary,SegmentSize\n\
            Champions,45.2,2.1,540.75,1200\n\
            ,300.0,1.0,10.0,50\n\
            Lost,500.0,1.0,40.0,-3\n";
        let dir = write_fixture(ORDERS_CSV, rfm);
        fs::write(
            dir.path().join(CUSTOMERS_STATE_FILE),
            "customer_state,unique_customer_count\nSP,40302\nRJ,\n",
        )
        .unwrap();
        let prepared = load_prepared_data(&DataPaths::in_dir(dir.path())).unwrap();

        assert_eq!(prepared.rfm_segments.unwrap().len(), 1);
        assert_eq!(prepared.region_customers.unwrap().len(), 1);
        assert!(prepared
            .warnings
            .contains(&"2 incomplete RFM segments rows were skipped".to_string()));
        assert!(prepared
            .warnings
            .contains(&"1 incomplete customers per region rows were skipped".to_string()));
    }

    #[test]
    fn test_order_table_from_records() {
        let records = vec![OrderRecord {
            purchased_at: parse_timestamp("2018-03-15 12:30:00"),
            region: "SP".to_string(),
            category: "toys".to_string(),
            payment_value: Some(19.9),
            payment_type: None,
        }];
        let table = OrderTable::from_records(&records).unwrap();
        assert!(table.has_timestamps() && table.has_payment_values() && table.has_payment_types());
        assert_eq!(table.records().unwrap(), records);

        let without_values = vec![OrderRecord {
            payment_value: None,
            ..records[0].clone()
        }];
        let table = OrderTable::from_records(&without_values).unwrap();
        assert!(!table.has_payment_values());
        assert_eq!(table.records().unwrap(), without_values);
    }
}
