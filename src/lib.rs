//! Dashforge: filterable analytics dashboard over pre-aggregated e-commerce data
//!
//! This library loads product sales, customers per region, RFM segment
//! summaries and combined order records from CSV files, narrows the order
//! table by date range, region and category with Polars expressions, and
//! computes the grouped tables the dashboard displays.

pub mod aggregate;
pub mod cli;
pub mod data;
pub mod error;
pub mod filter;
pub mod report;

// Re-export public items for easier access
pub use aggregate::{
    count_by_group, sum_by_group, top_and_least, top_n_by_count, Counted, GroupField, SortOrder,
    ValueField,
};
pub use cli::Args;
pub use data::{load_prepared_data, DataPaths, OrderRecord, OrderTable, PreparedData};
pub use error::DashboardError;
pub use filter::{filter_records, FilterCriteria};
pub use report::{build_report, DashboardOptions, DashboardReport, Section};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
