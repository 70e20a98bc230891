//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use crate::aggregate::GroupField;
use crate::data::{
    DataPaths, COMBINED_DATA_FILE, CUSTOMERS_STATE_FILE, PRODUCT_SALES_FILE, RFM_SUMMARY_FILE,
};
use crate::filter::FilterCriteria;
use crate::report::DashboardOptions;

/// Output rendering for the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// E-commerce analytics dashboard over pre-aggregated CSV summaries
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the input CSV files
    #[arg(short, long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Product sales summary file, relative to the data directory
    #[arg(long, default_value = PRODUCT_SALES_FILE)]
    pub product_sales: PathBuf,

    /// Customers per state summary file, relative to the data directory
    #[arg(long, default_value = CUSTOMERS_STATE_FILE)]
    pub customers_state: PathBuf,

    /// RFM segment summary file, relative to the data directory
    #[arg(long, default_value = RFM_SUMMARY_FILE)]
    pub rfm_summary: PathBuf,

    /// Combined order records file, relative to the data directory
    #[arg(long, default_value = COMBINED_DATA_FILE)]
    pub combined_data: PathBuf,

    /// First purchase date to include (YYYY-MM-DD); defaults to the earliest order
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last purchase date to include (YYYY-MM-DD); defaults to the latest order
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Comma-separated states to include; pass the flag with no value to select none
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub regions: Option<Vec<String>>,

    /// Comma-separated product categories to include; pass the flag with no value to select none
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub categories: Option<Vec<String>>,

    /// Number of most/least sold product categories to show
    #[arg(short = 'n', long, default_value = "10", value_parser = clap::value_parser!(u16).range(5..=20))]
    pub top_n: u16,

    /// Number of rows in the per-state tables
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u16).range(5..=27))]
    pub regions_shown: u16,

    /// Field the revenue table is grouped by
    #[arg(long, value_enum, default_value_t = GroupField::Region)]
    pub revenue_by: GroupField,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print the available date range, states and categories, then exit
    #[arg(long)]
    pub list_options: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Input file locations with per-file overrides resolved against the data directory
    pub fn data_paths(&self) -> DataPaths {
        DataPaths {
            product_sales: self.data_dir.join(&self.product_sales),
            customers_state: self.data_dir.join(&self.customers_state),
            rfm_summary: self.data_dir.join(&self.rfm_summary),
            combined_data: self.data_dir.join(&self.combined_data),
        }
    }

    /// Filter selections from the command line; unset flags mean "everything"
    pub fn filter_criteria(&self) -> FilterCriteria {
        let selection = |values: &Option<Vec<String>>| {
            values.as_ref().map(|values| {
                values
                    .iter()
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
        };
        FilterCriteria {
            start_date: self.start_date,
            end_date: self.end_date,
            regions: selection(&self.regions),
            categories: selection(&self.categories),
        }
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            criteria: self.filter_criteria(),
            top_n: usize::from(self.top_n),
            regions_shown: usize::from(self.regions_shown),
            revenue_by: self.revenue_by,
        }
    }
}
