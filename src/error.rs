//! Error types for loading the dashboard inputs

use std::fmt;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

/// Dashboard section backed by one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    ProductSales,
    RegionCustomers,
    RfmSegments,
    Orders,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionKind::ProductSales => "product sales",
            SectionKind::RegionCustomers => "customers per region",
            SectionKind::RfmSegments => "RFM segments",
            SectionKind::Orders => "combined orders",
        };
        f.write_str(name)
    }
}

/// Failures raised while reading the summary and order files.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A required input file does not exist. Fatal for the session.
    #[error("required file '{}' not found; make sure the CSV files are in the right location", path.display())]
    MissingFile { path: PathBuf },
    /// A file loaded but lacks columns its section needs.
    #[error("{section} data is missing required columns: {}", missing.join(", "))]
    MissingColumns {
        section: SectionKind,
        missing: Vec<String>,
    },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}
