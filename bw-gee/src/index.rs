use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GeeError;

/// MODIS Terra 16-day vegetation indices at 250 m, collection 6.1.
pub const MODIS_VEGETATION_COLLECTION: &str = "MODIS/061/MOD13Q1";

/// Index values are stored as integers scaled by this divisor.
pub const SCALE_DIVISOR: f64 = 10000.0;

/// A vegetation index band of the MODIS archive.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexKind {
    /// Normalized Difference Vegetation Index
    #[serde(rename = "NDVI")]
    Ndvi,
    /// Enhanced Vegetation Index
    #[serde(rename = "EVI")]
    Evi,
}

impl IndexKind {
    pub const ALL: [IndexKind; 2] = [IndexKind::Ndvi, IndexKind::Evi];

    /// Band name in the archive, also the key of reduction results.
    pub fn band_name(&self) -> &'static str {
        match self {
            IndexKind::Ndvi => "NDVI",
            IndexKind::Evi => "EVI",
        }
    }

    /// Map an integer-encoded index value into the conventional [-1, 1] range.
    pub fn rescale(raw: f64) -> f64 {
        raw / SCALE_DIVISOR
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.band_name())
    }
}

impl FromStr for IndexKind {
    type Err = GeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ndvi" => Ok(IndexKind::Ndvi),
            "evi" => Ok(IndexKind::Evi),
            other => Err(GeeError::InvalidRequest(format!(
                "unknown vegetation index '{other}' (expected NDVI or EVI)"
            ))),
        }
    }
}
