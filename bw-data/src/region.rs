use log::{info, warn};
use serde::Serialize;

use bw_gee::engine::EarthEngine;
use bw_gee::geometry::Geometry;

use crate::Explorer;

/// Why a region fell back to the whole world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FallbackCause {
    /// No feature carries the name (or the name was empty).
    NotFound,
    /// The boundary dataset could not be queried.
    ServiceError(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RegionStatus {
    Found,
    FallbackGlobal(FallbackCause),
}

/// A region name and the boundary it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    name: String,
    boundary: Geometry,
    status: RegionStatus,
}

impl Region {
    fn found(name: &str, boundary: Geometry) -> Self {
        Region {
            name: name.to_string(),
            boundary,
            status: RegionStatus::Found,
        }
    }

    fn fallback(name: &str, cause: FallbackCause) -> Self {
        Region {
            name: name.to_string(),
            boundary: Geometry::world(),
            status: RegionStatus::FallbackGlobal(cause),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn boundary(&self) -> &Geometry {
        &self.boundary
    }

    pub fn status(&self) -> &RegionStatus {
        &self.status
    }

    pub fn is_found(&self) -> bool {
        self.status == RegionStatus::Found
    }

    /// The boundary, but only when it is a real region. Boundary-dependent
    /// features (clipping, charts) must use this rather than [`boundary`].
    ///
    /// [`boundary`]: Region::boundary
    pub fn resolved_boundary(&self) -> Option<&Geometry> {
        if self.is_found() {
            Some(&self.boundary)
        } else {
            None
        }
    }
}

impl<E: EarthEngine> Explorer<E> {
    /// Look `name` up in the boundary dataset by exact name.
    ///
    /// Never fails: a missing name or an unreachable dataset yields the
    /// world box with a `FallbackGlobal` status naming the cause.
    pub async fn resolve_region(&self, name: &str) -> Region {
        if name.trim().is_empty() {
            warn!("Empty region name, showing global view");
            return Region::fallback(name, FallbackCause::NotFound);
        }
        match self.engine.find_boundary(name).await {
            Ok(Some(boundary)) if !boundary.is_world() => {
                info!("Resolved region '{}'", name);
                Region::found(name, boundary)
            }
            Ok(_) => {
                warn!("Could not locate region '{}', showing global view", name);
                Region::fallback(name, FallbackCause::NotFound)
            }
            Err(e) => {
                warn!("Failed to fetch region '{}': {}, showing global view", name, e);
                Region::fallback(name, FallbackCause::ServiceError(e.to_string()))
            }
        }
    }
}
