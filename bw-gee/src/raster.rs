//! Server-side raster expressions.
//!
//! A [`Raster`] describes an image the service can compute; nothing here
//! touches pixels. Clipping and differencing wrap an expression in a new one,
//! so a composite that sits in a cache is never altered by its consumers.

use serde::Serialize;

use crate::geometry::Geometry;
use crate::index::IndexKind;
use crate::period::Period;

#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    /// Pixel-wise mean of all archive scenes of `kind` within `period`.
    Composite { kind: IndexKind, period: Period },
    Clipped {
        source: Box<Raster>,
        boundary: Geometry,
    },
    /// `minuend - subtrahend`, pixel-wise.
    Difference {
        minuend: Box<Raster>,
        subtrahend: Box<Raster>,
    },
}

/// A monthly mean composite that is known to have source scenes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexImage {
    pub period: Period,
    pub kind: IndexKind,
    /// Number of archive scenes averaged into the composite.
    pub scene_count: u64,
}

impl Raster {
    pub fn clip(&self, boundary: &Geometry) -> Raster {
        Raster::Clipped {
            source: Box::new(self.clone()),
            boundary: boundary.clone(),
        }
    }

    /// Index band carried by this raster. Differences keep the band of the
    /// minuend.
    pub fn kind(&self) -> IndexKind {
        match self {
            Raster::Composite { kind, .. } => *kind,
            Raster::Clipped { source, .. } => source.kind(),
            Raster::Difference { minuend, .. } => minuend.kind(),
        }
    }

    pub fn is_anomaly(&self) -> bool {
        match self {
            Raster::Composite { .. } => false,
            Raster::Clipped { source, .. } => source.is_anomaly(),
            Raster::Difference { .. } => true,
        }
    }
}

impl IndexImage {
    pub fn raster(&self) -> Raster {
        Raster::Composite {
            kind: self.kind,
            period: self.period,
        }
    }

    /// Clipped view of the composite, the cached image itself is unchanged.
    pub fn clip(&self, boundary: &Geometry) -> Raster {
        self.raster().clip(boundary)
    }
}

/// Pixel-wise `current - reference`.
pub fn anomaly(current: &Raster, reference: &Raster) -> Raster {
    Raster::Difference {
        minuend: Box::new(current.clone()),
        subtrahend: Box::new(reference.clone()),
    }
}
