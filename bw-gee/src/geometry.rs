//! Boundary geometries and their canonical cache keys.
//!
//! Geometries come back from the boundary dataset as GeoJSON. Floating point
//! coordinates are not hashable, so anything that needs to key a cache on a
//! geometry goes through [`Geometry::key`], which prints the coordinates in a
//! fixed precision and yields the same text for logically identical shapes.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::error::GeeError;

/// A GeoJSON position, `[longitude, latitude]`.
pub type Position = [f64; 2];

/// Decimal places kept in a [`GeometryKey`] (about 0.1 m at the equator).
pub const KEY_PRECISION: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    /// Axis-aligned lon/lat box.
    BBox {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    },
}

/// Canonical text form of a geometry, usable as a hash map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryKey(String);

/// Bounding box of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Geometry {
    /// The whole-world box used when a region cannot be resolved.
    pub fn world() -> Geometry {
        Geometry::BBox {
            west: -180.0,
            south: -90.0,
            east: 180.0,
            north: 90.0,
        }
    }

    pub fn is_world(&self) -> bool {
        *self == Geometry::world()
    }

    /// Parse a GeoJSON geometry object as returned by the boundary dataset.
    pub fn from_geojson(value: &serde_json::Value) -> Result<Geometry, GeeError> {
        let geometry: Geometry = serde_json::from_value(value.clone())
            .map_err(|e| GeeError::InvalidGeometry(e.to_string()))?;
        if geometry.positions().next().is_none() {
            return Err(GeeError::InvalidGeometry("geometry has no coordinates".into()));
        }
        Ok(geometry)
    }

    pub fn key(&self) -> GeometryKey {
        fn push(out: &mut String, p: &Position) {
            let _ = write!(out, "{:.prec$} {:.prec$},", p[0], p[1], prec = KEY_PRECISION);
        }
        let mut out = String::new();
        match self {
            Geometry::BBox {
                west,
                south,
                east,
                north,
            } => {
                out.push_str("BBox(");
                push(&mut out, &[*west, *south]);
                push(&mut out, &[*east, *north]);
                out.push(')');
            }
            Geometry::Polygon { coordinates } => {
                out.push_str("Polygon");
                for ring in coordinates {
                    out.push('(');
                    ring.iter().for_each(|p| push(&mut out, p));
                    out.push(')');
                }
            }
            Geometry::MultiPolygon { coordinates } => {
                out.push_str("MultiPolygon");
                for polygon in coordinates {
                    out.push('[');
                    for ring in polygon {
                        out.push('(');
                        ring.iter().for_each(|p| push(&mut out, p));
                        out.push(')');
                    }
                    out.push(']');
                }
            }
        }
        GeometryKey(out)
    }

    /// All vertices, rings flattened.
    pub fn positions(&self) -> Box<dyn Iterator<Item = Position> + '_> {
        match self {
            Geometry::BBox {
                west,
                south,
                east,
                north,
            } => Box::new([[*west, *south], [*east, *north]].into_iter()),
            Geometry::Polygon { coordinates } => {
                Box::new(coordinates.iter().flatten().copied())
            }
            Geometry::MultiPolygon { coordinates } => {
                Box::new(coordinates.iter().flatten().flatten().copied())
            }
        }
    }

    /// Area-weighted centroid as `(latitude, longitude)`, holes subtracted.
    ///
    /// Falls back to the center of the bounds for degenerate shapes.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        let polygons: Vec<&Vec<Vec<Position>>> = match self {
            Geometry::BBox { .. } => return self.bounds().map(|b| b.center()),
            Geometry::Polygon { coordinates } => vec![coordinates],
            Geometry::MultiPolygon { coordinates } => coordinates.iter().collect(),
        };
        let (mut weight, mut lon, mut lat) = (0.0, 0.0, 0.0);
        for polygon in polygons {
            for (i, ring) in polygon.iter().enumerate() {
                let Some((area, [x, y])) = ring_moments(ring) else {
                    continue;
                };
                let w = if i == 0 { area.abs() } else { -area.abs() };
                weight += w;
                lon += w * x;
                lat += w * y;
            }
        }
        if weight.abs() < f64::EPSILON {
            return self.bounds().map(|b| b.center());
        }
        Some((lat / weight, normalize_longitude(lon / weight)))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.positions().fold(None, |acc, [lon, lat]| {
            Some(match acc {
                None => Bounds {
                    west: lon,
                    south: lat,
                    east: lon,
                    north: lat,
                },
                Some(b) => Bounds {
                    west: b.west.min(lon),
                    south: b.south.min(lat),
                    east: b.east.max(lon),
                    north: b.north.max(lat),
                },
            })
        })
    }
}

/// Signed area and centroid `[lon, lat]` of one ring.
///
/// Longitudes are unwrapped along the ring so a ring crossing the
/// antimeridian stays contiguous; the centroid may then lie outside
/// `-180..180`.
fn ring_moments(ring: &[Position]) -> Option<(f64, Position)> {
    let first = ring.first()?;
    let mut unwrapped = Vec::with_capacity(ring.len());
    let mut prev = first[0];
    for &[lon, lat] in ring {
        let mut lon = lon;
        while lon - prev > 180.0 {
            lon -= 360.0;
        }
        while prev - lon > 180.0 {
            lon += 360.0;
        }
        unwrapped.push([lon, lat]);
        prev = lon;
    }
    let (mut area2, mut cx, mut cy) = (0.0, 0.0, 0.0);
    for (i, a) in unwrapped.iter().enumerate() {
        let b = unwrapped[(i + 1) % unwrapped.len()];
        let cross = a[0] * b[1] - b[0] * a[1];
        area2 += cross;
        cx += (a[0] + b[0]) * cross;
        cy += (a[1] + b[1]) * cross;
    }
    if area2.abs() < f64::EPSILON {
        return None;
    }
    Some((area2 / 2.0, [cx / (3.0 * area2), cy / (3.0 * area2)]))
}

fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

impl GeometryKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Bounds {
    /// Center as `(latitude, longitude)`, the order map widgets expect.
    pub fn center(&self) -> (f64, f64) {
        ((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }
}
