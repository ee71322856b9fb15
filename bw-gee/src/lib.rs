//! Core types and Earth Engine client for monthly vegetation index imagery.
//!
//! The types here describe what the dashboard asks the remote service for:
//! a vegetation index, a one-month period, a boundary geometry, and raster
//! expressions built from them. [`engine::EarthEngine`] is the seam to the
//! service; [`client::RestEngine`] (feature `api`) talks to the real REST API
//! and [`mock::MockEngine`] (feature `mock`) stands in for it in tests.

#[cfg(feature = "api")]
pub mod client;
pub mod engine;
pub mod error;
pub mod expression;
pub mod geometry;
pub mod index;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod period;
pub mod raster;
pub mod year_range;
