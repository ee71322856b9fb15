//! Region resolution, monthly composites and yearly index series.
//!
//! [`Explorer`] is the process context of the dashboard core. It owns the
//! remote engine and the memo caches; the component operations live in
//! their own modules as `impl Explorer` blocks:
//!
//! - [`region`]: region name to boundary, with a global fallback
//! - [`images`]: monthly mean composites per (period, index)
//! - [`series`]: one regional mean per year
//! - [`explore`]: one full render, returning a typed outcome
//!
//! Everything runs sequentially; a render awaits one remote call at a time.

pub mod cache;
pub mod explore;
pub mod images;
pub mod region;
pub mod series;

pub use bw_gee::raster::anomaly;

use bw_gee::engine::EarthEngine;
use cache::{ImageCache, SeriesCache};

pub struct Explorer<E: EarthEngine> {
    engine: E,
    images: ImageCache,
    series: SeriesCache,
}

impl<E: EarthEngine> Explorer<E> {
    /// Explorer with fresh, empty caches.
    pub fn new(engine: E) -> Self {
        Self::with_caches(engine, ImageCache::new(), SeriesCache::new())
    }

    pub fn with_caches(engine: E, images: ImageCache, series: SeriesCache) -> Self {
        Self {
            engine,
            images,
            series,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn image_cache(&self) -> &ImageCache {
        &self.images
    }

    pub fn series_cache(&self) -> &SeriesCache {
        &self.series
    }

    /// Give back the engine and caches, e.g. to carry warm caches over.
    pub fn into_parts(self) -> (E, ImageCache, SeriesCache) {
        (self.engine, self.images, self.series)
    }
}
