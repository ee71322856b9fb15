use log::{debug, info};

use bw_gee::engine::EarthEngine;
use bw_gee::error::Result;
use bw_gee::index::IndexKind;
use bw_gee::period::Period;
use bw_gee::raster::IndexImage;

use crate::Explorer;

impl<E: EarthEngine> Explorer<E> {
    /// Monthly mean composite of `kind` for `period`.
    ///
    /// `Ok(None)` means the archive has no scene in that month, which is a
    /// normal outcome for recent or pre-archive months. Both outcomes are
    /// memoized; service errors are returned and not cached, so the next
    /// render asks again.
    pub async fn index_image(&mut self, period: Period, kind: IndexKind) -> Result<Option<IndexImage>> {
        let key = (period, kind);
        if let Some(cached) = self.images.get(&key) {
            debug!("Composite cache hit for {} {}", kind, period);
            return Ok(cached);
        }

        let scene_count = self.engine.count_scenes(kind, &period.interval()).await?;
        let image = if scene_count == 0 {
            info!("No {} scenes for {}", kind, period);
            None
        } else {
            Some(IndexImage {
                period,
                kind,
                scene_count,
            })
        };
        self.images.insert(key, image.clone());
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use crate::Explorer;
    use bw_gee::index::IndexKind;
    use bw_gee::mock::MockEngine;
    use bw_gee::period::Period;
    use bw_gee::raster::Raster;

    fn may(year: i32) -> Period {
        Period::new(year, 5).unwrap()
    }

    #[tokio::test]
    async fn test_image_present() {
        let engine = MockEngine::new().with_scenes(
            IndexKind::Ndvi,
            2024,
            5,
            vec![vec![Some(5000.0)], vec![Some(7000.0)]],
        );
        let mut explorer = Explorer::new(engine);
        let image = explorer
            .index_image(may(2024), IndexKind::Ndvi)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(image.scene_count, 2);
        assert_eq!(
            image.raster(),
            Raster::Composite {
                kind: IndexKind::Ndvi,
                period: may(2024)
            }
        );
    }

    #[tokio::test]
    async fn test_no_scenes_is_absent_not_error() {
        let mut explorer = Explorer::new(MockEngine::new());
        let image = explorer.index_image(may(2025), IndexKind::Evi).await;
        assert!(matches!(image, Ok(None)));
    }

    #[tokio::test]
    async fn test_memoized_by_value() {
        let engine = MockEngine::new().with_uniform_scene(IndexKind::Ndvi, 2024, 5, 6000.0, 4);
        let mut explorer = Explorer::new(engine);
        for _ in 0..3 {
            let period = Period::new(2024, 5).unwrap();
            assert!(explorer
                .index_image(period, IndexKind::Ndvi)
                .await
                .unwrap()
                .is_some());
        }
        // absence is cached as well
        for _ in 0..2 {
            assert!(explorer
                .index_image(may(2019), IndexKind::Ndvi)
                .await
                .unwrap()
                .is_none());
        }
        assert_eq!(explorer.engine().scene_counts(), 2);
        assert_eq!(explorer.image_cache().len(), 2);
        assert_eq!(explorer.image_cache().hits(), 3);
    }

    #[tokio::test]
    async fn test_kind_is_part_of_key() {
        let engine = MockEngine::new().with_uniform_scene(IndexKind::Ndvi, 2024, 5, 6000.0, 4);
        let mut explorer = Explorer::new(engine);
        assert!(explorer.index_image(may(2024), IndexKind::Ndvi).await.unwrap().is_some());
        assert!(explorer.index_image(may(2024), IndexKind::Evi).await.unwrap().is_none());
        assert_eq!(explorer.engine().scene_counts(), 2);
    }

    #[tokio::test]
    async fn test_service_error_is_not_cached() {
        let engine = MockEngine::new().with_uniform_scene(IndexKind::Ndvi, 2024, 5, 6000.0, 4);
        engine.set_unreachable(true);
        let mut explorer = Explorer::new(engine);
        assert!(explorer.index_image(may(2024), IndexKind::Ndvi).await.is_err());
        assert!(explorer.image_cache().is_empty());

        explorer.engine().set_unreachable(false);
        assert!(explorer.index_image(may(2024), IndexKind::Ndvi).await.unwrap().is_some());
        assert_eq!(explorer.engine().scene_counts(), 2);
    }
}
