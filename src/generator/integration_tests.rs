#[cfg(test)]
mod integration_tests {
    use super::super::*;
    use crate::{
        AreaResolver, AreaSpec, GeneratorConfig, GeoBoundingBox, MockPlaceResolver, MockTileSource,
        TilesError,
    };
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    fn config(output_dir: &Path) -> GeneratorConfig {
        GeneratorConfig::builder()
            .zoom_range(8, 10)
            .output_dir(output_dir)
            .delay(Duration::ZERO)
            .workers(3)
            .build()
            .unwrap()
    }

    fn area() -> ResolvedArea {
        ResolvedArea {
            bounds: GeoBoundingBox::new(52.6, 52.4, 13.5, 13.3).unwrap(),
            label: "custom area".to_string(),
            places: Vec::new(),
        }
    }

    fn read_tree(root: &Path, plan: &TilePlan) -> Vec<Vec<u8>> {
        let store = TileStore::new(root, "png");
        plan.keys()
            .map(|key| std::fs::read(store.tile_path(key)).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_second_run_fetches_nothing() {
        let temp_dir = TempDir::new().unwrap();

        let first_source = Arc::new(MockTileSource::new());
        let generator = TileGenerator::new(config(temp_dir.path()), first_source.clone()).unwrap();
        let plan = generator.plan(&area().bounds).unwrap();

        let first = generator.generate(&area()).await.unwrap();
        assert_eq!(first.summary.downloaded, plan.len());
        assert_eq!(first_source.calls() as u64, plan.len());
        let before = read_tree(temp_dir.path(), &plan);

        let second_source = Arc::new(MockTileSource::new());
        let generator = TileGenerator::new(config(temp_dir.path()), second_source.clone()).unwrap();
        let second = generator.generate(&area()).await.unwrap();

        assert_eq!(second_source.calls(), 0);
        assert_eq!(second.summary.cached, plan.len());
        assert_eq!(second.summary.downloaded, 0);
        assert_eq!(second.summary.failed, 0);
        assert_eq!(read_tree(temp_dir.path(), &plan), before);
    }

    #[tokio::test]
    async fn test_single_failure_does_not_abort_run() {
        let temp_dir = TempDir::new().unwrap();
        let generator = TileGenerator::new(
            config(temp_dir.path()),
            Arc::new(MockTileSource::new()),
        )
        .unwrap();
        let plan = generator.plan(&area().bounds).unwrap();
        let broken = plan.keys().nth(3).unwrap();

        let source = Arc::new(MockTileSource::new().with_failing_key(broken));
        let generator = TileGenerator::new(config(temp_dir.path()), source).unwrap();
        let report = generator.run(&plan, "custom area").await.unwrap();

        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.downloaded, plan.len() - 1);
        assert!(report.metadata_path.is_some());

        let store = TileStore::new(temp_dir.path(), "png");
        assert!(!store.tile_path(broken).exists());
        for key in plan.keys().filter(|key| *key != broken) {
            assert!(store.tile_path(key).exists(), "missing {}", key);
        }
    }

    #[tokio::test]
    async fn test_rerun_fills_in_previously_failed_tiles() {
        let temp_dir = TempDir::new().unwrap();
        let bounds = area().bounds;
        let plan = TilePlan::build(&bounds, 8, 10).unwrap();
        let broken = plan.keys().last().unwrap();

        let failing = Arc::new(MockTileSource::new().with_failing_key(broken));
        TileGenerator::new(config(temp_dir.path()), failing)
            .unwrap()
            .run(&plan, "custom area")
            .await
            .unwrap();

        let healthy = Arc::new(MockTileSource::new());
        let report = TileGenerator::new(config(temp_dir.path()), healthy.clone())
            .unwrap()
            .run(&plan, "custom area")
            .await
            .unwrap();

        assert_eq!(healthy.calls(), 1);
        assert_eq!(report.summary.downloaded, 1);
        assert_eq!(report.summary.cached, plan.len() - 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_then_resume() {
        let temp_dir = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let source = Arc::new(MockTileSource::new());
        let report = TileGenerator::new(config(temp_dir.path()), source.clone())
            .unwrap()
            .with_cancellation(cancel)
            .generate(&area())
            .await
            .unwrap();
        assert!(report.summary.cancelled);
        assert_eq!(source.calls(), 0);

        let report = TileGenerator::new(config(temp_dir.path()), source.clone())
            .unwrap()
            .generate(&area())
            .await
            .unwrap();
        assert!(!report.summary.cancelled);
        assert_eq!(report.summary.downloaded, report.summary.total);
    }

    #[tokio::test]
    async fn test_inverted_bounds_rejected_before_any_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("tiles");
        let source = Arc::new(MockTileSource::new());
        let generator = TileGenerator::new(config(&output_dir), source.clone()).unwrap();
        let resolver = AreaResolver::new(Arc::new(MockPlaceResolver::new()));

        let outcome = async {
            let area = resolver
                .resolve(&AreaSpec::bounds(52.4, 52.6, 13.5, 13.3))
                .await?;
            generator.generate(&area).await
        }
        .await;

        assert!(matches!(outcome, Err(TilesError::Config(_))));
        assert_eq!(source.calls(), 0);
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = config(Path::new("unused"));
        config.min_zoom = 12;
        config.max_zoom = 8;

        let result = TileGenerator::new(config, Arc::new(MockTileSource::new()));
        assert!(matches!(result, Err(TilesError::Config(_))));
    }

    #[tokio::test]
    async fn test_place_to_tiles_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path());
        let resolver = AreaResolver::from_config(Arc::new(MockPlaceResolver::new()), &config);
        let area = resolver.resolve(&AreaSpec::place("test")).await.unwrap();

        let source = Arc::new(MockTileSource::new());
        let generator = TileGenerator::new(config, source.clone()).unwrap();
        let report = generator.generate(&area).await.unwrap();

        assert_eq!(report.summary.total, generator.plan(&area.bounds).unwrap().len());
        assert_eq!(report.summary.succeeded(), report.summary.total);
        assert_eq!(
            report.metadata_path.as_deref(),
            Some(temp_dir.path().join(METADATA_FILE).as_path())
        );

        let metadata = TileSetMetadata::read_from(temp_dir.path()).await.unwrap();
        assert_eq!(metadata.description, "Map tiles for test");
        assert_eq!(metadata.source, "mock");
        assert_eq!((metadata.min_zoom, metadata.max_zoom), (8, 10));
        for (written, requested) in metadata.bounds.iter().zip(area.bounds.to_array().iter()) {
            assert!((written - requested).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_metadata_describes_request_even_when_all_fail() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(MockTileSource::new().with_failure());
        let report = TileGenerator::new(config(temp_dir.path()), source)
            .unwrap()
            .generate(&area())
            .await
            .unwrap();

        assert_eq!(report.summary.failed, report.summary.total);
        let metadata = TileSetMetadata::read_from(temp_dir.path()).await.unwrap();
        for (written, requested) in metadata.bounds.iter().zip([13.3, 52.4, 13.5, 52.6].iter()) {
            assert!((written - requested).abs() < 1e-9);
        }
    }
}
