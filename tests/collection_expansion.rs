use async_trait::async_trait;
use deepzoom::prelude::*;

/// Collection items expanding into their dense pyramids and contracting again
#[cfg(test)]
mod collection_expansion {
    use super::*;

    const ITEM: &str = r#"{
        "width": 1200,
        "height": 800,
        "dzcTileSize": 256,
        "dzcMaxLevel": 5,
        "dzcItemId": 3,
        "dzcTilesUrl": "http://host/coll_files/",
        "dzcImageFormat": "jpg",
        "dzcItemN": 11,
        "dzcExpansionUrl": "http://host/items/3.dzi"
    }"#;

    const EXPANSION: &str = r#"{
        "width": 1200,
        "height": 800,
        "tileSize": 256,
        "tileOverlap": 1,
        "tilesUrl": "http://host/items/3_files/",
        "imageFormat": "png"
    }"#;

    /// Serves a fixed manifest
    struct StaticFetcher;

    #[async_trait]
    impl ManifestFetcher for StaticFetcher {
        async fn fetch_dense(&self, url: &str) -> Result<DenseSource> {
            assert_eq!(url, "http://host/items/3.dzi");
            DenseSource::from_json(EXPANSION)
        }
    }

    /// Always fails, like a host that is offline
    struct OfflineFetcher;

    #[async_trait]
    impl ManifestFetcher for OfflineFetcher {
        async fn fetch_dense(&self, url: &str) -> Result<DenseSource> {
            Err(Error::ExpansionUnavailable(url.to_string()))
        }
    }

    fn item() -> CollectionItemSource {
        CollectionItemSource::from_json(ITEM).unwrap()
    }

    /// Levels past the collection only exist once the expansion arrives
    #[tokio::test]
    async fn test_expansion_adds_levels() {
        deepzoom::core::logging::init();
        let mut source = item();
        assert!(source.level_exists(5));
        assert!(!source.level_exists(6));

        let request = source.expand().expect("item has an expansion url");
        request.resolve_with(&StaticFetcher).await.unwrap();
        // nothing changes until the item polls
        assert!(!source.level_exists(6));
        assert!(source.poll_expansion());

        assert!(source.level_exists(6));
        assert!(source.level_exists(11));
        assert!(!source.level_exists(12));
        assert_eq!(
            source.tile_info(TileAddress::new(6, 0, 0)).unwrap().url,
            "http://host/items/3_files/6/0_0.png"
        );
        assert_eq!(
            source.tile_info(TileAddress::new(5, 0, 0)).unwrap().url,
            "http://host/coll_files/5/0_0.jpg"
        );
    }

    /// A tile at the top of the collection is covered by the first expansion level
    #[tokio::test]
    async fn test_coverage_across_the_collection_boundary() {
        let mut source = item();
        let top = Tile::with_source(TileAddress::new(5, 0, 0), &source).unwrap();
        assert_eq!(top.tiles_above(), None);

        source.expand().unwrap().resolve_with(&StaticFetcher).await.unwrap();
        source.poll_expansion();

        let mut top = Tile::with_source(TileAddress::new(5, 0, 0), &source).unwrap();
        assert_eq!(top.tiles_above(), Some(1));
        let first_dense = Tile::with_source(TileAddress::new(6, 0, 0), &source).unwrap();
        assert_eq!(first_dense.tile_below(), Some(TileAddress::new(5, 0, 0)));
        assert_eq!(first_dense.crop(), None);
        assert!(top.cover().unwrap());

        // deeper dense tiles point at dense tiles again
        let deep = Tile::with_source(TileAddress::new(10, 2, 1), &source).unwrap();
        assert_eq!(deep.tile_below(), Some(TileAddress::new(9, 1, 0)));
    }

    /// Thumbnails stay cropped out of the shared collection tile
    #[test]
    fn test_collection_levels_are_cropped() {
        let source = item();
        for level in 0..=5 {
            let info = source.tile_info(TileAddress::new(level, 0, 0)).unwrap();
            let crop = info.crop.expect("collection tiles are cropped");
            assert!(crop.width >= 1.0 && crop.height >= 1.0);
        }
        assert!(source.tile_info(TileAddress::new(6, 0, 0)).is_err());
    }

    /// A failed fetch leaves the request pending until the item is contracted
    #[tokio::test]
    async fn test_failed_fetch_can_be_retried_after_contract() {
        let mut source = item();
        let err = source
            .expand()
            .unwrap()
            .resolve_with(&OfflineFetcher)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExpansionUnavailable(_)));
        assert!(source.is_expansion_pending());
        assert!(source.expand().is_none());

        source.contract();
        let request = source.expand().unwrap();
        request.resolve_with(&StaticFetcher).await.unwrap();
        assert!(source.poll_expansion());
        assert!(source.is_expanded());
    }

    /// A manifest that lands after contract is ignored
    #[tokio::test]
    async fn test_late_expansion_is_dropped() {
        let mut source = item();
        let request = source.expand().unwrap();
        source.contract();

        request.resolve_with(&StaticFetcher).await.unwrap();
        assert!(!source.poll_expansion());
        assert!(!source.is_expanded());
        assert!(!source.level_exists(6));
    }

    /// The item works through the `Source` enum as well
    #[tokio::test]
    async fn test_through_source_enum() {
        let mut source = Source::from(item());
        assert!(source.as_dense().is_none());

        let request = source.as_collection_item_mut().unwrap().expand().unwrap();
        request.resolve_with(&StaticFetcher).await.unwrap();
        source.as_collection_item_mut().unwrap().poll_expansion();
        assert!(source.level_exists(8));

        source.as_collection_item_mut().unwrap().contract();
        assert!(!source.level_exists(8));
    }
}
