//! Registry resolution order, caching and axis correction.

use async_trait::async_trait;
use geo::{LineString, MultiPolygon, Polygon};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use epsg_registry::{
    adjust_axis_order, swap_axes, CrsKind, EpsgSource, Origin, Registry, RegistryConfig,
    RemoteLookupError,
};
use ows_common::{Geometry, OwsResult};
use storage::{KeyValueCache, MemoryCache};

const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#;

struct FailingSource;

#[async_trait]
impl EpsgSource for FailingSource {
    async fn fetch_wkt(&self, _srid: u32) -> Result<String, RemoteLookupError> {
        Err(RemoteLookupError::Unavailable("connection refused".to_string()))
    }
}

struct StaticSource {
    wkt: &'static str,
    calls: AtomicUsize,
}

#[async_trait]
impl EpsgSource for StaticSource {
    async fn fetch_wkt(&self, _srid: u32) -> Result<String, RemoteLookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.wkt.to_string())
    }
}

/// Memory cache that counts writes.
#[derive(Default)]
struct RecordingCache {
    inner: MemoryCache,
    writes: AtomicUsize,
}

#[async_trait]
impl KeyValueCache for RecordingCache {
    async fn get(&self, key: &str) -> OwsResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> OwsResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> OwsResult<()> {
        self.inner.delete(key).await
    }
}

fn square(min: f64, max: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![(min, min + 1.0), (max, min + 1.0), (max, max), (min, min + 1.0)]),
        Vec::new(),
    )
}

// ============================================================================
// Fallback
// ============================================================================

#[tokio::test]
async fn test_remote_failure_falls_back_to_local_without_caching() {
    let cache = Arc::new(RecordingCache::default());
    let registry =
        Registry::with_source(RegistryConfig::default(), cache.clone(), Arc::new(FailingSource));

    let reference = registry.get(25832).await;

    assert_eq!(reference.origin, Origin::FromLocalLibrary);
    assert_eq!(reference.origin.as_str(), "from_local_gdal");
    assert_eq!(reference.is_yx_order(), Some(false));
    assert_eq!(cache.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_srid_has_no_axis_order() {
    let registry = Registry::with_source(
        RegistryConfig::default(),
        Arc::new(MemoryCache::default()),
        Arc::new(FailingSource),
    );

    let reference = registry.get(999_999).await;
    assert_eq!(reference.kind, CrsKind::Unknown);
    assert_eq!(reference.is_yx_order(), None);
}

#[tokio::test]
async fn test_unparseable_remote_wkt_falls_back() {
    let cache = Arc::new(RecordingCache::default());
    let source = Arc::new(StaticSource {
        wkt: "<html>Service Unavailable</html>",
        calls: AtomicUsize::new(0),
    });
    let registry = Registry::with_source(RegistryConfig::default(), cache.clone(), source);

    let reference = registry.get(4326).await;
    assert_eq!(reference.origin, Origin::FromLocalLibrary);
    assert_eq!(cache.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_api_falls_back() {
    let config = RegistryConfig::default()
        .with_api_url("http://127.0.0.1:9")
        .with_timeout(Duration::from_secs(2));
    let cache = Arc::new(RecordingCache::default());
    let registry = Registry::new(config, cache.clone()).unwrap();

    let reference = registry.get(25832).await;
    assert_eq!(reference.origin, Origin::FromLocalLibrary);
    assert_eq!(cache.writes.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_remote_result_is_cached() {
    let cache = Arc::new(RecordingCache::default());
    let source = Arc::new(StaticSource {
        wkt: WGS84_WKT,
        calls: AtomicUsize::new(0),
    });
    let registry = Registry::with_source(RegistryConfig::default(), cache.clone(), source.clone());

    let first = registry.get(4326).await;
    assert_eq!(first.origin, Origin::FromRemoteRegistry);
    assert_eq!(first.is_yx_order(), Some(true));
    assert_eq!(
        cache.get("epsg_api_axis_order_4326").await.unwrap().as_deref(),
        Some(WGS84_WKT)
    );

    let second = registry.get(4326).await;
    assert_eq!(second.origin, Origin::FromCache);
    assert_eq!(second.is_yx_order(), Some(true));
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_custom_cache_prefix() {
    let cache = Arc::new(MemoryCache::default());
    let mut config = RegistryConfig::default();
    config.cache_prefix = "axis_".to_string();
    let source = Arc::new(StaticSource {
        wkt: WGS84_WKT,
        calls: AtomicUsize::new(0),
    });
    let registry = Registry::with_source(config, cache.clone(), source);

    registry.get(4326).await;
    assert!(cache.get("axis_4326").await.unwrap().is_some());
}

// ============================================================================
// Axis correction
// ============================================================================

#[tokio::test]
async fn test_adjust_axis_order_swaps_yx_srid() {
    let registry = Registry::with_source(
        RegistryConfig::default(),
        Arc::new(MemoryCache::default()),
        Arc::new(StaticSource {
            wkt: WGS84_WKT,
            calls: AtomicUsize::new(0),
        }),
    );
    let geometry = Geometry::point(7.0, 51.0, Some(4326));

    let adjusted = adjust_axis_order(&registry, &geometry).await;
    assert_eq!(adjusted, Geometry::point(51.0, 7.0, Some(4326)));
}

#[tokio::test]
async fn test_adjust_axis_order_twice_is_identity() {
    let registry = Registry::with_source(
        RegistryConfig::default(),
        Arc::new(MemoryCache::default()),
        Arc::new(StaticSource {
            wkt: WGS84_WKT,
            calls: AtomicUsize::new(0),
        }),
    );
    let geometry = Geometry::multi_polygon(
        MultiPolygon::new(vec![square(0.0, 5.0), square(10.0, 20.0)]),
        Some(4326),
    );

    let once = adjust_axis_order(&registry, &geometry).await;
    assert_ne!(once, geometry);
    let twice = adjust_axis_order(&registry, &once).await;
    assert_eq!(twice, geometry);
}

#[tokio::test]
async fn test_adjust_axis_order_keeps_xy_and_unknown() {
    let registry = Registry::with_source(
        RegistryConfig::default(),
        Arc::new(MemoryCache::default()),
        Arc::new(FailingSource),
    );

    let utm = Geometry::polygon(square(280_000.0, 290_000.0), Some(25832));
    assert_eq!(adjust_axis_order(&registry, &utm).await, utm);

    let unknown = Geometry::point(1.0, 2.0, Some(999_999));
    assert_eq!(adjust_axis_order(&registry, &unknown).await, unknown);

    let no_srid = Geometry::point(1.0, 2.0, None);
    assert_eq!(adjust_axis_order(&registry, &no_srid).await, no_srid);
}

#[test]
fn test_swap_axes_preserves_srid_and_kind() {
    let geometry = Geometry::polygon(square(0.0, 5.0), Some(3035));
    let swapped = swap_axes(&geometry);
    assert_eq!(swapped.srid, Some(3035));
    assert!(swapped.is_polygonal());
    assert_eq!(swap_axes(&swapped), geometry);
}
