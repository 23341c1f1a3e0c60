//! Cached, fault-tolerant SRID resolution.

use std::sync::Arc;
use tracing::{debug, warn};

use ows_common::OwsResult;
use storage::KeyValueCache;

use crate::local;
use crate::source::{EpsgApiClient, EpsgSource};
use crate::spatial_reference::{Origin, SpatialReference};
use crate::RegistryConfig;

/// Axis-order registry.
///
/// Resolution order: cache, remote EPSG API, bundled definitions. Only
/// remote results are written to the cache, so a temporary outage does not
/// pin a local answer for a week.
pub struct Registry {
    config: RegistryConfig,
    cache: Arc<dyn KeyValueCache>,
    source: Arc<dyn EpsgSource>,
}

impl Registry {
    /// Registry backed by the EPSG API client described in `config`.
    pub fn new(config: RegistryConfig, cache: Arc<dyn KeyValueCache>) -> OwsResult<Self> {
        let source = Arc::new(EpsgApiClient::new(&config)?);
        Ok(Self::with_source(config, cache, source))
    }

    pub fn with_source(
        config: RegistryConfig,
        cache: Arc<dyn KeyValueCache>,
        source: Arc<dyn EpsgSource>,
    ) -> Self {
        Self {
            config,
            cache,
            source,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Resolve an SRID. Never fails; degraded paths are logged.
    pub async fn get(&self, srid: u32) -> SpatialReference {
        let key = self.config.cache_key(srid);

        match self.cache.get(&key).await {
            Ok(Some(wkt)) => match SpatialReference::from_wkt(srid, &wkt, Origin::FromCache) {
                Ok(reference) => {
                    debug!(srid = srid, "EPSG definition cache hit");
                    return reference;
                }
                Err(e) => warn!(srid = srid, error = %e, "Ignoring unparseable cached WKT"),
            },
            Ok(None) => debug!(srid = srid, "EPSG definition cache miss"),
            Err(e) => warn!(srid = srid, error = %e, "EPSG definition cache read failed"),
        }

        match self.source.fetch_wkt(srid).await {
            Ok(wkt) => match SpatialReference::from_wkt(srid, &wkt, Origin::FromRemoteRegistry) {
                Ok(reference) => {
                    if let Err(e) = self.cache.set(&key, &wkt, self.config.cache_ttl).await {
                        warn!(srid = srid, error = %e, "Failed to cache EPSG definition");
                    }
                    debug!(srid = srid, "Resolved SRID from EPSG API");
                    return reference;
                }
                Err(e) => warn!(srid = srid, error = %e, "EPSG API returned unparseable WKT"),
            },
            Err(e) => warn!(
                srid = srid,
                error = %e,
                "EPSG API lookup failed, using local definitions"
            ),
        }

        local::lookup(srid)
    }
}
