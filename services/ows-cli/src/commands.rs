//! Subcommand implementations.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::http::{Method, Request};
use bytes::Bytes;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use capabilities::{detect, render_camouflaged, Mapper, Record};
use epsg_registry::{Registry, RegistryConfig};
use ows_common::Geometry;
use ows_protocol::{GetFeatureRequest, OgcRequest, TransactionRequest};
use ows_xml::XmlDocument;
use storage::{DocumentCache, KeyValueCache, MemoryCache, RedisCache};

/// Entries kept by the in-memory cache.
const MEMORY_CACHE_CAPACITY: usize = 1024;

pub fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write to `path`, or stdout when `None`.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", contents);
            Ok(())
        }
    }
}

/// Read a GeoJSON geometry (or a Feature wrapping one) from `path`.
pub fn read_area(path: &Path, srid: Option<u32>) -> Result<Geometry> {
    let text = read_input(path)?;
    Geometry::from_geojson_str(&text, srid)
        .with_context(|| format!("Invalid area in {}", path.display()))
}

/// Redis when a URL is given, otherwise a process-local LRU cache.
pub async fn build_cache(redis_url: Option<&str>) -> Result<Arc<dyn KeyValueCache>> {
    match redis_url {
        Some(url) => {
            let cache = RedisCache::connect(url)
                .await
                .with_context(|| format!("Failed to connect to Redis at {}", url))?;
            info!("Using Redis cache");
            Ok(Arc::new(cache))
        }
        None => {
            debug!(capacity = MEMORY_CACHE_CAPACITY, "Using in-memory cache");
            Ok(Arc::new(MemoryCache::new(MEMORY_CACHE_CAPACITY)))
        }
    }
}

pub async fn build_registry(api_url: Option<&str>, redis_url: Option<&str>) -> Result<Registry> {
    let mut config = RegistryConfig::from_env();
    if let Some(url) = api_url {
        config = config.with_api_url(url);
    }
    let cache = build_cache(redis_url).await?;
    Registry::new(config, cache).context("Failed to create EPSG registry")
}

fn map_capabilities(xml: &str) -> Result<(XmlDocument, Record, &'static capabilities::SchemaMapping)> {
    let doc = XmlDocument::parse(xml).context("Capabilities document is not well-formed XML")?;
    let mapping = detect(&doc).context("Unsupported capabilities document")?;
    let record = Mapper::parse(&doc, mapping).context("Failed to map capabilities document")?;
    Ok((doc, record, mapping))
}

/// Record tree of a capabilities document as pretty JSON.
pub fn parse_capabilities(xml: &str) -> Result<String> {
    let (_, record, mapping) = map_capabilities(xml)?;
    info!(
        service = mapping.service_type.as_str(),
        title = record.get_str("title").unwrap_or_default(),
        "Mapped capabilities document"
    );
    record.to_json().context("Failed to serialize record")
}

/// Camouflaged capabilities document with the `hide` layers or feature
/// types removed.
pub async fn camouflage_capabilities(
    cache: &DocumentCache,
    xml: &str,
    proxy_base: &str,
    hide: &[String],
) -> Result<String> {
    let (doc, mut record, mapping) = map_capabilities(xml)?;

    let mut hidden = 0;
    record.walk_mut(&mut |node| {
        let matches = node
            .get_str("identifier")
            .is_some_and(|id| hide.iter().any(|h| h == id));
        if matches {
            node.set_active(false);
            hidden += 1;
        }
    });
    if hidden < hide.len() {
        warn!(requested = hide.len(), hidden = hidden, "Some entities to hide were not found");
    }

    Ok(render_camouflaged(cache, &doc, &record, mapping, proxy_base).await?)
}

/// Secured WFS body and the number of queries or actions changed.
pub fn secure_request(xml: &str, value_reference: &str, area: &Geometry) -> Result<(String, usize)> {
    let doc = XmlDocument::parse(xml).context("Request body is not well-formed XML")?;
    let root = doc.root_element().context("Request body has no root element")?;

    match doc.local_name(root) {
        Some("GetFeature") => {
            let mut request = GetFeatureRequest::from_document(doc)?;
            let changed = request.secure_spatial(value_reference, area)?;
            Ok((request.to_xml()?, changed))
        }
        Some("Transaction") => {
            let mut request = TransactionRequest::from_document(doc)?;
            let changed = request.secure_spatial(value_reference, area)?;
            Ok((request.to_xml()?, changed))
        }
        other => bail!(
            "Expected a WFS GetFeature or Transaction body, found {}",
            other.unwrap_or("nothing")
        ),
    }
}

/// Summary of how the proxy sees a request.
pub fn classify(method: &str, uri: &str, body: Option<&str>) -> Result<JsonValue> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method {}", method))?;
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body.map(|b| Bytes::from(b.to_string())).unwrap_or_default())
        .context("Invalid request")?;
    let ogc = OgcRequest::from_http(&request)?;

    let kinds: Vec<&str> = [
        ("GetCapabilities", ogc.is_get_capabilities_request()),
        ("GetMap", ogc.is_get_map_request()),
        ("GetFeatureInfo", ogc.is_get_feature_info_request()),
        ("GetFeature", ogc.is_get_feature_request()),
        ("Transaction", ogc.is_transaction_request()),
        ("DescribeFeatureType", ogc.is_describe_feature_type_request()),
        ("GetRecords", ogc.is_get_records_request()),
        ("GetRecordById", ogc.is_get_record_by_id_request()),
    ]
    .into_iter()
    .filter_map(|(name, hit)| hit.then_some(name))
    .collect();
    let (authority, srid) = ogc.srs_name();

    Ok(json!({
        "method": ogc.method().as_str(),
        "service": ogc.service(),
        "operation": ogc.operation(),
        "version": ogc.version(),
        "kinds": kinds,
        "requested_entities": ogc.requested_entities(),
        "bbox": ogc.bbox(),
        "srs": { "authority": authority, "srid": srid },
    }))
}

/// Resolved definition and axis order of `srid`.
pub async fn axis_order(registry: &Registry, srid: u32) -> Result<JsonValue> {
    let reference = registry.get(srid).await;
    Ok(json!({
        "srid": reference.srid,
        "origin": reference.origin.as_str(),
        "kind": reference.kind,
        "axis_order": reference.axis_order(),
        "is_yx_order": reference.is_yx_order(),
        "axes": reference.axes,
    }))
}
