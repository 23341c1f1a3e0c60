//! Proxy URL camouflage.
//!
//! Capabilities documents advertise the upstream service's own endpoints.
//! Before handing a document to a client, every endpoint is rewritten to
//! point at the proxy, keeping the query string the upstream advertised.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{debug, info};

use ows_common::{OwsError, OwsResult};
use ows_xml::XmlDocument;
use storage::DocumentCache;

use crate::mapping::SchemaMapping;
use crate::projector::Projector;
use crate::record::{Record, Value};

/// Models and fields holding service endpoints.
const URL_FIELDS: &[(&str, &str)] = &[("OperationUrl", "url"), ("Style", "legend_url")];

/// Rewrite the endpoint URLs of `record` and all its descendants to
/// `proxy_base`. Returns the number of URLs rewritten.
pub fn camouflage_operation_urls(record: &mut Record, proxy_base: &str) -> usize {
    let mut rewritten = 0;
    record.walk_mut(&mut |node| {
        for (model, field) in URL_FIELDS {
            if node.model != *model {
                continue;
            }
            let Some(url) = node.get_str(field) else {
                continue;
            };
            let proxied = proxy_url(url, proxy_base);
            if proxied != url {
                node.set(*field, Value::String(proxied));
                rewritten += 1;
            }
        }
    });
    debug!(proxy_base = proxy_base, rewritten = rewritten, "Camouflaged endpoint URLs");
    rewritten
}

/// `proxy_base` followed by the query string of `url`, if any.
fn proxy_url(url: &str, proxy_base: &str) -> String {
    let base = proxy_base.split('?').next().unwrap_or(proxy_base);
    match url.split_once('?') {
        Some((_, query)) if !query.is_empty() => format!("{}?{}", base, query),
        _ => base.to_string(),
    }
}

/// Copy of `doc` with every endpoint of `record` rewritten to `proxy_base`.
///
/// `record` itself is not modified.
pub fn camouflage(
    doc: &XmlDocument,
    record: &Record,
    mapping: &SchemaMapping,
    proxy_base: &str,
) -> OwsResult<XmlDocument> {
    let mut record = record.clone();
    camouflage_operation_urls(&mut record, proxy_base);
    Projector::update(doc, &record, mapping)
}

/// Camouflaged document serialized to XML, served from `cache` when a
/// rendering of the same record state for the same proxy base exists.
///
/// The cache key carries a fingerprint of the whole record, so deactivating
/// a layer or editing a field yields a fresh rendering.
pub async fn render_camouflaged(
    cache: &DocumentCache,
    doc: &XmlDocument,
    record: &Record,
    mapping: &SchemaMapping,
    proxy_base: &str,
) -> OwsResult<String> {
    let title = record.get_str("title").unwrap_or_default();
    let version = record
        .get_str("version")
        .or_else(|| mapping.versions.first().copied())
        .unwrap_or_default();
    let key = format!("{}#{:016x}", proxy_base, fingerprint(record)?);

    if let Some(xml) = cache.get(title, version, &key).await {
        return Ok(xml);
    }

    let xml = camouflage(doc, record, mapping, proxy_base)?
        .to_xml()
        .map_err(|e| OwsError::InvalidXml(e.to_string()))?;
    info!(
        title = title,
        version = version,
        bytes = xml.len(),
        "Rendered camouflaged capabilities document"
    );
    cache.set(title, version, &key, &xml).await;
    Ok(xml)
}

/// Hash of the record's JSON form, fields and children included.
fn fingerprint(record: &Record) -> OwsResult<u64> {
    let json = record.to_json()?;
    let mut hasher = DefaultHasher::new();
    json.hash(&mut hasher);
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_url_keeps_query() {
        assert_eq!(
            proxy_url("http://internal:8080/geoserver/wms?SERVICE=WMS&", "https://gw/ows/7"),
            "https://gw/ows/7?SERVICE=WMS&"
        );
        assert_eq!(proxy_url("http://internal/wms", "https://gw/ows/7"), "https://gw/ows/7");
        assert_eq!(proxy_url("http://internal/wms?", "https://gw/ows/7?x=1"), "https://gw/ows/7");
    }

    #[test]
    fn test_fingerprint_follows_record_state() {
        let mut layer = Record::new("Layer");
        layer.set("identifier", "roads");
        let mut service = Record::new("Service");
        service.children.insert("layers".to_string(), vec![layer]);

        let before = fingerprint(&service).unwrap();
        assert_eq!(fingerprint(&service.clone()).unwrap(), before);

        service.children_mut("layers").unwrap()[0].set_active(false);
        assert_ne!(fingerprint(&service).unwrap(), before);
    }

    #[test]
    fn test_rewrites_nested_urls() {
        let mut service = Record::new("Service");
        service.set("online_resource", "http://internal/");

        let mut op = Record::new("OperationUrl");
        op.set("url", "http://internal/wms?");
        let mut style = Record::new("Style");
        style.set("legend_url", "http://internal/legend?layer=roads");
        let mut layer = Record::new("Layer");
        layer.children.insert("styles".to_string(), vec![style]);

        service.children.insert("operation_urls".to_string(), vec![op]);
        service.children.insert("layers".to_string(), vec![layer]);

        assert_eq!(camouflage_operation_urls(&mut service, "https://gw/p"), 2);
        assert_eq!(service.children("operation_urls")[0].get_str("url"), Some("https://gw/p"));
        assert_eq!(
            service.children("layers")[0].children("styles")[0].get_str("legend_url"),
            Some("https://gw/p?layer=roads")
        );
        // Only endpoint fields are touched.
        assert_eq!(service.get_str("online_resource"), Some("http://internal/"));
    }
}
