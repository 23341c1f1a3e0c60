//! Classification of incoming OGC requests.
//!
//! Requests arrive either as GET with key-value parameters or as POST with an
//! XML body. Parameter names are case-insensitive in OGC services, so keys
//! are lower-cased once on construction.

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::{Method, Request};
use bytes::Bytes;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use ows_common::{BoundingBox, Geometry, OwsError, OwsResult, SrsName};
use ows_xml::XmlDocument;

use crate::namespaces::{CSW_202, WFS_1, WFS_20};
use crate::wfs::{GetFeatureRequest, TransactionRequest};

/// An incoming WMS, WFS or CSW request.
#[derive(Debug)]
pub struct OgcRequest {
    method: Method,
    params: HashMap<String, String>,
    body: Option<XmlDocument>,
    operation: Option<String>,
    version: Option<String>,
    service: Option<String>,
    requested_entities: OnceCell<Vec<String>>,
    bbox: OnceCell<Geometry>,
}

impl OgcRequest {
    pub fn from_http(request: &Request<Bytes>) -> OwsResult<Self> {
        let Query(raw): Query<HashMap<String, String>> = Query::try_from_uri(request.uri())
            .map_err(|e| OwsError::InvalidParameter {
                param: "query".to_string(),
                message: e.to_string(),
            })?;
        let params: HashMap<String, String> = raw
            .into_iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();

        let method = request.method().clone();
        let mut ogc = Self {
            method,
            operation: params.get("request").cloned(),
            version: params.get("version").cloned(),
            service: params.get("service").cloned(),
            params,
            body: None,
            requested_entities: OnceCell::new(),
            bbox: OnceCell::new(),
        };

        if ogc.method == Method::POST {
            let text = std::str::from_utf8(request.body())
                .map_err(|e| OwsError::InvalidXml(format!("body is not UTF-8: {}", e)))?;
            let doc = XmlDocument::parse(text).map_err(|e| OwsError::InvalidXml(e.to_string()))?;
            let root = doc
                .root_element()
                .ok_or_else(|| OwsError::InvalidXml("body has no root element".to_string()))?;

            ogc.operation = doc.local_name(root).map(str::to_string);
            if let Some(version) = doc.attribute(root, "version") {
                ogc.version = Some(version.to_string());
            }
            ogc.service = doc
                .attribute(root, "service")
                .map(str::to_string)
                .or_else(|| service_from_namespace(doc.namespace_uri(root)))
                .or(ogc.service);
            ogc.body = Some(doc);
        }

        debug!(
            method = %ogc.method,
            service = ?ogc.service,
            operation = ?ogc.operation,
            version = ?ogc.version,
            "Classified OGC request"
        );
        Ok(ogc)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Lower-cased query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    /// Parsed POST body.
    pub fn body(&self) -> Option<&XmlDocument> {
        self.body.as_ref()
    }

    // === Predicates ===

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    fn is_operation(&self, name: &str) -> bool {
        self.operation
            .as_deref()
            .is_some_and(|op| op.eq_ignore_ascii_case(name))
    }

    fn is_service(&self, name: &str) -> bool {
        self.service
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(name))
    }

    pub fn is_get_capabilities_request(&self) -> bool {
        self.is_operation("GetCapabilities")
    }

    pub fn is_get_map_request(&self) -> bool {
        self.is_operation("GetMap")
    }

    pub fn is_get_feature_info_request(&self) -> bool {
        self.is_operation("GetFeatureInfo")
    }

    pub fn is_get_feature_request(&self) -> bool {
        self.is_operation("GetFeature")
    }

    pub fn is_transaction_request(&self) -> bool {
        self.is_operation("Transaction")
    }

    pub fn is_describe_feature_type_request(&self) -> bool {
        self.is_operation("DescribeFeatureType")
    }

    pub fn is_get_record_by_id_request(&self) -> bool {
        self.is_operation("GetRecordById")
    }

    pub fn is_get_records_request(&self) -> bool {
        self.is_operation("GetRecords")
    }

    pub fn is_wms(&self) -> bool {
        self.is_service("WMS")
    }

    pub fn is_wfs(&self) -> bool {
        self.is_service("WFS")
    }

    pub fn is_csw(&self) -> bool {
        self.is_service("CSW")
    }

    // === Derived values ===

    /// Layers (WMS) or feature types (WFS) the request touches.
    pub fn requested_entities(&self) -> &[String] {
        self.requested_entities
            .get_or_init(|| self.compute_requested_entities())
    }

    fn compute_requested_entities(&self) -> Vec<String> {
        if self.is_wms() {
            return split_list(self.param("layers"));
        }
        if !self.is_wfs() {
            return Vec::new();
        }
        if self.is_post() {
            if let Some(body) = &self.body {
                if self.is_get_feature_request() {
                    return GetFeatureRequest::from_document(body.clone())
                        .map(|g| g.type_names())
                        .unwrap_or_default();
                }
                if self.is_transaction_request() {
                    return TransactionRequest::from_document(body.clone())
                        .map(|t| t.type_names())
                        .unwrap_or_default();
                }
            }
            return Vec::new();
        }
        if self.is_get_feature_request() || self.is_describe_feature_type_request() {
            return split_list(self.param("typenames").or_else(|| self.param("typename")));
        }
        Vec::new()
    }

    /// Requested extent; `POLYGON EMPTY` when absent or malformed.
    pub fn bbox(&self) -> &Geometry {
        self.bbox.get_or_init(|| self.compute_bbox())
    }

    fn compute_bbox(&self) -> Geometry {
        let Some(raw) = self.param("bbox") else {
            return Geometry::empty_polygon();
        };
        match BoundingBox::from_kvp(raw) {
            Ok((bbox, srs)) => {
                let srid = srs
                    .and_then(|s| s.srid())
                    .or_else(|| self.srs_param().and_then(|s| s.srid()));
                bbox.to_geometry(srid)
            }
            Err(e) => {
                warn!(bbox = raw, error = %e, "Ignoring malformed BBOX");
                Geometry::empty_polygon()
            }
        }
    }

    fn srs_param(&self) -> Option<SrsName> {
        ["crs", "srs", "srsname"]
            .iter()
            .find_map(|key| self.param(key))
            .and_then(|raw| SrsName::parse(raw).ok())
    }

    /// `(authority, srid)` of the requested reference system, from the BBOX
    /// CRS, the `crs` / `srs` / `srsname` parameters or, for POST bodies, the
    /// first query's `srsName`. `(None, None)` when absent or unparsable.
    pub fn srs_name(&self) -> (Option<String>, Option<u32>) {
        let from_bbox = self
            .param("bbox")
            .and_then(|raw| BoundingBox::from_kvp(raw).ok())
            .and_then(|(_, srs)| srs);
        let from_body = || {
            self.body
                .as_ref()
                .and_then(|doc| GetFeatureRequest::from_document(doc.clone()).ok())
                .and_then(|request| request.srs_name().and_then(|s| SrsName::parse(s).ok()))
        };

        match from_bbox.or_else(|| self.srs_param()).or_else(from_body) {
            Some(name) => {
                let srid = name.srid();
                (Some(name.authority), srid)
            }
            None => (None, None),
        }
    }

    // === Typed bodies ===

    pub fn get_feature_request(&self) -> OwsResult<GetFeatureRequest> {
        match &self.body {
            Some(doc) if self.is_get_feature_request() => {
                GetFeatureRequest::from_document(doc.clone())
            }
            _ => Err(OwsError::OperationNotSupported(
                "not a POST GetFeature request".to_string(),
            )),
        }
    }

    pub fn transaction_request(&self) -> OwsResult<TransactionRequest> {
        match &self.body {
            Some(doc) if self.is_transaction_request() => {
                TransactionRequest::from_document(doc.clone())
            }
            _ => Err(OwsError::OperationNotSupported(
                "not a POST Transaction request".to_string(),
            )),
        }
    }
}

fn service_from_namespace(namespace: Option<&str>) -> Option<String> {
    match namespace? {
        WFS_20 | WFS_1 => Some("WFS".to_string()),
        CSW_202 => Some("CSW".to_string()),
        _ => None,
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
