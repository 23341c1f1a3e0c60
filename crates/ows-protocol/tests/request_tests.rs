//! Tests for OGC request classification.

use axum::http::{Method, Request};
use bytes::Bytes;

use ows_common::OwsError;
use ows_protocol::{OgcRequest, OwsException};
use test_utils::requests;

fn get(uri: &str) -> OgcRequest {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Bytes::new())
        .unwrap();
    OgcRequest::from_http(&request).unwrap()
}

fn post(uri: &str, body: &str) -> Result<OgcRequest, OwsError> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Bytes::from(body.to_string()))
        .unwrap();
    OgcRequest::from_http(&request)
}

// ============================================================================
// GET
// ============================================================================

#[test]
fn test_wms_get_map() {
    let request = get("/ows/1?SERVICE=WMS&VERSION=1.3.0&REQUEST=GetMap&LAYERS=roads,rivers&CRS=EPSG:4326&BBOX=47,5,55,15");

    assert!(request.is_get());
    assert!(!request.is_post());
    assert!(request.is_wms());
    assert!(!request.is_wfs());
    assert!(request.is_get_map_request());
    assert!(!request.is_get_feature_info_request());
    assert_eq!(request.requested_entities(), ["roads".to_string(), "rivers".to_string()]);

    let bbox = request.bbox();
    assert!(!bbox.is_empty());
    assert_eq!(bbox.srid, Some(4326));
    assert_eq!(request.srs_name(), (Some("EPSG".to_string()), Some(4326)));
}

#[test]
fn test_get_without_bbox_is_empty_polygon() {
    let request = get("/ows/1?service=WMS&request=GetMap&layers=roads");
    assert!(request.bbox().is_empty());
    assert_eq!(request.srs_name(), (None, None));
}

#[test]
fn test_malformed_bbox_is_empty_polygon() {
    for bbox in ["1,2,3", "a,b,c,d", "10,10,5,5"] {
        let request = get(&format!("/ows?service=WFS&request=GetFeature&bbox={}", bbox));
        assert!(request.bbox().is_empty(), "bbox {} should fall back", bbox);
    }
}

#[test]
fn test_bbox_crs_from_fifth_element() {
    let request = get("/ows?service=WFS&request=GetFeature&typeNames=a&bbox=6,50,7,51,urn:ogc:def:crs:EPSG::25832");
    assert_eq!(request.bbox().srid, Some(25832));
    assert_eq!(request.srs_name(), (Some("EPSG".to_string()), Some(25832)));
}

#[test]
fn test_unparsable_srs_name() {
    let request = get("/ows?service=WMS&request=GetMap&crs=nonsense");
    assert_eq!(request.srs_name(), (None, None));
}

#[test]
fn test_wfs_get_feature_type_names() {
    let request = get("/ows?service=WFS&version=2.0.0&request=GetFeature&TYPENAMES=a:x,a:y");
    assert!(request.is_wfs());
    assert!(request.is_get_feature_request());
    assert_eq!(request.requested_entities(), ["a:x".to_string(), "a:y".to_string()]);

    // WFS 1.x spelling.
    let request = get("/ows?service=WFS&version=1.1.0&request=GetFeature&typeName=b:z");
    assert_eq!(request.requested_entities(), ["b:z".to_string()]);
}

#[test]
fn test_csw_predicates() {
    let request = get("/csw?service=CSW&request=GetRecordById&id=42");
    assert!(request.is_csw());
    assert!(request.is_get_record_by_id_request());
    assert!(!request.is_get_records_request());
    assert!(request.requested_entities().is_empty());
}

#[test]
fn test_get_capabilities() {
    let request = get("/ows?SERVICE=WFS&REQUEST=GetCapabilities");
    assert!(request.is_get_capabilities_request());
    assert!(request.get_feature_request().is_err());
}

// ============================================================================
// POST
// ============================================================================

#[test]
fn test_post_get_feature_is_classified() {
    let request = post(
        "/ows",
        r#"<wfs:GetFeature xmlns:wfs="http://www.opengis.net/wfs/2.0"><wfs:Query typeNames="ms:Countries"/></wfs:GetFeature>"#,
    )
    .unwrap();

    assert!(request.is_post());
    assert!(request.is_wfs());
    assert!(request.is_get_feature_request());
    assert_eq!(request.requested_entities(), ["ms:Countries".to_string()]);
}

#[test]
fn test_post_fixture_attributes() {
    let request = post("/ows", requests::GET_FEATURE_SIMPLE_FILTER).unwrap();
    assert_eq!(request.version(), Some("2.0.0"));
    assert_eq!(
        request.requested_entities(),
        ["cadastre:parcel".to_string(), "cadastre:building".to_string()]
    );

    let typed = request.get_feature_request().unwrap();
    assert_eq!(typed.queries().len(), 2);
}

#[test]
fn test_post_transaction() {
    let request = post("/ows", requests::TRANSACTION).unwrap();
    assert!(request.is_transaction_request());
    assert_eq!(
        request.requested_entities(),
        ["cadastre:parcel".to_string(), "cadastre:building".to_string()]
    );
    assert_eq!(request.transaction_request().unwrap().operations().len(), 3);
}

#[test]
fn test_post_malformed_body() {
    assert!(matches!(
        post("/ows", "<wfs:GetFeature"),
        Err(OwsError::InvalidXml(_))
    ));
    assert!(matches!(post("/ows", ""), Err(OwsError::InvalidXml(_))));
}

// ============================================================================
// Exceptions
// ============================================================================

#[test]
fn test_operation_not_supported_locator() {
    let request = get("/ows?service=WMS&request=GetLegendGraphic");
    let exception = OwsException::operation_not_supported(&request);
    assert_eq!(exception.code, "OperationNotSupported");
    assert_eq!(exception.locator.as_deref(), Some("GetLegendGraphic"));
    assert!(exception.to_xml().contains(r#"locator="GetLegendGraphic""#));
}
