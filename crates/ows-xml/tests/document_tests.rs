//! Tests for document mutation and XPath selection together.

use ows_xml::{select, XPath, XPathItem, XmlDocument, DOCUMENT};

const WFS_NS: &[(&str, &str)] = &[
    ("wfs", "http://www.opengis.net/wfs/2.0"),
    ("fes", "http://www.opengis.net/fes/2.0"),
];

const GET_FEATURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:GetFeature xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:fes="http://www.opengis.net/fes/2.0" service="WFS" version="2.0.0">
  <wfs:Query typeNames="ns:parcels">
    <fes:Filter><fes:PropertyIsEqualTo><fes:ValueReference>id</fes:ValueReference><fes:Literal>7</fes:Literal></fes:PropertyIsEqualTo></fes:Filter>
    <fes:SortBy/>
  </wfs:Query>
</wfs:GetFeature>"#;

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_select_query_type_names() {
    let doc = XmlDocument::parse(GET_FEATURE).unwrap();
    let result = select(&doc, DOCUMENT, "/wfs:GetFeature/wfs:Query/@typeNames", WFS_NS).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].string_value(&doc), "ns:parcels");
}

#[test]
fn test_compiled_expression_is_reusable() {
    let doc = XmlDocument::parse(GET_FEATURE).unwrap();
    let xpath = XPath::compile("//fes:Literal/text()").unwrap();
    assert_eq!(xpath.expression(), "//fes:Literal/text()");
    let first = xpath.evaluate(&doc, DOCUMENT, WFS_NS).unwrap();
    let second = xpath.evaluate(&doc, DOCUMENT, WFS_NS).unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].string_value(&doc), "7");
}

#[test]
fn test_normalize_space_function() {
    let doc = XmlDocument::parse("<a>  one\n   two  </a>").unwrap();
    let result = select(&doc, DOCUMENT, "normalize-space(/a)", &[]).unwrap();
    assert_eq!(result, vec![XPathItem::Value("one two".to_string())]);
}

#[test]
fn test_unprefixed_name_does_not_match_default_namespace() {
    let doc = XmlDocument::parse(r#"<a xmlns="urn:x"><b/></a>"#).unwrap();
    assert!(select(&doc, DOCUMENT, "/a/b", &[]).unwrap().is_empty());
    let bound = select(&doc, DOCUMENT, "/x:a/x:b", &[("x", "urn:x")]).unwrap();
    assert_eq!(bound.len(), 1);
}

// ============================================================================
// Mutation
// ============================================================================

#[test]
fn test_insert_filter_before_sort_by() {
    let mut doc = XmlDocument::parse(GET_FEATURE).unwrap();
    let query = select(&doc, DOCUMENT, "//wfs:Query", WFS_NS).unwrap()[0]
        .element(&doc)
        .unwrap();
    let filter = select(&doc, query, "fes:Filter", WFS_NS).unwrap()[0]
        .element(&doc)
        .unwrap();
    let sort_by = select(&doc, query, "fes:SortBy", WFS_NS).unwrap()[0]
        .element(&doc)
        .unwrap();

    doc.detach(filter);
    doc.insert_before(sort_by, filter);

    let names: Vec<_> = doc
        .child_elements(query)
        .filter_map(|c| doc.local_name(c).map(str::to_string))
        .collect();
    assert_eq!(names, vec!["Filter", "SortBy"]);
}

#[test]
fn test_deep_copy_survives_replacement() {
    let mut doc = XmlDocument::parse(GET_FEATURE).unwrap();
    let filter = select(&doc, DOCUMENT, "//fes:Filter", WFS_NS).unwrap()[0]
        .element(&doc)
        .unwrap();
    let predicate = doc.child_elements(filter).next().unwrap();
    let copy = doc.deep_copy(predicate);

    let and = doc.create_element("fes:And");
    doc.append_child(and, copy);
    doc.replace_node(predicate, and);

    let xml = doc.to_xml().unwrap();
    assert!(xml.contains("<fes:And><fes:PropertyIsEqualTo>"));
    assert!(xml.contains("<fes:Literal>7</fes:Literal>"));
    assert!(!doc.is_attached(predicate));
}

#[test]
fn test_set_attribute_round_trip() {
    let mut doc = XmlDocument::parse(GET_FEATURE).unwrap();
    let root = doc.root_element().unwrap();
    doc.set_attribute(root, "version", "2.0.2").unwrap();
    let reparsed = XmlDocument::parse(&doc.to_xml().unwrap()).unwrap();
    let root = reparsed.root_element().unwrap();
    assert_eq!(reparsed.attribute(root, "version"), Some("2.0.2"));
}

// ============================================================================
// Deep nesting
// ============================================================================

const DEPTH: usize = 100_000;

fn nested(depth: usize) -> String {
    let mut xml = String::with_capacity(depth * 8 + 16);
    xml.push_str("<root>");
    xml.push_str(&"<n>".repeat(depth - 1));
    xml.push_str("<n/>");
    xml.push_str(&"</n>".repeat(depth - 1));
    xml.push_str("</root>");
    xml
}

#[test]
fn test_deeply_nested_document_round_trips() {
    let xml = nested(DEPTH);
    let doc = XmlDocument::parse(&xml).unwrap();
    assert_eq!(doc.to_xml().unwrap(), xml);
}

#[test]
fn test_deeply_nested_subtree_copies() {
    let mut doc = XmlDocument::parse(&nested(DEPTH)).unwrap();
    let root = doc.root_element().unwrap();
    let outer = doc.child_elements(root).next().unwrap();
    let original = doc.node_to_xml(outer).unwrap();

    let copy = doc.deep_copy(outer);
    assert!(!doc.is_attached(copy));
    assert_eq!(doc.node_to_xml(copy).unwrap(), original);
    assert_eq!(doc.descendants(copy).len(), DEPTH - 1);
}
