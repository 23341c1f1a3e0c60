//! Document to record mapping.

use tracing::{debug, warn};

use ows_common::{OwsError, OwsResult};
use ows_xml::{Namespaces, NodeId, XPath, XPathItem, XmlDocument, DOCUMENT};

use crate::mapping::{FieldSpec, LeafKind, NestedMapping, SchemaMapping};
use crate::models::model_schema;
use crate::parsers::parse_boolean;
use crate::record::{ParentLink, Record, Value};

/// Applies a [`SchemaMapping`] to a parsed document.
///
/// Field-level problems never abort the document: an unresolvable XPath or an
/// unconvertible literal leaves the field out, a failing computed parser sets
/// it to [`Value::Null`]. Both are logged.
pub struct Mapper<'a> {
    doc: &'a XmlDocument,
    namespaces: Namespaces<'a>,
}

impl<'a> Mapper<'a> {
    pub fn new(doc: &'a XmlDocument, namespaces: Namespaces<'a>) -> Self {
        Self { doc, namespaces }
    }

    /// Map the whole document into its root record.
    pub fn parse(doc: &'a XmlDocument, mapping: &'a SchemaMapping) -> OwsResult<Record> {
        let mapper = Self::new(doc, mapping.namespaces);
        mapper
            .parse_many(DOCUMENT, &mapping.root, None)
            .into_iter()
            .next()
            .ok_or_else(|| {
                OwsError::Mapping(format!(
                    "{} {} root element '{}' not found",
                    mapping.service_type,
                    mapping.versions.join("/"),
                    mapping.root.base_xpath
                ))
            })
    }

    /// Map every node `spec.base_xpath` selects from `context` (only the
    /// first one unless `spec.many`).
    pub fn parse_many(
        &self,
        context: NodeId,
        spec: &NestedMapping,
        parent_model: Option<&str>,
    ) -> Vec<Record> {
        let mut nodes = self.elements(context, spec.base_xpath);
        if !spec.many {
            nodes.truncate(1);
        }
        nodes
            .into_iter()
            .map(|node| self.parse_one(node, spec, parent_model))
            .collect()
    }

    fn parse_one(&self, node: NodeId, spec: &NestedMapping, parent_model: Option<&str>) -> Record {
        let mut record = Record::new(spec.model);
        record.node = Some(node);
        record.parent = parent_model.and_then(|parent| {
            model_schema(spec.model)
                .and_then(|schema| schema.foreign_key_to(parent))
                .map(|field| ParentLink {
                    field: field.to_string(),
                    model: parent.to_string(),
                })
        });

        for field in &spec.fields {
            match &field.spec {
                FieldSpec::XPath { xpath, kind } => {
                    let Some(raw) = self.leaf(node, *xpath, field.name) else {
                        continue;
                    };
                    match convert(&raw, *kind) {
                        Some(value) => {
                            record.fields.insert(field.name.to_string(), value);
                        }
                        None => warn!(
                            model = spec.model,
                            field = field.name,
                            value = %raw,
                            kind = ?kind,
                            "Dropping unconvertible field value"
                        ),
                    }
                }
                FieldSpec::Computed { inputs, parser, .. } => {
                    let args: Vec<Option<String>> = inputs
                        .iter()
                        .map(|&xpath| self.leaf(node, xpath, field.name))
                        .collect();
                    let value = parser.parse(&args).unwrap_or_else(|e| {
                        warn!(
                            model = spec.model,
                            field = field.name,
                            parser = ?parser,
                            error = %e,
                            "Computed field parser failed"
                        );
                        Value::Null
                    });
                    record.fields.insert(field.name.to_string(), value);
                }
                FieldSpec::Nested(nested) => {
                    let children = self.parse_many(node, nested, Some(spec.model));
                    debug!(
                        model = spec.model,
                        field = field.name,
                        count = children.len(),
                        "Mapped nested records"
                    );
                    record.children.insert(field.name.to_string(), children);
                }
            }
        }

        record
    }

    /// Trimmed string value of the first result, `None` when nothing matches
    /// or the expression fails.
    pub fn leaf(&self, context: NodeId, xpath: &'static str, field: &str) -> Option<String> {
        match self.evaluate(context, xpath) {
            Ok(items) => items
                .first()
                .map(|item| item.string_value(self.doc).trim().to_string()),
            Err(e) => {
                warn!(field = field, xpath = xpath, error = %e, "XPath evaluation failed");
                None
            }
        }
    }

    /// Element nodes selected by `xpath`.
    pub fn elements(&self, context: NodeId, xpath: &'static str) -> Vec<NodeId> {
        match self.evaluate(context, xpath) {
            Ok(items) => items
                .iter()
                .filter_map(|item| item.element(self.doc))
                .collect(),
            Err(e) => {
                warn!(xpath = xpath, error = %e, "XPath evaluation failed");
                Vec::new()
            }
        }
    }

    fn evaluate(&self, context: NodeId, xpath: &'static str) -> OwsResult<Vec<XPathItem>> {
        XPath::cached(xpath)
            .and_then(|compiled| compiled.evaluate(self.doc, context, self.namespaces))
            .map_err(|e| OwsError::XPath(e.to_string()))
    }
}

fn convert(raw: &str, kind: LeafKind) -> Option<Value> {
    match kind {
        LeafKind::String => Some(Value::String(raw.to_string())),
        LeafKind::Integer => raw.parse().ok().map(Value::Integer),
        LeafKind::Float => raw.parse().ok().map(Value::Float),
        LeafKind::Boolean => parse_boolean(raw).ok().map(Value::Boolean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{boolean, computed, integer, many, text, ServiceType};
    use crate::parsers::ParserKind;

    fn mapping() -> SchemaMapping {
        SchemaMapping {
            service_type: ServiceType::Wms,
            versions: &["test"],
            namespaces: &[],
            root: NestedMapping {
                model: "Service",
                base_xpath: "/Root",
                many: false,
                key_fields: &[],
                fields: vec![
                    text("title", "Title/text()"),
                    integer("max_width", "MaxWidth/text()"),
                    boolean("queryable", "@queryable"),
                    computed("flag", &["Flag/text()"], ParserKind::BooleanFromString, None),
                    many(
                        "layers",
                        "Layer",
                        "Layer",
                        &["identifier"],
                        vec![text("identifier", "Name/text()")],
                    ),
                ],
            },
        }
    }

    #[test]
    fn test_missing_leaves_are_omitted() {
        let doc = XmlDocument::parse("<Root><Title> Roads </Title></Root>").unwrap();
        let record = Mapper::parse(&doc, &mapping()).unwrap();

        assert_eq!(record.get_str("title"), Some("Roads"));
        assert!(!record.fields.contains_key("max_width"));
        assert!(!record.fields.contains_key("queryable"));
        // Computed fields with no input resolve to an explicit null.
        assert_eq!(record.get("flag"), Some(&Value::Null));
    }

    #[test]
    fn test_unconvertible_literal_is_omitted() {
        let doc = XmlDocument::parse(r#"<Root queryable="perhaps"><MaxWidth>wide</MaxWidth></Root>"#)
            .unwrap();
        let record = Mapper::parse(&doc, &mapping()).unwrap();
        assert!(!record.fields.contains_key("max_width"));
        assert!(!record.fields.contains_key("queryable"));
    }

    #[test]
    fn test_parser_error_sets_null() {
        let doc = XmlDocument::parse("<Root><Flag>sometimes</Flag></Root>").unwrap();
        let record = Mapper::parse(&doc, &mapping()).unwrap();
        assert_eq!(record.get("flag"), Some(&Value::Null));
    }

    #[test]
    fn test_nested_records_link_to_parent() {
        let doc = XmlDocument::parse(
            "<Root><Layer><Name>a</Name></Layer><Layer><Name>b</Name></Layer></Root>",
        )
        .unwrap();
        let record = Mapper::parse(&doc, &mapping()).unwrap();

        let layers = record.children("layers");
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].get_str("identifier"), Some("b"));
        assert_eq!(
            layers[0].parent,
            Some(ParentLink {
                field: "service".to_string(),
                model: "Service".to_string()
            })
        );
        assert!(layers[0].node.is_some());
    }

    #[test]
    fn test_missing_root_is_error() {
        let doc = XmlDocument::parse("<Other/>").unwrap();
        assert!(matches!(Mapper::parse(&doc, &mapping()), Err(OwsError::Mapping(_))));
    }
}
