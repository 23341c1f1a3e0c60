//! Record to document projection.
//!
//! The projector only patches and removes. Values are written over existing
//! attributes and text; nodes for records that are missing from the document
//! are never created.

use tracing::{debug, warn};

use ows_common::{OwsError, OwsResult};
use ows_xml::{NodeId, XPath, XPathItem, XmlDocument, DOCUMENT};

use crate::mapper::Mapper;
use crate::mapping::{FieldSpec, NestedMapping, SchemaMapping};
use crate::record::{Record, Value};

pub struct Projector;

impl Projector {
    /// Copy of `destination` with the values of `record` written into it.
    ///
    /// `record` is matched against the copy through the node ids recorded by
    /// the mapper when it parsed `destination`; if those are missing the
    /// mapping's root XPath is used instead.
    pub fn update(
        destination: &XmlDocument,
        record: &Record,
        mapping: &SchemaMapping,
    ) -> OwsResult<XmlDocument> {
        let mut doc = destination.clone();

        let root = match record.node.filter(|&node| doc_has_element(&doc, node)) {
            Some(node) => node,
            None => Mapper::new(&doc, mapping.namespaces)
                .elements(DOCUMENT, mapping.root.base_xpath)
                .into_iter()
                .next()
                .ok_or_else(|| {
                    OwsError::Mapping(format!(
                        "root element '{}' not found in destination document",
                        mapping.root.base_xpath
                    ))
                })?,
        };

        patch(&mut doc, mapping, root, &mapping.root, record)?;
        Ok(doc)
    }
}

fn doc_has_element(doc: &XmlDocument, node: NodeId) -> bool {
    // Node ids index the arena; guard before touching it.
    doc.descendants(DOCUMENT).contains(&node) && doc.is_element(node)
}

fn patch(
    doc: &mut XmlDocument,
    mapping: &SchemaMapping,
    node: NodeId,
    spec: &NestedMapping,
    record: &Record,
) -> OwsResult<()> {
    for field in &spec.fields {
        match &field.spec {
            FieldSpec::XPath { xpath, .. } => {
                let Some(value) = record.get(field.name).filter(|v| !v.is_null()) else {
                    continue;
                };
                write_first(doc, mapping, node, *xpath, value)?;
            }
            FieldSpec::Computed {
                inputs,
                reverse: Some(reverse),
                ..
            } => {
                let Some(value) = record.get(field.name).filter(|v| !v.is_null()) else {
                    continue;
                };
                let strings = match reverse.reverse(value) {
                    Ok(strings) => strings,
                    Err(e) => {
                        warn!(field = field.name, error = %e, "Cannot project computed field");
                        continue;
                    }
                };
                for (&xpath, text) in inputs.iter().zip(strings) {
                    if let Some(text) = text {
                        write_first(doc, mapping, node, xpath, &Value::String(text))?;
                    }
                }
            }
            FieldSpec::Computed { reverse: None, .. } => {}
            FieldSpec::Nested(nested) => {
                let Some(children) = record.children.get(field.name) else {
                    continue;
                };
                patch_children(doc, mapping, node, nested, children)?;
            }
        }
    }
    Ok(())
}

fn patch_children(
    doc: &mut XmlDocument,
    mapping: &SchemaMapping,
    node: NodeId,
    spec: &NestedMapping,
    records: &[Record],
) -> OwsResult<()> {
    let mut nodes = Mapper::new(doc, mapping.namespaces).elements(node, spec.base_xpath);
    if !spec.many {
        nodes.truncate(1);
    }

    // Resolve all pairs before mutating so removals cannot shift matches.
    let pairs: Vec<(NodeId, &Record)> = if spec.key_fields.is_empty() {
        nodes.into_iter().zip(records.iter()).collect()
    } else {
        let mapper = Mapper::new(doc, mapping.namespaces);
        nodes
            .into_iter()
            .filter_map(|child| {
                let key = node_key(&mapper, child, spec)?;
                records
                    .iter()
                    .find(|record| record_key(record, spec).as_ref() == Some(&key))
                    .map(|record| (child, record))
            })
            .collect()
    };

    for (child, record) in pairs {
        if !doc.is_attached(child) {
            continue;
        }
        if record.is_active() {
            patch(doc, mapping, child, spec, record)?;
        } else {
            debug!(model = spec.model, "Removing inactive element");
            doc.detach(child);
        }
    }
    Ok(())
}

fn node_key(mapper: &Mapper<'_>, node: NodeId, spec: &NestedMapping) -> Option<Vec<String>> {
    spec.key_fields
        .iter()
        .map(|name| match spec.field(name).map(|f| &f.spec) {
            Some(FieldSpec::XPath { xpath, .. }) => mapper.leaf(node, *xpath, name),
            _ => None,
        })
        .collect()
}

fn record_key(record: &Record, spec: &NestedMapping) -> Option<Vec<String>> {
    spec.key_fields
        .iter()
        .map(|name| {
            record
                .get(name)
                .filter(|v| !v.is_null())
                .map(|v| v.to_string())
        })
        .collect()
}

/// Overwrite the first node `xpath` selects with `value`.
fn write_first(
    doc: &mut XmlDocument,
    mapping: &SchemaMapping,
    node: NodeId,
    xpath: &'static str,
    value: &Value,
) -> OwsResult<()> {
    let selected = XPath::cached(xpath).and_then(|c| c.evaluate(doc, node, mapping.namespaces));
    let target = match selected {
        Ok(items) => items.into_iter().next(),
        Err(e) => {
            warn!(xpath = xpath, error = %e, "XPath evaluation failed");
            None
        }
    };
    let Some(target) = target else {
        return Ok(());
    };

    match target {
        XPathItem::Attribute { element, index } => {
            let existing = doc
                .attributes(element)
                .get(index)
                .map(|a| a.value.clone())
                .unwrap_or_default();
            doc.set_attribute_at(element, index, &format_value(value, &existing))
                .map_err(|e| OwsError::InternalError(e.to_string()))?;
        }
        XPathItem::Node(target) => {
            if doc.is_element(target) && doc.child_elements(target).next().is_some() {
                warn!(xpath = xpath, "Refusing to overwrite element with child elements");
                return Ok(());
            }
            let existing = doc.text_content(target);
            doc.set_text(target, &format_value(value, &existing));
        }
        XPathItem::Value(_) => {
            // Function results such as local-name() are read-only.
        }
    }
    Ok(())
}

/// Booleans keep the notation already present in the document.
fn format_value(value: &Value, existing: &str) -> String {
    match value {
        Value::Boolean(b) if matches!(existing.trim(), "0" | "1") => {
            if *b { "1" } else { "0" }.to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value_keeps_boolean_notation() {
        assert_eq!(format_value(&Value::Boolean(true), "0"), "1");
        assert_eq!(format_value(&Value::Boolean(false), "true"), "false");
        assert_eq!(format_value(&Value::Integer(5), "3"), "5");
    }
}
