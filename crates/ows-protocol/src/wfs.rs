//! Typed WFS POST documents.

use tracing::info;

use ows_common::{Geometry, OwsError, OwsResult};
use ows_xml::{NodeId, XmlDocument};

use crate::injector::secure_spatial;

fn parse_root(xml: &str, expected: &str) -> OwsResult<(XmlDocument, NodeId)> {
    let doc = XmlDocument::parse(xml).map_err(|e| OwsError::InvalidXml(e.to_string()))?;
    let root = doc
        .root_element()
        .ok_or_else(|| OwsError::InvalidXml("document has no root element".to_string()))?;
    check_root(&doc, root, expected)?;
    Ok((doc, root))
}

fn check_root(doc: &XmlDocument, root: NodeId, expected: &str) -> OwsResult<()> {
    match doc.local_name(root) {
        Some(local) if local == expected => Ok(()),
        other => Err(OwsError::OperationNotSupported(format!(
            "expected {}, found {}",
            expected,
            other.unwrap_or("no element")
        ))),
    }
}

/// Type names of an element: `typeNames` (2.0) or `typeName` (1.x),
/// whitespace separated.
fn type_names_of(doc: &XmlDocument, node: NodeId) -> Vec<String> {
    doc.attribute_local(node, "typeNames")
        .or_else(|| doc.attribute_local(node, "typeName"))
        .map(|names| names.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn serialize(doc: &XmlDocument) -> OwsResult<String> {
    doc.to_xml().map_err(|e| OwsError::InvalidXml(e.to_string()))
}

/// A `wfs:GetFeature` request body.
#[derive(Debug, Clone)]
pub struct GetFeatureRequest {
    doc: XmlDocument,
    root: NodeId,
}

impl GetFeatureRequest {
    pub fn parse(xml: &str) -> OwsResult<Self> {
        let (doc, root) = parse_root(xml, "GetFeature")?;
        Ok(Self { doc, root })
    }

    pub fn from_document(doc: XmlDocument) -> OwsResult<Self> {
        let root = doc
            .root_element()
            .ok_or_else(|| OwsError::InvalidXml("document has no root element".to_string()))?;
        check_root(&doc, root, "GetFeature")?;
        Ok(Self { doc, root })
    }

    pub fn version(&self) -> Option<&str> {
        self.doc.attribute(self.root, "version")
    }

    /// `Query` elements in document order.
    pub fn queries(&self) -> Vec<NodeId> {
        self.doc
            .child_elements(self.root)
            .filter(|&c| self.doc.local_name(c) == Some("Query"))
            .collect()
    }

    /// Type names of all queries.
    pub fn type_names(&self) -> Vec<String> {
        self.queries()
            .into_iter()
            .flat_map(|q| type_names_of(&self.doc, q))
            .collect()
    }

    /// `srsName` of the first query that names one.
    pub fn srs_name(&self) -> Option<&str> {
        self.queries()
            .into_iter()
            .find_map(|q| self.doc.attribute_local(q, "srsName"))
    }

    /// Restrict every query to `area`. Returns the number of queries changed.
    pub fn secure_spatial(&mut self, value_reference: &str, area: &Geometry) -> OwsResult<usize> {
        let queries = self.queries();
        for &query in &queries {
            secure_spatial(&mut self.doc, query, value_reference, area)?;
        }
        info!(queries = queries.len(), "Secured GetFeature request");
        Ok(queries.len())
    }

    pub fn document(&self) -> &XmlDocument {
        &self.doc
    }

    pub fn to_xml(&self) -> OwsResult<String> {
        serialize(&self.doc)
    }
}

/// Kind of a transaction action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionAction {
    Insert,
    Update,
    Replace,
    Delete,
    Native,
}

impl TransactionAction {
    fn from_local_name(local: &str) -> Option<Self> {
        match local {
            "Insert" => Some(TransactionAction::Insert),
            "Update" => Some(TransactionAction::Update),
            "Replace" => Some(TransactionAction::Replace),
            "Delete" => Some(TransactionAction::Delete),
            "Native" => Some(TransactionAction::Native),
            _ => None,
        }
    }

    /// Actions selecting existing features through a filter.
    pub fn is_filtered(self) -> bool {
        matches!(
            self,
            TransactionAction::Update | TransactionAction::Replace | TransactionAction::Delete
        )
    }
}

/// One action of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOperation {
    pub action: TransactionAction,
    pub node: NodeId,
    pub type_names: Vec<String>,
}

/// A `wfs:Transaction` request body.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    doc: XmlDocument,
    root: NodeId,
}

impl TransactionRequest {
    pub fn parse(xml: &str) -> OwsResult<Self> {
        let (doc, root) = parse_root(xml, "Transaction")?;
        Ok(Self { doc, root })
    }

    pub fn from_document(doc: XmlDocument) -> OwsResult<Self> {
        let root = doc
            .root_element()
            .ok_or_else(|| OwsError::InvalidXml("document has no root element".to_string()))?;
        check_root(&doc, root, "Transaction")?;
        Ok(Self { doc, root })
    }

    pub fn version(&self) -> Option<&str> {
        self.doc.attribute(self.root, "version")
    }

    pub fn operations(&self) -> Vec<TransactionOperation> {
        self.doc
            .child_elements(self.root)
            .filter_map(|node| {
                let action = TransactionAction::from_local_name(self.doc.local_name(node)?)?;
                let type_names = match action {
                    // Inserted features name their type by element.
                    TransactionAction::Insert => self
                        .doc
                        .child_elements(node)
                        .filter_map(|f| self.doc.name(f).map(str::to_string))
                        .collect(),
                    _ => type_names_of(&self.doc, node),
                };
                Some(TransactionOperation {
                    action,
                    node,
                    type_names,
                })
            })
            .collect()
    }

    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.operations().into_iter().flat_map(|op| op.type_names) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Restrict every update, replace and delete to `area`. Inserts carry no
    /// filter and are left alone. Returns the number of actions changed.
    pub fn secure_spatial(&mut self, value_reference: &str, area: &Geometry) -> OwsResult<usize> {
        let targets: Vec<NodeId> = self
            .operations()
            .into_iter()
            .filter(|op| op.action.is_filtered())
            .map(|op| op.node)
            .collect();
        for &target in &targets {
            secure_spatial(&mut self.doc, target, value_reference, area)?;
        }
        info!(actions = targets.len(), "Secured Transaction request");
        Ok(targets.len())
    }

    pub fn document(&self) -> &XmlDocument {
        &self.doc
    }

    pub fn to_xml(&self) -> OwsResult<String> {
        serialize(&self.doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_root_is_rejected() {
        let err = GetFeatureRequest::parse(
            r#"<wfs:Transaction xmlns:wfs="http://www.opengis.net/wfs/2.0"/>"#,
        )
        .unwrap_err();
        assert!(matches!(err, OwsError::OperationNotSupported(_)));
        assert!(matches!(
            TransactionRequest::parse("<not xml"),
            Err(OwsError::InvalidXml(_))
        ));
    }

    #[test]
    fn test_type_names_both_spellings() {
        let request = GetFeatureRequest::parse(
            r#"<GetFeature><Query typeNames="a:x  a:y"/><Query typeName="b:z"/></GetFeature>"#,
        )
        .unwrap();
        assert_eq!(request.type_names(), vec!["a:x", "a:y", "b:z"]);
    }

    #[test]
    fn test_transaction_operations() {
        let request = TransactionRequest::parse(
            r#"<Transaction><Insert><p:road xmlns:p="urn:p"/></Insert><Update typeName="p:road"/><Delete typeName="p:river"/></Transaction>"#,
        )
        .unwrap();
        let actions: Vec<_> = request.operations().iter().map(|op| op.action).collect();
        assert_eq!(
            actions,
            vec![
                TransactionAction::Insert,
                TransactionAction::Update,
                TransactionAction::Delete
            ]
        );
        assert_eq!(request.type_names(), vec!["p:road", "p:river"]);
    }
}
