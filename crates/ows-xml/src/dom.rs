//! Arena-backed XML DOM.
//!
//! Nodes live in a flat vector and are addressed by [`NodeId`]. Node 0 is the
//! document node. Detached nodes (created but not yet attached, or removed)
//! stay in the arena until the document is dropped.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{XmlError, XmlResult};

/// Index of a node inside its owning [`XmlDocument`].
pub type NodeId = usize;

/// The document node of every [`XmlDocument`].
pub const DOCUMENT: NodeId = 0;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Attribute as written in the source, qualified name included.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Pending work of the serializer.
enum WriteStep {
    Open(NodeId),
    Close(NodeId),
}

#[derive(Debug, Clone)]
struct Declaration {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

/// Mutable XML document.
///
/// Element and attribute names keep the prefixes they were written with, so a
/// subtree serializes back exactly as it was read. Namespace URIs are resolved
/// on demand from the `xmlns` declarations in scope.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
    declaration: Option<Declaration>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// Empty document holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            declaration: None,
        }
    }

    /// Parse a complete document.
    pub fn parse(xml: &str) -> XmlResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut doc = Self::new();
        let mut stack: Vec<NodeId> = vec![DOCUMENT];

        loop {
            let parent = *stack.last().unwrap_or(&DOCUMENT);
            match reader.read_event()? {
                Event::Decl(decl) => {
                    doc.declaration = Some(Declaration::from_event(&decl)?);
                }
                Event::Start(start) => {
                    let id = doc.push(parent, element_kind(&start)?);
                    stack.push(id);
                }
                Event::Empty(start) => {
                    doc.push(parent, element_kind(&start)?);
                }
                Event::End(end) => {
                    if stack.len() <= 1 {
                        let name = String::from_utf8(end.name().as_ref().to_vec())?;
                        return Err(XmlError::Unbalanced(name));
                    }
                    stack.pop();
                }
                Event::Text(text) => {
                    // Whitespace between prolog and root is not kept.
                    if parent != DOCUMENT {
                        let content = text.unescape()?.into_owned();
                        doc.push(parent, NodeKind::Text(content));
                    }
                }
                Event::CData(data) => {
                    let content = String::from_utf8(data.into_inner().into_owned())?;
                    doc.push(parent, NodeKind::CData(content));
                }
                Event::Comment(comment) => {
                    let content = String::from_utf8(comment.into_inner().into_owned())?;
                    doc.push(parent, NodeKind::Comment(content));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() != 1 {
            let open = stack
                .last()
                .and_then(|&id| doc.name(id))
                .unwrap_or_default()
                .to_string();
            return Err(XmlError::Unbalanced(open));
        }
        if doc.root_element().is_none() {
            return Err(XmlError::NoRootElement);
        }
        Ok(doc)
    }

    /// Serialize the whole document.
    pub fn to_xml(&self) -> XmlResult<String> {
        let mut writer = Writer::new(Vec::new());
        if let Some(decl) = &self.declaration {
            writer.write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )))?;
        }
        for &child in &self.nodes[DOCUMENT].children {
            self.write_node(&mut writer, child)?;
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }

    /// Serialize a single node and its subtree.
    pub fn node_to_xml(&self, node: NodeId) -> XmlResult<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_node(&mut writer, node)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }

    /// Writes iteratively; nesting depth is bounded only by memory.
    fn write_node(&self, writer: &mut Writer<Vec<u8>>, node: NodeId) -> XmlResult<()> {
        let mut pending = vec![WriteStep::Open(node)];
        while let Some(step) = pending.pop() {
            let id = match step {
                WriteStep::Open(id) => id,
                WriteStep::Close(id) => {
                    if let NodeKind::Element { name, .. } = &self.nodes[id].kind {
                        writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
                    }
                    continue;
                }
            };
            let children = &self.nodes[id].children;
            match &self.nodes[id].kind {
                NodeKind::Document => {
                    pending.extend(children.iter().rev().map(|&c| WriteStep::Open(c)));
                }
                NodeKind::Element { name, attributes } => {
                    let mut start = BytesStart::new(name.as_str());
                    for attribute in attributes {
                        start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
                    }
                    if children.is_empty() {
                        writer.write_event(Event::Empty(start))?;
                    } else {
                        writer.write_event(Event::Start(start))?;
                        pending.push(WriteStep::Close(id));
                        pending.extend(children.iter().rev().map(|&c| WriteStep::Open(c)));
                    }
                }
                NodeKind::Text(text) => {
                    writer.write_event(Event::Text(BytesText::new(text)))?;
                }
                NodeKind::CData(text) => {
                    writer.write_event(Event::CData(BytesCData::new(text.as_str())))?;
                }
                NodeKind::Comment(text) => {
                    writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
                }
            }
        }
        Ok(())
    }

    // === Construction ===

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn push_detached(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element with the given qualified name.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push_detached(NodeKind::Element {
            name: name.to_string(),
            attributes: Vec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_detached(NodeKind::Text(text.to_string()))
    }

    /// Create a detached element holding a single text child.
    pub fn create_text_element(&mut self, name: &str, text: &str) -> NodeId {
        let element = self.create_element(name);
        let text = self.create_text(text);
        self.append_child(element, text);
        element
    }

    /// Append `child` as last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Insert `child` directly before `reference` among its siblings.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) {
        let Some(parent) = self.nodes[reference].parent else {
            return;
        };
        self.detach(child);
        let index = self.index_in_parent(reference).unwrap_or(0);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.insert(index, child);
    }

    /// Put `replacement` where `old` is and detach `old`.
    pub fn replace_node(&mut self, old: NodeId, replacement: NodeId) {
        let Some(parent) = self.nodes[old].parent else {
            return;
        };
        self.detach(replacement);
        if let Some(index) = self.index_in_parent(old) {
            self.nodes[parent].children[index] = replacement;
            self.nodes[replacement].parent = Some(parent);
            self.nodes[old].parent = None;
        }
    }

    /// Remove a node (with its subtree) from its parent.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&c| c != node);
        }
    }

    /// Structural copy of a subtree, returned detached.
    pub fn deep_copy(&mut self, node: NodeId) -> NodeId {
        let root = self.push_detached(self.nodes[node].kind.clone());
        let mut pending = vec![(node, root)];
        while let Some((source, copy)) = pending.pop() {
            let children = self.nodes[source].children.clone();
            for child in children {
                let child_copy = self.push_detached(self.nodes[child].kind.clone());
                self.nodes[child_copy].parent = Some(copy);
                self.nodes[copy].children.push(child_copy);
                pending.push((child, child_copy));
            }
        }
        root
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.nodes[node].parent?;
        self.nodes[parent].children.iter().position(|&c| c == node)
    }

    // === Navigation ===

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node].kind
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    pub fn child_elements(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node]
            .children
            .iter()
            .copied()
            .filter(move |&c| self.is_element(c))
    }

    /// All descendants in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.nodes[current].children.iter().rev().copied());
        }
        result
    }

    pub fn root_element(&self) -> Option<NodeId> {
        self.child_elements(DOCUMENT).next()
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.nodes[node].kind, NodeKind::Element { .. })
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == DOCUMENT {
                return true;
            }
            match self.nodes[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Qualified element name as written.
    pub fn name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node].kind {
            NodeKind::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn local_name(&self, node: NodeId) -> Option<&str> {
        self.name(node).map(|name| split_qname(name).1)
    }

    pub fn prefix(&self, node: NodeId) -> Option<&str> {
        self.name(node).and_then(|name| split_qname(name).0)
    }

    /// Namespace URI of an element, resolved from the declarations in scope.
    pub fn namespace_uri(&self, node: NodeId) -> Option<&str> {
        let name = self.name(node)?;
        self.lookup_namespace(node, split_qname(name).0)
    }

    /// True if `node` is an element with the given namespace and local name.
    pub fn matches(&self, node: NodeId, namespace: Option<&str>, local: &str) -> bool {
        self.local_name(node) == Some(local) && self.namespace_uri(node) == namespace
    }

    pub fn find_child(&self, node: NodeId, namespace: Option<&str>, local: &str) -> Option<NodeId> {
        self.child_elements(node)
            .find(|&c| self.matches(c, namespace, local))
    }

    /// Resolve a prefix (`None` for the default namespace) to its URI.
    pub fn lookup_namespace(&self, node: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        let wanted = match prefix {
            Some(p) => format!("xmlns:{}", p),
            None => "xmlns".to_string(),
        };
        let mut current = Some(node);
        while let Some(id) = current {
            if let NodeKind::Element { attributes, .. } = &self.nodes[id].kind {
                if let Some(attr) = attributes.iter().find(|a| a.name == wanted) {
                    return if attr.value.is_empty() {
                        None
                    } else {
                        Some(attr.value.as_str())
                    };
                }
            }
            current = self.nodes[id].parent;
        }
        None
    }

    /// Find a prefix bound to `uri` at `node`. The empty string stands for
    /// the default namespace.
    pub fn lookup_prefix(&self, node: NodeId, uri: &str) -> Option<String> {
        let mut current = Some(node);
        while let Some(id) = current {
            if let NodeKind::Element { attributes, .. } = &self.nodes[id].kind {
                for attr in attributes.iter().filter(|a| a.value == uri) {
                    let prefix = if attr.name == "xmlns" {
                        ""
                    } else if let Some(p) = attr.name.strip_prefix("xmlns:") {
                        p
                    } else {
                        continue;
                    };
                    let lookup = if prefix.is_empty() { None } else { Some(prefix) };
                    // Skip bindings shadowed further down.
                    if self.lookup_namespace(node, lookup) == Some(uri) {
                        return Some(prefix.to_string());
                    }
                }
            }
            current = self.nodes[id].parent;
        }
        None
    }

    // === Attributes ===

    pub fn attributes(&self, node: NodeId) -> &[Attribute] {
        match &self.nodes[node].kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Attribute value by qualified name as written.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attributes(node)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Attribute value by local name, ignoring any prefix.
    pub fn attribute_local(&self, node: NodeId, local: &str) -> Option<&str> {
        self.attributes(node)
            .iter()
            .filter(|a| !is_namespace_declaration(&a.name))
            .find(|a| split_qname(&a.name).1 == local)
            .map(|a| a.value.as_str())
    }

    /// Index of the attribute with the given namespace and local name.
    /// Unprefixed attributes have no namespace.
    pub fn attribute_index(&self, node: NodeId, namespace: Option<&str>, local: &str) -> Option<usize> {
        self.attributes(node).iter().position(|a| {
            if is_namespace_declaration(&a.name) {
                return false;
            }
            let (prefix, name) = split_qname(&a.name);
            if name != local {
                return false;
            }
            match prefix {
                None => namespace.is_none(),
                Some(p) => self.lookup_namespace(node, Some(p)) == namespace,
            }
        })
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> XmlResult<()> {
        match &mut self.nodes[node].kind {
            NodeKind::Element { attributes, .. } => {
                match attributes.iter_mut().find(|a| a.name == name) {
                    Some(attr) => attr.value = value.to_string(),
                    None => attributes.push(Attribute {
                        name: name.to_string(),
                        value: value.to_string(),
                    }),
                }
                Ok(())
            }
            _ => Err(XmlError::NotAnElement(node)),
        }
    }

    pub fn set_attribute_at(&mut self, node: NodeId, index: usize, value: &str) -> XmlResult<()> {
        match &mut self.nodes[node].kind {
            NodeKind::Element { attributes, .. } => {
                if let Some(attr) = attributes.get_mut(index) {
                    attr.value = value.to_string();
                }
                Ok(())
            }
            _ => Err(XmlError::NotAnElement(node)),
        }
    }

    // === Text ===

    /// XPath string-value: text nodes yield their content, elements the
    /// concatenation of all descendant text.
    pub fn text_content(&self, node: NodeId) -> String {
        match &self.nodes[node].kind {
            NodeKind::Text(text) | NodeKind::CData(text) => text.clone(),
            NodeKind::Element { .. } | NodeKind::Document => {
                let mut result = String::new();
                for id in self.descendants(node) {
                    if let NodeKind::Text(text) | NodeKind::CData(text) = &self.nodes[id].kind {
                        result.push_str(text);
                    }
                }
                result
            }
            NodeKind::Comment(_) => String::new(),
        }
    }

    /// Replace the content of a text node, or all children of an element
    /// with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if self.is_element(node) {
            for child in std::mem::take(&mut self.nodes[node].children) {
                self.nodes[child].parent = None;
            }
            let text_node = self.create_text(text);
            self.append_child(node, text_node);
            return;
        }
        if let NodeKind::Text(content) | NodeKind::CData(content) = &mut self.nodes[node].kind {
            *content = text.to_string();
        }
    }
}

impl Declaration {
    fn from_event(decl: &BytesDecl<'_>) -> XmlResult<Self> {
        let version = String::from_utf8(decl.version()?.into_owned())?;
        let encoding = match decl.encoding() {
            Some(encoding) => Some(String::from_utf8(encoding?.into_owned())?),
            None => None,
        };
        let standalone = match decl.standalone() {
            Some(standalone) => Some(String::from_utf8(standalone?.into_owned())?),
            None => None,
        };
        Ok(Self {
            version,
            encoding,
            standalone,
        })
    }
}

fn element_kind(start: &BytesStart<'_>) -> XmlResult<NodeKind> {
    let name = String::from_utf8(start.name().as_ref().to_vec())?;
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        attributes.push(Attribute {
            name: String::from_utf8(attr.key.as_ref().to_vec())?,
            value: attr.unescape_value()?.into_owned(),
        });
    }
    Ok(NodeKind::Element { name, attributes })
}

/// Split `prefix:local` into its parts.
pub fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}
