//! Namespace-aware XPath 1.0 subset.
//!
//! Supported:
//! - absolute and relative location paths, `//` abbreviation
//! - `.`, `..`, `@name`, `@*`, `*`, `prefix:*`, `text()`, `node()`
//! - explicit axes `child::`, `descendant::`, `descendant-or-self::`,
//!   `parent::`, `self::`, `attribute::`
//! - predicates `[n]`, `[last()]`, `[path]`, `[path='literal']`
//! - top-level functions `local-name()`, `name()`, `string()`,
//!   `normalize-space()`, each with an optional path argument
//!
//! Unprefixed name tests match elements without a namespace, as in XPath 1.0.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::dom::{split_qname, NodeId, NodeKind, XmlDocument, DOCUMENT};
use crate::error::XPathError;
use crate::Namespaces;

/// One result of an XPath evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum XPathItem {
    /// Element, text or comment node.
    Node(NodeId),
    /// Attribute `index` of `element`.
    Attribute { element: NodeId, index: usize },
    /// Result of a string function.
    Value(String),
}

impl XPathItem {
    pub fn string_value(&self, doc: &XmlDocument) -> String {
        match self {
            XPathItem::Node(node) => doc.text_content(*node),
            XPathItem::Attribute { element, index } => doc
                .attributes(*element)
                .get(*index)
                .map(|a| a.value.clone())
                .unwrap_or_default(),
            XPathItem::Value(value) => value.clone(),
        }
    }

    /// The element node behind this item, if it is one.
    pub fn element(&self, doc: &XmlDocument) -> Option<NodeId> {
        match self {
            XPathItem::Node(node) if doc.is_element(*node) => Some(*node),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    SelfNode,
    Attribute,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Name {
        prefix: Option<String>,
        local: String,
    },
    Any,
    PrefixWildcard(String),
    Text,
    Node,
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    Last,
    Exists(LocationPath),
    Equals(LocationPath, String),
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    LocalName,
    Name,
    String,
    NormalizeSpace,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Path(LocationPath),
    Call(Function, Option<LocationPath>),
}

/// A compiled XPath expression.
#[derive(Debug, Clone, PartialEq)]
pub struct XPath {
    expression: String,
    expr: Expr,
}

impl XPath {
    pub fn compile(expression: &str) -> Result<Self, XPathError> {
        let trimmed = expression.trim();
        let expr = match parse_function_call(trimmed)? {
            Some((function, argument)) => Expr::Call(function, argument),
            None => Expr::Path(PathParser::new(trimmed).parse_path()?),
        };
        Ok(Self {
            expression: expression.to_string(),
            expr,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluate against `context`; results are in document order per step
    /// and free of duplicates.
    pub fn evaluate(
        &self,
        doc: &XmlDocument,
        context: NodeId,
        namespaces: Namespaces<'_>,
    ) -> Result<Vec<XPathItem>, XPathError> {
        let evaluator = Evaluator { doc, namespaces };
        match &self.expr {
            Expr::Path(path) => evaluator.path(path, context),
            Expr::Call(function, argument) => {
                let target = match argument {
                    Some(path) => evaluator.path(path, context)?.into_iter().next(),
                    None => Some(XPathItem::Node(context)),
                };
                let Some(target) = target else {
                    return Ok(Vec::new());
                };
                let value = match function {
                    Function::LocalName => evaluator.name_of(&target, true),
                    Function::Name => evaluator.name_of(&target, false),
                    Function::String => target.string_value(doc),
                    Function::NormalizeSpace => target
                        .string_value(doc)
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" "),
                };
                Ok(vec![XPathItem::Value(value)])
            }
        }
    }
}

/// Compiled static expressions, shared process-wide.
static COMPILED: Lazy<RwLock<HashMap<&'static str, Arc<XPath>>>> = Lazy::new(Default::default);

impl XPath {
    /// Compiled form of a static expression, compiled on first use only.
    ///
    /// Keys are `'static`, so the cache is bounded by the expressions the
    /// program contains. Compile errors are returned and not cached.
    pub fn cached(expression: &'static str) -> Result<Arc<XPath>, XPathError> {
        if let Some(compiled) = COMPILED
            .read()
            .ok()
            .and_then(|compiled| compiled.get(expression).cloned())
        {
            return Ok(compiled);
        }
        let compiled = Arc::new(XPath::compile(expression)?);
        if let Ok(mut cache) = COMPILED.write() {
            return Ok(cache.entry(expression).or_insert(compiled).clone());
        }
        Ok(compiled)
    }
}

/// Compile and evaluate in one go.
pub fn select(
    doc: &XmlDocument,
    context: NodeId,
    expression: &str,
    namespaces: Namespaces<'_>,
) -> Result<Vec<XPathItem>, XPathError> {
    XPath::compile(expression)?.evaluate(doc, context, namespaces)
}

// === Parsing ===

fn parse_function_call(
    expression: &str,
) -> Result<Option<(Function, Option<LocationPath>)>, XPathError> {
    let Some(open) = expression.find('(') else {
        return Ok(None);
    };
    let name = &expression[..open];
    if name.is_empty() || name.contains(['/', '[', '@', ':']) || !expression.ends_with(')') {
        return Ok(None);
    }
    let function = match name {
        "local-name" => Function::LocalName,
        "name" => Function::Name,
        "string" => Function::String,
        "normalize-space" => Function::NormalizeSpace,
        // Node tests used as a single step
        "text" | "node" => return Ok(None),
        other => return Err(XPathError::UnsupportedFunction(other.to_string())),
    };
    let inner = expression[open + 1..expression.len() - 1].trim();
    let argument = if inner.is_empty() {
        None
    } else {
        Some(PathParser::new(inner).parse_path()?)
    };
    Ok(Some((function, argument)))
}

struct PathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> XPathError {
        XPathError::Syntax {
            expression: self.input.to_string(),
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn descendant_step() -> Step {
        Step {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }

    fn parse_path(&mut self) -> Result<LocationPath, XPathError> {
        let mut steps = Vec::new();
        let mut absolute = false;

        if self.rest().starts_with("//") {
            absolute = true;
            steps.push(Self::descendant_step());
            self.pos += 2;
        } else if self.rest().starts_with('/') {
            absolute = true;
            self.pos += 1;
            if self.at_end() {
                return Ok(LocationPath { absolute, steps });
            }
        }

        loop {
            steps.push(self.parse_step()?);
            if self.at_end() {
                break;
            }
            if self.rest().starts_with("//") {
                steps.push(Self::descendant_step());
                self.pos += 2;
            } else if self.rest().starts_with('/') {
                self.pos += 1;
            } else {
                return Err(self.error(format!("unexpected '{}'", self.rest())));
            }
            if self.at_end() {
                return Err(self.error("path ends with '/'"));
            }
        }

        Ok(LocationPath { absolute, steps })
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        if self.rest().starts_with("..") {
            self.pos += 2;
            return Ok(Step {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }
        if self.rest().starts_with('.') {
            self.pos += 1;
            return Ok(Step {
                axis: Axis::SelfNode,
                test: NodeTest::Node,
                predicates: Vec::new(),
            });
        }

        let mut axis = Axis::Child;
        if self.rest().starts_with('@') {
            self.pos += 1;
            axis = Axis::Attribute;
        } else if let Some((name, _)) = self.rest().split_once("::") {
            if !name.contains(['/', '[']) {
                axis = match name {
                    "child" => Axis::Child,
                    "descendant" => Axis::Descendant,
                    "descendant-or-self" => Axis::DescendantOrSelf,
                    "parent" => Axis::Parent,
                    "self" => Axis::SelfNode,
                    "attribute" => Axis::Attribute,
                    other => return Err(self.error(format!("unsupported axis '{}'", other))),
                };
                self.pos += name.len() + 2;
            }
        }

        let token = self.read_name();
        if token.is_empty() {
            return Err(self.error("expected a node test"));
        }
        let test = if self.rest().starts_with("()") {
            self.pos += 2;
            match token {
                "text" => NodeTest::Text,
                "node" => NodeTest::Node,
                other => return Err(self.error(format!("unsupported node test '{}()'", other))),
            }
        } else if token == "*" {
            NodeTest::Any
        } else if let Some(prefix) = token.strip_suffix(":*") {
            NodeTest::PrefixWildcard(prefix.to_string())
        } else {
            let (prefix, local) = split_qname(token);
            NodeTest::Name {
                prefix: prefix.map(str::to_string),
                local: local.to_string(),
            }
        };

        let mut predicates = Vec::new();
        while self.rest().starts_with('[') {
            let inner = self.read_bracketed()?;
            predicates.push(parse_predicate(inner, self.input)?);
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn read_name(&mut self) -> &'a str {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '*')))
            .unwrap_or(self.rest().len());
        self.pos += len;
        &self.input[start..start + len]
    }

    fn read_bracketed(&mut self) -> Result<&'a str, XPathError> {
        let start = self.pos + 1;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        for (offset, c) in self.rest().char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, '[') => depth += 1,
                (None, ']') => {
                    depth -= 1;
                    if depth == 0 {
                        let end = self.pos + offset;
                        self.pos = end + 1;
                        return Ok(&self.input[start..end]);
                    }
                }
                _ => {}
            }
        }
        Err(self.error("unterminated predicate"))
    }
}

fn parse_predicate(inner: &str, expression: &str) -> Result<Predicate, XPathError> {
    let syntax = |message: &str| XPathError::Syntax {
        expression: expression.to_string(),
        message: message.to_string(),
    };
    let inner = inner.trim();
    if inner.is_empty() {
        return Err(syntax("empty predicate"));
    }
    if let Ok(position) = inner.parse::<usize>() {
        if position == 0 {
            return Err(syntax("positions start at 1"));
        }
        return Ok(Predicate::Position(position));
    }
    if inner == "last()" {
        return Ok(Predicate::Last);
    }
    if let Some((lhs, rhs)) = split_equals(inner) {
        let path = PathParser::new(lhs.trim()).parse_path()?;
        let rhs = rhs.trim();
        let literal = if rhs.len() >= 2
            && ((rhs.starts_with('\'') && rhs.ends_with('\''))
                || (rhs.starts_with('"') && rhs.ends_with('"')))
        {
            rhs[1..rhs.len() - 1].to_string()
        } else if rhs.parse::<f64>().is_ok() {
            rhs.to_string()
        } else {
            return Err(syntax("right-hand side must be a literal"));
        };
        return Ok(Predicate::Equals(path, literal));
    }
    Ok(Predicate::Exists(PathParser::new(inner).parse_path()?))
}

fn split_equals(input: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (index, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '=') => return Some((&input[..index], &input[index + 1..])),
            _ => {}
        }
    }
    None
}

// === Evaluation ===

struct Evaluator<'d, 'n> {
    doc: &'d XmlDocument,
    namespaces: Namespaces<'n>,
}

impl Evaluator<'_, '_> {
    fn resolve(&self, prefix: &str) -> Result<&str, XPathError> {
        self.namespaces
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, uri)| *uri)
            .ok_or_else(|| XPathError::UnknownPrefix(prefix.to_string()))
    }

    fn path(&self, path: &LocationPath, context: NodeId) -> Result<Vec<XPathItem>, XPathError> {
        let start = if path.absolute { DOCUMENT } else { context };
        let mut current = vec![XPathItem::Node(start)];

        for step in &path.steps {
            let mut next = Vec::new();
            let mut seen = HashSet::new();
            for item in &current {
                let XPathItem::Node(node) = item else {
                    continue;
                };
                let mut candidates = self.axis(*node, step)?;
                for predicate in &step.predicates {
                    candidates = self.filter(candidates, predicate)?;
                }
                for candidate in candidates {
                    if seen.insert(candidate.clone()) {
                        next.push(candidate);
                    }
                }
            }
            current = next;
        }

        let descends = path
            .steps
            .iter()
            .any(|step| matches!(step.axis, Axis::Descendant | Axis::DescendantOrSelf));
        if descends && current.len() > 1 {
            self.sort_document_order(&mut current);
        }
        Ok(current)
    }

    /// Per-step results of descendant paths are grouped by context node;
    /// reorder them into document order.
    fn sort_document_order(&self, items: &mut [XPathItem]) {
        let order: HashMap<NodeId, usize> = std::iter::once(DOCUMENT)
            .chain(self.doc.descendants(DOCUMENT))
            .enumerate()
            .map(|(position, node)| (node, position))
            .collect();
        let position = |node: &NodeId| order.get(node).copied().unwrap_or(usize::MAX);
        items.sort_by_key(|item| match item {
            XPathItem::Node(node) => (position(node), 0),
            XPathItem::Attribute { element, index } => (position(element), index + 1),
            XPathItem::Value(_) => (usize::MAX, 0),
        });
    }

    fn axis(&self, node: NodeId, step: &Step) -> Result<Vec<XPathItem>, XPathError> {
        let doc = self.doc;
        if step.axis == Axis::Attribute {
            return self.attributes(node, &step.test);
        }
        let nodes: Vec<NodeId> = match step.axis {
            Axis::Child => doc.children(node).to_vec(),
            Axis::Descendant => doc.descendants(node),
            Axis::DescendantOrSelf => {
                let mut nodes = vec![node];
                nodes.extend(doc.descendants(node));
                nodes
            }
            Axis::Parent => doc.parent(node).into_iter().collect(),
            Axis::SelfNode => vec![node],
            Axis::Attribute => Vec::new(),
        };
        let mut result = Vec::new();
        for candidate in nodes {
            if self.test(candidate, &step.test)? {
                result.push(XPathItem::Node(candidate));
            }
        }
        Ok(result)
    }

    fn test(&self, node: NodeId, test: &NodeTest) -> Result<bool, XPathError> {
        let doc = self.doc;
        Ok(match test {
            NodeTest::Node => true,
            NodeTest::Text => matches!(doc.kind(node), NodeKind::Text(_) | NodeKind::CData(_)),
            NodeTest::Any => doc.is_element(node),
            NodeTest::PrefixWildcard(prefix) => {
                doc.is_element(node) && doc.namespace_uri(node) == Some(self.resolve(prefix)?)
            }
            NodeTest::Name { prefix, local } => {
                if doc.local_name(node) != Some(local.as_str()) {
                    return Ok(false);
                }
                let expected = match prefix {
                    Some(p) => Some(self.resolve(p)?),
                    None => None,
                };
                doc.namespace_uri(node) == expected
            }
        })
    }

    fn attributes(&self, node: NodeId, test: &NodeTest) -> Result<Vec<XPathItem>, XPathError> {
        let doc = self.doc;
        if !doc.is_element(node) {
            return Ok(Vec::new());
        }
        let item = |index| XPathItem::Attribute {
            element: node,
            index,
        };
        Ok(match test {
            NodeTest::Any | NodeTest::Node => doc
                .attributes(node)
                .iter()
                .enumerate()
                .filter(|(_, a)| a.name != "xmlns" && !a.name.starts_with("xmlns:"))
                .map(|(index, _)| item(index))
                .collect(),
            NodeTest::Name { prefix, local } => {
                let namespace = match prefix {
                    Some(p) => Some(self.resolve(p)?),
                    None => None,
                };
                doc.attribute_index(node, namespace, local)
                    .map(item)
                    .into_iter()
                    .collect()
            }
            NodeTest::PrefixWildcard(_) | NodeTest::Text => Vec::new(),
        })
    }

    fn filter(
        &self,
        candidates: Vec<XPathItem>,
        predicate: &Predicate,
    ) -> Result<Vec<XPathItem>, XPathError> {
        match predicate {
            Predicate::Position(position) => {
                Ok(candidates.into_iter().nth(position - 1).into_iter().collect())
            }
            Predicate::Last => Ok(candidates.into_iter().last().into_iter().collect()),
            Predicate::Exists(path) => {
                let mut kept = Vec::new();
                for candidate in candidates {
                    if let XPathItem::Node(node) = candidate {
                        if !self.path(path, node)?.is_empty() {
                            kept.push(candidate);
                        }
                    }
                }
                Ok(kept)
            }
            Predicate::Equals(path, literal) => {
                let mut kept = Vec::new();
                for candidate in candidates {
                    if let XPathItem::Node(node) = candidate {
                        let matched = self
                            .path(path, node)?
                            .iter()
                            .any(|item| item.string_value(self.doc).trim() == literal);
                        if matched {
                            kept.push(candidate);
                        }
                    }
                }
                Ok(kept)
            }
        }
    }

    fn name_of(&self, item: &XPathItem, local: bool) -> String {
        let name = match item {
            XPathItem::Node(node) => self.doc.name(*node).unwrap_or_default(),
            XPathItem::Attribute { element, index } => self
                .doc
                .attributes(*element)
                .get(*index)
                .map(|a| a.name.as_str())
                .unwrap_or_default(),
            XPathItem::Value(_) => "",
        };
        if local {
            split_qname(name).1.to_string()
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &[(&str, &str)] = &[("w", "urn:w"), ("x", "http://www.w3.org/1999/xlink")];

    const DOC: &str = r#"<w:Root xmlns:w="urn:w" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.3.0">
  <w:Layer queryable="1"><w:Name>a</w:Name>
    <w:Layer><w:Name>b</w:Name></w:Layer>
    <w:Layer><w:Name>c</w:Name><w:Link xlink:href="http://c"/></w:Layer>
  </w:Layer>
</w:Root>"#;

    fn texts(doc: &XmlDocument, items: &[XPathItem]) -> Vec<String> {
        items.iter().map(|i| i.string_value(doc)).collect()
    }

    #[test]
    fn test_absolute_and_attribute() {
        let doc = XmlDocument::parse(DOC).unwrap();
        let result = select(&doc, DOCUMENT, "/w:Root/@version", NS).unwrap();
        assert_eq!(texts(&doc, &result), vec!["1.3.0"]);
    }

    #[test]
    fn test_descendant_names() {
        let doc = XmlDocument::parse(DOC).unwrap();
        let result = select(&doc, DOCUMENT, "//w:Layer/w:Name/text()", NS).unwrap();
        assert_eq!(texts(&doc, &result), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_predicates() {
        let doc = XmlDocument::parse(DOC).unwrap();
        let second = select(&doc, DOCUMENT, "/w:Root/w:Layer/w:Layer[2]/w:Name", NS).unwrap();
        assert_eq!(texts(&doc, &second), vec!["c"]);

        let by_name = select(&doc, DOCUMENT, "//w:Layer[w:Name='b']", NS).unwrap();
        assert_eq!(by_name.len(), 1);

        let with_attr = select(&doc, DOCUMENT, "//w:Layer[@queryable]", NS).unwrap();
        assert_eq!(with_attr.len(), 1);

        let last = select(&doc, DOCUMENT, "/w:Root/w:Layer/w:Layer[last()]/w:Name", NS).unwrap();
        assert_eq!(texts(&doc, &last), vec!["c"]);
    }

    #[test]
    fn test_descendant_results_in_document_order() {
        let doc = XmlDocument::parse(
            "<r><a><n>1</n><a><n>2</n></a><a><n>3</n></a></a><a><n>4</n></a></r>",
        )
        .unwrap();
        let result = select(&doc, DOCUMENT, "/r//a/n/text()", &[]).unwrap();
        assert_eq!(texts(&doc, &result), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_namespaced_attribute_and_parent() {
        let doc = XmlDocument::parse(DOC).unwrap();
        let links = select(&doc, DOCUMENT, "//w:Link", NS).unwrap();
        let link = links[0].element(&doc).unwrap();
        let href = select(&doc, link, "./@x:href", NS).unwrap();
        assert_eq!(texts(&doc, &href), vec!["http://c"]);
        let parent = select(&doc, link, "../w:Name/text()", NS).unwrap();
        assert_eq!(texts(&doc, &parent), vec!["c"]);
    }

    #[test]
    fn test_functions() {
        let doc = XmlDocument::parse(DOC).unwrap();
        let links = select(&doc, DOCUMENT, "//w:Link", NS).unwrap();
        let link = links[0].element(&doc).unwrap();
        let local = select(&doc, link, "local-name()", NS).unwrap();
        assert_eq!(texts(&doc, &local), vec!["Link"]);
        let parent_name = select(&doc, link, "name(..)", NS).unwrap();
        assert_eq!(texts(&doc, &parent_name), vec!["w:Layer"]);
        let missing = select(&doc, link, "local-name(./w:Missing)", NS).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_cached_compiles_once() {
        let first = XPath::cached("wms:Layer/wms:Name/text()").unwrap();
        let second = XPath::cached("wms:Layer/wms:Name/text()").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.expression(), "wms:Layer/wms:Name/text()");
        assert!(XPath::cached("a[").is_err());
        assert!(XPath::cached("a[").is_err());
    }

    #[test]
    fn test_errors() {
        let doc = XmlDocument::parse(DOC).unwrap();
        assert!(matches!(
            select(&doc, DOCUMENT, "/q:Root", NS),
            Err(XPathError::UnknownPrefix(_))
        ));
        assert!(matches!(
            XPath::compile("count(//w:Layer)"),
            Err(XPathError::UnsupportedFunction(_))
        ));
        assert!(XPath::compile("/w:Root/").is_err());
        assert!(XPath::compile("//w:Layer[").is_err());
    }
}
