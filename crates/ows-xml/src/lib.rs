//! XML document model for OGC capabilities and request documents.
//!
//! Provides:
//! - `XmlDocument`: an arena DOM parsed with quick-xml that supports in-place
//!   mutation, subtree deep copies and re-serialization
//! - `XPath`: a namespace-aware XPath 1.0 subset used by the schema mapping tables

pub mod dom;
pub mod error;
pub mod xpath;

pub use dom::{Attribute, NodeId, NodeKind, XmlDocument, DOCUMENT};
pub use error::{XPathError, XmlError, XmlResult};
pub use xpath::{select, XPath, XPathItem};

/// Prefix to namespace URI bindings used when evaluating XPath expressions.
pub type Namespaces<'a> = &'a [(&'a str, &'a str)];
