//! Error types for the XML document model.

use thiserror::Error;

/// Errors raised while reading, writing or navigating documents.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Failed to parse XML: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("Failed to write XML: {0}")]
    Write(#[from] std::io::Error),

    #[error("Invalid UTF-8 in document: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Document has no root element")]
    NoRootElement,

    #[error("Unbalanced element: {0}")]
    Unbalanced(String),

    #[error("Node {0} is not an element")]
    NotAnElement(usize),

    #[error(transparent)]
    XPath(#[from] XPathError),
}

/// Errors raised while compiling or evaluating an XPath expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error("XPath syntax error in '{expression}': {message}")]
    Syntax { expression: String, message: String },

    #[error("Unbound namespace prefix: {0}")]
    UnknownPrefix(String),

    #[error("Unsupported XPath function: {0}")]
    UnsupportedFunction(String),
}

/// Result type for XML operations.
pub type XmlResult<T> = std::result::Result<T, XmlError>;
