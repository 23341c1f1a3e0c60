//! OWS exception reports.

use quick_xml::escape::escape;

use ows_common::OwsError;

use crate::namespaces::OWS_11;
use crate::request::OgcRequest;

/// A single `ows:Exception`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwsException {
    pub code: String,
    pub locator: Option<String>,
    pub text: String,
}

impl OwsException {
    pub fn new(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            locator: None,
            text: text.into(),
        }
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    /// Exception for an error; parameter errors name the parameter as locator.
    pub fn from_error(error: &OwsError) -> Self {
        let exception = Self::new(error.ows_exception_code(), error.to_string());
        match error {
            OwsError::MissingParameter(param) | OwsError::InvalidParameter { param, .. } => {
                exception.with_locator(param.clone())
            }
            OwsError::InvalidBbox(_) => exception.with_locator("bbox"),
            OwsError::InvalidSrs(_) => exception.with_locator("srsName"),
            _ => exception,
        }
    }

    /// `OperationNotSupported` located at the request's operation.
    pub fn operation_not_supported(request: &OgcRequest) -> Self {
        let operation = request.operation().unwrap_or_default();
        let exception = Self::new(
            "OperationNotSupported",
            format!("Operation '{}' is not supported", operation),
        );
        if operation.is_empty() {
            exception
        } else {
            exception.with_locator(operation)
        }
    }

    /// Single-exception report.
    pub fn to_xml(&self) -> String {
        ExceptionReport::new(vec![self.clone()]).to_xml()
    }
}

/// An OWS 1.1 `ExceptionReport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionReport {
    pub version: String,
    pub exceptions: Vec<OwsException>,
}

impl ExceptionReport {
    pub fn new(exceptions: Vec<OwsException>) -> Self {
        Self {
            version: "2.0.0".to_string(),
            exceptions,
        }
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<ows:ExceptionReport xmlns:ows=\"{}\" version=\"{}\">\n",
            OWS_11,
            escape(self.version.as_str())
        ));
        for exception in &self.exceptions {
            xml.push_str(&format!(
                "  <ows:Exception exceptionCode=\"{}\"",
                escape(exception.code.as_str())
            ));
            if let Some(locator) = &exception.locator {
                xml.push_str(&format!(" locator=\"{}\"", escape(locator.as_str())));
            }
            xml.push_str(">\n");
            xml.push_str(&format!(
                "    <ows:ExceptionText>{}</ows:ExceptionText>\n",
                escape(exception.text.as_str())
            ));
            xml.push_str("  </ows:Exception>\n");
        }
        xml.push_str("</ows:ExceptionReport>\n");
        xml
    }
}
