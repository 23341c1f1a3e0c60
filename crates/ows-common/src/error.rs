//! Error types for the OWS security core.

use thiserror::Error;

/// Result type alias using OwsError.
pub type OwsResult<T> = Result<T, OwsError>;

/// Primary error type for OWS operations.
#[derive(Debug, Error)]
pub enum OwsError {
    // === OGC Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid SRS name: {0}")]
    InvalidSrs(String),

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    #[error("Unsupported service type: {0}")]
    UnsupportedService(String),

    #[error("No schema mapping for {service} version {version}")]
    UnsupportedVersion { service: String, version: String },

    // === Document Errors ===
    #[error("Invalid XML document: {0}")]
    InvalidXml(String),

    #[error("XPath evaluation failed: {0}")]
    XPath(String),

    #[error("Mapping failed: {0}")]
    Mapping(String),

    #[error("Invalid geometry: {0}")]
    Geometry(String),

    // === Infrastructure Errors ===
    #[error("Remote registry error: {0}")]
    RemoteRegistry(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Request timeout")]
    Timeout,
}

impl OwsError {
    /// Get the OWS exception code for this error.
    pub fn ows_exception_code(&self) -> &'static str {
        match self {
            OwsError::MissingParameter(_) => "MissingParameterValue",
            OwsError::InvalidParameter { .. }
            | OwsError::InvalidSrs(_)
            | OwsError::InvalidBbox(_)
            | OwsError::InvalidXml(_) => "InvalidParameterValue",
            OwsError::OperationNotSupported(_) => "OperationNotSupported",
            OwsError::UnsupportedVersion { .. } => "VersionNegotiationFailed",
            _ => "NoApplicableCode",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            OwsError::MissingParameter(_)
            | OwsError::InvalidParameter { .. }
            | OwsError::InvalidSrs(_)
            | OwsError::InvalidBbox(_)
            | OwsError::InvalidXml(_)
            | OwsError::Geometry(_) => 400,

            OwsError::OperationNotSupported(_)
            | OwsError::UnsupportedService(_)
            | OwsError::UnsupportedVersion { .. } => 501,

            OwsError::RemoteRegistry(_) => 502,
            OwsError::Timeout => 504,

            _ => 500,
        }
    }
}

impl From<std::io::Error> for OwsError {
    fn from(err: std::io::Error) -> Self {
        OwsError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for OwsError {
    fn from(err: serde_json::Error) -> Self {
        OwsError::InternalError(format!("JSON error: {}", err))
    }
}
