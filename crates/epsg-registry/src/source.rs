//! Remote EPSG definition sources.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use ows_common::{OwsError, OwsResult};

use crate::RegistryConfig;

#[derive(Error, Debug)]
pub enum RemoteLookupError {
    #[error("EPSG API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("EPSG API returned status {status} for EPSG:{srid}")]
    Status { srid: u32, status: u16 },

    #[error("EPSG source unavailable: {0}")]
    Unavailable(String),
}

impl From<RemoteLookupError> for OwsError {
    fn from(err: RemoteLookupError) -> Self {
        match err {
            RemoteLookupError::Request(e) if e.is_timeout() => OwsError::Timeout,
            other => OwsError::RemoteRegistry(other.to_string()),
        }
    }
}

/// Something that can return the WKT definition of an EPSG SRID.
#[async_trait]
pub trait EpsgSource: Send + Sync {
    async fn fetch_wkt(&self, srid: u32) -> Result<String, RemoteLookupError>;
}

/// Client for the EPSG registry REST API.
pub struct EpsgApiClient {
    client: Client,
    api_url: String,
}

impl EpsgApiClient {
    pub fn new(config: &RegistryConfig) -> OwsResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OwsError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    pub fn export_url(&self, srid: u32) -> String {
        format!("{}/CoordRefSystem/{}/export/?format=wkt", self.api_url, srid)
    }
}

#[async_trait]
impl EpsgSource for EpsgApiClient {
    async fn fetch_wkt(&self, srid: u32) -> Result<String, RemoteLookupError> {
        let url = self.export_url(srid);
        debug!(url = %url, "Fetching EPSG definition");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.as_u16() >= 300 {
            return Err(RemoteLookupError::Status {
                srid,
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_url() {
        let config = RegistryConfig::default().with_api_url("https://example.org/api/v1/");
        let client = EpsgApiClient::new(&config).unwrap();
        assert_eq!(
            client.export_url(25832),
            "https://example.org/api/v1/CoordRefSystem/25832/export/?format=wkt"
        );
    }

    #[test]
    fn test_status_error_maps_to_remote_registry() {
        let err: OwsError = RemoteLookupError::Status {
            srid: 1,
            status: 404,
        }
        .into();
        assert!(matches!(err, OwsError::RemoteRegistry(_)));
        assert_eq!(err.http_status_code(), 502);
    }
}
