//! SRS name parsing for the notations found in OGC requests and documents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis order for coordinate interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisOrder {
    /// X (longitude/easting), Y (latitude/northing)
    XY,
    /// Y (latitude/northing), X (longitude/easting)
    YX,
}

/// An authority-qualified coordinate reference system identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SrsName {
    pub authority: String,
    pub code: u32,
}

impl SrsName {
    pub fn epsg(code: u32) -> Self {
        Self {
            authority: "EPSG".to_string(),
            code,
        }
    }

    /// Parse an SRS name.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:4326"
    /// - "CRS:84"
    /// - "urn:ogc:def:crs:EPSG::4326", "urn:x-ogc:def:crs:EPSG:6.6:4326"
    /// - "http://www.opengis.net/def/crs/EPSG/0/4326"
    /// - "http://www.opengis.net/gml/srs/epsg.xml#4326"
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower.starts_with("urn:") {
            return Self::from_urn(trimmed);
        }
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Self::from_uri(trimmed);
        }

        let (authority, code) = trimmed
            .split_once(':')
            .ok_or_else(|| CrsParseError::Unrecognized(s.to_string()))?;
        Ok(Self {
            authority: authority.to_ascii_uppercase(),
            code: parse_code(code, s)?,
        })
    }

    fn from_urn(s: &str) -> Result<Self, CrsParseError> {
        // urn:<ogc|x-ogc>:def:crs:<authority>:<version?>:<code>
        let parts: Vec<&str> = s.split(':').collect();
        let crs_index = parts
            .iter()
            .position(|p| p.eq_ignore_ascii_case("crs"))
            .ok_or_else(|| CrsParseError::Unrecognized(s.to_string()))?;
        let authority = parts
            .get(crs_index + 1)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| CrsParseError::Unrecognized(s.to_string()))?;
        let code = parts
            .last()
            .ok_or_else(|| CrsParseError::Unrecognized(s.to_string()))?;
        Ok(Self {
            authority: authority.to_ascii_uppercase(),
            code: parse_code(code, s)?,
        })
    }

    fn from_uri(s: &str) -> Result<Self, CrsParseError> {
        if let Some((_, code)) = s.split_once('#') {
            return Ok(Self::epsg(parse_code(code, s)?));
        }
        // http://www.opengis.net/def/crs/<authority>/<version>/<code>
        let parts: Vec<&str> = s.trim_end_matches('/').split('/').collect();
        let crs_index = parts
            .iter()
            .position(|p| p.eq_ignore_ascii_case("crs"))
            .ok_or_else(|| CrsParseError::Unrecognized(s.to_string()))?;
        let authority = parts
            .get(crs_index + 1)
            .ok_or_else(|| CrsParseError::Unrecognized(s.to_string()))?;
        let code = parts
            .last()
            .ok_or_else(|| CrsParseError::Unrecognized(s.to_string()))?;
        Ok(Self {
            authority: authority.to_ascii_uppercase(),
            code: parse_code(code, s)?,
        })
    }

    /// EPSG SRID for this name. `CRS:84` maps to 4326.
    pub fn srid(&self) -> Option<u32> {
        match self.authority.as_str() {
            "EPSG" => Some(self.code),
            "CRS" if self.code == 84 => Some(4326),
            _ => None,
        }
    }

    /// URN notation used for `srsName` attributes on injected GML.
    pub fn to_urn(&self) -> String {
        format!("urn:x-ogc:def:crs:{}:{}", self.authority, self.code)
    }
}

fn parse_code(code: &str, original: &str) -> Result<u32, CrsParseError> {
    code.trim()
        .parse()
        .map_err(|_| CrsParseError::InvalidCode(original.to_string()))
}

impl fmt::Display for SrsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unrecognized SRS name: {0}")]
    Unrecognized(String),

    #[error("Invalid SRS code in: {0}")]
    InvalidCode(String),
}
