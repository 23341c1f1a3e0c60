//! Bounding box parsing for OGC key-value-pair requests.

use geo::{LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::{Geometry, SrsName};

/// An axis-aligned bounding box in the coordinate units of its CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a BBOX parameter: "minx,miny,maxx,maxy" with an optional
    /// trailing CRS as allowed by WFS ("minx,miny,maxx,maxy,EPSG:4326").
    pub fn from_kvp(s: &str) -> Result<(Self, Option<SrsName>), BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 && parts.len() != 5 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0_f64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))?;
        }

        let srs = match parts.get(4) {
            Some(name) => Some(
                SrsName::parse(name).map_err(|_| BboxParseError::InvalidCrs(name.to_string()))?,
            ),
            None => None,
        };

        let bbox = Self::new(values[0], values[1], values[2], values[3]);
        if !bbox.is_valid() {
            return Err(BboxParseError::Inverted(s.to_string()));
        }
        Ok((bbox, srs))
    }

    /// Minimums must not exceed maximums and all values must be finite.
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    /// Closed exterior ring polygon covering this box.
    pub fn to_geometry(&self, srid: Option<u32>) -> Geometry {
        let ring = LineString::from(vec![
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
            (self.min_x, self.min_y),
        ]);
        Geometry::polygon(Polygon::new(ring, Vec::new()), srid)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'minx,miny,maxx,maxy[,crs]'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),

    #[error("Invalid CRS in BBOX: {0}")]
    InvalidCrs(String),

    #[error("BBOX minimum exceeds maximum: {0}")]
    Inverted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kvp_bbox() {
        let (bbox, srs) = BoundingBox::from_kvp("-125.0,24.0,-66.0,50.0").unwrap();
        assert_eq!(bbox.min_x, -125.0);
        assert_eq!(bbox.min_y, 24.0);
        assert_eq!(bbox.max_x, -66.0);
        assert_eq!(bbox.max_y, 50.0);
        assert!(srs.is_none());
    }

    #[test]
    fn test_parse_kvp_bbox_with_crs() {
        let (_, srs) =
            BoundingBox::from_kvp("6.0,50.0,7.0,51.0,urn:ogc:def:crs:EPSG::4326").unwrap();
        assert_eq!(srs, Some(SrsName::epsg(4326)));
    }

    #[test]
    fn test_to_geometry_is_closed_ring() {
        let geometry = BoundingBox::new(0.0, 0.0, 10.0, 5.0).to_geometry(Some(25832));
        let polygons = geometry.polygons();
        let ring = &polygons[0].exterior().0;
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(geometry.srid, Some(25832));
    }
}
