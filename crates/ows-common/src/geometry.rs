//! SRID-tagged geometries used for allowed areas and request extents.

use geo::{Coord, LineString, MapCoords, MultiPolygon, Point, Polygon};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{OwsError, OwsResult};

/// Geometry kinds handled by the security core.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryKind {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

/// A geometry together with the EPSG SRID its coordinates refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub srid: Option<u32>,
    pub kind: GeometryKind,
}

impl Geometry {
    pub fn point(x: f64, y: f64, srid: Option<u32>) -> Self {
        Self {
            srid,
            kind: GeometryKind::Point(Point::new(x, y)),
        }
    }

    pub fn polygon(polygon: Polygon<f64>, srid: Option<u32>) -> Self {
        Self {
            srid,
            kind: GeometryKind::Polygon(polygon),
        }
    }

    pub fn multi_polygon(multi_polygon: MultiPolygon<f64>, srid: Option<u32>) -> Self {
        Self {
            srid,
            kind: GeometryKind::MultiPolygon(multi_polygon),
        }
    }

    /// `POLYGON EMPTY`, the safe default for missing or malformed extents.
    pub fn empty_polygon() -> Self {
        Self::polygon(Polygon::new(LineString::new(Vec::new()), Vec::new()), None)
    }

    pub fn is_empty(&self) -> bool {
        match &self.kind {
            GeometryKind::Point(_) => false,
            GeometryKind::Polygon(polygon) => polygon.exterior().0.is_empty(),
            GeometryKind::MultiPolygon(multi) => {
                multi.0.iter().all(|p| p.exterior().0.is_empty())
            }
        }
    }

    /// Polygon members in order; a single polygon yields itself.
    pub fn polygons(&self) -> Vec<&Polygon<f64>> {
        match &self.kind {
            GeometryKind::Point(_) => Vec::new(),
            GeometryKind::Polygon(polygon) => vec![polygon],
            GeometryKind::MultiPolygon(multi) => multi.0.iter().collect(),
        }
    }

    pub fn is_polygonal(&self) -> bool {
        !matches!(self.kind, GeometryKind::Point(_))
    }

    /// Copy of this geometry with every coordinate pair swapped (x <-> y).
    ///
    /// SRID and geometry kind are preserved; multi polygon members are
    /// swapped independently, interior rings included.
    pub fn swapped_axes(&self) -> Self {
        let swap = |Coord { x, y }: Coord<f64>| Coord { x: y, y: x };
        let kind = match &self.kind {
            GeometryKind::Point(point) => GeometryKind::Point(point.map_coords(swap)),
            GeometryKind::Polygon(polygon) => GeometryKind::Polygon(polygon.map_coords(swap)),
            GeometryKind::MultiPolygon(multi) => {
                GeometryKind::MultiPolygon(MultiPolygon::new(
                    multi.0.iter().map(|p| p.map_coords(swap)).collect(),
                ))
            }
        };
        Self {
            srid: self.srid,
            kind,
        }
    }

    pub fn with_srid(mut self, srid: Option<u32>) -> Self {
        self.srid = srid;
        self
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        let value = match &self.kind {
            GeometryKind::Point(point) => geojson::Value::from(point),
            GeometryKind::Polygon(polygon) => geojson::Value::from(polygon),
            GeometryKind::MultiPolygon(multi) => geojson::Value::from(multi),
        };
        geojson::Geometry::new(value)
    }

    /// Build from a GeoJSON geometry. Only Point, Polygon and MultiPolygon are accepted.
    pub fn from_geojson(geometry: geojson::Geometry, srid: Option<u32>) -> OwsResult<Self> {
        let converted: geo::Geometry<f64> = geometry
            .try_into()
            .map_err(|e: geojson::Error| OwsError::Geometry(e.to_string()))?;
        let kind = match converted {
            geo::Geometry::Point(point) => GeometryKind::Point(point),
            geo::Geometry::Polygon(polygon) => GeometryKind::Polygon(polygon),
            geo::Geometry::MultiPolygon(multi) => GeometryKind::MultiPolygon(multi),
            other => {
                return Err(OwsError::Geometry(format!(
                    "unsupported geometry type: {:?}",
                    other
                )))
            }
        };
        Ok(Self { srid, kind })
    }

    /// Parse a GeoJSON geometry (or a Feature wrapping one) from text.
    pub fn from_geojson_str(text: &str, srid: Option<u32>) -> OwsResult<Self> {
        let parsed: geojson::GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| OwsError::Geometry(e.to_string()))?;
        let geometry = match parsed {
            geojson::GeoJson::Geometry(geometry) => geometry,
            geojson::GeoJson::Feature(feature) => feature
                .geometry
                .ok_or_else(|| OwsError::Geometry("feature without geometry".to_string()))?,
            geojson::GeoJson::FeatureCollection(_) => {
                return Err(OwsError::Geometry(
                    "feature collections are not supported".to_string(),
                ))
            }
        };
        Self::from_geojson(geometry, srid)
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("srid", &self.srid)?;
        map.serialize_entry("geometry", &self.to_geojson())?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square() -> Polygon<f64> {
        polygon![(x: 1.0, y: 50.0), (x: 2.0, y: 50.0), (x: 2.0, y: 51.0), (x: 1.0, y: 51.0), (x: 1.0, y: 50.0)]
    }

    #[test]
    fn test_empty_polygon() {
        let empty = Geometry::empty_polygon();
        assert!(empty.is_empty());
        assert!(empty.srid.is_none());
        assert!(!Geometry::polygon(square(), Some(4326)).is_empty());
        assert!(!Geometry::point(0.0, 0.0, None).is_empty());
    }

    #[test]
    fn test_swapped_axes_polygon() {
        let geometry = Geometry::polygon(square(), Some(4326));
        let swapped = geometry.swapped_axes();
        assert_eq!(swapped.srid, Some(4326));
        let GeometryKind::Polygon(polygon) = &swapped.kind else {
            panic!("expected polygon");
        };
        assert_eq!(polygon.exterior().0[0], Coord { x: 50.0, y: 1.0 });
        assert_eq!(swapped.swapped_axes(), geometry);
    }

    #[test]
    fn test_polygons_of_multi_polygon() {
        let multi = MultiPolygon::new(vec![square(), square()]);
        let geometry = Geometry::multi_polygon(multi, Some(25832));
        assert_eq!(geometry.polygons().len(), 2);
        assert!(geometry.is_polygonal());
        assert!(!Geometry::point(1.0, 2.0, None).is_polygonal());
    }

    #[test]
    fn test_from_geojson_str() {
        let text = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#;
        let geometry = Geometry::from_geojson_str(text, Some(4326)).unwrap();
        assert_eq!(geometry.polygons().len(), 1);

        let line = r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#;
        assert!(Geometry::from_geojson_str(line, None).is_err());
    }

    #[test]
    fn test_serialize_geometry() {
        let json = serde_json::to_value(Geometry::point(7.0, 51.0, Some(4326))).unwrap();
        assert_eq!(json["srid"], 4326);
        assert_eq!(json["geometry"]["type"], "Point");
    }
}
