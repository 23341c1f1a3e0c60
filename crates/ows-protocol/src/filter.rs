//! Spatial filter conditions and their XML encoding.
//!
//! Only the conditions needed to restrict a request to an allowed area are
//! modelled: `Within` a polygon, combined with `And` / `Or`.

use geo::{Coord, LineString, Polygon};

use ows_common::{Geometry, OwsError, OwsResult, SrsName};
use ows_xml::{NodeId, XmlDocument};

use crate::namespaces::{FES_20, GML, GML_32, OGC};

/// Filter encoding used by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDialect {
    /// FES 2.0 with GML 3.2 (WFS 2.0.x).
    Fes20,
    /// OGC Filter 1.1 with GML 3.1 (WFS 1.x).
    Ogc11,
}

impl FilterDialect {
    /// Dialect for a WFS version string; anything not 2.x is treated as 1.x.
    pub fn for_wfs_version(version: &str) -> Self {
        if version.trim().starts_with('2') {
            FilterDialect::Fes20
        } else {
            FilterDialect::Ogc11
        }
    }

    pub fn from_namespace(uri: &str) -> Option<Self> {
        match uri {
            FES_20 => Some(FilterDialect::Fes20),
            OGC => Some(FilterDialect::Ogc11),
            _ => None,
        }
    }

    pub fn filter_namespace(self) -> &'static str {
        match self {
            FilterDialect::Fes20 => FES_20,
            FilterDialect::Ogc11 => OGC,
        }
    }

    pub fn gml_namespace(self) -> &'static str {
        match self {
            FilterDialect::Fes20 => GML_32,
            FilterDialect::Ogc11 => GML,
        }
    }

    pub(crate) fn filter_prefix(self) -> &'static str {
        match self {
            FilterDialect::Fes20 => "fes",
            FilterDialect::Ogc11 => "ogc",
        }
    }

    /// Element naming the filtered property.
    fn value_reference(self) -> &'static str {
        match self {
            FilterDialect::Fes20 => "ValueReference",
            FilterDialect::Ogc11 => "PropertyName",
        }
    }
}

/// A polygon as written inside a `Within` condition: the exterior ring
/// only. Holes of the allowed area are not carried into filters.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFilter {
    pub srid: Option<u32>,
    pub exterior: Vec<(f64, f64)>,
}

impl PolygonFilter {
    pub fn from_polygon(polygon: &Polygon<f64>, srid: Option<u32>) -> Self {
        Self {
            srid,
            exterior: polygon.exterior().0.iter().map(|c| (c.x, c.y)).collect(),
        }
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        let exterior = self.exterior.iter().map(|&(x, y)| Coord { x, y }).collect();
        Polygon::new(LineString::new(exterior), Vec::new())
    }
}

/// `Within(value_reference, polygon)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WithinFilter {
    pub value_reference: String,
    pub polygon: PolygonFilter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpatialFilter {
    Within(WithinFilter),
    And(Vec<SpatialFilter>),
    Or(Vec<SpatialFilter>),
}

impl SpatialFilter {
    /// Condition restricting `value_reference` to `area`.
    ///
    /// A polygon gives a single `Within`; a multi polygon gives an `Or` of one
    /// `Within` per member, or a plain `Within` when it has only one member.
    pub fn within_area(value_reference: &str, area: &Geometry) -> OwsResult<Self> {
        if !area.is_polygonal() {
            return Err(OwsError::Geometry(
                "allowed area must be a polygon or multi polygon".to_string(),
            ));
        }
        let mut conditions: Vec<SpatialFilter> = area
            .polygons()
            .into_iter()
            .filter(|p| !p.exterior().0.is_empty())
            .map(|polygon| {
                SpatialFilter::Within(WithinFilter {
                    value_reference: value_reference.to_string(),
                    polygon: PolygonFilter::from_polygon(polygon, area.srid),
                })
            })
            .collect();

        match conditions.len() {
            0 => Err(OwsError::Geometry("allowed area is empty".to_string())),
            1 => Ok(conditions.remove(0)),
            _ => Ok(SpatialFilter::Or(conditions)),
        }
    }

    /// Read a condition element (`Within`, `And` or `Or`).
    pub fn from_element(doc: &XmlDocument, node: NodeId) -> OwsResult<Self> {
        let dialect = doc
            .namespace_uri(node)
            .and_then(FilterDialect::from_namespace)
            .ok_or_else(|| {
                OwsError::InvalidXml(format!(
                    "'{}' is not a filter condition",
                    doc.name(node).unwrap_or_default()
                ))
            })?;

        match doc.local_name(node).unwrap_or_default() {
            "And" | "Or" => {
                let children = doc
                    .child_elements(node)
                    .map(|child| Self::from_element(doc, child))
                    .collect::<OwsResult<Vec<_>>>()?;
                if doc.local_name(node) == Some("And") {
                    Ok(SpatialFilter::And(children))
                } else {
                    Ok(SpatialFilter::Or(children))
                }
            }
            "Within" => read_within(doc, node, dialect).map(SpatialFilter::Within),
            other => Err(OwsError::InvalidXml(format!(
                "unsupported filter condition '{}'",
                other
            ))),
        }
    }

    /// Append this condition to `parent`. Returns the created element.
    pub fn write_into(
        &self,
        doc: &mut XmlDocument,
        parent: NodeId,
        dialect: FilterDialect,
    ) -> OwsResult<NodeId> {
        let ns = dialect.filter_namespace();
        let prefix = dialect.filter_prefix();
        let node = match self {
            SpatialFilter::And(children) | SpatialFilter::Or(children) => {
                let local = if matches!(self, SpatialFilter::And(_)) { "And" } else { "Or" };
                let node = append_element(doc, parent, ns, prefix, local)?;
                for child in children {
                    child.write_into(doc, node, dialect)?;
                }
                node
            }
            SpatialFilter::Within(within) => {
                let node = append_element(doc, parent, ns, prefix, "Within")?;
                let reference =
                    append_element(doc, node, ns, prefix, dialect.value_reference())?;
                let text = doc.create_text(&within.value_reference);
                doc.append_child(reference, text);
                write_polygon(doc, node, &within.polygon, dialect)?;
                node
            }
        };
        Ok(node)
    }

    /// Number of `Within` leaves.
    pub fn within_count(&self) -> usize {
        match self {
            SpatialFilter::Within(_) => 1,
            SpatialFilter::And(children) | SpatialFilter::Or(children) => {
                children.iter().map(Self::within_count).sum()
            }
        }
    }
}

/// Element for `namespace:local` created under `parent`, reusing a prefix
/// already bound in scope or declaring `default_prefix` on the new element.
pub(crate) fn new_element(
    doc: &mut XmlDocument,
    parent: NodeId,
    namespace: &str,
    default_prefix: &str,
    local: &str,
) -> OwsResult<NodeId> {
    let (name, declare) = match doc.lookup_prefix(parent, namespace) {
        Some(prefix) if prefix.is_empty() => (local.to_string(), None),
        Some(prefix) => (format!("{}:{}", prefix, local), None),
        None => (
            format!("{}:{}", default_prefix, local),
            Some(format!("xmlns:{}", default_prefix)),
        ),
    };
    let node = doc.create_element(&name);
    if let Some(declaration) = declare {
        doc.set_attribute(node, &declaration, namespace)
            .map_err(|e| OwsError::InternalError(e.to_string()))?;
    }
    Ok(node)
}

fn append_element(
    doc: &mut XmlDocument,
    parent: NodeId,
    namespace: &str,
    default_prefix: &str,
    local: &str,
) -> OwsResult<NodeId> {
    let node = new_element(doc, parent, namespace, default_prefix, local)?;
    doc.append_child(parent, node);
    Ok(node)
}

fn write_polygon(
    doc: &mut XmlDocument,
    parent: NodeId,
    polygon: &PolygonFilter,
    dialect: FilterDialect,
) -> OwsResult<()> {
    let gml = dialect.gml_namespace();
    let node = append_element(doc, parent, gml, "gml", "Polygon")?;
    if let Some(srid) = polygon.srid {
        doc.set_attribute(node, "srsName", &SrsName::epsg(srid).to_urn())
            .map_err(|e| OwsError::InternalError(e.to_string()))?;
    }

    write_ring(doc, node, gml, "exterior", &polygon.exterior)
}

fn write_ring(
    doc: &mut XmlDocument,
    polygon: NodeId,
    gml: &str,
    boundary: &str,
    points: &[(f64, f64)],
) -> OwsResult<()> {
    let boundary = append_element(doc, polygon, gml, "gml", boundary)?;
    let ring = append_element(doc, boundary, gml, "gml", "LinearRing")?;
    let pos_list = append_element(doc, ring, gml, "gml", "posList")?;
    let text = doc.create_text(&pos_list_text(points));
    doc.append_child(pos_list, text);
    Ok(())
}

/// "x1 y1 x2 y2 ..."
fn pos_list_text(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{} {}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn read_within(doc: &XmlDocument, node: NodeId, dialect: FilterDialect) -> OwsResult<WithinFilter> {
    let ns = Some(dialect.filter_namespace());
    let value_reference = doc
        .find_child(node, ns, dialect.value_reference())
        .map(|n| doc.text_content(n).trim().to_string())
        .ok_or_else(|| {
            OwsError::InvalidXml(format!("Within without {}", dialect.value_reference()))
        })?;

    let polygon = doc
        .child_elements(node)
        .find(|&c| doc.local_name(c) == Some("Polygon"))
        .ok_or_else(|| OwsError::InvalidXml("Within without gml:Polygon".to_string()))?;

    let srid = doc
        .attribute_local(polygon, "srsName")
        .and_then(|name| SrsName::parse(name).ok())
        .and_then(|name| name.srid());

    let exterior = match doc.child_elements(polygon).find(|&boundary| {
        matches!(doc.local_name(boundary), Some("exterior") | Some("outerBoundaryIs"))
    }) {
        Some(boundary) => read_ring(doc, boundary)?,
        None => Vec::new(),
    };

    Ok(WithinFilter {
        value_reference,
        polygon: PolygonFilter { srid, exterior },
    })
}

fn read_ring(doc: &XmlDocument, boundary: NodeId) -> OwsResult<Vec<(f64, f64)>> {
    let Some(pos_list) = doc
        .descendants(boundary)
        .into_iter()
        .find(|&n| doc.local_name(n) == Some("posList"))
    else {
        return Ok(Vec::new());
    };

    let numbers = doc
        .text_content(pos_list)
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| OwsError::InvalidXml(format!("invalid coordinate '{}'", v)))
        })
        .collect::<OwsResult<Vec<_>>>()?;
    if numbers.len() % 2 != 0 {
        return Err(OwsError::InvalidXml(
            "posList holds an odd number of values".to_string(),
        ));
    }
    Ok(numbers.chunks(2).map(|c| (c[0], c[1])).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;

    fn square(x: f64, y: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(x, y), (x + 1.0, y), (x + 1.0, y + 1.0), (x, y + 1.0), (x, y)]),
            Vec::new(),
        )
    }

    #[test]
    fn test_dialect_for_version() {
        assert_eq!(FilterDialect::for_wfs_version("2.0.0"), FilterDialect::Fes20);
        assert_eq!(FilterDialect::for_wfs_version("2.0.2"), FilterDialect::Fes20);
        assert_eq!(FilterDialect::for_wfs_version("1.1.0"), FilterDialect::Ogc11);
    }

    #[test]
    fn test_within_area_shapes() {
        let single = Geometry::polygon(square(0.0, 0.0), Some(4326));
        assert!(matches!(
            SpatialFilter::within_area("geom", &single).unwrap(),
            SpatialFilter::Within(_)
        ));

        let one_member = Geometry::multi_polygon(MultiPolygon::new(vec![square(0.0, 0.0)]), None);
        assert!(matches!(
            SpatialFilter::within_area("geom", &one_member).unwrap(),
            SpatialFilter::Within(_)
        ));

        let three = Geometry::multi_polygon(
            MultiPolygon::new(vec![square(0.0, 0.0), square(2.0, 2.0), square(4.0, 4.0)]),
            Some(25832),
        );
        let filter = SpatialFilter::within_area("geom", &three).unwrap();
        assert!(matches!(&filter, SpatialFilter::Or(children) if children.len() == 3));
        assert_eq!(filter.within_count(), 3);
    }

    #[test]
    fn test_point_is_rejected() {
        let point = Geometry::point(1.0, 2.0, Some(4326));
        assert!(matches!(
            SpatialFilter::within_area("geom", &point),
            Err(OwsError::Geometry(_))
        ));
        assert!(SpatialFilter::within_area("geom", &Geometry::empty_polygon()).is_err());
    }

    #[test]
    fn test_write_then_read() {
        let mut polygon = square(7.0, 50.0);
        polygon.interiors_push(LineString::from(vec![
            (7.2, 50.2),
            (7.4, 50.2),
            (7.4, 50.4),
            (7.2, 50.2),
        ]));
        let filter =
            SpatialFilter::within_area("the_geom", &Geometry::polygon(polygon, Some(4326)))
                .unwrap();

        let mut doc = XmlDocument::parse(
            r#"<fes:Filter xmlns:fes="http://www.opengis.net/fes/2.0"/>"#,
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        let node = filter.write_into(&mut doc, root, FilterDialect::Fes20).unwrap();

        let xml = doc.to_xml().unwrap();
        assert!(xml.contains("<fes:Within>"));
        assert!(xml.contains("<fes:ValueReference>the_geom</fes:ValueReference>"));
        assert!(xml.contains(r#"xmlns:gml="http://www.opengis.net/gml/3.2""#));
        assert!(xml.contains(r#"srsName="urn:x-ogc:def:crs:EPSG:4326""#));
        assert!(xml.contains("<gml:posList>7 50 8 50 8 51 7 51 7 50</gml:posList>"));
        // The hole is not part of the filter.
        assert!(!xml.contains("interior"));
        assert_eq!(xml.matches("<gml:posList>").count(), 1);

        assert_eq!(SpatialFilter::from_element(&doc, node).unwrap(), filter);
    }

    #[test]
    fn test_ogc_dialect_uses_property_name() {
        let filter =
            SpatialFilter::within_area("geom", &Geometry::polygon(square(0.0, 0.0), None)).unwrap();
        let mut doc =
            XmlDocument::parse(r#"<ogc:Filter xmlns:ogc="http://www.opengis.net/ogc"/>"#).unwrap();
        let root = doc.root_element().unwrap();
        filter.write_into(&mut doc, root, FilterDialect::Ogc11).unwrap();

        let xml = doc.to_xml().unwrap();
        assert!(xml.contains("<ogc:PropertyName>geom</ogc:PropertyName>"));
        assert!(xml.contains(r#"xmlns:gml="http://www.opengis.net/gml""#));
        // No srid, no srsName.
        assert!(!xml.contains("srsName"));
    }

    #[test]
    fn test_unknown_condition_is_error() {
        let doc = XmlDocument::parse(
            r#"<fes:PropertyIsEqualTo xmlns:fes="http://www.opengis.net/fes/2.0"/>"#,
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        assert!(SpatialFilter::from_element(&doc, root).is_err());
    }
}
