//! Namespace URIs of the OGC request dialects.

pub const WFS_20: &str = "http://www.opengis.net/wfs/2.0";
pub const WFS_1: &str = "http://www.opengis.net/wfs";
pub const FES_20: &str = "http://www.opengis.net/fes/2.0";
pub const OGC: &str = "http://www.opengis.net/ogc";
pub const GML_32: &str = "http://www.opengis.net/gml/3.2";
pub const GML: &str = "http://www.opengis.net/gml";
pub const OWS_11: &str = "http://www.opengis.net/ows/1.1";
pub const CSW_202: &str = "http://www.opengis.net/cat/csw/2.0.2";
