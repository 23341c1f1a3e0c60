//! Documents and areas shared by the capabilities, protocol and CLI tests.
//!
//! Every document lives in `testdata/` and is compiled in, so tests never
//! depend on the working directory.

use std::io::Write;

use tempfile::NamedTempFile;

/// Capabilities documents, one per supported dialect.
pub mod capabilities {
    /// WMS 1.3.0 with a root layer `world` and children `roads`, `rivers`.
    pub const WMS_130: &str = include_str!("../testdata/wms_130_capabilities.xml");

    /// WMS 1.1.1 with a root layer `basemap` and child `buildings`.
    pub const WMS_111: &str = include_str!("../testdata/wms_111_capabilities.xml");

    /// WFS 2.0.0 with feature types `cadastre:parcel` and `cadastre:building`.
    pub const WFS_200: &str = include_str!("../testdata/wfs_200_capabilities.xml");

    /// CSW 2.0.2 with a single `GetRecords` operation.
    pub const CSW_202: &str = include_str!("../testdata/csw_202_capabilities.xml");

    /// Endpoint every fixture advertises for its operations.
    pub const INTERNAL_HOST: &str = "internal.example";
}

/// WFS 2.0 request bodies.
pub mod requests {
    /// GetFeature without a filter but with a `SortBy`.
    pub const GET_FEATURE_NO_FILTER: &str = include_str!("../testdata/get_feature_no_filter.xml");

    /// GetFeature whose filter root is an `And` with two conditions.
    pub const GET_FEATURE_AND_FILTER: &str =
        include_str!("../testdata/get_feature_and_filter.xml");

    /// GetFeature with a single-condition filter followed by `SortBy`, plus a
    /// second query without a filter.
    pub const GET_FEATURE_SIMPLE_FILTER: &str =
        include_str!("../testdata/get_feature_simple_filter.xml");

    /// Transaction with one Insert, one Update (filtered) and one Delete
    /// (unfiltered).
    pub const TRANSACTION: &str = include_str!("../testdata/transaction.xml");
}

/// Allowed areas used by the filter tests, as GeoJSON.
pub mod areas {
    /// Small square around Bonn, lon/lat.
    pub const BONN_SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[7.0,50.7],[7.2,50.7],[7.2,50.8],[7.0,50.8],[7.0,50.7]]]}"#;

    /// Two disjoint squares.
    pub const TWO_SQUARES: &str = r#"{"type":"MultiPolygon","coordinates":[[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]],[[[5.0,5.0],[6.0,5.0],[6.0,6.0],[5.0,6.0],[5.0,5.0]]]]}"#;

    /// A point; not a valid allowed area.
    pub const POINT: &str = r#"{"type":"Point","coordinates":[7.1,50.75]}"#;
}

/// Write `contents` to a temporary file that is removed on drop.
pub fn temp_fixture(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp fixture");
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_xml() {
        for doc in [
            capabilities::WMS_130,
            capabilities::WMS_111,
            capabilities::WFS_200,
            capabilities::CSW_202,
            requests::GET_FEATURE_NO_FILTER,
            requests::TRANSACTION,
        ] {
            assert!(doc.starts_with("<?xml"));
        }
    }

    #[test]
    fn test_temp_fixture_round_trip() {
        let file = temp_fixture("<a/>");
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "<a/>");
    }
}
