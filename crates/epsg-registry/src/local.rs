//! Lookups in the bundled EPSG definition table.

use tracing::debug;

use crate::spatial_reference::{CrsKind, Origin, SpatialReference};

/// Resolve an SRID without network access.
///
/// The WKT of the bundled definition is used when it parses; otherwise the
/// proj4 string decides between geographic and projected. SRIDs missing from
/// the table resolve to [`CrsKind::Unknown`].
pub fn lookup(srid: u32) -> SpatialReference {
    let Some(def) = u16::try_from(srid).ok().and_then(crs_definitions::from_code) else {
        debug!(srid = srid, "SRID not in local EPSG table");
        return SpatialReference::unknown(srid, Origin::FromLocalLibrary);
    };

    match SpatialReference::from_wkt(srid, def.wkt, Origin::FromLocalLibrary) {
        Ok(reference) if reference.kind != CrsKind::Other => reference,
        _ => {
            let kind = kind_from_proj4(def.proj4);
            debug!(srid = srid, kind = ?kind, "Resolved SRID from proj4 definition");
            SpatialReference {
                srid,
                origin: Origin::FromLocalLibrary,
                wkt: Some(def.wkt.to_string()),
                kind,
                axes: Vec::new(),
            }
        }
    }
}

fn kind_from_proj4(proj4: &str) -> CrsKind {
    if proj4.contains("+proj=longlat") || proj4.contains("+proj=latlong") {
        CrsKind::Geographic
    } else if proj4.contains("+proj=geocent") {
        CrsKind::Other
    } else if proj4.contains("+proj=") {
        CrsKind::Projected
    } else {
        CrsKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_is_yx() {
        let reference = lookup(4326);
        assert_eq!(reference.origin, Origin::FromLocalLibrary);
        assert_eq!(reference.kind, CrsKind::Geographic);
        assert_eq!(reference.is_yx_order(), Some(true));
    }

    #[test]
    fn test_utm_is_xy() {
        let reference = lookup(25832);
        assert_eq!(reference.kind, CrsKind::Projected);
        assert_eq!(reference.is_yx_order(), Some(false));
    }

    #[test]
    fn test_unknown_srid() {
        assert_eq!(lookup(999_999).kind, CrsKind::Unknown);
        assert_eq!(lookup(999_999).is_yx_order(), None);
    }

    #[test]
    fn test_kind_from_proj4() {
        assert_eq!(kind_from_proj4("+proj=longlat +datum=WGS84 +no_defs"), CrsKind::Geographic);
        assert_eq!(kind_from_proj4("+proj=utm +zone=32 +ellps=GRS80"), CrsKind::Projected);
        assert_eq!(kind_from_proj4(""), CrsKind::Unknown);
    }
}
