//! Geometry axis-order correction.

use tracing::debug;

use ows_common::Geometry;

use crate::Registry;

/// Swap every coordinate pair when the geometry's SRID lists latitude or
/// northing first.
///
/// Geometries without SRID, or whose SRID is xy or unknown, come back as an
/// unchanged copy. Applying this twice yields the input.
pub async fn adjust_axis_order(registry: &Registry, geometry: &Geometry) -> Geometry {
    let Some(srid) = geometry.srid else {
        return geometry.clone();
    };

    let reference = registry.get(srid).await;
    if reference.is_yx_order() == Some(true) {
        debug!(srid = srid, origin = %reference.origin, "Swapping geometry axes");
        swap_axes(geometry)
    } else {
        geometry.clone()
    }
}

/// Unconditional x/y swap for callers that already know the axis order.
pub fn swap_axes(geometry: &Geometry) -> Geometry {
    geometry.swapped_axes()
}
