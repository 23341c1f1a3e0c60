//! EPSG axis-order registry.
//!
//! Resolves an EPSG SRID to a [`SpatialReference`] that knows whether the
//! CRS lists latitude/northing first. Lookups go to the cache, then the EPSG
//! API, then the local EPSG definition table, and never fail.
//!
//! [`adjust_axis_order`] uses the registry to bring a geometry into the
//! axis order its SRID prescribes.

pub mod config;
pub mod corrector;
pub mod local;
pub mod registry;
pub mod source;
pub mod spatial_reference;
pub mod wkt;

pub use config::RegistryConfig;
pub use corrector::{adjust_axis_order, swap_axes};
pub use registry::Registry;
pub use source::{EpsgApiClient, EpsgSource, RemoteLookupError};
pub use spatial_reference::{Axis, AxisDirection, CrsKind, Origin, SpatialReference};
pub use wkt::{WktError, WktNode, WktValue};
