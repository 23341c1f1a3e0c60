//! Common types and utilities shared across the OWS security core.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod geometry;

pub use bbox::BoundingBox;
pub use crs::{AxisOrder, SrsName};
pub use error::{OwsError, OwsResult};
pub use geometry::{Geometry, GeometryKind};
