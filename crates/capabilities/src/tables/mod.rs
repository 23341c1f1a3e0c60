//! Mapping tables, one module per capabilities dialect.

pub(crate) mod csw202;
pub(crate) mod wfs200;
pub(crate) mod wms111;
pub(crate) mod wms130;
