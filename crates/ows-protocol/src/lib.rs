//! OGC request handling for the security proxy.
//!
//! Supports:
//! - Classification of WMS, WFS and CSW requests (KVP and XML bindings)
//! - Allowed-area injection into WFS 1.x (OGC Filter 1.1) and WFS 2.0
//!   (FES 2.0) GetFeature and Transaction filters
//! - OWS 1.1 exception reports

pub mod exceptions;
pub mod filter;
pub mod injector;
pub mod namespaces;
pub mod request;
pub mod wfs;

pub use exceptions::{ExceptionReport, OwsException};
pub use filter::{FilterDialect, PolygonFilter, SpatialFilter, WithinFilter};
pub use injector::secure_spatial;
pub use request::OgcRequest;
pub use wfs::{GetFeatureRequest, TransactionAction, TransactionOperation, TransactionRequest};
