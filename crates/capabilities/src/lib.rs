//! Capabilities document mapping.
//!
//! Parses WMS 1.1.1 / 1.3.0, WFS 2.0.0 / 2.0.2 and CSW 2.0.2 capabilities
//! documents into [`Record`] trees driven by declarative XPath tables, and
//! projects (possibly edited) records back onto the source document.
//!
//! ```text
//! XmlDocument --Mapper--> Record --(edit, camouflage)--> Projector --> XmlDocument
//!        \______________ SchemaMapping (per service/version) ______________/
//! ```

pub mod camouflage;
pub mod mapper;
pub mod mapping;
pub mod models;
pub mod parsers;
pub mod projector;
pub mod record;
mod tables;

pub use camouflage::{camouflage, camouflage_operation_urls, render_camouflaged};
pub use mapper::Mapper;
pub use mapping::{
    detect, schema_mapping, FieldMapping, FieldSpec, LeafKind, NestedMapping, SchemaMapping,
    ServiceType,
};
pub use models::{model_schema, ModelSchema};
pub use parsers::{ParseValueError, ParserKind, ReverseParserKind};
pub use projector::Projector;
pub use record::{ParentLink, Record, Value};
