//! Content-type and component schema definitions
//!
//! This crate holds the static data model of the content entity engine:
//!
//! - **Attributes** (`attribute`): a closed tagged union over scalar, media,
//!   relation, component and dynamic-zone attribute kinds, so every schema
//!   consumer dispatches exhaustively.
//! - **Models** (`model`): content-type and component definitions, immutable
//!   after load.
//! - **Registry** (`registry`): the lookup interface the engine uses to
//!   resolve uids, plus private-attribute sanitization applied before any
//!   entity leaves the engine through an event.
//!
//! Schemas serialize to and from JSON, so a host platform can load them from
//! schema files without touching Rust code.

pub mod attribute;
pub mod model;
pub mod registry;

pub use attribute::{
    Attribute, ComponentAttribute, DynamicZoneAttribute, MediaAttribute, RelationAttribute,
    RelationKind, ScalarAttribute, ScalarKind,
};
pub use model::{Model, ModelInfo, ModelKind, ModelOptions};
pub use registry::{sanitize_entity, InMemoryRegistry, ModelRegistry, SchemaError, SchemaResult};

/// Fixed uid of the upload-file content type every media attribute targets
pub const UPLOAD_FILE_UID: &str = "plugin::upload.file";
