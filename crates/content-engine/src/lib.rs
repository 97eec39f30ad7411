//! Schema-driven content entity engine
//!
//! Orchestrates the write path for dynamically defined content types:
//! payload validation against the model schema, batched existence checks
//! for referenced relations, recursive persistence of nested components and
//! dynamic zones, and a decoratable CRUD service on top.
//!
//! The engine owns none of its infrastructure. Schemas come from a
//! [`content_schema::ModelRegistry`], rows go through a
//! [`content_store::Database`], and lifecycle events leave through a
//! [`content_store::EventHub`]; all three are handed in through an
//! [`EngineContext`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use content_engine::{EngineContext, EntityService, WriteParams};
//! use content_schema::{Attribute, InMemoryRegistry, Model};
//! use content_store::{MemoryDatabase, MemoryEventHub};
//! use serde_json::json;
//!
//! # async fn demo() -> content_engine::Result<()> {
//! let registry = InMemoryRegistry::from_models([
//!     Model::collection("api::article.article", "Article")
//!         .attribute("title", Attribute::string().required()),
//! ]);
//! let ctx = EngineContext::new(
//!     Arc::new(registry),
//!     Arc::new(MemoryDatabase::new()),
//!     Arc::new(MemoryEventHub::new()),
//! );
//! let service = EntityService::new(ctx);
//! let entry = service
//!     .create("api::article.article", WriteParams::from_data(json!({"title": "hi"})))
//!     .await?;
//! assert_eq!(entry["title"], "hi");
//! # Ok(())
//! # }
//! ```

pub mod components;
pub mod context;
pub mod error;
pub mod relations;
pub mod service;
pub mod validator;

pub use components::{
    clone_components, create_components, delete_components, resolve_component_write_concurrency,
    update_components,
};
pub use context::EngineContext;
pub use error::{EntityError, Result, ValidationFailure};
pub use relations::{build_relations_store, check_relations_exist, RelationRef, RelationStore};
pub use service::{
    EntityService, FindParams, MethodTable, MethodTablePatch, Page, PageParams, Pagination,
    WriteParams,
};
pub use validator::{validate_entity, ValidatorMode, ValidatorOptions};
