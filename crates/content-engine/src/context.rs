//! Engine context
//!
//! Every operation receives its collaborators through an explicit context
//! object threaded down the recursive calls. There is no global registry
//! access anywhere in the engine, which keeps every piece unit-testable
//! against in-memory collaborators.

use std::sync::Arc;

use content_schema::{Model, ModelRegistry};
use content_store::{Database, EventHub, FileUploadService};

use crate::error::Result;

/// Collaborators of the entity engine
#[derive(Clone)]
pub struct EngineContext {
    /// Resolves content types and components by uid
    pub models: Arc<dyn ModelRegistry>,
    /// Storage backend, accessed per uid
    pub db: Arc<dyn Database>,
    /// Lifecycle-event channel
    pub events: Arc<dyn EventHub>,
    /// Optional file-linking collaborator
    pub uploads: Option<Arc<dyn FileUploadService>>,
}

impl EngineContext {
    pub fn new(
        models: Arc<dyn ModelRegistry>,
        db: Arc<dyn Database>,
        events: Arc<dyn EventHub>,
    ) -> Self {
        Self {
            models,
            db,
            events,
            uploads: None,
        }
    }

    /// Attach a file upload collaborator
    pub fn with_uploads(mut self, uploads: Arc<dyn FileUploadService>) -> Self {
        self.uploads = Some(uploads);
        self
    }

    /// Resolve a model by uid, failing on unknown uids
    pub fn model(&self, uid: &str) -> Result<&Model> {
        Ok(self.models.resolve(uid)?)
    }
}
