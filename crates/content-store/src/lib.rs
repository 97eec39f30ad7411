//! Storage and side-channel collaborator contracts
//!
//! The content entity engine never owns persistence. This crate defines the
//! narrow interfaces it goes through instead:
//!
//! - [`Database`] / [`QueryRepo`]: per-uid query access with dialect and
//!   transaction introspection.
//! - [`EventHub`]: lifecycle-event emission after completed writes.
//! - [`FileUploadService`]: file linking invoked after root-row writes.
//!
//! It also ships in-memory reference implementations ([`MemoryDatabase`],
//! [`MemoryEventHub`], [`MemoryUploadService`]) that back the engine's test
//! suites; a production host wires real implementations instead.

pub mod database;
pub mod error;
pub mod events;
pub mod memory;
pub mod uploads;

pub use database::{Database, Dialect, QueryParams, QueryRepo, SortOrder};
pub use error::{StoreError, StoreResult};
pub use events::{EmittedEvent, EventHub, MemoryEventHub, ENTRY_CREATE, ENTRY_DELETE, ENTRY_UPDATE};
pub use memory::MemoryDatabase;
pub use uploads::{FileUploadService, MemoryUploadService, UploadCall};
