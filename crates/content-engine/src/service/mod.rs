//! Entity service
//!
//! The service front-end dispatches every verb through an explicit
//! [`MethodTable`] of boxed handlers. Plugins replace or wrap individual
//! entries with [`EntityService::decorate`]; everything not patched keeps
//! the default behavior. Handlers receive the engine context by value, so a
//! decorated handler can call any default or any previously installed
//! handler it captured.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{json, Value};

use content_schema::{sanitize_entity, Model};
use content_store::{ENTRY_CREATE, ENTRY_DELETE, ENTRY_UPDATE};

use crate::components;
use crate::context::EngineContext;
use crate::error::{EntityError, Result};
use crate::validator::{validate_entity, ValidatorMode, ValidatorOptions};

pub mod params;

pub use params::{parse_sort, FindParams, Page, PageParams, Pagination, WriteParams};

pub type FindOneFn =
    Arc<dyn Fn(EngineContext, String, i64) -> BoxFuture<'static, Result<Option<Value>>> + Send + Sync>;
pub type FindManyFn =
    Arc<dyn Fn(EngineContext, String, FindParams) -> BoxFuture<'static, Result<Vec<Value>>> + Send + Sync>;
pub type FindPageFn =
    Arc<dyn Fn(EngineContext, String, PageParams) -> BoxFuture<'static, Result<Page>> + Send + Sync>;
pub type CountFn =
    Arc<dyn Fn(EngineContext, String, Option<Value>) -> BoxFuture<'static, Result<u64>> + Send + Sync>;
pub type CreateFn =
    Arc<dyn Fn(EngineContext, String, WriteParams) -> BoxFuture<'static, Result<Value>> + Send + Sync>;
pub type UpdateFn = Arc<
    dyn Fn(EngineContext, String, i64, WriteParams) -> BoxFuture<'static, Result<Option<Value>>>
        + Send
        + Sync,
>;
pub type DeleteFn =
    Arc<dyn Fn(EngineContext, String, i64) -> BoxFuture<'static, Result<Option<Value>>> + Send + Sync>;

/// The full set of verb handlers behind an [`EntityService`]
#[derive(Clone)]
pub struct MethodTable {
    pub find_one: FindOneFn,
    pub find_many: FindManyFn,
    pub find_page: FindPageFn,
    pub count: CountFn,
    pub create: CreateFn,
    pub update: UpdateFn,
    pub delete: DeleteFn,
}

impl MethodTable {
    /// Table of default handlers
    pub fn new() -> Self {
        Self {
            find_one: Arc::new(|ctx, uid, id| {
                Box::pin(async move { default_find_one(&ctx, &uid, id).await })
            }),
            find_many: Arc::new(|ctx, uid, params| {
                Box::pin(async move { default_find_many(&ctx, &uid, params).await })
            }),
            find_page: Arc::new(|ctx, uid, params| {
                Box::pin(async move { default_find_page(&ctx, &uid, params).await })
            }),
            count: Arc::new(|ctx, uid, filters| {
                Box::pin(async move { default_count(&ctx, &uid, filters).await })
            }),
            create: Arc::new(|ctx, uid, params| {
                Box::pin(async move { default_create(&ctx, &uid, params).await })
            }),
            update: Arc::new(|ctx, uid, id, params| {
                Box::pin(async move { default_update(&ctx, &uid, id, params).await })
            }),
            delete: Arc::new(|ctx, uid, id| {
                Box::pin(async move { default_delete(&ctx, &uid, id).await })
            }),
        }
    }

    /// Overlay the populated entries of `patch` onto this table
    pub fn apply(mut self, patch: MethodTablePatch) -> Self {
        if let Some(handler) = patch.find_one {
            self.find_one = handler;
        }
        if let Some(handler) = patch.find_many {
            self.find_many = handler;
        }
        if let Some(handler) = patch.find_page {
            self.find_page = handler;
        }
        if let Some(handler) = patch.count {
            self.count = handler;
        }
        if let Some(handler) = patch.create {
            self.create = handler;
        }
        if let Some(handler) = patch.update {
            self.update = handler;
        }
        if let Some(handler) = patch.delete {
            self.delete = handler;
        }
        self
    }
}

impl Default for MethodTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A partial method table produced by a decorator; `None` keeps the
/// current handler
#[derive(Clone, Default)]
pub struct MethodTablePatch {
    pub find_one: Option<FindOneFn>,
    pub find_many: Option<FindManyFn>,
    pub find_page: Option<FindPageFn>,
    pub count: Option<CountFn>,
    pub create: Option<CreateFn>,
    pub update: Option<UpdateFn>,
    pub delete: Option<DeleteFn>,
}

impl MethodTablePatch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Uid-agnostic CRUD front-end over the entity engine
#[derive(Clone)]
pub struct EntityService {
    ctx: EngineContext,
    table: MethodTable,
}

impl EntityService {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            ctx,
            table: MethodTable::new(),
        }
    }

    /// Apply a decorator. The decorator sees the current table, so a patch
    /// handler can capture and call through to the handler it replaces.
    /// Later decorations see the already-decorated table.
    pub fn decorate(mut self, decorator: impl FnOnce(&MethodTable) -> MethodTablePatch) -> Self {
        let patch = decorator(&self.table);
        self.table = self.table.clone().apply(patch);
        self
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub async fn find_one(&self, uid: &str, id: i64) -> Result<Option<Value>> {
        (self.table.find_one)(self.ctx.clone(), uid.to_string(), id).await
    }

    pub async fn find_many(&self, uid: &str, params: FindParams) -> Result<Vec<Value>> {
        (self.table.find_many)(self.ctx.clone(), uid.to_string(), params).await
    }

    pub async fn find_page(&self, uid: &str, params: PageParams) -> Result<Page> {
        (self.table.find_page)(self.ctx.clone(), uid.to_string(), params).await
    }

    pub async fn count(&self, uid: &str, filters: Option<Value>) -> Result<u64> {
        (self.table.count)(self.ctx.clone(), uid.to_string(), filters).await
    }

    pub async fn create(&self, uid: &str, params: WriteParams) -> Result<Value> {
        (self.table.create)(self.ctx.clone(), uid.to_string(), params).await
    }

    pub async fn update(&self, uid: &str, id: i64, params: WriteParams) -> Result<Option<Value>> {
        (self.table.update)(self.ctx.clone(), uid.to_string(), id, params).await
    }

    pub async fn delete(&self, uid: &str, id: i64) -> Result<Option<Value>> {
        (self.table.delete)(self.ctx.clone(), uid.to_string(), id).await
    }
}

/// Drafts are entries of a draft-and-publish type with no publication
/// timestamp yet
fn is_draft(model: &Model, data: &Value) -> bool {
    model.options.draft_and_publish && data.get("publishedAt").map_or(true, Value::is_null)
}

async fn default_find_one(ctx: &EngineContext, uid: &str, id: i64) -> Result<Option<Value>> {
    let model = ctx.model(uid)?;
    let entity = ctx.db.query(uid).find_one(&json!({"id": id})).await?;
    Ok(entity.map(|entity| sanitize_entity(ctx.models.as_ref(), model, &entity)))
}

async fn default_find_many(ctx: &EngineContext, uid: &str, params: FindParams) -> Result<Vec<Value>> {
    let model = ctx.model(uid)?;
    let rows = ctx.db.query(uid).find_many(&params.to_query()).await?;
    Ok(rows
        .iter()
        .map(|row| sanitize_entity(ctx.models.as_ref(), model, row))
        .collect())
}

async fn default_find_page(ctx: &EngineContext, uid: &str, params: PageParams) -> Result<Page> {
    let model = ctx.model(uid)?;
    let repo = ctx.db.query(uid);
    let (page, page_size) = params.normalize();

    let filters = params.filters.clone().unwrap_or_else(|| json!({}));
    let total = repo.count(&filters).await?;
    let rows = repo.find_many(&params.to_query()).await?;

    Ok(Page {
        results: rows
            .iter()
            .map(|row| sanitize_entity(ctx.models.as_ref(), model, row))
            .collect(),
        pagination: Pagination {
            page,
            page_size,
            page_count: total.div_ceil(page_size),
            total,
        },
    })
}

async fn default_count(ctx: &EngineContext, uid: &str, filters: Option<Value>) -> Result<u64> {
    ctx.model(uid)?;
    let filters = filters.unwrap_or_else(|| json!({}));
    Ok(ctx.db.query(uid).count(&filters).await?)
}

async fn default_create(ctx: &EngineContext, uid: &str, params: WriteParams) -> Result<Value> {
    let model = ctx.model(uid)?;
    tracing::debug!(uid, "creating entry");

    let options = ValidatorOptions {
        is_draft: is_draft(model, &params.data),
    };
    let validated = validate_entity(ctx, ValidatorMode::Creation, model, &params.data, options).await?;
    let Value::Object(mut data) = validated else {
        return Err(EntityError::invalid_payload(model.display_name()));
    };
    // publishedAt is lifecycle state, not a schema attribute, so the
    // validator drops it; carry it over from the raw payload
    if model.options.draft_and_publish {
        let published_at = params.data.get("publishedAt").cloned().unwrap_or(Value::Null);
        data.insert("publishedAt".to_string(), published_at);
    }

    components::create_components(ctx, uid, &mut data).await?;
    let repo = ctx.db.query(uid);
    let mut entity = repo.create(Value::Object(data)).await?;

    entity = link_files(ctx, uid, entity, params.files.as_ref()).await?;

    let sanitized = sanitize_entity(ctx.models.as_ref(), model, &entity);
    ctx.events
        .emit(ENTRY_CREATE, json!({"model": uid, "entry": sanitized}))
        .await?;
    Ok(sanitized)
}

async fn default_update(
    ctx: &EngineContext,
    uid: &str,
    id: i64,
    params: WriteParams,
) -> Result<Option<Value>> {
    let model = ctx.model(uid)?;
    let repo = ctx.db.query(uid);
    let Some(existing) = repo.find_one(&json!({"id": id})).await? else {
        return Ok(None);
    };
    tracing::debug!(uid, id, "updating entry");

    // Publishing in the same call validates at published strictness
    let publication_state = if params.data.get("publishedAt").is_some() {
        &params.data
    } else {
        &existing
    };
    let options = ValidatorOptions {
        is_draft: is_draft(model, publication_state),
    };
    let validated = validate_entity(ctx, ValidatorMode::Update, model, &params.data, options).await?;
    let Value::Object(mut data) = validated else {
        return Err(EntityError::invalid_payload(model.display_name()));
    };
    if model.options.draft_and_publish {
        if let Some(published_at) = params.data.get("publishedAt") {
            data.insert("publishedAt".to_string(), published_at.clone());
        }
    }

    components::update_components(ctx, uid, &existing, &mut data).await?;
    let updated = repo.update(&json!({"id": id}), Value::Object(data)).await?;
    let Some(entity) = updated else {
        // Row disappeared between the read and the write
        return Ok(None);
    };

    let entity = link_files(ctx, uid, entity, params.files.as_ref()).await?;

    let sanitized = sanitize_entity(ctx.models.as_ref(), model, &entity);
    ctx.events
        .emit(ENTRY_UPDATE, json!({"model": uid, "entry": sanitized}))
        .await?;
    Ok(Some(sanitized))
}

async fn default_delete(ctx: &EngineContext, uid: &str, id: i64) -> Result<Option<Value>> {
    let model = ctx.model(uid)?;
    let repo = ctx.db.query(uid);
    let Some(entity) = repo.find_one(&json!({"id": id})).await? else {
        return Ok(None);
    };
    tracing::debug!(uid, id, "deleting entry");

    // Owned component rows go first, then the root row
    components::delete_components(ctx, uid, &entity).await?;
    repo.delete(&json!({"id": id})).await?;

    let sanitized = sanitize_entity(ctx.models.as_ref(), model, &entity);
    ctx.events
        .emit(ENTRY_DELETE, json!({"model": uid, "entry": sanitized}))
        .await?;
    Ok(Some(sanitized))
}

/// Hand the files map to the upload collaborator and re-fetch the entity so
/// the result reflects the linked files. A no-op without both a collaborator
/// and a files map.
async fn link_files(
    ctx: &EngineContext,
    uid: &str,
    entity: Value,
    files: Option<&Value>,
) -> Result<Value> {
    let (Some(uploads), Some(files)) = (&ctx.uploads, files) else {
        return Ok(entity);
    };
    uploads.upload_files(uid, &entity, files).await?;

    let id = entity.get("id").cloned().unwrap_or(Value::Null);
    let refetched = ctx.db.query(uid).find_one(&json!({"id": id})).await?;
    Ok(refetched.unwrap_or(entity))
}
