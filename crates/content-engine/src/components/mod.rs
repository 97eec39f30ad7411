//! Recursive component persistence
//!
//! Components are persisted as their own rows and linked to the parent
//! through a pivot substituted into the parent payload in place of the raw
//! nested data. Because components nest, every operation here recurses
//! uid-by-uid, children before parent pivots.
//!
//! None of these operations run inside a transaction unless the storage
//! collaborator provides one externally: a failure mid-way can leave
//! already-written component rows behind. That is the inherited contract of
//! this layer, not something it papers over.

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use serde_json::{json, Map, Value};

use content_schema::Attribute;
use content_store::{Dialect, StoreError};

use crate::context::EngineContext;
use crate::error::{EntityError, Result};

/// Pick the fan-out cap for sibling component writes.
///
/// Concurrent inserts into the shared component join tables can deadlock on
/// MySQL/MariaDB when the writes are not wrapped in a transaction, so the
/// fan-out drops to serial there. Everything else runs unbounded.
pub fn resolve_component_write_concurrency(dialect: &Dialect, in_transaction: bool) -> usize {
    match dialect {
        Dialect::MySql | Dialect::MariaDb if !in_transaction => 1,
        _ => usize::MAX,
    }
}

fn write_concurrency(ctx: &EngineContext) -> usize {
    resolve_component_write_concurrency(&ctx.db.dialect(), ctx.db.in_transaction())
}

/// Ordered, concurrency-limited map over independent component values
async fn map_limited<T, R, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Result<Vec<R>>
where
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = Result<R>>,
{
    let limit = limit.clamp(1, items.len().max(1));
    stream::iter(items.into_iter().map(f))
        .buffered(limit)
        .try_collect()
        .await
}

fn row_id(row: &Value) -> Result<Value> {
    row.get("id")
        .cloned()
        .ok_or_else(|| StoreError::backend("storage returned a row without an id").into())
}

fn component_pivot(id: Value, field: &str, component_uid: &str) -> Value {
    json!({
        "id": id,
        "__pivot": { "field": field, "component_type": component_uid }
    })
}

fn zone_pivot(id: Value, field: &str, component_uid: &str) -> Value {
    json!({
        "id": id,
        "__component": component_uid,
        "__pivot": { "field": field }
    })
}

fn zone_entry_uid(attribute: &str, item: &Value) -> Result<String> {
    item.get("__component")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| EntityError::MissingComponentTag {
            attribute: attribute.to_string(),
        })
}

/// Create every component value in `data`, replacing the raw nested data
/// with pivots before the parent row is written.
pub async fn create_components(
    ctx: &EngineContext,
    uid: &str,
    data: &mut Map<String, Value>,
) -> Result<()> {
    let model = ctx.model(uid)?;
    let limit = write_concurrency(ctx);

    for (name, attribute) in &model.attributes {
        let Some(value) = data.remove(name.as_str()) else {
            continue;
        };
        let pivot_value = persist_fresh_value(ctx, limit, name, attribute, value).await?;
        data.insert(name.clone(), pivot_value);
    }
    Ok(())
}

/// Persist one attribute's worth of fresh component values, returning the
/// pivot value to substitute into the parent payload. Non component-bearing
/// attributes pass through untouched.
async fn persist_fresh_value(
    ctx: &EngineContext,
    limit: usize,
    name: &str,
    attribute: &Attribute,
    value: Value,
) -> Result<Value> {
    match attribute {
        Attribute::Component(attr) if attr.repeatable => {
            let items = match value {
                // A nil array is "no value"
                Value::Null => return Ok(Value::Null),
                Value::Array(items) => items,
                _ => {
                    return Err(EntityError::ExpectedArray {
                        attribute: name.to_string(),
                    })
                }
            };
            let pivots = map_limited(items, limit, |item| async move {
                let row = create_component(ctx, &attr.component, item).await?;
                Ok(component_pivot(row_id(&row)?, name, &attr.component))
            })
            .await?;
            Ok(Value::Array(pivots))
        }

        Attribute::Component(attr) => match value {
            // A nil single component is "no value"
            Value::Null => Ok(Value::Null),
            Value::Object(_) => {
                let row = create_component(ctx, &attr.component, value).await?;
                Ok(component_pivot(row_id(&row)?, name, &attr.component))
            }
            _ => Err(EntityError::ExpectedObject {
                attribute: name.to_string(),
            }),
        },

        Attribute::DynamicZone(_) => {
            let items = match value {
                Value::Null => return Ok(Value::Null),
                Value::Array(items) => items,
                _ => {
                    return Err(EntityError::ExpectedArray {
                        attribute: name.to_string(),
                    })
                }
            };
            let pivots = map_limited(items, limit, |item| async move {
                let item_uid = zone_entry_uid(name, &item)?;
                let row = create_component(ctx, &item_uid, item).await?;
                Ok(zone_pivot(row_id(&row)?, name, &item_uid))
            })
            .await?;
            Ok(Value::Array(pivots))
        }

        Attribute::Scalar(_) | Attribute::Media(_) | Attribute::Relation(_) => Ok(value),
    }
}

/// Create one component row, recursing into its own nested components first
fn create_component<'a>(
    ctx: &'a EngineContext,
    uid: &'a str,
    value: Value,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        let Value::Object(mut map) = value else {
            return Err(EntityError::ExpectedObject {
                attribute: uid.to_string(),
            });
        };
        // New rows are never client-assigned; the zone tag lives in the
        // pivot, not the row
        map.remove("id");
        map.remove("__component");

        create_components(ctx, uid, &mut map).await?;
        Ok(ctx.db.query(uid).create(Value::Object(map)).await?)
    }
    .boxed()
}

/// Update the component values of an already-persisted entity.
///
/// For every touched attribute the previously linked rows are loaded first;
/// incoming ids that are not among them fail with a referential-integrity
/// error before anything is written. Rows no longer referenced are orphans
/// and are deleted recursively, then each surviving or new value is updated
/// or created and re-assembled into pivots exactly as on create.
pub async fn update_components(
    ctx: &EngineContext,
    uid: &str,
    entity: &Value,
    data: &mut Map<String, Value>,
) -> Result<()> {
    let model = ctx.model(uid)?;
    let limit = write_concurrency(ctx);

    for (name, attribute) in &model.attributes {
        if !data.contains_key(name.as_str()) {
            continue;
        }

        match attribute {
            Attribute::Component(attr) if attr.repeatable => {
                let previous = load_linked(ctx, uid, entity, name).await?;
                let old_ids = ids_of(&previous);
                let value = data.remove(name.as_str()).unwrap_or(Value::Null);
                let items = match value {
                    // Clearing the attribute orphans every linked row
                    Value::Null => {
                        map_limited(old_ids, limit, |id| {
                            delete_component_by_id(ctx, &attr.component, id)
                        })
                        .await?;
                        data.insert(name.clone(), Value::Null);
                        continue;
                    }
                    Value::Array(items) => items,
                    _ => {
                        return Err(EntityError::ExpectedArray {
                            attribute: name.to_string(),
                        })
                    }
                };

                let incoming_ids: Vec<i64> = items
                    .iter()
                    .filter_map(|item| item.get("id").and_then(Value::as_i64))
                    .collect();
                for id in &incoming_ids {
                    if !old_ids.contains(id) {
                        return Err(EntityError::ComponentNotLinked {
                            id: *id,
                            attribute: name.clone(),
                        });
                    }
                }

                let orphans: Vec<i64> = old_ids
                    .iter()
                    .copied()
                    .filter(|id| !incoming_ids.contains(id))
                    .collect();
                map_limited(orphans, limit, |id| {
                    delete_component_by_id(ctx, &attr.component, id)
                })
                .await?;

                let pivots = map_limited(items, limit, |item| async move {
                    let row = update_or_create_component(ctx, &attr.component, item).await?;
                    Ok(component_pivot(row_id(&row)?, name, &attr.component))
                })
                .await?;
                data.insert(name.clone(), Value::Array(pivots));
            }

            Attribute::Component(attr) => {
                let previous = load_linked(ctx, uid, entity, name).await?;
                let old_id = previous
                    .first()
                    .and_then(|row| row.get("id"))
                    .and_then(Value::as_i64);
                let value = data.remove(name.as_str()).unwrap_or(Value::Null);

                match value {
                    Value::Null => {
                        if let Some(id) = old_id {
                            delete_component_by_id(ctx, &attr.component, id).await?;
                        }
                        data.insert(name.clone(), Value::Null);
                    }
                    Value::Object(_) => {
                        let incoming_id = value.get("id").and_then(Value::as_i64);
                        match incoming_id {
                            Some(id) if Some(id) != old_id => {
                                return Err(EntityError::ComponentNotLinked {
                                    id,
                                    attribute: name.clone(),
                                });
                            }
                            // Replacing wholesale orphans the previous value
                            None => {
                                if let Some(id) = old_id {
                                    delete_component_by_id(ctx, &attr.component, id).await?;
                                }
                            }
                            Some(_) => {}
                        }
                        let row = update_or_create_component(ctx, &attr.component, value).await?;
                        data.insert(
                            name.clone(),
                            component_pivot(row_id(&row)?, name, &attr.component),
                        );
                    }
                    _ => {
                        return Err(EntityError::ExpectedObject {
                            attribute: name.clone(),
                        })
                    }
                }
            }

            Attribute::DynamicZone(_) => {
                let previous = load_linked(ctx, uid, entity, name).await?;
                let old_pairs = zone_pairs(&previous);
                let value = data.remove(name.as_str()).unwrap_or(Value::Null);
                let items = match value {
                    Value::Null => {
                        map_limited(old_pairs, limit, |(component_uid, id)| async move {
                            delete_component_by_id(ctx, &component_uid, id).await
                        })
                        .await?;
                        data.insert(name.clone(), Value::Null);
                        continue;
                    }
                    Value::Array(items) => items,
                    _ => {
                        return Err(EntityError::ExpectedArray {
                            attribute: name.to_string(),
                        })
                    }
                };

                let mut incoming_pairs = Vec::new();
                for item in &items {
                    if let Some(id) = item.get("id").and_then(Value::as_i64) {
                        let item_uid = zone_entry_uid(name, item)?;
                        if !old_pairs.contains(&(item_uid.clone(), id)) {
                            return Err(EntityError::ComponentNotLinked {
                                id,
                                attribute: name.clone(),
                            });
                        }
                        incoming_pairs.push((item_uid, id));
                    }
                }

                let orphans: Vec<(String, i64)> = old_pairs
                    .into_iter()
                    .filter(|pair| !incoming_pairs.contains(pair))
                    .collect();
                map_limited(orphans, limit, |(component_uid, id)| async move {
                    delete_component_by_id(ctx, &component_uid, id).await
                })
                .await?;

                let pivots = map_limited(items, limit, |item| async move {
                    let item_uid = zone_entry_uid(name, &item)?;
                    let row = update_or_create_component(ctx, &item_uid, item).await?;
                    Ok(zone_pivot(row_id(&row)?, name, &item_uid))
                })
                .await?;
                data.insert(name.clone(), Value::Array(pivots));
            }

            Attribute::Scalar(_) | Attribute::Media(_) | Attribute::Relation(_) => {}
        }
    }
    Ok(())
}

/// Update a component row in place when the value carries an id, create it
/// otherwise. Nested components are diffed against the row's current state.
fn update_or_create_component<'a>(
    ctx: &'a EngineContext,
    uid: &'a str,
    value: Value,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        let Value::Object(mut map) = value else {
            return Err(EntityError::ExpectedObject {
                attribute: uid.to_string(),
            });
        };
        map.remove("__component");

        let id = map.remove("id").and_then(|id| id.as_i64());
        match id {
            Some(id) => {
                let repo = ctx.db.query(uid);
                let current = repo.find_one(&json!({"id": id})).await?.ok_or_else(|| {
                    StoreError::backend(format!("component {uid}:{id} vanished during update"))
                })?;
                update_components(ctx, uid, &current, &mut map).await?;
                let updated = repo.update(&json!({"id": id}), Value::Object(map)).await?;
                updated.ok_or_else(|| {
                    StoreError::backend(format!("component {uid}:{id} vanished during update"))
                        .into()
                })
            }
            None => create_component(ctx, uid, Value::Object(map)).await,
        }
    }
    .boxed()
}

/// Recursively delete every component row owned by `entity`
pub fn delete_components<'a>(
    ctx: &'a EngineContext,
    uid: &'a str,
    entity: &'a Value,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let model = ctx.model(uid)?;
        let limit = write_concurrency(ctx);

        for (name, attribute) in &model.attributes {
            match attribute {
                Attribute::Component(attr) => {
                    let rows = load_linked(ctx, uid, entity, name).await?;
                    map_limited(rows, limit, |row| async move {
                        delete_component_row(ctx, &attr.component, &row).await
                    })
                    .await?;
                }
                Attribute::DynamicZone(_) => {
                    let rows = load_linked(ctx, uid, entity, name).await?;
                    map_limited(rows, limit, |row| async move {
                        let item_uid = zone_entry_uid(name, &row)?;
                        delete_component_row(ctx, &item_uid, &row).await
                    })
                    .await?;
                }
                Attribute::Scalar(_) | Attribute::Media(_) | Attribute::Relation(_) => {}
            }
        }
        Ok(())
    }
    .boxed()
}

async fn delete_component_row(ctx: &EngineContext, uid: &str, row: &Value) -> Result<()> {
    // Children first, then the row itself
    delete_components(ctx, uid, row).await?;
    let id = row_id(row)?;
    ctx.db.query(uid).delete(&json!({"id": id})).await?;
    Ok(())
}

async fn delete_component_by_id(ctx: &EngineContext, uid: &str, id: i64) -> Result<()> {
    let row = ctx.db.query(uid).find_one(&json!({"id": id})).await?;
    if let Some(row) = row {
        delete_component_row(ctx, uid, &row).await?;
    }
    Ok(())
}

/// Clone the component tree of `source` into a fresh create payload.
///
/// Attributes absent from `data` are sourced from the existing entity's
/// current component values; every clone is created anew, a source
/// component's id is never reused.
pub async fn clone_components(
    ctx: &EngineContext,
    uid: &str,
    source: &Value,
    data: &mut Map<String, Value>,
) -> Result<()> {
    let model = ctx.model(uid)?;
    let limit = write_concurrency(ctx);

    for (name, attribute) in &model.attributes {
        if !attribute.holds_components() {
            continue;
        }

        let value = match data.remove(name.as_str()) {
            Some(value) => Some(value),
            None => {
                let rows = load_linked(ctx, uid, source, name).await?;
                match attribute {
                    Attribute::Component(attr) if !attr.repeatable => rows.into_iter().next(),
                    _ => Some(Value::Array(rows)),
                }
            }
        };

        if let Some(value) = value {
            // create_component strips ids, so loaded source rows clone fresh
            let pivot_value = persist_fresh_value(ctx, limit, name, attribute, value).await?;
            data.insert(name.clone(), pivot_value);
        }
    }
    Ok(())
}

async fn load_linked(
    ctx: &EngineContext,
    uid: &str,
    entity: &Value,
    attribute: &str,
) -> Result<Vec<Value>> {
    let loaded = ctx.db.query(uid).load(entity, attribute).await?;
    Ok(match loaded {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(rows)) => rows,
        Some(single) => vec![single],
    })
}

fn ids_of(rows: &[Value]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.get("id").and_then(Value::as_i64))
        .collect()
}

fn zone_pairs(rows: &[Value]) -> Vec<(String, i64)> {
    rows.iter()
        .filter_map(|row| {
            let uid = row.get("__component").and_then(Value::as_str)?;
            let id = row.get("id").and_then(Value::as_i64)?;
            Some((uid.to_string(), id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_schema::{
        Attribute, ComponentAttribute, DynamicZoneAttribute, InMemoryRegistry, Model,
    };
    use content_store::{MemoryDatabase, MemoryEventHub};
    use serde_json::json;
    use std::sync::Arc;

    fn context_with(db: MemoryDatabase) -> EngineContext {
        let registry = InMemoryRegistry::from_models([
            Model::collection("api::page.page", "Page")
                .attribute("title", Attribute::string())
                .attribute("hero", ComponentAttribute::new("default.hero"))
                .attribute("blocks", ComponentAttribute::new("default.block").repeatable())
                .attribute("zone", DynamicZoneAttribute::new(["default.hero", "default.block"])),
            Model::component("default.hero", "Hero")
                .attribute("caption", Attribute::string())
                .attribute("inner", ComponentAttribute::new("default.block")),
            Model::component("default.block", "Block")
                .attribute("text", Attribute::string()),
        ]);
        EngineContext::new(
            Arc::new(registry),
            Arc::new(db),
            Arc::new(MemoryEventHub::new()),
        )
    }

    fn ctx() -> EngineContext {
        context_with(MemoryDatabase::new())
    }

    #[test]
    fn test_concurrency_policy() {
        assert_eq!(
            resolve_component_write_concurrency(&Dialect::MySql, false),
            1
        );
        assert_eq!(
            resolve_component_write_concurrency(&Dialect::MariaDb, false),
            1
        );
        // Inside a transaction the deadlock risk is gone
        assert_eq!(
            resolve_component_write_concurrency(&Dialect::MySql, true),
            usize::MAX
        );
        assert_eq!(
            resolve_component_write_concurrency(&Dialect::Postgres, false),
            usize::MAX
        );
    }

    #[tokio::test]
    async fn test_create_substitutes_pivots() {
        let ctx = ctx();
        let mut data = json!({
            "title": "home",
            "hero": {"caption": "hi", "inner": {"text": "nested"}},
            "blocks": [{"text": "a"}, {"text": "b"}]
        })
        .as_object()
        .cloned()
        .unwrap();

        create_components(&ctx, "api::page.page", &mut data).await.unwrap();

        assert_eq!(data["title"], "home");
        assert_eq!(data["hero"]["__pivot"]["component_type"], "default.hero");
        let blocks = data["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["__pivot"]["field"], "blocks");
        // Nested component persisted bottom-up as its own row
        let hero_rows = ctx.db.query("default.hero").count(&json!({})).await.unwrap();
        let block_rows = ctx.db.query("default.block").count(&json!({})).await.unwrap();
        assert_eq!(hero_rows, 1);
        assert_eq!(block_rows, 3);
    }

    #[tokio::test]
    async fn test_create_null_single_component_is_skipped() {
        let ctx = ctx();
        let mut data = json!({"hero": null}).as_object().cloned().unwrap();
        create_components(&ctx, "api::page.page", &mut data).await.unwrap();
        assert_eq!(data["hero"], Value::Null);
        assert_eq!(ctx.db.query("default.hero").count(&json!({})).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_accepts_null_repeatable_and_zone_as_no_value() {
        let ctx = ctx();
        let mut data = json!({"blocks": null, "zone": null})
            .as_object()
            .cloned()
            .unwrap();
        create_components(&ctx, "api::page.page", &mut data).await.unwrap();
        assert_eq!(data["blocks"], Value::Null);
        assert_eq!(data["zone"], Value::Null);
        assert_eq!(ctx.db.query("default.block").count(&json!({})).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_with_null_array_orphans_every_entry() {
        let ctx = ctx();
        let mut data = json!({
            "blocks": [{"text": "a"}, {"text": "b"}],
            "zone": [{"__component": "default.hero", "caption": "h", "inner": {"text": "deep"}}]
        })
        .as_object()
        .cloned()
        .unwrap();
        create_components(&ctx, "api::page.page", &mut data).await.unwrap();
        let entity = json!({"id": 1, "blocks": data["blocks"], "zone": data["zone"]});

        let mut patch = json!({"blocks": null, "zone": null})
            .as_object()
            .cloned()
            .unwrap();
        update_components(&ctx, "api::page.page", &entity, &mut patch)
            .await
            .unwrap();

        assert_eq!(patch["blocks"], Value::Null);
        assert_eq!(patch["zone"], Value::Null);
        assert_eq!(ctx.db.query("default.hero").count(&json!({})).await.unwrap(), 0);
        assert_eq!(ctx.db.query("default.block").count(&json!({})).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_non_array_for_repeatable_and_zone() {
        let ctx = ctx();
        let mut data = json!({"blocks": {"text": "x"}}).as_object().cloned().unwrap();
        let err = create_components(&ctx, "api::page.page", &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, EntityError::ExpectedArray { ref attribute } if attribute == "blocks"));

        let mut data = json!({"zone": "nope"}).as_object().cloned().unwrap();
        let err = create_components(&ctx, "api::page.page", &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, EntityError::ExpectedArray { ref attribute } if attribute == "zone"));
    }

    #[tokio::test]
    async fn test_create_strips_client_supplied_ids() {
        let ctx = ctx();
        let mut data = json!({"blocks": [{"id": 777, "text": "a"}]})
            .as_object()
            .cloned()
            .unwrap();
        create_components(&ctx, "api::page.page", &mut data).await.unwrap();
        assert_eq!(data["blocks"][0]["id"], 1);
    }

    #[tokio::test]
    async fn test_zone_create_tags_pivots() {
        let ctx = ctx();
        let mut data = json!({"zone": [
            {"__component": "default.block", "text": "z"},
            {"__component": "default.hero", "caption": "h"}
        ]})
        .as_object()
        .cloned()
        .unwrap();
        create_components(&ctx, "api::page.page", &mut data).await.unwrap();

        let zone = data["zone"].as_array().unwrap();
        assert_eq!(zone[0]["__component"], "default.block");
        assert_eq!(zone[1]["__component"], "default.hero");
        assert_eq!(zone[0]["__pivot"]["field"], "zone");
        // The tag is pivot metadata, not row data
        let block = ctx
            .db
            .query("default.block")
            .find_one(&json!({"text": "z"}))
            .await
            .unwrap()
            .unwrap();
        assert!(block.get("__component").is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_unlinked_component_id_before_writing() {
        let ctx = ctx();
        // Component row 1 exists but belongs to some other entity
        ctx.db
            .query("default.block")
            .create(json!({"text": "foreign"}))
            .await
            .unwrap();

        let entity = json!({"id": 1, "blocks": []});
        let mut data = json!({"blocks": [{"id": 1, "text": "stolen"}]})
            .as_object()
            .cloned()
            .unwrap();

        let err = update_components(&ctx, "api::page.page", &entity, &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, EntityError::ComponentNotLinked { id: 1, .. }));
        // Nothing was written
        let row = ctx
            .db
            .query("default.block")
            .find_one(&json!({"id": 1}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["text"], "foreign");
    }

    #[tokio::test]
    async fn test_update_prunes_orphans_recursively() {
        let ctx = ctx();
        let mut data = json!({"hero": {"caption": "old", "inner": {"text": "deep"}}})
            .as_object()
            .cloned()
            .unwrap();
        create_components(&ctx, "api::page.page", &mut data).await.unwrap();
        let entity = json!({"id": 1, "hero": data["hero"]});

        // Clearing the attribute cascades into the nested block
        let mut patch = json!({"hero": null}).as_object().cloned().unwrap();
        update_components(&ctx, "api::page.page", &entity, &mut patch)
            .await
            .unwrap();

        assert_eq!(ctx.db.query("default.hero").count(&json!({})).await.unwrap(), 0);
        assert_eq!(ctx.db.query("default.block").count(&json!({})).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_through_zone_entries() {
        let ctx = ctx();
        let mut data = json!({"zone": [
            {"__component": "default.hero", "caption": "h", "inner": {"text": "deep"}},
            {"__component": "default.block", "text": "b"}
        ]})
        .as_object()
        .cloned()
        .unwrap();
        create_components(&ctx, "api::page.page", &mut data).await.unwrap();
        let entity = json!({"id": 1, "zone": data["zone"]});

        delete_components(&ctx, "api::page.page", &entity).await.unwrap();
        assert_eq!(ctx.db.query("default.hero").count(&json!({})).await.unwrap(), 0);
        assert_eq!(ctx.db.query("default.block").count(&json!({})).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clone_sources_missing_attributes_without_reusing_ids() {
        let ctx = ctx();
        let mut data = json!({"blocks": [{"text": "original"}]})
            .as_object()
            .cloned()
            .unwrap();
        create_components(&ctx, "api::page.page", &mut data).await.unwrap();
        let source = json!({"id": 1, "blocks": data["blocks"]});
        let source_id = data["blocks"][0]["id"].as_i64().unwrap();

        let mut clone_data = Map::new();
        clone_components(&ctx, "api::page.page", &source, &mut clone_data)
            .await
            .unwrap();

        let cloned_id = clone_data["blocks"][0]["id"].as_i64().unwrap();
        assert_ne!(cloned_id, source_id);
        // Both rows exist with the same content
        assert_eq!(ctx.db.query("default.block").count(&json!({})).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_serial_writes_preserve_pivot_order_on_mysql() {
        let ctx = context_with(MemoryDatabase::new().with_dialect(Dialect::MySql));
        let mut data = json!({"blocks": [{"text": "a"}, {"text": "b"}, {"text": "c"}]})
            .as_object()
            .cloned()
            .unwrap();
        create_components(&ctx, "api::page.page", &mut data).await.unwrap();

        let ids: Vec<i64> = data["blocks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
