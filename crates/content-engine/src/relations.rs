//! Relation store construction and batched existence checking
//!
//! The relation store is a transient map from target uid to every id the
//! payload references for that target, accumulated across attributes and
//! nesting levels so each target type is checked with exactly one query.

use futures::future::try_join_all;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use content_schema::{Attribute, ModelRegistry, UPLOAD_FILE_UID};
use content_store::Database;

use crate::error::{EntityError, Result};

/// A referenced relation target
#[derive(Debug, Clone, PartialEq)]
pub struct RelationRef {
    pub id: Value,
}

/// Transient map of `target uid -> referenced ids`, discarded after the
/// existence check
pub type RelationStore = BTreeMap<String, Vec<RelationRef>>;

/// Walk `data` against the model's attribute map and collect every
/// referenced relation/media id, keyed by target uid.
///
/// Traversal follows the schema, not the value's own keys. Nil values are
/// skipped, and polymorphic relations are skipped entirely (not validated).
pub fn build_relations_store(
    registry: &dyn ModelRegistry,
    uid: &str,
    data: &Value,
) -> Result<RelationStore> {
    let mut store = RelationStore::new();
    collect(registry, uid, data, &mut store)?;
    Ok(store)
}

fn collect(
    registry: &dyn ModelRegistry,
    uid: &str,
    data: &Value,
    store: &mut RelationStore,
) -> Result<()> {
    let Some(object) = data.as_object() else {
        return Ok(());
    };
    let model = registry.resolve(uid)?;

    for (name, attribute) in &model.attributes {
        let value = match object.get(name.as_str()) {
            None | Some(Value::Null) => continue,
            Some(value) => value,
        };

        match attribute {
            Attribute::Scalar(_) => {}

            Attribute::Relation(relation) => {
                if relation.relation.is_polymorphic() {
                    continue;
                }
                if let Some(target) = &relation.target {
                    append_refs(store, target, value);
                }
            }

            Attribute::Media(_) => append_refs(store, UPLOAD_FILE_UID, value),

            Attribute::Component(component) => {
                let items: &[Value] = match value {
                    Value::Array(items) => items,
                    single => std::slice::from_ref(single),
                };
                for item in items {
                    collect(registry, &component.component, item, store)?;
                }
            }

            Attribute::DynamicZone(_) => {
                for item in value.as_array().into_iter().flatten() {
                    if let Some(item_uid) = item.get("__component").and_then(Value::as_str) {
                        collect(registry, item_uid, item, store)?;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Normalize the accepted relation input shapes into id refs and append
/// them to the store (append, never overwrite: the same target referenced
/// from several attributes is checked in one batch)
fn append_refs(store: &mut RelationStore, target: &str, value: &Value) {
    let elements: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(object) => {
            let linked = object
                .get("connect")
                .or_else(|| object.get("set"))
                .and_then(Value::as_array);
            match linked {
                Some(items) => items.iter().collect(),
                // An object without connect/set is a bare {id} ref
                None if object.contains_key("id") => vec![value],
                None => Vec::new(),
            }
        }
        scalar => vec![scalar],
    };

    let refs = store.entry(target.to_string()).or_default();
    for element in elements {
        if element.is_null() {
            continue;
        }
        let id = element.get("id").unwrap_or(element).clone();
        refs.push(RelationRef { id });
    }
}

/// Verify that every id in the store exists, one concurrent count query per
/// target uid. The first failing target wins; the check is read-only.
pub async fn check_relations_exist(db: &dyn Database, store: &RelationStore) -> Result<()> {
    let checks = store.iter().map(|(target, refs)| async move {
        // uniqBy id before querying
        let mut ids: Vec<Value> = Vec::with_capacity(refs.len());
        for reference in refs {
            if !ids.contains(&reference.id) {
                ids.push(reference.id.clone());
            }
        }
        if ids.is_empty() {
            return Ok(());
        }

        let distinct = ids.len() as u64;
        let count = db
            .query(target)
            .count(&json!({"id": {"$in": ids}}))
            .await?;

        if count != distinct {
            return Err(EntityError::relations_not_found(distinct - count, target));
        }
        Ok(())
    });

    try_join_all(checks).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_schema::{
        Attribute, ComponentAttribute, DynamicZoneAttribute, InMemoryRegistry, MediaAttribute,
        Model, RelationAttribute, RelationKind,
    };
    use content_store::MemoryDatabase;
    use serde_json::json;

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::from_models([
            Model::collection("api::dev.dev", "Dev")
                .attribute("categories", RelationAttribute::one_to_many("api::category.category"))
                .attribute("owner", RelationAttribute::many_to_one("api::category.category"))
                .attribute("cover", MediaAttribute::new())
                .attribute("related", RelationAttribute::polymorphic(RelationKind::MorphToMany))
                .attribute("sCom", ComponentAttribute::new("default.s-com"))
                .attribute("zone", DynamicZoneAttribute::new(["default.s-com"])),
            Model::component("default.s-com", "SCom")
                .attribute("categories", RelationAttribute::one_to_many("api::category.category")),
            Model::collection("api::category.category", "Category")
                .attribute("name", Attribute::string()),
        ])
    }

    fn ids(store: &RelationStore, target: &str) -> Vec<Value> {
        store[target].iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_store_accumulates_across_attributes_and_nesting() {
        let registry = registry();
        let data = json!({
            "categories": [1, {"id": 2}],
            "owner": 3,
            "sCom": {"categories": {"connect": [{"id": 4}]}},
            "zone": [{"__component": "default.s-com", "categories": [5]}]
        });

        let store = build_relations_store(&registry, "api::dev.dev", &data).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            ids(&store, "api::category.category"),
            vec![json!(1), json!(2), json!(3), json!(4), json!(5)]
        );
    }

    #[test]
    fn test_media_targets_upload_file_uid() {
        let registry = registry();
        let store =
            build_relations_store(&registry, "api::dev.dev", &json!({"cover": [7, 8]})).unwrap();
        assert_eq!(ids(&store, UPLOAD_FILE_UID), vec![json!(7), json!(8)]);
    }

    #[test]
    fn test_nil_and_morph_values_are_skipped() {
        let registry = registry();
        let data = json!({
            "categories": null,
            "related": [{"id": 1}],
        });
        let store = build_relations_store(&registry, "api::dev.dev", &data).unwrap();
        assert!(store.values().all(|refs| refs.is_empty()) || store.is_empty());
    }

    #[test]
    fn test_connect_and_set_missing_means_empty() {
        let registry = registry();
        let store = build_relations_store(
            &registry,
            "api::dev.dev",
            &json!({"categories": {"options": []}}),
        )
        .unwrap();
        assert_eq!(ids(&store, "api::category.category"), Vec::<Value>::new());
    }

    #[tokio::test]
    async fn test_existence_check_counts_distinct_ids_once() {
        let registry = registry();
        let db = MemoryDatabase::new();
        for name in ["a", "b"] {
            db.query("api::category.category")
                .create(json!({"name": name}))
                .await
                .unwrap();
        }

        // Duplicated ids collapse before the count
        let store = build_relations_store(
            &registry,
            "api::dev.dev",
            &json!({"categories": [1, 1, 2], "owner": 2}),
        )
        .unwrap();
        assert!(check_relations_exist(&db, &store).await.is_ok());
    }

    #[tokio::test]
    async fn test_existence_check_reports_missing_count() {
        let registry = registry();
        let db = MemoryDatabase::new();
        db.query("api::category.category")
            .create(json!({"name": "only"}))
            .await
            .unwrap();

        let store = build_relations_store(
            &registry,
            "api::dev.dev",
            &json!({"categories": [1, 24, 25]}),
        )
        .unwrap();

        let err = check_relations_exist(&db, &store).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "2 relation(s) of type api::category.category associated with this entity do not exist"
        );
    }
}
