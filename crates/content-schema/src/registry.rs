//! Model registry and entity sanitization
//!
//! The registry is the engine's window onto the schemas loaded by the host
//! platform. The engine resolves both content types and components through
//! it; it never caches models itself.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::attribute::Attribute;
use crate::model::{Model, ModelKind};

/// Errors raised while resolving or validating schemas
#[derive(Error, Debug)]
pub enum SchemaError {
    /// No model is registered under the given uid
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// A component/dynamic-zone attribute references an unresolvable or
    /// non-component uid
    #[error("Attribute '{attribute}' of '{model}' references invalid component '{component}'")]
    InvalidComponentReference {
        model: String,
        attribute: String,
        component: String,
    },
}

/// Result type alias for schema operations
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Read-only access to loaded content-type and component schemas
pub trait ModelRegistry: Send + Sync {
    /// Look up a model by uid; resolves content types and components alike
    fn get_model(&self, uid: &str) -> Option<&Model>;

    /// Look up a model, failing with a schema error on unknown uids
    fn resolve(&self, uid: &str) -> SchemaResult<&Model> {
        self.get_model(uid)
            .ok_or_else(|| SchemaError::UnknownModel(uid.to_string()))
    }
}

/// In-memory registry backed by a uid map
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    models: HashMap<String, Model>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model, replacing any previous entry for the same uid
    pub fn register(&mut self, model: Model) -> &mut Self {
        self.models.insert(model.uid.clone(), model);
        self
    }

    /// Build a registry from an iterator of models
    pub fn from_models<I>(models: I) -> Self
    where
        I: IntoIterator<Item = Model>,
    {
        let mut registry = Self::new();
        for model in models {
            registry.register(model);
        }
        registry
    }

    /// Check the schema invariant: every component and dynamic-zone
    /// attribute must reference a uid that resolves to a component model
    pub fn validate(&self) -> SchemaResult<()> {
        for model in self.models.values() {
            for (name, attribute) in &model.attributes {
                let referenced: Vec<&str> = match attribute {
                    Attribute::Component(c) => vec![c.component.as_str()],
                    Attribute::DynamicZone(z) => {
                        z.components.iter().map(String::as_str).collect()
                    }
                    _ => continue,
                };

                for uid in referenced {
                    let valid = self
                        .models
                        .get(uid)
                        .map(|m| m.kind == ModelKind::Component)
                        .unwrap_or(false);
                    if !valid {
                        return Err(SchemaError::InvalidComponentReference {
                            model: model.uid.clone(),
                            attribute: name.clone(),
                            component: uid.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl ModelRegistry for InMemoryRegistry {
    fn get_model(&self, uid: &str) -> Option<&Model> {
        self.models.get(uid)
    }
}

/// Strip private attributes from an entity before it leaves the engine.
///
/// Recurses into component and dynamic-zone values so nested private fields
/// never reach event subscribers. Non-object inputs are returned unchanged.
pub fn sanitize_entity(registry: &dyn ModelRegistry, model: &Model, entity: &Value) -> Value {
    let Some(object) = entity.as_object() else {
        return entity.clone();
    };

    let mut sanitized = serde_json::Map::with_capacity(object.len());
    for (name, value) in object {
        if model.is_private_attribute(name) {
            continue;
        }

        let cleaned = match model.attributes.get(name.as_str()) {
            Some(Attribute::Component(attr)) => {
                sanitize_component_value(registry, &attr.component, value)
            }
            Some(Attribute::DynamicZone(_)) => sanitize_zone_value(registry, value),
            _ => value.clone(),
        };
        sanitized.insert(name.clone(), cleaned);
    }

    Value::Object(sanitized)
}

fn sanitize_component_value(registry: &dyn ModelRegistry, uid: &str, value: &Value) -> Value {
    let Some(component) = registry.get_model(uid) else {
        return value.clone();
    };

    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_entity(registry, component, item))
                .collect(),
        ),
        Value::Object(_) => sanitize_entity(registry, component, value),
        other => other.clone(),
    }
}

fn sanitize_zone_value(registry: &dyn ModelRegistry, value: &Value) -> Value {
    let Some(items) = value.as_array() else {
        return value.clone();
    };

    Value::Array(
        items
            .iter()
            .map(|item| {
                let uid = item.get("__component").and_then(Value::as_str);
                match uid.and_then(|uid| registry.get_model(uid)) {
                    Some(component) => {
                        let mut cleaned = sanitize_entity(registry, component, item);
                        // sanitize_entity drops keys outside the schema map only
                        // when flagged private; the zone tag must survive
                        if let (Some(tag), Some(obj)) =
                            (item.get("__component"), cleaned.as_object_mut())
                        {
                            obj.insert("__component".to_string(), tag.clone());
                        }
                        cleaned
                    }
                    None => item.clone(),
                }
            })
            .collect(),
    )
}
