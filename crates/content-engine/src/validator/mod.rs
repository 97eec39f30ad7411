//! Schema-driven entity validation
//!
//! Builds up a normalized payload by walking the model's attribute map and
//! dispatching exhaustively on attribute kind. Rule violations are collected
//! across the whole payload (abort-early disabled) and returned as one
//! aggregate error. After the attribute walk, the relation store for the
//! whole payload is built and every referenced relation/media id is checked
//! for existence in batch.

pub mod scalars;

use serde_json::{Map, Value};

use content_schema::{
    Attribute, ComponentAttribute, DynamicZoneAttribute, Model, ModelRegistry,
};

use crate::context::EngineContext;
use crate::error::{EntityError, Result, ValidationFailure};
use crate::relations::{build_relations_store, check_relations_exist};

/// Whether the payload creates a new entity or updates an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorMode {
    /// Required attributes must be present; defaults are injected
    Creation,
    /// Absent attributes are left untouched; explicit `null` clears a value
    /// but is still rejected for required attributes
    Update,
}

/// Options controlling rule strictness
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorOptions {
    /// Drafts relax every `required` rule
    pub is_draft: bool,
}

/// Validate a payload against a model and return the normalized data.
///
/// Normalization injects creation defaults (`[]` for optional repeatable
/// components and dynamic zones), drops attributes outside the schema, and
/// strips any client-supplied root `id`. Relation values are passed through
/// uncast so the relation walker sees their original shape.
pub async fn validate_entity(
    ctx: &EngineContext,
    mode: ValidatorMode,
    model: &Model,
    data: &Value,
    options: ValidatorOptions,
) -> Result<Value> {
    // Shape check precedes any schema walk
    let Some(input) = data.as_object() else {
        return Err(EntityError::invalid_payload(model.display_name()));
    };

    tracing::debug!(uid = %model.uid, ?mode, is_draft = options.is_draft, "validating payload");

    let mut walker = Walker {
        registry: ctx.models.as_ref(),
        mode,
        is_draft: options.is_draft,
        failures: Vec::new(),
    };
    let normalized = walker.walk_model(model, input, "", false);

    if !walker.failures.is_empty() {
        return Err(EntityError::validation(walker.failures));
    }

    let normalized = Value::Object(normalized);
    let store = build_relations_store(ctx.models.as_ref(), &model.uid, &normalized)?;
    check_relations_exist(ctx.db.as_ref(), &store).await?;

    Ok(normalized)
}

struct Walker<'a> {
    registry: &'a dyn ModelRegistry,
    mode: ValidatorMode,
    is_draft: bool,
    failures: Vec<ValidationFailure>,
}

impl Walker<'_> {
    /// Walk one model's attribute map over `input`, returning the normalized
    /// object. `keep_id` preserves a client-supplied `id`, which is only
    /// meaningful for nested component values during updates.
    fn walk_model(
        &mut self,
        model: &Model,
        input: &Map<String, Value>,
        path: &str,
        keep_id: bool,
    ) -> Map<String, Value> {
        let mut output = Map::new();

        if keep_id {
            if let Some(id) = input.get("id") {
                output.insert("id".to_string(), id.clone());
            }
        }

        for (name, attribute) in &model.attributes {
            let attribute_path = join_path(path, name);
            let value = input.get(name.as_str());

            match attribute {
                Attribute::Scalar(scalar) => match value {
                    None => {
                        if self.mode == ValidatorMode::Creation {
                            if let Some(default) = &scalar.default {
                                output.insert(name.clone(), default.clone());
                            } else if scalar.required && !self.is_draft {
                                self.fail(&attribute_path, "must be defined");
                            }
                        }
                    }
                    Some(Value::Null) => {
                        if scalar.required && !self.is_draft {
                            self.fail(&attribute_path, "cannot be null");
                        } else {
                            output.insert(name.clone(), Value::Null);
                        }
                    }
                    Some(value) => {
                        scalars::check_scalar(scalar, &attribute_path, value, &mut self.failures);
                        output.insert(name.clone(), value.clone());
                    }
                },

                // Media payloads are accepted as-is; the relation walker
                // enforces that every referenced file id exists
                Attribute::Media(media) => match value {
                    None => {
                        if self.mode == ValidatorMode::Creation
                            && media.required
                            && !self.is_draft
                        {
                            self.fail(&attribute_path, "must be defined");
                        }
                    }
                    Some(Value::Null) => {
                        if media.required && !self.is_draft {
                            self.fail(&attribute_path, "cannot be null");
                        } else {
                            output.insert(name.clone(), Value::Null);
                        }
                    }
                    Some(value) => {
                        output.insert(name.clone(), value.clone());
                    }
                },

                Attribute::Relation(relation) => match value {
                    None => {
                        if self.mode == ValidatorMode::Creation
                            && relation.required
                            && !self.is_draft
                        {
                            self.fail(&attribute_path, "must be defined");
                        }
                    }
                    Some(Value::Null) => {
                        if relation.required && !self.is_draft {
                            self.fail(&attribute_path, "cannot be null");
                        } else {
                            output.insert(name.clone(), Value::Null);
                        }
                    }
                    Some(value) => {
                        // Cast stays disabled: the raw value is preserved so
                        // the relation store builder sees its original shape
                        self.check_relation_shape(&attribute_path, value);
                        output.insert(name.clone(), value.clone());
                    }
                },

                Attribute::Component(component) if component.repeatable => {
                    self.walk_repeatable(component, name, value, &attribute_path, &mut output);
                }

                Attribute::Component(component) => {
                    self.walk_single_component(component, name, value, &attribute_path, &mut output);
                }

                Attribute::DynamicZone(zone) => {
                    self.walk_zone(zone, name, value, &attribute_path, &mut output);
                }
            }
        }

        output
    }

    fn walk_single_component(
        &mut self,
        attribute: &ComponentAttribute,
        name: &str,
        value: Option<&Value>,
        path: &str,
        output: &mut Map<String, Value>,
    ) {
        match value {
            None => {
                if self.mode == ValidatorMode::Creation && attribute.required && !self.is_draft {
                    self.fail(path, "must be defined");
                }
            }
            Some(Value::Null) => {
                if attribute.required && !self.is_draft {
                    self.fail(path, "cannot be null");
                } else {
                    output.insert(name.to_string(), Value::Null);
                }
            }
            Some(Value::Object(object)) => {
                if let Some(component) = self.component_model(&attribute.component, path) {
                    let normalized = self.walk_model(&component, object, path, true);
                    output.insert(name.to_string(), Value::Object(normalized));
                }
            }
            Some(_) => self.fail(path, "must be a component object"),
        }
    }

    fn walk_repeatable(
        &mut self,
        attribute: &ComponentAttribute,
        name: &str,
        value: Option<&Value>,
        path: &str,
        output: &mut Map<String, Value>,
    ) {
        match value {
            None => {
                if self.mode == ValidatorMode::Creation {
                    if attribute.required && !self.is_draft {
                        self.fail(path, "must be defined");
                    } else {
                        output.insert(name.to_string(), Value::Array(Vec::new()));
                    }
                }
            }
            Some(Value::Null) => {
                if attribute.required && !self.is_draft {
                    self.fail(path, "cannot be null");
                } else {
                    output.insert(name.to_string(), Value::Null);
                }
            }
            Some(Value::Array(items)) => {
                self.check_entry_count(attribute.min, attribute.max, attribute.required, items, path);

                let mut normalized = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{index}]");
                    match item.as_object() {
                        Some(object) => {
                            if let Some(component) =
                                self.component_model(&attribute.component, &item_path)
                            {
                                normalized.push(Value::Object(self.walk_model(
                                    &component, object, &item_path, true,
                                )));
                            }
                        }
                        None => self.fail(&item_path, "must be a non-null component object"),
                    }
                }
                output.insert(name.to_string(), Value::Array(normalized));
            }
            Some(_) => self.fail(path, "must be an array of components"),
        }
    }

    fn walk_zone(
        &mut self,
        attribute: &DynamicZoneAttribute,
        name: &str,
        value: Option<&Value>,
        path: &str,
        output: &mut Map<String, Value>,
    ) {
        match value {
            None => {
                if self.mode == ValidatorMode::Creation {
                    if attribute.required && !self.is_draft {
                        self.fail(path, "must be defined");
                    } else {
                        output.insert(name.to_string(), Value::Array(Vec::new()));
                    }
                }
            }
            Some(Value::Null) => {
                if attribute.required && !self.is_draft {
                    self.fail(path, "cannot be null");
                } else {
                    output.insert(name.to_string(), Value::Null);
                }
            }
            Some(Value::Array(items)) => {
                self.check_entry_count(attribute.min, attribute.max, attribute.required, items, path);

                let mut normalized = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{index}]");
                    let Some(object) = item.as_object() else {
                        self.fail(&item_path, "must be a non-null component object");
                        continue;
                    };

                    // Every entry must carry a __component key naming one of
                    // the zone's registered components
                    let uid = object.get("__component").and_then(Value::as_str);
                    match uid {
                        Some(uid) if attribute.allows(uid) => {
                            if let Some(component) = self.component_model(uid, &item_path) {
                                let mut entry =
                                    self.walk_model(&component, object, &item_path, true);
                                entry.insert(
                                    "__component".to_string(),
                                    Value::String(uid.to_string()),
                                );
                                normalized.push(Value::Object(entry));
                            }
                        }
                        Some(uid) => self.fail(
                            &item_path,
                            format!("__component '{uid}' is not allowed in this dynamic zone"),
                        ),
                        None => self.fail(&item_path, "missing __component key"),
                    }
                }
                output.insert(name.to_string(), Value::Array(normalized));
            }
            Some(_) => self.fail(path, "must be an array of dynamic zone entries"),
        }
    }

    /// Array-level min/max apply only when the attribute is required or a
    /// non-empty array was supplied
    fn check_entry_count(
        &mut self,
        min: Option<usize>,
        max: Option<usize>,
        required: bool,
        items: &[Value],
        path: &str,
    ) {
        if !required && items.is_empty() {
            return;
        }
        if let Some(min) = min {
            if items.len() < min {
                self.fail(path, format!("must contain at least {min} entries"));
            }
        }
        if let Some(max) = max {
            if items.len() > max {
                self.fail(path, format!("must contain at most {max} entries"));
            }
        }
    }

    /// Accepted relation input shapes: bare id, array of ids/objects, or an
    /// object carrying `connect`/`set` sub-arrays (or a bare `id`)
    fn check_relation_shape(&mut self, path: &str, value: &Value) {
        match value {
            Value::Number(_) | Value::String(_) => {}
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::Number(_) | Value::String(_) => {}
                        Value::Object(object) if object.contains_key("id") => {}
                        _ => self.fail(
                            format!("{path}[{index}]"),
                            "must be an id or an object with an id",
                        ),
                    }
                }
            }
            Value::Object(object) => {
                let has_link_keys = ["connect", "set"].iter().any(|key| {
                    object.get(*key).is_some_and(|v| v.is_array() || v.is_null())
                });
                if !has_link_keys && !object.contains_key("id") {
                    self.fail(path, "must be an id, an array of ids, or {connect|set: [...]}");
                }
            }
            _ => self.fail(path, "must be an id, an array of ids, or {connect|set: [...]}"),
        }
    }

    fn component_model(&mut self, uid: &str, path: &str) -> Option<Model> {
        match self.registry.get_model(uid) {
            Some(model) => Some(model.clone()),
            None => {
                self.fail(path, format!("references unknown component '{uid}'"));
                None
            }
        }
    }

    fn fail(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.failures.push(ValidationFailure::new(path, message));
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}
