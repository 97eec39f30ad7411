//! Content-type and component model definitions
//!
//! A `Model` is the static schema for one content type (collection or
//! single) or one reusable component. Models are immutable after load and
//! owned by a [`crate::registry::ModelRegistry`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::attribute::Attribute;

/// The structural kind of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelKind {
    /// Content type persisting many entries
    CollectionType,
    /// Content type persisting exactly one entry
    SingleType,
    /// Reusable nested structure linked to a parent through a pivot
    Component,
}

/// Display and naming metadata for a model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Human-readable name used in error messages
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural_name: Option<String>,
}

/// Behavioral options for a model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOptions {
    /// When enabled, entries without a `publishedAt` value are drafts and
    /// required-attribute enforcement is relaxed
    #[serde(default)]
    pub draft_and_publish: bool,
}

/// Static schema for a content type or component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Globally unique identifier, e.g. `api::article.article`
    pub uid: String,
    pub kind: ModelKind,
    pub info: ModelInfo,
    #[serde(default)]
    pub options: ModelOptions,
    /// Attribute map; traversal order is the schema's, not the payload's
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
    /// Attribute names stripped before any event leaves the engine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private_attributes: Vec<String>,
}

impl Model {
    fn new(uid: impl Into<String>, kind: ModelKind, display_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            kind,
            info: ModelInfo {
                display_name: display_name.into(),
                singular_name: None,
                plural_name: None,
            },
            options: ModelOptions::default(),
            attributes: BTreeMap::new(),
            private_attributes: Vec::new(),
        }
    }

    /// Create a collection content type
    pub fn collection(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(uid, ModelKind::CollectionType, display_name)
    }

    /// Create a single content type
    pub fn single(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(uid, ModelKind::SingleType, display_name)
    }

    /// Create a component model
    pub fn component(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(uid, ModelKind::Component, display_name)
    }

    /// Add an attribute to the schema
    pub fn attribute(mut self, name: impl Into<String>, attribute: impl Into<Attribute>) -> Self {
        self.attributes.insert(name.into(), attribute.into());
        self
    }

    /// Mark an attribute name as private
    pub fn private_attribute(mut self, name: impl Into<String>) -> Self {
        self.private_attributes.push(name.into());
        self
    }

    /// Enable the draft/publish workflow
    pub fn draft_and_publish(mut self) -> Self {
        self.options.draft_and_publish = true;
        self
    }

    /// Set singular and plural names
    pub fn names(
        mut self,
        singular: impl Into<String>,
        plural: impl Into<String>,
    ) -> Self {
        self.info.singular_name = Some(singular.into());
        self.info.plural_name = Some(plural.into());
        self
    }

    /// Human-readable name used in error messages
    pub fn display_name(&self) -> &str {
        &self.info.display_name
    }

    /// Whether this model is a component
    pub fn is_component(&self) -> bool {
        self.kind == ModelKind::Component
    }

    /// Whether `name` must be stripped before event emission
    pub fn is_private_attribute(&self, name: &str) -> bool {
        if self.private_attributes.iter().any(|a| a == name) {
            return true;
        }
        self.attributes
            .get(name)
            .map(|a| a.is_private())
            .unwrap_or(false)
    }

    /// Iterate over attributes that embed component data
    pub fn component_attributes(&self) -> impl Iterator<Item = (&String, &Attribute)> {
        self.attributes.iter().filter(|(_, a)| a.holds_components())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, ComponentAttribute};

    #[test]
    fn test_model_builder() {
        let model = Model::collection("api::article.article", "Article")
            .names("article", "articles")
            .draft_and_publish()
            .attribute("title", Attribute::string().required())
            .attribute("blocks", ComponentAttribute::new("default.block").repeatable())
            .private_attribute("internalNotes");

        assert_eq!(model.display_name(), "Article");
        assert!(model.options.draft_and_publish);
        assert_eq!(model.attributes.len(), 2);
        assert!(model.is_private_attribute("internalNotes"));
        assert_eq!(model.component_attributes().count(), 1);
    }

    #[test]
    fn test_private_scalar_attribute_detected() {
        let model = Model::collection("api::user.user", "User")
            .attribute("password", Attribute::string().private());
        assert!(model.is_private_attribute("password"));
        assert!(!model.is_private_attribute("email"));
    }

    #[test]
    fn test_model_serde_round_trip() {
        let model = Model::component("default.seo", "SEO")
            .attribute("metaTitle", Attribute::string().max_length(60));

        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["kind"], "component");
        let back: Model = serde_json::from_value(value).unwrap();
        assert!(back.is_component());
        assert!(back.attributes.contains_key("metaTitle"));
    }
}
