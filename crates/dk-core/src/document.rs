//! Slide document model.
//!
//! Slide content is schema-less: the generation pipeline produces an
//! arbitrarily nested tree of JSON objects and arrays, and templates are free
//! to invent whatever shape they like. The binding layer never assumes a
//! template schema; the only structure it relies on are the reserved fields
//! that resource-bearing leaves carry (a reference plus descriptive text).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved leaf field: image resource reference.
pub const IMAGE_URL_FIELD: &str = "__image_url__";
/// Reserved leaf field: image generation prompt.
pub const IMAGE_PROMPT_FIELD: &str = "__image_prompt__";
/// Reserved leaf field: icon resource reference.
pub const ICON_URL_FIELD: &str = "__icon_url__";
/// Reserved leaf field: icon search query.
pub const ICON_QUERY_FIELD: &str = "__icon_query__";

/// The two resource kinds a slide leaf can carry.
///
/// A leaf is classified by which reference field it holds; the two are
/// never meaningful on the same element. When both appear anyway, image
/// wins (reserved-field iteration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Image,
    Icon,
}

impl ResourceKind {
    /// The reserved field holding this kind's resource reference.
    pub fn url_field(self) -> &'static str {
        match self {
            ResourceKind::Image => IMAGE_URL_FIELD,
            ResourceKind::Icon => ICON_URL_FIELD,
        }
    }

    /// The reserved field holding this kind's descriptive text
    /// (generation prompt for images, search query for icons).
    pub fn text_field(self) -> &'static str {
        match self {
            ResourceKind::Image => IMAGE_PROMPT_FIELD,
            ResourceKind::Icon => ICON_QUERY_FIELD,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Icon => "icon",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read a node's resource reference for `kind`, if it carries a non-empty one.
///
/// Non-object nodes and non-string field values yield `None`: malformed
/// shapes are "no resource here", never an error.
pub fn resource_ref(node: &Value, kind: ResourceKind) -> Option<&str> {
    let s = node.get(kind.url_field())?.as_str()?;
    if s.is_empty() { None } else { Some(s) }
}

/// Read a node's descriptive text (prompt or query) for `kind`.
pub fn resource_text(node: &Value, kind: ResourceKind) -> Option<&str> {
    node.get(kind.text_field())?.as_str()
}

/// Classify a node by the reserved reference field it carries.
pub fn classify(node: &Value) -> Option<ResourceKind> {
    if resource_ref(node, ResourceKind::Image).is_some() {
        Some(ResourceKind::Image)
    } else if resource_ref(node, ResourceKind::Icon).is_some() {
        Some(ResourceKind::Icon)
    } else {
        None
    }
}

/// A deck: the ordered slide sequence plus identity.
///
/// `slides` is the mutable part of the document: it is what edits target
/// and what history snapshots capture. `Value::clone` is a deep copy, so a
/// cloned slide list shares no memory with the source it was cloned from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub title: String,
    pub slides: Vec<Value>,
}

impl Deck {
    pub fn new(id: impl Into<String>, title: impl Into<String>, slides: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            slides,
        }
    }

    pub fn slide(&self, index: usize) -> Option<&Value> {
        self.slides.get(index)
    }

    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.slides.get_mut(index)
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}
