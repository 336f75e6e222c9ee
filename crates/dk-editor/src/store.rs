//! Data-store collaborator: the authoritative deck plus presentation state.
//!
//! The store owns the live slide documents and applies the documented edit
//! paths: resource replacement at a structural path, wholesale slide
//! replacement (history replay), and the frame-properties side table.
//! Crop/fit/focus settings are presentation-only; they are keyed by
//! (slide, media ordinal) and never written into the slide document.

use dk_core::document::Deck;
use dk_core::path::DataPath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// How an image fills its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FitMode {
    #[default]
    Cover,
    Contain,
    Fill,
}

impl FitMode {
    pub fn as_css(self) -> &'static str {
        match self {
            FitMode::Cover => "cover",
            FitMode::Contain => "contain",
            FitMode::Fill => "fill",
        }
    }
}

/// Presentation-only crop/focus settings for one rendered media slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameProperties {
    pub fit: FitMode,
    /// Focal point, in percent of the frame.
    pub focus_x: f32,
    pub focus_y: f32,
}

impl Default for FrameProperties {
    fn default() -> Self {
        Self {
            fit: FitMode::Cover,
            focus_x: 50.0,
            focus_y: 50.0,
        }
    }
}

impl FrameProperties {
    /// CSS `object-position` value for the focal point.
    pub fn position_css(&self) -> String {
        format!("{}% {}%", self.focus_x, self.focus_y)
    }
}

/// Holds the authoritative deck and applies documented edit paths.
#[derive(Debug, Clone, Default)]
pub struct DeckStore {
    deck: Deck,
    properties: HashMap<(usize, usize), FrameProperties>,
}

impl DeckStore {
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            properties: HashMap::new(),
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn slides(&self) -> &[Value] {
        &self.deck.slides
    }

    pub fn slide(&self, index: usize) -> Option<&Value> {
        self.deck.slide(index)
    }

    /// Replace the whole slide list (history replay path).
    pub fn replace_slides(&mut self, slides: Vec<Value>) {
        self.deck.slides = slides;
    }

    /// Replace one slide wholesale.
    ///
    /// # Errors
    /// The index must address an existing slide.
    pub fn replace_slide(&mut self, index: usize, slide: Value) -> Result<(), String> {
        match self.deck.slide_mut(index) {
            Some(current) => {
                *current = slide;
                Ok(())
            }
            None => Err(format!("slide {index} out of range")),
        }
    }

    /// Write a new image reference (and optionally its prompt) into the
    /// leaf at `path` on slide `slide`.
    ///
    /// # Errors
    /// The slide must exist, the path must resolve, and the node there must
    /// be an object. On error nothing is written.
    pub fn set_image(
        &mut self,
        slide: usize,
        path: &DataPath,
        url: &str,
        prompt: Option<&str>,
    ) -> Result<(), String> {
        self.set_resource_fields(slide, path, dk_core::ResourceKind::Image, url, prompt)
    }

    /// Write a new icon reference (and optionally its query) into the leaf
    /// at `path` on slide `slide`.
    pub fn set_icon(
        &mut self,
        slide: usize,
        path: &DataPath,
        url: &str,
        query: Option<&str>,
    ) -> Result<(), String> {
        self.set_resource_fields(slide, path, dk_core::ResourceKind::Icon, url, query)
    }

    fn set_resource_fields(
        &mut self,
        slide: usize,
        path: &DataPath,
        kind: dk_core::ResourceKind,
        url: &str,
        text: Option<&str>,
    ) -> Result<(), String> {
        let document = self
            .deck
            .slide_mut(slide)
            .ok_or_else(|| format!("slide {slide} out of range"))?;
        let node = path
            .resolve_mut(document)
            .ok_or_else(|| format!("path {path} does not resolve on slide {slide}"))?;
        let Value::Object(leaf) = node else {
            return Err(format!("node at {path} is not an object"));
        };

        set_field(leaf, kind.url_field(), url);
        if let Some(text) = text {
            set_field(leaf, kind.text_field(), text);
        }
        Ok(())
    }

    // ─── Frame properties side table ─────────────────────────────────────

    pub fn set_frame_properties(&mut self, slide: usize, ordinal: usize, props: FrameProperties) {
        self.properties.insert((slide, ordinal), props);
    }

    pub fn frame_properties(&self, slide: usize, ordinal: usize) -> Option<FrameProperties> {
        self.properties.get(&(slide, ordinal)).copied()
    }
}

fn set_field(leaf: &mut Map<String, Value>, field: &str, value: &str) {
    leaf.insert(field.to_string(), Value::String(value.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use dk_core::document::{ICON_QUERY_FIELD, ICON_URL_FIELD, IMAGE_PROMPT_FIELD, IMAGE_URL_FIELD};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store() -> DeckStore {
        DeckStore::new(Deck::new(
            "deck-1",
            "Demo",
            vec![json!({
                "hero": { IMAGE_URL_FIELD: "/old/hero-image-01.png", IMAGE_PROMPT_FIELD: "old prompt" },
                "items": [ { "icon": { ICON_URL_FIELD: "/static/icons/bolt.svg" } } ],
            })],
        ))
    }

    #[test]
    fn set_image_replaces_url_and_prompt() {
        let mut store = store();
        let path = DataPath::parse("hero").unwrap();
        store
            .set_image(0, &path, "/new/hero-image-02.png", Some("new prompt"))
            .unwrap();

        let slide = store.slide(0).unwrap();
        assert_eq!(slide["hero"][IMAGE_URL_FIELD], "/new/hero-image-02.png");
        assert_eq!(slide["hero"][IMAGE_PROMPT_FIELD], "new prompt");
    }

    #[test]
    fn set_image_without_prompt_keeps_existing_prompt() {
        let mut store = store();
        let path = DataPath::parse("hero").unwrap();
        store.set_image(0, &path, "/new/url-image-777.png", None).unwrap();
        assert_eq!(store.slide(0).unwrap()["hero"][IMAGE_PROMPT_FIELD], "old prompt");
    }

    #[test]
    fn set_icon_writes_query_field() {
        let mut store = store();
        let path = DataPath::parse("items[0].icon").unwrap();
        store
            .set_icon(0, &path, "/static/icons/leaf.svg", Some("leaf"))
            .unwrap();

        let leaf = &store.slide(0).unwrap()["items"][0]["icon"];
        assert_eq!(leaf[ICON_URL_FIELD], "/static/icons/leaf.svg");
        assert_eq!(leaf[ICON_QUERY_FIELD], "leaf");
    }

    #[test]
    fn unresolvable_path_leaves_document_untouched() {
        let mut store = store();
        let before = store.slide(0).unwrap().clone();
        let path = DataPath::parse("items[4].icon").unwrap();
        assert!(store.set_icon(0, &path, "/x.svg", None).is_err());
        assert_eq!(store.slide(0).unwrap(), &before);
    }

    #[test]
    fn non_object_target_is_an_error() {
        let mut store = store();
        let path = DataPath::parse("hero.__image_url__").unwrap();
        assert!(store.set_image(0, &path, "/x.png", None).is_err());
    }

    #[test]
    fn frame_properties_round_trip() {
        let mut store = store();
        assert_eq!(store.frame_properties(0, 1), None);
        let props = FrameProperties {
            fit: FitMode::Contain,
            focus_x: 25.0,
            focus_y: 75.0,
        };
        store.set_frame_properties(0, 1, props);
        assert_eq!(store.frame_properties(0, 1), Some(props));
        assert_eq!(props.position_css(), "25% 75%");
        // The slide document itself is untouched.
        assert!(store.slide(0).unwrap().get("properties").is_none());
    }
}
