//! Rendered visual tree: the observable surface of the rendering collaborator.
//!
//! The engine never renders slides itself. An external renderer turns
//! (slide document, slide index) into a tree of visual elements and keeps
//! mutating it as asynchronous content settles. This module models exactly
//! what the overlay binder can see and touch on that tree:
//!
//! - structure and document order (parent → child edges);
//! - string attributes (locator declarations, binder markers);
//! - inline presentation styles (cursor, transition, opacity, crop);
//! - attached input handlers, identified so they can be removed exactly;
//! - a journal of structural mutations for the binder's driver to drain.

use crate::id::ElementId;
use dk_core::document::ResourceKind;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Attribute a renderer sets on an icon wrapper to declare which resource
/// reference produced the graphic inside it. Icon graphics carry no
/// reference of their own; the binder looks up the nearest ancestor that
/// declares one.
pub const DATA_PATH_ATTR: &str = "data-path";

/// What kind of visual element a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Root of a slide's rendered tree.
    Root,
    /// Generic container (panels, wrappers, text blocks).
    Container,
    /// Raster image with a resolved source.
    Image { src: String },
    /// Inline vector graphic, markup already normalized for display.
    IconGraphic { markup: String },
}

impl ElementKind {
    /// The resource kind this element renders, if it is a media element.
    pub fn media_kind(&self) -> Option<ResourceKind> {
        match self {
            ElementKind::Image { .. } => Some(ResourceKind::Image),
            ElementKind::IconGraphic { .. } => Some(ResourceKind::Icon),
            _ => None,
        }
    }
}

/// Input handler kinds the binder attaches to bound elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Primary activation (click/tap); opens the editor surface.
    Activate,
    HoverEnter,
    HoverLeave,
}

/// An attached handler: its kind plus a registration id, so retraction
/// removes exactly what binding added and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handler {
    pub id: u64,
    pub kind: HandlerKind,
}

/// A single rendered element.
#[derive(Debug, Clone)]
pub struct RenderElement {
    pub id: ElementId,
    pub kind: ElementKind,
    /// String attributes.
    pub attributes: HashMap<String, String>,
    /// Inline presentation overrides, keyed by property name.
    pub styles: HashMap<String, String>,
    /// Input handlers currently attached.
    pub handlers: SmallVec<[Handler; 4]>,
}

impl RenderElement {
    pub fn new(id: ElementId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            attributes: HashMap::new(),
            styles: HashMap::new(),
            handlers: SmallVec::new(),
        }
    }

    pub fn container(id: ElementId) -> Self {
        Self::new(id, ElementKind::Container)
    }

    pub fn image(id: ElementId, src: impl Into<String>) -> Self {
        Self::new(id, ElementKind::Image { src: src.into() })
    }

    pub fn icon_graphic(id: ElementId, markup: impl Into<String>) -> Self {
        Self::new(
            id,
            ElementKind::IconGraphic {
                markup: markup.into(),
            },
        )
    }

    /// Attach an attribute at construction time (renderer-side sugar).
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }
}

/// A structural mutation observed on the tree.
#[derive(Debug, Clone)]
pub struct TreeMutation {
    /// Element added by this mutation.
    pub added: ElementId,
    /// Whether the added element is a media element (image or icon graphic).
    pub adds_media: bool,
}

/// The rendered tree for one slide.
#[derive(Debug, Clone)]
pub struct RenderTree {
    /// The underlying directed graph; edges go parent → child.
    graph: StableDiGraph<RenderElement, ()>,
    root: NodeIndex,
    /// Index from ElementId → NodeIndex for fast lookup.
    id_index: HashMap<ElementId, NodeIndex>,
    /// Structural mutations since the last drain.
    journal: Vec<TreeMutation>,
    next_handler_id: u64,
}

impl RenderTree {
    /// Create a new tree holding only the slide root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_id = ElementId::intern("slide_root");
        let root = graph.add_node(RenderElement::new(root_id, ElementKind::Root));

        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);

        Self {
            graph,
            root,
            id_index,
            journal: Vec::new(),
            next_handler_id: 0,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Add an element as a child of `parent` and journal the insertion.
    pub fn add_element(&mut self, parent: NodeIndex, element: RenderElement) -> NodeIndex {
        let id = element.id;
        let adds_media = element.kind.media_kind().is_some();
        let idx = self.graph.add_node(element);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        self.journal.push(TreeMutation {
            added: id,
            adds_media,
        });
        idx
    }

    /// Remove an element, keeping the `id_index` synchronized.
    /// The caller is responsible for its subtree.
    pub fn remove_element(&mut self, idx: NodeIndex) -> Option<RenderElement> {
        let removed = self.graph.remove_node(idx);
        if let Some(element) = &removed {
            self.id_index.remove(&element.id);
        }
        removed
    }

    /// Drain the mutation journal. The binder's driver calls this and
    /// debounces a rescan when any drained entry added media.
    pub fn take_mutations(&mut self) -> Vec<TreeMutation> {
        std::mem::take(&mut self.journal)
    }

    pub fn get(&self, id: ElementId) -> Option<&RenderElement> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut RenderElement> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: ElementId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    /// Children of a node in document (insertion) order.
    ///
    /// Sorts by `NodeIndex` so the result is deterministic regardless of
    /// how `petgraph` iterates its adjacency list on different targets.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// All media elements (images and icon graphics) in document order.
    /// Positional disambiguation in the resolver depends on this order
    /// matching the locator's traversal order of the source document.
    pub fn media_elements(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect_media(self.root, &mut out);
        out
    }

    fn collect_media(&self, idx: NodeIndex, out: &mut Vec<ElementId>) {
        let element = &self.graph[idx];
        if element.kind.media_kind().is_some() {
            out.push(element.id);
        }
        for child in self.children(idx) {
            self.collect_media(child, out);
        }
    }

    /// The value of `name` on the closest element starting from `id` and
    /// walking up through its ancestors (the element itself included).
    pub fn nearest_attr(&self, id: ElementId, name: &str) -> Option<&str> {
        let mut cursor = self.index_of(id)?;
        loop {
            if let Some(value) = self.graph[cursor].attributes.get(name) {
                return Some(value);
            }
            cursor = self.parent(cursor)?;
        }
    }

    /// The reference a media element is effectively rendered from: an
    /// image's own `src`, or the nearest declared locator for an icon
    /// graphic. `None` for non-media elements.
    pub fn effective_source(&self, id: ElementId) -> Option<&str> {
        match &self.get(id)?.kind {
            ElementKind::Image { src } => Some(src.as_str()),
            ElementKind::IconGraphic { .. } => self.nearest_attr(id, DATA_PATH_ATTR),
            _ => None,
        }
    }

    /// Optimistically swap an image's source after an edit. Returns false
    /// if the element is missing or not an image.
    pub fn set_image_src(&mut self, id: ElementId, src: &str) -> bool {
        match self.get_mut(id) {
            Some(element) => match &mut element.kind {
                ElementKind::Image { src: current } => {
                    *current = src.to_string();
                    true
                }
                _ => false,
            },
            None => false,
        }
    }

    // ─── Attributes & styles ─────────────────────────────────────────────

    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        self.get(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, id: ElementId, name: &str, value: &str) {
        if let Some(element) = self.get_mut(id) {
            element.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, id: ElementId, name: &str) {
        if let Some(element) = self.get_mut(id) {
            element.attributes.remove(name);
        }
    }

    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        self.get(id)?.styles.get(property).map(String::as_str)
    }

    pub fn set_style(&mut self, id: ElementId, property: &str, value: &str) {
        if let Some(element) = self.get_mut(id) {
            element.styles.insert(property.to_string(), value.to_string());
        }
    }

    pub fn clear_style(&mut self, id: ElementId, property: &str) {
        if let Some(element) = self.get_mut(id) {
            element.styles.remove(property);
        }
    }

    // ─── Handlers ────────────────────────────────────────────────────────

    /// Attach a handler, returning its registration id.
    pub fn add_handler(&mut self, id: ElementId, kind: HandlerKind) -> Option<u64> {
        self.next_handler_id += 1;
        let handler_id = self.next_handler_id;
        let element = self.get_mut(id)?;
        element.handlers.push(Handler {
            id: handler_id,
            kind,
        });
        Some(handler_id)
    }

    /// Remove a previously attached handler. Removing an unknown id is a
    /// no-op (the element may already be gone).
    pub fn remove_handler(&mut self, id: ElementId, handler_id: u64) -> bool {
        match self.get_mut(id) {
            Some(element) => {
                let before = element.handlers.len();
                element.handlers.retain(|h| h.id != handler_id);
                element.handlers.len() != before
            }
            None => false,
        }
    }
}
