//! Overlay binder: attaches edit affordances to rendered media elements.
//!
//! The binder is driven by the host's event loop. After a slide's data or
//! children change it waits out a short delay (the renderer settles
//! asynchronously), then scans the rendered tree for unbound media
//! elements, resolves each back to the document location that produced it,
//! and attaches interaction behavior. Structural mutations observed on the
//! tree debounce a rescan, so media that appears late still becomes
//! editable.
//!
//! Attached behavior is tracked per element in a [`BindingRecord`] whose
//! retraction procedure removes exactly what binding added. Records are
//! owned here, keyed by element id, and every record is retracted before
//! the next bind cycle: a binding referencing a previous document must
//! never survive a data change.

use crate::history::History;
use crate::resolve::resolve_binding;
use crate::schedule::{RESCAN_DEBOUNCE_MS, SCAN_DELAY_MS, Timer};
use crate::store::{DeckStore, FrameProperties};
use dk_core::document::{ResourceKind, resource_text};
use dk_core::path::DataPath;
use dk_render::id::ElementId;
use dk_render::tree::{HandlerKind, RenderTree};
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Marker attribute on bound elements; scans skip elements that carry it.
pub const BOUND_ATTR: &str = "data-editable-bound";

/// Identifier attribute tying an element to its resolved location.
pub const BINDING_ID_ATTR: &str = "data-editable-id";

const HOVER_TRANSITION: &str = "opacity 0.2s, transform 0.2s";

/// Runtime association between one rendered element and one resolved
/// document location, plus everything needed to take it apart again.
#[derive(Debug)]
pub struct BindingRecord {
    pub element: ElementId,
    pub kind: ResourceKind,
    pub path: DataPath,
    /// The reference the element was resolved against.
    pub source: String,
    /// Prompt/query text captured from the leaf at bind time.
    pub text: String,
    /// Media ordinal at bind time; keys the frame-properties side table.
    pub ordinal: usize,
    handlers: SmallVec<[u64; 4]>,
    styles_set: SmallVec<[&'static str; 4]>,
    retracted: bool,
}

impl BindingRecord {
    /// Remove every externally observable effect this binding introduced:
    /// handlers, inline style overrides, and the marker attributes.
    /// Idempotent; the second call is a no-op.
    pub fn retract(&mut self, tree: &mut RenderTree) {
        if self.retracted {
            return;
        }
        self.retracted = true;

        for handler in self.handlers.drain(..) {
            tree.remove_handler(self.element, handler);
        }
        for property in self.styles_set.drain(..) {
            tree.clear_style(self.element, property);
        }
        // Hover feedback may have left an opacity override behind.
        tree.clear_style(self.element, "opacity");
        tree.remove_attr(self.element, BOUND_ATTR);
        tree.remove_attr(self.element, BINDING_ID_ATTR);
    }
}

/// The editor surface currently open, if any. The host renders the actual
/// surface; this is the state it reads and calls back against.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEditor {
    pub element: ElementId,
    pub kind: ResourceKind,
    pub path: DataPath,
    pub source: String,
    pub text: String,
    pub ordinal: usize,
}

/// Binds one slide's rendered tree to its document.
#[derive(Debug, Default)]
pub struct OverlayBinder {
    slide_index: usize,
    bindings: HashMap<ElementId, BindingRecord>,
    scan_timer: Timer,
    rescan_timer: Timer,
    active_editor: Option<ActiveEditor>,
}

impl OverlayBinder {
    pub fn new(slide_index: usize) -> Self {
        Self {
            slide_index,
            ..Default::default()
        }
    }

    pub fn slide_index(&self) -> usize {
        self.slide_index
    }

    pub fn bound_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn binding(&self, element: ElementId) -> Option<&BindingRecord> {
        self.bindings.get(&element)
    }

    pub fn is_bound(&self, element: ElementId) -> bool {
        self.bindings.contains_key(&element)
    }

    // ─── Scan scheduling ─────────────────────────────────────────────────

    /// The slide's data or children changed: retract every current binding
    /// now, and scan once the renderer has had time to settle.
    pub fn schedule_scan(&mut self, now: u64, tree: &mut RenderTree) {
        self.retract_all(tree);
        self.scan_timer.arm(now, SCAN_DELAY_MS);
    }

    /// Drain the tree's mutation journal; newly inserted media debounces
    /// a rescan.
    pub fn notify_mutations(&mut self, now: u64, tree: &mut RenderTree) {
        let mutations = tree.take_mutations();
        if mutations.iter().any(|m| m.adds_media) {
            self.rescan_timer.arm(now, RESCAN_DEBOUNCE_MS);
        }
    }

    /// Pump due timers. Fires at most one scan per call even when both
    /// timers are due.
    pub fn tick(&mut self, now: u64, tree: &mut RenderTree, store: &DeckStore) {
        let scan_due = self.scan_timer.fire_due(now);
        let rescan_due = self.rescan_timer.fire_due(now);
        if scan_due || rescan_due {
            self.scan(tree, store);
        }
    }

    /// Retract every binding. Scheduled work stays pending.
    pub fn retract_all(&mut self, tree: &mut RenderTree) {
        for (_, mut record) in self.bindings.drain() {
            record.retract(tree);
        }
    }

    /// Tear the overlay down: retract bindings, cancel pending timers,
    /// drop any open editor.
    pub fn unmount(&mut self, tree: &mut RenderTree) {
        self.retract_all(tree);
        self.scan_timer.cancel();
        self.rescan_timer.cancel();
        self.active_editor = None;
    }

    // ─── Scanning ────────────────────────────────────────────────────────

    /// Enumerate unbound media elements and bind what resolves. Elements
    /// that fail to resolve are left alone and retried on the next scan.
    pub fn scan(&mut self, tree: &mut RenderTree, store: &DeckStore) {
        let Some(document) = store.slide(self.slide_index) else {
            return;
        };

        let media = tree.media_elements();
        for (ordinal, &element) in media.iter().enumerate() {
            if tree.attr(element, BOUND_ATTR).is_some() {
                continue;
            }
            let Some(source) = tree.effective_source(element).map(str::to_string) else {
                continue;
            };

            let media_kind = tree.get(element).and_then(|e| e.kind.media_kind());
            let Some(found) = resolve_binding(&source, element, tree, document) else {
                log::debug!(
                    "slide {}: no document match for {source:?}, element left unbound",
                    self.slide_index
                );
                continue;
            };
            // Icon graphics only ever bind to icon leaves; an image leaf
            // that happens to share the reference is someone else's.
            if media_kind == Some(ResourceKind::Icon) && found.kind != ResourceKind::Icon {
                continue;
            }

            let text = resource_text(found.leaf, found.kind)
                .unwrap_or_default()
                .to_string();
            let kind = found.kind;
            let path = found.path;
            self.attach(tree, store, element, ordinal, kind, path, source, text);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn attach(
        &mut self,
        tree: &mut RenderTree,
        store: &DeckStore,
        element: ElementId,
        ordinal: usize,
        kind: ResourceKind,
        path: DataPath,
        source: String,
        text: String,
    ) {
        tree.set_attr(element, BOUND_ATTR, "true");
        let binding_id = format!("{}-{kind}-{path}-{ordinal}", self.slide_index);
        tree.set_attr(element, BINDING_ID_ATTR, &binding_id);

        let mut handlers = SmallVec::new();
        for handler_kind in [
            HandlerKind::Activate,
            HandlerKind::HoverEnter,
            HandlerKind::HoverLeave,
        ] {
            if let Some(id) = tree.add_handler(element, handler_kind) {
                handlers.push(id);
            }
        }

        let mut styles_set: SmallVec<[&'static str; 4]> = SmallVec::new();
        tree.set_style(element, "cursor", "pointer");
        styles_set.push("cursor");
        tree.set_style(element, "transition", HOVER_TRANSITION);
        styles_set.push("transition");

        if kind == ResourceKind::Image
            && let Some(props) = store.frame_properties(self.slide_index, ordinal)
        {
            tree.set_style(element, "object-fit", props.fit.as_css());
            styles_set.push("object-fit");
            tree.set_style(element, "object-position", &props.position_css());
            styles_set.push("object-position");
        }

        self.bindings.insert(
            element,
            BindingRecord {
                element,
                kind,
                path,
                source,
                text,
                ordinal,
                handlers,
                styles_set,
                retracted: false,
            },
        );
    }

    // ─── Interaction ─────────────────────────────────────────────────────

    /// Primary activation on a bound element: open the editor surface for
    /// its resource kind. Returns false for unbound elements.
    pub fn activate(&mut self, element: ElementId) -> bool {
        let Some(record) = self.bindings.get(&element) else {
            return false;
        };
        self.active_editor = Some(ActiveEditor {
            element: record.element,
            kind: record.kind,
            path: record.path.clone(),
            source: record.source.clone(),
            text: record.text.clone(),
            ordinal: record.ordinal,
        });
        true
    }

    pub fn active_editor(&self) -> Option<&ActiveEditor> {
        self.active_editor.as_ref()
    }

    pub fn close_editor(&mut self) {
        self.active_editor = None;
    }

    /// Hover feedback on a bound element.
    pub fn pointer_enter(&mut self, tree: &mut RenderTree, element: ElementId) {
        if self.is_bound(element) {
            tree.set_style(element, "opacity", "0.8");
        }
    }

    pub fn pointer_leave(&mut self, tree: &mut RenderTree, element: ElementId) {
        if self.is_bound(element) {
            tree.set_style(element, "opacity", "1");
        }
    }

    // ─── Editor submissions ──────────────────────────────────────────────

    /// The image editor reported a new resource: record history, write the
    /// document, update the on-screen element immediately, close the
    /// editor.
    ///
    /// # Errors
    /// There must be an open image editor and its bound path must still
    /// resolve to a leaf object; on error nothing changes.
    pub fn submit_image(
        &mut self,
        tree: &mut RenderTree,
        store: &mut DeckStore,
        history: &mut History,
        url: &str,
        prompt: Option<&str>,
    ) -> Result<(), String> {
        let active = self.expect_editor(store, ResourceKind::Image)?;

        history.record(store);
        let prompt = prompt.unwrap_or(&active.text);
        store.set_image(self.slide_index, &active.path, url, Some(prompt))?;

        tree.set_image_src(active.element, url);
        self.active_editor = None;
        Ok(())
    }

    /// The icon editor reported a new resource: record history and write
    /// the document. The editor stays open; dismissal is caller-driven.
    pub fn submit_icon(
        &mut self,
        store: &mut DeckStore,
        history: &mut History,
        url: &str,
        query: Option<&str>,
    ) -> Result<(), String> {
        let active = self.expect_editor(store, ResourceKind::Icon)?;

        history.record(store);
        let query = query.unwrap_or(&active.text);
        store.set_icon(self.slide_index, &active.path, url, Some(query))?;
        Ok(())
    }

    /// Crop/focus changed for the active element. Presentation-only: the
    /// side table is updated and the element restyled, the slide document
    /// and history are untouched.
    pub fn set_frame_properties(
        &mut self,
        tree: &mut RenderTree,
        store: &mut DeckStore,
        props: FrameProperties,
    ) -> Result<(), String> {
        let active = self
            .active_editor
            .clone()
            .ok_or_else(|| "no editor surface is open".to_string())?;

        store.set_frame_properties(self.slide_index, active.ordinal, props);
        tree.set_style(active.element, "object-fit", props.fit.as_css());
        tree.set_style(active.element, "object-position", &props.position_css());
        if let Some(record) = self.bindings.get_mut(&active.element) {
            for property in ["object-fit", "object-position"] {
                if !record.styles_set.contains(&property) {
                    record.styles_set.push(property);
                }
            }
        }
        Ok(())
    }

    /// Route a key event: Escape closes an open editor; undo/redo apply
    /// when their stack is non-empty. Returns true when consumed, so the
    /// host can suppress the platform default.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        store: &mut DeckStore,
        history: &mut History,
        now: u64,
    ) -> bool {
        use crate::shortcuts::{ShortcutAction, ShortcutMap};
        match ShortcutMap::resolve(key, ctrl, shift, alt, meta) {
            Some(ShortcutAction::CloseEditor) => {
                if self.active_editor.is_some() {
                    self.active_editor = None;
                    true
                } else {
                    false
                }
            }
            Some(action) => history.handle_shortcut(action, store, now),
            None => false,
        }
    }

    /// Validate the active editor for a submission of `kind`: it must be
    /// open, of the right kind, and its path must still address a leaf
    /// object on the current document.
    fn expect_editor(&self, store: &DeckStore, kind: ResourceKind) -> Result<ActiveEditor, String> {
        let active = self
            .active_editor
            .clone()
            .ok_or_else(|| "no editor surface is open".to_string())?;
        if active.kind != kind {
            return Err(format!("open editor is for {}, not {kind}", active.kind));
        }
        let resolvable = store
            .slide(self.slide_index)
            .and_then(|slide| active.path.resolve(slide))
            .is_some_and(Value::is_object);
        if !resolvable {
            return Err(format!("binding for {} is stale", active.path));
        }
        Ok(active)
    }
}
