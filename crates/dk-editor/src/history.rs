//! Edit history: snapshot stacks with replace semantics.
//!
//! Every committed edit pushes a deep copy of the slide list; undo/redo
//! replace the live slides wholesale with a stack entry (never merge).
//! Pushing a new edit clears the redo side: branching history is not
//! supported, redo is only valid immediately after an undo.
//!
//! A transition does not finish instantly: dependent logic (autosave,
//! re-binding) must be able to tell "document changed because of an edit"
//! from "document changed because of a replay", so the manager stays in
//! the Applying state for a short settle delay after each transition and
//! refuses to record new entries until it returns to Idle.

use crate::schedule::{HISTORY_SETTLE_MS, Timer};
use crate::shortcuts::ShortcutAction;
use crate::store::DeckStore;
use serde_json::Value;

/// Default maximum undo depth; the oldest entry is trimmed beyond it.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// One frozen slide list. `Value::clone` is a deep copy, so an entry
/// shares no memory with the live document.
type Snapshot = Vec<Value>;

/// Manages undo/redo stacks over full-document snapshots.
#[derive(Debug)]
pub struct History {
    past: Vec<Snapshot>,
    future: Vec<Snapshot>,
    max_depth: usize,
    applying: bool,
    settle: Timer,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            max_depth: max_depth.max(1),
            applying: false,
            settle: Timer::new(),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Whether a history transition is still settling.
    pub fn is_applying(&self) -> bool {
        self.applying
    }

    /// Record the current document as a past entry, ahead of a forward
    /// edit. Clears the redo side. Refused while a transition settles:
    /// a replayed document must not re-enter the stacks as a new edit.
    pub fn record(&mut self, store: &DeckStore) {
        if self.applying {
            return;
        }
        self.past.push(store.slides().to_vec());
        if self.past.len() > self.max_depth {
            self.past.remove(0);
        }
        self.future.clear();
    }

    /// Step back one entry. No-op on an empty past stack.
    pub fn undo(&mut self, store: &mut DeckStore, now: u64) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        self.future.push(store.slides().to_vec());
        // The popped snapshot is moved into the store, not shared; by
        // ownership it no longer aliases any stack entry.
        store.replace_slides(previous);
        self.enter_applying(now);
        true
    }

    /// Step forward one entry. No-op on an empty future stack.
    pub fn redo(&mut self, store: &mut DeckStore, now: u64) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        self.past.push(store.slides().to_vec());
        store.replace_slides(next);
        self.enter_applying(now);
        true
    }

    fn enter_applying(&mut self, now: u64) {
        self.applying = true;
        self.settle.arm(now, HISTORY_SETTLE_MS);
    }

    /// Leave the Applying state once the settle delay has elapsed.
    pub fn tick(&mut self, now: u64) {
        if self.settle.fire_due(now) {
            self.applying = false;
        }
    }

    /// Apply a resolved keyboard shortcut. Returns true when the shortcut
    /// was consumed (the host should suppress the platform default); an
    /// undo/redo against an empty stack is not consumed.
    pub fn handle_shortcut(
        &mut self,
        action: ShortcutAction,
        store: &mut DeckStore,
        now: u64,
    ) -> bool {
        match action {
            ShortcutAction::Undo => self.undo(store, now),
            ShortcutAction::Redo => self.redo(store, now),
            ShortcutAction::CloseEditor => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dk_core::document::Deck;
    use serde_json::json;

    fn store_with(marker: &str) -> DeckStore {
        DeckStore::new(Deck::new("d", "t", vec![json!({ "marker": marker })]))
    }

    #[test]
    fn underflow_is_a_silent_noop() {
        let mut history = History::new(10);
        let mut store = store_with("a");
        assert!(!history.undo(&mut store, 0));
        assert!(!history.redo(&mut store, 0));
        assert_eq!(store.slides()[0]["marker"], "a");
    }

    #[test]
    fn applying_clears_after_settle_delay() {
        let mut history = History::new(10);
        let mut store = store_with("a");
        history.record(&store);
        store.replace_slides(vec![json!({ "marker": "b" })]);

        assert!(history.undo(&mut store, 1_000));
        assert!(history.is_applying());

        history.tick(1_000 + HISTORY_SETTLE_MS - 1);
        assert!(history.is_applying());
        history.tick(1_000 + HISTORY_SETTLE_MS);
        assert!(!history.is_applying());
    }

    #[test]
    fn record_is_refused_while_applying() {
        let mut history = History::new(10);
        let mut store = store_with("a");
        history.record(&store);
        store.replace_slides(vec![json!({ "marker": "b" })]);
        history.undo(&mut store, 0);

        assert!(history.can_redo());
        history.record(&store);
        // Still redoable: the record during Applying was dropped.
        assert!(history.can_redo());
    }

    #[test]
    fn depth_bound_trims_oldest() {
        let mut history = History::new(3);
        let mut store = store_with("0");
        for i in 1..=5 {
            history.record(&store);
            store.replace_slides(vec![json!({ "marker": i.to_string() })]);
        }

        let mut undo_count = 0;
        while history.undo(&mut store, 0) {
            history.tick(u64::MAX);
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
        // Deepest reachable state is the trimmed stack's oldest entry.
        assert_eq!(store.slides()[0]["marker"], "2");
    }
}
