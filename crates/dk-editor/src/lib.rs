pub mod bind;
pub mod history;
pub mod resolve;
pub mod schedule;
pub mod shortcuts;
pub mod store;

pub use bind::{ActiveEditor, BindingRecord, OverlayBinder};
pub use history::{DEFAULT_HISTORY_DEPTH, History};
pub use resolve::resolve_binding;
pub use schedule::{HISTORY_SETTLE_MS, RESCAN_DEBOUNCE_MS, SCAN_DELAY_MS, Timer};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{DeckStore, FitMode, FrameProperties};
