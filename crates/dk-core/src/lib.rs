pub mod document;
pub mod locate;
pub mod matcher;
pub mod path;

pub use document::{Deck, ResourceKind};
pub use locate::{PathMatch, find_all_paths};
pub use matcher::references_match;
pub use path::{DataPath, PathSegment};
