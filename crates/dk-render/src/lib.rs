pub mod cache;
pub mod fetch;
pub mod id;
pub mod svg;
pub mod tree;

pub use cache::{DEFAULT_ICON_CACHE_CAPACITY, IconCache};
pub use fetch::{FetchError, IconLoader, IconPayload, IconSource, LoadTicket};
pub use id::ElementId;
pub use svg::{IconStyle, normalize_icon_markup, placeholder_glyph};
pub use tree::{
    DATA_PATH_ATTR, ElementKind, Handler, HandlerKind, RenderElement, RenderTree, TreeMutation,
};

// Re-export petgraph's index type so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
