//! Data-path locator: find every document location matching a reference.
//!
//! Recursively walks a slide document in deterministic document order
//! (object insertion order, then array index order; `serde_json` is built
//! with `preserve_order` so object iteration is insertion order) and
//! records every resource-bearing leaf whose reference matches the target.
//! The resolver relies on this ordering for positional disambiguation, so
//! it must never change between scans of the same document.

use crate::document::{ResourceKind, resource_ref};
use crate::matcher::references_match;
use crate::path::DataPath;
use serde_json::Value;

/// One located resource-bearing leaf.
#[derive(Debug, Clone)]
pub struct PathMatch<'a> {
    pub path: DataPath,
    pub kind: ResourceKind,
    pub leaf: &'a Value,
}

/// Whether a stored leaf reference matches the rendered target reference.
///
/// The containment pass is the lenient bootstrap: a rendered `src` that was
/// proxied or rewritten still embeds the stored reference verbatim. It is
/// unioned with strict equivalence so every matcher-equivalent leaf is
/// found even when the rendered form does not contain the stored one.
/// The extra collisions containment produces on short default references
/// are absorbed by the resolver's positional tie-break.
fn leaf_matches(target: &str, leaf_ref: &str) -> bool {
    target.contains(leaf_ref) || references_match(target, leaf_ref)
}

/// Find every location in `document` whose resource reference matches
/// `target`, in document order.
pub fn find_all_paths<'a>(target: &str, document: &'a Value) -> Vec<PathMatch<'a>> {
    let mut matches = Vec::new();
    if !target.is_empty() {
        visit(target, document, &DataPath::root(), &mut matches);
    }
    matches
}

fn visit<'a>(target: &str, node: &'a Value, path: &DataPath, out: &mut Vec<PathMatch<'a>>) {
    match node {
        Value::Object(map) => {
            // Check this node's own reserved fields, image before icon.
            for kind in [ResourceKind::Image, ResourceKind::Icon] {
                if let Some(leaf_ref) = resource_ref(node, kind)
                    && leaf_matches(target, leaf_ref)
                {
                    out.push(PathMatch {
                        path: path.clone(),
                        kind,
                        leaf: node,
                    });
                }
            }

            for (key, value) in map {
                match value {
                    Value::Array(items) => {
                        let child = path.child_key(key);
                        for (i, item) in items.iter().enumerate() {
                            visit(target, item, &child.child_index(i), out);
                        }
                    }
                    Value::Object(_) => visit(target, value, &path.child_key(key), out),
                    // Scalars and nulls cannot carry resource fields.
                    _ => {}
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                visit(target, item, &path.child_index(i), out);
            }
        }
        _ => {}
    }
}
