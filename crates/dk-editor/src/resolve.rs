//! Element-to-path resolution: pick exactly one document location for a
//! rendered element.
//!
//! Several leaves routinely share one reference (default placeholders), so
//! the locator's match list often has more than one entry. Disambiguation
//! leans on document order: the locator walks the document in the same
//! order the renderer emits elements, so the element's position among
//! same-reference media usually indexes its leaf directly. Degradation is
//! graceful on purpose: a plausible-but-wrong binding keeps the element
//! editable, while failing would silently make it inert.

use dk_core::locate::{PathMatch, find_all_paths};
use dk_core::matcher::references_match;
use dk_render::id::ElementId;
use dk_render::tree::RenderTree;
use serde_json::Value;

/// Resolve `element` (rendered from `target`) to one document location.
///
/// - no candidate: `None`; the element stays unbound and is retried on a
///   later scan;
/// - one candidate: taken unconditionally;
/// - several: position among same-reference media, then global media
///   position, then the first candidate.
pub fn resolve_binding<'a>(
    target: &str,
    element: ElementId,
    tree: &RenderTree,
    document: &'a Value,
) -> Option<PathMatch<'a>> {
    let mut matches = find_all_paths(target, document);
    match matches.len() {
        0 => None,
        1 => Some(matches.remove(0)),
        _ => {
            let pick = disambiguate(target, element, tree, matches.len());
            Some(matches.remove(pick))
        }
    }
}

fn disambiguate(target: &str, element: ElementId, tree: &RenderTree, candidates: usize) -> usize {
    let media = tree.media_elements();
    let global_index = media.iter().position(|&m| m == element);

    // Rendered media whose own effective reference matches the target;
    // the element's rank within this group mirrors the match list.
    let same_reference: Vec<ElementId> = media
        .iter()
        .copied()
        .filter(|&m| {
            tree.effective_source(m)
                .is_some_and(|source| references_match(source, target))
        })
        .collect();
    let group_index = same_reference.iter().position(|&m| m == element);

    log::debug!(
        "ambiguous reference {target:?}: {candidates} candidates, element {element} \
         at group index {group_index:?}, global index {global_index:?}"
    );

    group_index
        .filter(|&i| i < candidates)
        .or(global_index.filter(|&i| i < candidates))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dk_render::tree::{DATA_PATH_ATTR, RenderElement};
    use serde_json::json;

    const PLACEHOLDER: &str = "/static/icons/placeholder.svg";

    /// Two bullet icons sharing the default placeholder, rendered in
    /// document order.
    fn two_icon_fixture() -> (RenderTree, ElementId, ElementId) {
        let mut tree = RenderTree::new();
        let first = ElementId::with_prefix("svg");
        let second = ElementId::with_prefix("svg");
        for id in [first, second] {
            let wrapper = tree.add_element(
                tree.root(),
                RenderElement::container(ElementId::with_prefix("span"))
                    .with_attr(DATA_PATH_ATTR, PLACEHOLDER),
            );
            tree.add_element(wrapper, RenderElement::icon_graphic(id, "<svg/>"));
        }
        (tree, first, second)
    }

    #[test]
    fn no_candidates_resolves_to_none() {
        let (tree, first, _) = two_icon_fixture();
        let doc = json!({ "title": "no icons here" });
        assert!(resolve_binding(PLACEHOLDER, first, &tree, &doc).is_none());
    }

    #[test]
    fn single_candidate_is_unconditional() {
        let mut tree = RenderTree::new();
        let img = ElementId::intern("lone_img");
        tree.add_element(tree.root(), RenderElement::image(img, "/a/cover-photo-9.png"));
        let doc = json!({ "cover": { "__image_url__": "/a/cover-photo-9.png" } });

        let m = resolve_binding("/a/cover-photo-9.png", img, &tree, &doc).unwrap();
        assert_eq!(m.path.to_string(), "cover");
    }

    #[test]
    fn shared_reference_disambiguates_by_document_order() {
        let (tree, first, second) = two_icon_fixture();
        let doc = json!({
            "items": [
                { "icon": { "__icon_url__": PLACEHOLDER } },
                { "icon": { "__icon_url__": PLACEHOLDER } },
            ]
        });

        let m0 = resolve_binding(PLACEHOLDER, first, &tree, &doc).unwrap();
        let m1 = resolve_binding(PLACEHOLDER, second, &tree, &doc).unwrap();
        assert_eq!(m0.path.to_string(), "items[0].icon");
        assert_eq!(m1.path.to_string(), "items[1].icon");
    }

    #[test]
    fn falls_back_to_first_match_when_positions_overflow() {
        // Three rendered icons but only two document candidates: the third
        // element's group and global positions both overflow the match
        // list, so it degrades to the first match rather than failing.
        let (mut tree, _, _) = two_icon_fixture();
        let third = ElementId::with_prefix("svg");
        let wrapper = tree.add_element(
            tree.root(),
            RenderElement::container(ElementId::with_prefix("span"))
                .with_attr(DATA_PATH_ATTR, PLACEHOLDER),
        );
        tree.add_element(wrapper, RenderElement::icon_graphic(third, "<svg/>"));

        let doc = json!({
            "items": [
                { "icon": { "__icon_url__": PLACEHOLDER } },
                { "icon": { "__icon_url__": PLACEHOLDER } },
            ]
        });
        let m = resolve_binding(PLACEHOLDER, third, &tree, &doc).unwrap();
        assert_eq!(m.path.to_string(), "items[0].icon");
    }
}
