//! Resource reference equivalence.
//!
//! The rendered tree does not keep a link back to the document location that
//! produced each element, so binding has to decide whether the reference a
//! rendered element exposes and the reference a document leaf stores denote
//! the same resource. The two routinely differ in protocol, host, or leading
//! slashes, and generated decks are full of short placeholder references.
//!
//! The rules are deliberately conservative (no substring containment)
//! because a false positive binds an element to an unrelated leaf and the
//! user silently edits the wrong thing.

/// Final path segments this short or shorter never establish equivalence on
/// their own; `photo.png`-class names are too generic to trust.
const SIGNIFICANT_FILENAME_LEN: usize = 10;

/// Decide whether two resource references denote the same resource.
///
/// Checked in order, short-circuiting on the first rule that matches:
/// 1. exact equality;
/// 2. equality after stripping scheme+host and leading slashes, so absolute
///    and relative forms of one path are equal;
/// 3. placeholder tokens and `/static/images/` references only ever match
///    exactly, otherwise every default placeholder would match every other;
/// 4. anything under `/app_data/`, and any remaining pair, matches on equal
///    final segments longer than `SIGNIFICANT_FILENAME_LEN` characters.
///
/// Empty references match nothing.
pub fn references_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }

    if a == b {
        return true;
    }

    if strip_origin(a) == strip_origin(b) {
        return true;
    }

    // Placeholders and bundled static images: exact equality only, and
    // exact equality was already ruled out above.
    if (a.contains("placeholder") && b.contains("placeholder"))
        || (a.contains("/static/images/") && b.contains("/static/images/"))
    {
        return false;
    }

    // Uploaded app data and everything else share the filename guard.
    significant_filename_eq(a, b)
}

/// Strip `http(s)://host` and any leading slashes, leaving the bare path.
fn strip_origin(url: &str) -> &str {
    let path = if let Some(rest) = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")) {
        match rest.find('/') {
            Some(slash) => &rest[slash..],
            None => "",
        }
    } else {
        url
    };
    path.trim_start_matches('/')
}

/// The final path segment, query string included (references are compared
/// as stored; nothing normalizes queries away).
fn final_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

fn significant_filename_eq(a: &str, b: &str) -> bool {
    let fa = final_segment(a);
    let fb = final_segment(b);
    fa == fb && fa.len() > SIGNIFICANT_FILENAME_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(references_match("/images/hero.png", "/images/hero.png"));
    }

    #[test]
    fn absolute_and_relative_forms_match() {
        assert!(references_match(
            "https://cdn.example.com/decks/cover-image.png",
            "/decks/cover-image.png"
        ));
        assert!(references_match(
            "http://localhost:9200/app_data/images/abcdef.png",
            "app_data/images/abcdef.png"
        ));
    }

    #[test]
    fn placeholders_require_exact_equality() {
        assert!(references_match(
            "/static/images/placeholder.jpg",
            "/static/images/placeholder.jpg"
        ));
        assert!(!references_match(
            "/static/images/placeholder.jpg",
            "/static/images/placeholder2.jpg"
        ));
        assert!(!references_match(
            "https://a.example/placeholder-one.png",
            "https://b.example/placeholder-two.png"
        ));
    }

    #[test]
    fn short_filenames_never_match_across_directories() {
        assert!(!references_match("/a/xx.png", "/b/xx.png"));
    }

    #[test]
    fn significant_filenames_match_across_directories() {
        assert!(references_match(
            "/a/thumbnail-large.png",
            "/b/thumbnail-large.png"
        ));
        assert!(references_match(
            "https://api.example/app_data/images/f81d4fae7dec.png",
            "/exports/f81d4fae7dec.png"
        ));
    }

    #[test]
    fn empty_references_match_nothing() {
        assert!(!references_match("", ""));
        assert!(!references_match("", "/a/b.png"));
        assert!(!references_match("/a/b.png", ""));
    }

    #[test]
    fn host_only_url_matches_nothing_interesting() {
        assert!(!references_match("https://example.com", "/some/path.png"));
    }
}
