//! Structural paths into the slide document.
//!
//! A path addresses exactly one node in the nested document: object keys
//! are joined with `.`, array positions with `[i]`, as in
//! `leftPanel.backgroundImage` or `items[2].icon`. Paths are derived
//! during a scan, never stored across scans: a history replay can swap the
//! whole document out from under the overlay, so anything holding an old
//! path must re-resolve it.
//!
//! The string form is part of the editing contract (edit requests carry
//! the path as text and the store re-resolves it), so parsing is built on
//! `winnow` and round-trips with `Display`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

/// One step into the document: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A derived address of one node in a slide document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataPath {
    segments: SmallVec<[PathSegment; 8]>,
}

impl DataPath {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    /// This path extended by an object key. Used while descending.
    pub fn child_key(&self, key: &str) -> Self {
        let mut child = self.clone();
        child.push_key(key);
        child
    }

    /// This path extended by an array index.
    pub fn child_index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.push_index(index);
        child
    }

    /// Parse the textual form back into a path.
    ///
    /// # Errors
    /// Empty segments (`a..b`), unterminated or non-numeric indices, and
    /// trailing separators are rejected.
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut rest = input;
        let mut path = DataPath::root();

        if rest.is_empty() {
            return Ok(path);
        }

        loop {
            if rest.starts_with('[') {
                let index = parse_index
                    .parse_next(&mut rest)
                    .map_err(|_| format!("invalid index in path {input:?}"))?;
                path.push_index(index);
            } else {
                let key = parse_key
                    .parse_next(&mut rest)
                    .map_err(|_| format!("invalid key in path {input:?}"))?;
                path.push_key(key);
            }

            if rest.is_empty() {
                return Ok(path);
            }
            if let Some(after_dot) = rest.strip_prefix('.') {
                if after_dot.is_empty() || after_dot.starts_with('.') {
                    return Err(format!("empty segment in path {input:?}"));
                }
                rest = after_dot;
            } else if !rest.starts_with('[') {
                return Err(format!("unexpected {rest:?} in path {input:?}"));
            }
        }
    }

    /// Resolve this path against a document. `None` when any step is
    /// missing or the node shape does not match the segment kind.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let mut node = document;
        for segment in &self.segments {
            node = match segment {
                PathSegment::Key(key) => node.get(key.as_str())?,
                PathSegment::Index(index) => node.get(*index)?,
            };
        }
        Some(node)
    }

    /// Resolve this path for mutation.
    pub fn resolve_mut<'a>(&self, document: &'a mut Value) -> Option<&'a mut Value> {
        let mut node = document;
        for segment in &self.segments {
            node = match segment {
                PathSegment::Key(key) => node.get_mut(key.as_str())?,
                PathSegment::Index(index) => node.get_mut(*index)?,
            };
        }
        Some(node)
    }
}

fn parse_key(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| c != '.' && c != '[' && c != ']')
        .map(str::to_string)
        .parse_next(input)
}

fn parse_index(input: &mut &str) -> ModalResult<usize> {
    let _ = '['.parse_next(input)?;
    let digits: &str = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let _ = ']'.parse_next(input)?;
    digits
        .parse::<usize>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "{key}")?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl Serialize for DataPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DataPath::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn display_round_trip() {
        for text in ["leftPanel.backgroundImage", "items[2].icon", "a[0][1].b", "[3]", ""] {
            let path = DataPath::parse(text).unwrap();
            assert_eq!(path.to_string(), text);
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(DataPath::parse("a..b").is_err());
        assert!(DataPath::parse("a.").is_err());
        assert!(DataPath::parse("a[x]").is_err());
        assert!(DataPath::parse("a[1").is_err());
        assert!(DataPath::parse(".a").is_err());
    }

    #[test]
    fn resolve_walks_objects_and_arrays() {
        let doc = json!({
            "leftPanel": { "backgroundImage": { "__image_url__": "/a.png" } },
            "items": [ { "icon": { "__icon_url__": "/b.svg" } } ],
        });

        let path = DataPath::parse("leftPanel.backgroundImage").unwrap();
        assert_eq!(path.resolve(&doc).unwrap()["__image_url__"], "/a.png");

        let path = DataPath::parse("items[0].icon").unwrap();
        assert_eq!(path.resolve(&doc).unwrap()["__icon_url__"], "/b.svg");

        assert_eq!(DataPath::parse("items[1]").unwrap().resolve(&doc), None);
        assert_eq!(DataPath::parse("leftPanel[0]").unwrap().resolve(&doc), None);
    }

    #[test]
    fn resolve_mut_reaches_the_same_node() {
        let mut doc = json!({ "items": [ { "icon": { "__icon_url__": "/old.svg" } } ] });
        let path = DataPath::parse("items[0].icon").unwrap();
        path.resolve_mut(&mut doc).unwrap()["__icon_url__"] = json!("/new.svg");
        assert_eq!(doc["items"][0]["icon"]["__icon_url__"], "/new.svg");
    }

    #[test]
    fn root_path_resolves_to_document() {
        let doc = json!({ "k": 1 });
        assert_eq!(DataPath::root().resolve(&doc), Some(&doc));
    }
}
