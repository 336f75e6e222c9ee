//! Bounded LRU cache for normalized icon markup.
//!
//! Icon references repeat heavily across a deck (every bullet row reuses a
//! handful of glyphs), so normalized markup is cached per reference +
//! rendering options. The cache is an injected capability owned by whoever
//! constructs the loader, not ambient process state; tests scope one per
//! run. Entries only ever leave by eviction.

use crate::svg::IconStyle;

/// Default capacity. Decks rarely use more distinct icons than this at once.
pub const DEFAULT_ICON_CACHE_CAPACITY: usize = 15;

/// A bounded key-value store with least-recently-used eviction.
#[derive(Debug, Clone)]
pub struct IconCache {
    capacity: usize,
    /// Most-recently-used last. Capacity is tens of entries; linear scans
    /// are cheaper than bookkeeping.
    entries: Vec<(String, String)>,
}

impl IconCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    /// The cache key for one reference + rendering options pair.
    pub fn key(reference: &str, style: &IconStyle) -> String {
        format!(
            "{reference}|sc={}|fc={}|cls={}",
            style.stroke.as_deref().unwrap_or(""),
            style.fill.as_deref().unwrap_or(""),
            style.class.as_deref().unwrap_or("")
        )
    }

    /// Look up a key, refreshing its recency on a hit.
    pub fn get(&mut self, key: &str) -> Option<&str> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(pos);
        self.entries.push(entry);
        self.entries.last().map(|(_, v)| v.as_str())
    }

    /// Insert a key as most-recently-used, evicting the least-recently-used
    /// entry when over capacity.
    pub fn insert(&mut self, key: String, value: String) {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(pos);
        }
        self.entries.push((key, value));
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IconCache {
    fn default() -> Self {
        Self::new(DEFAULT_ICON_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: usize) -> IconCache {
        let mut cache = IconCache::new(n);
        for i in 0..n {
            cache.insert(format!("k{i}"), format!("v{i}"));
        }
        cache
    }

    #[test]
    fn stays_at_capacity_and_evicts_oldest() {
        let mut cache = filled(3);
        cache.insert("k3".into(), "v3".into());
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("k0"));
        assert!(cache.contains("k1"));
        assert!(cache.contains("k3"));
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = filled(3);
        assert_eq!(cache.get("k0"), Some("v0"));
        // k1 is now the least recently used.
        cache.insert("k3".into(), "v3".into());
        assert!(cache.contains("k0"));
        assert!(!cache.contains("k1"));
    }

    #[test]
    fn reinserting_a_key_updates_value_without_growth() {
        let mut cache = filled(2);
        cache.insert("k0".into(), "fresh".into());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("k0"), Some("fresh"));
    }

    #[test]
    fn key_includes_options() {
        let plain = IconStyle::default();
        let styled = IconStyle {
            stroke: Some("red".into()),
            ..Default::default()
        };
        assert_ne!(
            IconCache::key("/icons/bolt.svg", &plain),
            IconCache::key("/icons/bolt.svg", &styled)
        );
    }
}
