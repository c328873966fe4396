use std::sync::Arc;

use crate::cache::LruCache;

/// A dotted key parsed once into its ordered segments.
///
/// Rejoining the segments with the configured separator reproduces the
/// original key exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegments {
    original: String,
    segments: Vec<String>,
}

impl PathSegments {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// LRU-bounded memoization of dotted-key parsing.
///
/// Parsing is a pure function of the key and separator, so a memo hit
/// is always valid; the bound only limits memory.
pub struct PathCache {
    separator: char,
    cache: LruCache<String, Arc<PathSegments>>,
}

impl PathCache {
    pub fn new(separator: char, capacity: usize) -> Self {
        PathCache {
            separator,
            cache: LruCache::new(capacity),
        }
    }

    /// Parse a dotted key, returning the cached segments when available.
    /// An empty string yields a single empty segment.
    pub fn parse(&mut self, path: &str) -> Arc<PathSegments> {
        if let Some(hit) = self.cache.get(path) {
            return Arc::clone(hit);
        }
        let segments = path
            .split(self.separator)
            .map(str::to_string)
            .collect::<Vec<_>>();
        let parsed = Arc::new(PathSegments {
            original: path.to_string(),
            segments,
        });
        self.cache.insert(path.to_string(), Arc::clone(&parsed), None);
        parsed
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
