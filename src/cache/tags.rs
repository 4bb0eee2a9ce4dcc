//! Tag Index Module
//!
//! Secondary index from tag to keys, used for bulk invalidation.
//!
//! References are soft: a key listed under a tag may already be gone from the
//! store. Stale keys are dropped when their tag is invalidated.

use std::collections::{HashMap, HashSet};

// == Tag Index ==
#[derive(Debug, Default)]
pub struct TagIndex {
    tags: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Registers `key` under `tag`.
    pub fn register(&mut self, tag: impl Into<String>, key: &str) {
        self.tags
            .entry(tag.into())
            .or_default()
            .insert(key.to_string());
    }

    // == Take ==
    /// Removes `tag` from the index and returns the keys that were under it.
    ///
    /// Unknown tags yield an empty set.
    pub fn take(&mut self, tag: &str) -> HashSet<String> {
        self.tags.remove(tag).unwrap_or_default()
    }

    // == Lookup ==
    /// Keys currently registered under `tag`, possibly including stale ones.
    #[cfg(test)]
    pub fn keys_for(&self, tag: &str) -> Option<&HashSet<String>> {
        self.tags.get(tag)
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// Number of tags in the index.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
