//! Page-scoped identifier allocation

use std::collections::HashSet;

/// Default prefix for allocated ids.
pub const DEFAULT_ID_PREFIX: &str = "n";

/// Monotonic generator of page-unique element ids.
///
/// Every call advances the counter, so a token is never handed out twice,
/// even after the node carrying it has been removed from the tree.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    prefix: String,
    counter: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_PREFIX)
    }
}

impl IdAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of tokens handed out so far (including skipped ones).
    pub fn allocated(&self) -> u64 {
        self.counter
    }

    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", self.prefix, self.counter)
    }

    /// Like [`next_id`](Self::next_id), but skips tokens that are already
    /// taken by explicitly named nodes.
    pub fn next_id_avoiding(&mut self, taken: &HashSet<String>) -> String {
        loop {
            let id = self.next_id();
            if !taken.contains(&id) {
                return id;
            }
        }
    }

    /// Extracts the sequence number from a token produced by this allocator.
    pub fn sequence_of(&self, token: &str) -> Option<u64> {
        token.strip_prefix(self.prefix.as_str())?.parse().ok()
    }
}
