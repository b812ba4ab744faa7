//! One-shot page-wide guards

use std::collections::HashMap;
use std::fmt;

/// State of a page-wide guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagState {
    /// Explicitly reset, nothing reserved yet
    Unset,
    /// A node has reserved the resource; it will be emitted
    Pending,
    /// The resource has been produced; later claimants must not emit it again
    Done,
}

impl fmt::Display for FlagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlagState::Unset => "unset",
            FlagState::Pending => "pending",
            FlagState::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// String-keyed store of [`FlagState`]s.
///
/// `get` returns `None` for keys that were never set, which is distinct
/// from an explicit `Some(FlagState::Unset)`.
#[derive(Debug, Clone, Default)]
pub struct FlagStore {
    flags: HashMap<String, FlagState>,
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<FlagState> {
        self.flags.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, state: FlagState) {
        self.flags.insert(key.into(), state);
    }

    /// Reserves `key` for the caller.
    ///
    /// Returns `true` if the flag was absent or unset and is now pending,
    /// `false` if someone else already holds or produced it.
    pub fn reserve(&mut self, key: &str) -> bool {
        match self.get(key) {
            None | Some(FlagState::Unset) => {
                self.set(key, FlagState::Pending);
                true
            }
            Some(FlagState::Pending) | Some(FlagState::Done) => false,
        }
    }

    pub fn complete(&mut self, key: &str) {
        self.set(key, FlagState::Done);
    }

    pub fn is_done(&self, key: &str) -> bool {
        self.get(key) == Some(FlagState::Done)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
