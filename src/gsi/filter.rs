//! Player Name Filter
//!
//! Display names excluded from every derived view (coaches, casters,
//! observers that GSI reports as players). Matching is exact after
//! trimming and case folding: `"coach1"` filters `"COACH1"` but not
//! `"Coach10"`.

use std::collections::BTreeSet;

/// Set of case-folded player names to hide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerFilter {
    names: BTreeSet<String>,
}

impl PlayerFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from a comma-separated list (`"Coach1, coach2"`).
    ///
    /// Entries are trimmed; empty entries are ignored.
    pub fn parse(list: &str) -> Self {
        let names = list
            .split(',')
            .map(fold)
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    /// Replace the filtered set from a comma-separated list.
    pub fn set(&mut self, list: &str) {
        *self = Self::parse(list);
    }

    /// Whether a player with this display name is hidden.
    pub fn is_filtered(&self, name: &str) -> bool {
        if self.names.is_empty() {
            return false;
        }
        let folded = fold(name);
        !folded.is_empty() && self.names.contains(&folded)
    }

    /// Number of filtered names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when nothing is filtered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

// =============================================================================
// TESTS
// =============================================================================
