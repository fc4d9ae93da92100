//! Filter state for the listing page: the query text as typed and the set
//! of selected tag keys. Mutated only by user interaction (text input,
//! tag button clicks); each mutation is followed by one synchronous
//! re-evaluation in [`crate::listing`].

use std::collections::BTreeSet;

/// The reserved tag key that clears the selection. The "All" button on the
/// listing page carries this key.
pub const ALL_TAG: &str = "all";

/// The current query text and tag selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterState {
    query: String,
    selected: BTreeSet<String>,
}

impl FilterState {
    pub fn new() -> FilterState {
        FilterState::default()
    }

    /// Stores the query text raw, untrimmed as typed. Trimming happens at
    /// search time.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_owned();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Applies one tag click. The reserved [`ALL_TAG`] clears the selection
    /// entirely; any other key toggles its membership, so the selection is
    /// multi-select with OR semantics. Toggling the same key twice restores
    /// the prior selection.
    pub fn toggle(&mut self, tag: &str) {
        if tag == ALL_TAG {
            self.selected.clear();
        } else if !self.selected.remove(tag) {
            self.selected.insert(tag.to_owned());
        }
    }

    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected.contains(tag)
    }

    /// An empty selection means "no tag filter applied".
    pub fn unfiltered(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }
}
