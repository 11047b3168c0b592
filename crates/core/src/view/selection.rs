use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// The set of selected tag ids. Iterates in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: BTreeSet<DbId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `id` if selected, otherwise add it. Returns whether `id` is
    /// selected afterwards.
    pub fn toggle(&mut self, id: DbId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Bulk replace (select-all / select-visible).
    pub fn replace(&mut self, ids: impl IntoIterator<Item = DbId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: DbId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<DbId> {
        self.ids.iter().copied().collect()
    }
}

impl FromIterator<DbId> for Selection {
    fn from_iter<I: IntoIterator<Item = DbId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = Selection::new();
        assert!(selection.toggle(7));
        assert!(selection.contains(7));
        assert!(!selection.toggle(7));
        assert!(selection.is_empty());
    }

    #[test]
    fn replace_deduplicates_and_orders() {
        let mut selection = Selection::from_iter([3]);
        selection.replace([5, 1, 5, 2]);
        assert_eq!(selection.ids(), vec![1, 2, 5]);
        assert!(!selection.contains(3));
    }

    #[test]
    fn clear_empties_selection() {
        let mut selection: Selection = [1, 2, 3].into_iter().collect();
        assert_eq!(selection.len(), 3);
        selection.clear();
        assert_eq!(selection.len(), 0);
    }

    #[test]
    fn serializes_as_plain_id_list() {
        let selection: Selection = [2, 1].into_iter().collect();
        assert_eq!(serde_json::to_string(&selection).unwrap(), "[1,2]");
    }
}
