//! Search / type / group filtering of the tag table.

use serde::{Deserialize, Serialize};

use super::TagRecord;
use crate::tag::FILTER_ALL;

/// Active filter terms of the tag table.
///
/// `data_type` and `group` use [`FILTER_ALL`] to mean "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagFilter {
    pub search: String,
    pub data_type: String,
    pub group: String,
}

impl Default for TagFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            data_type: FILTER_ALL.to_string(),
            group: FILTER_ALL.to_string(),
        }
    }
}

impl TagFilter {
    /// Whether `tag` passes all three predicates.
    pub fn matches<T: TagRecord>(&self, tag: &T) -> bool {
        self.matches_search(tag) && self.matches_type(tag) && self.matches_group(tag)
    }

    fn matches_search<T: TagRecord>(&self, tag: &T) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        tag.name().to_lowercase().contains(&needle)
            || tag
                .comment()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
    }

    fn matches_type<T: TagRecord>(&self, tag: &T) -> bool {
        self.data_type == FILTER_ALL || tag.data_type() == self.data_type
    }

    fn matches_group<T: TagRecord>(&self, tag: &T) -> bool {
        self.group == FILTER_ALL || tag.group_name() == Some(self.group.as_str())
    }
}

/// Return the tags that pass `filter`, preserving input order.
pub fn filter_tags<'a, T: TagRecord>(tags: &'a [T], filter: &TagFilter) -> Vec<&'a T> {
    tags.iter().filter(|tag| filter.matches(*tag)).collect()
}
