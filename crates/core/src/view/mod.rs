//! Tag table view model.
//!
//! Everything here is derived on demand from the persisted tags and never
//! stored: the filtered and sorted projection, the selection set, the column
//! layout and the CSV export. Functions are generic over [`TagRecord`] so
//! the repository rows and test fixtures share one implementation.

pub mod columns;
pub mod export;
pub mod filter;
pub mod selection;
pub mod sort;

pub use columns::{ColumnDef, ColumnLayout};
pub use export::{export_csv, EXPORT_FILENAME, EXPORT_HEADER, EXPORT_MIME};
pub use filter::{filter_tags, TagFilter};
pub use selection::Selection;
pub use sort::{sort_tags, SortConfig, SortDirection, SortKey};

use crate::types::{DbId, Timestamp};

/// Read access to the tag fields the view model works with.
///
/// The optional accessors default to `None` so lightweight fixtures only
/// implement what they need.
pub trait TagRecord {
    fn id(&self) -> DbId;
    fn name(&self) -> &str;
    fn comment(&self) -> Option<&str>;
    fn data_type(&self) -> &str;
    fn address(&self) -> Option<&str>;
    fn value(&self) -> Option<&str>;
    fn group_name(&self) -> Option<&str>;
    fn active(&self) -> bool;
    fn retain(&self) -> bool;
    fn data_source(&self) -> &str;
    fn connection_status(&self) -> &str;

    fn multiplier(&self) -> Option<f64> {
        None
    }

    fn update_interval(&self) -> Option<&str> {
        None
    }

    fn created_at(&self) -> Option<Timestamp> {
        None
    }

    fn updated_at(&self) -> Option<Timestamp> {
        None
    }
}

impl<T: TagRecord + ?Sized> TagRecord for &T {
    fn id(&self) -> DbId {
        (**self).id()
    }
    fn name(&self) -> &str {
        (**self).name()
    }
    fn comment(&self) -> Option<&str> {
        (**self).comment()
    }
    fn data_type(&self) -> &str {
        (**self).data_type()
    }
    fn address(&self) -> Option<&str> {
        (**self).address()
    }
    fn value(&self) -> Option<&str> {
        (**self).value()
    }
    fn group_name(&self) -> Option<&str> {
        (**self).group_name()
    }
    fn active(&self) -> bool {
        (**self).active()
    }
    fn retain(&self) -> bool {
        (**self).retain()
    }
    fn data_source(&self) -> &str {
        (**self).data_source()
    }
    fn connection_status(&self) -> &str {
        (**self).connection_status()
    }
    fn multiplier(&self) -> Option<f64> {
        (**self).multiplier()
    }
    fn update_interval(&self) -> Option<&str> {
        (**self).update_interval()
    }
    fn created_at(&self) -> Option<Timestamp> {
        (**self).created_at()
    }
    fn updated_at(&self) -> Option<Timestamp> {
        (**self).updated_at()
    }
}

/// Filter then sort in one pass: the projection the tag table renders.
pub fn project<'a, T: TagRecord>(
    tags: &'a [T],
    filter: &TagFilter,
    sort: &SortConfig,
) -> Vec<&'a T> {
    sort_tags(filter_tags(tags, filter), sort)
}
