//! Tag Deck domain core.
//!
//! Pure domain logic shared by the repository layer, the connector crate and
//! the HTTP API: canonical enums, validation rules, the tag view model and
//! CSV export/import. Nothing in here performs I/O.

pub mod data_source;
pub mod error;
pub mod group;
pub mod import;
pub mod status;
pub mod tag;
pub mod types;
pub mod view;
