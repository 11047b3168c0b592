//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Helpers that also run inside
//! another repository's transaction take any `PgExecutor`.

pub mod data_source_repo;
pub mod group_repo;
pub mod tag_repo;

pub use data_source_repo::DataSourceRepo;
pub use group_repo::GroupRepo;
pub use tag_repo::TagRepo;
