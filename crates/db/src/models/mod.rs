//! Row models and request DTOs.
//!
//! Each module pairs a `FromRow` entity with the `Create*` / `Update*`
//! payloads its repository accepts. Enum-valued columns are stored as their
//! canonical text labels; callers normalize through `tagdeck_core` before
//! writing.

pub mod data_source;
pub mod group;
pub mod tag;
