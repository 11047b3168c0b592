//! Long-lived services shared through [`AppState`](crate::state::AppState).

pub mod data_source_manager;

pub use data_source_manager::{ConnectionTestResult, DataSourceError, DataSourceManager};
