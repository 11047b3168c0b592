use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Collapse a list of violations into a single `Validation` error.
    ///
    /// Returns `Ok(())` when the list is empty. All violations are kept,
    /// joined with `"; "`.
    pub fn from_violations(violations: Vec<String>) -> Result<(), CoreError> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(violations.join("; ")))
        }
    }
}
