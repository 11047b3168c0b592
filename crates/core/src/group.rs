//! Group validation.
//!
//! Tags reference groups by `name`, not id. Renaming a group leaves existing
//! tags pointing at the old name until they are explicitly re-synced.

use crate::error::CoreError;

/// Maximum length of a group name.
pub const MAX_GROUP_NAME_LEN: usize = 128;

/// Validate a group name.
///
/// Rules:
/// - Must not be empty after trimming.
/// - Must not exceed `MAX_GROUP_NAME_LEN` characters.
pub fn validate_group_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Group name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_GROUP_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Group name must not exceed {MAX_GROUP_NAME_LEN} characters"
        )));
    }
    Ok(())
}
