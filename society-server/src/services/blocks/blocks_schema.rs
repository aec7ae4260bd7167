use serde::{Deserialize, Serialize};
use validator::Validate;

pub const SCHEMA_ERROR: &str = "Blocks schema validation failed";

/// One entry of the caller's block list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BlockedUser {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}
