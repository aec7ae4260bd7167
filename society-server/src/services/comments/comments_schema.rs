use serde::Deserialize;
use validator::Validate;

pub const SCHEMA_ERROR: &str = "Comments schema validation failed";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateComment {
    #[validate(length(min = 1, max = 128))]
    pub post_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}
