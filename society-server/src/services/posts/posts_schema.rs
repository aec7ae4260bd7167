use serde::Deserialize;
use validator::Validate;

pub const SCHEMA_ERROR: &str = "Posts schema validation failed";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePost {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 10))]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchPost {
    #[serde(default)]
    #[validate(length(min = 1, max = 5000))]
    pub content: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10))]
    pub images: Option<Vec<String>>,
}
