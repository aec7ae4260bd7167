use serde::Deserialize;
use validator::Validate;

pub const SCHEMA_ERROR: &str = "Visitors schema validation failed";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateVisitor {
    #[validate(length(min = 1, max = 120))]
    pub visitor_name: String,
    #[serde(default)]
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 300))]
    pub purpose: String,
    #[validate(length(min = 1, max = 64))]
    pub block_name: String,
    #[serde(default)]
    #[validate(range(min = 1, max = 500))]
    pub floor_index: Option<u32>,
    #[validate(length(min = 1, max = 32))]
    pub flat_number: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub vehicle_number: Option<String>,
}
