use serde::Deserialize;
use serde_json::json;
use society_core::models::FlatDetails;
use society_core::SocietyError;
use validator::Validate;

pub const SCHEMA_ERROR: &str = "Residents schema validation failed";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateResident {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
    #[validate(nested)]
    pub flat_details: FlatDetails,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchResident {
    #[serde(default)]
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub flat_details: Option<FlatDetails>,
}

/// Whitespace-only names pass the length rule; reject them here.
pub fn non_blank_name(name: &str) -> anyhow::Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SocietyError::unprocessable(SCHEMA_ERROR)
            .with_errors(json!({"name": ["must not be blank"]}))
            .into_anyhow());
    }
    Ok(name.to_string())
}
