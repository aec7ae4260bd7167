use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Whitespace-only values pass a length rule but trim to nothing.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Where a resident lives. `floor_index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FlatDetails {
    #[validate(length(min = 1, max = 64), custom(function = "not_blank"))]
    pub block_name: String,
    #[validate(range(min = 1, max = 500))]
    pub floor_index: u32,
    #[validate(length(min = 1, max = 32), custom(function = "not_blank"))]
    pub flat_number: String,
    #[serde(default)]
    pub structure_type: Option<String>,
}

impl FlatDetails {
    pub fn new(block_name: impl Into<String>, floor_index: u32, flat_number: impl Into<String>) -> Self {
        Self {
            block_name: block_name.into(),
            floor_index,
            flat_number: flat_number.into(),
            structure_type: None,
        }
    }

    /// Names compare after trimming; store them trimmed.
    pub fn normalized(mut self) -> Self {
        self.block_name = self.block_name.trim().to_string();
        self.flat_number = self.flat_number.trim().to_string();
        self
    }

    /// Same block, floor and flat (structure type is informational).
    pub fn same_flat(&self, other: &FlatDetails) -> bool {
        self.block_name == other.block_name
            && self.floor_index == other.floor_index
            && self.flat_number == other.flat_number
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidentStatus {
    /// Registered, waiting for an admin.
    Pending,
    Approved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    pub id: String,
    pub society_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub flat_details: FlatDetails,
    pub status: ResidentStatus,
    /// Users whose posts this resident does not want to see.
    #[serde(default)]
    pub blocked_users: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

impl Resident {
    pub fn is_approved(&self) -> bool {
        self.status == ResidentStatus::Approved
    }
}

impl_document!(Resident);
