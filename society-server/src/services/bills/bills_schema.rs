use chrono::NaiveDate;
use serde::Deserialize;
use society_core::models::Charge;
use validator::Validate;

pub const SCHEMA_ERROR: &str = "Bills schema validation failed";

/// A one-off bill for a single flat. Without `dueDate` the bill is due
/// `dueInDays` (or the configured default) after today.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateBill {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 64))]
    pub block_name: String,
    /// Needed when the flat number repeats on several floors of the block.
    #[serde(default)]
    #[validate(range(min = 1, max = 500))]
    pub floor_index: Option<u32>,
    #[validate(length(min = 1, max = 32))]
    pub flat_number: String,
    pub base_amount: u64,
    #[serde(default)]
    pub gst_rate_bp: u32,
    #[serde(default)]
    #[validate(nested, length(max = 20))]
    pub additional_charges: Vec<Charge>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(range(max = 365))]
    pub due_in_days: Option<u32>,
}
