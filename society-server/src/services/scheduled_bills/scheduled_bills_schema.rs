use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use society_core::models::{Charge, Frequency};
use validator::Validate;

pub const SCHEMA_ERROR: &str = "Scheduled bills schema validation failed";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateScheduledBill {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub base_amount: u64,
    #[serde(default)]
    pub gst_rate_bp: u32,
    #[serde(default)]
    #[validate(nested, length(max = 20))]
    pub additional_charges: Vec<Charge>,
    pub frequency: Frequency,
    /// Defaults to today.
    #[serde(default)]
    pub next_run: Option<NaiveDate>,
    #[serde(default)]
    #[validate(range(max = 365))]
    pub due_in_days: Option<u32>,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchScheduledBill {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default)]
    pub base_amount: Option<u64>,
    #[serde(default)]
    pub gst_rate_bp: Option<u32>,
    #[serde(default)]
    #[validate(nested, length(max = 20))]
    pub additional_charges: Option<Vec<Charge>>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub next_run: Option<NaiveDate>,
    #[serde(default)]
    #[validate(range(max = 365))]
    pub due_in_days: Option<u32>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Outcome of one schedule run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub scheduled_bill_id: String,
    pub bill_ids: Vec<String>,
    pub next_run: NaiveDate,
}
