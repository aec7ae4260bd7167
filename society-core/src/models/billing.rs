use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::FlatDetails;

/// An untaxed line added on top of the base amount. Minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    #[validate(length(min = 1, max = 80))]
    pub label: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Unpaid,
    Paid,
}

/// A charge against one flat. Amounts are minor units (paise), the GST
/// rate is in basis points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    pub society_id: String,
    pub title: String,
    pub flat: FlatDetails,
    /// Residents of the flat when the bill was issued.
    pub resident_ids: Vec<String>,
    pub base_amount: u64,
    pub gst_rate_bp: u32,
    pub gst_amount: u64,
    #[serde(default)]
    pub additional_charges: Vec<Charge>,
    pub total: u64,
    pub due_date: NaiveDate,
    pub status: BillStatus,
    #[serde(default)]
    pub scheduled_bill_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paid_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl Frequency {
    pub fn months(&self) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::HalfYearly => 6,
            Frequency::Yearly => 12,
        }
    }
}

/// Template for recurring bills, one bill per occupied flat per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledBill {
    pub id: String,
    pub society_id: String,
    pub title: String,
    pub base_amount: u64,
    pub gst_rate_bp: u32,
    #[serde(default)]
    pub additional_charges: Vec<Charge>,
    pub frequency: Frequency,
    pub next_run: NaiveDate,
    /// Day of the month runs fall on; short months clamp to their last day.
    pub billing_day: u32,
    pub due_in_days: u32,
    pub active: bool,
    #[serde(default)]
    pub last_run: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl_document!(Bill);
impl_document!(ScheduledBill);
