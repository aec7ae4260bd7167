use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FlatDetails;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisitorStatus {
    CheckedIn,
    CheckedOut,
}

impl VisitorStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "checkedIn" => Some(VisitorStatus::CheckedIn),
            "checkedOut" => Some(VisitorStatus::CheckedOut),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorLog {
    pub id: String,
    pub society_id: String,
    pub visitor_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub purpose: String,
    pub block_name: String,
    pub floor_index: u32,
    pub flat_number: String,
    #[serde(default)]
    pub vehicle_number: Option<String>,
    /// Guard who checked the visitor in.
    pub logged_by: String,
    pub status: VisitorStatus,
    pub check_in_at: DateTime<Utc>,
    #[serde(default)]
    pub check_out_at: Option<DateTime<Utc>>,
}

impl VisitorLog {
    /// The visited flat.
    pub fn flat(&self) -> FlatDetails {
        FlatDetails::new(self.block_name.clone(), self.floor_index, self.flat_number.clone())
    }
}

impl_document!(VisitorLog);
