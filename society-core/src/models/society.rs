use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;

/// The tenant document.
///
/// `residents`, `bills` and `visitor_logs` are denormalized id lists that
/// mirror the other collections; `apartment_structure` nests blocks → floors
/// → flats → resident ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Society {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub apartment_structure: ApartmentStructure,
    #[serde(default)]
    pub residents: Vec<String>,
    #[serde(default)]
    pub bills: Vec<String>,
    #[serde(default)]
    pub visitor_logs: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Society {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            address: None,
            apartment_structure: ApartmentStructure::default(),
            residents: Vec::new(),
            bills: Vec::new(),
            visitor_logs: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Document for Society {
    fn id(&self) -> &str {
        &self.id
    }
    fn society_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentStructure {
    #[serde(default)]
    pub structures: Vec<Structure>,
}

/// A block (tower, wing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub block_name: String,
    #[serde(default)]
    pub structure_type: Option<String>,
    #[serde(default)]
    pub floors: Vec<Floor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    /// 1-based, equal to the position in `floors` plus one.
    pub floor_number: u32,
    #[serde(default)]
    pub flats: Vec<Flat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flat {
    pub flat_number: String,
    #[serde(default)]
    pub residents: Vec<String>,
}

impl Flat {
    pub fn new(flat_number: impl Into<String>) -> Self {
        Self {
            flat_number: flat_number.into(),
            residents: Vec::new(),
        }
    }
}
