//! # Apartment structure
//!
//! A society's units live in one nested document field:
//! `structures[] → floors[] → flats[] → residents[]`. The society also keeps a
//! flat `residents[]` list. Every resident id must sit in at most one flat and
//! be mirrored in that list; the functions here are the only writers of both
//! sides.
//!
//! Lookups are by block name and flat number (exact match after trimming)
//! and by 1-based floor index.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use validator::Validate;

use crate::errors::SocietyError;
use crate::models::{ApartmentStructure, Flat, FlatDetails, Floor, Resident, Society, Structure};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("floor index must be 1 or greater")]
    InvalidFloorIndex,
    #[error("block name must not be empty")]
    EmptyBlockName,
    #[error("flat number must not be empty")]
    EmptyFlatNumber,
    #[error("block '{0}' does not exist")]
    BlockNotFound(String),
    #[error("block '{block}' has no floor {floor}")]
    FloorNotFound { block: String, floor: u32 },
    #[error("flat '{flat}' does not exist on floor {floor} of block '{block}'")]
    FlatNotFound { block: String, floor: u32, flat: String },
    #[error("resident '{resident}' is not listed in flat '{flat}' of block '{block}'")]
    NotInFlat { block: String, flat: String, resident: String },
    #[error("flat '{flat}' of block '{block}' still has residents")]
    Occupied { block: String, flat: String },
    #[error("flat '{flat}' appears more than once on floor {floor}")]
    DuplicateFlat { floor: u32, flat: String },
    #[error("flat '{flat}' does not exist in block '{block}'")]
    UnknownFlat { block: String, flat: String },
    #[error("flat '{flat}' exists on floors {floors:?} of block '{block}'; floorIndex is required")]
    AmbiguousFlat { block: String, flat: String, floors: Vec<u32> },
}

impl From<StructureError> for SocietyError {
    fn from(err: StructureError) -> Self {
        let message = err.to_string();
        match err {
            StructureError::InvalidFloorIndex
            | StructureError::EmptyBlockName
            | StructureError::EmptyFlatNumber
            | StructureError::DuplicateFlat { .. }
            | StructureError::UnknownFlat { .. }
            | StructureError::AmbiguousFlat { .. } => SocietyError::unprocessable(message),
            StructureError::BlockNotFound(_)
            | StructureError::FloorNotFound { .. }
            | StructureError::FlatNotFound { .. }
            | StructureError::NotInFlat { .. }
            | StructureError::Occupied { .. } => SocietyError::conflict(message),
        }
    }
}

impl StructureError {
    pub fn into_anyhow(self) -> anyhow::Error {
        SocietyError::from(self).into_anyhow()
    }
}

/// Desired shape of one block: `floors[i]` lists the flat numbers of floor
/// `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlockLayout {
    #[validate(length(min = 1, max = 64))]
    pub block_name: String,
    #[serde(default)]
    pub structure_type: Option<String>,
    #[validate(length(max = 500))]
    pub floors: Vec<Vec<String>>,
}

/// One resident id at one flat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub resident_id: String,
    pub flat: FlatDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub added: Vec<Membership>,
    pub removed: Vec<Membership>,
    pub society_list_added: Vec<String>,
    pub society_list_removed: Vec<String>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.society_list_added.is_empty()
            && self.society_list_removed.is_empty()
    }
}

fn location(block: &Structure, floor: &Floor, flat: &Flat) -> FlatDetails {
    FlatDetails {
        block_name: block.block_name.clone(),
        floor_index: floor.floor_number,
        flat_number: flat.flat_number.clone(),
        structure_type: block.structure_type.clone(),
    }
}

impl ApartmentStructure {
    pub fn block(&self, name: &str) -> Option<&Structure> {
        let name = name.trim();
        self.structures.iter().find(|b| b.block_name == name)
    }

    pub fn flat(&self, details: &FlatDetails) -> Option<&Flat> {
        let idx = details.floor_index.checked_sub(1)? as usize;
        let flat_number = details.flat_number.trim();
        self.block(&details.block_name)?
            .floors
            .get(idx)?
            .flats
            .iter()
            .find(|f| f.flat_number == flat_number)
    }

    /// Resolve a flat named by block and number. With `floor_index` only that
    /// floor is searched; without it the number must be unique in the block.
    pub fn resolve_flat(
        &self,
        block_name: &str,
        floor_index: Option<u32>,
        flat_number: &str,
    ) -> Result<(FlatDetails, &Flat), StructureError> {
        let unknown = || StructureError::UnknownFlat {
            block: block_name.trim().to_string(),
            flat: flat_number.trim().to_string(),
        };
        let block = self.block(block_name).ok_or_else(|| unknown())?;
        let flat_number = flat_number.trim();

        let mut matches = block
            .floors
            .iter()
            .filter(|floor| floor_index.map_or(true, |i| floor.floor_number == i))
            .filter_map(|floor| {
                floor
                    .flats
                    .iter()
                    .find(|f| f.flat_number == flat_number)
                    .map(|flat| (location(block, floor, flat), flat))
            })
            .collect::<Vec<_>>();

        match matches.len() {
            0 => Err(unknown()),
            1 => Ok(matches.remove(0)),
            _ => Err(StructureError::AmbiguousFlat {
                block: block.block_name.clone(),
                flat: flat_number.to_string(),
                floors: matches.iter().map(|(d, _)| d.floor_index).collect(),
            }),
        }
    }

    /// Put `resident_id` into the flat at `details`, creating the block,
    /// padding floors and creating the flat as needed.
    ///
    /// Returns `false` when the id was already listed there.
    pub fn assign(&mut self, details: &FlatDetails, resident_id: &str) -> Result<bool, StructureError> {
        if details.floor_index == 0 {
            return Err(StructureError::InvalidFloorIndex);
        }
        let block_name = details.block_name.trim();
        if block_name.is_empty() {
            return Err(StructureError::EmptyBlockName);
        }
        let flat_number = details.flat_number.trim();
        if flat_number.is_empty() {
            return Err(StructureError::EmptyFlatNumber);
        }

        let block_pos = match self.structures.iter().position(|b| b.block_name == block_name) {
            Some(pos) => pos,
            None => {
                self.structures.push(Structure {
                    block_name: block_name.to_string(),
                    structure_type: details.structure_type.clone(),
                    floors: Vec::new(),
                });
                self.structures.len() - 1
            }
        };
        let block = &mut self.structures[block_pos];

        let wanted = details.floor_index as usize;
        while block.floors.len() < wanted {
            let floor_number = block.floors.len() as u32 + 1;
            block.floors.push(Floor {
                floor_number,
                flats: Vec::new(),
            });
        }
        let floor = &mut block.floors[wanted - 1];

        let flat_pos = match floor.flats.iter().position(|f| f.flat_number == flat_number) {
            Some(pos) => pos,
            None => {
                floor.flats.push(Flat::new(flat_number));
                floor.flats.len() - 1
            }
        };
        let flat = &mut floor.flats[flat_pos];

        if flat.residents.iter().any(|r| r == resident_id) {
            return Ok(false);
        }
        flat.residents.push(resident_id.to_string());
        Ok(true)
    }

    /// Remove `resident_id` from the flat at `details`. Every node on the path
    /// and the membership itself must exist.
    pub fn unassign(&mut self, details: &FlatDetails, resident_id: &str) -> Result<(), StructureError> {
        let block_name = details.block_name.trim();
        let flat_number = details.flat_number.trim();

        let block = self
            .structures
            .iter_mut()
            .find(|b| b.block_name == block_name)
            .ok_or_else(|| StructureError::BlockNotFound(block_name.to_string()))?;

        let floor = details
            .floor_index
            .checked_sub(1)
            .and_then(|idx| block.floors.get_mut(idx as usize))
            .ok_or_else(|| StructureError::FloorNotFound {
                block: block_name.to_string(),
                floor: details.floor_index,
            })?;

        let flat = floor
            .flats
            .iter_mut()
            .find(|f| f.flat_number == flat_number)
            .ok_or_else(|| StructureError::FlatNotFound {
                block: block_name.to_string(),
                floor: details.floor_index,
                flat: flat_number.to_string(),
            })?;

        let before = flat.residents.len();
        flat.residents.retain(|r| r != resident_id);
        if flat.residents.len() == before {
            return Err(StructureError::NotInFlat {
                block: block_name.to_string(),
                flat: flat_number.to_string(),
                resident: resident_id.to_string(),
            });
        }
        Ok(())
    }

    /// Remove `resident_id` from every flat. Returns how many entries went.
    pub fn purge(&mut self, resident_id: &str) -> usize {
        let mut removed = 0;
        for flat in self.flats_mut() {
            let before = flat.residents.len();
            flat.residents.retain(|r| r != resident_id);
            removed += before - flat.residents.len();
        }
        removed
    }

    /// Every flat that lists `resident_id`.
    pub fn locate(&self, resident_id: &str) -> Vec<FlatDetails> {
        self.walk()
            .filter(|(_, _, flat)| flat.residents.iter().any(|r| r == resident_id))
            .map(|(block, floor, flat)| location(block, floor, flat))
            .collect()
    }

    /// Flats with at least one resident, in tree order.
    pub fn occupied_flats(&self) -> Vec<(FlatDetails, Vec<String>)> {
        self.walk()
            .filter(|(_, _, flat)| !flat.residents.is_empty())
            .map(|(block, floor, flat)| (location(block, floor, flat), flat.residents.clone()))
            .collect()
    }

    /// Define or reshape a block. Flats present in both the old and new
    /// layout keep their residents; dropping an occupied flat is refused.
    pub fn upsert_block(&mut self, layout: &BlockLayout) -> Result<&Structure, StructureError> {
        let block_name = layout.block_name.trim();
        if block_name.is_empty() {
            return Err(StructureError::EmptyBlockName);
        }

        let mut floors = Vec::with_capacity(layout.floors.len());
        for (idx, flat_numbers) in layout.floors.iter().enumerate() {
            let floor_number = idx as u32 + 1;
            let mut seen = HashSet::new();
            let mut flats = Vec::with_capacity(flat_numbers.len());
            for n in flat_numbers {
                let n = n.trim();
                if n.is_empty() {
                    return Err(StructureError::EmptyFlatNumber);
                }
                if !seen.insert(n.to_string()) {
                    return Err(StructureError::DuplicateFlat {
                        floor: floor_number,
                        flat: n.to_string(),
                    });
                }
                flats.push(Flat::new(n));
            }
            floors.push(Floor { floor_number, flats });
        }

        let existing = self.structures.iter().position(|b| b.block_name == block_name);
        if let Some(pos) = existing {
            let old = &self.structures[pos];
            for (idx, old_floor) in old.floors.iter().enumerate() {
                for old_flat in old_floor.flats.iter().filter(|f| !f.residents.is_empty()) {
                    let target = floors
                        .get_mut(idx)
                        .and_then(|f: &mut Floor| f.flats.iter_mut().find(|f| f.flat_number == old_flat.flat_number))
                        .ok_or_else(|| StructureError::Occupied {
                            block: block_name.to_string(),
                            flat: old_flat.flat_number.clone(),
                        })?;
                    target.residents = old_flat.residents.clone();
                }
            }
        }

        let block = Structure {
            block_name: block_name.to_string(),
            structure_type: layout.structure_type.clone(),
            floors,
        };
        let pos = match existing {
            Some(pos) => {
                self.structures[pos] = block;
                pos
            }
            None => {
                self.structures.push(block);
                self.structures.len() - 1
            }
        };
        Ok(&self.structures[pos])
    }

    /// Delete an empty block.
    pub fn remove_block(&mut self, block_name: &str) -> Result<Structure, StructureError> {
        let block_name = block_name.trim();
        let pos = self
            .structures
            .iter()
            .position(|b| b.block_name == block_name)
            .ok_or_else(|| StructureError::BlockNotFound(block_name.to_string()))?;

        let block = &self.structures[pos];
        if let Some(flat) = block.floors.iter().flat_map(|f| f.flats.iter()).find(|f| !f.residents.is_empty()) {
            return Err(StructureError::Occupied {
                block: block_name.to_string(),
                flat: flat.flat_number.clone(),
            });
        }
        Ok(self.structures.remove(pos))
    }

    fn walk(&self) -> impl Iterator<Item = (&Structure, &Floor, &Flat)> {
        self.structures.iter().flat_map(|block| {
            block
                .floors
                .iter()
                .flat_map(move |floor| floor.flats.iter().map(move |flat| (block, floor, flat)))
        })
    }

    fn flats_mut(&mut self) -> impl Iterator<Item = &mut Flat> {
        self.structures
            .iter_mut()
            .flat_map(|b| b.floors.iter_mut())
            .flat_map(|f| f.flats.iter_mut())
    }
}

impl Society {
    /// Link a resident into the tree and the society list.
    /// Returns `false` if the tree already had the membership.
    pub fn admit_resident(&mut self, details: &FlatDetails, resident_id: &str) -> Result<bool, StructureError> {
        let added = self.apartment_structure.assign(details, resident_id)?;
        if !self.residents.iter().any(|r| r == resident_id) {
            self.residents.push(resident_id.to_string());
        }
        self.touch();
        Ok(added)
    }

    /// Strict inverse of [`admit_resident`](Self::admit_resident). Nothing
    /// changes if the tree path or membership is missing.
    pub fn evict_resident(&mut self, details: &FlatDetails, resident_id: &str) -> Result<(), StructureError> {
        self.apartment_structure.unassign(details, resident_id)?;
        self.residents.retain(|r| r != resident_id);
        self.touch();
        Ok(())
    }

    /// Remove a resident id from every flat and from the society list,
    /// whatever placement was recorded. Returns the number of entries removed.
    pub fn purge_resident(&mut self, resident_id: &str) -> usize {
        let from_tree = self.apartment_structure.purge(resident_id);
        let before = self.residents.len();
        self.residents.retain(|r| r != resident_id);
        let removed = from_tree + (before - self.residents.len());
        if removed > 0 {
            self.touch();
        }
        removed
    }
}

/// Rebuild tree memberships and the society list from the approved
/// residents' `flat_details`.
///
/// Ids without an approved resident at that location are dropped, missing
/// memberships are added, duplicates collapse to one.
pub fn reconcile(society: &mut Society, residents: &[Resident]) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let approved: Vec<&Resident> = residents
        .iter()
        .filter(|r| r.society_id == society.id && r.is_approved())
        .collect();
    let expected: HashMap<&str, &FlatDetails> = approved
        .iter()
        .map(|r| (r.id.as_str(), &r.flat_details))
        .collect();

    for block in society.apartment_structure.structures.iter_mut() {
        let block_name = block.block_name.clone();
        let structure_type = block.structure_type.clone();
        for floor in block.floors.iter_mut() {
            let floor_number = floor.floor_number;
            for flat in floor.flats.iter_mut() {
                let here = FlatDetails {
                    block_name: block_name.clone(),
                    floor_index: floor_number,
                    flat_number: flat.flat_number.clone(),
                    structure_type: structure_type.clone(),
                };
                let mut seen = HashSet::new();
                flat.residents.retain(|id| {
                    let belongs = expected
                        .get(id.as_str())
                        .is_some_and(|d| FlatDetails::clone(d).normalized().same_flat(&here));
                    let keep = belongs && seen.insert(id.clone());
                    if !keep {
                        report.removed.push(Membership {
                            resident_id: id.clone(),
                            flat: here.clone(),
                        });
                    }
                    keep
                });
            }
        }
    }

    for resident in &approved {
        let details = resident.flat_details.clone().normalized();
        match society.apartment_structure.assign(&details, &resident.id) {
            Ok(true) => report.added.push(Membership {
                resident_id: resident.id.clone(),
                flat: details,
            }),
            Ok(false) => {}
            Err(err) => warn!(resident = %resident.id, %err, "cannot place resident during reconcile"),
        }
    }

    let desired: Vec<&str> = approved.iter().map(|r| r.id.as_str()).collect();
    let mut seen = HashSet::new();
    let mut list = Vec::with_capacity(desired.len());
    for id in society.residents.drain(..) {
        if desired.contains(&id.as_str()) && seen.insert(id.clone()) {
            list.push(id);
        } else {
            report.society_list_removed.push(id);
        }
    }
    for id in desired {
        if seen.insert(id.to_string()) {
            list.push(id.to_string());
            report.society_list_added.push(id.to_string());
        }
    }
    society.residents = list;

    if !report.is_clean() {
        society.touch();
    }
    report
}
