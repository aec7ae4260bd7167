use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use society_core::models::{ApartmentStructure, FlatDetails, Resident, Society};
use society_core::structure::{self, BlockLayout, ReconcileReport, StructureError};
use society_core::{bail_society, schema, ServiceCapabilities, SocietyService, TenantContext};
use tracing::{info, warn};

use crate::services::access::SOCIETY;
use crate::services::{SocietyParams, SocietyState};

use super::societies_schema::{CreateSociety, PatchSociety, SCHEMA_ERROR};
use super::societies_shared;

pub struct SocietiesService {
    pub state: Arc<SocietyState>,
}

/// Callers only ever see their own society.
fn own(ctx: &TenantContext, id: &str) -> Result<()> {
    ctx.actor()?;
    if id != ctx.society() {
        bail_society!(not_found, "{} not found: {}", SOCIETY, id);
    }
    Ok(())
}

impl SocietiesService {
    pub fn new(state: Arc<SocietyState>) -> Self {
        Self { state }
    }

    pub async fn structure(&self, ctx: &TenantContext, id: &str) -> Result<ApartmentStructure> {
        own(ctx, id)?;
        self.state
            .store
            .read(|c| c.societies.require(id, id, SOCIETY))
            .await
            .map(|s| s.apartment_structure)
    }

    pub async fn locate(&self, ctx: &TenantContext, id: &str, resident_id: &str) -> Result<Vec<FlatDetails>> {
        own(ctx, id)?;
        let soc = self.state.store.read(|c| c.societies.require(id, id, SOCIETY)).await?;
        Ok(soc.apartment_structure.locate(resident_id))
    }

    pub async fn upsert_block(&self, ctx: &TenantContext, id: &str, layout: BlockLayout) -> Result<Society> {
        own(ctx, id)?;
        schema::validate(&layout, SCHEMA_ERROR)?;
        let soc = self
            .state
            .store
            .transaction(|tx| {
                let mut soc = tx.societies.require(id, id, SOCIETY)?;
                soc.apartment_structure
                    .upsert_block(&layout)
                    .map_err(StructureError::into_anyhow)?;
                soc.touch();
                tx.societies.put(soc.clone());
                Ok(soc)
            })
            .await?;
        info!(society = %id, block = %layout.block_name.trim(), floors = layout.floors.len(), "block saved");
        Ok(soc)
    }

    pub async fn remove_block(&self, ctx: &TenantContext, id: &str, block_name: &str) -> Result<Society> {
        own(ctx, id)?;
        self.state
            .store
            .transaction(|tx| {
                let mut soc = tx.societies.require(id, id, SOCIETY)?;
                soc.apartment_structure
                    .remove_block(block_name)
                    .map_err(StructureError::into_anyhow)?;
                soc.touch();
                tx.societies.put(soc.clone());
                Ok(soc)
            })
            .await
    }

    /// Rebuild tree memberships from the approved residents' placements.
    pub async fn reconcile(&self, ctx: &TenantContext, id: &str) -> Result<ReconcileReport> {
        own(ctx, id)?;
        let report = self
            .state
            .store
            .transaction(|tx| {
                let mut soc = tx.societies.require(id, id, SOCIETY)?;
                let residents: Vec<Resident> = tx.residents.in_society(id).cloned().collect();
                let report = structure::reconcile(&mut soc, &residents);
                if !report.is_clean() {
                    soc.touch();
                    tx.societies.put(soc);
                }
                Ok(report)
            })
            .await?;

        if report.is_clean() {
            info!(society = %id, "apartment tree already consistent");
        } else {
            warn!(
                society = %id,
                added = report.added.len(),
                removed = report.removed.len(),
                list_added = report.society_list_added.len(),
                list_removed = report.society_list_removed.len(),
                "apartment tree repaired"
            );
        }
        Ok(report)
    }
}

#[async_trait]
impl SocietyService<SocietyParams> for SocietiesService {
    type Record = Society;
    type Create = CreateSociety;
    type Patch = PatchSociety;

    fn capabilities(&self) -> ServiceCapabilities {
        societies_shared::crud_capabilities()
    }

    async fn find(&self, ctx: &TenantContext, _params: SocietyParams) -> Result<Vec<Society>> {
        ctx.actor()?;
        let society = ctx.society();
        Ok(self
            .state
            .store
            .read(|c| c.societies.get(society).cloned())
            .await
            .into_iter()
            .collect())
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<Society> {
        own(ctx, id)?;
        self.state.store.read(|c| c.societies.require(id, id, SOCIETY)).await
    }

    /// The admin of a new society registers it under the id their token
    /// names.
    async fn create(&self, ctx: &TenantContext, data: CreateSociety, _params: SocietyParams) -> Result<Society> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let id = data.id.trim().to_string();
        if id != ctx.society() {
            bail_society!(forbidden, "A society can only be created by its own admin");
        }

        let soc = self
            .state
            .store
            .transaction(|tx| {
                if tx.societies.get(&id).is_some() {
                    bail_society!(conflict, "Society '{}' already exists", id);
                }
                let mut soc = Society::new(id.clone(), data.name.trim());
                soc.address = data.address.map(|a| a.trim().to_string());
                tx.societies.put(soc.clone());
                Ok(soc)
            })
            .await?;
        info!(society = %soc.id, "society created");
        Ok(soc)
    }

    async fn patch(&self, ctx: &TenantContext, id: &str, data: PatchSociety, _params: SocietyParams) -> Result<Society> {
        own(ctx, id)?;
        schema::validate(&data, SCHEMA_ERROR)?;
        self.state
            .store
            .transaction(|tx| {
                let mut soc = tx.societies.require(id, id, SOCIETY)?;
                if let Some(name) = data.name {
                    soc.name = name.trim().to_string();
                }
                if let Some(address) = data.address {
                    soc.address = Some(address.trim().to_string());
                }
                soc.touch();
                tx.societies.put(soc.clone());
                Ok(soc)
            })
            .await
    }
}
