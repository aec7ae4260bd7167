use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use society_core::models::{new_id, Resident, ResidentStatus};
use society_core::structure::StructureError;
use society_core::{bail_society, schema, Role, ServiceCapabilities, SocietyService, TenantContext};
use tracing::{info, warn};

use crate::services::access::SOCIETY;
use crate::services::{SocietyParams, SocietyState};

use super::residents_schema::{non_blank_name, CreateResident, PatchResident, SCHEMA_ERROR};
use super::residents_shared;

const RESIDENT: &str = "Resident";

pub struct ResidentsService {
    pub state: Arc<SocietyState>,
}

impl ResidentsService {
    pub fn new(state: Arc<SocietyState>) -> Self {
        Self { state }
    }

    /// Mark a resident verified and place them in the apartment tree. The
    /// resident and society documents commit together.
    pub async fn approve(&self, ctx: &TenantContext, id: &str) -> Result<Resident> {
        let society = ctx.society();
        let resident = self
            .state
            .store
            .transaction(|tx| {
                let mut resident = tx.residents.require(society, id, RESIDENT)?;
                let mut soc = tx.societies.require(society, society, SOCIETY)?;

                let details = resident.flat_details.clone().normalized();
                soc.admit_resident(&details, &resident.id)
                    .map_err(StructureError::into_anyhow)?;

                let now = Utc::now();
                if !resident.is_approved() {
                    resident.status = ResidentStatus::Approved;
                    resident.approved_at = Some(now);
                }
                resident.flat_details = details;
                resident.updated_at = now;

                tx.residents.put(resident.clone());
                tx.societies.put(soc);
                Ok(resident)
            })
            .await?;

        info!(
            society = %society,
            resident = %resident.id,
            block = %resident.flat_details.block_name,
            flat = %resident.flat_details.flat_number,
            "resident approved"
        );
        Ok(resident)
    }
}

fn parse_status(v: &str) -> Result<ResidentStatus> {
    match v {
        "pending" => Ok(ResidentStatus::Pending),
        "approved" => Ok(ResidentStatus::Approved),
        other => bail_society!(bad_request, "Unknown resident status '{}'", other),
    }
}

/// Admins and guards see every resident; residents see approved neighbours
/// and themselves.
fn visible(ctx: &TenantContext, r: &Resident) -> bool {
    match &ctx.actor {
        Some(a) if a.role == Role::Resident => r.is_approved() || r.id == a.id,
        Some(_) => true,
        None => false,
    }
}

#[async_trait]
impl SocietyService<SocietyParams> for ResidentsService {
    type Record = Resident;
    type Create = CreateResident;
    type Patch = PatchResident;

    fn capabilities(&self) -> ServiceCapabilities {
        residents_shared::crud_capabilities()
    }

    async fn find(&self, ctx: &TenantContext, params: SocietyParams) -> Result<Vec<Resident>> {
        ctx.actor()?;
        let status = params.inner.query_str("status").map(parse_status).transpose()?;
        let society = ctx.society();

        let mut out: Vec<Resident> = self
            .state
            .store
            .read(|c| {
                c.residents
                    .in_society(society)
                    .filter(|r| visible(ctx, r))
                    .filter(|r| status.map_or(true, |s| r.status == s))
                    .cloned()
                    .collect()
            })
            .await;
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<Resident> {
        ctx.actor()?;
        let resident = self
            .state
            .store
            .read(|c| c.residents.require(ctx.society(), id, RESIDENT))
            .await?;
        if !visible(ctx, &resident) {
            bail_society!(not_found, "{} not found: {}", RESIDENT, id);
        }
        Ok(resident)
    }

    /// Admins register anyone; a resident registers themselves under their
    /// own account id. Either way the resident starts out pending.
    async fn create(&self, ctx: &TenantContext, data: CreateResident, _params: SocietyParams) -> Result<Resident> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let actor = ctx.actor()?.clone();
        let name = non_blank_name(&data.name)?;
        let society = ctx.society();

        let id = match actor.role {
            Role::Resident => actor.id.clone(),
            _ => new_id("res"),
        };
        let email = data.email.trim().to_lowercase();

        self.state
            .store
            .transaction(|tx| {
                tx.societies.require(society, society, SOCIETY)?;
                if tx.residents.get(&id).is_some() {
                    bail_society!(conflict, "Resident '{}' is already registered", id);
                }
                if tx.residents.in_society(society).any(|r| r.email == email) {
                    bail_society!(conflict, "Email '{}' is already registered in this society", email);
                }

                let now = Utc::now();
                let resident = Resident {
                    id: id.clone(),
                    society_id: society.to_string(),
                    name,
                    email,
                    phone: data.phone.map(|p| p.trim().to_string()),
                    flat_details: data.flat_details.normalized(),
                    status: ResidentStatus::Pending,
                    blocked_users: Vec::new(),
                    created_at: now,
                    updated_at: now,
                    approved_at: None,
                };
                tx.residents.put(resident.clone());
                Ok(resident)
            })
            .await
    }

    /// Name and phone edits by an admin or the resident. A new placement is
    /// admin-only; for an approved resident it moves the tree membership,
    /// failing without writes if the recorded flat is missing.
    async fn patch(&self, ctx: &TenantContext, id: &str, data: PatchResident, _params: SocietyParams) -> Result<Resident> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let actor = ctx.actor()?;
        let is_self = actor.role == Role::Resident && actor.id == id;
        if !ctx.is_admin() && !is_self {
            bail_society!(forbidden, "Only the society or the resident may edit this profile");
        }
        if !ctx.is_admin() && data.flat_details.is_some() {
            bail_society!(forbidden, "Only the society may move a resident");
        }
        let name = data.name.as_deref().map(non_blank_name).transpose()?;
        let society = ctx.society();

        let (resident, moved) = self
            .state
            .store
            .transaction(|tx| {
                let mut resident = tx.residents.require(society, id, RESIDENT)?;
                let mut moved = false;

                if let Some(name) = name {
                    resident.name = name;
                }
                if let Some(phone) = data.phone {
                    resident.phone = Some(phone.trim().to_string());
                }
                if let Some(details) = data.flat_details {
                    let details = details.normalized();
                    if resident.is_approved() && !details.same_flat(&resident.flat_details) {
                        let mut soc = tx.societies.require(society, society, SOCIETY)?;
                        soc.evict_resident(&resident.flat_details, &resident.id)
                            .map_err(StructureError::into_anyhow)?;
                        soc.admit_resident(&details, &resident.id)
                            .map_err(StructureError::into_anyhow)?;
                        tx.societies.put(soc);
                        moved = true;
                    }
                    resident.flat_details = details;
                }

                resident.updated_at = Utc::now();
                tx.residents.put(resident.clone());
                Ok((resident, moved))
            })
            .await?;

        if moved {
            info!(
                society = %society,
                resident = %resident.id,
                block = %resident.flat_details.block_name,
                flat = %resident.flat_details.flat_number,
                "resident re-assigned"
            );
        }
        Ok(resident)
    }

    /// Delete a resident and every trace of them in the apartment tree. If the
    /// recorded placement is gone the whole tree is swept instead.
    async fn remove(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<Resident> {
        let society = ctx.society();
        self.state
            .store
            .transaction(|tx| {
                let resident = tx.residents.require(society, id, RESIDENT)?;
                let mut soc = tx.societies.require(society, society, SOCIETY)?;

                if resident.is_approved() {
                    if let Err(err) = soc.evict_resident(&resident.flat_details, &resident.id) {
                        warn!(
                            society = %society,
                            resident = %resident.id,
                            %err,
                            "recorded placement not found, sweeping the apartment tree"
                        );
                    }
                }
                let swept = soc.purge_resident(&resident.id);
                if swept > 0 {
                    warn!(society = %society, resident = %resident.id, swept, "removed stray memberships");
                }

                tx.societies.put(soc);
                tx.residents.delete(&resident.id);
                Ok(resident)
            })
            .await
    }
}
