use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use society_core::models::{new_id, Society, VisitorLog, VisitorStatus};
use society_core::structure::StructureError;
use society_core::{bail_society, schema, Role, ServiceCapabilities, SocietyService, TenantContext};
use tracing::info;

use crate::services::access::{lives_in, placements, SOCIETY};
use crate::services::{SocietyParams, SocietyState};

use super::visitors_schema::{CreateVisitor, SCHEMA_ERROR};
use super::visitors_shared;

const VISITOR: &str = "Visitor";

pub struct VisitorsService {
    pub state: Arc<SocietyState>,
}

/// Guards and admins see the whole log; residents see visits to their flats.
fn visible(ctx: &TenantContext, society: Option<&Society>, log: &VisitorLog) -> bool {
    match &ctx.actor {
        Some(a) if a.role == Role::Resident => {
            lives_in(&placements(society, &a.id), &log.flat())
        }
        Some(_) => true,
        None => false,
    }
}

impl VisitorsService {
    pub fn new(state: Arc<SocietyState>) -> Self {
        Self { state }
    }

    pub async fn checkout(&self, ctx: &TenantContext, id: &str) -> Result<VisitorLog> {
        let society = ctx.society();
        let log = self
            .state
            .store
            .transaction(|tx| {
                let mut log = tx.visitors.require(society, id, VISITOR)?;
                if log.status == VisitorStatus::CheckedOut {
                    bail_society!(conflict, "Visitor {} has already checked out", id);
                }
                log.status = VisitorStatus::CheckedOut;
                log.check_out_at = Some(Utc::now());
                tx.visitors.put(log.clone());
                Ok(log)
            })
            .await?;
        info!(society = %society, visitor = %log.id, "visitor checked out");
        Ok(log)
    }
}

#[async_trait]
impl SocietyService<SocietyParams> for VisitorsService {
    type Record = VisitorLog;
    type Create = CreateVisitor;
    type Patch = Value;

    fn capabilities(&self) -> ServiceCapabilities {
        visitors_shared::crud_capabilities()
    }

    /// Newest first. `?status=checkedIn|checkedOut` filters.
    async fn find(&self, ctx: &TenantContext, params: SocietyParams) -> Result<Vec<VisitorLog>> {
        ctx.actor()?;
        let status = match params.inner.query_str("status") {
            None => None,
            Some(v) => match VisitorStatus::parse(v) {
                Some(s) => Some(s),
                None => bail_society!(bad_request, "Unknown visitor status '{}'", v),
            },
        };
        let society = ctx.society();
        let mut out: Vec<VisitorLog> = self
            .state
            .store
            .read(|c| {
                let soc = c.societies.get(society);
                c.visitors
                    .in_society(society)
                    .filter(|v| visible(ctx, soc, v))
                    .filter(|v| status.map_or(true, |s| v.status == s))
                    .cloned()
                    .collect()
            })
            .await;
        out.sort_by(|a, b| b.check_in_at.cmp(&a.check_in_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<VisitorLog> {
        ctx.actor()?;
        let society = ctx.society();
        self.state
            .store
            .read(|c| -> Result<VisitorLog> {
                let log = c.visitors.require(society, id, VISITOR)?;
                if !visible(ctx, c.societies.get(society), &log) {
                    bail_society!(not_found, "{} not found: {}", VISITOR, id);
                }
                Ok(log)
            })
            .await
    }

    /// Check a visitor in against a flat that exists in the tree.
    async fn create(&self, ctx: &TenantContext, data: CreateVisitor, _params: SocietyParams) -> Result<VisitorLog> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let guard = ctx.actor()?.id.clone();
        let society = ctx.society();

        let log = self
            .state
            .store
            .transaction(|tx| {
                let mut soc = tx.societies.require(society, society, SOCIETY)?;
                let (flat, _) = soc
                    .apartment_structure
                    .resolve_flat(&data.block_name, data.floor_index, &data.flat_number)
                    .map_err(StructureError::into_anyhow)?;

                let log = VisitorLog {
                    id: new_id("visitor"),
                    society_id: society.to_string(),
                    visitor_name: data.visitor_name.trim().to_string(),
                    phone: data.phone.as_deref().map(|p| p.trim().to_string()),
                    purpose: data.purpose.trim().to_string(),
                    block_name: flat.block_name,
                    floor_index: flat.floor_index,
                    flat_number: flat.flat_number,
                    vehicle_number: data.vehicle_number.as_deref().map(|v| v.trim().to_uppercase()),
                    logged_by: guard.clone(),
                    status: VisitorStatus::CheckedIn,
                    check_in_at: Utc::now(),
                    check_out_at: None,
                };
                soc.visitor_logs.push(log.id.clone());
                soc.touch();
                tx.societies.put(soc);
                tx.visitors.put(log.clone());
                Ok(log)
            })
            .await?;

        info!(
            society = %society,
            visitor = %log.id,
            block = %log.block_name,
            floor = log.floor_index,
            flat = %log.flat_number,
            "visitor checked in"
        );
        Ok(log)
    }
}
