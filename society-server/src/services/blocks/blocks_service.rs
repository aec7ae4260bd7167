use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use society_core::models::Resident;
use society_core::{bail_society, schema, ServiceCapabilities, SocietyService, TenantContext};
use tracing::debug;

use crate::services::access::{caller_resident, forbidden, staged_caller};
use crate::services::{SocietyParams, SocietyState};

use super::blocks_schema::{BlockedUser, SCHEMA_ERROR};
use super::blocks_shared;

/// The caller's own feed block list. Ids are resident ids of the same
/// society.
pub struct BlocksService {
    pub state: Arc<SocietyState>,
}

impl BlocksService {
    pub fn new(state: Arc<SocietyState>) -> Self {
        Self { state }
    }
}

fn registered() -> anyhow::Error {
    forbidden("Only registered residents keep a block list")
}

fn entries(r: &Resident) -> Vec<BlockedUser> {
    r.blocked_users
        .iter()
        .map(|id| BlockedUser { user_id: id.clone() })
        .collect()
}

#[async_trait]
impl SocietyService<SocietyParams> for BlocksService {
    type Record = BlockedUser;
    type Create = BlockedUser;
    type Patch = Value;

    fn capabilities(&self) -> ServiceCapabilities {
        blocks_shared::crud_capabilities()
    }

    async fn find(&self, ctx: &TenantContext, _params: SocietyParams) -> Result<Vec<BlockedUser>> {
        self.state
            .store
            .read(|c| caller_resident(c, ctx).map(entries).ok_or_else(registered))
            .await
    }

    /// Blocking is idempotent.
    async fn create(&self, ctx: &TenantContext, data: BlockedUser, _params: SocietyParams) -> Result<BlockedUser> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let target = data.user_id.trim().to_string();
        let society = ctx.society();

        self.state
            .store
            .transaction(|tx| {
                let mut me = staged_caller(tx, ctx).cloned().ok_or_else(registered)?;
                if me.id == target {
                    bail_society!(bad_request, "You cannot block yourself");
                }
                tx.residents.require(society, &target, "Resident")?;

                if !me.blocked_users.contains(&target) {
                    me.blocked_users.push(target.clone());
                    me.updated_at = Utc::now();
                    debug!(resident = %me.id, blocked = %target, "user blocked");
                    tx.residents.put(me);
                }
                Ok(BlockedUser { user_id: target })
            })
            .await
    }

    /// `id` is the blocked user's id.
    async fn remove(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<BlockedUser> {
        self.state
            .store
            .transaction(|tx| {
                let mut me = staged_caller(tx, ctx).cloned().ok_or_else(registered)?;
                let before = me.blocked_users.len();
                me.blocked_users.retain(|u| u != id);
                if me.blocked_users.len() == before {
                    bail_society!(not_found, "User {} is not blocked", id);
                }
                me.updated_at = Utc::now();
                tx.residents.put(me);
                Ok(BlockedUser { user_id: id.to_string() })
            })
            .await
    }
}
