use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use society_core::billing::{self, BillDraft, BillingError};
use society_core::models::{Bill, BillStatus, FlatDetails, Society};
use society_core::structure::StructureError;
use society_core::{bail_society, schema, Role, ServiceCapabilities, SocietyService, TenantContext};
use tracing::info;

use crate::services::access::{forbidden, lives_in, placements, today, SOCIETY};
use crate::services::{SocietyParams, SocietyState};

use super::bills_schema::{CreateBill, SCHEMA_ERROR};
use super::bills_shared;

const BILL: &str = "Bill";

pub struct BillsService {
    pub state: Arc<SocietyState>,
    pub default_due_in_days: u32,
}

fn parse_status(v: &str) -> Result<BillStatus> {
    match v {
        "unpaid" => Ok(BillStatus::Unpaid),
        "paid" => Ok(BillStatus::Paid),
        other => bail_society!(bad_request, "Unknown bill status '{}'", other),
    }
}

/// Admins see every bill; residents only those of flats the tree lists them
/// in.
fn visible(ctx: &TenantContext, society: Option<&Society>, bill: &Bill) -> bool {
    match &ctx.actor {
        Some(a) if a.role == Role::Admin => true,
        Some(a) if a.role == Role::Resident => {
            lives_in(&placements(society, &a.id), &bill.flat)
        }
        _ => false,
    }
}

impl BillsService {
    pub fn new(state: Arc<SocietyState>, default_due_in_days: u32) -> Self {
        Self {
            state,
            default_due_in_days,
        }
    }

    /// Settle a bill once. Admins pay any bill, residents only their own
    /// flat's.
    pub async fn pay(&self, ctx: &TenantContext, id: &str) -> Result<Bill> {
        let actor = ctx.actor()?.clone();
        let society = ctx.society();
        let bill = self
            .state
            .store
            .transaction(|tx| {
                let mut bill = tx.bills.require(society, id, BILL)?;
                if !visible(ctx, tx.societies.get(society), &bill) {
                    return Err(forbidden("Only the society or a resident of the flat may pay this bill"));
                }
                if bill.status == BillStatus::Paid {
                    bail_society!(conflict, "Bill {} is already paid", id);
                }
                bill.status = BillStatus::Paid;
                bill.paid_at = Some(Utc::now());
                bill.paid_by = Some(actor.id.clone());
                tx.bills.put(bill.clone());
                Ok(bill)
            })
            .await?;
        info!(society = %society, bill = %bill.id, total = bill.total, paid_by = %actor.id, "bill paid");
        Ok(bill)
    }
}

#[async_trait]
impl SocietyService<SocietyParams> for BillsService {
    type Record = Bill;
    type Create = CreateBill;
    type Patch = Value;

    fn capabilities(&self) -> ServiceCapabilities {
        bills_shared::crud_capabilities()
    }

    async fn find(&self, ctx: &TenantContext, params: SocietyParams) -> Result<Vec<Bill>> {
        ctx.actor()?;
        let status = params.inner.query_str("status").map(parse_status).transpose()?;
        let society = ctx.society();
        let mut bills: Vec<Bill> = self
            .state
            .store
            .read(|c| {
                let soc = c.societies.get(society);
                c.bills
                    .in_society(society)
                    .filter(|b| visible(ctx, soc, b))
                    .filter(|b| status.map_or(true, |s| b.status == s))
                    .cloned()
                    .collect()
            })
            .await;
        bills.sort_by(|a, b| b.due_date.cmp(&a.due_date).then_with(|| a.id.cmp(&b.id)));
        Ok(bills)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<Bill> {
        ctx.actor()?;
        let society = ctx.society();
        self.state
            .store
            .read(|c| -> Result<Bill> {
                let bill = c.bills.require(society, id, BILL)?;
                if !visible(ctx, c.societies.get(society), &bill) {
                    bail_society!(not_found, "{} not found: {}", BILL, id);
                }
                Ok(bill)
            })
            .await
    }

    /// Issue a one-off bill to an existing flat and record it on the society.
    async fn create(&self, ctx: &TenantContext, data: CreateBill, _params: SocietyParams) -> Result<Bill> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let society = ctx.society();
        let due = match data.due_date {
            Some(d) => d,
            None => billing::due_date(today(), data.due_in_days.unwrap_or(self.default_due_in_days))
                .map_err(BillingError::into_anyhow)?,
        };
        let title = data.title.trim();

        let bill = self
            .state
            .store
            .transaction(|tx| {
                let mut soc = tx.societies.require(society, society, SOCIETY)?;
                let (flat, residents) = soc
                    .apartment_structure
                    .resolve_flat(&data.block_name, data.floor_index, &data.flat_number)
                    .map(|(flat, node)| (flat, node.residents.clone()))
                    .map_err(StructureError::into_anyhow)?;
                let bill = issue(title, &data, due, society, flat, residents)?;

                soc.bills.push(bill.id.clone());
                soc.touch();
                tx.societies.put(soc);
                tx.bills.put(bill.clone());
                Ok(bill)
            })
            .await?;

        info!(
            society = %society,
            bill = %bill.id,
            block = %bill.flat.block_name,
            floor = bill.flat.floor_index,
            flat = %bill.flat.flat_number,
            total = bill.total,
            "bill issued"
        );
        Ok(bill)
    }

    /// Unpaid bills only.
    async fn remove(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<Bill> {
        let society = ctx.society();
        self.state
            .store
            .transaction(|tx| {
                let bill = tx.bills.require(society, id, BILL)?;
                if bill.status == BillStatus::Paid {
                    bail_society!(conflict, "Bill {} is paid and cannot be removed", id);
                }
                if let Some(mut soc) = tx.societies.get(society).cloned() {
                    soc.bills.retain(|b| *b != bill.id);
                    soc.touch();
                    tx.societies.put(soc);
                }
                tx.bills.delete(&bill.id);
                Ok(bill)
            })
            .await
    }
}

fn issue(
    title: &str,
    data: &CreateBill,
    due: NaiveDate,
    society: &str,
    flat: FlatDetails,
    residents: Vec<String>,
) -> Result<Bill> {
    BillDraft {
        title,
        base_amount: data.base_amount,
        gst_rate_bp: data.gst_rate_bp,
        additional_charges: &data.additional_charges,
        due_date: due,
        scheduled_bill_id: None,
    }
    .issue(society, flat, residents)
    .map_err(BillingError::into_anyhow)
}
