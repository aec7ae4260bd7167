use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use society_core::billing::{self, BillingError};
use society_core::models::{new_id, ScheduledBill};
use society_core::{bail_society, schema, ServiceCapabilities, SocietyService, TenantContext, Transaction};
use tracing::{info, warn};

use crate::services::access::{today, SOCIETY};
use crate::services::{SocietyParams, SocietyState};

use super::scheduled_bills_schema::{CreateScheduledBill, GenerationReport, PatchScheduledBill, SCHEMA_ERROR};
use super::scheduled_bills_shared;

const SCHEDULED_BILL: &str = "Scheduled bill";

pub struct ScheduledBillsService {
    pub state: Arc<SocietyState>,
    pub default_due_in_days: u32,
}

/// Amounts must be billable before a template is stored.
fn check_amounts(s: &ScheduledBill) -> Result<()> {
    billing::compute(s.base_amount, s.gst_rate_bp, &s.additional_charges)
        .map(|_| ())
        .map_err(BillingError::into_anyhow)
}

/// Issue the bills of one schedule and record them on the society.
fn run_schedule(tx: &mut Transaction<'_>, society: &str, id: &str, today: NaiveDate) -> Result<GenerationReport> {
    let mut schedule = tx.scheduled_bills.require(society, id, SCHEDULED_BILL)?;
    if !schedule.active {
        bail_society!(conflict, "Scheduled bill {} is paused", id);
    }
    let mut soc = tx.societies.require(society, society, SOCIETY)?;
    let bills = schedule.generate(&soc, today).map_err(BillingError::into_anyhow)?;

    let bill_ids: Vec<String> = bills.iter().map(|b| b.id.clone()).collect();
    soc.bills.extend(bill_ids.iter().cloned());
    soc.touch();
    for bill in bills {
        tx.bills.put(bill);
    }
    let report = GenerationReport {
        scheduled_bill_id: schedule.id.clone(),
        bill_ids,
        next_run: schedule.next_run,
    };
    tx.scheduled_bills.put(schedule);
    tx.societies.put(soc);
    Ok(report)
}

impl ScheduledBillsService {
    pub fn new(state: Arc<SocietyState>, default_due_in_days: u32) -> Self {
        Self {
            state,
            default_due_in_days,
        }
    }

    /// Run one schedule now, whatever its `nextRun`.
    pub async fn generate(&self, ctx: &TenantContext, id: &str) -> Result<GenerationReport> {
        let society = ctx.society();
        let report = self
            .state
            .store
            .transaction(|tx| run_schedule(tx, society, id, today()))
            .await?;
        info!(
            society = %society,
            schedule = %report.scheduled_bill_id,
            bills = report.bill_ids.len(),
            next_run = %report.next_run,
            "scheduled bill generated"
        );
        Ok(report)
    }

    /// Run every active schedule whose `nextRun` has come. Each schedule
    /// commits on its own; a failing one is logged and skipped.
    pub async fn run_due(&self, ctx: &TenantContext) -> Result<Vec<GenerationReport>> {
        let society = ctx.society();
        let today = today();
        let due: Vec<String> = self
            .state
            .store
            .read(|c| {
                c.scheduled_bills
                    .in_society(society)
                    .filter(|s| s.is_due(today))
                    .map(|s| s.id.clone())
                    .collect()
            })
            .await;

        let mut reports = Vec::with_capacity(due.len());
        for id in due {
            match self
                .state
                .store
                .transaction(|tx| run_schedule(tx, society, &id, today))
                .await
            {
                Ok(report) => reports.push(report),
                Err(err) => warn!(society = %society, schedule = %id, error = %err, "scheduled bill run failed"),
            }
        }

        if !reports.is_empty() {
            info!(
                society = %society,
                schedules = reports.len(),
                bills = reports.iter().map(|r| r.bill_ids.len()).sum::<usize>(),
                "due schedules generated"
            );
        }
        Ok(reports)
    }
}

#[async_trait]
impl SocietyService<SocietyParams> for ScheduledBillsService {
    type Record = ScheduledBill;
    type Create = CreateScheduledBill;
    type Patch = PatchScheduledBill;

    fn capabilities(&self) -> ServiceCapabilities {
        scheduled_bills_shared::crud_capabilities()
    }

    async fn find(&self, ctx: &TenantContext, _params: SocietyParams) -> Result<Vec<ScheduledBill>> {
        let society = ctx.society();
        let mut out: Vec<ScheduledBill> = self
            .state
            .store
            .read(|c| c.scheduled_bills.in_society(society).cloned().collect())
            .await;
        out.sort_by(|a, b| a.next_run.cmp(&b.next_run).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<ScheduledBill> {
        self.state
            .store
            .read(|c| c.scheduled_bills.require(ctx.society(), id, SCHEDULED_BILL))
            .await
    }

    async fn create(&self, ctx: &TenantContext, data: CreateScheduledBill, _params: SocietyParams) -> Result<ScheduledBill> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let society = ctx.society();
        let next_run = data.next_run.unwrap_or_else(today);
        let schedule = ScheduledBill {
            id: new_id("schedule"),
            society_id: society.to_string(),
            title: data.title.trim().to_string(),
            base_amount: data.base_amount,
            gst_rate_bp: data.gst_rate_bp,
            additional_charges: data.additional_charges,
            frequency: data.frequency,
            next_run,
            billing_day: next_run.day(),
            due_in_days: data.due_in_days.unwrap_or(self.default_due_in_days),
            active: data.active,
            last_run: None,
            created_at: Utc::now(),
        };
        check_amounts(&schedule)?;

        self.state
            .store
            .transaction(|tx| {
                tx.societies.require(society, society, SOCIETY)?;
                tx.scheduled_bills.put(schedule.clone());
                Ok(schedule)
            })
            .await
    }

    async fn patch(&self, ctx: &TenantContext, id: &str, data: PatchScheduledBill, _params: SocietyParams) -> Result<ScheduledBill> {
        schema::validate(&data, SCHEMA_ERROR)?;
        let society = ctx.society();
        self.state
            .store
            .transaction(|tx| {
                let mut s = tx.scheduled_bills.require(society, id, SCHEDULED_BILL)?;
                if let Some(title) = data.title {
                    s.title = title.trim().to_string();
                }
                if let Some(v) = data.base_amount {
                    s.base_amount = v;
                }
                if let Some(v) = data.gst_rate_bp {
                    s.gst_rate_bp = v;
                }
                if let Some(v) = data.additional_charges {
                    s.additional_charges = v;
                }
                if let Some(v) = data.frequency {
                    s.frequency = v;
                }
                if let Some(v) = data.next_run {
                    s.next_run = v;
                    s.billing_day = v.day();
                }
                if let Some(v) = data.due_in_days {
                    s.due_in_days = v;
                }
                if let Some(v) = data.active {
                    s.active = v;
                }
                check_amounts(&s)?;
                tx.scheduled_bills.put(s.clone());
                Ok(s)
            })
            .await
    }

    /// Bills already issued by the schedule stay.
    async fn remove(&self, ctx: &TenantContext, id: &str, _params: SocietyParams) -> Result<ScheduledBill> {
        let society = ctx.society();
        self.state
            .store
            .transaction(|tx| {
                let s = tx.scheduled_bills.require(society, id, SCHEDULED_BILL)?;
                tx.scheduled_bills.delete(&s.id);
                Ok(s)
            })
            .await
    }
}
