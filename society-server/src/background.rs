//! Periodic billing: every `billing.scheduler_interval_secs` the due
//! schedules of every society are run through the `scheduled-bills` service
//! as an internal admin call.

use std::sync::Arc;

use society_auth::AuthParams;
use society_axum::RestParams;
use society_core::{Actor, Role, ServiceMethodKind, SocietyApp, TenantContext};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::services::scheduled_bills::scheduled_bills_shared::{NAME, RUN_DUE};
use crate::services::scheduled_bills::ScheduledBillsService;
use crate::services::{SocietyParams, SocietyState};

pub struct BillingScheduler {
    app: SocietyApp<SocietyParams>,
    state: Arc<SocietyState>,
    service: Arc<ScheduledBillsService>,
    every: Duration,
}

impl BillingScheduler {
    pub fn new(
        app: SocietyApp<SocietyParams>,
        state: Arc<SocietyState>,
        service: Arc<ScheduledBillsService>,
    ) -> Self {
        let secs = app
            .config_snapshot()
            .get_u64("billing.scheduler_interval_secs")
            .unwrap_or(3600);
        Self {
            app,
            state,
            service,
            every: Duration::from_secs(secs),
        }
    }

    pub fn enabled(&self) -> bool {
        !self.every.is_zero()
    }

    /// One pass over every society. Returns the number of bills issued.
    pub async fn tick(&self) -> usize {
        let societies: Vec<String> = self
            .state
            .store
            .read(|c| c.societies.iter().map(|s| s.id.clone()).collect())
            .await;

        let mut issued = 0;
        for society in societies {
            let tenant = TenantContext::new(society.clone()).with_actor(Actor {
                id: society.clone(),
                role: Role::Admin,
            });
            let svc = Arc::clone(&self.service);
            let res = self
                .app
                .call(
                    NAME,
                    ServiceMethodKind::Custom(RUN_DUE),
                    tenant,
                    AuthParams::internal(RestParams::default()),
                    move |tenant, _| async move { svc.run_due(&tenant).await },
                )
                .await;
            match res {
                Ok(reports) => issued += reports.iter().map(|r| r.bill_ids.len()).sum::<usize>(),
                Err(err) => error!(society = %society, error = %err, "scheduled billing failed"),
            }
        }
        issued
    }

    /// Start the loop. `None` when the interval is `0`.
    pub fn spawn(self) -> Option<JoinHandle<()>> {
        if !self.enabled() {
            info!("billing scheduler disabled");
            return None;
        }
        info!(every_secs = self.every.as_secs(), "billing scheduler started");
        Some(tokio::spawn(async move {
            let mut ticker = interval(self.every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let issued = self.tick().await;
                if issued > 0 {
                    info!(issued, "scheduled bills issued");
                }
            }
        }))
    }
}
