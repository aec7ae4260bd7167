use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use society_auth::RequireRole;
use society_axum::{rest, Rest, ServiceState, SocietyAxumError};
use society_core::{ServiceCapabilities, SocietyApp};

use crate::services::SocietyParams;

use super::scheduled_bills_schema::GenerationReport;
use super::ScheduledBillsService;

pub const NAME: &str = "scheduled-bills";
pub const GENERATE: &str = "generate";
pub const RUN_DUE: &str = "run_due";

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::standard_crud()
}

/// Schedules are an admin tool end to end.
pub fn register_hooks(app: &SocietyApp<SocietyParams>) {
    app.service_hooks(NAME, |h| {
        h.before_all(Arc::new(RequireRole::admin()));
    });
}

type St = ServiceState<ScheduledBillsService, SocietyParams>;

async fn generate(
    State(st): State<St>,
    Path(id): Path<String>,
    Rest(params): Rest<SocietyParams>,
) -> Result<Json<GenerationReport>, SocietyAxumError> {
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, GENERATE, params, move |tenant, _| async move {
        svc.generate(&tenant, &id).await
    })
    .await
}

async fn run_due(
    State(st): State<St>,
    Rest(params): Rest<SocietyParams>,
) -> Result<Json<Vec<GenerationReport>>, SocietyAxumError> {
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, RUN_DUE, params, move |tenant, _| async move {
        svc.run_due(&tenant).await
    })
    .await
}

/// `POST /scheduled-bills/run-due` and `POST /scheduled-bills/{id}/generate`
pub fn routes(app: &SocietyApp<SocietyParams>, service: Arc<ScheduledBillsService>) -> Router<()> {
    Router::new()
        .route("/scheduled-bills/run-due", post(run_due))
        .route("/scheduled-bills/{id}/generate", post(generate))
        .with_state(ServiceState::new(app.clone(), NAME, service))
}
