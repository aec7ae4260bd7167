use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use society_auth::RequireRole;
use society_axum::{rest, Rest, ServiceState, SocietyAxumError};
use society_core::models::Resident;
use society_core::{Role, ServiceCapabilities, ServiceMethodKind, SocietyApp};

use crate::services::SocietyParams;

use super::ResidentsService;

pub const NAME: &str = "residents";
pub const APPROVE: &str = "approve";

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![
        ServiceMethodKind::Create,
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Patch,
        ServiceMethodKind::Remove,
    ])
}

pub fn register_hooks(app: &SocietyApp<SocietyParams>) {
    app.service_hooks(NAME, |h| {
        h.before(ServiceMethodKind::Create, Arc::new(RequireRole::new(&[Role::Admin, Role::Resident])));
        h.before(ServiceMethodKind::Remove, Arc::new(RequireRole::admin()));
        h.before(ServiceMethodKind::Custom(APPROVE), Arc::new(RequireRole::admin()));
    });
}

type St = ServiceState<ResidentsService, SocietyParams>;

async fn approve(
    State(st): State<St>,
    Path(id): Path<String>,
    Rest(params): Rest<SocietyParams>,
) -> Result<Json<Resident>, SocietyAxumError> {
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, APPROVE, params, move |tenant, _| async move {
        svc.approve(&tenant, &id).await
    })
    .await
}

/// `POST /residents/{id}/approve`
pub fn routes(app: &SocietyApp<SocietyParams>, service: Arc<ResidentsService>) -> Router<()> {
    Router::new()
        .route("/residents/{id}/approve", post(approve))
        .with_state(ServiceState::new(app.clone(), NAME, service))
}
