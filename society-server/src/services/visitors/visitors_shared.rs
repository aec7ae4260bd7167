use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use society_auth::RequireRole;
use society_axum::{rest, Rest, ServiceState, SocietyAxumError};
use society_core::models::VisitorLog;
use society_core::{Role, ServiceCapabilities, ServiceMethodKind, SocietyApp};

use crate::services::SocietyParams;

use super::VisitorsService;

pub const NAME: &str = "visitors";
pub const CHECKOUT: &str = "checkout";

/// The log is append-only apart from check-out.
pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Create,
    ])
}

pub fn register_hooks(app: &SocietyApp<SocietyParams>) {
    app.service_hooks(NAME, |h| {
        h.before(ServiceMethodKind::Create, Arc::new(RequireRole::new(&[Role::Guard])));
        h.before(
            ServiceMethodKind::Custom(CHECKOUT),
            Arc::new(RequireRole::new(&[Role::Guard, Role::Admin])),
        );
    });
}

type St = ServiceState<VisitorsService, SocietyParams>;

async fn checkout(
    State(st): State<St>,
    Path(id): Path<String>,
    Rest(params): Rest<SocietyParams>,
) -> Result<Json<VisitorLog>, SocietyAxumError> {
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, CHECKOUT, params, move |tenant, _| async move {
        svc.checkout(&tenant, &id).await
    })
    .await
}

/// `POST /visitors/{id}/checkout`
pub fn routes(app: &SocietyApp<SocietyParams>, service: Arc<VisitorsService>) -> Router<()> {
    Router::new()
        .route("/visitors/{id}/checkout", post(checkout))
        .with_state(ServiceState::new(app.clone(), NAME, service))
}
