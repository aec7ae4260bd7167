use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use society_auth::RequireRole;
use society_axum::{rest, Rest, ServiceState, SocietyAxumError};
use society_core::models::Bill;
use society_core::{Role, ServiceCapabilities, ServiceMethodKind, SocietyApp};

use crate::services::SocietyParams;

use super::BillsService;

pub const NAME: &str = "bills";
pub const PAY: &str = "pay";

/// Bills are immutable once issued apart from payment.
pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Create,
        ServiceMethodKind::Remove,
    ])
}

pub fn register_hooks(app: &SocietyApp<SocietyParams>) {
    app.service_hooks(NAME, |h| {
        h.before_all(Arc::new(RequireRole::new(&[Role::Admin, Role::Resident])));
        h.before(ServiceMethodKind::Create, Arc::new(RequireRole::admin()));
        h.before(ServiceMethodKind::Remove, Arc::new(RequireRole::admin()));
    });
}

type St = ServiceState<BillsService, SocietyParams>;

async fn pay(
    State(st): State<St>,
    Path(id): Path<String>,
    Rest(params): Rest<SocietyParams>,
) -> Result<Json<Bill>, SocietyAxumError> {
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, PAY, params, move |tenant, _| async move {
        svc.pay(&tenant, &id).await
    })
    .await
}

/// `POST /bills/{id}/pay`
pub fn routes(app: &SocietyApp<SocietyParams>, service: Arc<BillsService>) -> Router<()> {
    Router::new()
        .route("/bills/{id}/pay", post(pay))
        .with_state(ServiceState::new(app.clone(), NAME, service))
}
