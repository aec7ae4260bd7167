use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::Value;
use society_auth::RequireRole;
use society_axum::{rest, Rest, ServiceState, SocietyAxumError};
use society_core::models::{ApartmentStructure, FlatDetails, Society};
use society_core::structure::{BlockLayout, ReconcileReport};
use society_core::{schema, ServiceCapabilities, ServiceMethodKind, SocietyApp};

use crate::services::SocietyParams;

use super::SocietiesService;

pub const NAME: &str = "societies";
pub const UPSERT_BLOCK: &str = "upsert_block";
pub const REMOVE_BLOCK: &str = "remove_block";
pub const RECONCILE: &str = "reconcile";
pub const STRUCTURE: &str = "structure";
pub const LOCATE: &str = "locate";

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Create,
        ServiceMethodKind::Patch,
    ])
}

pub fn register_hooks(app: &SocietyApp<SocietyParams>) {
    app.service_hooks(NAME, |h| {
        let admin = Arc::new(RequireRole::admin());
        h.before(ServiceMethodKind::Create, admin.clone());
        h.before(ServiceMethodKind::Patch, admin.clone());
        h.before(ServiceMethodKind::Custom(UPSERT_BLOCK), admin.clone());
        h.before(ServiceMethodKind::Custom(REMOVE_BLOCK), admin.clone());
        h.before(ServiceMethodKind::Custom(RECONCILE), admin);
    });
}

type St = ServiceState<SocietiesService, SocietyParams>;

async fn upsert_block(
    State(st): State<St>,
    Path(id): Path<String>,
    Rest(params): Rest<SocietyParams>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Society>, SocietyAxumError> {
    let data = rest::json_body(body)?;
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, UPSERT_BLOCK, params, move |tenant, _| async move {
        let layout: BlockLayout = schema::parse(data, "Invalid block layout")?;
        svc.upsert_block(&tenant, &id, layout).await
    })
    .await
}

async fn remove_block(
    State(st): State<St>,
    Path((id, block)): Path<(String, String)>,
    Rest(params): Rest<SocietyParams>,
) -> Result<Json<Society>, SocietyAxumError> {
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, REMOVE_BLOCK, params, move |tenant, _| async move {
        svc.remove_block(&tenant, &id, &block).await
    })
    .await
}

async fn reconcile(
    State(st): State<St>,
    Path(id): Path<String>,
    Rest(params): Rest<SocietyParams>,
) -> Result<Json<ReconcileReport>, SocietyAxumError> {
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, RECONCILE, params, move |tenant, _| async move {
        svc.reconcile(&tenant, &id).await
    })
    .await
}

async fn structure(
    State(st): State<St>,
    Path(id): Path<String>,
    Rest(params): Rest<SocietyParams>,
) -> Result<Json<ApartmentStructure>, SocietyAxumError> {
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, STRUCTURE, params, move |tenant, _| async move {
        svc.structure(&tenant, &id).await
    })
    .await
}

async fn locate(
    State(st): State<St>,
    Path((id, resident_id)): Path<(String, String)>,
    Rest(params): Rest<SocietyParams>,
) -> Result<Json<Vec<FlatDetails>>, SocietyAxumError> {
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, LOCATE, params, move |tenant, _| async move {
        svc.locate(&tenant, &id, &resident_id).await
    })
    .await
}

/// Apartment tree maintenance under `/societies/{id}`.
pub fn routes(app: &SocietyApp<SocietyParams>, service: Arc<SocietiesService>) -> Router<()> {
    Router::new()
        .route("/societies/{id}/blocks", post(upsert_block))
        .route("/societies/{id}/blocks/{block}", delete(remove_block))
        .route("/societies/{id}/reconcile", post(reconcile))
        .route("/societies/{id}/structure", get(structure))
        .route("/societies/{id}/placements/{resident_id}", get(locate))
        .with_state(ServiceState::new(app.clone(), NAME, service))
}
