use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use society_auth::RequireRole;
use society_axum::{rest, Rest, ServiceState, SocietyAxumError};
use society_core::models::SocialPost;
use society_core::{Role, ServiceCapabilities, SocietyApp};

use crate::services::SocietyParams;

use super::PostsService;

pub const NAME: &str = "posts";
pub const LIKE: &str = "like";

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::standard_crud()
}

/// Guards have no feed access at all.
pub fn register_hooks(app: &SocietyApp<SocietyParams>) {
    app.service_hooks(NAME, |h| {
        h.before_all(Arc::new(RequireRole::new(&[Role::Admin, Role::Resident])));
    });
}

type St = ServiceState<PostsService, SocietyParams>;

async fn like(
    State(st): State<St>,
    Path(id): Path<String>,
    Rest(params): Rest<SocietyParams>,
) -> Result<Json<SocialPost>, SocietyAxumError> {
    let svc = Arc::clone(&st.service);
    rest::dispatch(&st.app, &st.name, LIKE, params, move |tenant, _| async move {
        svc.like(&tenant, &id).await
    })
    .await
}

/// `POST /posts/{id}/like`
pub fn routes(app: &SocietyApp<SocietyParams>, service: Arc<PostsService>) -> Router<()> {
    Router::new()
        .route("/posts/{id}/like", post(like))
        .with_state(ServiceState::new(app.clone(), NAME, service))
}
