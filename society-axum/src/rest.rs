use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::MethodRouter;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use society_core::errors::SocietyError;
use society_core::{schema, ServiceMethodKind, SocietyApp, SocietyService, TenantContext};

use crate::params::{FromRestParams, Rest};
use crate::{ServiceState, SocietyAxumError};

pub fn map_json_rejection(rejection: JsonRejection) -> SocietyAxumError {
    SocietyError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.body_text()]}))
        .into()
}

/// Unwrap an optional JSON body extractor, mapping rejections to `400`.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, SocietyAxumError> {
    let Json(value) = body.map_err(map_json_rejection)?;
    Ok(value)
}

pub fn payload_message(service_name: &str) -> String {
    format!("Invalid {service_name} payload")
}

/// Run a custom service method through the hook pipeline and wrap the
/// result as JSON. The tenant is filled in by the authentication hook.
pub async fn dispatch<P, T, F, Fut>(
    app: &SocietyApp<P>,
    service_name: &str,
    method: &'static str,
    params: P,
    call: F,
) -> Result<Json<T>, SocietyAxumError>
where
    P: Clone + Send + Sync + 'static,
    F: FnOnce(TenantContext, P) -> Fut + Send,
    Fut: Future<Output = anyhow::Result<T>> + Send,
    T: Serialize + Send,
{
    let res = app
        .call(
            service_name,
            ServiceMethodKind::Custom(method),
            TenantContext::anonymous(),
            params,
            call,
        )
        .await?;
    Ok(Json(res))
}

async fn find<S, P>(
    State(st): State<ServiceState<S, P>>,
    Rest(params): Rest<P>,
) -> Result<Json<Vec<S::Record>>, SocietyAxumError>
where
    S: SocietyService<P> + 'static,
    P: FromRestParams + Clone + Send + Sync + 'static,
{
    let svc = Arc::clone(&st.service);
    let res = st
        .app
        .call(
            &st.name,
            ServiceMethodKind::Find,
            TenantContext::anonymous(),
            params,
            move |tenant, params| async move { svc.find(&tenant, params).await },
        )
        .await?;
    Ok(Json(res))
}

async fn get<S, P>(
    State(st): State<ServiceState<S, P>>,
    Path(id): Path<String>,
    Rest(params): Rest<P>,
) -> Result<Json<S::Record>, SocietyAxumError>
where
    S: SocietyService<P> + 'static,
    P: FromRestParams + Clone + Send + Sync + 'static,
{
    let svc = Arc::clone(&st.service);
    let res = st
        .app
        .call(
            &st.name,
            ServiceMethodKind::Get,
            TenantContext::anonymous(),
            params,
            move |tenant, params| async move { svc.get(&tenant, &id, params).await },
        )
        .await?;
    Ok(Json(res))
}

async fn create<S, P>(
    State(st): State<ServiceState<S, P>>,
    Rest(params): Rest<P>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<S::Record>, SocietyAxumError>
where
    S: SocietyService<P> + 'static,
    P: FromRestParams + Clone + Send + Sync + 'static,
{
    let data = json_body(body)?;
    let svc = Arc::clone(&st.service);
    let message = payload_message(&st.name);
    let res = st
        .app
        .call(
            &st.name,
            ServiceMethodKind::Create,
            TenantContext::anonymous(),
            params,
            move |tenant, params| async move {
                let data: S::Create = schema::parse(data, &message)?;
                svc.create(&tenant, data, params).await
            },
        )
        .await?;
    Ok(Json(res))
}

async fn patch<S, P>(
    State(st): State<ServiceState<S, P>>,
    Path(id): Path<String>,
    Rest(params): Rest<P>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<S::Record>, SocietyAxumError>
where
    S: SocietyService<P> + 'static,
    P: FromRestParams + Clone + Send + Sync + 'static,
{
    let data = json_body(body)?;
    let svc = Arc::clone(&st.service);
    let message = payload_message(&st.name);
    let res = st
        .app
        .call(
            &st.name,
            ServiceMethodKind::Patch,
            TenantContext::anonymous(),
            params,
            move |tenant, params| async move {
                let data: S::Patch = schema::parse(data, &message)?;
                svc.patch(&tenant, &id, data, params).await
            },
        )
        .await?;
    Ok(Json(res))
}

async fn remove<S, P>(
    State(st): State<ServiceState<S, P>>,
    Path(id): Path<String>,
    Rest(params): Rest<P>,
) -> Result<Json<S::Record>, SocietyAxumError>
where
    S: SocietyService<P> + 'static,
    P: FromRestParams + Clone + Send + Sync + 'static,
{
    let svc = Arc::clone(&st.service);
    let res = st
        .app
        .call(
            &st.name,
            ServiceMethodKind::Remove,
            TenantContext::anonymous(),
            params,
            move |tenant, params| async move { svc.remove(&tenant, &id, params).await },
        )
        .await?;
    Ok(Json(res))
}

/// Standard routes for `service` under `path`, limited to its capabilities:
///
/// - `GET {path}` → find, `POST {path}` → create
/// - `GET {path}/{id}` → get, `PATCH {path}/{id}` → patch, `DELETE {path}/{id}` → remove
pub fn service_router<S, P>(app: SocietyApp<P>, path: &str, service_name: &str, service: Arc<S>) -> Router<()>
where
    S: SocietyService<P> + 'static,
    P: FromRestParams + Clone + Send + Sync + 'static,
{
    use ServiceMethodKind::*;

    let caps = service.capabilities();

    let mut collection: Option<MethodRouter<ServiceState<S, P>>> = None;
    if caps.allows(&Find) {
        collection = Some(MethodRouter::new().get(find::<S, P>));
    }
    if caps.allows(&Create) {
        collection = Some(collection.unwrap_or_else(MethodRouter::new).post(create::<S, P>));
    }

    let mut item: Option<MethodRouter<ServiceState<S, P>>> = None;
    if caps.allows(&Get) {
        item = Some(MethodRouter::new().get(get::<S, P>));
    }
    if caps.allows(&Patch) {
        item = Some(item.unwrap_or_else(MethodRouter::new).patch(patch::<S, P>));
    }
    if caps.allows(&Remove) {
        item = Some(item.unwrap_or_else(MethodRouter::new).delete(remove::<S, P>));
    }

    let mut router = Router::new();
    if let Some(mr) = collection {
        router = router.route(path, mr);
    }
    if let Some(mr) = item {
        router = router.route(&format!("{path}/{{id}}"), mr);
    }
    router.with_state(ServiceState::new(app, service_name, service))
}
