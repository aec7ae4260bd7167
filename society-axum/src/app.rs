use std::sync::Arc;

use axum::extract::Request;
use axum::handler::Handler;
use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use society_core::errors::SocietyError;
use society_core::{SocietyApp, SocietyService};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use crate::params::FromRestParams;
use crate::rest;
use crate::SocietyAxumError;

const REQUEST_ID: &str = "x-request-id";

pub struct AxumApp<P = ()>
where
    P: Send + Sync + Clone + 'static,
{
    pub app: SocietyApp<P>,
    routes: Router<()>,
}

impl<P> Clone for AxumApp<P>
where
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            routes: self.routes.clone(),
        }
    }
}

async fn not_found() -> SocietyAxumError {
    SocietyError::not_found("Page not found").into()
}

impl<P> AxumApp<P>
where
    P: Send + Sync + Clone + 'static,
{
    pub fn new(app: SocietyApp<P>) -> Self {
        Self {
            app,
            routes: Router::new(),
        }
    }

    /// Merge routes declared with their full paths.
    pub fn use_router(mut self, router: Router<()>) -> Self {
        self.routes = self.routes.merge(router);
        self
    }

    pub fn use_get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        let router = Router::new().route(path, get(handler));
        self.use_router(router)
    }

    /// Mount the standard REST routes of `service` at `path`. The service is
    /// named after the path without its leading slash.
    pub fn use_service<S>(self, path: &str, service: Arc<S>) -> Self
    where
        S: SocietyService<P> + 'static,
        P: FromRestParams,
    {
        let name = path.trim_start_matches('/');
        let router = rest::service_router(self.app.clone(), path, name, service);
        self.use_router(router)
    }

    /// The full router: every mounted route plus tracing and request-id
    /// layers. Responses always carry `x-request-id`; a caller-supplied one
    /// is kept.
    pub fn router(&self) -> Router<()> {
        let header = HeaderName::from_static(REQUEST_ID);
        self.routes
            .clone()
            .fallback(not_found)
            .layer(PropagateRequestIdLayer::new(header.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                let request_id = req
                    .headers()
                    .get(REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                info_span!("http", method = %req.method(), uri = %req.uri(), request_id = %request_id)
            }))
            .layer(SetRequestIdLayer::new(header, MakeRequestUuid))
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

pub fn axum<P>(app: SocietyApp<P>) -> AxumApp<P>
where
    P: Send + Sync + Clone + 'static,
{
    AxumApp::new(app)
}
