pub mod app;
pub mod background;
pub mod config;
pub mod hooks;
pub mod services;

use std::sync::Arc;

use society_axum::{axum, AxumApp};
use society_core::SocietyConfig;

pub use background::BillingScheduler;
pub use services::{SocietyParams, SocietyServices, SocietyState};

pub struct SocietyServer {
    pub ax: AxumApp<SocietyParams>,
    pub services: SocietyServices,
    pub scheduler: BillingScheduler,
}

/// Build from defaults and `SOCIETY__*` environment overrides.
pub fn build() -> anyhow::Result<SocietyServer> {
    build_with(config::load())
}

pub fn build_with(config: SocietyConfig) -> anyhow::Result<SocietyServer> {
    let app = app::society_app(config)?;
    let state = Arc::new(SocietyState::default());
    let services = services::configure(&app, Arc::clone(&state));
    let scheduler = BillingScheduler::new(app.clone(), state, Arc::clone(&services.scheduled_bills));

    let ax = services
        .mount(axum(app))
        .use_get("/health", || async { "ok" });

    Ok(SocietyServer {
        ax,
        services,
        scheduler,
    })
}
