use std::sync::Arc;

use anyhow::Result;
use society_auth::{AuthError, JwtOptions, JwtVerifier};
use society_core::{SocietyApp, SocietyConfig};
use tracing::info;

use crate::services::SocietyParams;

/// The hook pipeline with its configuration applied and authentication
/// installed.
pub fn society_app(config: SocietyConfig) -> Result<SocietyApp<SocietyParams>> {
    let app: SocietyApp<SocietyParams> = SocietyApp::new();
    app.configure(|c| *c = config);

    let options = JwtOptions::from_config(&app.config_snapshot()).map_err(AuthError::into_anyhow)?;
    info!(issuer = %options.issuer, leeway_secs = options.leeway_secs, "jwt verification configured");
    let verifier = Arc::new(JwtVerifier::new(options).map_err(AuthError::into_anyhow)?);

    crate::hooks::global_hooks(&app, verifier);
    Ok(app)
}
