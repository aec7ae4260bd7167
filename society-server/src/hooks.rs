use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use society_auth::{AuthenticateHook, JwtVerifier};
use society_core::hooks::{AfterHook, BeforeHook, ErrorHook, HookContext};
use society_core::{SocietyApp, SocietyError};
use tracing::{debug, error, warn};

use crate::services::SocietyParams;

fn actor_label(ctx: &HookContext<SocietyParams>) -> String {
    match &ctx.tenant.actor {
        Some(a) => format!("{}:{}", a.role, a.id),
        None => "anonymous".to_string(),
    }
}

pub struct LogBefore;

#[async_trait]
impl BeforeHook<SocietyParams> for LogBefore {
    async fn run(&self, ctx: &mut HookContext<SocietyParams>) -> Result<()> {
        debug!(
            service = %ctx.service_name,
            method = ctx.method.as_str(),
            society = %ctx.tenant.society_id,
            actor = %actor_label(ctx),
            path = %ctx.params.inner.path,
            "-> call"
        );
        Ok(())
    }
}

pub struct LogAfter;

#[async_trait]
impl AfterHook<SocietyParams> for LogAfter {
    async fn run(&self, ctx: &mut HookContext<SocietyParams>) -> Result<()> {
        debug!(service = %ctx.service_name, method = ctx.method.as_str(), "<- ok");
        Ok(())
    }
}

/// Client errors at `warn`, everything else at `error`.
pub struct LogError;

#[async_trait]
impl ErrorHook<SocietyParams> for LogError {
    async fn run(&self, ctx: &mut HookContext<SocietyParams>) -> Result<()> {
        let Some(err) = &ctx.error else {
            return Ok(());
        };
        let code = SocietyError::from_anyhow(err).map(|e| e.code()).unwrap_or(500);
        if code < 500 {
            warn!(
                service = %ctx.service_name,
                method = ctx.method.as_str(),
                society = %ctx.tenant.society_id,
                code,
                error = %err,
                "<- rejected"
            );
        } else {
            error!(
                service = %ctx.service_name,
                method = ctx.method.as_str(),
                society = %ctx.tenant.society_id,
                error = ?err,
                "<- failed"
            );
        }
        Ok(())
    }
}

/// Authentication first, so every later hook sees the real tenant.
pub fn global_hooks(app: &SocietyApp<SocietyParams>, verifier: Arc<JwtVerifier>) {
    app.hooks(|h| {
        h.before_all(Arc::new(AuthenticateHook::new(verifier)));
        h.before_all(Arc::new(LogBefore));
        h.after_all(Arc::new(LogAfter));
        h.error_all(Arc::new(LogError));
    });
}
