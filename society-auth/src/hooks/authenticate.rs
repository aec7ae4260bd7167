// Authenticate hook.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use society_core::{BeforeHook, HookContext, TenantContext};
use tracing::debug;

use crate::core::{extract_bearer_token, AuthError, Claims, JwtVerifier};

/// What the authenticate hook needs from a transport's params type.
pub trait AuthenticateHookParams: Clone + Send + Sync {
    /// `None` for internal calls.
    fn provider(&self) -> Option<&str>;
    fn headers(&self) -> &HashMap<String, String>;
    fn authenticated(&self) -> bool;
    fn set_claims(&mut self, claims: Claims);
}

#[derive(Clone, Debug, Default)]
pub struct AuthParams<P> {
    pub inner: P,
    pub provider: Option<String>,
    pub headers: HashMap<String, String>,
    pub authenticated: bool,
    pub claims: Option<Claims>,
}

impl<P> AuthParams<P> {
    /// Params for a call made from inside the process (no transport).
    pub fn internal(inner: P) -> Self {
        Self {
            inner,
            provider: None,
            headers: HashMap::new(),
            authenticated: false,
            claims: None,
        }
    }
}

impl<P> AuthenticateHookParams for AuthParams<P>
where
    P: Clone + Send + Sync,
{
    fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    fn authenticated(&self) -> bool {
        self.authenticated
    }

    fn set_claims(&mut self, claims: Claims) {
        self.claims = Some(claims);
        self.authenticated = true;
    }
}

/// Verifies the bearer token of external calls and replaces the call's
/// tenant with the society and actor named in its claims.
///
/// Internal calls (no provider) keep the tenant they were made with.
pub struct AuthenticateHook {
    verifier: Arc<JwtVerifier>,
}

impl AuthenticateHook {
    pub fn new(verifier: Arc<JwtVerifier>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl<P> BeforeHook<P> for AuthenticateHook
where
    P: AuthenticateHookParams + 'static,
{
    async fn run(&self, ctx: &mut HookContext<P>) -> Result<()> {
        if ctx.params.authenticated() {
            return Ok(());
        }

        let provider = ctx.params.provider().unwrap_or("");
        if provider.trim().is_empty() {
            return Ok(());
        }

        let token = extract_bearer_token(ctx.params.headers()).ok_or_else(|| AuthError::MissingToken.into_anyhow())?;
        let claims = self.verifier.verify(&token).map_err(|e| {
            debug!(service = %ctx.service_name, error = %e, "rejected bearer token");
            e.into_anyhow()
        })?;

        ctx.tenant = TenantContext::new(claims.society_id.clone()).with_actor(claims.actor());
        ctx.params.set_claims(claims);
        Ok(())
    }
}
