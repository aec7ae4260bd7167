use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

use crate::config::{ConfigSnapshot, SocietyConfig};
use crate::errors::SocietyError;
use crate::hooks::{HookContext, MethodHooks, ServiceHooks};
use crate::service::ServiceMethodKind;
use crate::tenant::TenantContext;

struct SocietyAppInner<P> {
    global_hooks: RwLock<ServiceHooks<P>>,
    service_hooks: RwLock<HashMap<String, ServiceHooks<P>>>,
    config: RwLock<SocietyConfig>,
}

/// Application container: config plus the hook pipeline every service call
/// runs through. Transport-agnostic; cheap to clone.
pub struct SocietyApp<P> {
    inner: Arc<SocietyAppInner<P>>,
}

impl<P> Clone for SocietyApp<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> Default for SocietyApp<P>
where
    P: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SocietyApp<P>
where
    P: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SocietyAppInner {
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(SocietyConfig::new()),
            }),
        }
    }

    /// Hooks that run for every service.
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks<P>),
    {
        let mut g = self.inner.global_hooks.write();
        f(&mut g);
    }

    /// Hooks for one named service; they run after the global ones.
    pub fn service_hooks<F>(&self, service_name: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks<P>),
    {
        let mut map = self.inner.service_hooks.write();
        let hooks = map.entry(service_name.to_string()).or_default();
        f(hooks);
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(|v| v.to_string())
    }

    pub fn configure<F>(&self, f: F)
    where
        F: FnOnce(&mut SocietyConfig),
    {
        f(&mut self.inner.config.write());
    }

    pub fn config_snapshot(&self) -> ConfigSnapshot {
        self.inner.config.read().snapshot()
    }

    fn collect_hooks(&self, service_name: &str, method: &ServiceMethodKind) -> MethodHooks<P> {
        let mut out = MethodHooks::empty();
        out.extend_from(&self.inner.global_hooks.read(), method);
        if let Some(h) = self.inner.service_hooks.read().get(service_name) {
            out.extend_from(h, method);
        }
        out
    }

    /// Run `call` through the pipeline: before hooks → call → after hooks,
    /// with error hooks on any failure.
    ///
    /// `call` receives the tenant and params as the before hooks left them.
    pub async fn call<T, F, Fut>(
        &self,
        service_name: &str,
        method: ServiceMethodKind,
        tenant: TenantContext,
        params: P,
        call: F,
    ) -> Result<T>
    where
        F: FnOnce(TenantContext, P) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let hooks = self.collect_hooks(service_name, &method);
        let mut ctx = HookContext::new(tenant, service_name, method, params, self.config_snapshot());

        let res: Result<T> = async {
            for h in &hooks.before {
                h.run(&mut ctx).await?;
            }

            let out = call(ctx.tenant.clone(), ctx.params.clone()).await?;

            for h in &hooks.after {
                h.run(&mut ctx).await?;
            }
            Ok(out)
        }
        .await;

        match res {
            Ok(out) => Ok(out),
            Err(err) => {
                ctx.error = Some(err);
                for h in &hooks.error {
                    let _ = h.run(&mut ctx).await;
                }
                Err(ctx.error.take().unwrap_or_else(|| {
                    SocietyError::general_error("Call failed and the error was discarded by a hook")
                        .into_anyhow()
                }))
            }
        }
    }
}
