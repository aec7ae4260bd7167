use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::ConfigSnapshot;
use crate::service::ServiceMethodKind;
use crate::tenant::TenantContext;

/// Context passed to hooks.
///
/// Before hooks may rewrite `tenant` and `params` (authentication does);
/// the service call sees whatever they leave behind.
#[derive(Debug)]
pub struct HookContext<P> {
    pub tenant: TenantContext,
    pub service_name: String,
    pub method: ServiceMethodKind,
    pub params: P,
    pub config: ConfigSnapshot,
    pub error: Option<anyhow::Error>,
}

impl<P> HookContext<P> {
    pub fn new(
        tenant: TenantContext,
        service_name: impl Into<String>,
        method: ServiceMethodKind,
        params: P,
        config: ConfigSnapshot,
    ) -> Self {
        Self {
            tenant,
            service_name: service_name.into(),
            method,
            params,
            config,
            error: None,
        }
    }
}

#[async_trait]
pub trait BeforeHook<P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<P>) -> Result<()>;
}

#[async_trait]
pub trait AfterHook<P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<P>) -> Result<()>;
}

/// Runs with `ctx.error` set. Failures of the hook itself are ignored.
#[async_trait]
pub trait ErrorHook<P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<P>) -> Result<()>;
}

/// Hooks registered for one service (or globally).
pub struct ServiceHooks<P> {
    pub before_all: Vec<Arc<dyn BeforeHook<P>>>,
    pub before_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn BeforeHook<P>>>>,
    pub after_all: Vec<Arc<dyn AfterHook<P>>>,
    pub after_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn AfterHook<P>>>>,
    pub error_all: Vec<Arc<dyn ErrorHook<P>>>,
}

impl<P> Default for ServiceHooks<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ServiceHooks<P> {
    pub fn new() -> Self {
        Self {
            before_all: Vec::new(),
            before_by_method: HashMap::new(),
            after_all: Vec::new(),
            after_by_method: HashMap::new(),
            error_all: Vec::new(),
        }
    }

    pub fn before_all(&mut self, hook: Arc<dyn BeforeHook<P>>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn before(&mut self, method: ServiceMethodKind, hook: Arc<dyn BeforeHook<P>>) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn after_all(&mut self, hook: Arc<dyn AfterHook<P>>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn after(&mut self, method: ServiceMethodKind, hook: Arc<dyn AfterHook<P>>) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn error_all(&mut self, hook: Arc<dyn ErrorHook<P>>) -> &mut Self {
        self.error_all.push(hook);
        self
    }
}

/// Hooks resolved for one call, in execution order.
pub(crate) struct MethodHooks<P> {
    pub before: Vec<Arc<dyn BeforeHook<P>>>,
    pub after: Vec<Arc<dyn AfterHook<P>>>,
    pub error: Vec<Arc<dyn ErrorHook<P>>>,
}

impl<P> MethodHooks<P> {
    pub(crate) fn empty() -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
            error: Vec::new(),
        }
    }

    /// `_all` hooks first, then the method-specific ones.
    pub(crate) fn extend_from(&mut self, hooks: &ServiceHooks<P>, method: &ServiceMethodKind) {
        self.before.extend(hooks.before_all.iter().cloned());
        if let Some(v) = hooks.before_by_method.get(method) {
            self.before.extend(v.iter().cloned());
        }
        self.after.extend(hooks.after_all.iter().cloned());
        if let Some(v) = hooks.after_by_method.get(method) {
            self.after.extend(v.iter().cloned());
        }
        self.error.extend(hooks.error_all.iter().cloned());
    }
}
