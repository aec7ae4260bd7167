use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::SocietyError;
use crate::tenant::TenantContext;

/// Standard service methods plus named custom ones (`approve`, `like`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Patch,
    Remove,
    Custom(&'static str),
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Patch => "patch",
            ServiceMethodKind::Remove => "remove",
            ServiceMethodKind::Custom(name) => name,
        }
    }
}

/// Which methods a service exposes to transports. The REST adapter mounts
/// only these routes.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Patch, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: &ServiceMethodKind) -> bool {
        self.allowed_methods.contains(method)
    }
}

fn not_implemented(method: &str) -> anyhow::Error {
    SocietyError::not_implemented(format!("Method not implemented: {method}")).into_anyhow()
}

/// A typed CRUD service.
///
/// - `find`   → list records visible to the caller
/// - `get`    → one record by id
/// - `create` → create from a `Create` payload
/// - `patch`  → partial update from a `Patch` payload
/// - `remove` → delete (or soft delete) one record
///
/// Every method defaults to `NotImplemented`, so services override only what
/// they support and declare it in [`capabilities`](Self::capabilities).
#[async_trait]
pub trait SocietyService<P = ()>: Send + Sync
where
    P: Send + 'static,
{
    type Record: Serialize + Send + 'static;
    type Create: DeserializeOwned + Send + 'static;
    type Patch: DeserializeOwned + Send + 'static;

    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    async fn find(&self, _ctx: &TenantContext, _params: P) -> Result<Vec<Self::Record>> {
        Err(not_implemented("find"))
    }

    async fn get(&self, _ctx: &TenantContext, _id: &str, _params: P) -> Result<Self::Record> {
        Err(not_implemented("get"))
    }

    async fn create(
        &self,
        _ctx: &TenantContext,
        _data: Self::Create,
        _params: P,
    ) -> Result<Self::Record> {
        Err(not_implemented("create"))
    }

    async fn patch(
        &self,
        _ctx: &TenantContext,
        _id: &str,
        _data: Self::Patch,
        _params: P,
    ) -> Result<Self::Record> {
        Err(not_implemented("patch"))
    }

    async fn remove(&self, _ctx: &TenantContext, _id: &str, _params: P) -> Result<Self::Record> {
        Err(not_implemented("remove"))
    }
}
