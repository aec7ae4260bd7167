// Role gate.

use anyhow::Result;
use async_trait::async_trait;
use society_core::{BeforeHook, HookContext, Role};

/// Rejects callers whose role is not listed: `401` without an actor, `403`
/// with the wrong role.
pub struct RequireRole {
    roles: Vec<Role>,
}

impl RequireRole {
    pub fn new(roles: &[Role]) -> Self {
        Self { roles: roles.to_vec() }
    }

    pub fn admin() -> Self {
        Self::new(&[Role::Admin])
    }
}

#[async_trait]
impl<P> BeforeHook<P> for RequireRole
where
    P: Send + Sync + 'static,
{
    async fn run(&self, ctx: &mut HookContext<P>) -> Result<()> {
        ctx.tenant.require_role(&self.roles)?;
        Ok(())
    }
}
