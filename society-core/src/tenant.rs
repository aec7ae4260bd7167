//! Multi-tenant context. A tenant is one society.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SocietyError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocietyId(pub String);

impl SocietyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SocietyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which portal a caller is acting through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The society itself (management committee portal).
    Admin,
    Resident,
    Guard,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Resident => "resident",
            Role::Guard => "guard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated principal behind a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

/// Context carried with every service call.
///
/// Before authentication `actor` is `None` and `society_id` is empty; the
/// authenticate hook fills both from the bearer token.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub society_id: SocietyId,
    pub actor: Option<Actor>,
}

impl TenantContext {
    pub fn new<S: Into<String>>(society: S) -> Self {
        Self {
            society_id: SocietyId(society.into()),
            actor: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::new("")
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn society(&self) -> &str {
        self.society_id.as_str()
    }

    pub fn actor(&self) -> anyhow::Result<&Actor> {
        self.actor
            .as_ref()
            .ok_or_else(|| SocietyError::not_authenticated("Not authenticated").into_anyhow())
    }

    /// The actor, provided its role is one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> anyhow::Result<&Actor> {
        let actor = self.actor()?;
        if roles.contains(&actor.role) {
            Ok(actor)
        } else {
            Err(SocietyError::forbidden(format!(
                "Role '{}' may not perform this action",
                actor.role
            ))
            .into_anyhow())
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.actor, Some(Actor { role: Role::Admin, .. }))
    }
}
