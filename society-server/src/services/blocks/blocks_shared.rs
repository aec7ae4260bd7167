use std::sync::Arc;

use society_auth::RequireRole;
use society_core::{Role, ServiceCapabilities, ServiceMethodKind, SocietyApp};

use crate::services::SocietyParams;

pub const NAME: &str = "blocks";

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Create,
        ServiceMethodKind::Remove,
    ])
}

pub fn register_hooks(app: &SocietyApp<SocietyParams>) {
    app.service_hooks(NAME, |h| {
        h.before_all(Arc::new(RequireRole::new(&[Role::Resident])));
    });
}
