use std::sync::Arc;

use society_core::SocietyApp;

/// Router state for one service: the app (for the hook pipeline) and the
/// service itself.
pub struct ServiceState<S, P> {
    pub app: SocietyApp<P>,
    pub service: Arc<S>,
    pub name: Arc<str>,
}

impl<S, P> Clone for ServiceState<S, P> {
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            service: Arc::clone(&self.service),
            name: Arc::clone(&self.name),
        }
    }
}

impl<S, P> ServiceState<S, P> {
    pub fn new(app: SocietyApp<P>, name: &str, service: Arc<S>) -> Self {
        Self {
            app,
            service,
            name: Arc::from(name),
        }
    }
}
