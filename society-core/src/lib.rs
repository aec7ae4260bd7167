//! society-core: transport-agnostic core of the society management backend.
//!
//! Services implement [`SocietyService`]; every call goes through the
//! [`SocietyApp`] hook pipeline. Domain rules for the apartment tree, the
//! social feed and billing live next to the models they act on.

pub mod app;
pub mod billing;
pub mod config;
pub mod errors;
pub mod feed;
pub mod hooks;
pub mod models;
pub mod schema;
pub mod service;
pub mod store;
pub mod structure;
pub mod tenant;

pub use app::SocietyApp;
pub use config::{ConfigSnapshot, SocietyConfig};
pub use errors::{ErrorKind, SocietyError, SocietyResult};
pub use hooks::{AfterHook, BeforeHook, ErrorHook, HookContext, ServiceHooks};
pub use service::{ServiceCapabilities, ServiceMethodKind, SocietyService};
pub use store::{MemoryStore, Transaction};
pub use tenant::{Actor, Role, SocietyId, TenantContext};
