pub mod societies_schema;
pub mod societies_service;
pub mod societies_shared;

pub use societies_service::SocietiesService;
