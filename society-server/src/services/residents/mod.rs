pub mod residents_schema;
pub mod residents_service;
pub mod residents_shared;

pub use residents_service::ResidentsService;
