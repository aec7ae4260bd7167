pub mod visitors_schema;
pub mod visitors_service;
pub mod visitors_shared;

pub use visitors_service::VisitorsService;
