pub mod bills_schema;
pub mod bills_service;
pub mod bills_shared;

pub use bills_service::BillsService;
