pub mod scheduled_bills_schema;
pub mod scheduled_bills_service;
pub mod scheduled_bills_shared;

pub use scheduled_bills_service::ScheduledBillsService;
