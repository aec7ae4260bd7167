pub mod blocks_schema;
pub mod blocks_service;
pub mod blocks_shared;

pub use blocks_service::BlocksService;
