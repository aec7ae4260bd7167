//! society-axum: Axum adapter for society services.
//!
//! Builds REST routers from [`SocietyService`](society_core::SocietyService)
//! implementations and runs every request through the app's hook pipeline.

pub mod app;
pub mod params;
pub mod rest;
pub mod state;
mod error;
pub use error::SocietyAxumError;
pub use params::{FromRestParams, Rest, RestParams};
pub use state::ServiceState;

pub use app::{axum, AxumApp};
