// Bearer JWT authentication for society services.

pub mod core;
pub mod hooks;
pub mod options;

pub use crate::core::*;
pub use hooks::*;
pub use options::*;
