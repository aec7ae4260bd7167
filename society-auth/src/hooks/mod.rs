pub mod authenticate;
pub mod authorize;

pub use authenticate::*;
pub use authorize::*;
