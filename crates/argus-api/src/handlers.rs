//! Request handlers.

pub mod analyze;
pub mod camera;
pub mod health;

pub use analyze::analyze;
pub use camera::{ptz, snapshot};
pub use health::health;
