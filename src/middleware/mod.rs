//! Middleware applied around the application handler.

pub mod logging;
pub mod session;

pub use logging::LoggingMiddleware;
pub use session::{SessionConfig, SessionMiddleware};
