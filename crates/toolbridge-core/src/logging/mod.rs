//! Logging abstractions for runtime-agnostic logging

mod noop;
mod traits;
mod tracing_logger;

pub use noop::NoOpLogger;
pub use traits::{Logger, SharedLogger};
pub use tracing_logger::TracingLogger;
