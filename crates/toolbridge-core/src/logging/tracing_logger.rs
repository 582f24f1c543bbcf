//! Logger that forwards to `tracing`

use super::traits::Logger;

/// A logger that emits `tracing` events under the `toolbridge` target
///
/// Output format and filtering are left to whichever subscriber the binary
/// installs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "toolbridge", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "toolbridge", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "toolbridge", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "toolbridge", "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_logger_without_subscriber() {
        // No subscriber installed: events are dropped without panicking
        let logger = TracingLogger::new();
        logger.debug("debug message");
        logger.info("info message");
        logger.warn("warn message");
        logger.error("error message");
    }
}
