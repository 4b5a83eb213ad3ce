//! Access audit logging.

use tracing::info;

/// Records who touched what, from where, on every access.
pub trait RequestAuditLogger: Send + Sync {
    fn record(&self, user: Option<&str>, addr: &str, target: &str);
}

/// Default logger emitting structured tracing events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditLogger;

impl RequestAuditLogger for TracingAuditLogger {
    fn record(&self, user: Option<&str>, addr: &str, target: &str) {
        info!(user = user.unwrap_or("-"), addr, target, "request");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_logger_accepts_anonymous_and_named() {
        let logger = TracingAuditLogger;
        logger.record(None, "127.0.0.1", "/list");
        logger.record(Some("alice"), "127.0.0.1", "/clear");
    }
}
