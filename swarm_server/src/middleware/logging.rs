use std::time::Instant;

use observability_deps::tracing::info;

/// One structured access-log line per request, emitted by the router after dispatch (spec
/// §10.6's access-logging middleware, modeled on `original_source`'s `Logging` middleware's
/// `statusRecorder`-captured fields).
pub fn access(method: &str, path: &str, remote: &str, status: u16, started_at: Instant) {
    info!(
        method,
        path,
        remote,
        status,
        duration_ms = started_at.elapsed().as_millis() as u64,
        "http access"
    );
}
