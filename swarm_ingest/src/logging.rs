use tracing_subscriber::{fmt, EnvFilter};

/// Bootstraps the process-wide `tracing` subscriber: environment-driven level (`RUST_LOG`,
/// defaulting to `info`), matching the teacher's `trogging`/`logfmt` bootstrap role where this
/// workspace instead reaches directly for `tracing-subscriber` (SPEC_FULL §10.2).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}
