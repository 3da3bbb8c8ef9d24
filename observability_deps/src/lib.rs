//! A crate of re-exported dependencies used for observability (logging and tracing).
//!
//! Crates within the workspace should depend on `tracing` via this crate rather than pulling in
//! `tracing` directly, to keep versions unified and so that the macros are available without
//! every `Cargo.toml` repeating the feature flags.

pub use tracing;
