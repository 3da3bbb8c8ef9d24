//! HTTP surface (spec §6), its middleware (access logging, authorization, memory-limit gate),
//! and the pull-worker loop, built directly on `hyper` the way `ioxd_common`'s `ServerType`
//! wires its own HTTP surface.

mod handlers;
mod middleware;
mod router;
mod state;
mod worker;

pub use router::{serve, spawn_pull_workers};
pub use state::AppState;
