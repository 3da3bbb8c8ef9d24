//! Re-export of the `object_store` crate's capability, matching the teacher's direct
//! `object_store = "0.3.0"` dependency rather than wrapping it in a bespoke trait. Source
//! Importer (`swarm_importer`) and the `enqueue` CLI flow depend on this module, never on
//! `object_store` directly, so the pinned version stays in one place.

pub use object_store::{
    memory::InMemory, path::Path, Error as ObjectStoreError, GetResult, ObjectMeta, ObjectStore,
};

pub type DynObjectStore = dyn ObjectStore;
