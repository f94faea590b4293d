//! Sync cycle engine.
//!
//! One cycle runs fetch → merge → purge → notify → persist for a single
//! listing category.

mod engine;

pub use engine::{SyncEngine, compose_message};
