//! Catalog persistence.
//!
//! The catalog lives in one flat JSON document:
//!
//! ```text
//! {
//!   "libraryItems":  [ ... ],
//!   "wishListItems": [ "dune", ... ],
//!   "users":         [ ... ]
//! }
//! ```
//!
//! `Snapshot` is the in-memory form with the merge/purge/prune invariants;
//! `CatalogStore` owns the file, the atomic write discipline, and the single
//! lock that serializes every read-modify-persist sequence.

mod snapshot;
mod store;

pub use snapshot::{MergeResult, Snapshot, User};
pub use store::CatalogStore;
