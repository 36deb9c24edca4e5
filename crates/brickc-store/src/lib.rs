//! # brickc store
//!
//! In-memory triple store used for schema graphs and instance graphs.
//! Insertion is idempotent: asserting a triple twice keeps one copy and the
//! provenance of the first assertion.

pub mod provenance;
pub mod store;

pub use provenance::Provenance;
pub use store::{RdfStore, StoredTriple};
