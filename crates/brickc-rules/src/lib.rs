//! # brickc rules
//!
//! The forward-chaining rule catalog shipped alongside the schema, the
//! compiled schema view the rules read, and rendering of the catalog as a
//! SHACL-AF rule artifact for external reasoners.

pub mod artifact;
pub mod catalog;
pub mod index;
pub mod traits;

pub use artifact::{catalog_triples, construct_query, render_catalog, render_tag_inference, tag_inference_triples};
pub use catalog::RuleCatalog;
pub use index::SchemaIndex;
pub use traits::{Rule, RuleError, RuleResult, TriggerScope};
