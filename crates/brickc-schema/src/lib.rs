//! # brickc-schema
//!
//! Definition compilation: loaders, taxonomy builder, consistency
//! validator, extension merger and canonical serializer, tied together by
//! [`BuildPipeline`].

pub mod builder;
pub mod config;
pub mod emit;
pub mod error;
pub mod fold;
pub mod hierarchy;
pub mod ir;
pub mod loader;
pub mod merger;
pub mod nested;
pub mod pipeline;
pub mod serializer;
pub mod symbols;
pub mod taxonomy;
pub mod validator;

pub use builder::{check_acyclic, TaxonomyBuilder};
pub use config::{BuildConfig, ExtensionConfig, OntologyConfig};
pub use emit::taxonomy_triples;
pub use error::{Collision, DanglingReference, ErrorKind, SchemaError};
pub use fold::fold;
pub use ir::DefinitionSet;
pub use loader::{load_source, load_sources, DefinitionLoader, TabularLoader};
pub use merger::{merge_all, ExtensionMerger, MergeReport, OverrideEvent};
pub use nested::{NestedFormat, NestedLoader};
pub use pipeline::{BuildOutcome, BuildPipeline};
pub use serializer::{write_atomic, Artifact, CanonicalSerializer, OutputFormat};
pub use symbols::SymbolTable;
pub use taxonomy::{EntityKind, Taxonomy};
pub use validator::{ConsistencyValidator, ValidationReport, Violation};
