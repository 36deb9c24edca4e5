//! Schema compilation errors

use crate::validator::ValidationReport;
use brickc_core::model::Iri;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Error kinds shared by hard failures and validator violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    MalformedDefinition,
    UnresolvedReference,
    CyclicHierarchy,
    DuplicateAssociation,
    ExtensionCollision,
    InconsistentInverse,
    SubstanceMappingConflict,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedDefinition => "MalformedDefinition",
            ErrorKind::UnresolvedReference => "UnresolvedReference",
            ErrorKind::CyclicHierarchy => "CyclicHierarchy",
            ErrorKind::DuplicateAssociation => "DuplicateAssociation",
            ErrorKind::ExtensionCollision => "ExtensionCollision",
            ErrorKind::InconsistentInverse => "InconsistentInverse",
            ErrorKind::SubstanceMappingConflict => "SubstanceMappingConflict",
        };
        write!(f, "{}", name)
    }
}

/// A reference that named nothing known to the build
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DanglingReference {
    pub entity: Iri,
    pub field: String,
    pub reference: Iri,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} -> {}", self.entity, self.field, self.reference)
    }
}

/// One attribute on which an extension disagrees with the graph it extends
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Collision {
    pub entity: Iri,
    pub attribute: String,
    pub base_value: String,
    pub extension_value: String,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: base [{}] vs extension [{}]",
            self.entity, self.attribute, self.base_value, self.extension_value
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Malformed definition in {origin} (record {record}), field '{field}': {reason}")]
    MalformedDefinition {
        origin: String,
        record: usize,
        field: String,
        reason: String,
    },

    #[error("{} unresolved reference(s), first: {}", .references.len(), first_of(.references))]
    UnresolvedReference { references: Vec<DanglingReference> },

    #[error("Cyclic {hierarchy} hierarchy: {}", render_cycle(.cycle))]
    CyclicHierarchy { hierarchy: String, cycle: Vec<Iri> },

    #[error("Extension '{extension}' collides with the base graph on {} attribute(s): {}", .collisions.len(), first_of(.collisions))]
    ExtensionCollision {
        extension: String,
        collisions: Vec<Collision>,
    },

    #[error("Validation failed with {} violation(s)", .report.violations.len())]
    ValidationFailed { report: ValidationReport },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error on {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl SchemaError {
    /// Error kind for failures that correspond to one
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SchemaError::MalformedDefinition { .. } => Some(ErrorKind::MalformedDefinition),
            SchemaError::UnresolvedReference { .. } => Some(ErrorKind::UnresolvedReference),
            SchemaError::CyclicHierarchy { .. } => Some(ErrorKind::CyclicHierarchy),
            SchemaError::ExtensionCollision { .. } => Some(ErrorKind::ExtensionCollision),
            SchemaError::ValidationFailed { report } => report.violations.first().map(|v| v.kind),
            SchemaError::Config { .. } | SchemaError::Io { .. } => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        SchemaError::Io {
            path: path.into(),
            error,
        }
    }
}

fn first_of<T: fmt::Display>(items: &[T]) -> String {
    items.first().map(|i| i.to_string()).unwrap_or_default()
}

fn render_cycle(cycle: &[Iri]) -> String {
    cycle.iter().map(|i| i.local_name()).collect::<Vec<_>>().join(" -> ")
}
