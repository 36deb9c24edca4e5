//! Provenance of stored triples

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a triple came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Provenance {
    /// Stated in a definition source or an instance file
    Asserted { source: String },
    /// Derived by a rule during fixpoint evaluation
    Inferred { rule: String, iteration: usize },
}

impl Provenance {
    pub fn asserted(source: impl Into<String>) -> Self {
        Provenance::Asserted { source: source.into() }
    }

    pub fn inferred(rule: impl Into<String>, iteration: usize) -> Self {
        Provenance::Inferred {
            rule: rule.into(),
            iteration,
        }
    }

    pub fn is_inferred(&self) -> bool {
        matches!(self, Provenance::Inferred { .. })
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Asserted { source } => write!(f, "asserted({})", source),
            Provenance::Inferred { rule, iteration } => write!(f, "inferred({}, #{})", rule, iteration),
        }
    }
}
