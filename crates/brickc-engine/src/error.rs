//! Evaluation errors

use brickc_core::CoreError;
use brickc_rules::RuleError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No fixpoint after {limit} iterations ({pending} triples still pending)")]
    IterationLimit { limit: usize, pending: usize },

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("Invalid scenario {}: {message}", .path.display())]
    Scenario { path: PathBuf, message: String },

    #[error("Bad term '{token}' in scenario {scenario}: {source}")]
    Term {
        scenario: String,
        token: String,
        #[source]
        source: CoreError,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scenario task failed: {0}")]
    Task(String),
}
