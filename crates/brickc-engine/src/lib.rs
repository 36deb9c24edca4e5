//! # brickc engine
//!
//! Reference evaluator for the rule catalog. Runs rules to a fixpoint over an
//! in-memory instance store and verifies instance-graph scenarios against
//! the compiled schema.

pub mod error;
pub mod fixpoint;
pub mod runner;
pub mod scenario;

pub use error::EngineError;
pub use fixpoint::{EngineOptions, FiringOrder, FixpointEngine, FixpointReport};
pub use runner::{ScenarioOutcome, ScenarioRunner};
pub use scenario::{load_scenarios, Scenario};
