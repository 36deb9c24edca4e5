//! Scenario verification.
//!
//! Each scenario owns its store; scenarios only share the read-only schema
//! index and catalog, so they run as independent blocking tasks.

use crate::error::EngineError;
use crate::fixpoint::{EngineOptions, FixpointEngine, FixpointReport};
use crate::scenario::Scenario;
use brickc_core::model::Triple;
use brickc_rules::{RuleCatalog, SchemaIndex};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Result of saturating one scenario and checking its expectations
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub report: FixpointReport,
    /// Expected facts that were not derived
    pub missing: Vec<Triple>,
    /// Facts expected absent that were derived anyway
    pub unexpected: Vec<Triple>,
    /// A second run over the saturated store added nothing
    pub idempotent: bool,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.report.converged && self.idempotent && self.missing.is_empty() && self.unexpected.is_empty()
    }
}

#[derive(Clone)]
pub struct ScenarioRunner {
    schema: Arc<SchemaIndex>,
    catalog: Arc<RuleCatalog>,
    options: EngineOptions,
}

impl ScenarioRunner {
    pub fn new(schema: SchemaIndex, catalog: RuleCatalog, options: EngineOptions) -> Self {
        Self {
            schema: Arc::new(schema),
            catalog: Arc::new(catalog),
            options,
        }
    }

    pub fn schema(&self) -> &SchemaIndex {
        &self.schema
    }

    /// Saturate one scenario on the current thread
    pub fn run_one(&self, scenario: &Scenario) -> Result<ScenarioOutcome, EngineError> {
        let engine = FixpointEngine::with_options(&self.schema, &self.catalog, self.options.clone());
        let mut store = scenario.store();
        let report = engine.run(&mut store)?;

        let before = store.len();
        engine.run(&mut store)?;
        let idempotent = store.len() == before && engine.is_closed(&store)?;

        let missing: Vec<Triple> = scenario.present.iter().filter(|t| !store.contains(t)).cloned().collect();
        let unexpected: Vec<Triple> = scenario.absent.iter().filter(|t| store.contains(t)).cloned().collect();
        let outcome = ScenarioOutcome {
            name: scenario.name.clone(),
            report,
            missing,
            unexpected,
            idempotent,
        };
        if outcome.passed() {
            info!(scenario = %outcome.name, iterations = outcome.report.iterations, "scenario passed");
        } else {
            warn!(
                scenario = %outcome.name,
                missing = outcome.missing.len(),
                unexpected = outcome.unexpected.len(),
                "scenario failed"
            );
        }
        Ok(outcome)
    }

    /// Run every scenario in parallel. Outcomes come back in scenario name order.
    pub async fn run_all(&self, scenarios: Vec<Scenario>) -> Result<Vec<ScenarioOutcome>, EngineError> {
        let mut tasks = JoinSet::new();
        for scenario in scenarios {
            let runner = self.clone();
            tasks.spawn_blocking(move || runner.run_one(&scenario));
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| EngineError::Task(e.to_string()))??;
            outcomes.push(outcome);
        }
        outcomes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(outcomes)
    }
}
