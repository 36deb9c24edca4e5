//! Forward-chaining evaluation of the rule catalog to a fixpoint

use crate::error::EngineError;
use brickc_rules::{Rule, RuleCatalog, RuleError, SchemaIndex};
use brickc_store::{Provenance, RdfStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Order rules fire in within one pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FiringOrder {
    /// Catalog order, i.e. by rule name
    #[default]
    Catalog,
    Reversed,
    /// Explicit names; every catalog rule must appear exactly once
    Named(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub max_iterations: usize,
    pub firing_order: FiringOrder,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_iterations: 64,
            firing_order: FiringOrder::Catalog,
        }
    }
}

/// Summary of one fixpoint run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixpointReport {
    /// Passes made, the final empty one included
    pub iterations: usize,
    /// Derived triples per rule name
    pub derived: BTreeMap<String, usize>,
    pub asserted_triples: usize,
    pub total_triples: usize,
    /// The last pass derived nothing
    pub converged: bool,
}

impl FixpointReport {
    pub fn derived_total(&self) -> usize {
        self.derived.values().sum()
    }
}

pub struct FixpointEngine<'a> {
    schema: &'a SchemaIndex,
    catalog: &'a RuleCatalog,
    options: EngineOptions,
}

impl<'a> FixpointEngine<'a> {
    pub fn new(schema: &'a SchemaIndex, catalog: &'a RuleCatalog) -> Self {
        Self::with_options(schema, catalog, EngineOptions::default())
    }

    pub fn with_options(schema: &'a SchemaIndex, catalog: &'a RuleCatalog, options: EngineOptions) -> Self {
        Self {
            schema,
            catalog,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Rules in firing order
    fn ordered_rules(&self) -> Result<Vec<&'a dyn Rule>, RuleError> {
        let catalog: &'a RuleCatalog = self.catalog;
        let mut rules: Vec<&'a dyn Rule> = catalog.rules().iter().map(|r| &**r).collect();
        match &self.options.firing_order {
            FiringOrder::Catalog => {}
            FiringOrder::Reversed => rules.reverse(),
            FiringOrder::Named(names) => {
                rules = names
                    .iter()
                    .map(|name| catalog.get(name).ok_or_else(|| RuleError::UnknownRule { name: name.clone() }))
                    .collect::<Result<_, _>>()?;
                if let Some(missing) = catalog.names().into_iter().find(|n| !names.iter().any(|m| m == n)) {
                    return Err(RuleError::UnknownRule {
                        name: format!("{} (absent from firing order)", missing),
                    });
                }
            }
        }
        Ok(rules)
    }

    /// Apply every rule until a whole pass adds nothing.
    ///
    /// Each rule sees the facts added by the rules before it in the same pass.
    pub fn run(&self, store: &mut RdfStore) -> Result<FixpointReport, EngineError> {
        let rules = self.ordered_rules()?;
        let mut report = FixpointReport {
            asserted_triples: store.len(),
            ..FixpointReport::default()
        };
        for rule in &rules {
            report.derived.insert(rule.name().to_string(), 0);
        }

        for iteration in 1..=self.options.max_iterations {
            report.iterations = iteration;
            let mut added = 0;
            for rule in &rules {
                let result = rule.apply(self.schema, store);
                let count = store.insert_batch(result.triples_to_add, Provenance::inferred(rule.name(), iteration));
                if count > 0 {
                    debug!(rule = rule.name(), iteration, count, "rule derived triples");
                    *report.derived.entry(rule.name().to_string()).or_default() += count;
                }
                added += count;
            }
            if added == 0 {
                report.converged = true;
                report.total_triples = store.len();
                info!(
                    iterations = iteration,
                    derived = report.derived_total(),
                    total = report.total_triples,
                    "fixpoint reached"
                );
                return Ok(report);
            }
        }

        let pending = rules.iter().map(|rule| rule.apply(self.schema, store).len()).sum();
        Err(EngineError::IterationLimit {
            limit: self.options.max_iterations,
            pending,
        })
    }

    /// One extra pass over a saturated store; `true` when it adds nothing
    pub fn is_closed(&self, store: &RdfStore) -> Result<bool, EngineError> {
        let rules = self.ordered_rules()?;
        Ok(rules.iter().all(|rule| rule.apply(self.schema, store).is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickc_core::model::{Iri, Term, Triple};
    use brickc_core::vocabulary;

    fn brick(local: &str) -> Iri {
        Iri::new_unchecked(vocabulary::brick(local))
    }

    fn site(local: &str) -> Term {
        Term::iri(&format!("urn:site#{}", local))
    }

    fn schema() -> SchemaIndex {
        let triples = vec![
            Triple::new(brick("feeds"), Iri::new_unchecked(vocabulary::OWL_INVERSE_OF), brick("isFedBy")),
            Triple::new(brick("isFedBy"), Iri::new_unchecked(vocabulary::RDFS_RANGE), brick("Equipment")),
        ];
        SchemaIndex::from_triples(&triples).unwrap()
    }

    fn store() -> RdfStore {
        RdfStore::from_triples(
            vec![Triple::new(site("ahu"), brick("feeds"), site("vav"))],
            Provenance::asserted("site"),
        )
    }

    #[test]
    fn test_run_reaches_fixpoint_with_provenance() {
        let schema = schema();
        let catalog = RuleCatalog::standard();
        let mut store = store();
        let report = FixpointEngine::new(&schema, &catalog).run(&mut store).unwrap();

        assert!(report.converged);
        assert_eq!(report.asserted_triples, 1);
        assert_eq!(report.derived["InverseFromSource"], 1);
        assert_eq!(report.derived["RangeTyping"], 1);
        assert_eq!(report.total_triples, 3);
        assert_eq!(
            store.provenance(&Triple::new(site("vav"), brick("isFedBy"), site("ahu"))),
            Some(&Provenance::inferred("InverseFromSource", 1))
        );
        assert!(FixpointEngine::new(&schema, &catalog).is_closed(&store).unwrap());
    }

    #[test]
    fn test_iteration_limit() {
        let schema = schema();
        let catalog = RuleCatalog::standard();
        let options = EngineOptions {
            max_iterations: 1,
            firing_order: FiringOrder::Catalog,
        };
        // InverseFromSource fires after RangeTyping in reverse order, so a second pass is needed
        let options = EngineOptions {
            firing_order: FiringOrder::Reversed,
            ..options
        };
        let err = FixpointEngine::with_options(&schema, &catalog, options)
            .run(&mut store())
            .unwrap_err();
        match err {
            EngineError::IterationLimit { limit, pending } => {
                assert_eq!(limit, 1);
                assert_eq!(pending, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_named_order_must_cover_catalog() {
        let schema = schema();
        let catalog = RuleCatalog::standard();
        let options = EngineOptions {
            firing_order: FiringOrder::Named(vec!["TagInference".to_string()]),
            ..EngineOptions::default()
        };
        let err = FixpointEngine::with_options(&schema, &catalog, options)
            .run(&mut store())
            .unwrap_err();
        assert!(matches!(err, EngineError::Rule(RuleError::UnknownRule { .. })));
    }
}
