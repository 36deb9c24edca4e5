//! Rule traits and interfaces

use crate::index::SchemaIndex;
use brickc_core::model::{Iri, Triple};
use brickc_store::RdfStore;
use serde::{Deserialize, Serialize};

/// Facts a rule wants added, deduplicated and in canonical order once finished
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub triples_to_add: Vec<Triple>,
}

impl RuleResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `triple` unless the data already holds it
    pub fn propose(&mut self, data: &RdfStore, triple: Triple) {
        if !data.contains(&triple) {
            self.triples_to_add.push(triple);
        }
    }

    pub fn finish(mut self) -> Self {
        self.triples_to_add.sort();
        self.triples_to_add.dedup();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.triples_to_add.is_empty()
    }

    pub fn len(&self) -> usize {
        self.triples_to_add.len()
    }
}

/// Focus nodes a rule is evaluated for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerScope {
    /// Instances of a class, subclasses included
    TargetClass(Iri),
    SubjectsOf(Iri),
    ObjectsOf(Iri),
    /// Every subject of the data graph
    AnySubject,
}

/// One derivation rule: a precondition pattern and the facts it constructs
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn scope(&self) -> TriggerScope;

    /// SPARQL graph pattern; `$this` is the focus node
    fn precondition(&self) -> &'static str;

    /// SPARQL construct template
    fn template(&self) -> &'static str;

    /// Evaluate once over `data`. Never removes anything.
    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult;
}

/// Failures while compiling the schema view the rules run against
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Inconsistent inverse declarations for {property}: {}", render(.partners))]
    InconsistentInverse { property: Iri, partners: Vec<Iri> },

    #[error("Substance {substance} maps to both {first} and {second}")]
    SubstanceMappingConflict { substance: Iri, first: Iri, second: Iri },

    #[error("Unknown rule: {name}")]
    UnknownRule { name: String },
}

fn render(items: &[Iri]) -> String {
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}
