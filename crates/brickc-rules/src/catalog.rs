//! The fixed rule catalog.
//!
//! Every rule is a monotone Horn clause over the instance graph plus the
//! schema index: it only ever adds facts, and whether it fires depends only
//! on facts being present. Any firing order therefore reaches the same
//! least fixpoint.

use crate::index::SchemaIndex;
use crate::traits::{Rule, RuleResult, TriggerScope};
use brickc_core::model::{Iri, Term, Triple};
use brickc_core::vocabulary;
use brickc_schema::validator::MeterBranch;
use brickc_store::RdfStore;
use std::collections::BTreeSet;

fn iri(value: &str) -> Iri {
    Iri::new_unchecked(value)
}

/// `(instance, class)` for every `rdf:type` assertion with an IRI class
fn type_assertions(data: &RdfStore) -> Vec<(&Term, &Iri)> {
    let rdf_type = iri(vocabulary::RDF_TYPE);
    data.find_triples(None, Some(&rdf_type), None)
        .into_iter()
        .filter_map(|stored| stored.triple.object.as_iri().map(|class| (&stored.triple.subject, class)))
        .collect()
}

/// Triples whose object can sit in subject position
fn resource_triples(data: &RdfStore) -> impl Iterator<Item = &Triple> {
    data.iter().map(|stored| &stored.triple).filter(|t| !t.object.is_literal())
}

fn meter_instances<'d>(schema: &SchemaIndex, data: &'d RdfStore) -> BTreeSet<&'d Term> {
    type_assertions(data)
        .into_iter()
        .filter(|(_, class)| schema.is_meter(class))
        .map(|(instance, _)| instance)
        .collect()
}

fn substances_of<'d>(data: &'d RdfStore, instance: &Term) -> Vec<&'d Iri> {
    data.objects(instance, &iri(vocabulary::BRICK_HAS_SUBSTANCE))
        .into_iter()
        .filter_map(Term::as_iri)
        .collect()
}

/// `s p o` and `p owl:inverseOf q` give `o q s`
pub struct InverseFromSource;

impl Rule for InverseFromSource {
    fn name(&self) -> &'static str {
        "InverseFromSource"
    }

    fn description(&self) -> &'static str {
        "Asserts the inverse of a fact whose property declares owl:inverseOf"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::AnySubject
    }

    fn precondition(&self) -> &'static str {
        "$this ?p ?o .\n?p owl:inverseOf ?q .\nFILTER (!isLiteral(?o))"
    }

    fn template(&self) -> &'static str {
        "?o ?q $this ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let mut result = RuleResult::new();
        for t in resource_triples(data) {
            for q in schema.inverses_declared_by(&t.predicate) {
                result.propose(data, Triple::new(t.object.clone(), q.clone(), t.subject.clone()));
            }
        }
        result.finish()
    }
}

/// `s p o` and `q owl:inverseOf p` give `o q s`
pub struct InverseFromTarget;

impl Rule for InverseFromTarget {
    fn name(&self) -> &'static str {
        "InverseFromTarget"
    }

    fn description(&self) -> &'static str {
        "Asserts the inverse of a fact whose property is named as another property's owl:inverseOf"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::AnySubject
    }

    fn precondition(&self) -> &'static str {
        "$this ?p ?o .\n?q owl:inverseOf ?p .\nFILTER (!isLiteral(?o))"
    }

    fn template(&self) -> &'static str {
        "?o ?q $this ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let mut result = RuleResult::new();
        for t in resource_triples(data) {
            for q in schema.inverses_declaring(&t.predicate) {
                result.propose(data, Triple::new(t.object.clone(), q.clone(), t.subject.clone()));
            }
        }
        result.finish()
    }
}

pub struct SymmetricProperty;

impl Rule for SymmetricProperty {
    fn name(&self) -> &'static str {
        "SymmetricProperty"
    }

    fn description(&self) -> &'static str {
        "Mirrors facts using an owl:SymmetricProperty"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::AnySubject
    }

    fn precondition(&self) -> &'static str {
        "$this ?p ?o .\n?p a owl:SymmetricProperty .\nFILTER (!isLiteral(?o))"
    }

    fn template(&self) -> &'static str {
        "?o ?p $this ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let mut result = RuleResult::new();
        for t in resource_triples(data).filter(|t| schema.is_symmetric(&t.predicate)) {
            result.propose(data, Triple::new(t.object.clone(), t.predicate.clone(), t.subject.clone()));
        }
        result.finish()
    }
}

/// Instances carry every tag associated with any superclass of their types
pub struct TagInference;

impl Rule for TagInference {
    fn name(&self) -> &'static str {
        "TagInference"
    }

    fn description(&self) -> &'static str {
        "Attaches the tags associated with every superclass of an instance's types"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::SubjectsOf(iri(vocabulary::RDF_TYPE))
    }

    fn precondition(&self) -> &'static str {
        "$this rdf:type/rdfs:subClassOf* ?class .\n?class brick:hasAssociatedTag ?tag ."
    }

    fn template(&self) -> &'static str {
        "$this brick:hasTag ?tag ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let has_tag = iri(vocabulary::BRICK_HAS_TAG);
        let mut result = RuleResult::new();
        for (instance, class) in type_assertions(data) {
            for tag in schema.tags_of(class) {
                result.propose(data, Triple::new(instance.clone(), has_tag.clone(), tag.clone()));
            }
        }
        result.finish()
    }
}

pub struct RangeTyping;

impl Rule for RangeTyping {
    fn name(&self) -> &'static str {
        "RangeTyping"
    }

    fn description(&self) -> &'static str {
        "Types the objects of a property with the property's declared range"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::AnySubject
    }

    fn precondition(&self) -> &'static str {
        "$this ?p ?o .\n?p rdfs:range ?range .\nFILTER (isIRI(?o))"
    }

    fn template(&self) -> &'static str {
        "?o a ?range ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let mut result = RuleResult::new();
        for t in data.iter().map(|stored| &stored.triple) {
            let Some(object) = t.object.as_iri() else {
                continue;
            };
            for range in schema.ranges_of(&t.predicate) {
                result.propose(data, Triple::typed(object, range));
            }
        }
        result.finish()
    }
}

/// Entity property facts also hold for every entity superproperty
pub struct SubPropertyPropagation;

impl Rule for SubPropertyPropagation {
    fn name(&self) -> &'static str {
        "SubPropertyPropagation"
    }

    fn description(&self) -> &'static str {
        "Restates entity property values under each entity superproperty"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::AnySubject
    }

    fn precondition(&self) -> &'static str {
        "$this ?p ?o .\n?p rdfs:subPropertyOf+ ?super .\n?p a brick:EntityProperty .\n?super a brick:EntityProperty ."
    }

    fn template(&self) -> &'static str {
        "$this ?super ?o ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let mut result = RuleResult::new();
        for t in data.iter().map(|stored| &stored.triple) {
            for parent in schema.entity_superproperties(&t.predicate) {
                result.propose(data, Triple::new(t.subject.clone(), parent.clone(), t.object.clone()));
            }
        }
        result.finish()
    }
}

/// Additive: the deprecated type stays
pub struct DeprecationMigration;

impl Rule for DeprecationMigration {
    fn name(&self) -> &'static str {
        "DeprecationMigration"
    }

    fn description(&self) -> &'static str {
        "Types instances of a deprecated class with its replacement"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::SubjectsOf(iri(vocabulary::RDF_TYPE))
    }

    fn precondition(&self) -> &'static str {
        "$this a ?old .\n?old brick:isReplacedBy ?new .\nFILTER NOT EXISTS { $this a ?new }"
    }

    fn template(&self) -> &'static str {
        "$this a ?new ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let mut result = RuleResult::new();
        for (instance, class) in type_assertions(data) {
            for replacement in schema.replacements_of(class) {
                result.propose(data, Triple::typed(instance.clone(), replacement));
            }
        }
        result.finish()
    }
}

pub struct EquivalentClassForward;

impl Rule for EquivalentClassForward {
    fn name(&self) -> &'static str {
        "EquivalentClassForward"
    }

    fn description(&self) -> &'static str {
        "Types instances of C with every class C is declared equivalent to"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::SubjectsOf(iri(vocabulary::RDF_TYPE))
    }

    fn precondition(&self) -> &'static str {
        "$this a ?class .\n?class owl:equivalentClass ?equivalent ."
    }

    fn template(&self) -> &'static str {
        "$this a ?equivalent ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let mut result = RuleResult::new();
        for (instance, class) in type_assertions(data) {
            for equivalent in schema.equivalents_forward(class) {
                result.propose(data, Triple::typed(instance.clone(), equivalent));
            }
        }
        result.finish()
    }
}

pub struct EquivalentClassBackward;

impl Rule for EquivalentClassBackward {
    fn name(&self) -> &'static str {
        "EquivalentClassBackward"
    }

    fn description(&self) -> &'static str {
        "Types instances of C with every class declared equivalent to C"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::SubjectsOf(iri(vocabulary::RDF_TYPE))
    }

    fn precondition(&self) -> &'static str {
        "$this a ?class .\n?equivalent owl:equivalentClass ?class ."
    }

    fn template(&self) -> &'static str {
        "$this a ?equivalent ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let mut result = RuleResult::new();
        for (instance, class) in type_assertions(data) {
            for equivalent in schema.equivalents_backward(class) {
                result.propose(data, Triple::typed(instance.clone(), equivalent));
            }
        }
        result.finish()
    }
}

/// Meter instances pick up the substances declared on their meter types
pub struct MeterSubstance;

impl Rule for MeterSubstance {
    fn name(&self) -> &'static str {
        "MeterSubstance"
    }

    fn description(&self) -> &'static str {
        "Gives a meter the substances declared on its meter classes"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::TargetClass(iri(vocabulary::BRICK_METER))
    }

    fn precondition(&self) -> &'static str {
        "$this a ?type .\n?type rdfs:subClassOf* ?declaring .\n?declaring rdfs:subClassOf* brick:Meter .\n?declaring brick:hasSubstance ?substance ."
    }

    fn template(&self) -> &'static str {
        "$this brick:hasSubstance ?substance ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let has_substance = iri(vocabulary::BRICK_HAS_SUBSTANCE);
        let mut result = RuleResult::new();
        for (instance, class) in type_assertions(data) {
            for substance in schema.meter_substances(class) {
                result.propose(data, Triple::new(instance.clone(), has_substance.clone(), substance.clone()));
            }
        }
        result.finish()
    }
}

/// A meter with a known substance gets the non-building metertype for it
pub struct MeterType;

impl Rule for MeterType {
    fn name(&self) -> &'static str {
        "MeterType"
    }

    fn description(&self) -> &'static str {
        "Types a meter with the concrete metertype declaring its substance"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::TargetClass(iri(vocabulary::BRICK_METER))
    }

    fn precondition(&self) -> &'static str {
        "$this brick:hasSubstance ?substance .\n?metertype rdfs:subClassOf* brick:Meter .\n?metertype brick:hasSubstance ?substance .\nFILTER NOT EXISTS { ?metertype rdfs:subClassOf* brick:Building_Meter }"
    }

    fn template(&self) -> &'static str {
        "$this a ?metertype ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let mut result = RuleResult::new();
        for meter in meter_instances(schema, data) {
            for substance in substances_of(data, meter) {
                if let Some(metertype) = schema.metertype(MeterBranch::NonBuilding, substance) {
                    result.propose(data, Triple::typed(meter.clone(), metertype));
                }
            }
        }
        result.finish()
    }
}

/// Same as [`MeterType`] on the building branch, for meters of a building
pub struct BuildingMeterType;

impl Rule for BuildingMeterType {
    fn name(&self) -> &'static str {
        "BuildingMeterType"
    }

    fn description(&self) -> &'static str {
        "Types a meter of a building with the building metertype declaring its substance"
    }

    fn scope(&self) -> TriggerScope {
        TriggerScope::TargetClass(iri(vocabulary::BRICK_METER))
    }

    fn precondition(&self) -> &'static str {
        "$this brick:meters ?building .\n?building a/rdfs:subClassOf* brick:Building .\n$this brick:hasSubstance ?substance .\n?metertype rdfs:subClassOf* brick:Building_Meter .\n?metertype brick:hasSubstance ?substance ."
    }

    fn template(&self) -> &'static str {
        "$this a ?metertype ."
    }

    fn apply(&self, schema: &SchemaIndex, data: &RdfStore) -> RuleResult {
        let meters = iri(vocabulary::BRICK_METERS);
        let mut result = RuleResult::new();
        for meter in meter_instances(schema, data) {
            let meters_building = data
                .objects(meter, &meters)
                .into_iter()
                .any(|target| data.types_of(target).into_iter().any(|class| schema.is_building(class)));
            if !meters_building {
                continue;
            }
            for substance in substances_of(data, meter) {
                if let Some(metertype) = schema.metertype(MeterBranch::Building, substance) {
                    result.propose(data, Triple::typed(meter.clone(), metertype));
                }
            }
        }
        result.finish()
    }
}

/// Ordered collection of rules, looked up by name
pub struct RuleCatalog {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Every rule the schema ships with, in name order
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.register(Box::new(InverseFromSource));
        catalog.register(Box::new(InverseFromTarget));
        catalog.register(Box::new(SymmetricProperty));
        catalog.register(Box::new(TagInference));
        catalog.register(Box::new(RangeTyping));
        catalog.register(Box::new(SubPropertyPropagation));
        catalog.register(Box::new(DeprecationMigration));
        catalog.register(Box::new(EquivalentClassForward));
        catalog.register(Box::new(EquivalentClassBackward));
        catalog.register(Box::new(MeterSubstance));
        catalog.register(Box::new(MeterType));
        catalog.register(Box::new(BuildingMeterType));
        catalog
    }

    /// Add a rule, replacing any rule with the same name
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.retain(|r| r.name() != rule.name());
        self.rules.push(rule);
        self.rules.sort_by_key(|r| r.name());
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&dyn Rule> {
        self.rules.iter().find(|r| r.name() == name).map(|r| &**r)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
