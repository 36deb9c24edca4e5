//! Rule artifact: the catalog as SHACL-AF node shapes.
//!
//! One `bsh:<Name>` node shape per rule carrying a single `sh:SPARQLRule`.
//! Rule nodes are labelled blank nodes so the output stays byte-stable.
//!
//! The tag inference artifact is separate: one `sh:TripleRule` per tagged
//! class that types an entity with the class when its `brick:hasTag` set is
//! exactly the class's inherited tag set.

use crate::catalog::RuleCatalog;
use crate::index::SchemaIndex;
use crate::traits::{Rule, TriggerScope};
use brickc_core::model::{Iri, Term, Triple};
use brickc_core::{vocabulary, PrefixMap};
use brickc_schema::serializer::{CanonicalSerializer, OutputFormat};
use std::collections::BTreeSet;

/// Prefixes every construct query declares
const QUERY_PREFIXES: &[(&str, &str)] = &[
    ("brick", vocabulary::BRICK),
    ("owl", vocabulary::OWL),
    ("rdf", vocabulary::RDF),
    ("rdfs", vocabulary::RDFS),
];

const ANY_SUBJECT_SELECT: &str = "SELECT ?this WHERE { ?this ?p ?o . }";

fn iri(value: &str) -> Iri {
    Iri::new_unchecked(value)
}

/// Full SPARQL CONSTRUCT text for a rule
pub fn construct_query(rule: &dyn Rule) -> String {
    let mut query = String::new();
    for (prefix, ns) in QUERY_PREFIXES {
        query.push_str(&format!("PREFIX {}: <{}>\n", prefix, ns));
    }
    query.push_str(&format!(
        "CONSTRUCT {{\n{}\n}}\nWHERE {{\n{}\n}}",
        rule.template(),
        rule.precondition()
    ));
    query
}

fn rule_triples(rule: &dyn Rule) -> Vec<Triple> {
    let name = rule.name();
    let shape = Term::Iri(iri(&vocabulary::bsh(name)));
    let node = Term::Blank(format!("{}Rule", name));
    let mut out = vec![
        Triple::typed(shape.clone(), &iri(vocabulary::SH_NODE_SHAPE)),
        Triple::new(shape.clone(), iri(vocabulary::RDFS_COMMENT), Term::string(rule.description())),
        Triple::new(shape.clone(), iri(vocabulary::SH_RULE), node.clone()),
        Triple::typed(node.clone(), &iri(vocabulary::SH_SPARQL_RULE)),
        Triple::new(node, iri(vocabulary::SH_CONSTRUCT), Term::string(construct_query(rule))),
    ];

    match rule.scope() {
        TriggerScope::TargetClass(class) => {
            out.push(Triple::new(shape, iri(vocabulary::SH_TARGET_CLASS), class));
        }
        TriggerScope::SubjectsOf(property) => {
            out.push(Triple::new(shape, iri(vocabulary::SH_TARGET_SUBJECTS_OF), property));
        }
        TriggerScope::ObjectsOf(property) => {
            out.push(Triple::new(shape, iri(vocabulary::SH_TARGET_OBJECTS_OF), property));
        }
        TriggerScope::AnySubject => {
            let target = Term::Blank(format!("{}Target", name));
            out.push(Triple::new(shape, iri(vocabulary::SH_TARGET), target.clone()));
            out.push(Triple::typed(target.clone(), &iri(vocabulary::SH_SPARQL_TARGET)));
            out.push(Triple::new(target, iri(vocabulary::SH_SELECT), Term::string(ANY_SUBJECT_SELECT)));
        }
    }
    out
}

/// Every triple of the rule artifact, sorted
pub fn catalog_triples(catalog: &RuleCatalog) -> Vec<Triple> {
    let mut triples: Vec<Triple> = catalog.rules().iter().flat_map(|rule| rule_triples(&**rule)).collect();
    triples.sort();
    triples.dedup();
    triples
}

pub fn render_catalog(catalog: &RuleCatalog, prefixes: &PrefixMap, format: OutputFormat) -> String {
    CanonicalSerializer::new(prefixes).serialize(&catalog_triples(catalog), format)
}

/// `_:<name>` TripleRule typing `$this` with `object`
fn triple_rule(out: &mut Vec<Triple>, node: &Term, object: Term) {
    out.push(Triple::typed(node.clone(), &iri(vocabulary::SH_TRIPLE_RULE)));
    out.push(Triple::new(node.clone(), iri(vocabulary::SH_SUBJECT), Term::iri(vocabulary::SH_THIS)));
    out.push(Triple::new(node.clone(), iri(vocabulary::SH_PREDICATE), Term::iri(vocabulary::RDF_TYPE)));
    out.push(Triple::new(node.clone(), iri(vocabulary::SH_OBJECT), object));
}

/// `bsh:has_<Tag>_condition`: at least one `brick:hasTag` value equal to the tag
fn tag_condition(out: &mut Vec<Triple>, tag: &Iri) -> Term {
    let local = tag.local_name();
    let condition = Term::Iri(iri(&vocabulary::bsh(&format!("has_{}_condition", local))));
    let property = Term::Blank(format!("has_{}_tag", local));
    let value = Term::Blank(format!("has_{}_value", local));
    out.push(Triple::typed(condition.clone(), &iri(vocabulary::SH_NODE_SHAPE)));
    out.push(Triple::new(condition.clone(), iri(vocabulary::SH_PROPERTY), property.clone()));
    out.push(Triple::new(property.clone(), iri(vocabulary::SH_PATH), Term::iri(vocabulary::BRICK_HAS_TAG)));
    out.push(Triple::new(property.clone(), iri(vocabulary::SH_QUALIFIED_VALUE_SHAPE), value.clone()));
    out.push(Triple::new(property, iri(vocabulary::SH_QUALIFIED_MIN_COUNT), Term::integer(1)));
    out.push(Triple::new(value, iri(vocabulary::SH_HAS_VALUE), tag.clone()));
    condition
}

/// `bsh:has_exactly_<n>_tags_condition` plus the rule that types entities with it
fn tag_count_condition(out: &mut Vec<Triple>, count: usize) -> Term {
    let condition = Term::Iri(iri(&vocabulary::bsh(&format!("has_exactly_{}_tags_condition", count))));
    let property = Term::Blank(format!("has_exactly_{}_tags", count));
    out.push(Triple::typed(condition.clone(), &iri(vocabulary::OWL_CLASS)));
    out.push(Triple::typed(condition.clone(), &iri(vocabulary::SH_NODE_SHAPE)));
    out.push(Triple::new(condition.clone(), iri(vocabulary::SH_PROPERTY), property.clone()));
    out.push(Triple::new(property.clone(), iri(vocabulary::SH_PATH), Term::iri(vocabulary::BRICK_HAS_TAG)));
    out.push(Triple::new(property.clone(), iri(vocabulary::SH_MIN_COUNT), Term::integer(count as u64)));
    out.push(Triple::new(property, iri(vocabulary::SH_MAX_COUNT), Term::integer(count as u64)));

    let rule = Term::Iri(iri(&vocabulary::bsh(&format!("has_exactly_{}_tags_rule", count))));
    let body = Term::Blank(format!("has_{}_tags_body", count));
    out.push(Triple::typed(rule.clone(), &iri(vocabulary::SH_NODE_SHAPE)));
    out.push(Triple::new(rule.clone(), iri(vocabulary::SH_TARGET_SUBJECTS_OF), Term::iri(vocabulary::BRICK_HAS_TAG)));
    out.push(Triple::new(rule, iri(vocabulary::SH_RULE), body.clone()));
    triple_rule(out, &body, condition.clone());
    out.push(Triple::new(body, iri(vocabulary::SH_CONDITION), condition.clone()));
    condition
}

fn class_tag_triples(out: &mut Vec<Triple>, class: &Iri, tags: &BTreeSet<Iri>) -> Term {
    let local = class.local_name();
    let shape = Term::Iri(iri(&vocabulary::bsh(&format!("{}_TagShape", local))));
    let rule = Term::Blank(format!("{}TagInferenceRule", local));
    out.push(Triple::typed(shape.clone(), &iri(vocabulary::SH_NODE_SHAPE)));
    out.push(Triple::new(shape.clone(), iri(vocabulary::SH_RULE), rule.clone()));
    triple_rule(out, &rule, Term::Iri(class.clone()));
    for tag in tags {
        let condition = tag_condition(out, tag);
        out.push(Triple::new(rule.clone(), iri(vocabulary::SH_CONDITION), condition));
    }
    shape
}

/// Every triple of the tag inference artifact, sorted.
///
/// Shared conditions (per tag, per tag count) are emitted once per use and
/// collapse in the final dedup.
pub fn tag_inference_triples(schema: &SchemaIndex) -> Vec<Triple> {
    let mut triples = Vec::new();
    for (class, tags) in schema.tagged_classes() {
        let shape = class_tag_triples(&mut triples, class, tags);
        let count = tag_count_condition(&mut triples, tags.len());
        triples.push(Triple::new(shape, iri(vocabulary::SH_TARGET_CLASS), count));
    }
    triples.sort();
    triples.dedup();
    triples
}

pub fn render_tag_inference(schema: &SchemaIndex, prefixes: &PrefixMap, format: OutputFormat) -> String {
    CanonicalSerializer::new(prefixes).serialize(&tag_inference_triples(schema), format)
}
