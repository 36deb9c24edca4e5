//! Consistency validator.
//!
//! Runs a fixed battery of checks over a taxonomy and reports every
//! violation it finds, ordered by check and then by entity.

use crate::error::{ErrorKind, SchemaError};
use crate::hierarchy;
use crate::taxonomy::{AssociationKind, Taxonomy};
use brickc_core::model::Iri;
use brickc_core::vocabulary;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// One failed check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub entity: Iri,
    pub rule: String,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub conforms: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Violations of one kind
    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    pub fn into_result(self) -> Result<(), SchemaError> {
        if self.conforms {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed { report: self })
        }
    }

    /// Human readable listing
    pub fn to_simple_string(&self) -> String {
        let mut output = format!(
            "Validation Report: {}\n",
            if self.conforms { "CONFORMS" } else { "DOES NOT CONFORM" }
        );
        for (i, v) in self.violations.iter().enumerate() {
            output.push_str(&format!("Violation {}: [{}] {}\n", i + 1, v.kind, v.message));
            output.push_str(&format!("  Entity: {}\n", v.entity));
            output.push_str(&format!("  Check: {}\n", v.rule));
        }
        output
    }
}

type Check = fn(&Taxonomy) -> Vec<Violation>;

/// The checks, in reporting order
const CHECKS: &[(&str, Check)] = &[
    ("class_hierarchy_acyclic", check_class_hierarchy),
    ("property_hierarchy_acyclic", check_property_hierarchy),
    ("concept_hierarchy_acyclic", check_concept_hierarchy),
    ("inverse_consistency", check_inverses),
    ("unique_associations", duplicate_associations),
    ("substance_metertype_unique", check_substance_mapping),
    ("deprecation_chain_terminates", check_deprecation_chains),
];

pub struct ConsistencyValidator;

impl ConsistencyValidator {
    /// Names of the checks that `validate` runs
    pub fn check_names() -> Vec<&'static str> {
        CHECKS.iter().map(|(name, _)| *name).collect()
    }

    pub fn validate(taxonomy: &Taxonomy) -> ValidationReport {
        let mut violations = Vec::new();
        for (_, check) in CHECKS {
            let mut found = check(taxonomy);
            found.sort_by(|a, b| a.entity.cmp(&b.entity).then_with(|| a.message.cmp(&b.message)));
            violations.extend(found);
        }

        if violations.is_empty() {
            info!(taxonomy = %taxonomy.name, "taxonomy conforms");
        } else {
            warn!(taxonomy = %taxonomy.name, violations = violations.len(), "taxonomy does not conform");
        }

        ValidationReport {
            conforms: violations.is_empty(),
            violations,
        }
    }
}

fn violation(entity: &Iri, rule: &str, kind: ErrorKind, message: String) -> Violation {
    Violation {
        entity: entity.clone(),
        rule: rule.to_string(),
        kind,
        message,
    }
}

fn render(items: &[Iri]) -> String {
    items.iter().map(|i| i.local_name()).collect::<Vec<_>>().join(" -> ")
}

fn cycle_violations(edges: &hierarchy::Edges, rule: &str, what: &str) -> Vec<Violation> {
    hierarchy::find_cycles(edges)
        .into_iter()
        .filter_map(|cycle| {
            let head = cycle.first()?.clone();
            Some(violation(
                &head,
                rule,
                ErrorKind::CyclicHierarchy,
                format!("{} hierarchy contains a cycle: {}", what, render(&cycle)),
            ))
        })
        .collect()
}

fn check_class_hierarchy(taxonomy: &Taxonomy) -> Vec<Violation> {
    cycle_violations(&taxonomy.class_hierarchy(), "class_hierarchy_acyclic", "class")
}

fn check_property_hierarchy(taxonomy: &Taxonomy) -> Vec<Violation> {
    cycle_violations(&taxonomy.property_hierarchy(), "property_hierarchy_acyclic", "property")
}

fn check_concept_hierarchy(taxonomy: &Taxonomy) -> Vec<Violation> {
    cycle_violations(&taxonomy.concept_hierarchy(), "concept_hierarchy_acyclic", "concept")
}

/// If A declares inverse B, B's declared inverse is A or unset
fn check_inverses(taxonomy: &Taxonomy) -> Vec<Violation> {
    const RULE: &str = "inverse_consistency";
    let mut out = Vec::new();

    for (id, property) in &taxonomy.properties {
        let Some(inverse) = &property.inverse else {
            continue;
        };

        if property.symmetric && inverse != id {
            out.push(violation(
                id,
                RULE,
                ErrorKind::InconsistentInverse,
                format!(
                    "{} is symmetric but declares a different inverse {}",
                    id.local_name(),
                    inverse.local_name()
                ),
            ));
        }

        if let Some(other) = taxonomy.properties.get(inverse) {
            if let Some(back) = &other.inverse {
                if back != id {
                    out.push(violation(
                        id,
                        RULE,
                        ErrorKind::InconsistentInverse,
                        format!(
                            "{} declares inverse {}, whose inverse is {}",
                            id.local_name(),
                            inverse.local_name(),
                            back.local_name()
                        ),
                    ));
                }
            }
        }
    }
    out
}

/// The same class-to-tag (or substance, quantity) link stated twice by one source
pub fn duplicate_associations(taxonomy: &Taxonomy) -> Vec<Violation> {
    let mut counts: BTreeMap<(AssociationKind, &Iri, &Iri, &str), usize> = BTreeMap::new();
    for a in &taxonomy.associations {
        *counts.entry((a.kind, &a.class, &a.target, a.origin.source.as_str())).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|((kind, class, target, source), n)| {
            violation(
                class,
                "unique_associations",
                ErrorKind::DuplicateAssociation,
                format!(
                    "{} association {} -> {} stated {} times in {}",
                    kind,
                    class.local_name(),
                    target.local_name(),
                    n,
                    source
                ),
            )
        })
        .collect()
}

/// Meter branch a class belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MeterBranch {
    NonBuilding,
    Building,
}

/// substance -> branch -> metertypes declaring it directly
pub fn substance_metertypes(taxonomy: &Taxonomy) -> BTreeMap<Iri, BTreeMap<MeterBranch, BTreeSet<Iri>>> {
    let meter = Iri::new_unchecked(vocabulary::BRICK_METER);
    let building_meter = Iri::new_unchecked(vocabulary::BRICK_BUILDING_METER);
    let meters = taxonomy.subclasses_of(&meter);
    let building_meters = taxonomy.subclasses_of(&building_meter);

    let mut out: BTreeMap<Iri, BTreeMap<MeterBranch, BTreeSet<Iri>>> = BTreeMap::new();
    for a in taxonomy.associations.iter().filter(|a| a.kind == AssociationKind::Substance) {
        if !meters.contains(&a.class) {
            continue;
        }
        let branch = if building_meters.contains(&a.class) {
            MeterBranch::Building
        } else {
            MeterBranch::NonBuilding
        };
        out.entry(a.target.clone())
            .or_default()
            .entry(branch)
            .or_default()
            .insert(a.class.clone());
    }
    out
}

fn check_substance_mapping(taxonomy: &Taxonomy) -> Vec<Violation> {
    let mut out = Vec::new();
    for (substance, branches) in substance_metertypes(taxonomy) {
        for (branch, classes) in branches {
            if classes.len() > 1 {
                let names: Vec<Iri> = classes.into_iter().collect();
                out.push(violation(
                    &substance,
                    "substance_metertype_unique",
                    ErrorKind::SubstanceMappingConflict,
                    format!(
                        "substance {} maps to {} {} metertypes: {}",
                        substance.local_name(),
                        names.len(),
                        match branch {
                            MeterBranch::Building => "building",
                            MeterBranch::NonBuilding => "non-building",
                        },
                        names.iter().map(|n| n.local_name()).collect::<Vec<_>>().join(", ")
                    ),
                ));
            }
        }
    }
    out
}

/// Following isReplacedBy from any deprecated class must end at a class that is not deprecated
fn check_deprecation_chains(taxonomy: &Taxonomy) -> Vec<Violation> {
    const RULE: &str = "deprecation_chain_terminates";
    let edges = taxonomy.replacement_edges();
    let mut out = cycle_violations(&edges, RULE, "deprecation");

    for (id, node) in &taxonomy.classes {
        if let Some(dep) = &node.deprecation {
            if &dep.replaced_by == id {
                // self-replacement is already reported as a cycle
                continue;
            }
            if !taxonomy.classes.contains_key(&dep.replaced_by) && taxonomy.kind_of(&dep.replaced_by).is_some() {
                out.push(violation(
                    id,
                    RULE,
                    ErrorKind::UnresolvedReference,
                    format!("{} is replaced by {}, which is not a class", id.local_name(), dep.replaced_by.local_name()),
                ));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Origin, PropertyKind};
    use crate::taxonomy::{Association, ClassNode, Deprecation, PropertyNode};

    fn brick(local: &str) -> Iri {
        Iri::new_unchecked(vocabulary::brick(local))
    }

    fn add_class(t: &mut Taxonomy, local: &str, parents: &[&str]) {
        t.classes.insert(
            brick(local),
            ClassNode {
                id: brick(local),
                label: None,
                parents: parents.iter().map(|p| brick(p)).collect(),
                equivalent: BTreeSet::new(),
                disjoint: BTreeSet::new(),
                definition: None,
                see_also: BTreeSet::new(),
                constraints: BTreeMap::new(),
                deprecation: None,
                origin: Origin::new("test", 1),
            },
        );
    }

    fn add_property(t: &mut Taxonomy, local: &str, inverse: Option<&str>, symmetric: bool) {
        t.properties.insert(
            brick(local),
            PropertyNode {
                id: brick(local),
                label: None,
                kind: PropertyKind::Relationship,
                domain: BTreeSet::new(),
                range: None,
                inverse: inverse.map(brick),
                symmetric,
                parents: BTreeSet::new(),
                property_of: BTreeSet::new(),
                definition: None,
                origin: Origin::new("test", 1),
            },
        );
    }

    fn substance(t: &mut Taxonomy, class: &str, substance: &str) {
        t.associations.push(Association {
            kind: AssociationKind::Substance,
            class: brick(class),
            target: brick(substance),
            origin: Origin::new("test", 1),
        });
    }

    #[test]
    fn test_clean_taxonomy_conforms() {
        let mut t = Taxonomy::new("t");
        add_class(&mut t, "Meter", &[]);
        add_class(&mut t, "Water_Meter", &["Meter"]);
        add_property(&mut t, "feeds", Some("isFedBy"), false);
        add_property(&mut t, "isFedBy", Some("feeds"), false);
        let report = ConsistencyValidator::validate(&t);
        assert!(report.conforms, "{}", report.to_simple_string());
    }

    #[test]
    fn test_all_violations_are_batched() {
        let mut t = Taxonomy::new("t");
        add_class(&mut t, "A", &["B"]);
        add_class(&mut t, "B", &["A"]);
        add_property(&mut t, "feeds", Some("isFedBy"), false);
        add_property(&mut t, "isFedBy", Some("hasPart"), false);
        add_property(&mut t, "hasPart", None, false);
        add_property(&mut t, "adjacentTo", Some("feeds"), true);

        let report = ConsistencyValidator::validate(&t);
        assert!(!report.conforms);
        assert_eq!(report.of_kind(ErrorKind::CyclicHierarchy).count(), 1);
        // feeds, and adjacentTo twice
        assert_eq!(report.of_kind(ErrorKind::InconsistentInverse).count(), 3);
        // checks keep their order
        assert_eq!(report.violations[0].kind, ErrorKind::CyclicHierarchy);
        assert!(SchemaError::ValidationFailed { report }.kind() == Some(ErrorKind::CyclicHierarchy));
    }

    #[test]
    fn test_symmetric_property_may_be_its_own_inverse() {
        let mut t = Taxonomy::new("t");
        add_property(&mut t, "adjacentTo", Some("adjacentTo"), true);
        assert!(ConsistencyValidator::validate(&t).conforms);
    }

    #[test]
    fn test_duplicate_association_within_one_source() {
        let mut t = Taxonomy::new("t");
        add_class(&mut t, "Meter", &[]);
        let tag = Iri::new_unchecked(vocabulary::tag("Meter"));
        for source in ["a.csv", "a.csv", "b.yaml"] {
            t.associations.push(Association {
                kind: AssociationKind::Tag,
                class: brick("Meter"),
                target: tag.clone(),
                origin: Origin::new(source, 1),
            });
        }
        let report = ConsistencyValidator::validate(&t);
        assert_eq!(report.of_kind(ErrorKind::DuplicateAssociation).count(), 1);
    }

    #[test]
    fn test_substance_mapping_per_branch() {
        let mut t = Taxonomy::new("t");
        add_class(&mut t, "Meter", &[]);
        add_class(&mut t, "Building_Meter", &["Meter"]);
        add_class(&mut t, "Water_Meter", &["Meter"]);
        add_class(&mut t, "Building_Water_Meter", &["Water_Meter", "Building_Meter"]);
        substance(&mut t, "Water_Meter", "Water");
        substance(&mut t, "Building_Water_Meter", "Water");
        assert!(ConsistencyValidator::validate(&t).conforms);

        let mapping = substance_metertypes(&t);
        let water = &mapping[&brick("Water")];
        assert!(water[&MeterBranch::Building].contains(&brick("Building_Water_Meter")));
        assert!(water[&MeterBranch::NonBuilding].contains(&brick("Water_Meter")));

        add_class(&mut t, "Domestic_Water_Meter", &["Meter"]);
        substance(&mut t, "Domestic_Water_Meter", "Water");
        let report = ConsistencyValidator::validate(&t);
        assert_eq!(report.of_kind(ErrorKind::SubstanceMappingConflict).count(), 1);
    }

    #[test]
    fn test_deprecation_chain_cycle() {
        let mut t = Taxonomy::new("t");
        add_class(&mut t, "Old", &[]);
        add_class(&mut t, "Older", &[]);
        for (from, to) in [("Old", "Older"), ("Older", "Old")] {
            if let Some(node) = t.classes.get_mut(&brick(from)) {
                node.deprecation = Some(Deprecation {
                    replaced_by: brick(to),
                    version: "1.0".to_string(),
                    message: None,
                    mitigation_rule: None,
                });
            }
        }
        let report = ConsistencyValidator::validate(&t);
        assert_eq!(report.of_kind(ErrorKind::CyclicHierarchy).count(), 1);
        assert_eq!(report.violations[0].rule, "deprecation_chain_terminates");
    }
}
