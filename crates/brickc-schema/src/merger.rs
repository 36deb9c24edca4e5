//! Extension merger.
//!
//! Folds an extension taxonomy into the graph it extends. New entities are
//! added, an unset label or definition is filled in, and associations
//! already present are ignored. Parents, domains, broader concepts and
//! deprecation define an entity: an extension that states them differently,
//! including on a base entity that has none, fails with every collision
//! listed. An override-permitting extension wins instead and the override
//! is recorded.

use crate::builder::TaxonomyBuilder;
use crate::error::{Collision, SchemaError};
use crate::ir::{DefinitionSet, RangeDef};
use crate::taxonomy::{Deprecation, EntityKind, Taxonomy};
use crate::validator::{self, ConsistencyValidator, ValidationReport};
use brickc_core::model::Iri;
use brickc_core::PrefixMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// An attribute replaced under an override-permitting extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEvent {
    pub extension: String,
    pub entity: Iri,
    pub attribute: String,
    pub previous: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub extension: String,
    pub added_entities: Vec<Iri>,
    pub augmented: Vec<Iri>,
    pub added_associations: usize,
    pub idempotent_associations: usize,
    pub overrides: Vec<OverrideEvent>,
}

/// Collects collisions (or overrides) while attributes are reconciled
struct Reconciler<'a> {
    extension: &'a str,
    permit_override: bool,
    collisions: Vec<Collision>,
    overrides: Vec<OverrideEvent>,
    augmented: BTreeSet<Iri>,
}

impl<'a> Reconciler<'a> {
    fn new(extension: &'a str, permit_override: bool) -> Self {
        Self {
            extension,
            permit_override,
            collisions: Vec::new(),
            overrides: Vec::new(),
            augmented: BTreeSet::new(),
        }
    }

    /// Record a disagreement. Returns `true` if the extension value should be taken.
    fn conflict(&mut self, entity: &Iri, attribute: &str, base_value: String, extension_value: String) -> bool {
        if self.permit_override {
            warn!(extension = self.extension, entity = %entity, attribute, "extension overrides base attribute");
            self.overrides.push(OverrideEvent {
                extension: self.extension.to_string(),
                entity: entity.clone(),
                attribute: attribute.to_string(),
                previous: base_value,
                replacement: extension_value,
            });
            true
        } else {
            self.collisions.push(Collision {
                entity: entity.clone(),
                attribute: attribute.to_string(),
                base_value,
                extension_value,
            });
            false
        }
    }

    /// Unset on the extension side leaves the base alone; unset on the base side is filled in
    fn optional<T: Clone + PartialEq>(
        &mut self,
        entity: &Iri,
        attribute: &str,
        base: &mut Option<T>,
        extension: &Option<T>,
        show: fn(&T) -> String,
    ) {
        let Some(value) = extension else {
            return;
        };
        match base.as_mut() {
            None => {
                *base = Some(value.clone());
                self.augmented.insert(entity.clone());
            }
            Some(current) if current == value => {}
            Some(current) => {
                if self.conflict(entity, attribute, show(current), show(value)) {
                    *current = value.clone();
                }
            }
        }
    }

    /// Like `optional`, but stating a value the base leaves unset is also a conflict
    fn defining_optional<T: Clone + PartialEq>(
        &mut self,
        entity: &Iri,
        attribute: &str,
        base: &mut Option<T>,
        extension: &Option<T>,
        show: fn(&T) -> String,
    ) {
        let Some(value) = extension else {
            return;
        };
        if base.as_ref() == Some(value) {
            return;
        }
        let previous = base.as_ref().map(show).unwrap_or_default();
        if self.conflict(entity, attribute, previous, show(value)) {
            *base = Some(value.clone());
        }
    }

    /// Sets that define the entity (parents, domain, broader): an empty extension set means unstated
    fn defining_set(&mut self, entity: &Iri, attribute: &str, base: &mut BTreeSet<Iri>, extension: &BTreeSet<Iri>) {
        if extension.is_empty() || base == extension {
            return;
        }
        if self.conflict(entity, attribute, render_set(base), render_set(extension)) {
            *base = extension.clone();
        }
    }

    /// New constraint paths are added; a path the base constrains differently conflicts
    fn constraints(
        &mut self,
        entity: &Iri,
        base: &mut BTreeMap<Iri, BTreeSet<Iri>>,
        extension: &BTreeMap<Iri, BTreeSet<Iri>>,
    ) {
        for (path, classes) in extension {
            match base.get(path) {
                Some(current) if current == classes => {}
                Some(current) => {
                    let attribute = format!("constraints.{}", path.local_name());
                    if self.conflict(entity, &attribute, render_set(current), render_set(classes)) {
                        base.insert(path.clone(), classes.clone());
                    }
                }
                None => {
                    base.insert(path.clone(), classes.clone());
                    self.augmented.insert(entity.clone());
                }
            }
        }
    }

    /// Sets that only accumulate (equivalent, disjoint, see-also)
    fn additive_set<T: Clone + Ord>(&mut self, entity: &Iri, base: &mut BTreeSet<T>, extension: &BTreeSet<T>) {
        let before = base.len();
        base.extend(extension.iter().cloned());
        if base.len() > before {
            self.augmented.insert(entity.clone());
        }
    }

    fn scalar<T: PartialEq + ToString>(&mut self, entity: &Iri, attribute: &str, base: &mut T, extension: T) {
        if *base != extension && self.conflict(entity, attribute, base.to_string(), extension.to_string()) {
            *base = extension;
        }
    }
}

fn render_set(items: &BTreeSet<Iri>) -> String {
    items.iter().map(|i| i.local_name()).collect::<Vec<_>>().join(", ")
}

fn show_string(value: &String) -> String {
    value.clone()
}

fn show_iri(value: &Iri) -> String {
    value.to_string()
}

fn entity_kinds(taxonomy: &Taxonomy) -> Vec<(&Iri, EntityKind)> {
    taxonomy
        .classes
        .keys()
        .map(|id| (id, EntityKind::Class))
        .chain(taxonomy.properties.keys().map(|id| (id, EntityKind::Property)))
        .chain(taxonomy.tags.keys().map(|id| (id, EntityKind::Tag)))
        .chain(taxonomy.concepts.values().map(|c| (&c.id, EntityKind::from(c.kind))))
        .collect()
}

fn remove_entity(taxonomy: &mut Taxonomy, id: &Iri) {
    taxonomy.classes.remove(id);
    taxonomy.properties.remove(id);
    taxonomy.tags.remove(id);
    taxonomy.concepts.remove(id);
}

pub struct ExtensionMerger {
    permit_override: bool,
}

impl ExtensionMerger {
    pub fn new(permit_override: bool) -> Self {
        Self { permit_override }
    }

    /// Merge `extension` into a copy of `base`. On failure `base` is untouched.
    pub fn merge(&self, base: &Taxonomy, extension: &Taxonomy) -> Result<(Taxonomy, MergeReport), SchemaError> {
        let mut merged = base.clone();
        let mut r = Reconciler::new(&extension.name, self.permit_override);
        let mut added_entities = Vec::new();

        for (id, kind) in entity_kinds(extension) {
            if let Some(existing) = merged.kind_of(id) {
                if existing != kind && r.conflict(id, "kind", existing.to_string(), kind.to_string()) {
                    remove_entity(&mut merged, id);
                }
            }
        }

        for (id, node) in &extension.classes {
            let other_kind = merged.contains(id);
            match merged.classes.get_mut(id) {
                Some(current) => {
                    r.optional(id, "label", &mut current.label, &node.label, show_string);
                    r.defining_set(id, "parents", &mut current.parents, &node.parents);
                    r.additive_set(id, &mut current.equivalent, &node.equivalent);
                    r.additive_set(id, &mut current.disjoint, &node.disjoint);
                    r.optional(id, "definition", &mut current.definition, &node.definition, show_string);
                    r.additive_set(id, &mut current.see_also, &node.see_also);
                    r.constraints(id, &mut current.constraints, &node.constraints);
                    r.defining_optional(id, "deprecation", &mut current.deprecation, &node.deprecation, |d: &Deprecation| {
                        format!("replaced by {} in {}", d.replaced_by, d.version)
                    });
                }
                None if other_kind => {}
                None => {
                    merged.classes.insert(id.clone(), node.clone());
                    added_entities.push(id.clone());
                }
            }
        }

        for (id, node) in &extension.properties {
            let other_kind = merged.contains(id);
            match merged.properties.get_mut(id) {
                Some(current) => {
                    r.optional(id, "label", &mut current.label, &node.label, show_string);
                    r.scalar(id, "property_kind", &mut current.kind, node.kind);
                    r.defining_set(id, "domain", &mut current.domain, &node.domain);
                    r.optional(id, "range", &mut current.range, &node.range, |range: &RangeDef| range.target.to_string());
                    r.optional(id, "inverse", &mut current.inverse, &node.inverse, show_iri);
                    if node.symmetric {
                        r.scalar(id, "symmetric", &mut current.symmetric, true);
                    }
                    r.defining_set(id, "parents", &mut current.parents, &node.parents);
                    r.additive_set(id, &mut current.property_of, &node.property_of);
                    r.optional(id, "definition", &mut current.definition, &node.definition, show_string);
                }
                None if other_kind => {}
                None => {
                    merged.properties.insert(id.clone(), node.clone());
                    added_entities.push(id.clone());
                }
            }
        }

        for (id, node) in &extension.tags {
            let other_kind = merged.contains(id);
            match merged.tags.get_mut(id) {
                Some(current) => {
                    r.optional(id, "label", &mut current.label, &node.label, show_string);
                    r.optional(id, "definition", &mut current.definition, &node.definition, show_string);
                }
                None if other_kind => {}
                None => {
                    merged.tags.insert(id.clone(), node.clone());
                    added_entities.push(id.clone());
                }
            }
        }

        for (id, node) in &extension.concepts {
            let other_kind = merged.contains(id);
            match merged.concepts.get_mut(id) {
                Some(current) => {
                    r.optional(id, "label", &mut current.label, &node.label, show_string);
                    r.defining_set(id, "broader", &mut current.broader, &node.broader);
                    r.additive_set(id, &mut current.related, &node.related);
                    r.optional(id, "definition", &mut current.definition, &node.definition, show_string);
                }
                None if other_kind => {}
                None => {
                    merged.concepts.insert(id.clone(), node.clone());
                    added_entities.push(id.clone());
                }
            }
        }

        if !r.collisions.is_empty() {
            let mut collisions = r.collisions;
            collisions.sort();
            warn!(extension = %extension.name, collisions = collisions.len(), "extension collides with base");
            return Err(SchemaError::ExtensionCollision {
                extension: extension.name.clone(),
                collisions,
            });
        }

        let mut added_associations = 0;
        let mut idempotent_associations = 0;
        for association in &extension.associations {
            if merged.associate(association.clone()) {
                added_associations += 1;
            } else {
                debug!(class = %association.class, target = %association.target, "association already present");
                idempotent_associations += 1;
            }
        }
        merged.associations.sort();

        let report = MergeReport {
            extension: extension.name.clone(),
            added_entities,
            augmented: r.augmented.into_iter().collect(),
            added_associations,
            idempotent_associations,
            overrides: r.overrides,
        };
        info!(
            extension = %report.extension,
            added = report.added_entities.len(),
            augmented = report.augmented.len(),
            associations = report.added_associations,
            overrides = report.overrides.len(),
            "merged extension"
        );
        Ok((merged, report))
    }
}

/// Build and merge each extension set in order, validating after every merge
pub fn merge_all(
    base: Taxonomy,
    extensions: &[DefinitionSet],
    prefixes: &PrefixMap,
) -> Result<(Taxonomy, Vec<MergeReport>), SchemaError> {
    let mut merged = base;
    let mut reports = Vec::new();

    for set in extensions {
        let extension = TaxonomyBuilder::with_context(prefixes.clone(), &merged).build(set)?;

        let duplicates = validator::duplicate_associations(&extension);
        if !duplicates.is_empty() {
            return Err(SchemaError::ValidationFailed {
                report: ValidationReport {
                    conforms: false,
                    violations: duplicates,
                },
            });
        }

        let (next, report) = ExtensionMerger::new(set.override_permitted).merge(&merged, &extension)?;
        ConsistencyValidator::validate(&next).into_result()?;
        merged = next;
        reports.push(report);
    }
    Ok((merged, reports))
}
