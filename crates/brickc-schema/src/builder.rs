//! Taxonomy builder.
//!
//! Two passes over one [`DefinitionSet`]: the first registers every
//! identifier in the build's [`SymbolTable`], the second links references,
//! so records may refer forward. Parent relations are then checked for
//! cycles with a depth-first traversal.

use crate::error::{DanglingReference, SchemaError};
use crate::hierarchy;
use crate::ir::*;
use crate::loader::malformed;
use crate::symbols::{Resolution, Scope, SymbolTable};
use crate::taxonomy::*;
use brickc_core::model::Iri;
use brickc_core::{vocabulary, PrefixMap};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

pub struct TaxonomyBuilder {
    symbols: SymbolTable,
    dangling: Vec<DanglingReference>,
}

impl TaxonomyBuilder {
    pub fn new(symbols: SymbolTable) -> Self {
        Self {
            symbols,
            dangling: Vec::new(),
        }
    }

    /// Builder for an extension: references may name entities of `context`
    pub fn with_context(prefixes: PrefixMap, context: &Taxonomy) -> Self {
        Self::new(SymbolTable::with_context(prefixes, context))
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn build(mut self, set: &DefinitionSet) -> Result<Taxonomy, SchemaError> {
        self.register(set)?;
        let taxonomy = self.link(set)?;
        check_acyclic(&taxonomy)?;

        info!(
            taxonomy = %taxonomy.name,
            classes = taxonomy.classes.len(),
            properties = taxonomy.properties.len(),
            tags = taxonomy.tags.len(),
            concepts = taxonomy.concepts.len(),
            "built taxonomy"
        );
        Ok(taxonomy)
    }

    // Pass 1

    fn register(&mut self, set: &DefinitionSet) -> Result<(), SchemaError> {
        for class in &set.classes {
            self.declare(&class.id, EntityKind::Class, &class.origin)?;
        }
        for property in &set.properties {
            self.declare(&property.id, EntityKind::Property, &property.origin)?;
        }
        for tag in &set.tags {
            self.declare(&tag.id, EntityKind::Tag, &tag.origin)?;
        }
        for concept in &set.concepts {
            self.declare(&concept.id, concept.kind.into(), &concept.origin)?;
        }

        // deprecated terms without a class record are still classes
        for dep in &set.deprecations {
            if self.symbols.lookup(&dep.id).is_none() {
                self.symbols.declare(&dep.id, EntityKind::Class, &dep.origin);
            }
        }

        // tags named by classes are declared implicitly
        for class in &set.classes {
            for tag in &class.tags {
                if tag.namespace() == vocabulary::TAG && self.symbols.lookup(tag).is_none() {
                    self.symbols.declare(tag, EntityKind::Tag, &class.origin);
                }
            }
        }

        debug!(symbols = self.symbols.len(), "registered symbols");
        Ok(())
    }

    fn declare(&mut self, id: &Iri, kind: EntityKind, origin: &Origin) -> Result<(), SchemaError> {
        match self.symbols.declare(id, kind, origin) {
            Some(previous) if previous.scope == Scope::Local => Err(malformed(
                &origin.source,
                origin.record,
                "id",
                format!(
                    "{} already declared as a {} in {} record {}",
                    id, previous.kind, previous.origin.source, previous.origin.record
                ),
            )),
            _ => Ok(()),
        }
    }

    // Pass 2

    fn check(&mut self, entity: &Iri, field: &str, reference: &Iri, kinds: &[EntityKind]) {
        match self.symbols.resolve(reference, kinds) {
            Resolution::Found(_) | Resolution::External => {}
            Resolution::Missing | Resolution::WrongKind(_) => self.dangling.push(DanglingReference {
                entity: entity.clone(),
                field: field.to_string(),
                reference: reference.clone(),
            }),
        }
    }

    fn check_all<'i>(&mut self, entity: &Iri, field: &str, references: impl IntoIterator<Item = &'i Iri>, kinds: &[EntityKind]) {
        for reference in references {
            self.check(entity, field, reference, kinds);
        }
    }

    fn link(&mut self, set: &DefinitionSet) -> Result<Taxonomy, SchemaError> {
        const CLASS: &[EntityKind] = &[EntityKind::Class];
        const PROPERTY: &[EntityKind] = &[EntityKind::Property];
        const CONCEPT: &[EntityKind] = &[EntityKind::Quantity, EntityKind::Substance];

        let mut taxonomy = Taxonomy::new(set.name.clone());

        for def in &set.classes {
            self.check_all(&def.id, "parents", &def.parents, CLASS);
            self.check_all(&def.id, "equivalent", &def.equivalent, CLASS);
            self.check_all(&def.id, "disjoint", &def.disjoint, CLASS);
            self.check_all(&def.id, "tags", &def.tags, &[EntityKind::Tag]);
            self.check_all(&def.id, "substances", &def.substances, &[EntityKind::Substance]);
            self.check_all(&def.id, "quantities", &def.quantities, &[EntityKind::Quantity]);
            for constraint in &def.constraints {
                self.check(&def.id, "constraints", &constraint.path, PROPERTY);
                self.check_all(&def.id, "constraints", &constraint.classes, CLASS);
            }

            let mut constraints: BTreeMap<Iri, BTreeSet<Iri>> = BTreeMap::new();
            for constraint in &def.constraints {
                constraints
                    .entry(constraint.path.clone())
                    .or_default()
                    .extend(constraint.classes.iter().cloned());
            }
            taxonomy.classes.insert(
                def.id.clone(),
                ClassNode {
                    id: def.id.clone(),
                    label: def.label.clone(),
                    parents: def.parents.iter().cloned().collect(),
                    equivalent: def.equivalent.iter().cloned().collect(),
                    disjoint: def.disjoint.iter().cloned().collect(),
                    definition: def.definition.clone(),
                    see_also: def.see_also.iter().cloned().collect(),
                    constraints,
                    deprecation: None,
                    origin: def.origin.clone(),
                },
            );

            let links = def
                .tags
                .iter()
                .map(|t| (AssociationKind::Tag, t))
                .chain(def.substances.iter().map(|s| (AssociationKind::Substance, s)))
                .chain(def.quantities.iter().map(|q| (AssociationKind::Quantity, q)));
            for (kind, target) in links {
                taxonomy.associations.push(Association {
                    kind,
                    class: def.id.clone(),
                    target: target.clone(),
                    origin: def.origin.clone(),
                });
            }
        }

        for dep in &set.deprecations {
            self.check(&dep.id, "replaced_by", &dep.replaced_by, CLASS);
            self.check_all(&dep.id, "parents", &dep.parents, CLASS);

            let node = taxonomy.classes.entry(dep.id.clone()).or_insert_with(|| ClassNode {
                id: dep.id.clone(),
                label: None,
                parents: BTreeSet::new(),
                equivalent: BTreeSet::new(),
                disjoint: BTreeSet::new(),
                definition: None,
                see_also: BTreeSet::new(),
                constraints: BTreeMap::new(),
                deprecation: None,
                origin: dep.origin.clone(),
            });
            // a class record and its deprecation record may both name parents
            node.parents.extend(dep.parents.iter().cloned());
            node.deprecation = Some(Deprecation {
                replaced_by: dep.replaced_by.clone(),
                version: dep.version.clone(),
                message: dep.message.clone(),
                mitigation_rule: dep.mitigation_rule.clone(),
            });
        }

        for def in &set.properties {
            self.check_all(&def.id, "domain", &def.domain, CLASS);
            if let Some(range) = &def.range {
                if range.kind == RangeKind::Class {
                    self.check(&def.id, "range", &range.target, CLASS);
                }
            }
            if let Some(inverse) = &def.inverse {
                self.check(&def.id, "inverse", inverse, PROPERTY);
            }
            self.check_all(&def.id, "parents", &def.parents, PROPERTY);
            self.check_all(&def.id, "property_of", &def.property_of, CLASS);

            taxonomy.properties.insert(
                def.id.clone(),
                PropertyNode {
                    id: def.id.clone(),
                    label: def.label.clone(),
                    kind: def.kind,
                    domain: def.domain.iter().cloned().collect(),
                    range: def.range.clone(),
                    inverse: def.inverse.clone(),
                    symmetric: def.symmetric,
                    parents: def.parents.iter().cloned().collect(),
                    property_of: def.property_of.iter().cloned().collect(),
                    definition: def.definition.clone(),
                    origin: def.origin.clone(),
                },
            );
        }

        for def in &set.tags {
            self.check_all(&def.id, "classes", &def.classes, CLASS);
            taxonomy.tags.insert(
                def.id.clone(),
                TagNode {
                    id: def.id.clone(),
                    label: def.label.clone(),
                    definition: def.definition.clone(),
                    origin: def.origin.clone(),
                },
            );
            for class in &def.classes {
                taxonomy.associations.push(Association {
                    kind: AssociationKind::Tag,
                    class: class.clone(),
                    target: def.id.clone(),
                    origin: def.origin.clone(),
                });
            }
        }

        // implicitly declared tags get a node too
        let implicit: Vec<(Iri, Origin)> = self
            .symbols
            .local_symbols()
            .filter(|(id, s)| s.kind == EntityKind::Tag && !taxonomy.tags.contains_key(*id))
            .map(|(id, s)| (id.clone(), s.origin.clone()))
            .collect();
        for (id, origin) in implicit {
            taxonomy.tags.insert(
                id.clone(),
                TagNode {
                    id,
                    label: None,
                    definition: None,
                    origin,
                },
            );
        }

        for def in &set.concepts {
            self.check_all(&def.id, "broader", &def.broader, CONCEPT);
            self.check_all(&def.id, "related", &def.related, CONCEPT);
            taxonomy.concepts.insert(
                def.id.clone(),
                ConceptNode {
                    id: def.id.clone(),
                    kind: def.kind,
                    label: def.label.clone(),
                    broader: def.broader.iter().cloned().collect(),
                    related: def.related.iter().cloned().collect(),
                    definition: def.definition.clone(),
                    origin: def.origin.clone(),
                },
            );
        }

        if !self.dangling.is_empty() {
            let mut references = std::mem::take(&mut self.dangling);
            references.sort();
            references.dedup();
            return Err(SchemaError::UnresolvedReference { references });
        }

        taxonomy.associations.sort();
        Ok(taxonomy)
    }
}

/// Reject the first cycle in the class, property or concept hierarchy
pub fn check_acyclic(taxonomy: &Taxonomy) -> Result<(), SchemaError> {
    let hierarchies = [
        ("class", taxonomy.class_hierarchy()),
        ("property", taxonomy.property_hierarchy()),
        ("concept", taxonomy.concept_hierarchy()),
    ];
    for (name, edges) in hierarchies {
        if let Some(cycle) = hierarchy::find_cycle(&edges) {
            return Err(SchemaError::CyclicHierarchy {
                hierarchy: name.to_string(),
                cycle,
            });
        }
    }
    Ok(())
}
