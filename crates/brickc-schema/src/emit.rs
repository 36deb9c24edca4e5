//! Taxonomy to triples.
//!
//! Besides the OWL/SKOS statements this writes the SHACL shapes a class
//! carries (value constraints) and the property shapes of entity
//! properties. Classes without parents hang under both `brick:Entity` and
//! the older `brick:Class` root.

use crate::config::OntologyConfig;
use crate::ir::{ConceptKind, PropertyKind, RangeKind};
use crate::taxonomy::{AssociationKind, ClassNode, PropertyNode, Taxonomy};
use brickc_core::model::{Iri, Term, Triple};
use brickc_core::vocabulary;
use std::collections::BTreeSet;

fn iri(value: &str) -> Iri {
    Iri::new_unchecked(value)
}

/// Collects statements; duplicates collapse
#[derive(Default)]
struct Emitter {
    triples: BTreeSet<Triple>,
}

impl Emitter {
    fn add(&mut self, subject: &Iri, predicate: &str, object: impl Into<Term>) {
        self.triples.insert(Triple::new(subject, iri(predicate), object));
    }

    /// Statement about a blank node
    fn link(&mut self, subject: &Term, predicate: &str, object: impl Into<Term>) {
        self.triples.insert(Triple::new(subject.clone(), iri(predicate), object));
    }

    fn typed(&mut self, subject: &Iri, class: &str) {
        self.add(subject, vocabulary::RDF_TYPE, iri(class));
    }

    fn label(&mut self, subject: &Iri, label: &Option<String>) {
        let text = label.clone().unwrap_or_else(|| subject.default_label());
        self.add(subject, vocabulary::RDFS_LABEL, Term::string(text));
    }

    fn definition(&mut self, subject: &Iri, definition: &Option<String>) {
        if let Some(text) = definition {
            self.add(subject, vocabulary::SKOS_DEFINITION, Term::string(text.clone()));
        }
    }

    fn all<'i>(&mut self, subject: &Iri, predicate: &str, objects: impl IntoIterator<Item = &'i Iri>) {
        for object in objects {
            self.add(subject, predicate, object);
        }
    }
}

/// Blank node label derived from the owning subject, so output stays byte-stable
fn blank(owner: &Iri, suffix: &str) -> Term {
    let local: String = owner
        .local_name()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    Term::Blank(format!("{}_{}", local, suffix))
}

/// Property shapes restricting the values of each constrained path
fn constraints(e: &mut Emitter, id: &Iri, class: &ClassNode) {
    if class.constraints.is_empty() {
        return;
    }
    e.typed(id, vocabulary::SH_NODE_SHAPE);
    for (path, classes) in &class.constraints {
        let stem = format!("{}_constraint", path.local_name());
        let shape = blank(id, &stem);
        e.add(id, vocabulary::SH_PROPERTY, shape.clone());
        e.link(&shape, vocabulary::SH_PATH, path);

        let alternatives: Vec<&Iri> = classes.iter().collect();
        match alternatives.as_slice() {
            [] => {}
            [only] => e.link(&shape, vocabulary::SH_CLASS, *only),
            _ => {
                // sh:or over one sh:class node per alternative, as an RDF list
                let cells: Vec<Term> =
                    (0..alternatives.len()).map(|i| blank(id, &format!("{}_or{}", stem, i))).collect();
                e.link(&shape, vocabulary::SH_OR, cells[0].clone());
                for (i, class) in alternatives.iter().enumerate() {
                    let alternative = blank(id, &format!("{}_alt{}", stem, i));
                    e.link(&alternative, vocabulary::SH_CLASS, *class);
                    e.link(&cells[i], vocabulary::RDF_FIRST, alternative);
                    let rest = cells.get(i + 1).cloned().unwrap_or_else(|| Term::iri(vocabulary::RDF_NIL));
                    e.link(&cells[i], vocabulary::RDF_REST, rest);
                }
            }
        }
    }
}

/// `bsh:has<Name>Shape`, attached to every shape the property belongs to
fn entity_property_shape(e: &mut Emitter, id: &Iri, property: &PropertyNode) {
    if property.property_of.is_empty() {
        return;
    }
    let shape = iri(&vocabulary::bsh(&format!("has{}Shape", id.local_name())));
    let label = property.label.clone().unwrap_or_else(|| id.default_label());
    e.typed(&shape, vocabulary::SH_PROPERTY_SHAPE);
    e.add(&shape, vocabulary::SH_PATH, id);
    e.add(&shape, vocabulary::RDFS_LABEL, Term::string(format!("has {} property", label)));
    if let Some(range) = property.range.as_ref().filter(|r| r.kind == RangeKind::Shape) {
        e.add(&shape, vocabulary::SH_NODE, &range.target);
    }
    for owner in &property.property_of {
        e.add(owner, vocabulary::SH_PROPERTY, &shape);
    }
}

/// Every statement describing `taxonomy`, in canonical order
pub fn taxonomy_triples(taxonomy: &Taxonomy, ontology: Option<&OntologyConfig>) -> Vec<Triple> {
    let mut e = Emitter::default();

    if let Some(header) = ontology {
        let id = iri(&header.iri);
        e.typed(&id, vocabulary::OWL_ONTOLOGY);
        e.add(&id, vocabulary::OWL_VERSION_INFO, Term::string(header.version.clone()));
        e.add(&id, vocabulary::DCTERMS_TITLE, Term::string(header.title.clone()));
    }

    let roots = [iri(vocabulary::BRICK_CLASS), iri(vocabulary::BRICK_ENTITY)];
    if !taxonomy.classes.is_empty() {
        for root in &roots {
            e.typed(root, vocabulary::OWL_CLASS);
            e.label(root, &None);
        }
    }

    for (id, class) in &taxonomy.classes {
        e.typed(id, vocabulary::OWL_CLASS);
        e.label(id, &class.label);
        e.all(id, vocabulary::RDFS_SUBCLASS_OF, &class.parents);
        if class.parents.is_empty() && !roots.contains(id) {
            e.all(id, vocabulary::RDFS_SUBCLASS_OF, &roots);
        }
        e.all(id, vocabulary::OWL_EQUIVALENT_CLASS, &class.equivalent);
        e.all(id, vocabulary::OWL_DISJOINT_WITH, &class.disjoint);
        e.definition(id, &class.definition);
        for reference in &class.see_also {
            let object = match Iri::new(reference.as_str()) {
                Ok(target) => Term::from(target),
                Err(_) => Term::string(reference.clone()),
            };
            e.add(id, vocabulary::RDFS_SEE_ALSO, object);
        }
        constraints(&mut e, id, class);

        if let Some(dep) = &class.deprecation {
            e.add(id, vocabulary::OWL_DEPRECATED, Term::boolean(true));
            e.add(id, vocabulary::BRICK_DEPRECATED_IN_VERSION, Term::string(dep.version.clone()));
            e.add(id, vocabulary::BRICK_IS_REPLACED_BY, &dep.replaced_by);
            if let Some(message) = &dep.message {
                e.add(id, vocabulary::BRICK_DEPRECATION_MITIGATION_MESSAGE, Term::string(message.clone()));
            }
            if let Some(rule) = &dep.mitigation_rule {
                e.add(id, vocabulary::BRICK_DEPRECATION_MITIGATION_RULE, rule);
            }
        }
    }

    for association in &taxonomy.associations {
        let predicate = match association.kind {
            AssociationKind::Tag => vocabulary::BRICK_HAS_ASSOCIATED_TAG,
            AssociationKind::Substance => vocabulary::BRICK_HAS_SUBSTANCE,
            AssociationKind::Quantity => vocabulary::BRICK_HAS_QUANTITY,
        };
        e.add(&association.class, predicate, &association.target);
    }

    for (id, property) in &taxonomy.properties {
        e.typed(id, vocabulary::OWL_OBJECT_PROPERTY);
        if property.kind == PropertyKind::EntityProperty {
            e.typed(id, vocabulary::BRICK_ENTITY_PROPERTY);
        }
        if property.symmetric {
            e.typed(id, vocabulary::OWL_SYMMETRIC_PROPERTY);
        }
        e.label(id, &property.label);
        e.all(id, vocabulary::RDFS_SUBPROPERTY_OF, &property.parents);
        e.all(id, vocabulary::RDFS_DOMAIN, &property.domain);
        if let Some(range) = &property.range {
            e.add(id, vocabulary::RDFS_RANGE, &range.target);
        }
        if let Some(inverse) = &property.inverse {
            e.add(id, vocabulary::OWL_INVERSE_OF, inverse);
        }
        e.definition(id, &property.definition);
        entity_property_shape(&mut e, id, property);
    }

    for (id, tag) in &taxonomy.tags {
        e.typed(id, vocabulary::BRICK_TAG);
        e.label(id, &tag.label);
        e.definition(id, &tag.definition);
    }

    for (id, concept) in &taxonomy.concepts {
        let class = match concept.kind {
            ConceptKind::Quantity => vocabulary::BRICK_QUANTITY,
            ConceptKind::Substance => vocabulary::BRICK_SUBSTANCE,
        };
        e.typed(id, class);
        e.label(id, &concept.label);
        e.definition(id, &concept.definition);
        for broader in &concept.broader {
            e.add(id, vocabulary::SKOS_BROADER, broader);
            // narrower closes the other direction
            e.add(broader, vocabulary::SKOS_NARROWER, id);
        }
        for related in &concept.related {
            e.add(id, vocabulary::SKOS_RELATED, related);
            e.add(related, vocabulary::SKOS_RELATED, id);
        }
    }

    e.triples.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Origin, RangeDef};
    use crate::taxonomy::{Association, ConceptNode, Deprecation};
    use std::collections::BTreeMap;

    fn brick(local: &str) -> Iri {
        Iri::new_unchecked(vocabulary::brick(local))
    }

    fn has(triples: &[Triple], s: &Iri, p: &str, o: Term) -> bool {
        triples.contains(&Triple::new(s, iri(p), o))
    }

    fn sample() -> Taxonomy {
        let mut t = Taxonomy::new("t");
        let mut class = ClassNode {
            id: brick("Water_Meter"),
            label: None,
            parents: [brick("Meter")].into(),
            equivalent: BTreeSet::new(),
            disjoint: BTreeSet::new(),
            definition: Some("Measures water".to_string()),
            see_also: BTreeSet::new(),
            constraints: BTreeMap::new(),
            deprecation: None,
            origin: Origin::new("t", 1),
        };
        t.classes.insert(class.id.clone(), class.clone());

        class.id = brick("Old_Water_Meter");
        class.definition = None;
        class.deprecation = Some(Deprecation {
            replaced_by: brick("Water_Meter"),
            version: "1.3.0".to_string(),
            message: Some("Use Water_Meter".to_string()),
            mitigation_rule: None,
        });
        t.classes.insert(class.id.clone(), class);

        t.associations.push(Association {
            kind: AssociationKind::Substance,
            class: brick("Water_Meter"),
            target: brick("Water"),
            origin: Origin::new("t", 1),
        });
        t.concepts.insert(
            brick("Potable_Water"),
            ConceptNode {
                id: brick("Potable_Water"),
                kind: ConceptKind::Substance,
                label: None,
                broader: [brick("Water")].into(),
                related: [brick("Steam")].into(),
                definition: None,
                origin: Origin::new("t", 2),
            },
        );
        t
    }

    #[test]
    fn test_class_statements() {
        let triples = taxonomy_triples(&sample(), None);
        let meter = brick("Water_Meter");
        assert!(has(&triples, &meter, vocabulary::RDF_TYPE, Term::iri(vocabulary::OWL_CLASS)));
        assert!(has(&triples, &meter, vocabulary::RDFS_LABEL, Term::string("Water Meter")));
        assert!(has(&triples, &meter, vocabulary::RDFS_SUBCLASS_OF, brick("Meter").into()));
        assert!(has(&triples, &meter, vocabulary::BRICK_HAS_SUBSTANCE, brick("Water").into()));
        assert!(has(&triples, &meter, vocabulary::SKOS_DEFINITION, Term::string("Measures water")));
    }

    #[test]
    fn test_deprecation_and_concepts() {
        let triples = taxonomy_triples(&sample(), None);
        let old = brick("Old_Water_Meter");
        assert!(has(&triples, &old, vocabulary::OWL_DEPRECATED, Term::boolean(true)));
        assert!(has(&triples, &old, vocabulary::BRICK_IS_REPLACED_BY, brick("Water_Meter").into()));
        assert!(has(&triples, &old, vocabulary::BRICK_DEPRECATED_IN_VERSION, Term::string("1.3.0")));
        assert!(has(&triples, &brick("Water"), vocabulary::SKOS_NARROWER, brick("Potable_Water").into()));
        assert!(has(&triples, &brick("Potable_Water"), vocabulary::SKOS_RELATED, brick("Steam").into()));
        assert!(has(&triples, &brick("Steam"), vocabulary::SKOS_RELATED, brick("Potable_Water").into()));
    }

    #[test]
    fn test_parentless_classes_sit_under_both_roots() {
        let mut t = sample();
        let mut meter = t.classes[&brick("Water_Meter")].clone();
        meter.id = brick("Meter");
        meter.parents.clear();
        t.classes.insert(meter.id.clone(), meter);

        let triples = taxonomy_triples(&t, None);
        let entity = iri(vocabulary::BRICK_ENTITY);
        let root = iri(vocabulary::BRICK_CLASS);
        assert!(has(&triples, &entity, vocabulary::RDF_TYPE, Term::iri(vocabulary::OWL_CLASS)));
        assert!(has(&triples, &root, vocabulary::RDF_TYPE, Term::iri(vocabulary::OWL_CLASS)));
        assert!(has(&triples, &brick("Meter"), vocabulary::RDFS_SUBCLASS_OF, entity.clone().into()));
        assert!(has(&triples, &brick("Meter"), vocabulary::RDFS_SUBCLASS_OF, root.into()));
        assert!(!has(&triples, &brick("Water_Meter"), vocabulary::RDFS_SUBCLASS_OF, entity.into()));
        assert!(taxonomy_triples(&Taxonomy::new("empty"), None).is_empty());
    }

    #[test]
    fn test_constraints_become_property_shapes() {
        let mut t = sample();
        let ahu = t.classes.get_mut(&brick("Water_Meter")).unwrap();
        ahu.constraints = BTreeMap::from([
            (brick("meters"), BTreeSet::from([brick("Building")])),
            (brick("hasPart"), BTreeSet::from([brick("Valve"), brick("Pump")])),
        ]);
        let triples = taxonomy_triples(&t, None);
        let meter = brick("Water_Meter");
        assert!(has(&triples, &meter, vocabulary::RDF_TYPE, Term::iri(vocabulary::SH_NODE_SHAPE)));

        let single = Term::Blank("Water_Meter_meters_constraint".to_string());
        assert!(has(&triples, &meter, vocabulary::SH_PROPERTY, single.clone()));
        let shape = |p: &str, o: Term| Triple::new(single.clone(), iri(p), o);
        assert!(triples.contains(&shape(vocabulary::SH_PATH, brick("meters").into())));
        assert!(triples.contains(&shape(vocabulary::SH_CLASS, brick("Building").into())));

        // two alternatives: sh:or over a two-cell list ending in rdf:nil
        let either = Term::Blank("Water_Meter_hasPart_constraint".to_string());
        let first = Term::Blank("Water_Meter_hasPart_constraint_or0".to_string());
        let second = Term::Blank("Water_Meter_hasPart_constraint_or1".to_string());
        assert!(triples.contains(&Triple::new(either, iri(vocabulary::SH_OR), first.clone())));
        assert!(triples.contains(&Triple::new(first, iri(vocabulary::RDF_REST), second.clone())));
        assert!(triples.contains(&Triple::new(second, iri(vocabulary::RDF_REST), Term::iri(vocabulary::RDF_NIL))));
        // Pump sorts before Valve
        let alternative = Term::Blank("Water_Meter_hasPart_constraint_alt0".to_string());
        assert!(triples.contains(&Triple::new(alternative, iri(vocabulary::SH_CLASS), brick("Pump"))));
    }

    #[test]
    fn test_entity_property_shape() {
        let mut t = sample();
        t.properties.insert(
            brick("area"),
            PropertyNode {
                id: brick("area"),
                label: Some("Area".to_string()),
                kind: PropertyKind::EntityProperty,
                domain: BTreeSet::new(),
                range: Some(RangeDef {
                    target: Iri::new_unchecked(vocabulary::bsh("AreaShape")),
                    kind: RangeKind::Shape,
                }),
                inverse: None,
                symmetric: false,
                parents: BTreeSet::new(),
                property_of: [brick("Location")].into(),
                definition: None,
                origin: Origin::new("t", 3),
            },
        );
        let triples = taxonomy_triples(&t, None);
        let shape = Iri::new_unchecked(vocabulary::bsh("hasareaShape"));
        assert!(has(&triples, &shape, vocabulary::RDF_TYPE, Term::iri(vocabulary::SH_PROPERTY_SHAPE)));
        assert!(has(&triples, &shape, vocabulary::SH_PATH, brick("area").into()));
        assert!(has(&triples, &shape, vocabulary::SH_NODE, Term::iri(&vocabulary::bsh("AreaShape"))));
        assert!(has(&triples, &shape, vocabulary::RDFS_LABEL, Term::string("has Area property")));
        assert!(has(&triples, &brick("Location"), vocabulary::SH_PROPERTY, shape.clone().into()));
    }

    #[test]
    fn test_output_is_sorted_and_header_optional() {
        let header = OntologyConfig::default();
        let with = taxonomy_triples(&sample(), Some(&header));
        let without = taxonomy_triples(&sample(), None);
        assert_eq!(with.len(), without.len() + 3);
        assert!(with.windows(2).all(|w| w[0] < w[1]));
    }
}
