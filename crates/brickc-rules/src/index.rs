//! Compiled view of the schema graph.
//!
//! Rules only read the schema, so every closure they need is computed once
//! up front. The index never changes while a fixpoint runs.

use crate::traits::RuleError;
use brickc_core::model::{Iri, Triple};
use brickc_core::vocabulary;
use brickc_schema::hierarchy::{self, Edges};
use brickc_schema::validator::MeterBranch;
use brickc_store::RdfStore;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

type Multimap = BTreeMap<Iri, BTreeSet<Iri>>;

fn link(map: &mut Multimap, from: &Iri, to: &Iri) {
    map.entry(from.clone()).or_default().insert(to.clone());
}

#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    /// class -> reflexive-transitive superclasses
    superclasses: Multimap,
    /// p -> q for every `p owl:inverseOf q`
    inverse_of: Multimap,
    /// q -> p for every `p owl:inverseOf q`
    inverse_by: Multimap,
    symmetric: BTreeSet<Iri>,
    ranges: Multimap,
    /// entity property -> strict entity superproperties
    entity_superproperties: Multimap,
    replacements: Multimap,
    equivalent_forward: Multimap,
    equivalent_backward: Multimap,
    /// class -> tags associated with any of its superclasses
    tags: Multimap,
    meters: BTreeSet<Iri>,
    buildings: BTreeSet<Iri>,
    /// meter class -> substances declared on it or a meter superclass
    meter_substances: Multimap,
    metertypes: BTreeMap<(MeterBranch, Iri), Iri>,
}

impl SchemaIndex {
    pub fn from_store(schema: &RdfStore) -> Result<Self, RuleError> {
        Self::from_triples(schema.iter().map(|stored| &stored.triple))
    }

    pub fn from_triples<'t>(triples: impl IntoIterator<Item = &'t Triple>) -> Result<Self, RuleError> {
        let mut index = Self::default();
        let mut class_parents = Edges::new();
        let mut property_parents = Edges::new();
        let mut entity_properties = BTreeSet::new();
        let mut direct_tags = Multimap::new();
        let mut direct_substances = Multimap::new();

        for t in triples {
            let (Some(s), Some(o)) = (t.subject.as_iri(), t.object.as_iri()) else {
                continue;
            };
            match t.predicate.as_str() {
                vocabulary::RDFS_SUBCLASS_OF => {
                    link(&mut class_parents, s, o);
                    class_parents.entry(o.clone()).or_default();
                }
                vocabulary::RDFS_SUBPROPERTY_OF => {
                    link(&mut property_parents, s, o);
                    property_parents.entry(o.clone()).or_default();
                }
                vocabulary::OWL_INVERSE_OF => {
                    link(&mut index.inverse_of, s, o);
                    link(&mut index.inverse_by, o, s);
                }
                vocabulary::RDFS_RANGE => link(&mut index.ranges, s, o),
                vocabulary::BRICK_IS_REPLACED_BY => link(&mut index.replacements, s, o),
                vocabulary::OWL_EQUIVALENT_CLASS => {
                    link(&mut index.equivalent_forward, s, o);
                    link(&mut index.equivalent_backward, o, s);
                }
                vocabulary::BRICK_HAS_ASSOCIATED_TAG => link(&mut direct_tags, s, o),
                vocabulary::BRICK_HAS_SUBSTANCE => link(&mut direct_substances, s, o),
                vocabulary::RDF_TYPE => match o.as_str() {
                    vocabulary::OWL_CLASS => {
                        class_parents.entry(s.clone()).or_default();
                    }
                    vocabulary::OWL_SYMMETRIC_PROPERTY => {
                        index.symmetric.insert(s.clone());
                    }
                    vocabulary::BRICK_ENTITY_PROPERTY => {
                        entity_properties.insert(s.clone());
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        index.check_inverses()?;

        index.superclasses = hierarchy::closure(&class_parents);
        for (class, supers) in &index.superclasses {
            let tags: BTreeSet<Iri> = supers
                .iter()
                .filter_map(|c| direct_tags.get(c))
                .flatten()
                .cloned()
                .collect();
            if !tags.is_empty() {
                index.tags.insert(class.clone(), tags);
            }
        }

        for property in &entity_properties {
            let supers: BTreeSet<Iri> = hierarchy::ancestors(&property_parents, property)
                .into_iter()
                .filter(|p| p != property && entity_properties.contains(p))
                .collect();
            if !supers.is_empty() {
                index.entity_superproperties.insert(property.clone(), supers);
            }
        }

        let descendants = |root: &str| {
            let root = Iri::new_unchecked(root);
            if class_parents.contains_key(&root) {
                hierarchy::descendants(&class_parents, &root)
            } else {
                BTreeSet::new()
            }
        };
        index.meters = descendants(vocabulary::BRICK_METER);
        index.buildings = descendants(vocabulary::BRICK_BUILDING);
        let building_meters = descendants(vocabulary::BRICK_BUILDING_METER);

        for meter in &index.meters {
            let substances: BTreeSet<Iri> = index
                .superclasses
                .get(meter)
                .into_iter()
                .flatten()
                .filter(|c| index.meters.contains(*c))
                .filter_map(|c| direct_substances.get(c))
                .flatten()
                .cloned()
                .collect();
            if !substances.is_empty() {
                index.meter_substances.insert(meter.clone(), substances);
            }
        }

        for (class, substances) in &direct_substances {
            if !index.meters.contains(class) {
                continue;
            }
            let branch = if building_meters.contains(class) {
                MeterBranch::Building
            } else {
                MeterBranch::NonBuilding
            };
            for substance in substances {
                match index.metertypes.get(&(branch, substance.clone())) {
                    Some(first) if first != class => {
                        return Err(RuleError::SubstanceMappingConflict {
                            substance: substance.clone(),
                            first: first.clone(),
                            second: class.clone(),
                        })
                    }
                    Some(_) => {}
                    None => {
                        index.metertypes.insert((branch, substance.clone()), class.clone());
                    }
                }
            }
        }

        debug!(
            classes = index.superclasses.len(),
            meters = index.meters.len(),
            metertypes = index.metertypes.len(),
            "schema index compiled"
        );
        Ok(index)
    }

    /// Each property may pair with at most one other property
    fn check_inverses(&self) -> Result<(), RuleError> {
        let properties: BTreeSet<&Iri> = self.inverse_of.keys().chain(self.inverse_by.keys()).collect();
        for property in properties {
            let partners: BTreeSet<&Iri> = self
                .inverse_of
                .get(property)
                .into_iter()
                .chain(self.inverse_by.get(property))
                .flatten()
                .filter(|p| !(*p == property && self.symmetric.contains(property)))
                .collect();
            if partners.len() > 1 {
                return Err(RuleError::InconsistentInverse {
                    property: property.clone(),
                    partners: partners.into_iter().cloned().collect(),
                });
            }
        }
        Ok(())
    }

    pub fn is_subclass_of(&self, class: &Iri, ancestor: &Iri) -> bool {
        class == ancestor || self.superclasses.get(class).map(|s| s.contains(ancestor)).unwrap_or(false)
    }

    pub fn tags_of(&self, class: &Iri) -> impl Iterator<Item = &Iri> {
        self.tags.get(class).into_iter().flatten()
    }

    pub fn inverses_declared_by(&self, property: &Iri) -> impl Iterator<Item = &Iri> {
        self.inverse_of.get(property).into_iter().flatten()
    }

    pub fn inverses_declaring(&self, property: &Iri) -> impl Iterator<Item = &Iri> {
        self.inverse_by.get(property).into_iter().flatten()
    }

    pub fn is_symmetric(&self, property: &Iri) -> bool {
        self.symmetric.contains(property)
    }

    pub fn ranges_of(&self, property: &Iri) -> impl Iterator<Item = &Iri> {
        self.ranges.get(property).into_iter().flatten()
    }

    pub fn entity_superproperties(&self, property: &Iri) -> impl Iterator<Item = &Iri> {
        self.entity_superproperties.get(property).into_iter().flatten()
    }

    pub fn replacements_of(&self, class: &Iri) -> impl Iterator<Item = &Iri> {
        self.replacements.get(class).into_iter().flatten()
    }

    pub fn equivalents_forward(&self, class: &Iri) -> impl Iterator<Item = &Iri> {
        self.equivalent_forward.get(class).into_iter().flatten()
    }

    pub fn equivalents_backward(&self, class: &Iri) -> impl Iterator<Item = &Iri> {
        self.equivalent_backward.get(class).into_iter().flatten()
    }

    pub fn is_meter(&self, class: &Iri) -> bool {
        self.meters.contains(class)
    }

    pub fn is_building(&self, class: &Iri) -> bool {
        self.buildings.contains(class)
    }

    pub fn meter_substances(&self, class: &Iri) -> impl Iterator<Item = &Iri> {
        self.meter_substances.get(class).into_iter().flatten()
    }

    /// Concrete metertype for a substance, if exactly one class declares it on that branch
    pub fn metertype(&self, branch: MeterBranch, substance: &Iri) -> Option<&Iri> {
        self.metertypes.get(&(branch, substance.clone()))
    }

    /// Every class with a non-empty inherited tag set, in IRI order
    pub fn tagged_classes(&self) -> impl Iterator<Item = (&Iri, &BTreeSet<Iri>)> {
        self.tags.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickc_core::model::Term;

    fn brick(local: &str) -> Iri {
        Iri::new_unchecked(vocabulary::brick(local))
    }

    fn fact(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(brick(s), Iri::new_unchecked(p), brick(o))
    }

    fn typed(s: &str, class: &str) -> Triple {
        Triple::new(brick(s), Iri::new_unchecked(vocabulary::RDF_TYPE), Term::iri(class))
    }

    #[test]
    fn test_closures() {
        let schema = vec![
            fact("Meter", vocabulary::RDFS_SUBCLASS_OF, "Equipment"),
            fact("Water_Meter", vocabulary::RDFS_SUBCLASS_OF, "Meter"),
            fact("Equipment", vocabulary::BRICK_HAS_ASSOCIATED_TAG, "Equipment_Tag"),
            fact("Meter", vocabulary::BRICK_HAS_ASSOCIATED_TAG, "Meter_Tag"),
            fact("Water_Meter", vocabulary::BRICK_HAS_SUBSTANCE, "Water"),
        ];
        let index = SchemaIndex::from_triples(&schema).unwrap();
        assert!(index.is_subclass_of(&brick("Water_Meter"), &brick("Equipment")));
        assert_eq!(index.tags_of(&brick("Water_Meter")).count(), 2);
        assert!(index.is_meter(&brick("Water_Meter")));
        assert_eq!(
            index.metertype(MeterBranch::NonBuilding, &brick("Water")),
            Some(&brick("Water_Meter"))
        );
        assert_eq!(index.metertype(MeterBranch::Building, &brick("Water")), None);
    }

    #[test]
    fn test_entity_superproperties_skip_relationships() {
        let schema = vec![
            typed("area", vocabulary::BRICK_ENTITY_PROPERTY),
            typed("grossArea", vocabulary::BRICK_ENTITY_PROPERTY),
            fact("grossArea", vocabulary::RDFS_SUBPROPERTY_OF, "area"),
            fact("feeds", vocabulary::RDFS_SUBPROPERTY_OF, "area"),
        ];
        let index = SchemaIndex::from_triples(&schema).unwrap();
        assert_eq!(index.entity_superproperties(&brick("grossArea")).collect::<Vec<_>>(), vec![&brick("area")]);
        assert_eq!(index.entity_superproperties(&brick("feeds")).count(), 0);
    }

    #[test]
    fn test_conflicting_inverses_are_rejected() {
        let schema = vec![
            fact("feeds", vocabulary::OWL_INVERSE_OF, "isFedBy"),
            fact("isFedBy", vocabulary::OWL_INVERSE_OF, "hasPart"),
        ];
        let err = SchemaIndex::from_triples(&schema).unwrap_err();
        assert!(matches!(err, RuleError::InconsistentInverse { .. }));
    }

    #[test]
    fn test_symmetric_self_inverse_is_fine() {
        let schema = vec![
            typed("adjacentTo", vocabulary::OWL_SYMMETRIC_PROPERTY),
            fact("adjacentTo", vocabulary::OWL_INVERSE_OF, "adjacentTo"),
        ];
        assert!(SchemaIndex::from_triples(&schema).is_ok());
    }

    #[test]
    fn test_two_metertypes_for_one_substance_conflict() {
        let schema = vec![
            fact("Water_Meter", vocabulary::RDFS_SUBCLASS_OF, "Meter"),
            fact("Domestic_Water_Meter", vocabulary::RDFS_SUBCLASS_OF, "Meter"),
            fact("Water_Meter", vocabulary::BRICK_HAS_SUBSTANCE, "Water"),
            fact("Domestic_Water_Meter", vocabulary::BRICK_HAS_SUBSTANCE, "Water"),
        ];
        let err = SchemaIndex::from_triples(&schema).unwrap_err();
        assert!(matches!(err, RuleError::SubstanceMappingConflict { .. }));
    }
}
