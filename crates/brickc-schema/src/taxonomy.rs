//! Taxonomy graph: the linked, identifier-ordered form of a definition set

use crate::hierarchy::{self, Edges};
use crate::ir::{ConceptKind, Origin, PropertyKind, RangeDef};
use brickc_core::model::Iri;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What an identifier names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Class,
    Property,
    Tag,
    Quantity,
    Substance,
}

impl From<ConceptKind> for EntityKind {
    fn from(kind: ConceptKind) -> Self {
        match kind {
            ConceptKind::Quantity => EntityKind::Quantity,
            ConceptKind::Substance => EntityKind::Substance,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Class => "class",
            EntityKind::Property => "property",
            EntityKind::Tag => "tag",
            EntityKind::Quantity => "quantity",
            EntityKind::Substance => "substance",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deprecation {
    pub replaced_by: Iri,
    pub version: String,
    pub message: Option<String>,
    pub mitigation_rule: Option<Iri>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    pub id: Iri,
    /// Explicit label; the emitter derives one from the local name otherwise
    pub label: Option<String>,
    pub parents: BTreeSet<Iri>,
    pub equivalent: BTreeSet<Iri>,
    pub disjoint: BTreeSet<Iri>,
    pub definition: Option<String>,
    pub see_also: BTreeSet<String>,
    /// path -> accepted value classes
    pub constraints: BTreeMap<Iri, BTreeSet<Iri>>,
    pub deprecation: Option<Deprecation>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyNode {
    pub id: Iri,
    pub label: Option<String>,
    pub kind: PropertyKind,
    pub domain: BTreeSet<Iri>,
    pub range: Option<RangeDef>,
    pub inverse: Option<Iri>,
    pub symmetric: bool,
    pub parents: BTreeSet<Iri>,
    pub property_of: BTreeSet<Iri>,
    pub definition: Option<String>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNode {
    pub id: Iri,
    pub label: Option<String>,
    pub definition: Option<String>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptNode {
    pub id: Iri,
    pub kind: ConceptKind,
    pub label: Option<String>,
    pub broader: BTreeSet<Iri>,
    pub related: BTreeSet<Iri>,
    pub definition: Option<String>,
    pub origin: Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    Tag,
    Substance,
    Quantity,
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssociationKind::Tag => "tag",
            AssociationKind::Substance => "substance",
            AssociationKind::Quantity => "quantity",
        };
        write!(f, "{}", name)
    }
}

/// Class-to-tag / substance / quantity link, remembered with the record that stated it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Association {
    pub kind: AssociationKind,
    pub class: Iri,
    pub target: Iri,
    pub origin: Origin,
}

impl Association {
    pub fn key(&self) -> (AssociationKind, &Iri, &Iri) {
        (self.kind, &self.class, &self.target)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub name: String,
    pub classes: BTreeMap<Iri, ClassNode>,
    pub properties: BTreeMap<Iri, PropertyNode>,
    pub tags: BTreeMap<Iri, TagNode>,
    pub concepts: BTreeMap<Iri, ConceptNode>,
    pub associations: Vec<Association>,
}

impl Taxonomy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn kind_of(&self, id: &Iri) -> Option<EntityKind> {
        if self.classes.contains_key(id) {
            Some(EntityKind::Class)
        } else if self.properties.contains_key(id) {
            Some(EntityKind::Property)
        } else if self.tags.contains_key(id) {
            Some(EntityKind::Tag)
        } else {
            self.concepts.get(id).map(|c| c.kind.into())
        }
    }

    pub fn contains(&self, id: &Iri) -> bool {
        self.kind_of(id).is_some()
    }

    /// Add an association unless the same link already exists. Returns `true` if added.
    pub fn associate(&mut self, association: Association) -> bool {
        if self.has_association(association.kind, &association.class, &association.target) {
            return false;
        }
        self.associations.push(association);
        true
    }

    pub fn has_association(&self, kind: AssociationKind, class: &Iri, target: &Iri) -> bool {
        self.associations
            .iter()
            .any(|a| a.kind == kind && &a.class == class && &a.target == target)
    }

    /// Distinct targets of one association kind on a class (direct only)
    pub fn associated(&self, class: &Iri, kind: AssociationKind) -> BTreeSet<&Iri> {
        self.associations
            .iter()
            .filter(|a| a.kind == kind && &a.class == class)
            .map(|a| &a.target)
            .collect()
    }

    /// class -> parents, restricted to parents that are classes of this taxonomy
    pub fn class_hierarchy(&self) -> Edges {
        self.classes
            .iter()
            .map(|(id, node)| {
                let parents = node.parents.iter().filter(|p| self.classes.contains_key(*p)).cloned().collect();
                (id.clone(), parents)
            })
            .collect()
    }

    pub fn property_hierarchy(&self) -> Edges {
        self.properties
            .iter()
            .map(|(id, node)| {
                let parents = node.parents.iter().filter(|p| self.properties.contains_key(*p)).cloned().collect();
                (id.clone(), parents)
            })
            .collect()
    }

    pub fn concept_hierarchy(&self) -> Edges {
        self.concepts
            .iter()
            .map(|(id, node)| {
                let broader = node.broader.iter().filter(|p| self.concepts.contains_key(*p)).cloned().collect();
                (id.clone(), broader)
            })
            .collect()
    }

    /// Deprecated class -> replacement
    pub fn replacement_edges(&self) -> Edges {
        self.classes
            .iter()
            .filter_map(|(id, node)| {
                node.deprecation
                    .as_ref()
                    .map(|d| (id.clone(), BTreeSet::from([d.replaced_by.clone()])))
            })
            .collect()
    }

    /// Reflexive-transitive subclasses of `root`
    pub fn subclasses_of(&self, root: &Iri) -> BTreeSet<Iri> {
        if !self.classes.contains_key(root) {
            return BTreeSet::new();
        }
        hierarchy::descendants(&self.class_hierarchy(), root)
    }

    /// Reflexive-transitive superclasses of `class`
    pub fn superclasses_of(&self, class: &Iri) -> BTreeSet<Iri> {
        hierarchy::ancestors(&self.class_hierarchy(), class)
    }
}
