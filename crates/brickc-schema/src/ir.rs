//! Intermediate representation produced by the definition loaders.
//!
//! Identifiers are already expanded to absolute IRIs; whether they name
//! anything is decided later by the taxonomy builder.

use brickc_core::model::Iri;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a record came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Origin {
    /// Source name (file name or set name)
    pub source: String,
    /// 1-based record number inside the source
    pub record: usize,
}

impl Origin {
    pub fn new(source: impl Into<String>, record: usize) -> Self {
        Self {
            source: source.into(),
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub id: Iri,
    pub label: Option<String>,
    pub parents: Vec<Iri>,
    pub tags: Vec<Iri>,
    pub substances: Vec<Iri>,
    pub quantities: Vec<Iri>,
    pub equivalent: Vec<Iri>,
    pub disjoint: Vec<Iri>,
    pub definition: Option<String>,
    pub see_also: Vec<String>,
    /// Property shapes every instance must satisfy
    pub constraints: Vec<ConstraintDef>,
    pub origin: Origin,
}

/// Values of `path` must be instances of one of `classes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDef {
    pub path: Iri,
    pub classes: Vec<Iri>,
}

impl ClassDef {
    pub fn new(id: Iri, origin: Origin) -> Self {
        Self {
            id,
            label: None,
            parents: Vec::new(),
            tags: Vec::new(),
            substances: Vec::new(),
            quantities: Vec::new(),
            equivalent: Vec::new(),
            disjoint: Vec::new(),
            definition: None,
            see_also: Vec::new(),
            constraints: Vec::new(),
            origin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Object property between entities
    Relationship,
    /// Entity-scoped property whose values are shapes
    EntityProperty,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Relationship => write!(f, "relationship"),
            PropertyKind::EntityProperty => write!(f, "entity_property"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    Class,
    Shape,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RangeDef {
    pub target: Iri,
    pub kind: RangeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub id: Iri,
    pub label: Option<String>,
    pub kind: PropertyKind,
    pub domain: Vec<Iri>,
    pub range: Option<RangeDef>,
    pub inverse: Option<Iri>,
    pub symmetric: bool,
    pub parents: Vec<Iri>,
    /// Entity properties: the shapes that accept this property
    pub property_of: Vec<Iri>,
    pub definition: Option<String>,
    pub origin: Origin,
}

impl PropertyDef {
    pub fn new(id: Iri, kind: PropertyKind, origin: Origin) -> Self {
        Self {
            id,
            label: None,
            kind,
            domain: Vec::new(),
            range: None,
            inverse: None,
            symmetric: false,
            parents: Vec::new(),
            property_of: Vec::new(),
            definition: None,
            origin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDef {
    pub id: Iri,
    pub label: Option<String>,
    /// Classes this tag is associated with
    pub classes: Vec<Iri>,
    pub definition: Option<String>,
    pub origin: Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptKind {
    Quantity,
    Substance,
}

/// Quantity or substance concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptDef {
    pub id: Iri,
    pub kind: ConceptKind,
    pub label: Option<String>,
    pub broader: Vec<Iri>,
    /// `skos:related` concepts; the link is symmetric
    pub related: Vec<Iri>,
    pub definition: Option<String>,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationDef {
    pub id: Iri,
    pub replaced_by: Iri,
    pub version: String,
    pub message: Option<String>,
    pub mitigation_rule: Option<Iri>,
    /// Parents to keep for the deprecated class when it has no class record
    pub parents: Vec<Iri>,
    pub origin: Origin,
}

/// All records of one definition source (or one directory of sources)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionSet {
    pub name: String,
    /// Extension sets only: redefinitions replace the base value instead of colliding
    pub override_permitted: bool,
    pub classes: Vec<ClassDef>,
    pub properties: Vec<PropertyDef>,
    pub tags: Vec<TagDef>,
    pub concepts: Vec<ConceptDef>,
    pub deprecations: Vec<DeprecationDef>,
}

impl DefinitionSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append another set's records
    pub fn extend(&mut self, other: DefinitionSet) {
        self.classes.extend(other.classes);
        self.properties.extend(other.properties);
        self.tags.extend(other.tags);
        self.concepts.extend(other.concepts);
        self.deprecations.extend(other.deprecations);
    }

    /// Sort every record list by identifier
    pub fn sort(&mut self) {
        self.classes.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.origin.cmp(&b.origin)));
        self.properties.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.origin.cmp(&b.origin)));
        self.tags.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.origin.cmp(&b.origin)));
        self.concepts.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.origin.cmp(&b.origin)));
        self.deprecations.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.origin.cmp(&b.origin)));
    }

    pub fn record_count(&self) -> usize {
        self.classes.len() + self.properties.len() + self.tags.len() + self.concepts.len() + self.deprecations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}
