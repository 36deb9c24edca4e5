//! Nested (YAML / JSON) definition documents.
//!
//! Nesting carries hierarchy: a class listed under `subclasses` has the
//! enclosing class as an implicit parent, a property under `subproperties`
//! the enclosing property, and a concept under `narrower` the enclosing
//! concept as `broader`. A concept under `related` is related to the
//! enclosing one. A class nested under several parents folds into one
//! record holding all of them.

use crate::error::SchemaError;
use crate::ir::*;
use crate::fold::fold;
use crate::loader::{malformed, DefinitionLoader};
use crate::symbols::SymbolTable;
use brickc_core::model::Iri;
use brickc_core::{vocabulary, PrefixMap};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestedFormat {
    Yaml,
    Json,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "override")]
    override_permitted: bool,
    #[serde(default)]
    classes: BTreeMap<String, Option<NestedClass>>,
    #[serde(default)]
    properties: BTreeMap<String, Option<NestedProperty>>,
    #[serde(default)]
    entity_properties: BTreeMap<String, Option<NestedProperty>>,
    #[serde(default)]
    tags: BTreeMap<String, Option<NestedTag>>,
    #[serde(default)]
    quantities: BTreeMap<String, Option<NestedConcept>>,
    #[serde(default)]
    substances: BTreeMap<String, Option<NestedConcept>>,
    #[serde(default)]
    deprecations: BTreeMap<String, NestedDeprecation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NestedClass {
    label: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    substances: Vec<String>,
    #[serde(default)]
    quantities: Vec<String>,
    #[serde(default)]
    equivalent: Vec<String>,
    #[serde(default)]
    disjoint: Vec<String>,
    definition: Option<String>,
    #[serde(default)]
    see_also: Vec<String>,
    /// property -> accepted value class(es)
    #[serde(default)]
    constraints: BTreeMap<String, OneOrMany>,
    #[serde(default)]
    subclasses: BTreeMap<String, Option<NestedClass>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn tokens(&self) -> &[String] {
        match self {
            OneOrMany::One(token) => std::slice::from_ref(token),
            OneOrMany::Many(tokens) => tokens,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NestedProperty {
    label: Option<String>,
    #[serde(default)]
    domain: Vec<String>,
    range: Option<String>,
    range_kind: Option<RangeKind>,
    inverse: Option<String>,
    #[serde(default)]
    symmetric: bool,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    property_of: Vec<String>,
    definition: Option<String>,
    #[serde(default)]
    subproperties: BTreeMap<String, Option<NestedProperty>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NestedTag {
    label: Option<String>,
    #[serde(default)]
    classes: Vec<String>,
    definition: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NestedConcept {
    label: Option<String>,
    #[serde(default)]
    broader: Vec<String>,
    definition: Option<String>,
    #[serde(default)]
    narrower: BTreeMap<String, Option<NestedConcept>>,
    #[serde(default)]
    related: BTreeMap<String, Option<NestedConcept>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NestedDeprecation {
    version: String,
    replace_with: String,
    mitigation_message: Option<String>,
    mitigation_rule: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
}

/// YAML / JSON definition loader
pub struct NestedLoader<'a> {
    prefixes: &'a PrefixMap,
    format: NestedFormat,
}

impl<'a> NestedLoader<'a> {
    pub fn new(symbols: &'a SymbolTable, format: NestedFormat) -> Self {
        Self {
            prefixes: symbols.prefixes(),
            format,
        }
    }
}

impl DefinitionLoader for NestedLoader<'_> {
    fn load_str(&self, name: &str, content: &str) -> Result<DefinitionSet, SchemaError> {
        let document: Document = match self.format {
            NestedFormat::Yaml => {
                if content.trim().is_empty() {
                    Document::default()
                } else {
                    serde_yaml::from_str(content).map_err(|e| {
                        let line = e.location().map(|l| l.line()).unwrap_or(0);
                        malformed(name, line, "document", e.to_string())
                    })?
                }
            }
            NestedFormat::Json => {
                serde_json::from_str(content).map_err(|e| malformed(name, e.line(), "document", e.to_string()))?
            }
        };

        let mut flattener = Flattener {
            prefixes: self.prefixes,
            source: name.to_string(),
            next_record: 0,
            set: DefinitionSet::new(document.name.clone().unwrap_or_else(|| name.to_string())),
        };
        flattener.set.override_permitted = document.override_permitted;

        for (id, class) in &document.classes {
            flattener.class(id, class.as_ref(), None)?;
        }
        for (id, property) in &document.properties {
            flattener.property(id, property.as_ref(), PropertyKind::Relationship, None)?;
        }
        for (id, property) in &document.entity_properties {
            flattener.property(id, property.as_ref(), PropertyKind::EntityProperty, None)?;
        }
        for (id, tag) in &document.tags {
            flattener.tag(id, tag.as_ref())?;
        }
        for (id, concept) in &document.quantities {
            flattener.concept(id, concept.as_ref(), ConceptKind::Quantity, Enclosing::None)?;
        }
        for (id, concept) in &document.substances {
            flattener.concept(id, concept.as_ref(), ConceptKind::Substance, Enclosing::None)?;
        }
        for (id, deprecation) in &document.deprecations {
            flattener.deprecation(id, deprecation)?;
        }

        let set = fold(flattener.set)?;
        debug!(source = name, records = set.record_count(), "loaded nested definitions");
        Ok(set)
    }
}

/// How a nested concept relates to the one it is listed under
#[derive(Clone, Copy)]
enum Enclosing<'i> {
    None,
    Broader(&'i Iri),
    Related(&'i Iri),
}

struct Flattener<'a> {
    prefixes: &'a PrefixMap,
    source: String,
    next_record: usize,
    set: DefinitionSet,
}

impl Flattener<'_> {
    fn origin(&mut self) -> Origin {
        self.next_record += 1;
        Origin::new(self.source.clone(), self.next_record)
    }

    fn iri(&self, origin: &Origin, field: &str, token: &str, default_ns: &str) -> Result<Iri, SchemaError> {
        self.prefixes
            .resolve(token, default_ns)
            .map_err(|e| malformed(&origin.source, origin.record, field, e.to_string()))
    }

    fn iris(&self, origin: &Origin, field: &str, tokens: &[String], default_ns: &str) -> Result<Vec<Iri>, SchemaError> {
        tokens.iter().map(|t| self.iri(origin, field, t, default_ns)).collect()
    }

    fn class(&mut self, id: &str, class: Option<&NestedClass>, parent: Option<&Iri>) -> Result<(), SchemaError> {
        let origin = self.origin();
        let empty = NestedClass::default();
        let class = class.unwrap_or(&empty);

        let iri = self.iri(&origin, "id", id, vocabulary::BRICK)?;
        let mut def = ClassDef::new(iri.clone(), origin.clone());
        def.label = class.label.clone();
        def.parents = self.iris(&origin, "parents", &class.parents, vocabulary::BRICK)?;
        if let Some(parent) = parent {
            if !def.parents.contains(parent) {
                def.parents.insert(0, parent.clone());
            }
        }
        def.tags = self.iris(&origin, "tags", &class.tags, vocabulary::TAG)?;
        def.substances = self.iris(&origin, "substances", &class.substances, vocabulary::BRICK)?;
        def.quantities = self.iris(&origin, "quantities", &class.quantities, vocabulary::BRICK)?;
        def.equivalent = self.iris(&origin, "equivalent", &class.equivalent, vocabulary::BRICK)?;
        def.disjoint = self.iris(&origin, "disjoint", &class.disjoint, vocabulary::BRICK)?;
        def.definition = class.definition.clone();
        def.see_also = class.see_also.clone();
        for (path, classes) in &class.constraints {
            def.constraints.push(ConstraintDef {
                path: self.iri(&origin, "constraints", path, vocabulary::BRICK)?,
                classes: self.iris(&origin, "constraints", classes.tokens(), vocabulary::BRICK)?,
            });
        }
        self.set.classes.push(def);

        for (child, body) in &class.subclasses {
            self.class(child, body.as_ref(), Some(&iri))?;
        }
        Ok(())
    }

    fn property(
        &mut self,
        id: &str,
        property: Option<&NestedProperty>,
        kind: PropertyKind,
        parent: Option<&Iri>,
    ) -> Result<(), SchemaError> {
        let origin = self.origin();
        let empty = NestedProperty::default();
        let property = property.unwrap_or(&empty);

        let iri = self.iri(&origin, "id", id, vocabulary::BRICK)?;
        let mut def = PropertyDef::new(iri.clone(), kind, origin.clone());
        def.label = property.label.clone();
        def.domain = self.iris(&origin, "domain", &property.domain, vocabulary::BRICK)?;
        let range_kind = property.range_kind.unwrap_or(match kind {
            PropertyKind::Relationship => RangeKind::Class,
            PropertyKind::EntityProperty => RangeKind::Shape,
        });
        let range_ns = match range_kind {
            RangeKind::Class => vocabulary::BRICK,
            RangeKind::Shape => vocabulary::BSH,
        };
        def.range = match &property.range {
            Some(token) => Some(RangeDef {
                target: self.iri(&origin, "range", token, range_ns)?,
                kind: range_kind,
            }),
            None => None,
        };
        def.inverse = match &property.inverse {
            Some(token) => Some(self.iri(&origin, "inverse", token, vocabulary::BRICK)?),
            None => None,
        };
        def.symmetric = property.symmetric;
        def.parents = self.iris(&origin, "parents", &property.parents, vocabulary::BRICK)?;
        if let Some(parent) = parent {
            if !def.parents.contains(parent) {
                def.parents.insert(0, parent.clone());
            }
        }
        def.property_of = self.iris(&origin, "property_of", &property.property_of, vocabulary::BRICK)?;
        def.definition = property.definition.clone();
        self.set.properties.push(def);

        for (child, body) in &property.subproperties {
            self.property(child, body.as_ref(), kind, Some(&iri))?;
        }
        Ok(())
    }

    fn tag(&mut self, id: &str, tag: Option<&NestedTag>) -> Result<(), SchemaError> {
        let origin = self.origin();
        let empty = NestedTag::default();
        let tag = tag.unwrap_or(&empty);
        let def = TagDef {
            id: self.iri(&origin, "id", id, vocabulary::TAG)?,
            label: tag.label.clone(),
            classes: self.iris(&origin, "classes", &tag.classes, vocabulary::BRICK)?,
            definition: tag.definition.clone(),
            origin,
        };
        self.set.tags.push(def);
        Ok(())
    }

    fn concept(
        &mut self,
        id: &str,
        concept: Option<&NestedConcept>,
        kind: ConceptKind,
        enclosing: Enclosing<'_>,
    ) -> Result<(), SchemaError> {
        let origin = self.origin();
        let empty = NestedConcept::default();
        let concept = concept.unwrap_or(&empty);

        let iri = self.iri(&origin, "id", id, vocabulary::BRICK)?;
        let mut broader = self.iris(&origin, "broader", &concept.broader, vocabulary::BRICK)?;
        let mut related = Vec::new();
        match enclosing {
            Enclosing::Broader(b) if !broader.contains(b) => broader.insert(0, b.clone()),
            Enclosing::Related(r) => related.push(r.clone()),
            _ => {}
        }
        self.set.concepts.push(ConceptDef {
            id: iri.clone(),
            kind,
            label: concept.label.clone(),
            broader,
            related,
            definition: concept.definition.clone(),
            origin,
        });

        for (child, body) in &concept.narrower {
            self.concept(child, body.as_ref(), kind, Enclosing::Broader(&iri))?;
        }
        for (child, body) in &concept.related {
            self.concept(child, body.as_ref(), kind, Enclosing::Related(&iri))?;
        }
        Ok(())
    }

    fn deprecation(&mut self, id: &str, deprecation: &NestedDeprecation) -> Result<(), SchemaError> {
        let origin = self.origin();
        let def = DeprecationDef {
            id: self.iri(&origin, "id", id, vocabulary::BRICK)?,
            replaced_by: self.iri(&origin, "replace_with", &deprecation.replace_with, vocabulary::BRICK)?,
            version: deprecation.version.clone(),
            message: deprecation.mitigation_message.clone(),
            mitigation_rule: match &deprecation.mitigation_rule {
                Some(token) => Some(self.iri(&origin, "mitigation_rule", token, vocabulary::BSH)?),
                None => None,
            },
            parents: self.iris(&origin, "parents", &deprecation.parents, vocabulary::BRICK)?,
            origin,
        };
        self.set.deprecations.push(def);
        Ok(())
    }
}
