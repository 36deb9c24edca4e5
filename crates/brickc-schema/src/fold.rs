//! Folding of restated records.
//!
//! Base definitions may be spread over several sources, and a nested
//! document may list one class under more than one parent. Records that
//! share an identifier fold into one: list attributes are unioned, while
//! label, definition and the other single-valued attributes must agree
//! wherever more than one record states them.

use crate::error::SchemaError;
use crate::ir::*;
use crate::loader::malformed;
use brickc_core::model::Iri;
use tracing::debug;

/// Records that can be folded by identifier
trait Keyed {
    fn key(&self) -> &Iri;
}

impl Keyed for ClassDef {
    fn key(&self) -> &Iri {
        &self.id
    }
}

impl Keyed for PropertyDef {
    fn key(&self) -> &Iri {
        &self.id
    }
}

impl Keyed for TagDef {
    fn key(&self) -> &Iri {
        &self.id
    }
}

impl Keyed for ConceptDef {
    fn key(&self) -> &Iri {
        &self.id
    }
}

impl Keyed for DeprecationDef {
    fn key(&self) -> &Iri {
        &self.id
    }
}

fn conflict(field: &str, first: &Origin, later: &Origin, kept: &str, restated: &str) -> SchemaError {
    malformed(
        &later.source,
        later.record,
        field,
        format!(
            "conflicts with {} record {}: '{}' vs '{}'",
            first.source, first.record, kept, restated
        ),
    )
}

/// Append the values `current` does not hold yet
fn union<T: Clone + PartialEq>(current: &mut Vec<T>, incoming: Vec<T>) {
    let known = current.clone();
    current.extend(incoming.into_iter().filter(|v| !known.contains(v)));
}

fn agree<T: PartialEq>(
    field: &str,
    current: &mut Option<T>,
    incoming: Option<T>,
    show: fn(&T) -> String,
    first: &Origin,
    later: &Origin,
) -> Result<(), SchemaError> {
    let Some(value) = incoming else {
        return Ok(());
    };
    if let Some(existing) = current.as_ref() {
        if *existing != value {
            return Err(conflict(field, first, later, &show(existing), &show(&value)));
        }
        return Ok(());
    }
    *current = Some(value);
    Ok(())
}

fn show_text(value: &String) -> String {
    value.clone()
}

fn show_iri(value: &Iri) -> String {
    value.to_string()
}

/// Merge consecutive records with the same key; input must be sorted by key
fn fold_records<T: Keyed>(
    records: Vec<T>,
    merge: fn(&mut T, T) -> Result<(), SchemaError>,
) -> Result<(Vec<T>, usize), SchemaError> {
    let mut out: Vec<T> = Vec::with_capacity(records.len());
    let mut folded = 0;
    for record in records {
        let restated = out.last().map(|current| current.key() == record.key()).unwrap_or(false);
        match out.last_mut() {
            Some(current) if restated => {
                merge(current, record)?;
                folded += 1;
            }
            _ => out.push(record),
        }
    }
    Ok((out, folded))
}

fn fold_class(current: &mut ClassDef, incoming: ClassDef) -> Result<(), SchemaError> {
    let first = current.origin.clone();
    let later = &incoming.origin;
    agree("label", &mut current.label, incoming.label, show_text, &first, later)?;
    agree("definition", &mut current.definition, incoming.definition, show_text, &first, later)?;
    union(&mut current.parents, incoming.parents);
    union(&mut current.tags, incoming.tags);
    union(&mut current.substances, incoming.substances);
    union(&mut current.quantities, incoming.quantities);
    union(&mut current.equivalent, incoming.equivalent);
    union(&mut current.disjoint, incoming.disjoint);
    union(&mut current.see_also, incoming.see_also);
    for constraint in incoming.constraints {
        match current.constraints.iter_mut().find(|c| c.path == constraint.path) {
            Some(existing) => union(&mut existing.classes, constraint.classes),
            None => current.constraints.push(constraint),
        }
    }
    Ok(())
}

fn fold_property(current: &mut PropertyDef, incoming: PropertyDef) -> Result<(), SchemaError> {
    let first = current.origin.clone();
    let later = &incoming.origin;
    if current.kind != incoming.kind {
        return Err(conflict(
            "property_kind",
            &first,
            later,
            &current.kind.to_string(),
            &incoming.kind.to_string(),
        ));
    }
    agree("label", &mut current.label, incoming.label, show_text, &first, later)?;
    agree("range", &mut current.range, incoming.range, |r: &RangeDef| r.target.to_string(), &first, later)?;
    agree("inverse", &mut current.inverse, incoming.inverse, show_iri, &first, later)?;
    agree("definition", &mut current.definition, incoming.definition, show_text, &first, later)?;
    current.symmetric |= incoming.symmetric;
    union(&mut current.domain, incoming.domain);
    union(&mut current.parents, incoming.parents);
    union(&mut current.property_of, incoming.property_of);
    Ok(())
}

fn fold_tag(current: &mut TagDef, incoming: TagDef) -> Result<(), SchemaError> {
    let first = current.origin.clone();
    let later = &incoming.origin;
    agree("label", &mut current.label, incoming.label, show_text, &first, later)?;
    agree("definition", &mut current.definition, incoming.definition, show_text, &first, later)?;
    union(&mut current.classes, incoming.classes);
    Ok(())
}

fn fold_concept(current: &mut ConceptDef, incoming: ConceptDef) -> Result<(), SchemaError> {
    let first = current.origin.clone();
    let later = &incoming.origin;
    if current.kind != incoming.kind {
        let show = |kind: ConceptKind| match kind {
            ConceptKind::Quantity => "quantity",
            ConceptKind::Substance => "substance",
        };
        return Err(conflict("kind", &first, later, show(current.kind), show(incoming.kind)));
    }
    agree("label", &mut current.label, incoming.label, show_text, &first, later)?;
    agree("definition", &mut current.definition, incoming.definition, show_text, &first, later)?;
    union(&mut current.broader, incoming.broader);
    union(&mut current.related, incoming.related);
    Ok(())
}

fn fold_deprecation(current: &mut DeprecationDef, incoming: DeprecationDef) -> Result<(), SchemaError> {
    let first = current.origin.clone();
    let later = &incoming.origin;
    if current.replaced_by != incoming.replaced_by {
        return Err(conflict(
            "replaced_by",
            &first,
            later,
            current.replaced_by.as_str(),
            incoming.replaced_by.as_str(),
        ));
    }
    if current.version != incoming.version {
        return Err(conflict("deprecated_in", &first, later, &current.version, &incoming.version));
    }
    agree("mitigation_message", &mut current.message, incoming.message, show_text, &first, later)?;
    agree("mitigation_rule", &mut current.mitigation_rule, incoming.mitigation_rule, show_iri, &first, later)?;
    union(&mut current.parents, incoming.parents);
    Ok(())
}

/// Fold every record restated under the same identifier. The result is sorted
/// and each folded record keeps the origin of its earliest statement.
pub fn fold(mut set: DefinitionSet) -> Result<DefinitionSet, SchemaError> {
    set.sort();
    let (classes, c) = fold_records(std::mem::take(&mut set.classes), fold_class)?;
    let (properties, p) = fold_records(std::mem::take(&mut set.properties), fold_property)?;
    let (tags, t) = fold_records(std::mem::take(&mut set.tags), fold_tag)?;
    let (concepts, q) = fold_records(std::mem::take(&mut set.concepts), fold_concept)?;
    let (deprecations, d) = fold_records(std::mem::take(&mut set.deprecations), fold_deprecation)?;
    set.classes = classes;
    set.properties = properties;
    set.tags = tags;
    set.concepts = concepts;
    set.deprecations = deprecations;

    let folded = c + p + t + q + d;
    if folded > 0 {
        debug!(set = %set.name, folded, "folded restated records");
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickc_core::vocabulary;

    fn brick(local: &str) -> Iri {
        Iri::new_unchecked(vocabulary::brick(local))
    }

    fn class(local: &str, source: &str, parents: &[&str]) -> ClassDef {
        let mut def = ClassDef::new(brick(local), Origin::new(source, 1));
        def.parents = parents.iter().map(|p| brick(p)).collect();
        def
    }

    #[test]
    fn test_restated_class_unions_lists() {
        let mut tabular = class("Meter", "core.csv", &["Equipment"]);
        tabular.tags = vec![Iri::new_unchecked(vocabulary::tag("Meter"))];
        tabular.label = Some("Meter".to_string());
        let mut nested = class("Meter", "meters.yaml", &["Equipment", "Point"]);
        nested.substances = vec![brick("Water")];
        nested.tags = vec![Iri::new_unchecked(vocabulary::tag("Meter"))];
        nested.label = Some("Meter".to_string());

        let mut set = DefinitionSet::new("base");
        set.classes = vec![nested, tabular];
        let set = fold(set).unwrap();

        assert_eq!(set.classes.len(), 1);
        let meter = &set.classes[0];
        assert_eq!(meter.parents, vec![brick("Equipment"), brick("Point")]);
        assert_eq!(meter.tags.len(), 1);
        assert_eq!(meter.substances, vec![brick("Water")]);
        assert_eq!(meter.origin.source, "core.csv");
    }

    #[test]
    fn test_contradicting_label_is_malformed() {
        let mut first = class("Meter", "a.csv", &[]);
        first.label = Some("Meter".to_string());
        let mut second = class("Meter", "b.yaml", &[]);
        second.label = Some("Metre".to_string());

        let mut set = DefinitionSet::new("base");
        set.classes = vec![first, second];
        match fold(set).unwrap_err() {
            SchemaError::MalformedDefinition { origin, field, reason, .. } => {
                assert_eq!(origin, "b.yaml");
                assert_eq!(field, "label");
                assert!(reason.contains("a.csv record 1"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unset_label_does_not_conflict() {
        let mut first = class("Meter", "a.csv", &[]);
        first.label = Some("Meter".to_string());
        let second = class("Meter", "b.yaml", &["Equipment"]);

        let mut set = DefinitionSet::new("base");
        set.classes = vec![first, second];
        let set = fold(set).unwrap();
        assert_eq!(set.classes[0].label.as_deref(), Some("Meter"));
        assert_eq!(set.classes[0].parents, vec![brick("Equipment")]);
    }

    #[test]
    fn test_constraints_merge_per_path() {
        let mut first = class("AHU", "a.yaml", &[]);
        first.constraints = vec![ConstraintDef {
            path: brick("hasPart"),
            classes: vec![brick("Fan")],
        }];
        let mut second = class("AHU", "b.yaml", &[]);
        second.constraints = vec![
            ConstraintDef {
                path: brick("hasPart"),
                classes: vec![brick("Damper")],
            },
            ConstraintDef {
                path: brick("feeds"),
                classes: vec![brick("VAV")],
            },
        ];

        let mut set = DefinitionSet::new("base");
        set.classes = vec![first, second];
        let set = fold(set).unwrap();
        let constraints = &set.classes[0].constraints;
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].classes, vec![brick("Fan"), brick("Damper")]);
    }

    #[test]
    fn test_property_kind_change_is_malformed() {
        let mut set = DefinitionSet::new("base");
        set.properties = vec![
            PropertyDef::new(brick("area"), PropertyKind::EntityProperty, Origin::new("a.yaml", 1)),
            PropertyDef::new(brick("area"), PropertyKind::Relationship, Origin::new("b.csv", 4)),
        ];
        let err = fold(set).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedDefinition { ref field, record: 4, .. } if field == "property_kind"));
    }

    #[test]
    fn test_deprecations_must_name_the_same_replacement() {
        let deprecation = |replacement: &str, source: &str| DeprecationDef {
            id: brick("Old_Meter"),
            replaced_by: brick(replacement),
            version: "1.3.0".to_string(),
            message: None,
            mitigation_rule: None,
            parents: vec![brick("Meter")],
            origin: Origin::new(source, 1),
        };

        let mut agreeing = DefinitionSet::new("base");
        agreeing.deprecations = vec![deprecation("Meter", "a.csv"), deprecation("Meter", "b.yaml")];
        assert_eq!(fold(agreeing).unwrap().deprecations.len(), 1);

        let mut clashing = DefinitionSet::new("base");
        clashing.deprecations = vec![deprecation("Meter", "a.csv"), deprecation("Water_Meter", "b.yaml")];
        let err = fold(clashing).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedDefinition { ref field, .. } if field == "replaced_by"));
    }
}
