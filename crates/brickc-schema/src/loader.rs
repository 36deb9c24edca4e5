//! Definition loaders.
//!
//! Tabular sources are CSV with one record per row; nested sources are YAML
//! or JSON documents (see [`crate::nested`]). Both produce a [`DefinitionSet`]
//! whose records are sorted by identifier. A row may not repeat an
//! identifier within its own file; records restated across sources are
//! folded (see [`crate::fold`]).

use crate::error::SchemaError;
use crate::fold::fold;
use crate::ir::*;
use crate::nested::{NestedFormat, NestedLoader};
use crate::symbols::SymbolTable;
use brickc_core::model::Iri;
use brickc_core::{vocabulary, PrefixMap};
use csv::StringRecord;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Loader for one source format
pub trait DefinitionLoader {
    /// Parse a source held in memory. `name` identifies the source in errors.
    fn load_str(&self, name: &str, content: &str) -> Result<DefinitionSet, SchemaError>;

    fn load_path(&self, path: &Path) -> Result<DefinitionSet, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        self.load_str(&source_name(path), &content)
    }
}

/// Columns accepted in tabular sources
pub const TABULAR_COLUMNS: &[&str] = &[
    "kind",
    "id",
    "label",
    "parents",
    "tags",
    "substances",
    "quantities",
    "equivalent",
    "disjoint",
    "definition",
    "see_also",
    "constraints",
    "domain",
    "range",
    "range_kind",
    "inverse",
    "symmetric",
    "property_kind",
    "property_of",
    "classes",
    "broader",
    "related",
    "replaced_by",
    "deprecated_in",
    "mitigation_message",
    "mitigation_rule",
];

/// CSV definition loader
pub struct TabularLoader<'a> {
    prefixes: &'a PrefixMap,
}

impl<'a> TabularLoader<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            prefixes: symbols.prefixes(),
        }
    }
}

impl DefinitionLoader for TabularLoader<'_> {
    fn load_str(&self, name: &str, content: &str) -> Result<DefinitionSet, SchemaError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| malformed(name, 0, "header", e.to_string()))?
            .clone();
        for column in headers.iter() {
            if !TABULAR_COLUMNS.contains(&column) {
                return Err(malformed(name, 0, column, "unknown column"));
            }
        }
        for required in ["kind", "id"] {
            if !headers.iter().any(|h| h == required) {
                return Err(malformed(name, 0, required, "missing required column"));
            }
        }

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| malformed(name, index + 1, "row", e.to_string()))?;
            rows.push((index + 1, record));
        }

        // process in identifier order so the first reported error does not depend on row order
        let id_column = headers.iter().position(|h| h == "id").unwrap_or(0);
        rows.sort_by(|a, b| a.1.get(id_column).cmp(&b.1.get(id_column)).then(a.0.cmp(&b.0)));

        let mut set = DefinitionSet::new(name);
        for (number, record) in &rows {
            let row = Row {
                headers: &headers,
                record,
                origin: Origin::new(name, *number),
                prefixes: self.prefixes,
            };
            row.load_into(&mut set)?;
        }

        check_duplicates(&set)?;
        set.sort();
        debug!(source = name, records = set.record_count(), "loaded tabular definitions");
        Ok(set)
    }
}

struct Row<'r> {
    headers: &'r StringRecord,
    record: &'r StringRecord,
    origin: Origin,
    prefixes: &'r PrefixMap,
}

impl Row<'_> {
    fn get(&self, column: &str) -> Option<&str> {
        let position = self.headers.iter().position(|h| h == column)?;
        self.record.get(position).map(str::trim).filter(|v| !v.is_empty())
    }

    fn list(&self, column: &str) -> Vec<&str> {
        self.get(column)
            .map(|v| v.split(';').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    fn error(&self, field: &str, reason: impl Into<String>) -> SchemaError {
        malformed(&self.origin.source, self.origin.record, field, reason)
    }

    fn iri(&self, field: &str, token: &str, default_ns: &str) -> Result<Iri, SchemaError> {
        self.prefixes
            .resolve(token, default_ns)
            .map_err(|e| self.error(field, e.to_string()))
    }

    fn iris(&self, field: &str, default_ns: &str) -> Result<Vec<Iri>, SchemaError> {
        self.list(field).into_iter().map(|t| self.iri(field, t, default_ns)).collect()
    }

    fn opt_iri(&self, field: &str, default_ns: &str) -> Result<Option<Iri>, SchemaError> {
        self.get(field).map(|t| self.iri(field, t, default_ns)).transpose()
    }

    fn text(&self, field: &str) -> Option<String> {
        self.get(field).map(str::to_string)
    }

    /// `path=Class|Class;path=Class`
    fn constraints(&self) -> Result<Vec<ConstraintDef>, SchemaError> {
        self.list("constraints")
            .into_iter()
            .map(|entry| {
                let (path, classes) = entry
                    .split_once('=')
                    .ok_or_else(|| self.error("constraints", format!("'{}' is not path=Class", entry)))?;
                let classes = classes
                    .split('|')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(|c| self.iri("constraints", c, vocabulary::BRICK))
                    .collect::<Result<Vec<_>, _>>()?;
                if classes.is_empty() {
                    return Err(self.error("constraints", format!("'{}' names no class", entry)));
                }
                Ok(ConstraintDef {
                    path: self.iri("constraints", path.trim(), vocabulary::BRICK)?,
                    classes,
                })
            })
            .collect()
    }

    fn load_into(&self, set: &mut DefinitionSet) -> Result<(), SchemaError> {
        let kind = self.get("kind").ok_or_else(|| self.error("kind", "missing value"))?;
        let id_token = self.get("id").ok_or_else(|| self.error("id", "missing value"))?;
        let default_ns = if kind == "tag" { vocabulary::TAG } else { vocabulary::BRICK };
        let id = self.iri("id", id_token, default_ns)?;

        match kind {
            "class" => {
                let mut class = ClassDef::new(id.clone(), self.origin.clone());
                class.label = self.text("label");
                class.parents = self.iris("parents", vocabulary::BRICK)?;
                class.tags = self.iris("tags", vocabulary::TAG)?;
                class.substances = self.iris("substances", vocabulary::BRICK)?;
                class.quantities = self.iris("quantities", vocabulary::BRICK)?;
                class.equivalent = self.iris("equivalent", vocabulary::BRICK)?;
                class.disjoint = self.iris("disjoint", vocabulary::BRICK)?;
                class.definition = self.text("definition");
                class.see_also = self.list("see_also").into_iter().map(str::to_string).collect();
                class.constraints = self.constraints()?;

                if let Some(replacement) = self.opt_iri("replaced_by", vocabulary::BRICK)? {
                    let version = self
                        .text("deprecated_in")
                        .ok_or_else(|| self.error("deprecated_in", "required when replaced_by is set"))?;
                    set.deprecations.push(DeprecationDef {
                        id,
                        replaced_by: replacement,
                        version,
                        message: self.text("mitigation_message"),
                        mitigation_rule: self.opt_iri("mitigation_rule", vocabulary::BSH)?,
                        parents: Vec::new(),
                        origin: self.origin.clone(),
                    });
                }
                set.classes.push(class);
            }
            "property" => {
                let property_kind = match self.get("property_kind") {
                    None | Some("relationship") => PropertyKind::Relationship,
                    Some("entity_property") => PropertyKind::EntityProperty,
                    Some(other) => {
                        return Err(self.error("property_kind", format!("unknown property kind '{}'", other)))
                    }
                };
                let mut property = PropertyDef::new(id, property_kind, self.origin.clone());
                property.label = self.text("label");
                property.domain = self.iris("domain", vocabulary::BRICK)?;
                let range_kind = match self.get("range_kind") {
                    None | Some("class") => RangeKind::Class,
                    Some("shape") => RangeKind::Shape,
                    Some(other) => return Err(self.error("range_kind", format!("unknown range kind '{}'", other))),
                };
                let range_ns = match range_kind {
                    RangeKind::Class => vocabulary::BRICK,
                    RangeKind::Shape => vocabulary::BSH,
                };
                property.range = self
                    .opt_iri("range", range_ns)?
                    .map(|target| RangeDef { target, kind: range_kind });
                property.inverse = self.opt_iri("inverse", vocabulary::BRICK)?;
                property.symmetric = match self.get("symmetric") {
                    None => false,
                    Some(value) => parse_bool(value).ok_or_else(|| {
                        self.error("symmetric", format!("'{}' is not a boolean", value))
                    })?,
                };
                property.parents = self.iris("parents", vocabulary::BRICK)?;
                property.property_of = self.iris("property_of", vocabulary::BRICK)?;
                property.definition = self.text("definition");
                set.properties.push(property);
            }
            "tag" => set.tags.push(TagDef {
                id,
                label: self.text("label"),
                classes: self.iris("classes", vocabulary::BRICK)?,
                definition: self.text("definition"),
                origin: self.origin.clone(),
            }),
            "quantity" | "substance" => set.concepts.push(ConceptDef {
                id,
                kind: if kind == "quantity" { ConceptKind::Quantity } else { ConceptKind::Substance },
                label: self.text("label"),
                broader: self.iris("broader", vocabulary::BRICK)?,
                related: self.iris("related", vocabulary::BRICK)?,
                definition: self.text("definition"),
                origin: self.origin.clone(),
            }),
            other => return Err(self.error("kind", format!("unknown record kind '{}'", other))),
        }
        Ok(())
    }
}

/// Accepts true/false, yes/no and 1/0
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub(crate) fn malformed(origin: &str, record: usize, field: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::MalformedDefinition {
        origin: origin.to_string(),
        record,
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Reject identifiers defined twice within one tabular source
fn check_duplicates(set: &DefinitionSet) -> Result<(), SchemaError> {
    let mut seen: BTreeMap<&Iri, &Origin> = BTreeMap::new();
    let entities = set
        .classes
        .iter()
        .map(|c| (&c.id, &c.origin))
        .chain(set.properties.iter().map(|p| (&p.id, &p.origin)))
        .chain(set.tags.iter().map(|t| (&t.id, &t.origin)))
        .chain(set.concepts.iter().map(|c| (&c.id, &c.origin)));

    let mut duplicates = Vec::new();
    for (id, origin) in entities {
        if let Some(first) = seen.insert(id, origin) {
            duplicates.push((id, origin, first));
        }
    }

    let mut deprecated: BTreeMap<&Iri, &Origin> = BTreeMap::new();
    for dep in &set.deprecations {
        if let Some(first) = deprecated.insert(&dep.id, &dep.origin) {
            duplicates.push((&dep.id, &dep.origin, first));
        }
    }

    duplicates.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(b.1)));
    match duplicates.first() {
        Some((id, origin, first)) => Err(malformed(
            &origin.source,
            origin.record,
            "id",
            format!(
                "duplicate identifier {} (first defined in {} record {})",
                id, first.source, first.record
            ),
        )),
        None => Ok(()),
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load one file or directory, choosing the loader from the file extension
pub fn load_source(path: &Path, symbols: &SymbolTable) -> Result<DefinitionSet, SchemaError> {
    if path.is_dir() {
        let mut entries: Vec<_> = std::fs::read_dir(path)
            .map_err(|e| SchemaError::io(path, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && loader_kind(p).is_some())
            .collect();
        entries.sort();

        let mut set = DefinitionSet::new(source_name(path));
        for entry in entries {
            let loaded = load_source(&entry, symbols)?;
            set.override_permitted |= loaded.override_permitted;
            set.extend(loaded);
        }
        return fold(set);
    }

    match loader_kind(path) {
        Some(SourceKind::Tabular) => TabularLoader::new(symbols).load_path(path),
        Some(SourceKind::Nested(format)) => NestedLoader::new(symbols, format).load_path(path),
        None => Err(malformed(
            &source_name(path),
            0,
            "path",
            "unsupported source type (expected .csv, .yaml, .yml or .json)",
        )),
    }
}

/// Load several sources into one set named `name`
pub fn load_sources(name: &str, paths: &[impl AsRef<Path>], symbols: &SymbolTable) -> Result<DefinitionSet, SchemaError> {
    let mut set = DefinitionSet::new(name);
    for path in paths {
        let loaded = load_source(path.as_ref(), symbols)?;
        set.override_permitted |= loaded.override_permitted;
        set.extend(loaded);
    }
    fold(set)
}

enum SourceKind {
    Tabular,
    Nested(NestedFormat),
}

fn loader_kind(path: &Path) -> Option<SourceKind> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "csv" => Some(SourceKind::Tabular),
        "yaml" | "yml" => Some(SourceKind::Nested(NestedFormat::Yaml)),
        "json" => Some(SourceKind::Nested(NestedFormat::Json)),
        _ => None,
    }
}
