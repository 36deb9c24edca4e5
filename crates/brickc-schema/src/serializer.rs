//! Canonical serializer and atomic artifact writer.
//!
//! Output depends only on the set of triples: subjects in identifier order,
//! predicates in a fixed rank order, objects sorted, prefixes sorted.

use crate::error::SchemaError;
use brickc_core::model::{escape_literal, Iri, Literal, Term, Triple};
use brickc_core::{vocabulary, PrefixMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Turtle,
    NTriples,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Turtle => "ttl",
            OutputFormat::NTriples => "nt",
        }
    }
}

/// Relations written right after the label, in this order
const RELATION_ORDER: &[&str] = &[
    vocabulary::RDFS_SUBCLASS_OF,
    vocabulary::RDFS_SUBPROPERTY_OF,
    vocabulary::OWL_EQUIVALENT_CLASS,
    vocabulary::OWL_INVERSE_OF,
    vocabulary::RDFS_DOMAIN,
    vocabulary::RDFS_RANGE,
    vocabulary::SKOS_BROADER,
    vocabulary::SKOS_NARROWER,
    vocabulary::BRICK_HAS_SUBSTANCE,
    vocabulary::BRICK_HAS_QUANTITY,
    vocabulary::BRICK_IS_REPLACED_BY,
];

/// Tag associations close every subject block
const TRAILING: &[&str] = &[vocabulary::BRICK_HAS_ASSOCIATED_TAG, vocabulary::BRICK_HAS_TAG];

const OTHER_RANK: usize = 100;

fn predicate_rank(predicate: &Iri) -> usize {
    let p = predicate.as_str();
    if p == vocabulary::RDF_TYPE {
        return 0;
    }
    if p == vocabulary::RDFS_LABEL {
        return 1;
    }
    if let Some(i) = RELATION_ORDER.iter().position(|r| *r == p) {
        return 2 + i;
    }
    match TRAILING.iter().position(|r| *r == p) {
        Some(i) => OTHER_RANK + 1 + i,
        None => OTHER_RANK,
    }
}

/// Booleans and integers are written without quotes or datatype
fn bare_literal(lit: &Literal) -> bool {
    match lit.datatype.as_ref().map(|d| d.as_str()) {
        Some(vocabulary::XSD_BOOLEAN) => lit.lexical == "true" || lit.lexical == "false",
        Some(vocabulary::XSD_INTEGER) => !lit.lexical.is_empty() && lit.lexical.bytes().all(|b| b.is_ascii_digit()),
        _ => false,
    }
}

pub struct CanonicalSerializer<'a> {
    prefixes: &'a PrefixMap,
}

impl<'a> CanonicalSerializer<'a> {
    pub fn new(prefixes: &'a PrefixMap) -> Self {
        Self { prefixes }
    }

    pub fn serialize(&self, triples: &[Triple], format: OutputFormat) -> String {
        match format {
            OutputFormat::Turtle => self.to_turtle(triples),
            OutputFormat::NTriples => to_ntriples(triples),
        }
    }

    pub fn to_turtle(&self, triples: &[Triple]) -> String {
        let mut used = BTreeSet::new();
        let mut subjects: BTreeMap<&Term, BTreeMap<(usize, &Iri), BTreeSet<&Term>>> = BTreeMap::new();
        for t in triples {
            self.note_prefixes(&t.subject, &mut used);
            // `a` needs no prefix
            if t.predicate.as_str() != vocabulary::RDF_TYPE {
                self.note_iri(&t.predicate, &mut used);
            }
            self.note_prefixes(&t.object, &mut used);
            subjects
                .entry(&t.subject)
                .or_default()
                .entry((predicate_rank(&t.predicate), &t.predicate))
                .or_default()
                .insert(&t.object);
        }

        let mut out = String::new();
        for prefix in &used {
            if let Some(ns) = self.prefixes.namespace(prefix) {
                out.push_str(&format!("@prefix {}: <{}> .\n", prefix, ns));
            }
        }

        for (subject, predicates) in subjects {
            out.push('\n');
            out.push_str(&self.term(subject));
            let blocks: Vec<String> = predicates
                .into_iter()
                .map(|((_, predicate), objects)| {
                    let objects: Vec<String> = objects.into_iter().map(|o| self.term(o)).collect();
                    format!("{} {}", self.predicate(predicate), objects.join(",\n        "))
                })
                .collect();
            out.push(' ');
            out.push_str(&blocks.join(" ;\n    "));
            out.push_str(" .\n");
        }
        out
    }

    fn note_iri(&self, iri: &Iri, used: &mut BTreeSet<String>) {
        if let Some(compact) = self.prefixes.compact(iri) {
            if let Some((prefix, _)) = compact.split_once(':') {
                used.insert(prefix.to_string());
            }
        }
    }

    fn note_prefixes(&self, term: &Term, used: &mut BTreeSet<String>) {
        match term {
            Term::Iri(iri) => self.note_iri(iri, used),
            Term::Literal(lit) if !bare_literal(lit) => {
                if let Some(datatype) = &lit.datatype {
                    self.note_iri(datatype, used);
                }
            }
            _ => {}
        }
    }

    fn iri(&self, iri: &Iri) -> String {
        self.prefixes.compact(iri).unwrap_or_else(|| format!("<{}>", iri))
    }

    fn predicate(&self, predicate: &Iri) -> String {
        if predicate.as_str() == vocabulary::RDF_TYPE {
            "a".to_string()
        } else {
            self.iri(predicate)
        }
    }

    fn term(&self, term: &Term) -> String {
        match term {
            Term::Iri(iri) => self.iri(iri),
            Term::Blank(id) => format!("_:{}", id),
            Term::Literal(lit) => {
                if bare_literal(lit) {
                    return lit.lexical.clone();
                }
                let mut s = format!("\"{}\"", escape_literal(&lit.lexical));
                if let Some(lang) = &lit.lang {
                    s.push('@');
                    s.push_str(lang);
                } else if let Some(datatype) = &lit.datatype {
                    s.push_str("^^");
                    s.push_str(&self.iri(datatype));
                }
                s
            }
        }
    }
}

/// One statement per line, lines sorted
pub fn to_ntriples(triples: &[Triple]) -> String {
    let lines: BTreeSet<String> = triples.iter().map(|t| t.to_ntriples()).collect();
    let mut out = String::new();
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// A file the build wants to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

fn target_dir(path: &Path) -> &Path {
    path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."))
}

fn stage(artifact: &Artifact) -> Result<NamedTempFile, SchemaError> {
    let dir = target_dir(&artifact.path);
    std::fs::create_dir_all(dir).map_err(|e| SchemaError::io(dir, e))?;
    let mut file = NamedTempFile::new_in(dir).map_err(|e| SchemaError::io(dir, e))?;
    file.write_all(artifact.contents.as_bytes())
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| SchemaError::io(file.path(), e))?;
    Ok(file)
}

/// Write one file through a temporary sibling, replacing `path` only on success
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), SchemaError> {
    commit(&[Artifact::new(path, contents)])
}

/// Stage every artifact first; nothing is replaced unless all of them were written
pub fn commit(artifacts: &[Artifact]) -> Result<(), SchemaError> {
    let staged = artifacts.iter().map(stage).collect::<Result<Vec<_>, _>>()?;
    for (artifact, file) in artifacts.iter().zip(staged) {
        file.persist(&artifact.path)
            .map_err(|e| SchemaError::io(&artifact.path, e.error))?;
        debug!(path = %artifact.path.display(), bytes = artifact.contents.len(), "artifact written");
    }
    info!(artifacts = artifacts.len(), "artifacts committed");
    Ok(())
}
