//! Instance-graph fixtures: asserted facts plus the facts expected after
//! saturation.
//!
//! ```yaml
//! name: building_water_meter
//! prefixes:
//!   site: "urn:site#"
//! facts:
//!   - [site:m1, a, Water_Meter]
//!   - [site:m1, meters, site:bldg1]
//! expect:
//!   present:
//!     - [site:m1, a, Building_Water_Meter]
//! ```
//!
//! Bare names live in the Brick namespace, `a` is `rdf:type`, `"text"` is a
//! plain literal and `_:id` a blank node.

use crate::error::EngineError;
use brickc_core::model::{Iri, Term, Triple};
use brickc_core::{vocabulary, PrefixMap};
use brickc_store::{Provenance, RdfStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

type RawTriple = [String; 3];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawExpectations {
    present: Vec<RawTriple>,
    absent: Vec<RawTriple>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScenario {
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    prefixes: BTreeMap<String, String>,
    facts: Vec<RawTriple>,
    #[serde(default)]
    expect: RawExpectations,
}

/// A parsed fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub facts: Vec<Triple>,
    pub present: Vec<Triple>,
    pub absent: Vec<Triple>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, facts: Vec<Triple>) -> Self {
        Self {
            name: name.into(),
            description: None,
            facts,
            present: Vec::new(),
            absent: Vec::new(),
        }
    }

    pub fn expect_present(mut self, triple: Triple) -> Self {
        self.present.push(triple);
        self
    }

    pub fn expect_absent(mut self, triple: Triple) -> Self {
        self.absent.push(triple);
        self
    }

    /// The asserted facts as a fresh store
    pub fn store(&self) -> RdfStore {
        RdfStore::from_triples(self.facts.iter().cloned(), Provenance::asserted(self.name.clone()))
    }

    pub fn from_yaml(content: &str, path: &Path) -> Result<Self, EngineError> {
        let raw: RawScenario = serde_yaml::from_str(content).map_err(|e| EngineError::Scenario {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let name = raw.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "scenario".to_string())
        });

        let mut prefixes = PrefixMap::standard();
        for (prefix, namespace) in &raw.prefixes {
            prefixes.insert(prefix, namespace).map_err(|source| EngineError::Term {
                scenario: name.clone(),
                token: format!("{}: {}", prefix, namespace),
                source,
            })?;
        }
        let parser = TermParser {
            scenario: &name,
            prefixes: &prefixes,
        };

        if raw.facts.is_empty() {
            return Err(EngineError::Scenario {
                path: path.to_path_buf(),
                message: "no facts".to_string(),
            });
        }
        let facts = parser.triples(&raw.facts)?;
        let present = parser.triples(&raw.expect.present)?;
        let absent = parser.triples(&raw.expect.absent)?;
        Ok(Self {
            name,
            description: raw.description,
            facts,
            present,
            absent,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content, path)
    }
}

struct TermParser<'a> {
    scenario: &'a str,
    prefixes: &'a PrefixMap,
}

impl TermParser<'_> {
    fn iri(&self, token: &str) -> Result<Iri, EngineError> {
        if token == "a" {
            return Ok(Iri::new_unchecked(vocabulary::RDF_TYPE));
        }
        self.prefixes
            .resolve(token, vocabulary::BRICK)
            .map_err(|source| EngineError::Term {
                scenario: self.scenario.to_string(),
                token: token.to_string(),
                source,
            })
    }

    fn resource(&self, token: &str) -> Result<Term, EngineError> {
        match token.strip_prefix("_:") {
            Some(id) => Ok(Term::Blank(id.to_string())),
            None => self.iri(token).map(Term::Iri),
        }
    }

    fn object(&self, token: &str) -> Result<Term, EngineError> {
        let trimmed = token.trim();
        match trimmed.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
            Some(text) if trimmed.len() >= 2 => Ok(Term::string(text)),
            _ => self.resource(trimmed),
        }
    }

    fn triples(&self, raw: &[RawTriple]) -> Result<Vec<Triple>, EngineError> {
        raw.iter()
            .map(|[s, p, o]| Ok::<_, EngineError>(Triple::new(self.resource(s)?, self.iri(p)?, self.object(o)?)))
            .collect()
    }
}

/// Every `.yaml`/`.yml` file under `dir`, sorted by path
pub fn load_scenarios(dir: &Path) -> Result<Vec<Scenario>, EngineError> {
    let entries = std::fs::read_dir(dir).map_err(|source| EngineError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| EngineError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_yaml = matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"));
        if path.is_file() && is_yaml {
            paths.push(path);
        }
    }
    paths.sort();
    paths.iter().map(|p| Scenario::from_file(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const METER: &str = r#"
prefixes:
  site: "urn:site#"
facts:
  - [site:m1, a, Water_Meter]
  - [site:m1, meters, site:bldg1]
  - [site:m1, rdfs:label, "\"Main meter\""]
  - [_:b0, a, Building]
expect:
  present:
    - [site:m1, a, Building_Water_Meter]
  absent:
    - [site:m1, a, brick:Gas_Meter]
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_yaml(METER, Path::new("fixtures/meter.yaml")).unwrap();
        assert_eq!(scenario.name, "meter");
        assert_eq!(scenario.facts.len(), 4);
        assert_eq!(
            scenario.facts[0],
            Triple::typed(
                Term::iri("urn:site#m1"),
                &Iri::new_unchecked(vocabulary::brick("Water_Meter"))
            )
        );
        assert_eq!(scenario.facts[2].object, Term::string("Main meter"));
        assert_eq!(scenario.facts[3].subject, Term::Blank("b0".to_string()));
        assert_eq!(scenario.present.len(), 1);
        assert_eq!(scenario.absent.len(), 1);
    }

    #[test]
    fn test_unknown_prefix_is_reported() {
        let err = Scenario::from_yaml("facts:\n  - [nope:x, a, Meter]\n", Path::new("bad.yaml")).unwrap_err();
        match err {
            EngineError::Term { scenario, token, .. } => {
                assert_eq!(scenario, "bad");
                assert_eq!(token, "nope:x");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_scenario_without_facts_is_rejected() {
        let err = Scenario::from_yaml("name: empty\nfacts: []\n", Path::new("empty.yaml")).unwrap_err();
        assert!(matches!(err, EngineError::Scenario { .. }));
    }
}
