//! Prefix map: expansion of `prefix:Local` identifiers and compaction for output

use crate::error::CoreError;
use crate::model::Iri;
use crate::vocabulary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered prefix → namespace map
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefixMap {
    prefixes: BTreeMap<String, String>,
}

impl PrefixMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes every build knows about
    pub fn standard() -> Self {
        let mut map = Self::new();
        for (prefix, ns) in [
            ("brick", vocabulary::BRICK),
            ("tag", vocabulary::TAG),
            ("bsh", vocabulary::BSH),
            ("ref", vocabulary::REF),
            ("rdf", vocabulary::RDF),
            ("rdfs", vocabulary::RDFS),
            ("owl", vocabulary::OWL),
            ("xsd", vocabulary::XSD),
            ("sh", vocabulary::SH),
            ("skos", vocabulary::SKOS),
            ("sosa", vocabulary::SOSA),
            ("qudt", vocabulary::QUDT),
            ("qudtqk", vocabulary::QUDTQK),
            ("unit", vocabulary::UNIT),
            ("vcard", vocabulary::VCARD),
            ("dcterms", vocabulary::DCTERMS),
        ] {
            map.prefixes.insert(prefix.to_string(), ns.to_string());
        }
        map
    }

    /// Register a prefix. The namespace must itself be an absolute IRI.
    pub fn insert(&mut self, prefix: &str, namespace: &str) -> Result<(), CoreError> {
        if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(CoreError::InvalidIdentifier {
                value: prefix.to_string(),
                reason: "prefix may only contain letters, digits, '_' and '-'".to_string(),
            });
        }
        Iri::new(namespace)?;
        self.prefixes.insert(prefix.to_string(), namespace.to_string());
        Ok(())
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.prefixes.contains_key(prefix)
    }

    /// Iterate in prefix order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, n)| (p.as_str(), n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Resolve an identifier token.
    ///
    /// Accepts `<absolute-iri>`, `prefix:Local`, or a bare `Local` which is
    /// placed in `default_namespace`.
    pub fn resolve(&self, token: &str, default_namespace: &str) -> Result<Iri, CoreError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CoreError::InvalidIdentifier {
                value: token.to_string(),
                reason: "empty identifier".to_string(),
            });
        }

        if let Some(inner) = token.strip_prefix('<') {
            let inner = inner.strip_suffix('>').ok_or_else(|| CoreError::InvalidIdentifier {
                value: token.to_string(),
                reason: "unterminated '<'".to_string(),
            })?;
            return Iri::new(inner);
        }

        match token.split_once(':') {
            Some((prefix, local)) => match self.prefixes.get(prefix) {
                Some(ns) => {
                    check_local_name(token, local)?;
                    Iri::new(format!("{}{}", ns, local))
                }
                None if local.starts_with("//") => Iri::new(token),
                None => Err(CoreError::UnknownPrefix {
                    prefix: prefix.to_string(),
                    value: token.to_string(),
                }),
            },
            None => {
                check_local_name(token, token)?;
                Iri::new(format!("{}{}", default_namespace, token))
            }
        }
    }

    /// Compact an IRI to `prefix:Local` using the longest matching namespace
    pub fn compact(&self, iri: &Iri) -> Option<String> {
        self.prefixes
            .iter()
            .filter(|(_, ns)| iri.as_str().starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .and_then(|(prefix, ns)| {
                let local = &iri.as_str()[ns.len()..];
                if is_valid_local_name(local) {
                    Some(format!("{}:{}", prefix, local))
                } else {
                    None
                }
            })
    }
}

fn check_local_name(token: &str, local: &str) -> Result<(), CoreError> {
    if is_valid_local_name(local) {
        Ok(())
    } else {
        Err(CoreError::InvalidIdentifier {
            value: token.to_string(),
            reason: format!("'{}' is not a valid local name", local),
        })
    }
}

/// Conservative subset of the Turtle PN_LOCAL production
pub fn is_valid_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(c) if c.is_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    if local.ends_with('.') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefixed_and_bare() {
        let map = PrefixMap::standard();
        let meter = map.resolve("brick:Water_Meter", vocabulary::BRICK).unwrap();
        assert_eq!(meter.as_str(), "https://brickschema.org/schema/Brick#Water_Meter");

        let tag = map.resolve("Water", vocabulary::TAG).unwrap();
        assert_eq!(tag.as_str(), "https://brickschema.org/schema/BrickTag#Water");

        let full = map.resolve("<http://example.org/x#Y>", vocabulary::BRICK).unwrap();
        assert_eq!(full.as_str(), "http://example.org/x#Y");
    }

    #[test]
    fn test_resolve_unknown_prefix() {
        let map = PrefixMap::standard();
        let err = map.resolve("acme:Pump", vocabulary::BRICK).unwrap_err();
        assert!(matches!(err, CoreError::UnknownPrefix { ref prefix, .. } if prefix == "acme"));
    }

    #[test]
    fn test_resolve_rejects_bad_local_names() {
        let map = PrefixMap::standard();
        assert!(map.resolve("brick:Bad Name", vocabulary::BRICK).is_err());
        assert!(map.resolve("-dash", vocabulary::BRICK).is_err());
        assert!(map.resolve("   ", vocabulary::BRICK).is_err());
        assert!(map.resolve("<http://example.org/open", vocabulary::BRICK).is_err());
    }

    #[test]
    fn test_compact_prefers_longest_namespace() {
        let mut map = PrefixMap::new();
        map.insert("ex", "http://example.org/").unwrap();
        map.insert("exsub", "http://example.org/sub/").unwrap();
        let iri = Iri::new("http://example.org/sub/Pump").unwrap();
        assert_eq!(map.compact(&iri).as_deref(), Some("exsub:Pump"));
    }

    #[test]
    fn test_compact_falls_back_when_local_is_not_representable() {
        let map = PrefixMap::standard();
        let iri = Iri::new_unchecked("https://brickschema.org/schema/Brick#a/b");
        assert!(map.compact(&iri).is_none());
    }

    #[test]
    fn test_insert_rejects_relative_namespace() {
        let mut map = PrefixMap::new();
        assert!(map.insert("ex", "not-an-iri").is_err());
        assert!(map.insert("ex", "http://example.org/ns#").is_ok());
        assert_eq!(map.namespace("ex"), Some("http://example.org/ns#"));
    }
}
