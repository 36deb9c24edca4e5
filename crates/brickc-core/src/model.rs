//! RDF term model

use crate::error::CoreError;
use crate::vocabulary;
use iri_string::types::IriStr;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute IRI
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri(String);

impl Iri {
    /// Parse and validate an absolute IRI
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        match IriStr::new(&value) {
            Ok(_) => Ok(Self(value)),
            Err(e) => Err(CoreError::InvalidIri {
                reason: e.to_string(),
                value,
            }),
        }
    }

    /// Wrap a value already known to be a valid IRI (vocabulary constants)
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fragment or last path segment
    pub fn local_name(&self) -> &str {
        let cut = self.0.rfind(|c| c == '#' || c == '/').map(|i| i + 1).unwrap_or(0);
        &self.0[cut..]
    }

    /// Namespace part, i.e. everything up to and including the last `#` or `/`
    pub fn namespace(&self) -> &str {
        let cut = self.0.rfind(|c| c == '#' || c == '/').map(|i| i + 1).unwrap_or(0);
        &self.0[..cut]
    }

    /// Label derived from the local name, underscores read as spaces
    pub fn default_label(&self) -> String {
        self.local_name().replace('_', " ")
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Iri {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Iri::new(value)
    }
}

impl From<Iri> for String {
    fn from(iri: Iri) -> Self {
        iri.0
    }
}

/// Literal value with optional datatype or language tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<Iri>,
    pub lang: Option<String>,
}

/// RDF term. Variant order is the canonical sort order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
    Blank(String),
}

impl Term {
    /// IRI term from a vocabulary constant
    pub fn iri(value: &str) -> Self {
        Term::Iri(Iri::new_unchecked(value))
    }

    /// Plain string literal
    pub fn string(value: impl Into<String>) -> Self {
        Term::Literal(Literal {
            lexical: value.into(),
            datatype: None,
            lang: None,
        })
    }

    pub fn boolean(value: bool) -> Self {
        Term::Literal(Literal {
            lexical: value.to_string(),
            datatype: Some(Iri::new_unchecked(vocabulary::XSD_BOOLEAN)),
            lang: None,
        })
    }

    pub fn integer(value: u64) -> Self {
        Term::Literal(Literal {
            lexical: value.to_string(),
            datatype: Some(Iri::new_unchecked(vocabulary::XSD_INTEGER)),
            lang: None,
        })
    }

    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl From<&Iri> for Term {
    fn from(iri: &Iri) -> Self {
        Term::Iri(iri.clone())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Blank(id) => write!(f, "_:{}", id),
            Term::Literal(lit) => {
                write!(f, "\"{}\"", escape_literal(&lit.lexical))?;
                if let Some(lang) = &lit.lang {
                    write!(f, "@{}", lang)
                } else if let Some(datatype) = &lit.datatype {
                    write!(f, "^^<{}>", datatype)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Escape a literal's lexical form for Turtle / N-Triples output
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// RDF triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Iri,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: impl Into<Term>, predicate: Iri, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }

    /// `subject rdf:type class`
    pub fn typed(subject: impl Into<Term>, class: &Iri) -> Self {
        Self::new(subject, Iri::new_unchecked(vocabulary::RDF_TYPE), class.clone())
    }

    /// Single N-Triples statement, without the trailing newline
    pub fn to_ntriples(&self) -> String {
        format!("{} <{}> {} .", self.subject, self.predicate, self.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ntriples())
    }
}
