//! # brickc core
//!
//! RDF term model shared by every stage of the schema compiler:
//! IRIs, literals, triples, the namespace vocabulary and prefix handling.

pub mod error;
pub mod model;
pub mod namespace;
pub mod vocabulary;

pub use error::CoreError;
pub use model::*;
pub use namespace::PrefixMap;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iri_rejects_relative_reference() {
        assert!(Iri::new("https://brickschema.org/schema/Brick#Meter").is_ok());
        assert!(Iri::new("Meter").is_err());
        assert!(Iri::new("").is_err());
    }

    #[test]
    fn test_term_ordering_puts_iris_first() {
        let iri = Term::iri(vocabulary::BRICK_METER);
        let lit = Term::string("Meter");
        let blank = Term::Blank("b0".to_string());
        let mut terms = vec![blank.clone(), lit.clone(), iri.clone()];
        terms.sort();
        assert_eq!(terms, vec![iri, lit, blank]);
    }

    #[test]
    fn test_ntriples_rendering() {
        let triple = Triple::new(
            Iri::new_unchecked(vocabulary::BRICK_METER),
            Iri::new_unchecked(vocabulary::RDFS_LABEL),
            Term::string("Meter \"main\""),
        );
        assert_eq!(
            triple.to_ntriples(),
            "<https://brickschema.org/schema/Brick#Meter> <http://www.w3.org/2000/01/rdf-schema#label> \"Meter \\\"main\\\"\" ."
        );
    }

    #[test]
    fn test_boolean_literal() {
        let term = Term::boolean(true);
        match term {
            Term::Literal(lit) => {
                assert_eq!(lit.lexical, "true");
                assert_eq!(lit.datatype.as_ref().map(|d| d.as_str()), Some(vocabulary::XSD_BOOLEAN));
            }
            other => panic!("expected literal, got {:?}", other),
        }
    }
}
