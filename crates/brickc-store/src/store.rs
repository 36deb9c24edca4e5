//! RDF store implementation with provenance

use crate::provenance::Provenance;
use brickc_core::model::{Iri, Term, Triple};
use brickc_core::vocabulary;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap};

type IndexList = SmallVec<[usize; 8]>;

/// Stored triple with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTriple {
    /// The RDF triple
    pub triple: Triple,
    /// Provenance of the first assertion
    pub provenance: Provenance,
}

/// Triple store with subject / predicate / object indices
#[derive(Debug, Clone, Default)]
pub struct RdfStore {
    /// All stored triples in insertion order
    triples: Vec<StoredTriple>,
    /// Position of each triple in `triples`
    positions: HashMap<Triple, usize>,
    subject_index: HashMap<Term, IndexList>,
    predicate_index: HashMap<Iri, IndexList>,
    object_index: HashMap<Term, IndexList>,
}

impl RdfStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from triples sharing one provenance
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>, provenance: Provenance) -> Self {
        let mut store = Self::new();
        store.insert_batch(triples, provenance);
        store
    }

    /// Insert a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple, provenance: Provenance) -> bool {
        if self.positions.contains_key(&triple) {
            return false;
        }

        let index = self.triples.len();
        self.subject_index.entry(triple.subject.clone()).or_default().push(index);
        self.predicate_index.entry(triple.predicate.clone()).or_default().push(index);
        self.object_index.entry(triple.object.clone()).or_default().push(index);
        self.positions.insert(triple.clone(), index);
        self.triples.push(StoredTriple { triple, provenance });
        true
    }

    /// Insert multiple triples with the same provenance, returning how many were new
    pub fn insert_batch(&mut self, triples: impl IntoIterator<Item = Triple>, provenance: Provenance) -> usize {
        triples
            .into_iter()
            .filter(|t| self.insert(t.clone(), provenance.clone()))
            .count()
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.positions.contains_key(triple)
    }

    pub fn provenance(&self, triple: &Triple) -> Option<&Provenance> {
        self.positions.get(triple).map(|&i| &self.triples[i].provenance)
    }

    /// Find triples matching a pattern
    pub fn find_triples(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Iri>,
        object: Option<&Term>,
    ) -> Vec<&StoredTriple> {
        // Use the most selective index
        let candidates: Box<dyn Iterator<Item = &StoredTriple> + '_> = if let Some(s) = subject {
            Box::new(self.lookup(self.subject_index.get(s)))
        } else if let Some(o) = object {
            Box::new(self.lookup(self.object_index.get(o)))
        } else if let Some(p) = predicate {
            Box::new(self.lookup(self.predicate_index.get(p)))
        } else {
            Box::new(self.triples.iter())
        };

        candidates
            .filter(|stored| {
                subject.map_or(true, |s| &stored.triple.subject == s)
                    && predicate.map_or(true, |p| &stored.triple.predicate == p)
                    && object.map_or(true, |o| &stored.triple.object == o)
            })
            .collect()
    }

    fn lookup<'a>(&'a self, indices: Option<&'a IndexList>) -> impl Iterator<Item = &'a StoredTriple> + 'a {
        indices
            .into_iter()
            .flat_map(|list| list.iter())
            .filter_map(move |&i| self.triples.get(i))
    }

    /// Objects of `subject predicate ?o`
    pub fn objects(&self, subject: &Term, predicate: &Iri) -> Vec<&Term> {
        self.find_triples(Some(subject), Some(predicate), None)
            .into_iter()
            .map(|st| &st.triple.object)
            .collect()
    }

    /// Asserted `rdf:type` values of a node
    pub fn types_of(&self, subject: &Term) -> Vec<&Iri> {
        let rdf_type = Iri::new_unchecked(vocabulary::RDF_TYPE);
        self.objects(subject, &rdf_type)
            .into_iter()
            .filter_map(|t| t.as_iri())
            .collect()
    }

    /// Stored triples in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &StoredTriple> {
        self.triples.iter()
    }

    /// Owned copy of the triple set, used for comparing fixpoints
    pub fn snapshot(&self) -> BTreeSet<Triple> {
        self.triples.iter().map(|st| st.triple.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}
