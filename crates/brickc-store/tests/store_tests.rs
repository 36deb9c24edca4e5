//! Tests for the brickc-store crate

use brickc_core::model::{Iri, Term, Triple};
use brickc_core::vocabulary;
use brickc_store::{Provenance, RdfStore};
use proptest::prelude::*;

fn node(local: &str) -> Term {
    Term::Iri(Iri::new_unchecked(format!("urn:bldg#{}", local)))
}

fn create_test_triple(s: &str, p: &str, o: &str) -> Triple {
    Triple::new(node(s), Iri::new_unchecked(vocabulary::brick(p)), node(o))
}

#[test]
fn test_insert_is_idempotent() {
    let mut store = RdfStore::new();
    let triple = create_test_triple("ahu1", "feeds", "vav1");

    assert!(store.insert(triple.clone(), Provenance::asserted("site.ttl")));
    assert!(!store.insert(triple.clone(), Provenance::inferred("InverseFromSource", 1)));

    assert_eq!(store.len(), 1);
    // first provenance wins
    assert_eq!(store.provenance(&triple), Some(&Provenance::asserted("site.ttl")));
}

#[test]
fn test_find_triples_by_pattern() {
    let mut store = RdfStore::new();
    store.insert(create_test_triple("ahu1", "feeds", "vav1"), Provenance::asserted("t"));
    store.insert(create_test_triple("ahu1", "feeds", "vav2"), Provenance::asserted("t"));
    store.insert(create_test_triple("vav1", "hasPoint", "temp1"), Provenance::asserted("t"));

    let feeds = Iri::new_unchecked(vocabulary::brick("feeds"));
    assert_eq!(store.find_triples(Some(&node("ahu1")), None, None).len(), 2);
    assert_eq!(store.find_triples(None, Some(&feeds), None).len(), 2);
    assert_eq!(store.find_triples(None, None, Some(&node("temp1"))).len(), 1);
    assert_eq!(store.find_triples(Some(&node("vav1")), Some(&feeds), None).len(), 0);
    assert_eq!(store.find_triples(None, None, None).len(), 3);
    assert_eq!(store.objects(&node("ahu1"), &feeds).len(), 2);
    let feeders: Vec<&Term> = store
        .find_triples(None, Some(&feeds), Some(&node("vav2")))
        .into_iter()
        .map(|st| &st.triple.subject)
        .collect();
    assert_eq!(feeders, vec![&node("ahu1")]);
}

#[test]
fn test_types_of() {
    let mut store = RdfStore::new();
    let meter = Iri::new_unchecked(vocabulary::BRICK_METER);
    store.insert(Triple::typed(node("m1"), &meter), Provenance::asserted("t"));
    store.insert(create_test_triple("m1", "meters", "bldg1"), Provenance::asserted("t"));

    assert_eq!(store.types_of(&node("m1")), vec![&meter]);
    assert!(store.types_of(&node("bldg1")).is_empty());
}

#[test]
fn test_provenance_records_rule_and_iteration() {
    let mut store = RdfStore::new();
    let asserted = create_test_triple("a", "feeds", "b");
    let inferred = create_test_triple("b", "isFedBy", "a");
    store.insert(asserted.clone(), Provenance::asserted("t"));
    store.insert_batch(vec![inferred.clone(), asserted.clone()], Provenance::inferred("InverseFromSource", 2));

    assert_eq!(store.len(), 2);
    assert_eq!(store.provenance(&asserted), Some(&Provenance::asserted("t")));
    assert_eq!(store.provenance(&inferred), Some(&Provenance::inferred("InverseFromSource", 2)));
    assert_eq!(store.iter().map(|st| &st.triple).collect::<Vec<_>>(), vec![&asserted, &inferred]);
}

proptest! {
    #[test]
    fn prop_insertion_order_does_not_change_contents(edges in prop::collection::vec((0u8..6, 0u8..6), 0..40)) {
        let triples: Vec<Triple> = edges
            .iter()
            .map(|(a, b)| create_test_triple(&format!("n{}", a), "feeds", &format!("n{}", b)))
            .collect();

        let forward = RdfStore::from_triples(triples.clone(), Provenance::asserted("fwd"));
        let backward = RdfStore::from_triples(triples.into_iter().rev(), Provenance::asserted("bwd"));

        prop_assert_eq!(forward.snapshot(), backward.snapshot());
        prop_assert_eq!(forward.len(), backward.len());
    }
}
