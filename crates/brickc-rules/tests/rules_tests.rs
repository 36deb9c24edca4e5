use brickc_core::model::{Iri, Term, Triple};
use brickc_core::vocabulary;
use brickc_rules::*;
use brickc_store::{Provenance, RdfStore};
use std::collections::BTreeSet;

fn brick(local: &str) -> Iri {
    Iri::new_unchecked(vocabulary::brick(local))
}

fn tag(local: &str) -> Iri {
    Iri::new_unchecked(vocabulary::tag(local))
}

fn site(local: &str) -> Term {
    Term::iri(&format!("urn:site#{}", local))
}

fn p(value: &str) -> Iri {
    Iri::new_unchecked(value)
}

fn schema() -> SchemaIndex {
    let sub = p(vocabulary::RDFS_SUBCLASS_OF);
    let assoc = p(vocabulary::BRICK_HAS_ASSOCIATED_TAG);
    let triples = vec![
        Triple::new(brick("Meter"), sub.clone(), brick("Equipment")),
        Triple::new(brick("Water_Meter"), sub.clone(), brick("Meter")),
        Triple::new(brick("Building_Meter"), sub.clone(), brick("Meter")),
        Triple::new(brick("Building_Water_Meter"), sub.clone(), brick("Water_Meter")),
        Triple::new(brick("Building_Water_Meter"), sub.clone(), brick("Building_Meter")),
        Triple::new(brick("Building"), sub, brick("Location")),
        Triple::new(brick("Equipment"), assoc.clone(), tag("Equipment")),
        Triple::new(brick("Meter"), assoc.clone(), tag("Meter")),
        Triple::new(brick("Water_Meter"), assoc, tag("Water")),
        Triple::new(brick("Water_Meter"), p(vocabulary::BRICK_HAS_SUBSTANCE), brick("Water")),
        Triple::new(brick("Building_Water_Meter"), p(vocabulary::BRICK_HAS_SUBSTANCE), brick("Water")),
        Triple::new(brick("meters"), p(vocabulary::OWL_INVERSE_OF), brick("isMeteredBy")),
    ];
    SchemaIndex::from_triples(&triples).unwrap()
}

/// Apply every rule once, in catalog order
fn one_pass(catalog: &RuleCatalog, schema: &SchemaIndex, store: &mut RdfStore) -> usize {
    let mut added = 0;
    for rule in catalog.rules() {
        let result = rule.apply(schema, store);
        added += store.insert_batch(result.triples_to_add, Provenance::inferred(rule.name(), 0));
    }
    added
}

fn saturate(schema: &SchemaIndex, store: &mut RdfStore) {
    let catalog = RuleCatalog::standard();
    while one_pass(&catalog, schema, store) > 0 {}
}

#[test]
fn test_inverse_round_trip_then_nothing_new() {
    let schema = schema();
    let mut store = RdfStore::from_triples(
        vec![Triple::new(site("m1"), brick("meters"), site("bldg1"))],
        Provenance::asserted("site"),
    );
    let catalog = RuleCatalog::standard();
    let source = catalog.get("InverseFromSource").unwrap();

    let first = source.apply(&schema, &store);
    assert_eq!(
        first.triples_to_add,
        vec![Triple::new(site("bldg1"), brick("isMeteredBy"), site("m1"))]
    );
    store.insert_batch(first.triples_to_add, Provenance::inferred(source.name(), 1));

    assert!(source.apply(&schema, &store).is_empty());
    // the derived fact is the target side; its inverse is already present
    assert!(catalog.get("InverseFromTarget").unwrap().apply(&schema, &store).is_empty());
}

#[test]
fn test_tags_are_the_union_over_superclasses() {
    let schema = schema();
    let mut store = RdfStore::from_triples(
        vec![Triple::typed(site("m1"), &brick("Water_Meter"))],
        Provenance::asserted("site"),
    );
    saturate(&schema, &mut store);

    let tags: BTreeSet<&Term> = store
        .objects(&site("m1"), &p(vocabulary::BRICK_HAS_TAG))
        .into_iter()
        .collect();
    let expected: Vec<Term> = vec![tag("Equipment").into(), tag("Meter").into(), tag("Water").into()];
    assert_eq!(tags, expected.iter().collect::<BTreeSet<_>>());
}

#[test]
fn test_building_water_meter_example() {
    let schema = schema();
    let mut store = RdfStore::from_triples(
        vec![
            Triple::typed(site("m1"), &brick("Water_Meter")),
            Triple::new(site("m1"), brick("meters"), site("bldg1")),
            Triple::typed(site("bldg1"), &brick("Building")),
        ],
        Provenance::asserted("site"),
    );
    saturate(&schema, &mut store);

    assert!(store.contains(&Triple::typed(site("m1"), &brick("Building_Water_Meter"))));
    assert!(store.contains(&Triple::new(site("m1"), p(vocabulary::BRICK_HAS_SUBSTANCE), brick("Water"))));
    assert_eq!(
        store.provenance(&Triple::typed(site("m1"), &brick("Building_Water_Meter"))),
        Some(&Provenance::inferred("BuildingMeterType", 0))
    );

    let before = store.len();
    assert_eq!(one_pass(&RuleCatalog::standard(), &schema, &mut store), 0);
    assert_eq!(store.len(), before);
}

#[test]
fn test_meter_of_non_building_keeps_non_building_type() {
    let schema = schema();
    let mut store = RdfStore::from_triples(
        vec![
            Triple::typed(site("m1"), &brick("Water_Meter")),
            Triple::new(site("m1"), brick("meters"), site("floor1")),
        ],
        Provenance::asserted("site"),
    );
    saturate(&schema, &mut store);
    assert!(!store.contains(&Triple::typed(site("m1"), &brick("Building_Water_Meter"))));
}

#[test]
fn test_schema_without_metertypes_infers_no_meter_types() {
    let triples = vec![Triple::new(
        brick("Water_Meter"),
        p(vocabulary::RDFS_SUBCLASS_OF),
        brick("Meter"),
    )];
    let schema = SchemaIndex::from_triples(&triples).unwrap();
    let mut store = RdfStore::from_triples(
        vec![
            Triple::typed(site("m1"), &brick("Water_Meter")),
            Triple::new(site("m1"), p(vocabulary::BRICK_HAS_SUBSTANCE), brick("Water")),
        ],
        Provenance::asserted("site"),
    );
    let before = store.len();
    saturate(&schema, &mut store);
    assert_eq!(store.len(), before);
}

#[test]
fn test_rendered_artifact_names_every_rule() {
    let catalog = RuleCatalog::standard();
    let turtle = render_catalog(
        &catalog,
        &brickc_core::PrefixMap::standard(),
        brickc_schema::OutputFormat::Turtle,
    );
    for name in catalog.names() {
        assert!(turtle.contains(&format!("bsh:{} a sh:NodeShape", name)), "missing {}", name);
    }
}
