//! Namespace and term constants used by the schema and the rule catalog

// Namespaces
pub const BRICK: &str = "https://brickschema.org/schema/Brick#";
pub const TAG: &str = "https://brickschema.org/schema/BrickTag#";
pub const BSH: &str = "https://brickschema.org/schema/BrickShape#";
pub const REF: &str = "https://brickschema.org/schema/Brick/ref#";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const SH: &str = "http://www.w3.org/ns/shacl#";
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const SOSA: &str = "http://www.w3.org/ns/sosa/";
pub const QUDT: &str = "http://qudt.org/schema/qudt/";
pub const QUDTQK: &str = "http://qudt.org/vocab/quantitykind/";
pub const UNIT: &str = "http://qudt.org/vocab/unit/";
pub const VCARD: &str = "http://www.w3.org/2006/vcard/ns#";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";

// RDF / RDFS
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const RDFS_SUBPROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
pub const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
pub const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
pub const RDFS_SEE_ALSO: &str = "http://www.w3.org/2000/01/rdf-schema#seeAlso";
pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";

// OWL
pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
pub const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
pub const OWL_SYMMETRIC_PROPERTY: &str = "http://www.w3.org/2002/07/owl#SymmetricProperty";
pub const OWL_INVERSE_OF: &str = "http://www.w3.org/2002/07/owl#inverseOf";
pub const OWL_EQUIVALENT_CLASS: &str = "http://www.w3.org/2002/07/owl#equivalentClass";
pub const OWL_DISJOINT_WITH: &str = "http://www.w3.org/2002/07/owl#disjointWith";
pub const OWL_DEPRECATED: &str = "http://www.w3.org/2002/07/owl#deprecated";
pub const OWL_ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
pub const OWL_VERSION_INFO: &str = "http://www.w3.org/2002/07/owl#versionInfo";
pub const OWL_VERSION_IRI: &str = "http://www.w3.org/2002/07/owl#versionIRI";
pub const OWL_IMPORTS: &str = "http://www.w3.org/2002/07/owl#imports";

// XSD
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

// SKOS
pub const SKOS_DEFINITION: &str = "http://www.w3.org/2004/02/skos/core#definition";
pub const SKOS_BROADER: &str = "http://www.w3.org/2004/02/skos/core#broader";
pub const SKOS_NARROWER: &str = "http://www.w3.org/2004/02/skos/core#narrower";
pub const SKOS_CONCEPT: &str = "http://www.w3.org/2004/02/skos/core#Concept";
pub const SKOS_RELATED: &str = "http://www.w3.org/2004/02/skos/core#related";

// SHACL
pub const SH_NODE_SHAPE: &str = "http://www.w3.org/ns/shacl#NodeShape";
pub const SH_RULE: &str = "http://www.w3.org/ns/shacl#rule";
pub const SH_SPARQL_RULE: &str = "http://www.w3.org/ns/shacl#SPARQLRule";
pub const SH_CONSTRUCT: &str = "http://www.w3.org/ns/shacl#construct";
pub const SH_TARGET_CLASS: &str = "http://www.w3.org/ns/shacl#targetClass";
pub const SH_TARGET_SUBJECTS_OF: &str = "http://www.w3.org/ns/shacl#targetSubjectsOf";
pub const SH_TARGET_OBJECTS_OF: &str = "http://www.w3.org/ns/shacl#targetObjectsOf";
pub const SH_TARGET: &str = "http://www.w3.org/ns/shacl#target";
pub const SH_SPARQL_TARGET: &str = "http://www.w3.org/ns/shacl#SPARQLTarget";
pub const SH_SELECT: &str = "http://www.w3.org/ns/shacl#select";
pub const SH_PROPERTY: &str = "http://www.w3.org/ns/shacl#property";
pub const SH_PROPERTY_SHAPE: &str = "http://www.w3.org/ns/shacl#PropertyShape";
pub const SH_PATH: &str = "http://www.w3.org/ns/shacl#path";
pub const SH_CLASS: &str = "http://www.w3.org/ns/shacl#class";
pub const SH_OR: &str = "http://www.w3.org/ns/shacl#or";
pub const SH_NODE: &str = "http://www.w3.org/ns/shacl#node";
pub const SH_TRIPLE_RULE: &str = "http://www.w3.org/ns/shacl#TripleRule";
pub const SH_SUBJECT: &str = "http://www.w3.org/ns/shacl#subject";
pub const SH_PREDICATE: &str = "http://www.w3.org/ns/shacl#predicate";
pub const SH_OBJECT: &str = "http://www.w3.org/ns/shacl#object";
pub const SH_THIS: &str = "http://www.w3.org/ns/shacl#this";
pub const SH_CONDITION: &str = "http://www.w3.org/ns/shacl#condition";
pub const SH_QUALIFIED_VALUE_SHAPE: &str = "http://www.w3.org/ns/shacl#qualifiedValueShape";
pub const SH_QUALIFIED_MIN_COUNT: &str = "http://www.w3.org/ns/shacl#qualifiedMinCount";
pub const SH_HAS_VALUE: &str = "http://www.w3.org/ns/shacl#hasValue";
pub const SH_MIN_COUNT: &str = "http://www.w3.org/ns/shacl#minCount";
pub const SH_MAX_COUNT: &str = "http://www.w3.org/ns/shacl#maxCount";

// DC terms
pub const DCTERMS_TITLE: &str = "http://purl.org/dc/terms/title";
pub const DCTERMS_DESCRIPTION: &str = "http://purl.org/dc/terms/description";

// Brick classes
pub const BRICK_ENTITY: &str = "https://brickschema.org/schema/Brick#Entity";
/// Root class kept alongside `brick:Entity` for models written against older releases
pub const BRICK_CLASS: &str = "https://brickschema.org/schema/Brick#Class";
pub const BRICK_TAG: &str = "https://brickschema.org/schema/Brick#Tag";
pub const BRICK_METER: &str = "https://brickschema.org/schema/Brick#Meter";
pub const BRICK_BUILDING_METER: &str = "https://brickschema.org/schema/Brick#Building_Meter";
pub const BRICK_BUILDING: &str = "https://brickschema.org/schema/Brick#Building";
pub const BRICK_QUANTITY: &str = "https://brickschema.org/schema/Brick#Quantity";
pub const BRICK_SUBSTANCE: &str = "https://brickschema.org/schema/Brick#Substance";
pub const BRICK_RELATIONSHIP: &str = "https://brickschema.org/schema/Brick#Relationship";
pub const BRICK_ENTITY_PROPERTY: &str = "https://brickschema.org/schema/Brick#EntityProperty";

// Brick properties
pub const BRICK_HAS_TAG: &str = "https://brickschema.org/schema/Brick#hasTag";
pub const BRICK_HAS_ASSOCIATED_TAG: &str = "https://brickschema.org/schema/Brick#hasAssociatedTag";
pub const BRICK_HAS_SUBSTANCE: &str = "https://brickschema.org/schema/Brick#hasSubstance";
pub const BRICK_HAS_QUANTITY: &str = "https://brickschema.org/schema/Brick#hasQuantity";
pub const BRICK_METERS: &str = "https://brickschema.org/schema/Brick#meters";
pub const BRICK_IS_REPLACED_BY: &str = "https://brickschema.org/schema/Brick#isReplacedBy";
pub const BRICK_DEPRECATED_IN_VERSION: &str = "https://brickschema.org/schema/Brick#deprecatedInVersion";
pub const BRICK_DEPRECATION_MITIGATION_MESSAGE: &str =
    "https://brickschema.org/schema/Brick#deprecationMitigationMessage";
pub const BRICK_DEPRECATION_MITIGATION_RULE: &str =
    "https://brickschema.org/schema/Brick#deprecationMitigationRule";

/// Build an IRI string in the Brick namespace
pub fn brick(local: &str) -> String {
    format!("{}{}", BRICK, local)
}

/// Build an IRI string in the BrickTag namespace
pub fn tag(local: &str) -> String {
    format!("{}{}", TAG, local)
}

/// Build an IRI string in the BrickShape namespace
pub fn bsh(local: &str) -> String {
    format!("{}{}", BSH, local)
}
