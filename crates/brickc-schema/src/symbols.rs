//! Per-build symbol table.
//!
//! Every build owns one table; nothing is shared between builds.

use crate::ir::Origin;
use crate::taxonomy::{EntityKind, Taxonomy};
use brickc_core::model::Iri;
use brickc_core::{vocabulary, PrefixMap};
use std::collections::{BTreeMap, BTreeSet};

/// Whether a symbol was declared by the set being built or inherited from the graph it extends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: EntityKind,
    pub scope: Scope,
    pub origin: Origin,
}

/// Outcome of resolving a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Declared with an acceptable kind
    Found(EntityKind),
    /// Declared, but as something else
    WrongKind(EntityKind),
    /// Outside every managed namespace; accepted as opaque
    External,
    /// In a managed namespace and never declared
    Missing,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    prefixes: PrefixMap,
    symbols: BTreeMap<Iri, Symbol>,
    managed: BTreeSet<String>,
}

impl SymbolTable {
    pub fn new(prefixes: PrefixMap) -> Self {
        let managed = [vocabulary::BRICK, vocabulary::TAG, vocabulary::REF]
            .iter()
            .map(|ns| ns.to_string())
            .collect();
        Self {
            prefixes,
            symbols: BTreeMap::new(),
            managed,
        }
    }

    /// Table pre-seeded with every entity of an existing graph
    pub fn with_context(prefixes: PrefixMap, context: &Taxonomy) -> Self {
        let mut table = Self::new(prefixes);
        let entries = context
            .classes
            .values()
            .map(|n| (&n.id, EntityKind::Class, &n.origin))
            .chain(context.properties.values().map(|n| (&n.id, EntityKind::Property, &n.origin)))
            .chain(context.tags.values().map(|n| (&n.id, EntityKind::Tag, &n.origin)))
            .chain(context.concepts.values().map(|n| (&n.id, EntityKind::from(n.kind), &n.origin)));
        for (id, kind, origin) in entries {
            table.managed.insert(id.namespace().to_string());
            table.symbols.insert(
                id.clone(),
                Symbol {
                    kind,
                    scope: Scope::Context,
                    origin: origin.clone(),
                },
            );
        }
        table
    }

    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    /// Register a local declaration. Returns the previous symbol if the id was already declared.
    pub fn declare(&mut self, id: &Iri, kind: EntityKind, origin: &Origin) -> Option<Symbol> {
        self.managed.insert(id.namespace().to_string());
        self.symbols.insert(
            id.clone(),
            Symbol {
                kind,
                scope: Scope::Local,
                origin: origin.clone(),
            },
        )
    }

    pub fn lookup(&self, id: &Iri) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn is_managed(&self, id: &Iri) -> bool {
        self.managed.contains(id.namespace())
    }

    /// Resolve a reference expecting one of `kinds`
    pub fn resolve(&self, id: &Iri, kinds: &[EntityKind]) -> Resolution {
        match self.symbols.get(id) {
            Some(symbol) if kinds.contains(&symbol.kind) => Resolution::Found(symbol.kind),
            Some(symbol) => Resolution::WrongKind(symbol.kind),
            None if self.is_managed(id) => Resolution::Missing,
            None => Resolution::External,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Locally declared symbols, in identifier order
    pub fn local_symbols(&self) -> impl Iterator<Item = (&Iri, &Symbol)> {
        self.symbols.iter().filter(|(_, s)| s.scope == Scope::Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brick(local: &str) -> Iri {
        Iri::new_unchecked(vocabulary::brick(local))
    }

    #[test]
    fn test_resolution_outcomes() {
        let mut table = SymbolTable::new(PrefixMap::standard());
        table.declare(&brick("Meter"), EntityKind::Class, &Origin::new("defs.csv", 1));

        assert_eq!(table.resolve(&brick("Meter"), &[EntityKind::Class]), Resolution::Found(EntityKind::Class));
        assert_eq!(
            table.resolve(&brick("Meter"), &[EntityKind::Property]),
            Resolution::WrongKind(EntityKind::Class)
        );
        assert_eq!(table.resolve(&brick("Nope"), &[EntityKind::Class]), Resolution::Missing);

        let owl_thing = Iri::new_unchecked("http://www.w3.org/2002/07/owl#Thing");
        assert_eq!(table.resolve(&owl_thing, &[EntityKind::Class]), Resolution::External);
    }

    #[test]
    fn test_declaring_makes_namespace_managed() {
        let mut table = SymbolTable::new(PrefixMap::standard());
        let pump = Iri::new_unchecked("http://acme.example/ext#Pump");
        let missing = Iri::new_unchecked("http://acme.example/ext#Missing");
        assert_eq!(table.resolve(&missing, &[EntityKind::Class]), Resolution::External);

        table.declare(&pump, EntityKind::Class, &Origin::new("acme.yaml", 1));
        assert_eq!(table.resolve(&missing, &[EntityKind::Class]), Resolution::Missing);
    }

    #[test]
    fn test_context_symbols_are_not_local() {
        let mut base = Taxonomy::new("base");
        base.tags.insert(
            Iri::new_unchecked(vocabulary::tag("Water")),
            crate::taxonomy::TagNode {
                id: Iri::new_unchecked(vocabulary::tag("Water")),
                label: None,
                definition: None,
                origin: Origin::new("base", 1),
            },
        );
        let table = SymbolTable::with_context(PrefixMap::standard(), &base);
        assert_eq!(table.len(), 1);
        assert_eq!(table.local_symbols().count(), 0);
    }
}
