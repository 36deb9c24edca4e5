//! Traversal over parent relations (class, property and concept hierarchies).
//!
//! Every hierarchy is a DAG in a valid build; these helpers never assume it.

use brickc_core::model::Iri;
use std::collections::{BTreeMap, BTreeSet};

/// node -> direct parents
pub type Edges = BTreeMap<Iri, BTreeSet<Iri>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

struct CycleSearch<'a> {
    edges: &'a Edges,
    color: BTreeMap<&'a Iri, Color>,
    path: Vec<&'a Iri>,
    cycles: BTreeSet<Vec<Iri>>,
    stop_at_first: bool,
}

impl<'a> CycleSearch<'a> {
    fn new(edges: &'a Edges, stop_at_first: bool) -> Self {
        Self {
            edges,
            color: edges.keys().map(|k| (k, Color::White)).collect(),
            path: Vec::new(),
            cycles: BTreeSet::new(),
            stop_at_first,
        }
    }

    fn run(mut self) -> BTreeSet<Vec<Iri>> {
        let edges = self.edges;
        for node in edges.keys() {
            if self.done() {
                break;
            }
            if self.color.get(node) == Some(&Color::White) {
                self.visit(node);
            }
        }
        self.cycles
    }

    fn done(&self) -> bool {
        self.stop_at_first && !self.cycles.is_empty()
    }

    fn visit(&mut self, node: &'a Iri) {
        let edges = self.edges;
        self.color.insert(node, Color::Grey);
        self.path.push(node);

        if let Some(parents) = edges.get(node) {
            for parent in parents {
                if self.done() {
                    break;
                }
                // parents outside the map are leaves (external vocabulary)
                let Some((key, _)) = edges.get_key_value(parent) else {
                    continue;
                };
                match self.color.get(key).copied().unwrap_or(Color::Black) {
                    Color::White => self.visit(key),
                    Color::Grey => {
                        if let Some(start) = self.path.iter().position(|n| *n == key) {
                            let cycle: Vec<Iri> = self.path[start..].iter().map(|n| (*n).clone()).collect();
                            self.cycles.insert(canonical_cycle(cycle));
                        }
                    }
                    Color::Black => {}
                }
            }
        }

        self.path.pop();
        self.color.insert(node, Color::Black);
    }
}

/// Rotate so the smallest node leads, then close the loop
fn canonical_cycle(mut cycle: Vec<Iri>) -> Vec<Iri> {
    if let Some(min_at) = cycle.iter().enumerate().min_by(|a, b| a.1.cmp(b.1)).map(|(i, _)| i) {
        cycle.rotate_left(min_at);
    }
    if let Some(first) = cycle.first().cloned() {
        cycle.push(first);
    }
    cycle
}

/// First cycle found by a depth-first search in identifier order
pub fn find_cycle(edges: &Edges) -> Option<Vec<Iri>> {
    CycleSearch::new(edges, true).run().into_iter().next()
}

/// Every distinct cycle reachable through a back edge
pub fn find_cycles(edges: &Edges) -> Vec<Vec<Iri>> {
    CycleSearch::new(edges, false).run().into_iter().collect()
}

/// Reflexive-transitive ancestors of `node`. Terminates on cyclic input.
pub fn ancestors(edges: &Edges, node: &Iri) -> BTreeSet<Iri> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(parents) = edges.get(&current) {
            stack.extend(parents.iter().filter(|p| !seen.contains(*p)).cloned());
        }
    }
    seen
}

/// Reflexive-transitive descendants of `root`
pub fn descendants(edges: &Edges, root: &Iri) -> BTreeSet<Iri> {
    let children = invert(edges);
    ancestors(&children, root)
}

/// node -> direct children
pub fn invert(edges: &Edges) -> Edges {
    let mut out: Edges = BTreeMap::new();
    for (child, parents) in edges {
        for parent in parents {
            out.entry(parent.clone()).or_default().insert(child.clone());
        }
    }
    out
}

/// Ancestor closure of every node in the map
pub fn closure(edges: &Edges) -> BTreeMap<Iri, BTreeSet<Iri>> {
    edges.keys().map(|k| (k.clone(), ancestors(edges, k))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(local: &str) -> Iri {
        Iri::new_unchecked(format!("urn:test#{}", local))
    }

    // parents are comma separated
    fn edges(pairs: &[(&str, &str)]) -> Edges {
        pairs
            .iter()
            .map(|(child, parents)| {
                let parents = parents.split(',').filter(|p| !p.is_empty()).map(iri).collect();
                (iri(child), parents)
            })
            .collect()
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let e = edges(&[
            ("Top", ""),
            ("Left", "Top"),
            ("Right", "Top"),
            ("Bottom", "Left,Right"),
        ]);
        assert!(find_cycle(&e).is_none());
        let up = ancestors(&e, &iri("Bottom"));
        assert_eq!(up.len(), 4);
        assert!(descendants(&e, &iri("Top")).contains(&iri("Bottom")));
    }

    #[test]
    fn test_cycle_is_reported_in_canonical_form() {
        let e = edges(&[("C", "A"), ("A", "B"), ("B", "C")]);
        let cycle = find_cycle(&e).unwrap();
        assert_eq!(cycle, vec![iri("A"), iri("B"), iri("C"), iri("A")]);
    }

    #[test]
    fn test_self_loop_and_separate_cycles() {
        let e = edges(&[
            ("Self", "Self"),
            ("X", "Y"),
            ("Y", "X"),
            ("Z", "External"),
        ]);
        let cycles = find_cycles(&e);
        assert_eq!(cycles.len(), 2);
        assert!(cycles.contains(&vec![iri("Self"), iri("Self")]));
        assert!(cycles.contains(&vec![iri("X"), iri("Y"), iri("X")]));
    }

    #[test]
    fn test_ancestors_terminate_on_cycles() {
        let e = edges(&[("A", "B"), ("B", "A")]);
        assert_eq!(ancestors(&e, &iri("A")).len(), 2);
    }
}
