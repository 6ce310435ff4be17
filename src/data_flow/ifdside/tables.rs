//! The tables owned by one solver run. All of them only grow.

use crate::utils::vector_map::VectorMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

/// Arena handle of an interned flow fact.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct FactId(u32);

impl From<FactId> for usize {
    fn from(id: FactId) -> usize {
        id.0 as usize
    }
}

pub(crate) struct FactInterner<D> {
    facts: Vec<D>,
    ids: FxHashMap<D, FactId>,
}

impl<D: Clone + Hash + Eq> FactInterner<D> {
    pub fn new() -> Self {
        FactInterner {
            facts: vec![],
            ids: FxHashMap::default(),
        }
    }

    pub fn intern(&mut self, fact: D) -> FactId {
        if let Some(&id) = self.ids.get(&fact) {
            return id;
        }
        let id = FactId(self.facts.len() as u32);
        self.facts.push(fact.clone());
        self.ids.insert(fact, id);
        id
    }

    pub fn get(&self, id: FactId) -> &D {
        &self.facts[usize::from(id)]
    }

    /// Lookup by the raw index a [`VectorMap`] keyed by `FactId` reports.
    pub fn by_index(&self, index: usize) -> &D {
        &self.facts[index]
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }
}

/// `<d1 @ start(p)> -> <d2 @ n>`; the start node is implied by `n`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct PathEdge<N> {
    pub source_fact: FactId,
    pub target: N,
    pub target_fact: FactId,
}

/// Jump functions, keyed by target node, target fact and source fact.
/// An entry exists exactly for the recorded path edges.
pub(crate) struct JumpFunctionTable<N, W> {
    table: FxHashMap<N, FxHashMap<FactId, FxHashMap<FactId, W>>>,
    len: usize,
}

impl<N: Copy + Hash + Eq, W> JumpFunctionTable<N, W> {
    pub fn new() -> Self {
        JumpFunctionTable {
            table: FxHashMap::default(),
            len: 0,
        }
    }

    pub fn get(&self, source_fact: FactId, target: N, target_fact: FactId) -> Option<&W> {
        self.table
            .get(&target)
            .and_then(|facts| facts.get(&target_fact))
            .and_then(|sources| sources.get(&source_fact))
    }

    /// Records (or replaces) a jump function, returning the previous one.
    pub fn insert(&mut self, source_fact: FactId, target: N, target_fact: FactId, function: W) -> Option<W> {
        let previous = self
            .table
            .entry(target)
            .or_default()
            .entry(target_fact)
            .or_default()
            .insert(source_fact, function);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Source facts (with their functions) of all path edges ending in `<target_fact @ target>`.
    pub fn reverse_lookup(&self, target: N, target_fact: FactId) -> Option<&FxHashMap<FactId, W>> {
        self.table.get(&target).and_then(|facts| facts.get(&target_fact))
    }

    /// Target facts (with their functions) of all path edges from `source_fact` to `target`.
    pub fn forward_lookup(&self, source_fact: FactId, target: N) -> Vec<(FactId, &W)> {
        let mut found: Vec<(FactId, &W)> = self
            .table
            .get(&target)
            .into_iter()
            .flat_map(|facts| facts.iter())
            .filter_map(|(target_fact, sources)| {
                sources.get(&source_fact).map(|function| (*target_fact, function))
            })
            .collect();
        found.sort_by_key(|(fact, _)| *fact);
        found
    }

    pub fn facts_at(&self, target: N) -> impl Iterator<Item = FactId> + '_ {
        self.table
            .get(&target)
            .into_iter()
            .flat_map(|facts| facts.keys().copied())
    }

    /// All entries as `(target, target_fact, source_fact, function)`.
    pub fn iter(&self) -> impl Iterator<Item = (N, FactId, FactId, &W)> + '_ {
        self.table.iter().flat_map(|(target, facts)| {
            facts.iter().flat_map(move |(target_fact, sources)| {
                sources
                    .iter()
                    .map(move |(source_fact, function)| (*target, *target_fact, *source_fact, function))
            })
        })
    }

    pub fn targets(&self) -> impl Iterator<Item = N> + '_ {
        self.table.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

/// For each `<d @ start>` of a callee: the call sites and caller facts that
/// entered it.
pub(crate) struct IncomingTable<N> {
    table: FxHashMap<(N, FactId), FxHashMap<N, FxHashSet<FactId>>>,
}

impl<N: Copy + Hash + Eq + Ord> IncomingTable<N> {
    pub fn new() -> Self {
        IncomingTable {
            table: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, start: N, entry_fact: FactId, call_site: N, call_fact: FactId) -> bool {
        self.table
            .entry((start, entry_fact))
            .or_default()
            .entry(call_site)
            .or_default()
            .insert(call_fact)
    }

    /// Snapshot of the callers of `<entry_fact @ start>`, in a stable order.
    pub fn callers_of(&self, start: N, entry_fact: FactId) -> Vec<(N, Vec<FactId>)> {
        let mut callers: Vec<(N, Vec<FactId>)> = self
            .table
            .get(&(start, entry_fact))
            .into_iter()
            .flat_map(|calls| calls.iter())
            .map(|(call_site, facts)| {
                let mut facts: Vec<FactId> = facts.iter().copied().collect();
                facts.sort();
                (*call_site, facts)
            })
            .collect();
        callers.sort_by_key(|(call_site, _)| *call_site);
        callers
    }
}

/// Completed procedure summaries keyed by (procedure, entry fact).
pub(crate) struct EndSummaryTable<P, N, W> {
    table: FxHashMap<(P, FactId), FxHashMap<(N, FactId), W>>,
    len: usize,
}

impl<P: Copy + Hash + Eq, N: Copy + Hash + Eq + Ord, W: Clone> EndSummaryTable<P, N, W> {
    pub fn new() -> Self {
        EndSummaryTable {
            table: FxHashMap::default(),
            len: 0,
        }
    }

    /// Stores the current summary function, returning `true` if the summary
    /// edge is new.
    pub fn insert(&mut self, procedure: P, entry_fact: FactId, exit: N, exit_fact: FactId, function: W) -> bool {
        let is_new = self
            .table
            .entry((procedure, entry_fact))
            .or_default()
            .insert((exit, exit_fact), function)
            .is_none();
        if is_new {
            self.len += 1;
        }
        is_new
    }

    /// Snapshot of the summaries of `procedure` entered with `entry_fact`.
    pub fn summaries_of(&self, procedure: P, entry_fact: FactId) -> Vec<((N, FactId), W)> {
        let mut summaries: Vec<((N, FactId), W)> = self
            .table
            .get(&(procedure, entry_fact))
            .into_iter()
            .flat_map(|summaries| summaries.iter())
            .map(|(key, function)| (*key, function.clone()))
            .collect();
        summaries.sort_by_key(|(key, _)| *key);
        summaries
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

/// Side table linking facts to the facts they were merged with, and callee
/// entry facts to the caller facts they were bound from.
#[derive(Default)]
pub(crate) struct NeighborTable {
    neighbors: VectorMap<FactId, FxHashSet<FactId>>,
    calling_contexts: VectorMap<FactId, FxHashSet<FactId>>,
}

impl NeighborTable {
    pub fn add_neighbor(&mut self, fact: FactId, neighbor: FactId) -> bool {
        fact != neighbor
            && self
                .neighbors
                .get_or_insert_with(fact, FxHashSet::default)
                .insert(neighbor)
    }

    pub fn add_calling_context(&mut self, fact: FactId, context: FactId) -> bool {
        self.calling_contexts
            .get_or_insert_with(fact, FxHashSet::default)
            .insert(context)
    }

    pub fn neighbors(&self) -> impl Iterator<Item = (usize, &FxHashSet<FactId>)> {
        self.neighbors.iter()
    }

    pub fn calling_contexts(&self) -> impl Iterator<Item = (usize, &FxHashSet<FactId>)> {
        self.calling_contexts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_interner_returns_stable_handles() {
        let mut facts = FactInterner::new();
        let a = facts.intern("a");
        let b = facts.intern("b");
        assert_ne!(a, b);
        assert_eq!(facts.intern("a"), a);
        assert_eq!(*facts.get(b), "b");
        assert_eq!(facts.len(), 2);
    }

    #[test]
    fn test_jump_function_lookups() {
        let mut facts = FactInterner::new();
        let (zero, x, y) = (facts.intern("0"), facts.intern("x"), facts.intern("y"));
        let mut table: JumpFunctionTable<u32, char> = JumpFunctionTable::new();

        assert_eq!(table.insert(zero, 5, x, 'f'), None);
        assert_eq!(table.insert(zero, 5, y, 'g'), None);
        assert_eq!(table.insert(x, 5, y, 'h'), None);
        assert_eq!(table.insert(zero, 5, x, 'k'), Some('f'));

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(zero, 5, x), Some(&'k'));
        assert_eq!(table.get(y, 5, x), None);
        assert_eq!(table.reverse_lookup(5, y).map(|sources| sources.len()), Some(2));
        assert_eq!(table.forward_lookup(zero, 5), vec![(x, &'k'), (y, &'g')]);
        let mut at_five: Vec<FactId> = table.facts_at(5).collect();
        at_five.sort();
        assert_eq!(at_five, vec![x, y]);
        assert_eq!(table.iter().count(), 3);
    }

    #[test]
    fn test_incoming_and_summaries() {
        let mut facts = FactInterner::new();
        let (d, e) = (facts.intern(1), facts.intern(2));
        let mut incoming = IncomingTable::new();
        assert!(incoming.insert(10, d, 3, e));
        assert!(!incoming.insert(10, d, 3, e));
        assert!(incoming.insert(10, d, 1, d));
        assert_eq!(incoming.callers_of(10, d), vec![(1, vec![d]), (3, vec![e])]);
        assert!(incoming.callers_of(10, e).is_empty());

        let mut summaries: EndSummaryTable<u8, u32, &str> = EndSummaryTable::new();
        assert!(summaries.insert(0, d, 12, e, "f"));
        assert!(!summaries.insert(0, d, 12, e, "g"));
        assert_eq!(summaries.summaries_of(0, d), vec![((12, e), "g")]);
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn test_neighbor_table_ignores_self_links() {
        let mut facts = FactInterner::new();
        let (a, b) = (facts.intern('a'), facts.intern('b'));
        let mut table = NeighborTable::default();
        assert!(!table.add_neighbor(a, a));
        assert!(table.add_neighbor(a, b));
        assert!(!table.add_neighbor(a, b));
        assert!(table.add_calling_context(b, a));
        assert_eq!(table.neighbors().count(), 1);
        assert_eq!(table.calling_contexts().count(), 1);
    }
}
