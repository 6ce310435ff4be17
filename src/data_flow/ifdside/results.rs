use crate::{
    control_flow::{ProgramPos, ICFG},
    data_flow::JoinLattice,
};
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use super::{
    ide_solver::ValueTable,
    tables::{FactId, FactInterner, NeighborTable},
    AnalysisDomain, Func, Inst, SolverStatistics, SolverStatus,
};

pub struct ResultEntry<Domain: AnalysisDomain> {
    pub instruction: ProgramPos<Domain::IR>,
    pub flow_fact: Domain::FlowFact,
    pub concrete_value: Domain::ConcreteValue,
}

impl<Domain: AnalysisDomain> fmt::Debug for ResultEntry<Domain> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {:?} = {:?}",
            self.instruction, self.flow_fact, self.concrete_value
        )
    }
}

/// Whether a fact reaches a node. `Unknown` is only reported by runs that
/// stopped early, where absence proves nothing.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Reachability {
    Reachable,
    Unreachable,
    Unknown,
}

/// Read access to the facts (and values) holding before each node.
pub trait AnalysisResults<Domain: AnalysisDomain> {
    /// Whether the node was reached at all.
    fn has_results_at(&self, at_inst: Inst<Domain>) -> bool;

    fn holds_fact(&self, at_inst: Inst<Domain>, fact: &Domain::FlowFact) -> Reachability;

    /// The value of `fact` before `at_inst`; bottom if the fact does not reach it.
    fn result_at(&self, at_inst: Inst<Domain>, fact: &Domain::FlowFact) -> Domain::ConcreteValue;

    /// Every fact reaching `at_inst` other than Λ, with its value.
    fn results_at(&self, at_inst: Inst<Domain>) -> HashMap<Domain::FlowFact, Domain::ConcreteValue>;
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ExplodedEdgeKind {
    Normal,
    Call,
    Return,
    CallToReturn,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct RawExplodedEdge<N> {
    pub kind: ExplodedEdgeKind,
    pub from: N,
    pub from_fact: FactId,
    pub to: N,
    pub to_fact: FactId,
}

/// One edge of the exploded supergraph, as produced by a flow function.
pub struct ExplodedEdge<Domain: AnalysisDomain> {
    pub kind: ExplodedEdgeKind,
    pub from: Inst<Domain>,
    pub from_fact: Domain::FlowFact,
    pub to: Inst<Domain>,
    pub to_fact: Domain::FlowFact,
}

impl<Domain: AnalysisDomain> fmt::Debug for ExplodedEdge<Domain> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: <{:?}, {:?}> -> <{:?}, {:?}>",
            self.kind, self.from, self.from_fact, self.to, self.to_fact
        )
    }
}

struct NodeResults<Domain: AnalysisDomain> {
    function: Func<Domain>,
    values: HashMap<Domain::FlowFact, Domain::ConcreteValue>,
}

/// The outcome of one solver run.
pub struct ResultTable<Domain: AnalysisDomain> {
    rows: BTreeMap<Inst<Domain>, NodeResults<Domain>>,
    zero: Domain::FlowFact,
    status: SolverStatus,
    statistics: SolverStatistics,
    neighbors: HashMap<Domain::FlowFact, Vec<Domain::FlowFact>>,
    calling_contexts: HashMap<Domain::FlowFact, Vec<Domain::FlowFact>>,
    exploded_edges: Vec<ExplodedEdge<Domain>>,
}

fn resolve_links<'t, D: Clone + Eq + Hash>(
    facts: &FactInterner<D>,
    links: impl Iterator<Item = (usize, &'t FxHashSet<FactId>)>,
) -> HashMap<D, Vec<D>> {
    links
        .map(|(index, linked)| {
            let mut linked: Vec<FactId> = linked.iter().copied().collect();
            linked.sort();
            (
                facts.by_index(index).clone(),
                linked.into_iter().map(|fact| facts.get(fact).clone()).collect(),
            )
        })
        .collect()
}

impl<Domain: AnalysisDomain> ResultTable<Domain> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build<G: ICFG<Domain::IR>>(
        icfg: &G,
        facts: &FactInterner<Domain::FlowFact>,
        zero: FactId,
        reached: Vec<(Inst<Domain>, FactId)>,
        values: Option<ValueTable<Domain>>,
        status: SolverStatus,
        statistics: SolverStatistics,
        neighbors: &NeighborTable,
        exploded_edges: Vec<RawExplodedEdge<Inst<Domain>>>,
    ) -> Self {
        let mut rows: BTreeMap<Inst<Domain>, NodeResults<Domain>> = BTreeMap::new();
        for (node, fact) in reached {
            let value = match &values {
                Some(values) => values
                    .get(&node)
                    .and_then(|at_node| at_node.get(&fact))
                    .cloned()
                    .unwrap_or_else(<Domain::ConcreteValue as JoinLattice>::bottom_value),
                None => <Domain::ConcreteValue as JoinLattice>::top_value(),
            };
            rows.entry(node)
                .or_insert_with(|| NodeResults {
                    function: icfg.function_of(node),
                    values: HashMap::new(),
                })
                .values
                .insert(facts.get(fact).clone(), value);
        }

        ResultTable {
            rows,
            zero: facts.get(zero).clone(),
            status,
            statistics,
            neighbors: resolve_links(facts, neighbors.neighbors()),
            calling_contexts: resolve_links(facts, neighbors.calling_contexts()),
            exploded_edges: exploded_edges
                .into_iter()
                .map(|edge| ExplodedEdge {
                    kind: edge.kind,
                    from: edge.from,
                    from_fact: facts.get(edge.from_fact).clone(),
                    to: edge.to,
                    to_fact: facts.get(edge.to_fact).clone(),
                })
                .collect(),
        }
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    pub fn statistics(&self) -> &SolverStatistics {
        &self.statistics
    }

    pub fn zero_value(&self) -> &Domain::FlowFact {
        &self.zero
    }

    /// Facts reaching `at_inst` other than Λ, without their values.
    pub fn ifds_results_at(&self, at_inst: Inst<Domain>) -> HashSet<Domain::FlowFact> {
        self.results_at(at_inst).into_keys().collect()
    }

    /// Reached nodes in ascending order.
    pub fn reached_nodes(&self) -> impl Iterator<Item = Inst<Domain>> + '_ {
        self.rows.keys().copied()
    }

    /// All (node, fact, value) triples other than Λ, ordered by node.
    pub fn entries(&self) -> impl Iterator<Item = ResultEntry<Domain>> + '_ {
        self.rows.iter().flat_map(move |(instruction, row)| {
            row.values
                .iter()
                .filter(move |(fact, _)| **fact != self.zero)
                .map(move |(fact, value)| ResultEntry {
                    instruction: ProgramPos {
                        function: row.function,
                        instruction: *instruction,
                    },
                    flow_fact: fact.clone(),
                    concrete_value: value.clone(),
                })
        })
    }

    /// Facts that reached a node together with `fact` and were merged into it.
    /// Empty unless neighbor tracking was enabled.
    pub fn neighbors_of(&self, fact: &Domain::FlowFact) -> &[Domain::FlowFact] {
        self.neighbors.get(fact).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Caller facts `fact` was bound from when entering a callee. Empty unless
    /// neighbor tracking was enabled.
    pub fn calling_contexts_of(&self, fact: &Domain::FlowFact) -> &[Domain::FlowFact] {
        self.calling_contexts
            .get(fact)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Empty unless supergraph recording was enabled.
    pub fn exploded_edges(&self) -> &[ExplodedEdge<Domain>] {
        &self.exploded_edges
    }
}

impl<Domain: AnalysisDomain> AnalysisResults<Domain> for ResultTable<Domain> {
    fn has_results_at(&self, at_inst: Inst<Domain>) -> bool {
        self.rows.contains_key(&at_inst)
    }

    fn holds_fact(&self, at_inst: Inst<Domain>, fact: &Domain::FlowFact) -> Reachability {
        let reached = self
            .rows
            .get(&at_inst)
            .is_some_and(|row| row.values.contains_key(fact));
        match (reached, self.status) {
            (true, _) => Reachability::Reachable,
            (false, SolverStatus::Complete) => Reachability::Unreachable,
            (false, SolverStatus::Incomplete(_)) => Reachability::Unknown,
        }
    }

    fn result_at(&self, at_inst: Inst<Domain>, fact: &Domain::FlowFact) -> Domain::ConcreteValue {
        self.rows
            .get(&at_inst)
            .and_then(|row| row.values.get(fact))
            .cloned()
            .unwrap_or_else(<Domain::ConcreteValue as JoinLattice>::bottom_value)
    }

    fn results_at(&self, at_inst: Inst<Domain>) -> HashMap<Domain::FlowFact, Domain::ConcreteValue> {
        self.rows
            .get(&at_inst)
            .map(|row| {
                row.values
                    .iter()
                    .filter(|(fact, _)| **fact != self.zero)
                    .map(|(fact, value)| (fact.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
