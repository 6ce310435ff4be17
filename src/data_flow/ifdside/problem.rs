use crate::{
    control_flow::ICFGEdge,
    data_flow::JoinLattice,
    ir::IRDescription,
};
use std::fmt::Debug;
use std::hash::Hash;

use super::{BinaryDomain, BinaryEdgeFunction, EdgeFunction};

pub trait AnalysisDomain {
    type IR: IRDescription;
    type FlowFact: Clone + Hash + Eq + Debug;
    type ConcreteValue: JoinLattice;
}

pub type Inst<Domain> = <<Domain as AnalysisDomain>::IR as IRDescription>::Instruction;
pub type Func<Domain> = <<Domain as AnalysisDomain>::IR as IRDescription>::Function;

/// A fact with its initial value at the start point of a procedure.
pub struct Seed<Domain: AnalysisDomain> {
    pub instruction: Inst<Domain>,
    pub flow_fact: Domain::FlowFact,
    pub concrete_value: Domain::ConcreteValue,
}

impl<Domain: AnalysisDomain> Seed<Domain> {
    pub fn new(
        instruction: Inst<Domain>,
        flow_fact: Domain::FlowFact,
        concrete_value: Domain::ConcreteValue,
    ) -> Self {
        Seed {
            instruction,
            flow_fact,
            concrete_value,
        }
    }
}

/// An IDE problem: flow functions together with the edge functions of every
/// fact they generate.
pub trait IDEProblem<Domain: AnalysisDomain> {
    type Weight: EdgeFunction<Domain::ConcreteValue>;

    /// The distinguished Λ fact. It must not be part of the problem's own
    /// fact domain.
    fn zero_value(&self) -> Domain::FlowFact;

    /// Procedures whose start points are seeded with Λ.
    fn entry_points(&self) -> Vec<Func<Domain>>;

    /// Additional seeds; each must sit on the start point of its procedure.
    fn initial_seeds(&self) -> Vec<Seed<Domain>> {
        vec![]
    }

    /// The value Λ carries at every entry point.
    fn initial_value(&self) -> Domain::ConcreteValue {
        <Domain::ConcreteValue as JoinLattice>::bottom_value()
    }

    /// Facts (and their edge functions) holding after `edge` given that
    /// `source` held before it.
    fn apply_flow(
        &self,
        edge: &ICFGEdge<Domain::IR>,
        source: &Domain::FlowFact,
    ) -> Vec<(Domain::FlowFact, Self::Weight)>;

    /// Return flow with the fact that held at the call site before the call.
    /// Only invoked with [`ICFGEdge::Return`].
    fn apply_return_flow(
        &self,
        edge: &ICFGEdge<Domain::IR>,
        exit_fact: &Domain::FlowFact,
        call_fact: &Domain::FlowFact,
    ) -> Vec<(Domain::FlowFact, Self::Weight)> {
        let _ = call_fact;
        self.apply_flow(edge, exit_fact)
    }

    /// Hint that every normal flow out of `at` is the identity, letting the
    /// solver skip `apply_flow` there.
    fn is_all_identity(&self, at: Inst<Domain>) -> bool {
        let _ = at;
        false
    }

    /// Representative lattice values used to validate the lattice before
    /// solving and to probe joins when monotonicity checking is on.
    fn lattice_samples(&self) -> Vec<Domain::ConcreteValue> {
        vec![]
    }
}

/// An IFDS problem: plain reachability of facts.
pub trait IFDSProblem<Domain: AnalysisDomain<ConcreteValue = BinaryDomain>> {
    fn zero_value(&self) -> Domain::FlowFact;

    fn entry_points(&self) -> Vec<Func<Domain>>;

    fn initial_seeds(&self) -> Vec<(Inst<Domain>, Domain::FlowFact)> {
        vec![]
    }

    fn apply_flow(
        &self,
        edge: &ICFGEdge<Domain::IR>,
        source: &Domain::FlowFact,
    ) -> Vec<Domain::FlowFact>;

    fn apply_return_flow(
        &self,
        edge: &ICFGEdge<Domain::IR>,
        exit_fact: &Domain::FlowFact,
        call_fact: &Domain::FlowFact,
    ) -> Vec<Domain::FlowFact> {
        let _ = call_fact;
        self.apply_flow(edge, exit_fact)
    }

    fn is_all_identity(&self, at: Inst<Domain>) -> bool {
        let _ = at;
        false
    }
}

/// Presents an [`IFDSProblem`] as an [`IDEProblem`] over [`BinaryDomain`]:
/// every generated fact carries the identity, so a reached fact holds `Top`.
pub struct IFDSToIDE<'p, P> {
    problem: &'p P,
}

impl<'p, P> IFDSToIDE<'p, P> {
    pub fn new(problem: &'p P) -> Self {
        IFDSToIDE { problem }
    }
}

fn with_identity<D>(facts: Vec<D>) -> Vec<(D, BinaryEdgeFunction)> {
    facts
        .into_iter()
        .map(|fact| (fact, BinaryEdgeFunction::Identity))
        .collect()
}

impl<'p, Domain, P> IDEProblem<Domain> for IFDSToIDE<'p, P>
where
    Domain: AnalysisDomain<ConcreteValue = BinaryDomain>,
    P: IFDSProblem<Domain>,
{
    type Weight = BinaryEdgeFunction;

    fn zero_value(&self) -> Domain::FlowFact {
        self.problem.zero_value()
    }

    fn entry_points(&self) -> Vec<Func<Domain>> {
        self.problem.entry_points()
    }

    fn initial_seeds(&self) -> Vec<Seed<Domain>> {
        self.problem
            .initial_seeds()
            .into_iter()
            .map(|(instruction, fact)| Seed::new(instruction, fact, BinaryDomain::Top))
            .collect()
    }

    fn initial_value(&self) -> BinaryDomain {
        BinaryDomain::Top
    }

    fn apply_flow(
        &self,
        edge: &ICFGEdge<Domain::IR>,
        source: &Domain::FlowFact,
    ) -> Vec<(Domain::FlowFact, BinaryEdgeFunction)> {
        with_identity(self.problem.apply_flow(edge, source))
    }

    fn apply_return_flow(
        &self,
        edge: &ICFGEdge<Domain::IR>,
        exit_fact: &Domain::FlowFact,
        call_fact: &Domain::FlowFact,
    ) -> Vec<(Domain::FlowFact, BinaryEdgeFunction)> {
        with_identity(self.problem.apply_return_flow(edge, exit_fact, call_fact))
    }

    fn is_all_identity(&self, at: Inst<Domain>) -> bool {
        self.problem.is_all_identity(at)
    }
}
