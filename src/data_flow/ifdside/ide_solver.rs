use crate::{
    control_flow::{ICFGEdge, ICFG},
    data_flow::{check_lattice_laws, JoinLattice},
    error::{SolverError, SolverResult},
};
use log::{debug, info, trace, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::time::Instant;

use super::{
    is_upper_bound,
    results::{ExplodedEdgeKind, RawExplodedEdge, ResultTable},
    tables::{EndSummaryTable, FactId, FactInterner, IncomingTable, JumpFunctionTable, NeighborTable, PathEdge},
    AnalysisDomain, BinaryDomain, CancellationToken, EdgeFunction, Func, IDEProblem, IFDSProblem, IFDSToIDE, Inst,
    SolverConfig, SolverStatistics, SolverStatus, StopReason, WorklistOrder,
};

type Value<Domain> = <Domain as AnalysisDomain>::ConcreteValue;

/// Values per node and fact, filled by the value phase.
pub(crate) type ValueTable<Domain> = FxHashMap<Inst<Domain>, FxHashMap<FactId, Value<Domain>>>;

/// Tabulation solver for IDE problems.
///
/// Phase 1 builds jump functions `<d1 @ start(p)> -> <d2 @ n>` until the
/// worklist is exhausted, reusing procedure summaries at every call site that
/// enters a callee with an already analyzed fact. Phase 2 turns the jump
/// functions into values: first at start points and call sites by following
/// calls from the seeds, then everywhere else by evaluating the jump function
/// of each node against the value at its start point.
///
/// A solver runs once; [`IDESolver::solve`] consumes it.
pub struct IDESolver<'a, Domain, Problem, Graph>
where
    Domain: AnalysisDomain,
    Problem: IDEProblem<Domain>,
    Graph: ICFG<Domain::IR>,
{
    problem: &'a Problem,
    icfg: &'a Graph,
    config: SolverConfig,
    cancellation: CancellationToken,

    facts: FactInterner<Domain::FlowFact>,
    zero: FactId,
    jump_functions: JumpFunctionTable<Inst<Domain>, Problem::Weight>,
    incoming: IncomingTable<Inst<Domain>>,
    end_summaries: EndSummaryTable<Func<Domain>, Inst<Domain>, Problem::Weight>,
    call_flows: FxHashMap<(Inst<Domain>, Func<Domain>, FactId), Vec<(FactId, Problem::Weight)>>,
    known_callees: FxHashMap<Inst<Domain>, FxHashSet<Func<Domain>>>,
    call_path_edges: FxHashMap<Inst<Domain>, FxHashSet<(FactId, FactId)>>,
    worklist: VecDeque<PathEdge<Inst<Domain>>>,
    seeds: Vec<(Inst<Domain>, FactId, Value<Domain>)>,
    lattice_samples: Vec<Value<Domain>>,
    neighbors: NeighborTable,
    exploded_edges: Vec<RawExplodedEdge<Inst<Domain>>>,
    statistics: SolverStatistics,
    seen_revision: u64,
}

impl<'a, Domain, Problem, Graph> IDESolver<'a, Domain, Problem, Graph>
where
    Domain: AnalysisDomain,
    Problem: IDEProblem<Domain>,
    Graph: ICFG<Domain::IR>,
{
    pub fn new(problem: &'a Problem, icfg: &'a Graph) -> Self {
        let mut facts = FactInterner::new();
        let zero = facts.intern(problem.zero_value());
        IDESolver {
            problem,
            icfg,
            config: SolverConfig::default(),
            cancellation: CancellationToken::new(),
            facts,
            zero,
            jump_functions: JumpFunctionTable::new(),
            incoming: IncomingTable::new(),
            end_summaries: EndSummaryTable::new(),
            call_flows: FxHashMap::default(),
            known_callees: FxHashMap::default(),
            call_path_edges: FxHashMap::default(),
            worklist: VecDeque::new(),
            seeds: vec![],
            lattice_samples: vec![],
            neighbors: NeighborTable::default(),
            exploded_edges: vec![],
            statistics: SolverStatistics::default(),
            seen_revision: 0,
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// A handle that stops this solver from another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn solve(mut self) -> SolverResult<ResultTable<Domain>> {
        let started = Instant::now();
        info!(
            "solving with {:?} worklist (values: {}, zero: {:?})",
            self.config.worklist_order,
            self.config.compute_values,
            self.facts.get(self.zero)
        );
        self.validate_lattice()?;
        self.initialize()?;

        let status = self.build_jump_functions()?;
        let values = match status {
            SolverStatus::Complete if self.config.compute_values => Some(self.compute_values()?),
            SolverStatus::Complete => None,
            SolverStatus::Incomplete(reason) => {
                warn!("solver stopped before reaching the fixpoint: {reason:?}");
                None
            }
        };

        self.statistics.path_edges = self.jump_functions.len();
        self.statistics.summary_edges = self.end_summaries.len();
        self.statistics.interned_facts = self.facts.len();
        self.statistics.elapsed = started.elapsed();
        info!("solver finished ({status:?})\n{}", self.statistics);
        Ok(self.into_results(status, values))
    }

    fn identity() -> Problem::Weight {
        <Problem::Weight as EdgeFunction<Value<Domain>>>::identity()
    }

    fn validate_lattice(&mut self) -> SolverResult<()> {
        let mut samples = self.problem.lattice_samples();
        samples.push(self.problem.initial_value());
        samples.extend(self.problem.initial_seeds().into_iter().map(|seed| seed.concrete_value));
        check_lattice_laws(&samples).map_err(SolverError::MalformedLattice)?;
        self.lattice_samples = samples;
        Ok(())
    }

    fn initialize(&mut self) -> SolverResult<()> {
        let entry_points = self.problem.entry_points();
        let seeds = self.problem.initial_seeds();
        if entry_points.is_empty() && seeds.is_empty() {
            return Err(SolverError::NoSeeds);
        }

        for function in entry_points {
            let start = self
                .icfg
                .start_point_of(function)
                .ok_or_else(|| SolverError::MissingStartNode {
                    procedure: format!("{function:?}"),
                })?;
            debug!("seeding Λ at {start:?} ({function:?})");
            self.seeds.push((start, self.zero, self.problem.initial_value()));
            self.propagate(self.zero, start, self.zero, Self::identity(), None)?;
        }

        for seed in seeds {
            if !self.icfg.is_start_point(seed.instruction) {
                return Err(SolverError::SeedNotAtStart {
                    node: format!("{:?}", seed.instruction),
                    fact: format!("{:?}", seed.flow_fact),
                });
            }
            debug!("seeding {:?} at {:?}", seed.flow_fact, seed.instruction);
            let fact = self.facts.intern(seed.flow_fact);
            self.seeds.push((seed.instruction, fact, seed.concrete_value));
            self.propagate(fact, seed.instruction, fact, Self::identity(), None)?;
        }

        self.seen_revision = self.icfg.revision();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Phase 1: jump functions
    // ---------------------------------------------------------------------

    fn build_jump_functions(&mut self) -> SolverResult<SolverStatus> {
        let deadline = self.config.timeout.map(|timeout| Instant::now() + timeout);
        loop {
            while let Some(edge) = self.next_path_edge() {
                if let Some(reason) = self.stop_reason(deadline) {
                    self.worklist.clear();
                    return Ok(SolverStatus::Incomplete(reason));
                }
                self.statistics.worklist_iterations += 1;
                self.process(edge)?;
            }
            if !self.rescan_call_sites() {
                return Ok(SolverStatus::Complete);
            }
        }
    }

    fn next_path_edge(&mut self) -> Option<PathEdge<Inst<Domain>>> {
        match self.config.worklist_order {
            WorklistOrder::Fifo => self.worklist.pop_front(),
            WorklistOrder::Lifo => self.worklist.pop_back(),
        }
    }

    fn stop_reason(&self, deadline: Option<Instant>) -> Option<StopReason> {
        if self.cancellation.is_cancelled() {
            Some(StopReason::Cancelled)
        } else if self
            .config
            .max_iterations
            .is_some_and(|limit| self.statistics.worklist_iterations >= limit)
        {
            Some(StopReason::IterationLimit)
        } else if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            Some(StopReason::Timeout)
        } else {
            None
        }
    }

    fn process(&mut self, edge: PathEdge<Inst<Domain>>) -> SolverResult<()> {
        let node = edge.target;
        if self.icfg.is_call(node) {
            debug!(
                "call edge: {:?} -> {:?} @ {node:?}",
                self.facts.get(edge.source_fact),
                self.facts.get(edge.target_fact)
            );
            self.process_call(edge)
        } else if self.icfg.is_exit_point(node) {
            debug!(
                "exit edge: {:?} -> {:?} @ {node:?}",
                self.facts.get(edge.source_fact),
                self.facts.get(edge.target_fact)
            );
            self.process_exit(edge)
        } else {
            debug!(
                "normal edge: {:?} -> {:?} @ {node:?}",
                self.facts.get(edge.source_fact),
                self.facts.get(edge.target_fact)
            );
            self.process_normal(edge)
        }
    }

    fn jump_function(&self, edge: &PathEdge<Inst<Domain>>) -> SolverResult<Problem::Weight> {
        self.jump_functions
            .get(edge.source_fact, edge.target, edge.target_fact)
            .cloned()
            .ok_or_else(|| {
                SolverError::Inconsistency(format!(
                    "path edge to {:?} without a jump function",
                    edge.target
                ))
            })
    }

    fn process_normal(&mut self, edge: PathEdge<Inst<Domain>>) -> SolverResult<()> {
        let node = edge.target;
        let jump_function = self.jump_function(&edge)?;
        let source = self.facts.get(edge.target_fact).clone();
        for succ in self.icfg.successors_of(node) {
            let targets = if self.problem.is_all_identity(node) {
                vec![(source.clone(), Self::identity())]
            } else {
                self.problem.apply_flow(&ICFGEdge::Normal { curr: node, succ }, &source)
            };
            let targets = self.intern_targets(edge.target_fact, targets);
            self.record_exploded_edges(ExplodedEdgeKind::Normal, node, edge.target_fact, succ, &targets);
            for (fact, function) in targets {
                let composed = jump_function.compose_with(&function);
                self.propagate(edge.source_fact, succ, fact, composed, Some(edge.target_fact))?;
            }
        }
        Ok(())
    }

    fn process_call(&mut self, edge: PathEdge<Inst<Domain>>) -> SolverResult<()> {
        let call_site = edge.target;
        let call_fact = edge.target_fact;
        let jump_function = self.jump_function(&edge)?;
        let return_site = self.icfg.return_site_of(call_site);
        let callees = self.icfg.callees_of(call_site);
        let known = self.known_callees.entry(call_site).or_default();
        let first_seen: Vec<Func<Domain>> = callees.iter().copied().filter(|callee| known.insert(*callee)).collect();

        for callee in callees {
            let Some(callee_start) = self.icfg.start_point_of(callee) else {
                if first_seen.contains(&callee) {
                    self.statistics.bodiless_callees += 1;
                    warn!("callee {callee:?} of {call_site:?} has no body; only call-to-return flow applies");
                }
                continue;
            };
            for (entry_fact, call_function) in self.call_flow(call_site, callee, callee_start, call_fact) {
                self.propagate(entry_fact, callee_start, entry_fact, Self::identity(), None)?;
                if self.config.track_neighbors {
                    self.neighbors.add_calling_context(entry_fact, call_fact);
                }
                if self.incoming.insert(callee_start, entry_fact, call_site, call_fact) {
                    self.statistics.incoming_edges += 1;
                }

                let Some(return_site) = return_site else {
                    continue;
                };
                let summaries = self.end_summaries.summaries_of(callee, entry_fact);
                if !summaries.is_empty() {
                    trace!("reusing {} summaries of {callee:?} at {call_site:?}", summaries.len());
                    self.statistics.summary_reuses += 1;
                }
                for ((exit, exit_fact), summary) in summaries {
                    let returned = self.return_flow(call_site, callee, exit, return_site, exit_fact, call_fact);
                    for (fact, return_function) in returned {
                        let composed = jump_function
                            .compose_with(&call_function)
                            .compose_with(&summary)
                            .compose_with(&return_function);
                        self.propagate(edge.source_fact, return_site, fact, composed, Some(call_fact))?;
                    }
                }
            }
        }

        match return_site {
            Some(return_site) => {
                let source = self.facts.get(call_fact).clone();
                let targets = self.problem.apply_flow(
                    &ICFGEdge::CallToReturn {
                        call_site,
                        return_site,
                    },
                    &source,
                );
                let targets = self.intern_targets(call_fact, targets);
                self.record_exploded_edges(ExplodedEdgeKind::CallToReturn, call_site, call_fact, return_site, &targets);
                for (fact, function) in targets {
                    let composed = jump_function.compose_with(&function);
                    self.propagate(edge.source_fact, return_site, fact, composed, Some(call_fact))?;
                }
            }
            None => trace!("{call_site:?} has no return site"),
        }
        Ok(())
    }

    fn process_exit(&mut self, edge: PathEdge<Inst<Domain>>) -> SolverResult<()> {
        let exit = edge.target;
        let entry_fact = edge.source_fact;
        let exit_fact = edge.target_fact;
        let summary = self.jump_function(&edge)?;
        let callee = self.icfg.function_of(exit);
        let callee_start = self.icfg.start_point_of(callee).ok_or_else(|| {
            SolverError::Inconsistency(format!("exit {exit:?} of {callee:?} without a start point"))
        })?;
        if self.end_summaries.insert(callee, entry_fact, exit, exit_fact, summary.clone()) {
            trace!(
                "new summary for {callee:?}: {:?} -> {:?} @ {exit:?}",
                self.facts.get(entry_fact),
                self.facts.get(exit_fact)
            );
        }

        for (call_site, call_facts) in self.incoming.callers_of(callee_start, entry_fact) {
            let Some(return_site) = self.icfg.return_site_of(call_site) else {
                continue;
            };
            for call_fact in call_facts {
                let call_function = self.cached_call_function(call_site, callee, call_fact, entry_fact)?;
                let returned = self.return_flow(call_site, callee, exit, return_site, exit_fact, call_fact);
                if returned.is_empty() {
                    continue;
                }
                let callers: Vec<(FactId, Problem::Weight)> = self
                    .jump_functions
                    .reverse_lookup(call_site, call_fact)
                    .map(|sources| {
                        sources
                            .iter()
                            .map(|(fact, function)| (*fact, function.clone()))
                            .collect()
                    })
                    .unwrap_or_default();
                for (fact, return_function) in &returned {
                    let through_callee = call_function.compose_with(&summary).compose_with(return_function);
                    for (caller_fact, caller_function) in &callers {
                        let composed = caller_function.compose_with(&through_callee);
                        self.propagate(*caller_fact, return_site, *fact, composed, Some(call_fact))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Call flow for `call_fact` into `callee`, computed once per
    /// (call site, callee, fact).
    fn call_flow(
        &mut self,
        call_site: Inst<Domain>,
        callee: Func<Domain>,
        callee_start: Inst<Domain>,
        call_fact: FactId,
    ) -> Vec<(FactId, Problem::Weight)> {
        if let Some(cached) = self.call_flows.get(&(call_site, callee, call_fact)) {
            return cached.clone();
        }
        let source = self.facts.get(call_fact).clone();
        let targets = self.problem.apply_flow(
            &ICFGEdge::Call {
                call_site,
                callee,
                callee_start,
            },
            &source,
        );
        let targets = self.intern_targets(call_fact, targets);
        self.record_exploded_edges(ExplodedEdgeKind::Call, call_site, call_fact, callee_start, &targets);
        self.call_flows
            .insert((call_site, callee, call_fact), targets.clone());
        targets
    }

    fn cached_call_function(
        &self,
        call_site: Inst<Domain>,
        callee: Func<Domain>,
        call_fact: FactId,
        entry_fact: FactId,
    ) -> SolverResult<Problem::Weight> {
        self.call_flows
            .get(&(call_site, callee, call_fact))
            .and_then(|targets| targets.iter().find(|(fact, _)| *fact == entry_fact))
            .map(|(_, function)| function.clone())
            .ok_or_else(|| {
                SolverError::Inconsistency(format!(
                    "incoming edge from {call_site:?} into {callee:?} without a call flow"
                ))
            })
    }

    fn return_flow(
        &mut self,
        call_site: Inst<Domain>,
        callee: Func<Domain>,
        exit: Inst<Domain>,
        return_site: Inst<Domain>,
        exit_fact: FactId,
        call_fact: FactId,
    ) -> Vec<(FactId, Problem::Weight)> {
        let exit_value = self.facts.get(exit_fact).clone();
        let call_value = self.facts.get(call_fact).clone();
        let targets = self.problem.apply_return_flow(
            &ICFGEdge::Return {
                call_site,
                callee,
                exit,
                return_site,
            },
            &exit_value,
            &call_value,
        );
        let targets = self.intern_targets(exit_fact, targets);
        self.record_exploded_edges(ExplodedEdgeKind::Return, exit, exit_fact, return_site, &targets);
        targets
    }

    /// Interns the facts a flow function produced. Duplicates are joined, Λ
    /// maps to itself through the identity, and Λ is kept alive when
    /// `auto_add_zero` is set.
    fn intern_targets(
        &mut self,
        source: FactId,
        targets: Vec<(Domain::FlowFact, Problem::Weight)>,
    ) -> Vec<(FactId, Problem::Weight)> {
        let mut interned: Vec<(FactId, Problem::Weight)> = Vec::with_capacity(targets.len() + 1);
        for (fact, function) in targets {
            let fact = self.facts.intern(fact);
            let function = if source == self.zero && fact == self.zero {
                Self::identity()
            } else {
                function
            };
            match interned.iter_mut().find(|(existing, _)| *existing == fact) {
                Some((_, existing)) => *existing = existing.join_with(&function),
                None => interned.push((fact, function)),
            }
        }
        if self.config.auto_add_zero
            && source == self.zero
            && !interned.iter().any(|(fact, _)| *fact == self.zero)
        {
            interned.push((self.zero, Self::identity()));
        }
        interned
    }

    fn record_exploded_edges(
        &mut self,
        kind: ExplodedEdgeKind,
        from: Inst<Domain>,
        from_fact: FactId,
        to: Inst<Domain>,
        targets: &[(FactId, Problem::Weight)],
    ) {
        if !self.config.record_esg {
            return;
        }
        self.exploded_edges
            .extend(targets.iter().map(|(to_fact, _)| RawExplodedEdge {
                kind,
                from,
                from_fact,
                to,
                to_fact: *to_fact,
            }));
    }

    /// Records `function` for the path edge `<d1 @ start> -> <d2 @ node>`,
    /// joining with what is already there. The edge is (re-)queued whenever
    /// the stored function changes.
    fn propagate(
        &mut self,
        source_fact: FactId,
        node: Inst<Domain>,
        target_fact: FactId,
        function: Problem::Weight,
        origin: Option<FactId>,
    ) -> SolverResult<()> {
        let updated = match self.jump_functions.get(source_fact, node, target_fact).cloned() {
            None => Some(function),
            Some(previous) => {
                let joined = previous.join_with(&function);
                if self.config.check_monotonicity
                    && !is_upper_bound(&joined, &previous, &function, &self.lattice_samples)
                {
                    return Err(SolverError::NonMonotoneJoin {
                        node: format!("{node:?}"),
                        fact: format!("{:?}", self.facts.get(target_fact)),
                        detail: format!("{previous:?} ⊔ {function:?} = {joined:?}"),
                    });
                }
                if joined == previous {
                    if let (true, Some(origin)) = (self.config.track_neighbors, origin) {
                        self.neighbors.add_neighbor(target_fact, origin);
                    }
                    None
                } else {
                    self.statistics.jump_function_updates += 1;
                    Some(joined)
                }
            }
        };

        if let Some(function) = updated {
            trace!(
                "propagate {:?} -> {:?} @ {node:?}: {function:?}",
                self.facts.get(source_fact),
                self.facts.get(target_fact)
            );
            self.jump_functions.insert(source_fact, node, target_fact, function);
            if self.icfg.is_call(node) {
                self.call_path_edges
                    .entry(node)
                    .or_default()
                    .insert((source_fact, target_fact));
            }
            self.worklist.push_back(PathEdge {
                source_fact,
                target: node,
                target_fact,
            });
        }
        Ok(())
    }

    /// Re-queues the path edges of every processed call site whose callee set
    /// grew since it was last visited. Returns whether anything was queued.
    fn rescan_call_sites(&mut self) -> bool {
        let revision = self.icfg.revision();
        if revision == self.seen_revision {
            return false;
        }
        self.seen_revision = revision;

        let mut call_sites: Vec<Inst<Domain>> = self.call_path_edges.keys().copied().collect();
        call_sites.sort();
        let mut requeued = false;
        for call_site in call_sites {
            let known = self.known_callees.get(&call_site);
            let has_new_callee = self
                .icfg
                .callees_of(call_site)
                .iter()
                .any(|callee| known.map_or(true, |known| !known.contains(callee)));
            if !has_new_callee {
                continue;
            }
            debug!("callees of {call_site:?} changed, rescanning");
            self.statistics.callee_rescans += 1;
            let mut edges: Vec<(FactId, FactId)> = self.call_path_edges[&call_site].iter().copied().collect();
            edges.sort();
            for (source_fact, target_fact) in edges {
                self.worklist.push_back(PathEdge {
                    source_fact,
                    target: call_site,
                    target_fact,
                });
                requeued = true;
            }
        }
        requeued
    }

    // ---------------------------------------------------------------------
    // Phase 2: values
    // ---------------------------------------------------------------------

    fn compute_values(&mut self) -> SolverResult<ValueTable<Domain>> {
        let mut values: ValueTable<Domain> = FxHashMap::default();

        // Phase 2.1: values at start points and call sites, following calls from the seeds.
        let mut worklist: VecDeque<(Inst<Domain>, FactId)> = VecDeque::new();
        for (start, fact, value) in self.seeds.clone() {
            self.insert_or_join(&mut values, &mut worklist, start, fact, value)?;
        }
        while let Some((node, fact)) = worklist.pop_front() {
            let value = values
                .get(&node)
                .and_then(|facts| facts.get(&fact))
                .cloned()
                .ok_or_else(|| SolverError::Inconsistency(format!("queued value at {node:?} is missing")))?;

            if self.icfg.is_start_point(node) {
                for call_site in self.icfg.calls_within(self.icfg.function_of(node)) {
                    let reached: Vec<(FactId, Value<Domain>)> = self
                        .jump_functions
                        .forward_lookup(fact, call_site)
                        .into_iter()
                        .map(|(target_fact, function)| (target_fact, function.compute_target(&value)))
                        .collect();
                    for (target_fact, computed) in reached {
                        self.insert_or_join(&mut values, &mut worklist, call_site, target_fact, computed)?;
                    }
                }
            }

            if self.icfg.is_call(node) {
                let mut callees: Vec<Func<Domain>> = self
                    .known_callees
                    .get(&node)
                    .map(|callees| callees.iter().copied().collect())
                    .unwrap_or_default();
                callees.sort();
                for callee in callees {
                    let Some(callee_start) = self.icfg.start_point_of(callee) else {
                        continue;
                    };
                    let entries = self.call_flows.get(&(node, callee, fact)).cloned().unwrap_or_default();
                    for (entry_fact, call_function) in entries {
                        let computed = call_function.compute_target(&value);
                        self.insert_or_join(&mut values, &mut worklist, callee_start, entry_fact, computed)?;
                    }
                }
            }
        }

        // Phase 2.2: every jump function, from the value at the start point of its procedure.
        // Start points are included: a loop back to the first node reaches it with new facts.
        let mut computed: Vec<(Inst<Domain>, FactId, Value<Domain>)> = vec![];
        for (node, target_fact, source_fact, function) in self.jump_functions.iter() {
            let Some(start) = self.icfg.start_point_of(self.icfg.function_of(node)) else {
                continue;
            };
            if let Some(start_value) = values.get(&start).and_then(|facts| facts.get(&source_fact)) {
                computed.push((node, target_fact, function.compute_target(start_value)));
            }
        }
        let mut ignored = VecDeque::new();
        for (node, fact, value) in computed {
            self.insert_or_join(&mut values, &mut ignored, node, fact, value)?;
        }
        Ok(values)
    }

    fn insert_or_join(
        &mut self,
        values: &mut ValueTable<Domain>,
        worklist: &mut VecDeque<(Inst<Domain>, FactId)>,
        node: Inst<Domain>,
        fact: FactId,
        value: Value<Domain>,
    ) -> SolverResult<()> {
        let at_node = values.entry(node).or_default();
        let updated = match at_node.get(&fact) {
            None => value,
            Some(previous) => {
                let joined = previous.join(&value);
                if self.config.check_monotonicity && !(previous.leq(&joined) && value.leq(&joined)) {
                    return Err(SolverError::NonMonotoneJoin {
                        node: format!("{node:?}"),
                        fact: format!("{:?}", self.facts.get(fact)),
                        detail: format!("{previous:?} ⊔ {value:?} = {joined:?}"),
                    });
                }
                if joined == *previous {
                    return Ok(());
                }
                joined
            }
        };
        trace!("value {:?} @ {node:?} = {updated:?}", self.facts.get(fact));
        at_node.insert(fact, updated);
        self.statistics.value_propagations += 1;
        worklist.push_back((node, fact));
        Ok(())
    }

    fn into_results(self, status: SolverStatus, values: Option<ValueTable<Domain>>) -> ResultTable<Domain> {
        let mut reached: Vec<(Inst<Domain>, FactId)> = vec![];
        for node in self.jump_functions.targets() {
            reached.extend(self.jump_functions.facts_at(node).map(|fact| (node, fact)));
        }
        let facts = &self.facts;
        ResultTable::build(
            self.icfg,
            facts,
            self.zero,
            reached,
            values,
            status,
            self.statistics,
            &self.neighbors,
            self.exploded_edges,
        )
    }
}

/// Solves an [`IFDSProblem`] by running the IDE solver over [`BinaryDomain`]
/// without the value phase.
pub struct IFDSSolver<'a, Domain, Problem, Graph> {
    problem: &'a Problem,
    icfg: &'a Graph,
    config: SolverConfig,
    cancellation: CancellationToken,
    domain: PhantomData<Domain>,
}

impl<'a, Domain, Problem, Graph> IFDSSolver<'a, Domain, Problem, Graph>
where
    Domain: AnalysisDomain<ConcreteValue = BinaryDomain>,
    Problem: IFDSProblem<Domain>,
    Graph: ICFG<Domain::IR>,
{
    pub fn new(problem: &'a Problem, icfg: &'a Graph) -> Self {
        IFDSSolver {
            problem,
            icfg,
            config: SolverConfig::default().with_compute_values(false),
            cancellation: CancellationToken::new(),
            domain: PhantomData,
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn solve(self) -> SolverResult<ResultTable<Domain>> {
        let problem = IFDSToIDE::new(self.problem);
        IDESolver::<Domain, IFDSToIDE<'_, Problem>, Graph>::new(&problem, self.icfg)
            .with_config(self.config)
            .with_cancellation(self.cancellation)
            .solve()
    }
}
