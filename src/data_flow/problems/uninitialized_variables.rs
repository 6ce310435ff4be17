use crate::{
    control_flow::ICFGEdge,
    data_flow::ifdside::{
        flow_function::{generate, transfer},
        AnalysisDomain, AnalysisResults, BinaryDomain, IFDSProblem, Reachability, ResultTable,
    },
    ir::toy::{FuncId, InstId, Program, Stmt, ToyIR, Var},
};
use std::collections::{BTreeMap, BTreeSet};

use super::{parameter_bindings, VarFact};

pub struct UninitDomain;

impl AnalysisDomain for UninitDomain {
    type IR = ToyIR;
    type FlowFact = VarFact;
    type ConcreteValue = BinaryDomain;
}

/// Tracks variables that may be read before they were assigned.
///
/// `decl x` makes `x` uninitialized; any assignment from initialized operands
/// clears it. Parameters without a matching argument start out
/// uninitialized.
pub struct UninitializedVariables<'p> {
    program: &'p Program,
    entry_points: Vec<FuncId>,
    check_actual_parameters: bool,
}

impl<'p> UninitializedVariables<'p> {
    pub fn new(program: &'p Program, entry_points: &[FuncId]) -> Self {
        UninitializedVariables {
            program,
            entry_points: entry_points.to_vec(),
            check_actual_parameters: false,
        }
    }

    /// Also report uninitialized variables passed as call arguments.
    pub fn with_actual_parameter_check(mut self, check_actual_parameters: bool) -> Self {
        self.check_actual_parameters = check_actual_parameters;
        self
    }

    /// Statements reading a variable that may be uninitialized there.
    pub fn undefined_uses(&self, results: &ResultTable<UninitDomain>) -> BTreeMap<InstId, BTreeSet<Var>> {
        let mut uses: BTreeMap<InstId, BTreeSet<Var>> = BTreeMap::new();
        for inst in results.reached_nodes() {
            let stmt = self.program.stmt(inst);
            if matches!(stmt, Stmt::Call { .. }) && !self.check_actual_parameters {
                continue;
            }
            for var in stmt.reads() {
                if results.holds_fact(inst, &VarFact::Var(var)) == Reachability::Reachable {
                    uses.entry(inst).or_default().insert(var);
                }
            }
        }
        uses
    }

    fn normal_flow(&self, stmt: &Stmt, source: &VarFact) -> Vec<VarFact> {
        match (stmt, source) {
            (Stmt::Decl(var), _) => generate(source, &VarFact::Zero, [VarFact::Var(*var)]),
            (_, VarFact::Zero) => vec![VarFact::Zero],
            (_, VarFact::Var(var)) => {
                let reads = stmt.reads();
                let written = stmt.writes();
                let mut facts = vec![];
                if written != Some(*var) || reads.contains(var) {
                    facts.push(*source);
                }
                if let (Some(written), true) = (written, reads.contains(var)) {
                    if written != *var {
                        facts.push(VarFact::Var(written));
                    }
                }
                facts
            }
        }
    }
}

impl IFDSProblem<UninitDomain> for UninitializedVariables<'_> {
    fn zero_value(&self) -> VarFact {
        VarFact::Zero
    }

    fn entry_points(&self) -> Vec<FuncId> {
        self.entry_points.clone()
    }

    fn apply_flow(&self, edge: &ICFGEdge<ToyIR>, source: &VarFact) -> Vec<VarFact> {
        match *edge {
            ICFGEdge::Normal { curr, .. } => self.normal_flow(self.program.stmt(curr), source),
            ICFGEdge::Call {
                call_site, callee, ..
            } => {
                let Stmt::Call { args, .. } = self.program.stmt(call_site) else {
                    return vec![];
                };
                let params = self.program.params(callee);
                match source {
                    VarFact::Zero => {
                        let unbound = params.iter().skip(args.len()).map(|param| VarFact::Var(*param));
                        generate(source, &VarFact::Zero, unbound)
                    }
                    VarFact::Var(_) => transfer(source, &parameter_bindings(args, params)),
                }
            }
            ICFGEdge::Return {
                call_site, exit, ..
            } => match (self.program.stmt(call_site), self.program.stmt(exit), source) {
                (_, _, VarFact::Zero) => vec![VarFact::Zero],
                (Stmt::Call { result: Some(result), .. }, Stmt::Return(Some(returned)), VarFact::Var(var))
                    if var == returned =>
                {
                    vec![VarFact::Var(*result)]
                }
                _ => vec![],
            },
            ICFGEdge::CallToReturn { call_site, .. } => match (self.program.stmt(call_site), source) {
                (Stmt::Call { result: Some(result), .. }, VarFact::Var(var)) if var == result => vec![],
                _ => vec![*source],
            },
        }
    }

    fn is_all_identity(&self, at: InstId) -> bool {
        matches!(self.program.stmt(at), Stmt::Nop | Stmt::Use(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_flow::ifdside::IFDSSolver;
    use crate::ir::toy::{Callee, ProgramBuilder};

    use test_log::test;

    #[test]
    fn test_copy_propagates_and_assignment_clears() {
        let mut builder = ProgramBuilder::new();
        let main = builder.declare("main", &[]);
        builder.stmt(main, Stmt::Decl("x"));
        let copy = builder.stmt(main, Stmt::Copy("y", "x"));
        let use_y = builder.stmt(main, Stmt::Use("y"));
        builder.stmt(main, Stmt::Const("x", 1));
        let use_x = builder.stmt(main, Stmt::Use("x"));
        let program = builder.build();

        let problem = UninitializedVariables::new(&program, &[main]);
        let results = IFDSSolver::new(&problem, program.icfg()).solve().unwrap();
        let uses = problem.undefined_uses(&results);

        assert_eq!(uses.get(&copy), Some(&BTreeSet::from(["x"])));
        assert_eq!(uses.get(&use_y), Some(&BTreeSet::from(["y"])));
        assert_eq!(uses.get(&use_x), None);
    }

    #[test]
    fn test_actual_parameters_only_reported_on_request() {
        let mut builder = ProgramBuilder::new();
        let main = builder.declare("main", &[]);
        let callee = builder.declare("ext", &["p"]);
        builder.stmt(main, Stmt::Decl("x"));
        let call = builder.stmt(
            main,
            Stmt::Call {
                callee: Callee::Direct(callee),
                args: vec!["x"],
                result: None,
            },
        );
        let program = builder.build();

        let problem = UninitializedVariables::new(&program, &[main]);
        let results = IFDSSolver::new(&problem, program.icfg()).solve().unwrap();
        assert!(problem.undefined_uses(&results).is_empty());

        let problem = problem.with_actual_parameter_check(true);
        assert_eq!(
            problem.undefined_uses(&results).get(&call),
            Some(&BTreeSet::from(["x"]))
        );
    }
}
