use ifds_ide::control_flow::{CFG, ICFG};
use ifds_ide::data_flow::ifdside::{
    AnalysisResults, ExplodedEdgeKind, IFDSSolver, Reachability, SolverConfig,
};
use ifds_ide::data_flow::problems::{UninitializedVariables, VarFact};
use ifds_ide::ir::toy::{Callee, ProgramBuilder, Stmt};
use std::collections::BTreeSet;

use test_log::test;

#[test]
fn test_undefined_uses_in_straight_line_code() {
    let mut builder = ProgramBuilder::new();
    let main = builder.declare("main", &[]);
    builder.stmt(main, Stmt::Decl("x"));
    builder.stmt(main, Stmt::Decl("y"));
    builder.stmt(main, Stmt::Const("y", 3));
    builder.stmt(main, Stmt::Copy("z", "y"));
    builder.stmt(main, Stmt::Use("z"));
    let add = builder.stmt(main, Stmt::Add("w", "x", "y"));
    let use_w = builder.stmt(main, Stmt::Use("w"));
    let program = builder.build();

    let problem = UninitializedVariables::new(&program, &[main]);
    let results = IFDSSolver::new(&problem, program.icfg()).solve().unwrap();
    let uses = problem.undefined_uses(&results);

    assert_eq!(uses.len(), 2, "{uses:?}");
    assert_eq!(uses[&add], BTreeSet::from(["x"]));
    assert_eq!(uses[&use_w], BTreeSet::from(["w"]));
    assert!(results.is_complete());
}

#[test]
fn test_zero_fact_reaches_every_reachable_node() {
    let mut builder = ProgramBuilder::new();
    let main = builder.declare("main", &[]);
    let helper = builder.declare("helper", &["p"]);
    builder.stmt(helper, Stmt::Use("p"));
    builder.stmt(main, Stmt::Decl("x"));
    let cond = builder.stmt(main, Stmt::Nop);
    builder.stmt(
        main,
        Stmt::Call {
            callee: Callee::Direct(helper),
            args: vec!["x"],
            result: None,
        },
    );
    let join = builder.stmt(main, Stmt::Use("x"));
    builder.branch(main, cond, join);
    let program = builder.build();

    let problem = UninitializedVariables::new(&program, &[main]);
    let results = IFDSSolver::new(&problem, program.icfg()).solve().unwrap();

    for function in [main, helper] {
        for inst in program.icfg().instructions_of(function) {
            assert!(results.has_results_at(inst), "{inst:?} not reached");
            assert_eq!(results.holds_fact(inst, &VarFact::Zero), Reachability::Reachable);
            assert!(!results.ifds_results_at(inst).contains(&VarFact::Zero));
        }
    }
    let helper_use = program.icfg().start_point_of(helper).unwrap();
    assert_eq!(
        results.holds_fact(helper_use, &VarFact::Var("p")),
        Reachability::Reachable
    );
    assert_eq!(
        results.holds_fact(helper_use, &VarFact::Var("x")),
        Reachability::Unreachable
    );
}

#[test]
fn test_return_value_and_call_to_return_kill() {
    let mut builder = ProgramBuilder::new();
    let main = builder.declare("main", &[]);
    let id = builder.declare("id", &["p"]);
    builder.stmt(id, Stmt::Return(Some("p")));
    builder.stmt(main, Stmt::Decl("a"));
    builder.stmt(main, Stmt::Decl("r"));
    let call = builder.stmt(
        main,
        Stmt::Call {
            callee: Callee::Direct(id),
            args: vec!["a"],
            result: Some("r"),
        },
    );
    builder.stmt(main, Stmt::Const("a", 0));
    let use_r = builder.stmt(main, Stmt::Use("r"));
    let program = builder.build();

    let problem = UninitializedVariables::new(&program, &[main]);
    let results = IFDSSolver::new(&problem, program.icfg()).solve().unwrap();
    let return_site = program.icfg().return_site_of(call).unwrap();

    // `r` is killed by the call but comes back through the returned `p`.
    assert!(results.ifds_results_at(return_site).contains(&VarFact::Var("r")));
    assert!(!results.ifds_results_at(use_r).contains(&VarFact::Var("a")));
    assert_eq!(
        problem.undefined_uses(&results).get(&use_r),
        Some(&BTreeSet::from(["r"]))
    );
}

#[test]
fn test_missing_arguments_leave_parameters_uninitialized() {
    let mut builder = ProgramBuilder::new();
    let main = builder.declare("main", &[]);
    let pair = builder.declare("pair", &["p", "q"]);
    let use_q = builder.stmt(pair, Stmt::Use("q"));
    builder.stmt(main, Stmt::Const("a", 1));
    builder.stmt(
        main,
        Stmt::Call {
            callee: Callee::Direct(pair),
            args: vec!["a"],
            result: None,
        },
    );
    let program = builder.build();

    let problem = UninitializedVariables::new(&program, &[main]);
    let results = IFDSSolver::new(&problem, program.icfg()).solve().unwrap();

    assert_eq!(
        problem.undefined_uses(&results).get(&use_q),
        Some(&BTreeSet::from(["q"]))
    );
    assert!(!results.ifds_results_at(use_q).contains(&VarFact::Var("p")));
}

#[test]
fn test_recorded_supergraph_and_neighbors() {
    let mut builder = ProgramBuilder::new();
    let main = builder.declare("main", &[]);
    let id = builder.declare("id", &["p"]);
    builder.stmt(id, Stmt::Return(Some("p")));
    builder.stmt(main, Stmt::Decl("x"));
    builder.stmt(main, Stmt::Decl("y"));
    let cond = builder.stmt(main, Stmt::Nop);
    builder.stmt(main, Stmt::Copy("y", "x"));
    let join = builder.stmt(main, Stmt::Use("y"));
    let call = builder.stmt(
        main,
        Stmt::Call {
            callee: Callee::Direct(id),
            args: vec!["x"],
            result: None,
        },
    );
    builder.branch(main, cond, join);
    let program = builder.build();

    let config = SolverConfig::default()
        .with_compute_values(false)
        .with_esg_recording(true)
        .with_neighbor_tracking(true);
    let problem = UninitializedVariables::new(&program, &[main]);
    let results = IFDSSolver::new(&problem, program.icfg())
        .with_config(config)
        .solve()
        .unwrap();

    let id_start = program.icfg().start_point_of(id).unwrap();
    assert!(results.exploded_edges().iter().any(|edge| {
        edge.kind == ExplodedEdgeKind::Call
            && edge.from == call
            && edge.from_fact == VarFact::Var("x")
            && edge.to == id_start
            && edge.to_fact == VarFact::Var("p")
    }));
    assert!(results
        .exploded_edges()
        .iter()
        .any(|edge| edge.kind == ExplodedEdgeKind::CallToReturn && edge.from == call));

    assert!(results.neighbors_of(&VarFact::Var("y")).contains(&VarFact::Var("x")));
    assert_eq!(results.calling_contexts_of(&VarFact::Var("p")), &[VarFact::Var("x")]);
    assert!(results.neighbors_of(&VarFact::Var("p")).is_empty());
}

#[test]
fn test_statistics_are_collected() {
    let mut builder = ProgramBuilder::new();
    let main = builder.declare("main", &[]);
    builder.stmt(main, Stmt::Decl("x"));
    builder.stmt(main, Stmt::Use("x"));
    let program = builder.build();

    let problem = UninitializedVariables::new(&program, &[main]);
    let results = IFDSSolver::new(&problem, program.icfg()).solve().unwrap();
    let statistics = results.statistics();

    // Λ at three nodes and `x` at the two nodes after the declaration.
    assert_eq!(statistics.path_edges, 5);
    assert_eq!(statistics.interned_facts, 2);
    assert_eq!(statistics.worklist_iterations, 5);
    // Both facts reach the exit of `main`.
    assert_eq!(statistics.summary_edges, 2);
    assert_eq!(statistics.summary_reuses, 0);
    assert!(statistics.to_string().contains("path edges"));
}
