mod cli;
mod demo;

use anyhow::Result;
use clap::Parser;
use cli::{Analysis, CommandLineArgs};
use ifds_ide::{
    control_flow::CFG,
    data_flow::{
        ifdside::{AnalysisDomain, AnalysisResults, IDESolver, IFDSSolver, ResultTable},
        problems::{LcaDomain, LinearConstants, UninitializedVariables},
    },
    ir::toy::{Program, ToyIR},
};
use log::info;

fn main() -> Result<()> {
    let args = CommandLineArgs::parse();
    args.init_logger()?;

    let (program, entry) = demo::build(args.demo);
    let config = args.solver_config();
    info!("running {:?} on the {:?} demo", args.analysis, args.demo);

    match args.analysis {
        Analysis::Uninit => {
            let problem = UninitializedVariables::new(&program, &[entry])
                .with_actual_parameter_check(args.check_actual_parameters);
            let results = IFDSSolver::new(&problem, program.icfg())
                .with_config(config)
                .solve()?;
            print_exit_results(&program, &results, args.print_esg);
            for (inst, vars) in problem.undefined_uses(&results) {
                let vars: Vec<&str> = vars.into_iter().collect();
                println!("undefined use at {inst:?} `{}`: {}", program.stmt(inst), vars.join(", "));
            }
        }
        Analysis::Lca => {
            let problem = LinearConstants::new(&program, &[entry]);
            let results = IDESolver::<LcaDomain, _, _>::new(&problem, program.icfg())
                .with_config(config)
                .solve()?;
            print_exit_results(&program, &results, args.print_esg);
        }
    }
    Ok(())
}

fn print_exit_results<Domain>(program: &Program, results: &ResultTable<Domain>, print_esg: bool)
where
    Domain: AnalysisDomain<IR = ToyIR>,
    Domain::FlowFact: Ord,
{
    println!("status: {:?}", results.status());
    for &function in program.icfg().functions() {
        for exit in program.icfg().exit_points_of(function) {
            let mut facts: Vec<_> = results.results_at(exit).into_iter().collect();
            facts.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
            println!("{} @ {exit:?} `{}`:", program.name_of(function), program.stmt(exit));
            for (fact, value) in facts {
                println!("    {fact:?} = {value:?}");
            }
        }
    }
    if print_esg {
        for edge in results.exploded_edges() {
            println!("{edge:?}");
        }
    }
}
