//! IFDS/IDE data-flow analysis over an interprocedural control-flow graph.
//!
//! Describe the program through [`control_flow::ICFG`], the analysis through
//! [`data_flow::ifdside::IFDSProblem`] or [`data_flow::ifdside::IDEProblem`],
//! and run [`data_flow::ifdside::IFDSSolver`] or
//! [`data_flow::ifdside::IDESolver`] on them.

pub mod control_flow;
pub mod data_flow;
pub mod error;
pub mod ir;
pub mod utils;
