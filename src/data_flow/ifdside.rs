mod binary_domain;
mod edge_function;
pub mod flow_function;
mod ide_solver;
mod problem;
mod results;
mod solver_config;
mod statistics;
mod tables;

pub use self::{
    binary_domain::*, edge_function::*, ide_solver::*, problem::*, results::*, solver_config::*,
    statistics::*, tables::FactId,
};
