mod cfg;
mod program_graph;

pub use self::{cfg::*, program_graph::*};
