//! Reference analyses over the toy IR in [`crate::ir::toy`].

mod linear_constants;
mod uninitialized_variables;

pub use self::{linear_constants::*, uninitialized_variables::*};

use crate::ir::toy::Var;
use std::fmt;

/// Flow facts of the reference analyses: a local variable, or Λ.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VarFact {
    Zero,
    Var(Var),
}

impl fmt::Debug for VarFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarFact::Zero => write!(f, "Λ"),
            VarFact::Var(var) => write!(f, "{var}"),
        }
    }
}

/// `(arg, param)` pairs of a call, positionally.
fn parameter_bindings(args: &[Var], params: &[Var]) -> Vec<(VarFact, VarFact)> {
    args.iter()
        .zip(params)
        .map(|(arg, param)| (VarFact::Var(*arg), VarFact::Var(*param)))
        .collect()
}
