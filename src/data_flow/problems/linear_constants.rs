use crate::{
    control_flow::ICFGEdge,
    data_flow::{
        ifdside::{AnalysisDomain, EdgeFunction, IDEProblem},
        JoinLattice,
    },
    ir::toy::{FuncId, InstId, Program, Stmt, ToyIR, Var},
};

use super::{parameter_bindings, VarFact};

/// Value of a variable: unknown yet, one constant, or not constant.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum LatticeValue {
    Bottom,
    Const(i64),
    Top,
}

impl JoinLattice for LatticeValue {
    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Bottom, value) | (value, Self::Bottom) => *value,
            (Self::Const(lhs), Self::Const(rhs)) if lhs == rhs => *self,
            _ => Self::Top,
        }
    }

    fn top_value() -> Self {
        Self::Top
    }

    fn bottom_value() -> Self {
        Self::Bottom
    }
}

/// Edge functions of the form `λx. a·x + b`, plus the constant and
/// extreme functions. Arithmetic that overflows yields `AllTop`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum LinearEdge {
    AllBottom,
    AllTop,
    Identity,
    /// `λx. c`, also for `x = ⊥`.
    Const(i64),
    /// `λx. a·x + b` with `a ≠ 0` and `(a, b) ≠ (1, 0)`; strict in ⊥ and ⊤.
    Linear { a: i64, b: i64 },
}

impl LinearEdge {
    /// The normalized edge function for `λx. a·x + b`.
    pub fn linear(a: i64, b: i64) -> Self {
        match (a, b) {
            (0, b) => Self::Const(b),
            (1, 0) => Self::Identity,
            (a, b) => Self::Linear { a, b },
        }
    }

    fn apply(a: i64, b: i64, x: i64) -> Option<i64> {
        a.checked_mul(x)?.checked_add(b)
    }
}

impl EdgeFunction<LatticeValue> for LinearEdge {
    fn compute_target(&self, source: &LatticeValue) -> LatticeValue {
        match (self, source) {
            (Self::AllBottom, _) => LatticeValue::Bottom,
            (Self::AllTop, _) => LatticeValue::Top,
            (Self::Identity, value) => *value,
            (Self::Const(c), _) => LatticeValue::Const(*c),
            (Self::Linear { .. }, LatticeValue::Bottom) => LatticeValue::Bottom,
            (Self::Linear { .. }, LatticeValue::Top) => LatticeValue::Top,
            (Self::Linear { a, b }, LatticeValue::Const(x)) => {
                Self::apply(*a, *b, *x).map_or(LatticeValue::Top, LatticeValue::Const)
            }
        }
    }

    fn compose_with(&self, second: &Self) -> Self {
        match (self, second) {
            (_, Self::AllBottom) => Self::AllBottom,
            (_, Self::AllTop) => Self::AllTop,
            (_, Self::Const(c)) => Self::Const(*c),
            (first, Self::Identity) => *first,
            (Self::Identity, second) => *second,
            (Self::AllBottom, Self::Linear { .. }) => Self::AllBottom,
            (Self::AllTop, Self::Linear { .. }) => Self::AllTop,
            (Self::Const(c), Self::Linear { a, b }) => Self::apply(*a, *b, *c).map_or(Self::AllTop, Self::Const),
            (Self::Linear { a: a1, b: b1 }, Self::Linear { a: a2, b: b2 }) => {
                let a = a2.checked_mul(*a1);
                let b = Self::apply(*a2, *b2, *b1);
                match (a, b) {
                    (Some(a), Some(b)) => Self::linear(a, b),
                    _ => Self::AllTop,
                }
            }
        }
    }

    fn join_with(&self, other: &Self) -> Self {
        match (self, other) {
            _ if self == other => *self,
            (Self::AllBottom, other) | (other, Self::AllBottom) => *other,
            _ => Self::AllTop,
        }
    }

    fn identity() -> Self {
        Self::Identity
    }

    fn all_top() -> Self {
        Self::AllTop
    }

    fn all_bottom() -> Self {
        Self::AllBottom
    }
}

pub struct LcaDomain;

impl AnalysisDomain for LcaDomain {
    type IR = ToyIR;
    type FlowFact = VarFact;
    type ConcreteValue = LatticeValue;
}

/// Linear constant propagation: which variables hold a constant, following
/// assignments of the form `x = y * a + b` through calls.
pub struct LinearConstants<'p> {
    program: &'p Program,
    entry_points: Vec<FuncId>,
}

impl<'p> LinearConstants<'p> {
    pub fn new(program: &'p Program, entry_points: &[FuncId]) -> Self {
        LinearConstants {
            program,
            entry_points: entry_points.to_vec(),
        }
    }

    fn normal_flow(&self, stmt: &Stmt, source: &VarFact) -> Vec<(VarFact, LinearEdge)> {
        let identity = (*source, LinearEdge::Identity);
        match (stmt, source) {
            (Stmt::Const(dst, c), VarFact::Zero) => vec![identity, (VarFact::Var(*dst), LinearEdge::Const(*c))],
            (Stmt::Add(dst, ..), VarFact::Zero) => vec![identity, (VarFact::Var(*dst), LinearEdge::AllTop)],
            (_, VarFact::Zero) => vec![identity],
            (Stmt::Copy(dst, src), VarFact::Var(var)) => {
                Self::assign(*dst, *src, LinearEdge::Identity, *var)
            }
            (Stmt::Linear { dst, src, mul, add }, VarFact::Var(var)) => {
                Self::assign(*dst, *src, LinearEdge::linear(*mul, *add), *var)
            }
            (Stmt::Const(dst, _) | Stmt::Add(dst, ..), VarFact::Var(var)) if var == dst => vec![],
            _ => vec![identity],
        }
    }

    /// `dst = f(src)` seen from the fact `var`.
    fn assign(dst: Var, src: Var, function: LinearEdge, var: Var) -> Vec<(VarFact, LinearEdge)> {
        let mut facts = vec![];
        if var != dst {
            facts.push((VarFact::Var(var), LinearEdge::Identity));
        }
        if var == src {
            facts.push((VarFact::Var(dst), function));
        }
        facts
    }
}

impl IDEProblem<LcaDomain> for LinearConstants<'_> {
    type Weight = LinearEdge;

    fn zero_value(&self) -> VarFact {
        VarFact::Zero
    }

    fn entry_points(&self) -> Vec<FuncId> {
        self.entry_points.clone()
    }

    fn apply_flow(&self, edge: &ICFGEdge<ToyIR>, source: &VarFact) -> Vec<(VarFact, LinearEdge)> {
        match *edge {
            ICFGEdge::Normal { curr, .. } => self.normal_flow(self.program.stmt(curr), source),
            ICFGEdge::Call {
                call_site, callee, ..
            } => match (self.program.stmt(call_site), source) {
                (_, VarFact::Zero) => vec![(VarFact::Zero, LinearEdge::Identity)],
                (Stmt::Call { args, .. }, VarFact::Var(_)) => parameter_bindings(args, self.program.params(callee))
                    .into_iter()
                    .filter(|(arg, _)| arg == source)
                    .map(|(_, param)| (param, LinearEdge::Identity))
                    .collect(),
                _ => vec![],
            },
            ICFGEdge::Return {
                call_site, exit, ..
            } => match (self.program.stmt(call_site), self.program.stmt(exit), source) {
                (_, _, VarFact::Zero) => vec![(VarFact::Zero, LinearEdge::Identity)],
                (Stmt::Call { result: Some(result), .. }, Stmt::Return(Some(returned)), VarFact::Var(var))
                    if var == returned =>
                {
                    vec![(VarFact::Var(*result), LinearEdge::Identity)]
                }
                _ => vec![],
            },
            ICFGEdge::CallToReturn { call_site, .. } => match (self.program.stmt(call_site), source) {
                (Stmt::Call { result: Some(result), .. }, VarFact::Var(var)) if var == result => vec![],
                _ => vec![(*source, LinearEdge::Identity)],
            },
        }
    }

    fn is_all_identity(&self, at: InstId) -> bool {
        matches!(self.program.stmt(at), Stmt::Nop | Stmt::Use(_) | Stmt::Decl(_) | Stmt::Return(_))
    }

    fn lattice_samples(&self) -> Vec<LatticeValue> {
        vec![LatticeValue::Const(0), LatticeValue::Const(1), LatticeValue::Const(-7)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_flow::ifdside::is_upper_bound;

    use test_log::test;

    fn samples() -> Vec<LatticeValue> {
        vec![
            LatticeValue::Bottom,
            LatticeValue::Top,
            LatticeValue::Const(0),
            LatticeValue::Const(3),
            LatticeValue::Const(-5),
        ]
    }

    fn functions() -> Vec<LinearEdge> {
        vec![
            LinearEdge::AllBottom,
            LinearEdge::AllTop,
            LinearEdge::Identity,
            LinearEdge::Const(4),
            LinearEdge::linear(2, 1),
            LinearEdge::linear(-1, 3),
        ]
    }

    #[test]
    fn test_join_values() {
        use LatticeValue::*;
        assert_eq!(Bottom.join(&Const(3)), Const(3));
        assert_eq!(Const(3).join(&Const(3)), Const(3));
        assert_eq!(Const(3).join(&Const(4)), Top);
        assert_eq!(Top.join(&Bottom), Top);
    }

    #[test]
    fn test_linear_normalizes() {
        assert_eq!(LinearEdge::linear(1, 0), LinearEdge::Identity);
        assert_eq!(LinearEdge::linear(0, 9), LinearEdge::Const(9));
        assert_eq!(LinearEdge::linear(3, 0), LinearEdge::Linear { a: 3, b: 0 });
    }

    #[test]
    fn test_compose_applies_first_then_second() {
        for first in functions() {
            for second in functions() {
                let composed = first.compose_with(&second);
                for value in samples() {
                    assert_eq!(
                        composed.compute_target(&value),
                        second.compute_target(&first.compute_target(&value)),
                        "{first:?} then {second:?} on {value:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_join_is_upper_bound() {
        for lhs in functions() {
            for rhs in functions() {
                let joined = lhs.join_with(&rhs);
                assert!(is_upper_bound(&joined, &lhs, &rhs, &samples()), "{lhs:?} ⊔ {rhs:?}");
            }
        }
    }

    #[test]
    fn test_overflow_goes_to_top() {
        let f = LinearEdge::linear(i64::MAX, 1);
        assert_eq!(f.compute_target(&LatticeValue::Const(2)), LatticeValue::Top);
        assert_eq!(f.compose_with(&f), LinearEdge::AllTop);
    }
}
