use crate::data_flow::JoinLattice;
use std::fmt::Debug;

/// A transformer between lattice values describing the effect of one or more
/// supergraph edges on the value attached to a fact.
///
/// Implementations are expected to be small value types: the solver clones,
/// compares and caches them freely.
pub trait EdgeFunction<L: JoinLattice>: Clone + PartialEq + Debug {
    /// Evaluates this function for a concrete value.
    fn compute_target(&self, source: &L) -> L;

    /// Sequential application: first `self`, then `second`.
    fn compose_with(&self, second: &Self) -> Self;

    /// An upper bound of both functions, pointwise in the lattice order.
    fn join_with(&self, other: &Self) -> Self;

    fn identity() -> Self;
    fn all_top() -> Self;
    fn all_bottom() -> Self;

    fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

/// Checks that `joined` is pointwise at least as large as both `lhs` and `rhs`
/// on the lattice extremes and on `samples`.
pub fn is_upper_bound<L, F>(joined: &F, lhs: &F, rhs: &F, samples: &[L]) -> bool
where
    L: JoinLattice,
    F: EdgeFunction<L>,
{
    [L::bottom_value(), L::top_value()]
        .iter()
        .chain(samples)
        .all(|input| {
            let target = joined.compute_target(input);
            lhs.compute_target(input).leq(&target) && rhs.compute_target(input).leq(&target)
        })
}

/// The edge functions needed for IFDS-style reachability.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BinaryEdgeFunction {
    /// Maps every input to bottom.
    AllBottom,
    /// Maps every input to top.
    AllTop,
    /// Passes every input through unchanged.
    Identity,
}

impl<L: JoinLattice> EdgeFunction<L> for BinaryEdgeFunction {
    fn compute_target(&self, source: &L) -> L {
        match self {
            Self::AllBottom => L::bottom_value(),
            Self::AllTop => L::top_value(),
            Self::Identity => source.clone(),
        }
    }

    fn compose_with(&self, second: &Self) -> Self {
        match (self, second) {
            (_, Self::AllBottom) => Self::AllBottom,
            (_, Self::AllTop) => Self::AllTop,
            (first, Self::Identity) => *first,
        }
    }

    fn join_with(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::AllTop, _) | (_, Self::AllTop) => Self::AllTop,
            (Self::AllBottom, other) => *other,
            (first, Self::AllBottom) => *first,
            (Self::Identity, Self::Identity) => Self::Identity,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_flow::ifdside::BinaryDomain;

    use test_log::test;

    type F = BinaryEdgeFunction;

    fn eval(f: F, value: BinaryDomain) -> BinaryDomain {
        EdgeFunction::<BinaryDomain>::compute_target(&f, &value)
    }

    #[test]
    fn test_compute_target() {
        assert_eq!(eval(F::Identity, BinaryDomain::Top), BinaryDomain::Top);
        assert_eq!(eval(F::AllBottom, BinaryDomain::Top), BinaryDomain::Bottom);
        assert_eq!(eval(F::AllTop, BinaryDomain::Bottom), BinaryDomain::Top);
    }

    #[test]
    fn test_compose_applies_first_then_second() {
        let all = [F::AllBottom, F::AllTop, F::Identity];
        for first in all {
            for second in all {
                let composed = EdgeFunction::<BinaryDomain>::compose_with(&first, &second);
                for value in [BinaryDomain::Top, BinaryDomain::Bottom] {
                    assert_eq!(eval(composed, value), eval(second, eval(first, value)));
                }
            }
        }
    }

    #[test]
    fn test_join_is_idempotent_upper_bound() {
        let all = [F::AllBottom, F::AllTop, F::Identity];
        for lhs in all {
            assert_eq!(EdgeFunction::<BinaryDomain>::join_with(&lhs, &lhs), lhs);
            for rhs in all {
                let joined = EdgeFunction::<BinaryDomain>::join_with(&lhs, &rhs);
                assert!(is_upper_bound::<BinaryDomain, F>(&joined, &lhs, &rhs, &[]));
            }
        }
    }
}
