//! Property tests for the linear constant edge functions and their lattice.

use ifds_ide::data_flow::ifdside::{is_upper_bound, EdgeFunction};
use ifds_ide::data_flow::problems::{LatticeValue, LinearEdge};
use ifds_ide::data_flow::{check_lattice_laws, JoinLattice};
use proptest::prelude::*;

// Small coefficients keep composition of up to three functions free of overflow.
fn lattice_value() -> impl Strategy<Value = LatticeValue> {
    prop_oneof![
        Just(LatticeValue::Bottom),
        Just(LatticeValue::Top),
        (-1_000i64..1_000).prop_map(LatticeValue::Const),
    ]
}

fn linear_edge() -> impl Strategy<Value = LinearEdge> {
    prop_oneof![
        Just(LinearEdge::AllBottom),
        Just(LinearEdge::AllTop),
        Just(LinearEdge::Identity),
        (-100i64..100).prop_map(LinearEdge::Const),
        (-20i64..20, -100i64..100).prop_map(|(a, b)| LinearEdge::linear(a, b)),
    ]
}

proptest! {
    #[test]
    fn composition_applies_first_then_second(
        first in linear_edge(),
        second in linear_edge(),
        input in lattice_value(),
    ) {
        let composed = first.compose_with(&second);
        prop_assert_eq!(
            composed.compute_target(&input),
            second.compute_target(&first.compute_target(&input))
        );
    }

    #[test]
    fn composition_is_associative(
        f in linear_edge(),
        g in linear_edge(),
        h in linear_edge(),
        input in lattice_value(),
    ) {
        let left = f.compose_with(&g).compose_with(&h);
        let right = f.compose_with(&g.compose_with(&h));
        prop_assert_eq!(left.compute_target(&input), right.compute_target(&input));
    }

    #[test]
    fn identity_is_neutral(f in linear_edge()) {
        prop_assert_eq!(f.compose_with(&LinearEdge::identity()), f);
        prop_assert_eq!(LinearEdge::identity().compose_with(&f), f);
    }

    #[test]
    fn join_is_an_upper_bound(
        f in linear_edge(),
        g in linear_edge(),
        samples in prop::collection::vec(lattice_value(), 0..8),
    ) {
        let joined = f.join_with(&g);
        prop_assert!(is_upper_bound(&joined, &f, &g, &samples), "{:?} ⊔ {:?} = {:?}", f, g, joined);
        prop_assert_eq!(joined, g.join_with(&f));
        prop_assert_eq!(f.join_with(&f), f);
    }

    #[test]
    fn linear_normalization_keeps_semantics(
        a in -20i64..20,
        b in -100i64..100,
        x in -1_000i64..1_000,
    ) {
        let f = LinearEdge::linear(a, b);
        prop_assert_eq!(f.compute_target(&LatticeValue::Const(x)), LatticeValue::Const(a * x + b));
    }

    #[test]
    fn values_satisfy_lattice_laws(samples in prop::collection::vec(lattice_value(), 0..10)) {
        prop_assert_eq!(check_lattice_laws(&samples), Ok(()));
    }

    #[test]
    fn value_join_is_least(lhs in lattice_value(), rhs in lattice_value(), bound in lattice_value()) {
        if lhs.leq(&bound) && rhs.leq(&bound) {
            prop_assert!(lhs.join(&rhs).leq(&bound));
        }
    }
}
