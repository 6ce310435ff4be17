use std::fmt::Debug;

/// A join semi-lattice with both extremes.
///
/// `bottom_value()` means "no information" and is the identity of `join`;
/// `top_value()` means "over-defined" and absorbs everything.
pub trait JoinLattice: Clone + PartialEq + Debug {
    fn join(&self, other: &Self) -> Self;
    fn top_value() -> Self;
    fn bottom_value() -> Self;

    fn is_top(&self) -> bool {
        *self == Self::top_value()
    }

    fn is_bottom(&self) -> bool {
        *self == Self::bottom_value()
    }

    /// The order induced by `join`: `a ⊑ b` iff `a ⊔ b = b`.
    fn leq(&self, other: &Self) -> bool {
        self.join(other) == *other
    }
}

/// Checks the laws the solver relies on for `L`, probing with `samples` in
/// addition to the two extremes.
pub fn check_lattice_laws<L: JoinLattice>(samples: &[L]) -> Result<(), String> {
    let top = L::top_value();
    let bottom = L::bottom_value();
    if top == bottom {
        return Err(format!("top and bottom coincide ({top:?})"));
    }
    let mut probes = vec![top.clone(), bottom.clone()];
    probes.extend(samples.iter().cloned());
    for value in &probes {
        if value.join(value) != *value {
            return Err(format!("join is not idempotent on {value:?}"));
        }
        if value.join(&bottom) != *value {
            return Err(format!("bottom is not neutral for {value:?}"));
        }
        if value.join(&top) != top {
            return Err(format!("top does not absorb {value:?}"));
        }
        for other in &probes {
            let joined = value.join(other);
            if joined != other.join(value) {
                return Err(format!("join is not commutative on {value:?}, {other:?}"));
            }
            if !value.leq(&joined) || !other.leq(&joined) {
                return Err(format!(
                    "join of {value:?} and {other:?} is not an upper bound ({joined:?})"
                ));
            }
        }
    }
    Ok(())
}
