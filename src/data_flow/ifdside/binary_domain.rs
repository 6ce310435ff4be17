use crate::data_flow::JoinLattice;

/// The value domain of IFDS problems solved as IDE problems: a fact either
/// holds (`Top`) or does not (`Bottom`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BinaryDomain {
    Top,
    Bottom,
}

impl JoinLattice for BinaryDomain {
    fn join(&self, other: &Self) -> Self {
        if self.is_top() || other.is_top() {
            Self::Top
        } else {
            Self::Bottom
        }
    }

    fn top_value() -> Self {
        Self::Top
    }

    fn bottom_value() -> Self {
        Self::Bottom
    }

    fn is_top(&self) -> bool {
        match self {
            BinaryDomain::Top => true,
            BinaryDomain::Bottom => false,
        }
    }
}
