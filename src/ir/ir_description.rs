use std::fmt::Debug;
use std::hash::Hash;

/// The type family of a program representation the solver runs on.
///
/// Instructions are the nodes of the ICFG, functions are its procedures.
/// Both are cheap handles owned by whoever builds the ICFG.
pub trait IRDescription {
    type Instruction: Copy + Eq + Hash + Ord + Debug;
    type Function: Copy + Eq + Hash + Ord + Debug;
}
