pub mod ifdside;
mod join_lattice;
pub mod problems;

pub use self::join_lattice::*;
