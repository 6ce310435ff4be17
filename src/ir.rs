mod ir_description;
pub mod toy;

pub use self::ir_description::*;
