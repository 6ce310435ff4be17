use crate::ir::IRDescription;
use std::fmt;

/// An instruction together with the function that contains it.
pub struct ProgramPos<IR: IRDescription> {
    pub function: IR::Function,
    pub instruction: IR::Instruction,
}

impl<IR: IRDescription> Clone for ProgramPos<IR> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<IR: IRDescription> Copy for ProgramPos<IR> {}

impl<IR: IRDescription> PartialEq for ProgramPos<IR> {
    fn eq(&self, other: &Self) -> bool {
        self.function == other.function && self.instruction == other.instruction
    }
}

impl<IR: IRDescription> Eq for ProgramPos<IR> {}

impl<IR: IRDescription> fmt::Debug for ProgramPos<IR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.instruction, self.function)
    }
}

/// One edge of the supergraph, tagged with the kind of flow it carries.
///
/// The solver picks the variant from the classification of the node it is
/// processing and hands it to the problem, which dispatches on it.
pub enum ICFGEdge<IR: IRDescription> {
    /// Intra-procedural flow from `curr` to one of its successors.
    Normal {
        curr: IR::Instruction,
        succ: IR::Instruction,
    },
    /// Parameter binding from a call site into the start point of `callee`.
    Call {
        call_site: IR::Instruction,
        callee: IR::Function,
        callee_start: IR::Instruction,
    },
    /// Result binding from an exit of `callee` back to the return site of `call_site`.
    Return {
        call_site: IR::Instruction,
        callee: IR::Function,
        exit: IR::Instruction,
        return_site: IR::Instruction,
    },
    /// Flow that bypasses the callee(s) of `call_site`.
    CallToReturn {
        call_site: IR::Instruction,
        return_site: IR::Instruction,
    },
}

impl<IR: IRDescription> Clone for ICFGEdge<IR> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<IR: IRDescription> Copy for ICFGEdge<IR> {}

impl<IR: IRDescription> fmt::Debug for ICFGEdge<IR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ICFGEdge::Normal { curr, succ } => write!(f, "normal {curr:?} -> {succ:?}"),
            ICFGEdge::Call {
                call_site,
                callee,
                callee_start,
            } => write!(f, "call {call_site:?} -> {callee:?}@{callee_start:?}"),
            ICFGEdge::Return {
                call_site,
                callee,
                exit,
                return_site,
            } => write!(
                f,
                "return {callee:?}@{exit:?} -> {return_site:?} (call {call_site:?})"
            ),
            ICFGEdge::CallToReturn {
                call_site,
                return_site,
            } => write!(f, "call-to-return {call_site:?} -> {return_site:?}"),
        }
    }
}

pub trait CFG<IR: IRDescription> {
    fn function_of(&self, of: IR::Instruction) -> IR::Function;
    fn successors_of(&self, of: IR::Instruction) -> Vec<IR::Instruction>;
    fn predecessors_of(&self, of: IR::Instruction) -> Vec<IR::Instruction>;
    /// `None` for functions without a body.
    fn start_point_of(&self, function: IR::Function) -> Option<IR::Instruction>;
    fn exit_points_of(&self, function: IR::Function) -> Vec<IR::Instruction>;
    fn instructions_of(&self, function: IR::Function) -> Vec<IR::Instruction>;

    fn is_start_point(&self, inst: IR::Instruction) -> bool {
        self.start_point_of(self.function_of(inst)) == Some(inst)
    }

    fn is_exit_point(&self, inst: IR::Instruction) -> bool {
        self.exit_points_of(self.function_of(inst)).contains(&inst)
    }
}

/// The interprocedural view the solver queries.
///
/// Call targets may grow while a solver is running (on-the-fly call graph);
/// implementations must then bump [`ICFG::revision`] so the solver knows to
/// rescan the call sites it has already processed.
pub trait ICFG<IR: IRDescription>: CFG<IR> {
    fn is_call(&self, inst: IR::Instruction) -> bool;
    /// The procedures known to be invoked at `call_site` right now.
    fn callees_of(&self, call_site: IR::Instruction) -> Vec<IR::Function>;
    /// All call sites known to invoke `function`.
    fn call_sites_of(&self, function: IR::Function) -> Vec<IR::Instruction>;
    fn calls_within(&self, function: IR::Function) -> Vec<IR::Instruction>;
    fn return_site_of(&self, call_site: IR::Instruction) -> Option<IR::Instruction>;

    fn revision(&self) -> u64 {
        0
    }
}
