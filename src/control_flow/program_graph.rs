use crate::control_flow::{CFG, ICFG};
use crate::ir::IRDescription;
use log::debug;
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};

struct FunctionInfo<IR: IRDescription> {
    start: Option<IR::Instruction>,
    exits: Vec<IR::Instruction>,
    instructions: Vec<IR::Instruction>,
    calls: Vec<IR::Instruction>,
}

impl<IR: IRDescription> Default for FunctionInfo<IR> {
    fn default() -> Self {
        FunctionInfo {
            start: None,
            exits: vec![],
            instructions: vec![],
            calls: vec![],
        }
    }
}

/// A registry of functions, instructions and call edges implementing [`ICFG`].
///
/// The registry only grows. Intra-procedural structure is fixed once built;
/// call targets may be added through a shared reference at any time
/// (see [`ProgramGraph::resolve_call`]), which is how an on-the-fly call graph
/// feeds newly discovered callees to a running solver.
pub struct ProgramGraph<IR: IRDescription> {
    functions: FxHashMap<IR::Function, FunctionInfo<IR>>,
    function_order: Vec<IR::Function>,
    owner: FxHashMap<IR::Instruction, IR::Function>,
    successors: FxHashMap<IR::Instruction, Vec<IR::Instruction>>,
    predecessors: FxHashMap<IR::Instruction, Vec<IR::Instruction>>,
    return_sites: FxHashMap<IR::Instruction, IR::Instruction>,
    callees: RefCell<FxHashMap<IR::Instruction, Vec<IR::Function>>>,
    callers: RefCell<FxHashMap<IR::Function, Vec<IR::Instruction>>>,
    revision: Cell<u64>,
}

impl<IR: IRDescription> Default for ProgramGraph<IR> {
    fn default() -> Self {
        ProgramGraph {
            functions: FxHashMap::default(),
            function_order: vec![],
            owner: FxHashMap::default(),
            successors: FxHashMap::default(),
            predecessors: FxHashMap::default(),
            return_sites: FxHashMap::default(),
            callees: RefCell::new(FxHashMap::default()),
            callers: RefCell::new(FxHashMap::default()),
            revision: Cell::new(0),
        }
    }
}

impl<IR: IRDescription> ProgramGraph<IR> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, function: IR::Function) {
        if !self.functions.contains_key(&function) {
            self.functions.insert(function, FunctionInfo::default());
            self.function_order.push(function);
        }
    }

    /// Registers `inst` as part of `function`. The first instruction added to a
    /// function becomes its start point.
    pub fn add_instruction(&mut self, function: IR::Function, inst: IR::Instruction) {
        self.add_function(function);
        self.owner.insert(inst, function);
        let info = self.function_info_mut(function);
        info.instructions.push(inst);
        if info.start.is_none() {
            info.start = Some(inst);
        }
    }

    pub fn add_exit_point(&mut self, inst: IR::Instruction) {
        let function = self.owner[&inst];
        let info = self.function_info_mut(function);
        if !info.exits.contains(&inst) {
            info.exits.push(inst);
        }
    }

    pub fn add_edge(&mut self, from: IR::Instruction, to: IR::Instruction) {
        let succs = self.successors.entry(from).or_default();
        if !succs.contains(&to) {
            succs.push(to);
            self.predecessors.entry(to).or_default().push(from);
        }
    }

    /// Marks `call_site` as a call returning to `return_site`. `callees` may be
    /// empty for calls that are resolved later.
    pub fn add_call(
        &mut self,
        call_site: IR::Instruction,
        return_site: IR::Instruction,
        callees: &[IR::Function],
    ) {
        let function = self.owner[&call_site];
        self.function_info_mut(function).calls.push(call_site);
        self.return_sites.insert(call_site, return_site);
        self.add_edge(call_site, return_site);
        self.callees.borrow_mut().entry(call_site).or_default();
        for &callee in callees {
            self.resolve_call(call_site, callee);
        }
    }

    /// Adds `callee` as a target of `call_site`. Returns `false` if it was
    /// already known. Safe to call while a solver is querying the graph.
    pub fn resolve_call(&self, call_site: IR::Instruction, callee: IR::Function) -> bool {
        let mut callees = self.callees.borrow_mut();
        let targets = callees.entry(call_site).or_default();
        if targets.contains(&callee) {
            return false;
        }
        targets.push(callee);
        self.callers
            .borrow_mut()
            .entry(callee)
            .or_default()
            .push(call_site);
        self.revision.set(self.revision.get() + 1);
        debug!("resolved call {:?} -> {:?}", call_site, callee);
        true
    }

    pub fn functions(&self) -> &[IR::Function] {
        &self.function_order
    }

    fn function_info_mut(&mut self, function: IR::Function) -> &mut FunctionInfo<IR> {
        self.functions.entry(function).or_default()
    }
}

impl<IR: IRDescription> CFG<IR> for ProgramGraph<IR> {
    fn function_of(&self, of: IR::Instruction) -> IR::Function {
        self.owner[&of]
    }

    fn successors_of(&self, of: IR::Instruction) -> Vec<IR::Instruction> {
        self.successors.get(&of).cloned().unwrap_or_default()
    }

    fn predecessors_of(&self, of: IR::Instruction) -> Vec<IR::Instruction> {
        self.predecessors.get(&of).cloned().unwrap_or_default()
    }

    fn start_point_of(&self, function: IR::Function) -> Option<IR::Instruction> {
        self.functions.get(&function).and_then(|info| info.start)
    }

    fn exit_points_of(&self, function: IR::Function) -> Vec<IR::Instruction> {
        self.functions
            .get(&function)
            .map(|info| info.exits.clone())
            .unwrap_or_default()
    }

    fn instructions_of(&self, function: IR::Function) -> Vec<IR::Instruction> {
        self.functions
            .get(&function)
            .map(|info| info.instructions.clone())
            .unwrap_or_default()
    }

    fn is_exit_point(&self, inst: IR::Instruction) -> bool {
        self.owner
            .get(&inst)
            .and_then(|function| self.functions.get(function))
            .map_or(false, |info| info.exits.contains(&inst))
    }
}

impl<IR: IRDescription> ICFG<IR> for ProgramGraph<IR> {
    fn is_call(&self, inst: IR::Instruction) -> bool {
        self.return_sites.contains_key(&inst)
    }

    fn callees_of(&self, call_site: IR::Instruction) -> Vec<IR::Function> {
        self.callees
            .borrow()
            .get(&call_site)
            .cloned()
            .unwrap_or_default()
    }

    fn call_sites_of(&self, function: IR::Function) -> Vec<IR::Instruction> {
        self.callers
            .borrow()
            .get(&function)
            .cloned()
            .unwrap_or_default()
    }

    fn calls_within(&self, function: IR::Function) -> Vec<IR::Instruction> {
        self.functions
            .get(&function)
            .map(|info| info.calls.clone())
            .unwrap_or_default()
    }

    fn return_site_of(&self, call_site: IR::Instruction) -> Option<IR::Instruction> {
        self.return_sites.get(&call_site).copied()
    }

    fn revision(&self) -> u64 {
        self.revision.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    struct NumberedIR;

    impl IRDescription for NumberedIR {
        type Instruction = u32;
        type Function = u8;
    }

    fn two_function_graph() -> ProgramGraph<NumberedIR> {
        let mut graph = ProgramGraph::<NumberedIR>::new();
        for inst in [0, 1, 2] {
            graph.add_instruction(0, inst);
        }
        for inst in [10, 11] {
            graph.add_instruction(1, inst);
        }
        graph.add_call(0, 1, &[]);
        graph.add_edge(1, 2);
        graph.add_exit_point(2);
        graph.add_edge(10, 11);
        graph.add_exit_point(11);
        graph
    }

    #[test]
    fn test_structure_queries() {
        let graph = two_function_graph();
        assert_eq!(graph.start_point_of(0), Some(0));
        assert_eq!(graph.start_point_of(1), Some(10));
        assert_eq!(graph.start_point_of(7), None);
        assert!(graph.is_start_point(10));
        assert!(!graph.is_start_point(11));
        assert!(graph.is_exit_point(2));
        assert!(graph.is_call(0));
        assert_eq!(graph.return_site_of(0), Some(1));
        assert_eq!(graph.successors_of(0), vec![1]);
        assert_eq!(graph.predecessors_of(2), vec![1]);
        assert_eq!(graph.calls_within(0), vec![0]);
        assert_eq!(graph.function_of(11), 1);
    }

    #[test]
    fn test_resolve_call_bumps_revision() {
        let graph = two_function_graph();
        assert!(graph.callees_of(0).is_empty());
        let before = graph.revision();

        assert!(graph.resolve_call(0, 1));
        assert!(!graph.resolve_call(0, 1));

        assert_eq!(graph.revision(), before + 1);
        assert_eq!(graph.callees_of(0), vec![1]);
        assert_eq!(graph.call_sites_of(1), vec![0]);
    }
}
