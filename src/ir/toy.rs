//! A tiny statement language for exercising the solver.
//!
//! Every statement is one ICFG node. Functions are built with
//! [`ProgramBuilder`]; statements fall through to the next one unless they
//! return or were redirected with [`ProgramBuilder::jump`]. A function whose
//! body does not end in a `return` gets an implicit `return` appended.

use crate::control_flow::ProgramGraph;
use crate::ir::IRDescription;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstId(pub u32);

impl fmt::Debug for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub u32);

impl fmt::Debug for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

pub type Var = &'static str;

pub struct ToyIR;

impl IRDescription for ToyIR {
    type Instruction = InstId;
    type Function = FuncId;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callee {
    Direct(FuncId),
    /// Target unknown when the program is built; see [`Program::resolve_call`].
    Indirect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    Nop,
    /// Introduces a local without initialising it.
    Decl(Var),
    /// `dst = c`
    Const(Var, i64),
    /// `dst = src`
    Copy(Var, Var),
    /// `dst = src * mul + add`
    Linear {
        dst: Var,
        src: Var,
        mul: i64,
        add: i64,
    },
    /// `dst = lhs + rhs`
    Add(Var, Var, Var),
    /// Reads a variable without writing anything.
    Use(Var),
    Call {
        callee: Callee,
        args: Vec<Var>,
        result: Option<Var>,
    },
    Return(Option<Var>),
}

impl Stmt {
    /// Variables read by this statement.
    pub fn reads(&self) -> Vec<Var> {
        match self {
            Stmt::Copy(_, src) | Stmt::Linear { src, .. } | Stmt::Use(src) => vec![*src],
            Stmt::Add(_, lhs, rhs) => vec![*lhs, *rhs],
            Stmt::Call { args, .. } => args.clone(),
            Stmt::Return(Some(var)) => vec![*var],
            Stmt::Nop | Stmt::Decl(_) | Stmt::Const(..) | Stmt::Return(None) => vec![],
        }
    }

    /// The variable this statement (re)defines, if any.
    pub fn writes(&self) -> Option<Var> {
        match self {
            Stmt::Const(dst, _)
            | Stmt::Copy(dst, _)
            | Stmt::Linear { dst, .. }
            | Stmt::Add(dst, ..) => Some(*dst),
            Stmt::Call { result, .. } => *result,
            Stmt::Nop | Stmt::Decl(_) | Stmt::Use(_) | Stmt::Return(_) => None,
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Nop => write!(f, "nop"),
            Stmt::Decl(var) => write!(f, "decl {var}"),
            Stmt::Const(dst, c) => write!(f, "{dst} = {c}"),
            Stmt::Copy(dst, src) => write!(f, "{dst} = {src}"),
            Stmt::Linear { dst, src, mul, add } => write!(f, "{dst} = {src} * {mul} + {add}"),
            Stmt::Add(dst, lhs, rhs) => write!(f, "{dst} = {lhs} + {rhs}"),
            Stmt::Use(var) => write!(f, "use {var}"),
            Stmt::Call {
                callee,
                args,
                result,
            } => {
                if let Some(result) = result {
                    write!(f, "{result} = ")?;
                }
                match callee {
                    Callee::Direct(function) => write!(f, "call {function:?}")?,
                    Callee::Indirect => write!(f, "call *")?,
                }
                write!(f, "({})", args.join(", "))
            }
            Stmt::Return(Some(var)) => write!(f, "return {var}"),
            Stmt::Return(None) => write!(f, "return"),
        }
    }
}

struct FunctionDraft {
    name: &'static str,
    params: Vec<Var>,
    body: Vec<(InstId, Stmt)>,
    extra_edges: Vec<(InstId, InstId)>,
    no_fallthrough: FxHashSet<InstId>,
}

#[derive(Default)]
pub struct ProgramBuilder {
    next_inst: u32,
    functions: Vec<FunctionDraft>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a function. A function that never receives a statement has
    /// no body and acts like an external declaration.
    pub fn declare(&mut self, name: &'static str, params: &[Var]) -> FuncId {
        let id = FuncId(self.functions.len() as u32);
        self.functions.push(FunctionDraft {
            name,
            params: params.to_vec(),
            body: vec![],
            extra_edges: vec![],
            no_fallthrough: FxHashSet::default(),
        });
        id
    }

    pub fn stmt(&mut self, function: FuncId, stmt: Stmt) -> InstId {
        let inst = self.fresh_inst();
        self.draft_mut(function).body.push((inst, stmt));
        inst
    }

    /// Adds a control-flow edge in addition to the fall-through edge.
    pub fn branch(&mut self, function: FuncId, from: InstId, to: InstId) {
        self.draft_mut(function).extra_edges.push((from, to));
    }

    /// Replaces the fall-through edge of `from` with an edge to `to`.
    pub fn jump(&mut self, function: FuncId, from: InstId, to: InstId) {
        let draft = self.draft_mut(function);
        draft.no_fallthrough.insert(from);
        draft.extra_edges.push((from, to));
    }

    pub fn build(mut self) -> Program {
        for index in 0..self.functions.len() {
            let needs_return = match self.functions[index].body.last() {
                Some((_, Stmt::Return(_))) | None => false,
                Some(_) => true,
            };
            if needs_return {
                let inst = self.fresh_inst();
                self.functions[index].body.push((inst, Stmt::Return(None)));
            }
        }

        let mut graph = ProgramGraph::new();
        let mut stmts = FxHashMap::default();
        let mut names = FxHashMap::default();
        let mut params = FxHashMap::default();
        let mut calls = vec![];

        for (index, draft) in self.functions.iter().enumerate() {
            let function = FuncId(index as u32);
            graph.add_function(function);
            names.insert(function, draft.name);
            params.insert(function, draft.params.clone());
            for (inst, stmt) in &draft.body {
                graph.add_instruction(function, *inst);
                stmts.insert(*inst, stmt.clone());
            }
        }

        for (index, draft) in self.functions.iter().enumerate() {
            let function = FuncId(index as u32);
            for (position, (inst, stmt)) in draft.body.iter().enumerate() {
                let next = draft.body.get(position + 1).map(|(next, _)| *next);
                match stmt {
                    Stmt::Return(_) => graph.add_exit_point(*inst),
                    Stmt::Call { callee, .. } => {
                        // A call is never last: the implicit return follows it.
                        if let Some(next) = next {
                            let targets = match callee {
                                Callee::Direct(target) => vec![*target],
                                Callee::Indirect => vec![],
                            };
                            calls.push((*inst, next, targets));
                        }
                    }
                    _ => {
                        if let (Some(next), false) = (next, draft.no_fallthrough.contains(inst)) {
                            graph.add_edge(*inst, next);
                        }
                    }
                }
            }
            for &(from, to) in &draft.extra_edges {
                graph.add_edge(from, to);
            }
            log::trace!("built {:?} ({}) with {} statements", function, draft.name, draft.body.len());
        }

        for (call_site, return_site, targets) in calls {
            graph.add_call(call_site, return_site, &targets);
        }

        Program {
            graph,
            stmts,
            names,
            params,
        }
    }

    fn fresh_inst(&mut self) -> InstId {
        let inst = InstId(self.next_inst);
        self.next_inst += 1;
        inst
    }

    fn draft_mut(&mut self, function: FuncId) -> &mut FunctionDraft {
        &mut self.functions[function.0 as usize]
    }
}

/// A built toy program: statements plus the ICFG over them.
pub struct Program {
    graph: ProgramGraph<ToyIR>,
    stmts: FxHashMap<InstId, Stmt>,
    names: FxHashMap<FuncId, &'static str>,
    params: FxHashMap<FuncId, Vec<Var>>,
}

impl Program {
    pub fn icfg(&self) -> &ProgramGraph<ToyIR> {
        &self.graph
    }

    pub fn stmt(&self, inst: InstId) -> &Stmt {
        &self.stmts[&inst]
    }

    pub fn params(&self, function: FuncId) -> &[Var] {
        self.params.get(&function).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn name_of(&self, function: FuncId) -> &'static str {
        self.names.get(&function).copied().unwrap_or("<unknown>")
    }

    pub fn function_named(&self, name: &str) -> Option<FuncId> {
        self.graph
            .functions()
            .iter()
            .copied()
            .find(|function| self.names.get(function) == Some(&name))
    }

    /// Adds a target to an indirect call while analyses may be running.
    pub fn resolve_call(&self, call_site: InstId, callee: FuncId) -> bool {
        self.graph.resolve_call(call_site, callee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_flow::{CFG, ICFG};

    use test_log::test;

    #[test]
    fn test_fallthrough_and_implicit_return() {
        let mut builder = ProgramBuilder::new();
        let main = builder.declare("main", &[]);
        let a = builder.stmt(main, Stmt::Const("x", 1));
        let b = builder.stmt(main, Stmt::Use("x"));
        let program = builder.build();
        let icfg = program.icfg();

        assert_eq!(icfg.successors_of(a), vec![b]);
        let exits = icfg.exit_points_of(main);
        assert_eq!(exits.len(), 1);
        assert_eq!(icfg.successors_of(b), exits);
        assert_eq!(program.stmt(exits[0]), &Stmt::Return(None));
    }

    #[test]
    fn test_calls_and_branches() {
        let mut builder = ProgramBuilder::new();
        let main = builder.declare("main", &[]);
        let foo = builder.declare("foo", &["p"]);
        let call = builder.stmt(
            main,
            Stmt::Call {
                callee: Callee::Direct(foo),
                args: vec!["a"],
                result: Some("r"),
            },
        );
        let cond = builder.stmt(main, Stmt::Nop);
        let then = builder.stmt(main, Stmt::Const("r", 0));
        let ret = builder.stmt(main, Stmt::Return(Some("r")));
        builder.branch(main, cond, ret);
        builder.stmt(foo, Stmt::Return(Some("p")));
        let program = builder.build();
        let icfg = program.icfg();

        assert!(icfg.is_call(call));
        assert_eq!(icfg.return_site_of(call), Some(cond));
        assert_eq!(icfg.callees_of(call), vec![foo]);
        assert_eq!(icfg.successors_of(cond), vec![then, ret]);
        assert_eq!(program.function_named("foo"), Some(foo));
        assert_eq!(program.params(foo), &["p"]);
        assert_eq!(program.stmt(call).to_string(), "r = call fn1(a)");
    }

    #[test]
    fn test_bodiless_function_has_no_start() {
        let mut builder = ProgramBuilder::new();
        let main = builder.declare("main", &[]);
        let ext = builder.declare("ext", &[]);
        builder.stmt(main, Stmt::Nop);
        let program = builder.build();

        assert!(program.icfg().start_point_of(ext).is_none());
        assert!(program.icfg().start_point_of(main).is_some());
    }
}
