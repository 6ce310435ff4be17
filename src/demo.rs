//! Built-in toy programs for the driver.

use clap::ValueEnum;
use ifds_ide::ir::toy::{Callee, FuncId, Program, ProgramBuilder, Stmt};

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum DemoProgram {
    /// `y = 10; if (..) y = 20; return y`
    Branch,
    /// `foo(v) = v + 1` called with 2 and with 42
    Calls,
    /// a recursive countdown
    Recursion,
    /// reads of declared but unassigned variables
    Uninit,
}

/// Builds the program and returns it with its entry function.
pub fn build(demo: DemoProgram) -> (Program, FuncId) {
    match demo {
        DemoProgram::Branch => branch(),
        DemoProgram::Calls => calls(),
        DemoProgram::Recursion => recursion(),
        DemoProgram::Uninit => uninit(),
    }
}

fn call(callee: FuncId, args: &[&'static str], result: Option<&'static str>) -> Stmt {
    Stmt::Call {
        callee: Callee::Direct(callee),
        args: args.to_vec(),
        result,
    }
}

fn branch() -> (Program, FuncId) {
    let mut builder = ProgramBuilder::new();
    let main = builder.declare("main", &[]);
    builder.stmt(main, Stmt::Const("y", 10));
    let cond = builder.stmt(main, Stmt::Nop);
    builder.stmt(main, Stmt::Const("y", 20));
    let ret = builder.stmt(main, Stmt::Return(Some("y")));
    builder.branch(main, cond, ret);
    (builder.build(), main)
}

fn calls() -> (Program, FuncId) {
    let mut builder = ProgramBuilder::new();
    let main = builder.declare("main", &[]);
    let foo = builder.declare("foo", &["v"]);

    builder.stmt(
        foo,
        Stmt::Linear {
            dst: "t",
            src: "v",
            mul: 1,
            add: 1,
        },
    );
    builder.stmt(foo, Stmt::Return(Some("t")));

    builder.stmt(main, Stmt::Const("a", 2));
    builder.stmt(main, call(foo, &["a"], Some("r1")));
    builder.stmt(main, Stmt::Const("b", 42));
    builder.stmt(main, call(foo, &["b"], Some("r2")));
    builder.stmt(main, Stmt::Add("s", "r1", "r2"));
    builder.stmt(main, Stmt::Return(Some("s")));
    (builder.build(), main)
}

fn recursion() -> (Program, FuncId) {
    let mut builder = ProgramBuilder::new();
    let main = builder.declare("main", &[]);
    let count = builder.declare("count", &["n"]);

    let test = builder.stmt(count, Stmt::Nop);
    builder.stmt(count, Stmt::Return(Some("n")));
    let step = builder.stmt(
        count,
        Stmt::Linear {
            dst: "m",
            src: "n",
            mul: 1,
            add: -1,
        },
    );
    builder.stmt(count, call(count, &["m"], Some("r")));
    builder.stmt(count, Stmt::Return(Some("r")));
    builder.branch(count, test, step);

    builder.stmt(main, Stmt::Const("x", 5));
    builder.stmt(main, call(count, &["x"], Some("y")));
    builder.stmt(main, Stmt::Return(Some("y")));
    (builder.build(), main)
}

fn uninit() -> (Program, FuncId) {
    let mut builder = ProgramBuilder::new();
    let main = builder.declare("main", &[]);
    let id = builder.declare("id", &["p"]);

    builder.stmt(id, Stmt::Return(Some("p")));

    builder.stmt(main, Stmt::Decl("a"));
    builder.stmt(main, Stmt::Decl("b"));
    builder.stmt(main, Stmt::Const("a", 1));
    builder.stmt(main, Stmt::Add("c", "a", "b"));
    builder.stmt(main, Stmt::Use("c"));
    builder.stmt(main, call(id, &["b"], Some("d")));
    builder.stmt(main, Stmt::Return(Some("d")));
    (builder.build(), main)
}
