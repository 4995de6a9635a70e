use indexmap::IndexMap;
use jasper_core::ast::{
    Block, Capture, Declaration, Expr, FunctionDef, IdentifierExpr, IdentifierOrigin, MatchCase, Program, Stmt, UNRESOLVED_OFFSET,
};
use jasper_core::interner::{Interned, Interner};
use jasper_core::types::{TypeFunction, TypeFunctionTag, TypeTable};
use jasper_runtime::compiler::Compiler;
use jasper_runtime::primitives::install_builtins;
use jasper_runtime::value::Value;
use rstest::{fixture, rstest};
use std::rc::Rc;

#[fixture]
fn comp() -> Compiler {
    let mut comp = Compiler::new(Interner::new(), TypeTable::new());
    install_builtins(&mut comp);
    comp
}

fn int(value: i32) -> Expr {
    Expr::IntegerLiteral(value)
}

fn global(name: Interned) -> Expr {
    Expr::Identifier(IdentifierExpr {
        name,
        origin: IdentifierOrigin::Global,
        frame_offset: UNRESOLVED_OFFSET,
    })
}

fn local(name: Interned, frame_offset: i32) -> Expr {
    Expr::Identifier(IdentifierExpr {
        name,
        origin: IdentifierOrigin::Local,
        frame_offset,
    })
}

fn captured(name: Interned, frame_offset: i32) -> Expr {
    Expr::Identifier(IdentifierExpr {
        name,
        origin: IdentifierOrigin::Capture,
        frame_offset,
    })
}

fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args,
    }
}

fn seq(body: Vec<Stmt>) -> Expr {
    Expr::Sequence(Block { body })
}

fn ret(value: Expr) -> Stmt {
    Stmt::Return(value)
}

fn decl(name: Interned, value: Expr) -> Stmt {
    Stmt::Declaration(Declaration::new(name, Some(value)))
}

fn lambda(params: Vec<Interned>, captures: Vec<(Interned, i32, i32)>, body: Expr) -> Expr {
    Expr::FunctionLiteral(Rc::new(FunctionDef {
        params: params.into_iter().map(|name| Declaration::new(name, None)).collect(),
        captures: captures
            .into_iter()
            .map(|(name, outer_frame_offset, inner_frame_offset)| Capture {
                name,
                outer_frame_offset,
                inner_frame_offset,
            })
            .collect(),
        body,
    }))
}

#[rstest]
fn literals_evaluate_to_themselves(mut comp: Compiler) {
    assert_eq!(comp.eval_expression(&int(42)), Value::Integer(42));
    assert_eq!(comp.eval_expression(&Expr::BooleanLiteral(true)), Value::Boolean(true));
    assert_eq!(comp.eval_expression(&Expr::NullLiteral), Value::Null);
    assert_eq!(comp.eval_expression(&Expr::NumberLiteral(1.5)), Value::Float(1.5));

    let text = comp.interner.intern("hello");
    let result = comp.eval_expression(&Expr::StringLiteral(text));
    assert_eq!(result.as_string().unwrap().as_str(), "hello");
}

#[rstest]
fn native_arithmetic(mut comp: Compiler) {
    let plus = comp.interner.intern("+");
    let result = comp.eval_expression(&call(global(plus), vec![int(2), int(3)]));
    assert_eq!(result, Value::Integer(5));

    let times = comp.interner.intern("*");
    let nested = call(global(times), vec![call(global(plus), vec![int(1), int(2)]), int(4)]);
    assert_eq!(comp.eval_expression(&nested), Value::Integer(12));
}

#[rstest]
fn division_by_zero_yields_an_error_value(mut comp: Compiler) {
    let div = comp.interner.intern("/");
    let result = comp.eval_expression(&call(global(div), vec![int(1), int(0)]));
    let error = result.as_error().unwrap();
    assert!(error.message.contains("division by zero"));
}

#[rstest]
fn division_wraps_at_the_integer_minimum(mut comp: Compiler) {
    let div = comp.interner.intern("/");
    let result = comp.eval_expression(&call(global(div), vec![int(i32::MIN), int(-1)]));
    assert_eq!(result, Value::Integer(i32::MIN));
}

#[rstest]
fn ternary_picks_one_branch(mut comp: Compiler) {
    let expr = Expr::Ternary {
        condition: Box::new(Expr::BooleanLiteral(true)),
        then_branch: Box::new(int(1)),
        else_branch: Box::new(int(2)),
    };
    assert_eq!(comp.eval_expression(&expr), Value::Integer(1));

    let expr = Expr::Ternary {
        condition: Box::new(Expr::BooleanLiteral(false)),
        then_branch: Box::new(int(1)),
        else_branch: Box::new(int(2)),
    };
    assert_eq!(comp.eval_expression(&expr), Value::Integer(2));
}

#[rstest]
fn record_constructed_through_struct_expression(mut comp: Compiler) {
    let x = comp.interner.intern("x");
    let y = comp.interner.intern("y");

    let expr = Expr::Access {
        target: Box::new(Expr::Construct {
            constructor: Box::new(Expr::StructExpr { fields: vec![x, y] }),
            args: vec![int(1), int(2)],
        }),
        member: y,
    };
    assert_eq!(comp.eval_expression(&expr), Value::Integer(2));
}

#[rstest]
fn match_dispatches_on_the_constructor(mut comp: Compiler) {
    let some = comp.interner.intern("Some");
    let none = comp.interner.intern("None");
    let x = comp.interner.intern("x");
    let plus = comp.interner.intern("+");

    let option_tf = comp.types.add_type_function(TypeFunction {
        tag: TypeFunctionTag::Variant,
        fields: vec![some, none],
    });
    let option_mono = comp.types.add_mono(option_tf);

    let scrutinee = Expr::Construct {
        constructor: Box::new(Expr::Constructor {
            mono: option_mono,
            id: some,
        }),
        args: vec![int(5)],
    };

    let mut cases = IndexMap::new();
    cases.insert(
        some,
        MatchCase {
            binding: Declaration::new(x, None),
            // The rebound inner value sits at frame offset 0 at top level.
            body: call(global(plus), vec![local(x, 0), int(1)]),
        },
    );
    cases.insert(
        none,
        MatchCase {
            binding: Declaration::new(x, None),
            body: int(0),
        },
    );

    let expr = Expr::Match {
        target: Box::new(scrutinee),
        cases,
    };
    assert_eq!(comp.eval_expression(&expr), Value::Integer(6));
}

#[rstest]
fn union_expression_yields_first_class_constructors(mut comp: Compiler) {
    let some = comp.interner.intern("Some");
    let none = comp.interner.intern("None");
    let x = comp.interner.intern("x");

    let scrutinee = Expr::Construct {
        constructor: Box::new(Expr::Access {
            target: Box::new(Expr::UnionExpr {
                constructors: vec![some, none],
            }),
            member: some,
        }),
        args: vec![int(7)],
    };

    let mut cases = IndexMap::new();
    cases.insert(
        some,
        MatchCase {
            binding: Declaration::new(x, None),
            body: local(x, 0),
        },
    );
    cases.insert(
        none,
        MatchCase {
            binding: Declaration::new(x, None),
            body: int(0),
        },
    );

    let expr = Expr::Match {
        target: Box::new(scrutinee),
        cases,
    };
    assert_eq!(comp.eval_expression(&expr), Value::Integer(7));
}

#[rstest]
fn array_elements_alias_through_references(mut comp: Compiler) {
    let a = comp.interner.intern("a");
    let push = comp.interner.intern("push");
    let set = comp.interner.intern("set");

    // a := [1, 2, 3]; push(a, 4); set(a[3], 9); return a[3]
    let expr = seq(vec![
        decl(a, Expr::ArrayLiteral(vec![int(1), int(2), int(3)])),
        Stmt::Expr(call(global(push), vec![local(a, 0), int(4)])),
        Stmt::Expr(call(
            global(set),
            vec![
                Expr::Index {
                    target: Box::new(local(a, 0)),
                    index: Box::new(int(3)),
                },
                int(9),
            ],
        )),
        ret(Expr::Index {
            target: Box::new(local(a, 0)),
            index: Box::new(int(3)),
        }),
    ]);
    assert_eq!(comp.eval_expression(&expr), Value::Integer(9));
}

#[rstest]
fn captures_alias_the_outer_binding(mut comp: Compiler) {
    let x = comp.interner.intern("x");
    let f = comp.interner.intern("f");
    let set = comp.interner.intern("set");

    // x := 1; f := fun() { set(x, 42) }; f(); return x
    let closure_body = seq(vec![Stmt::Expr(call(global(set), vec![captured(x, 0), int(42)]))]);
    let expr = seq(vec![
        decl(x, int(1)),
        decl(f, lambda(vec![], vec![(x, 0, 0)], closure_body)),
        Stmt::Expr(call(local(f, 1), vec![])),
        ret(local(x, 0)),
    ]);
    assert_eq!(comp.eval_expression(&expr), Value::Integer(42));
}

#[rstest]
fn arguments_are_fresh_mutable_bindings(mut comp: Compiler) {
    let n = comp.interner.intern("n");
    let f = comp.interner.intern("f");
    let set = comp.interner.intern("set");

    // f := fun(n) { set(n, 10); return n }; return f(3)
    let body = seq(vec![
        Stmt::Expr(call(global(set), vec![local(n, 0), int(10)])),
        ret(local(n, 0)),
    ]);
    let expr = seq(vec![
        decl(f, lambda(vec![n], vec![], body)),
        ret(call(local(f, 0), vec![int(3)])),
    ]);
    assert_eq!(comp.eval_expression(&expr), Value::Integer(10));
}

#[rstest]
fn while_loop_stops_on_early_return(mut comp: Compiler) {
    let i = comp.interner.intern("i");
    let plus = comp.interner.intern("+");
    let lt = comp.interner.intern("<");
    let eq = comp.interner.intern("==");
    let set = comp.interner.intern("set");
    let f = comp.interner.intern("f");

    // f := fun() {
    //     i := 0;
    //     while i < 100 { set(i, i + 1); if i == 7 { return i } }
    //     return -1
    // }
    let loop_body = Stmt::Block(Block {
        body: vec![
            Stmt::Expr(call(
                global(set),
                vec![local(i, 0), call(global(plus), vec![local(i, 0), int(1)])],
            )),
            Stmt::IfElse {
                condition: call(global(eq), vec![local(i, 0), int(7)]),
                body: Box::new(ret(local(i, 0))),
                else_body: None,
            },
        ],
    });
    let body = seq(vec![
        decl(i, int(0)),
        Stmt::While {
            condition: call(global(lt), vec![local(i, 0), int(100)]),
            body: Box::new(loop_body),
        },
        ret(int(-1)),
    ]);
    let expr = seq(vec![
        decl(f, lambda(vec![], vec![], body)),
        ret(call(local(f, 0), vec![])),
    ]);
    assert_eq!(comp.eval_expression(&expr), Value::Integer(7));
}

#[rstest]
fn recursive_function_through_global_scope(mut comp: Compiler) {
    let fact = comp.interner.intern("fact");
    let n = comp.interner.intern("n");
    let times = comp.interner.intern("*");
    let minus = comp.interner.intern("-");
    let lt = comp.interner.intern("<");

    // fact := fun(n) { return n < 2 ? 1 : n * fact(n - 1) }
    let body = seq(vec![ret(Expr::Ternary {
        condition: Box::new(call(global(lt), vec![local(n, 0), int(2)])),
        then_branch: Box::new(int(1)),
        else_branch: Box::new(call(
            global(times),
            vec![
                local(n, 0),
                call(global(fact), vec![call(global(minus), vec![local(n, 0), int(1)])]),
            ],
        )),
    })]);

    let program = Program {
        declarations: vec![Declaration::new(fact, Some(lambda(vec![n], vec![], body)))],
        declaration_order: vec![vec![0]],
    };
    comp.run_program(&program).unwrap();

    let result = comp.eval_expression(&call(global(fact), vec![int(6)]));
    assert_eq!(result, Value::Integer(720));
}

#[rstest]
fn mutually_recursive_globals_resolve(mut comp: Compiler) {
    let f = comp.interner.intern("f");
    let g = comp.interner.intern("g");

    // f := fun() { return g() }; g := fun() { return 5 }
    // f is declared first and calls g, which is bound later in the same
    // dependency component.
    let f_body = seq(vec![ret(call(global(g), vec![]))]);
    let g_body = seq(vec![ret(int(5))]);

    let program = Program {
        declarations: vec![
            Declaration::new(f, Some(lambda(vec![], vec![], f_body))),
            Declaration::new(g, Some(lambda(vec![], vec![], g_body))),
        ],
        declaration_order: vec![vec![0, 1]],
    };
    comp.run_program(&program).unwrap();

    let result = comp.eval_expression(&call(global(f), vec![]));
    assert_eq!(result, Value::Integer(5));
}

#[rstest]
fn sequence_without_return_yields_null(mut comp: Compiler) {
    let expr = seq(vec![Stmt::Expr(int(1)), Stmt::Expr(int(2))]);
    assert_eq!(comp.eval_expression(&expr), Value::Null);
}

#[rstest]
fn stack_is_empty_after_every_evaluation(mut comp: Compiler) {
    let plus = comp.interner.intern("+");
    comp.eval_expression(&call(global(plus), vec![int(1), int(2)]));
    assert!(comp.stack.is_empty());

    let a = comp.interner.intern("a");
    comp.eval_expression(&seq(vec![
        decl(a, Expr::ArrayLiteral(vec![int(1)])),
        ret(local(a, 0)),
    ]));
    assert!(comp.stack.is_empty());
}

#[rstest]
fn bad_declaration_order_is_reported(mut comp: Compiler) {
    let f = comp.interner.intern("f");
    let program = Program {
        declarations: vec![Declaration::new(f, Some(int(1)))],
        declaration_order: vec![vec![3]],
    };
    assert!(comp.run_program(&program).is_err());
}

#[rstest]
fn type_function_metadata_drives_construction(mut comp: Compiler) {
    let x = comp.interner.intern("x");
    let y = comp.interner.intern("y");

    let point_tf = comp.types.add_type_function(TypeFunction {
        tag: TypeFunctionTag::Record,
        fields: vec![x, y],
    });
    let point_mono = comp.types.add_mono(point_tf);

    // Constructing through the resolved mono-type handle builds the record.
    let expr = Expr::Access {
        target: Box::new(Expr::Construct {
            constructor: Box::new(Expr::MonoTypeHandle { id: point_mono }),
            args: vec![int(3), int(4)],
        }),
        member: x,
    };
    assert_eq!(comp.eval_expression(&expr), Value::Integer(3));
}
