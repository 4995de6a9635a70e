//! Evaluation of typed AST nodes.
//!
//! Dispatch is a single exhaustive match over node kinds. Expression nodes
//! leave exactly one value on the stack; statement nodes are net-neutral.
//! Early return propagates through the `returning` flag, checked after every
//! statement in a sequence, never through host-level unwinding.
//!
//! Violations of upstream contracts (calling a non-function, a missing match
//! case, an unassigned frame offset) are internal-consistency failures: they
//! terminate evaluation with a diagnostic, there is no local recovery.

use crate::compiler::Compiler;
use crate::gc::Gc;
use crate::value::{value_of, Value};
use crate::vm_objects::function::Function;
use crate::vm_objects::reference::Reference;
use indexmap::IndexMap;
use jasper_core::ast::{Block, Expr, IdentifierOrigin, Stmt, UNRESOLVED_OFFSET};
use jasper_core::interner::Interned;
use jasper_core::types::TypeFunctionTag;
use log::trace;

/// The trait for evaluating AST nodes against a [`Compiler`].
pub trait Evaluate {
    fn evaluate(&self, comp: &mut Compiler);
}

impl Evaluate for Expr {
    fn evaluate(&self, comp: &mut Compiler) {
        match self {
            Expr::IntegerLiteral(value) => comp.push_integer(*value),
            Expr::NumberLiteral(value) => comp.push_float(*value),
            Expr::BooleanLiteral(value) => comp.push_boolean(*value),
            Expr::NullLiteral => comp.stack.push(Value::Null),
            Expr::StringLiteral(text) => {
                let text = comp.interner.lookup(*text).to_string();
                comp.push_string(text);
            }

            Expr::ArrayLiteral(elements) => {
                let mut result = comp.new_list(Vec::with_capacity(elements.len()));
                for element in elements {
                    element.evaluate(comp);
                    // Allocate the element reference first; the element value
                    // stays rooted on the stack until it is stored.
                    let reference = comp.new_reference(Value::Null);
                    reference.as_gc().to_obj().value = value_of(comp.stack.pop_unsafe());
                    result.append(reference.as_gc());
                }
                comp.stack.push(result.as_value());
            }

            Expr::Identifier(ident) => match ident.origin {
                IdentifierOrigin::Local | IdentifierOrigin::Capture => {
                    if ident.frame_offset == UNRESOLVED_OFFSET {
                        panic!("missing layout for identifier '{}'", comp.interner.lookup(ident.name));
                    }
                    let value = comp.stack.frame_at(ident.frame_offset);
                    comp.stack.push(value);
                }
                IdentifierOrigin::Global => {
                    let reference = comp.global_access(ident.name);
                    comp.stack.push(Value::Reference(reference));
                }
            },

            Expr::FunctionLiteral(def) => {
                let mut captures: Vec<Option<Gc<Reference>>> = vec![None; def.captures.len()];
                for capture in &def.captures {
                    if capture.outer_frame_offset == UNRESOLVED_OFFSET || capture.inner_frame_offset == UNRESOLVED_OFFSET {
                        panic!("missing layout for capture '{}'", comp.interner.lookup(capture.name));
                    }
                    let value = comp.stack.frame_at(capture.outer_frame_offset);
                    let reference = match value.as_reference() {
                        Some(reference) => reference,
                        None => panic!("captured binding '{}' is not a reference", comp.interner.lookup(capture.name)),
                    };
                    let slot = capture.inner_frame_offset as usize - def.params.len();
                    captures[slot] = Some(reference);
                }
                let captures = captures
                    .into_iter()
                    .map(|capture| match capture {
                        Some(reference) => reference,
                        None => panic!("capture list has an unassigned slot"),
                    })
                    .collect();

                let result = comp.new_function(def.clone(), captures);
                comp.stack.push(result.as_value());
            }

            Expr::Call { callee, args } => evaluate_call(callee, args, comp),

            Expr::Index { target, index } => {
                target.evaluate(comp);
                index.evaluate(comp);

                let position = match value_of(comp.stack.pop_unsafe()).as_integer() {
                    Some(position) => position,
                    None => panic!("array index is not an integer"),
                };
                let array = match value_of(comp.stack.pop_unsafe()).as_array() {
                    Some(array) => array,
                    None => panic!("indexed a non-array at runtime"),
                };

                comp.stack.push(Value::Reference(array.at(position)));
            }

            Expr::Ternary { condition, then_branch, else_branch } => {
                condition.evaluate(comp);
                let condition = expect_boolean(comp.stack.pop_unsafe());
                if condition {
                    then_branch.evaluate(comp);
                } else {
                    else_branch.evaluate(comp);
                }
            }

            Expr::Access { target, member } => {
                target.evaluate(comp);
                let record = match value_of(comp.stack.pop_unsafe()).as_record() {
                    Some(record) => record,
                    None => panic!("accessed a member of a non-record at runtime"),
                };
                let value = match record.get_field(*member) {
                    Some(value) => value,
                    None => panic!("record has no field '{}'", comp.interner.lookup(*member)),
                };
                comp.stack.push(value);
            }

            Expr::Match { target, cases } => {
                // Put the matched-on variant on the top of the stack.
                target.evaluate(comp);

                let variant = match value_of(comp.stack.access(0)).as_variant() {
                    Some(variant) => variant,
                    None => panic!("matched on a non-variant at runtime"),
                };
                let constructor = variant.constructor;
                let inner_value = value_of(variant.inner_value);

                // Don't pop the variant: its slot is already lined up as the
                // case binding. Replace it with its inner value, wrapped in a
                // reference so the case body can treat it as a normal local.
                let reference = comp.new_reference(Value::Null);
                reference.as_gc().to_obj().value = inner_value;
                *comp.stack.access_mut(0) = reference.as_value();

                let case = match cases.get(&constructor) {
                    Some(case) => case,
                    None => panic!("no case for constructor '{}' in match", comp.interner.lookup(constructor)),
                };
                case.body.evaluate(comp);

                // Splice the result down over the discarded binding slot.
                let result = comp.stack.pop_unsafe();
                *comp.stack.access_mut(0) = result;
            }

            Expr::Construct { constructor, args } => evaluate_construct(constructor, args, comp),

            Expr::Sequence(block) => {
                block.evaluate(comp);
                if !comp.returning {
                    comp.save_return_value(Value::Null);
                }
                let value = comp.fetch_return_value();
                comp.stack.push(value);
            }

            Expr::StructExpr { fields } => comp.push_record_constructor(fields.clone()),

            Expr::UnionExpr { constructors } => {
                let mut members: IndexMap<Interned, Value> = IndexMap::with_capacity(constructors.len());
                let mut rooted = Vec::with_capacity(constructors.len());
                for constructor in constructors {
                    let cell = comp.new_variant_constructor(*constructor);
                    members.insert(*constructor, cell.as_value());
                    // Keep each constructor rooted until the record owns them all.
                    rooted.push(cell);
                }
                let result = comp.new_record(members);
                drop(rooted);
                comp.stack.push(result.as_value());
            }

            Expr::TypeTerm { callee, .. } => callee.evaluate(comp),

            Expr::TypeFunctionHandle { syntax, .. } => syntax.evaluate(comp),

            Expr::MonoTypeHandle { id } => {
                let tf = comp.types.find_function(*id);
                let fields = comp.types.get(tf).fields.clone();
                comp.push_record_constructor(fields);
            }

            Expr::Constructor { mono, id } => {
                let tf = comp.types.find_function(*mono);
                let data = comp.types.get(tf);
                match data.tag {
                    TypeFunctionTag::Record => {
                        let fields = data.fields.clone();
                        comp.push_record_constructor(fields);
                    }
                    TypeFunctionTag::Variant => comp.push_variant_constructor(*id),
                    TypeFunctionTag::Builtin => {
                        panic!("cannot construct builtin type function for '{}'", comp.interner.lookup(*id))
                    }
                }
            }
        }
    }
}

impl Evaluate for Stmt {
    fn evaluate(&self, comp: &mut Compiler) {
        match self {
            Stmt::Block(block) => block.evaluate(comp),

            Stmt::Declaration(decl) => {
                // Push the reference before evaluating the initializer, so
                // self-referential bindings can capture their own slot.
                let reference = comp.new_reference(Value::Null).as_gc();
                comp.stack.push(Value::Reference(reference));
                if let Some(init) = &decl.value {
                    init.evaluate(comp);
                    let value = comp.stack.pop_unsafe();
                    reference.to_obj().value = value_of(value);
                }
            }

            Stmt::Return(expr) => {
                expr.evaluate(comp);
                let value = comp.stack.pop_unsafe();
                comp.save_return_value(value_of(value));
            }

            Stmt::IfElse { condition, body, else_body } => {
                condition.evaluate(comp);
                let condition = expect_boolean(comp.stack.pop_unsafe());
                if condition {
                    body.evaluate(comp);
                } else if let Some(else_body) = else_body {
                    else_body.evaluate(comp);
                }
            }

            Stmt::While { condition, body } => loop {
                condition.evaluate(comp);
                if !expect_boolean(comp.stack.pop_unsafe()) {
                    break;
                }

                body.evaluate(comp);

                if comp.returning {
                    break;
                }
            },

            Stmt::Expr(expr) => {
                expr.evaluate(comp);
                comp.stack.pop_unsafe();
            }
        }
    }
}

impl Evaluate for Block {
    fn evaluate(&self, comp: &mut Compiler) {
        comp.stack.start_stack_region();
        for stmt in &self.body {
            stmt.evaluate(comp);
            if comp.returning {
                break;
            }
        }
        comp.stack.end_stack_region();
    }
}

fn expect_boolean(value: Value) -> bool {
    match value_of(value).as_boolean() {
        Some(condition) => condition,
        None => panic!("condition did not evaluate to a boolean"),
    }
}

fn evaluate_call(callee: &Expr, args: &[Expr], comp: &mut Compiler) {
    callee.evaluate(comp);

    // The callee stays on the stack; its slot becomes the result slot.
    let callee_value = value_of(comp.stack.access(0));
    let frame_start = comp.stack.len();

    match callee_value {
        Value::Function(function) => {
            for arg in args {
                arg.evaluate(comp);
                // Arguments are mutable bindings: wrap each in a fresh
                // reference. The reference is allocated before the argument
                // value leaves the stack.
                let reference = comp.new_reference(Value::Null);
                reference.as_gc().to_obj().value = value_of(comp.stack.access(0));
                *comp.stack.access_mut(0) = reference.as_value();
            }

            comp.stack.start_stack_frame(frame_start);
            evaluate_function_body(function, args.len(), comp);

            // Pop the result of the function, and clobber the callee.
            let result = comp.stack.pop_unsafe();
            *comp.stack.frame_at_mut(-1) = result;
            comp.stack.end_stack_frame();
        }
        Value::NativeFunction(native) => {
            for arg in args {
                arg.evaluate(comp);
            }
            comp.stack.start_stack_frame(frame_start);

            // The argument span stays on the stack (rooted) for the duration
            // of the native call; the native sees a copy.
            let native_args = comp.stack.frame_slice(0, args.len()).to_vec();
            let result = native(&native_args, comp);

            *comp.stack.frame_at_mut(-1) = result;
            comp.stack.end_stack_frame();
        }
        other => panic!("attempted to call a non-function at runtime: {:?}", other),
    }
}

fn evaluate_function_body(function: Gc<Function>, arg_count: usize, comp: &mut Compiler) {
    let def = function.def.clone();
    debug_assert_eq!(def.params.len(), arg_count);
    trace!("call: {} args, {} captures", arg_count, function.captures.len());

    for capture in function.captures.clone() {
        comp.stack.push(Value::Reference(capture));
    }

    def.body.evaluate(comp);
}

fn evaluate_construct(constructor: &Expr, args: &[Expr], comp: &mut Compiler) {
    // The constructor stays on the stack while the arguments are evaluated.
    constructor.evaluate(comp);
    let constructor_value = value_of(comp.stack.access(0));

    match constructor_value {
        Value::RecordConstructor(record_ctor) => {
            debug_assert_eq!(args.len(), record_ctor.keys.len());

            // Arguments land in a contiguous run starting at storage_point.
            let storage_point = comp.stack.len();
            for arg in args {
                arg.evaluate(comp);
            }

            let mut fields: IndexMap<Interned, Value> = IndexMap::with_capacity(args.len());
            for (index, key) in record_ctor.keys.iter().enumerate() {
                fields.insert(*key, value_of(comp.stack.at(storage_point + index)));
            }

            let result = comp.new_record(fields);

            // Discard the argument run and replace the constructor slot.
            while comp.stack.len() > storage_point {
                comp.stack.pop_unsafe();
            }
            *comp.stack.access_mut(0) = result.as_value();
        }
        Value::VariantConstructor(variant_ctor) => {
            debug_assert_eq!(args.len(), 1);

            args[0].evaluate(comp);
            let inner = value_of(comp.stack.access(0));
            let result = comp.new_variant(variant_ctor.constructor, inner);

            // Replace the constructor slot with the variant, and pop the argument.
            *comp.stack.access_mut(1) = result.as_value();
            comp.stack.pop_unsafe();
        }
        other => panic!("applied a non-constructor value at runtime: {:?}", other),
    }
}
