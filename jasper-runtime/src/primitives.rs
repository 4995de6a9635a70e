//! The built-in native functions.
//!
//! Natives receive the contiguous span of already-evaluated argument values
//! plus the evaluator state, and return a single value that lands in the
//! callee's stack slot. Type mismatches produce an error value rather than
//! host-level control flow; the type checker is expected to have ruled them
//! out.

use crate::compiler::Compiler;
use crate::value::{value_of, NativeFn, Value};

pub static BUILTINS: &[(&str, NativeFn)] = &[
    ("+", self::add),
    ("-", self::sub),
    ("*", self::mul),
    ("/", self::div),
    ("<", self::lt),
    ("==", self::eq),
    ("size", self::size),
    ("push", self::push),
    ("set", self::set),
    ("print", self::print),
];

/// Bind every builtin into the compiler's global scope.
pub fn install_builtins(comp: &mut Compiler) {
    for (name, func) in BUILTINS {
        let id = comp.interner.intern(name);
        comp.global_declare(id, Value::NativeFunction(*func));
    }
}

fn wrong_types(comp: &mut Compiler, signature: &str) -> Value {
    let error = comp.new_error(format!("'{}': wrong argument types", signature));
    error.as_value()
}

fn add(args: &[Value], comp: &mut Compiler) -> Value {
    match (value_of(args[0]), value_of(args[1])) {
        (Value::Integer(lhs), Value::Integer(rhs)) => Value::Integer(lhs.wrapping_add(rhs)),
        (Value::Float(lhs), Value::Float(rhs)) => Value::Float(lhs + rhs),
        _ => wrong_types(comp, "+"),
    }
}

fn sub(args: &[Value], comp: &mut Compiler) -> Value {
    match (value_of(args[0]), value_of(args[1])) {
        (Value::Integer(lhs), Value::Integer(rhs)) => Value::Integer(lhs.wrapping_sub(rhs)),
        (Value::Float(lhs), Value::Float(rhs)) => Value::Float(lhs - rhs),
        _ => wrong_types(comp, "-"),
    }
}

fn mul(args: &[Value], comp: &mut Compiler) -> Value {
    match (value_of(args[0]), value_of(args[1])) {
        (Value::Integer(lhs), Value::Integer(rhs)) => Value::Integer(lhs.wrapping_mul(rhs)),
        (Value::Float(lhs), Value::Float(rhs)) => Value::Float(lhs * rhs),
        _ => wrong_types(comp, "*"),
    }
}

fn div(args: &[Value], comp: &mut Compiler) -> Value {
    match (value_of(args[0]), value_of(args[1])) {
        (Value::Integer(lhs), Value::Integer(rhs)) => {
            if rhs == 0 {
                let error = comp.new_error("'/': division by zero".to_string());
                return error.as_value();
            }
            Value::Integer(lhs.wrapping_div(rhs))
        }
        (Value::Float(lhs), Value::Float(rhs)) => Value::Float(lhs / rhs),
        _ => wrong_types(comp, "/"),
    }
}

fn lt(args: &[Value], comp: &mut Compiler) -> Value {
    match (value_of(args[0]), value_of(args[1])) {
        (Value::Integer(lhs), Value::Integer(rhs)) => Value::Boolean(lhs < rhs),
        (Value::Float(lhs), Value::Float(rhs)) => Value::Boolean(lhs < rhs),
        _ => wrong_types(comp, "<"),
    }
}

fn eq(args: &[Value], _comp: &mut Compiler) -> Value {
    // Scalars compare by value, heap cells by identity.
    Value::Boolean(value_of(args[0]) == value_of(args[1]))
}

fn size(args: &[Value], comp: &mut Compiler) -> Value {
    match value_of(args[0]).as_array() {
        Some(array) => Value::Integer(array.len() as i32),
        None => wrong_types(comp, "size"),
    }
}

/// Append a value to an array, wrapping it in a fresh reference so the new
/// element is independently aliasable.
fn push(args: &[Value], comp: &mut Compiler) -> Value {
    let Some(array) = value_of(args[0]).as_array() else {
        return wrong_types(comp, "push");
    };
    // The argument span is still on the stack, so both the array and the
    // element survive a collection triggered by this allocation.
    let reference = comp.new_reference(value_of(args[1]));
    array.to_obj().append(reference.as_gc());
    value_of(args[0])
}

/// Store a value through a reference binding: `set(x, v)` mutates `x` in
/// place, visible through every alias of the binding.
fn set(args: &[Value], comp: &mut Compiler) -> Value {
    comp.assign(args[0], args[1]);
    value_of(args[1])
}

fn print(args: &[Value], _comp: &mut Compiler) -> Value {
    let rendered: Vec<String> = args.iter().map(|arg| format!("{:?}", value_of(*arg))).collect();
    println!("{}", rendered.join(" "));
    Value::Null
}
