//! The tagged value model.
//!
//! A [`Value`] is a fixed-size, copyable tagged union: scalars live inline,
//! everything else is a [`Gc`] pointer to a heap cell. If the tag is a heap
//! tag, the payload is non-null and the pointee's own stored tag agrees with
//! it; typed accessors assert that agreement as a defense against stale
//! handles.

use crate::compiler::Compiler;
use crate::gc::Gc;
use crate::vm_objects::array::Array;
use crate::vm_objects::constructor::{RecordConstructor, VariantConstructor};
use crate::vm_objects::error::RuntimeError;
use crate::vm_objects::function::Function;
use crate::vm_objects::record::Record;
use crate::vm_objects::reference::Reference;
use crate::vm_objects::string::Str;
use crate::vm_objects::variant::Variant;
use jasper_core::backend::BackendRef;
use static_assertions::assert_eq_size;
use std::fmt;

/// The native-function calling convention: a contiguous span of
/// already-evaluated argument values plus the evaluator state, producing one
/// value. This is the sole extension point for builtins.
pub type NativeFn = fn(&[Value], &mut Compiler) -> Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ValueTag {
    Null,
    Boolean,
    Integer,
    Float,
    NativeFunction,
    BackendHandle,
    String,
    Array,
    Record,
    Variant,
    Function,
    Reference,
    RecordConstructor,
    VariantConstructor,
    Error,
}

pub fn is_heap_type(tag: ValueTag) -> bool {
    !matches!(
        tag,
        ValueTag::Null | ValueTag::Boolean | ValueTag::Integer | ValueTag::Float | ValueTag::NativeFunction | ValueTag::BackendHandle
    )
}

#[derive(Clone, Copy, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i32),
    Float(f64),
    NativeFunction(NativeFn),
    BackendHandle(BackendRef),
    String(Gc<Str>),
    Array(Gc<Array>),
    Record(Gc<Record>),
    Variant(Gc<Variant>),
    Function(Gc<Function>),
    Reference(Gc<Reference>),
    RecordConstructor(Gc<RecordConstructor>),
    VariantConstructor(Gc<VariantConstructor>),
    Error(Gc<RuntimeError>),
}

// Values travel by copy through stack slots; keep them at two words.
assert_eq_size!(Value, [u64; 2]);

impl Value {
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Null => ValueTag::Null,
            Value::Boolean(_) => ValueTag::Boolean,
            Value::Integer(_) => ValueTag::Integer,
            Value::Float(_) => ValueTag::Float,
            Value::NativeFunction(_) => ValueTag::NativeFunction,
            Value::BackendHandle(_) => ValueTag::BackendHandle,
            Value::String(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::String);
                ValueTag::String
            }
            Value::Array(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Array);
                ValueTag::Array
            }
            Value::Record(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Record);
                ValueTag::Record
            }
            Value::Variant(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Variant);
                ValueTag::Variant
            }
            Value::Function(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Function);
                ValueTag::Function
            }
            Value::Reference(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Reference);
                ValueTag::Reference
            }
            Value::RecordConstructor(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::RecordConstructor);
                ValueTag::RecordConstructor
            }
            Value::VariantConstructor(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::VariantConstructor);
                ValueTag::VariantConstructor
            }
            Value::Error(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Error);
                ValueTag::Error
            }
        }
    }

    pub fn is_heap(&self) -> bool {
        is_heap_type(self.tag())
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_native_function(&self) -> Option<NativeFn> {
        match self {
            Value::NativeFunction(func) => Some(*func),
            _ => None,
        }
    }

    pub fn as_backend_handle(&self) -> Option<BackendRef> {
        match self {
            Value::BackendHandle(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<Gc<Str>> {
        match self {
            Value::String(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::String);
                Some(*cell)
            }
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<Gc<Array>> {
        match self {
            Value::Array(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Array);
                Some(*cell)
            }
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<Gc<Record>> {
        match self {
            Value::Record(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Record);
                Some(*cell)
            }
            _ => None,
        }
    }

    pub fn as_variant(&self) -> Option<Gc<Variant>> {
        match self {
            Value::Variant(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Variant);
                Some(*cell)
            }
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<Gc<Function>> {
        match self {
            Value::Function(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Function);
                Some(*cell)
            }
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<Gc<Reference>> {
        match self {
            Value::Reference(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Reference);
                Some(*cell)
            }
            _ => None,
        }
    }

    pub fn as_record_constructor(&self) -> Option<Gc<RecordConstructor>> {
        match self {
            Value::RecordConstructor(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::RecordConstructor);
                Some(*cell)
            }
            _ => None,
        }
    }

    pub fn as_variant_constructor(&self) -> Option<Gc<VariantConstructor>> {
        match self {
            Value::VariantConstructor(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::VariantConstructor);
                Some(*cell)
            }
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<Gc<RuntimeError>> {
        match self {
            Value::Error(cell) => {
                debug_assert_eq!(cell.header.tag(), ValueTag::Error);
                Some(*cell)
            }
            _ => None,
        }
    }
}

/// Unwrap one level of reference indirection.
///
/// Identifiers evaluate to the `Reference` holding their binding; most
/// consumers want the bound value instead.
pub fn value_of(value: Value) -> Value {
    match value {
        Value::Reference(reference) => reference.value,
        other => other,
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::NativeFunction(_) => write!(f, "<native function>"),
            Value::BackendHandle(handle) => write!(f, "<backend:{}>", handle.0),
            Value::String(cell) => write!(f, "{:?}", cell.value),
            Value::Array(cell) => write!(f, "<array of {}>", cell.elements.len()),
            Value::Record(cell) => write!(f, "<record of {}>", cell.fields.len()),
            Value::Variant(cell) => write!(f, "<variant #{}>", cell.constructor),
            Value::Function(_) => write!(f, "<function>"),
            Value::Reference(cell) => write!(f, "ref {:?}", cell.value),
            Value::RecordConstructor(_) => write!(f, "<record constructor>"),
            Value::VariantConstructor(cell) => write!(f, "<variant constructor #{}>", cell.constructor),
            Value::Error(cell) => write!(f, "<error: {}>", cell.message),
        }
    }
}
