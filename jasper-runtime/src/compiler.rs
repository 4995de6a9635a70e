//! The central data structure of the runtime core.
//!
//! A [`Compiler`] owns the evaluation stack, the garbage-collected heap and
//! the global scope, and drives evaluation of typed AST nodes handed to it by
//! the frontend. The finished state (populated global scope, or a computed
//! value) is what the code-generation backend consumes.

use crate::eval::Evaluate;
use crate::gc::{Gc, Heap, Rooted};
use crate::stack::Stack;
use crate::value::{value_of, Value};
use crate::vm_objects::array::Array;
use crate::vm_objects::constructor::{RecordConstructor, VariantConstructor};
use crate::vm_objects::error::RuntimeError;
use crate::vm_objects::function::Function;
use crate::vm_objects::record::Record;
use crate::vm_objects::reference::Reference;
use crate::vm_objects::string::Str;
use crate::vm_objects::variant::Variant;
use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use jasper_core::ast::{Expr, FunctionDef, Program};
use jasper_core::backend::BackendRef;
use jasper_core::interner::{Interned, Interner};
use jasper_core::types::TypeTable;
use std::collections::HashMap;
use std::rc::Rc;

/// The global scope: identifier to the reference holding its binding.
#[derive(Default)]
pub struct Scope {
    declarations: HashMap<Interned, Gc<Reference>>,
}

impl Scope {
    pub fn declare(&mut self, id: Interned, reference: Gc<Reference>) {
        self.declarations.insert(id, reference);
    }

    pub fn access(&self, id: Interned) -> Option<Gc<Reference>> {
        self.declarations.get(&id).copied()
    }

    pub fn references(&self) -> impl Iterator<Item = Gc<Reference>> + '_ {
        self.declarations.values().copied()
    }
}

pub struct Compiler {
    /// The string interner shared with the frontend.
    pub interner: Interner,
    /// Resolved type-function metadata, supplied by the type checker.
    pub types: TypeTable,
    pub stack: Stack,
    pub heap: Heap,
    pub globals: Scope,
    /// Set while an early return is propagating up to the enclosing function
    /// body. Checked at every statement-sequencing point; there is no
    /// host-level unwinding.
    pub(crate) returning: bool,
    pub(crate) return_value: Value,
}

impl Compiler {
    pub fn new(interner: Interner, types: TypeTable) -> Self {
        Self {
            interner,
            types,
            stack: Stack::new(),
            heap: Heap::new(),
            globals: Scope::default(),
            returning: false,
            return_value: Value::Null,
        }
    }

    /// Evaluate a whole program's global declarations, in the
    /// dependency-component order the frontend supplied.
    ///
    /// Each declaration's reference is bound into global scope before its
    /// initializer runs, so recursive and mutually recursive definitions
    /// resolve.
    pub fn run_program(&mut self, program: &Program) -> Result<()> {
        for component in &program.declaration_order {
            for &index in component {
                let decl = program
                    .declarations
                    .get(index)
                    .ok_or_else(|| anyhow!("declaration order names declaration {} which does not exist", index))?;

                let reference = self.new_reference(Value::Null).as_gc();
                self.global_declare_direct(decl.name, reference);

                if let Some(init) = &decl.value {
                    init.evaluate(self);
                    let value = self.stack.pop_unsafe();
                    reference.to_obj().value = value_of(value);
                }
            }
        }
        Ok(())
    }

    /// Evaluate a single expression to its resulting value.
    pub fn eval_expression(&mut self, expr: &Expr) -> Value {
        expr.evaluate(self);
        value_of(self.stack.pop_unsafe())
    }

    pub(crate) fn save_return_value(&mut self, value: Value) {
        self.returning = true;
        self.return_value = value;
    }

    pub(crate) fn fetch_return_value(&mut self) -> Value {
        self.returning = false;
        std::mem::replace(&mut self.return_value, Value::Null)
    }

    /// Force a mark-and-sweep pass over the stack, the global scope and the
    /// transiently rooted cells.
    pub fn run_gc(&mut self) {
        let Self { heap, stack, globals, return_value, .. } = self;
        let roots = stack
            .values()
            .iter()
            .copied()
            .chain(globals.references().map(Value::Reference))
            .chain(std::iter::once(*return_value));
        heap.collect(roots);
    }

    /// Collect if the heap has outgrown the threshold set by the last pass.
    /// Called before allocations, when everything live is rooted.
    pub fn run_gc_if_needed(&mut self) {
        if self.heap.should_collect() {
            self.run_gc();
        }
    }

    // Binds a global name to the given reference.
    pub fn global_declare_direct(&mut self, id: Interned, reference: Gc<Reference>) {
        self.globals.declare(id, reference);
    }

    pub fn global_declare(&mut self, id: Interned, value: Value) {
        let reference = self.new_reference(value).as_gc();
        self.global_declare_direct(id, reference);
    }

    pub fn global_access(&self, id: Interned) -> Gc<Reference> {
        match self.globals.access(id) {
            Some(reference) => reference,
            None => panic!("undefined global '{}'", self.interner.lookup(id)),
        }
    }

    /// Store `src` (resolved through one level of reference) into the
    /// reference slot `dst`.
    pub fn assign(&mut self, dst: Value, src: Value) {
        match dst.as_reference() {
            Some(reference) => reference.to_obj().value = value_of(src),
            None => panic!("assignment target is not a reference"),
        }
    }

    pub fn new_reference(&mut self, value: Value) -> Rooted<Reference> {
        self.run_gc_if_needed();
        self.heap.alloc(Reference::new(value))
    }

    pub fn new_list(&mut self, elements: Vec<Gc<Reference>>) -> Rooted<Array> {
        self.run_gc_if_needed();
        self.heap.alloc(Array::new(elements))
    }

    pub fn new_record(&mut self, fields: IndexMap<Interned, Value>) -> Rooted<Record> {
        self.run_gc_if_needed();
        self.heap.alloc(Record::new(fields))
    }

    pub fn new_variant(&mut self, constructor: Interned, inner_value: Value) -> Rooted<Variant> {
        self.run_gc_if_needed();
        self.heap.alloc(Variant::new(constructor, inner_value))
    }

    pub fn new_function(&mut self, def: Rc<FunctionDef>, captures: Vec<Gc<Reference>>) -> Rooted<Function> {
        self.run_gc_if_needed();
        self.heap.alloc(Function::new(def, captures))
    }

    pub fn new_string(&mut self, value: String) -> Rooted<Str> {
        self.run_gc_if_needed();
        self.heap.alloc(Str::new(value))
    }

    pub fn new_error(&mut self, message: String) -> Rooted<RuntimeError> {
        self.run_gc_if_needed();
        self.heap.alloc(RuntimeError::new(message))
    }

    pub fn new_record_constructor(&mut self, keys: Vec<Interned>) -> Rooted<RecordConstructor> {
        self.run_gc_if_needed();
        self.heap.alloc(RecordConstructor::new(keys))
    }

    pub fn new_variant_constructor(&mut self, constructor: Interned) -> Rooted<VariantConstructor> {
        self.run_gc_if_needed();
        self.heap.alloc(VariantConstructor::new(constructor))
    }

    pub fn push_integer(&mut self, value: i32) {
        self.stack.push(Value::Integer(value));
    }

    pub fn push_float(&mut self, value: f64) {
        self.stack.push(Value::Float(value));
    }

    pub fn push_boolean(&mut self, value: bool) {
        self.stack.push(Value::Boolean(value));
    }

    pub fn push_string(&mut self, value: String) {
        let cell = self.new_string(value);
        self.stack.push(cell.as_value());
    }

    pub fn push_backend_value(&mut self, handle: BackendRef) {
        self.stack.push(Value::BackendHandle(handle));
    }

    pub fn push_record_constructor(&mut self, keys: Vec<Interned>) {
        let cell = self.new_record_constructor(keys);
        self.stack.push(cell.as_value());
    }

    pub fn push_variant_constructor(&mut self, constructor: Interned) {
        let cell = self.new_variant_constructor(constructor);
        self.stack.push(cell.as_value());
    }
}
