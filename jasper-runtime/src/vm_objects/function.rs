use crate::gc::{Gc, Header};
use crate::value::ValueTag;
use crate::vm_objects::reference::Reference;
use jasper_core::ast::FunctionDef;
use std::rc::Rc;

/// A closure: an immutable handle to its definition plus the captured
/// references, fixed once at closure-creation time.
pub struct Function {
    pub header: Header,
    pub def: Rc<FunctionDef>,
    pub captures: Vec<Gc<Reference>>,
}

impl Function {
    pub fn new(def: Rc<FunctionDef>, captures: Vec<Gc<Reference>>) -> Self {
        Self {
            header: Header::new(ValueTag::Function),
            def,
            captures,
        }
    }
}
