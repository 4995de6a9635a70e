use crate::interner::Interned;

/// A resolved monomorphic type, identified by a stable handle into the type checker.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct MonoId(pub u32);

/// A resolved type function (record or variant shape), identified by a stable handle.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct TypeFunctionId(pub u32);

/// What kind of value a type function constructs.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TypeFunctionTag {
    Record,
    Variant,
    /// Built-in types (int, array, ...). These are never constructed through
    /// type-function metadata.
    Builtin,
}

/// The shape metadata for one type function.
///
/// For records, `fields` lists the field names in declaration order. For
/// variants, `fields` lists the constructor names.
#[derive(Debug, Clone)]
pub struct TypeFunction {
    pub tag: TypeFunctionTag,
    pub fields: Vec<Interned>,
}

/// The type checker's resolved output, as consumed by the runtime: a mapping
/// from mono-type handles to type-function descriptors.
///
/// The runtime only ever walks `MonoId -> TypeFunctionId -> TypeFunction`; it
/// performs no inference or unification of its own.
#[derive(Debug, Default)]
pub struct TypeTable {
    mono_functions: Vec<TypeFunctionId>,
    type_functions: Vec<TypeFunction>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type function, returning its handle.
    pub fn add_type_function(&mut self, tf: TypeFunction) -> TypeFunctionId {
        let id = TypeFunctionId(self.type_functions.len() as u32);
        self.type_functions.push(tf);
        id
    }

    /// Register a mono type that resolves to the given type function.
    pub fn add_mono(&mut self, tf: TypeFunctionId) -> MonoId {
        let id = MonoId(self.mono_functions.len() as u32);
        self.mono_functions.push(tf);
        id
    }

    /// Resolve a mono type to its type function.
    pub fn find_function(&self, mono: MonoId) -> TypeFunctionId {
        self.mono_functions[mono.0 as usize]
    }

    pub fn get(&self, tf: TypeFunctionId) -> &TypeFunction {
        &self.type_functions[tf.0 as usize]
    }
}
