use crate::gc::Header;
use crate::value::{Value, ValueTag};
use indexmap::IndexMap;
use jasper_core::interner::Interned;

/// A mapping from field identifier to value.
///
/// Field values are plain `Value`s, not references: records are not aliasable
/// per-field the way arrays are per-element.
pub struct Record {
    pub header: Header,
    pub fields: IndexMap<Interned, Value>,
}

impl Record {
    pub fn new(fields: IndexMap<Interned, Value>) -> Self {
        Self {
            header: Header::new(ValueTag::Record),
            fields,
        }
    }

    pub fn get_field(&self, id: Interned) -> Option<Value> {
        self.fields.get(&id).copied()
    }
}
