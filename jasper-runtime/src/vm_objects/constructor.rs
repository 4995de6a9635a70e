use crate::gc::Header;
use crate::value::ValueTag;
use jasper_core::interner::Interned;

/// A first-class record "recipe": applying it to arguments builds a record
/// whose fields are `keys` zipped with the argument run.
pub struct RecordConstructor {
    pub header: Header,
    pub keys: Vec<Interned>,
}

impl RecordConstructor {
    pub fn new(keys: Vec<Interned>) -> Self {
        Self {
            header: Header::new(ValueTag::RecordConstructor),
            keys,
        }
    }
}

/// A first-class variant constructor: applying it to one argument builds a
/// variant tagged with `constructor`.
pub struct VariantConstructor {
    pub header: Header,
    pub constructor: Interned,
}

impl VariantConstructor {
    pub fn new(constructor: Interned) -> Self {
        Self {
            header: Header::new(ValueTag::VariantConstructor),
            constructor,
        }
    }
}
