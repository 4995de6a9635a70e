use crate::gc::Header;
use crate::value::{Value, ValueTag};
use jasper_core::interner::Interned;

/// A tagged variant value: a constructor identifier plus one inner value.
///
/// Nullary constructors store `Value::Null` as their inner value.
pub struct Variant {
    pub header: Header,
    pub constructor: Interned,
    pub inner_value: Value,
}

impl Variant {
    pub fn new(constructor: Interned, inner_value: Value) -> Self {
        Self {
            header: Header::new(ValueTag::Variant),
            constructor,
            inner_value,
        }
    }
}
