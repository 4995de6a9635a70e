use crate::gc::Header;
use crate::value::{Value, ValueTag};

/// A single mutable [`Value`] slot.
///
/// This is the unit of aliasing: every mutable binding (declarations, array
/// elements, function arguments, closure captures) is a `Reference`, so every
/// holder of the same cell observes the same mutation.
pub struct Reference {
    pub header: Header,
    pub value: Value,
}

impl Reference {
    pub fn new(value: Value) -> Self {
        Self {
            header: Header::new(ValueTag::Reference),
            value,
        }
    }
}
