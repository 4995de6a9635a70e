use crate::gc::Header;
use crate::value::ValueTag;

/// An owned text buffer on the heap.
pub struct Str {
    pub header: Header,
    pub value: String,
}

impl Str {
    pub fn new(value: String) -> Self {
        Self {
            header: Header::new(ValueTag::String),
            value,
        }
    }

    pub fn as_str(&self) -> &str {
        self.value.as_str()
    }
}
