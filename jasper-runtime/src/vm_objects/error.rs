use crate::gc::Header;
use crate::value::ValueTag;

/// A runtime error value, produced by native functions to surface a defect
/// without host-level control flow.
pub struct RuntimeError {
    pub header: Header,
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: String) -> Self {
        Self {
            header: Header::new(ValueTag::Error),
            message,
        }
    }
}
