use crate::gc::{Gc, Header};
use crate::value::ValueTag;
use crate::vm_objects::reference::Reference;

/// An ordered sequence of references.
///
/// Elements are `Reference`s rather than raw values, so each element is
/// independently mutable and independently aliasable.
pub struct Array {
    pub header: Header,
    pub elements: Vec<Gc<Reference>>,
}

impl Array {
    pub fn new(elements: Vec<Gc<Reference>>) -> Self {
        Self {
            header: Header::new(ValueTag::Array),
            elements,
        }
    }

    pub fn append(&mut self, element: Gc<Reference>) {
        self.elements.push(element);
    }

    /// Read the reference at the given position. Bounds are the frontend's
    /// responsibility; an out-of-range index here is a defect upstream.
    pub fn at(&self, position: i32) -> Gc<Reference> {
        self.elements[position as usize]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
