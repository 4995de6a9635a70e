//! The mark-and-sweep heap.
//!
//! The heap is the sole owner of every cell; the stack, global scope and the
//! cells themselves hold non-owning [`Gc`] pointers into it. A cell's lifetime
//! ends only when a collection proves it unreachable from the root set: the
//! stack, the global scope, and cells whose transient root count is non-zero
//! (freshly allocated cells still being linked into a durable structure, kept
//! alive by a scoped [`Rooted`] guard).

use crate::value::{Value, ValueTag};
use crate::vm_objects::array::Array;
use crate::vm_objects::constructor::{RecordConstructor, VariantConstructor};
use crate::vm_objects::error::RuntimeError;
use crate::vm_objects::function::Function;
use crate::vm_objects::record::Record;
use crate::vm_objects::reference::Reference;
use crate::vm_objects::string::Str;
use crate::vm_objects::variant::Variant;
use log::debug;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// Collect once the live-cell count reaches this, before the first pass has
/// established a measured threshold.
pub const INITIAL_GC_THRESHOLD: usize = 64;

/// The bookkeeping prefix of every heap cell: the type tag (set at
/// construction, immutable), the mark bit used only during collection, and
/// the transient root count.
pub struct Header {
    tag: ValueTag,
    marked: bool,
    transient_roots: u32,
}

impl Header {
    pub fn new(tag: ValueTag) -> Self {
        Self {
            tag,
            marked: false,
            transient_roots: 0,
        }
    }

    pub fn tag(&self) -> ValueTag {
        self.tag
    }
}

/// A non-owning pointer to a heap cell.
///
/// Valid only while the cell remains reachable across collections; the
/// evaluator's rooting discipline is what upholds that.
pub struct Gc<T> {
    ptr: *mut T,
    _phantom: PhantomData<T>,
}

impl<T> Clone for Gc<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Gc<T> {}

impl<T> PartialEq for Gc<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for Gc<T> {}

impl<T> std::fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Gc({:p})", self.ptr)
    }
}

impl<T> Gc<T> {
    pub(crate) fn from_ptr(ptr: *mut T) -> Self {
        debug_assert!(!ptr.is_null());
        Self {
            ptr,
            _phantom: PhantomData,
        }
    }

    /// Turn the GC pointer back into the cell itself.
    pub fn to_obj(&self) -> &mut T {
        debug_assert!(!self.ptr.is_null());
        unsafe { &mut *self.ptr }
    }

    pub fn as_ptr(&self) -> *mut T {
        self.ptr
    }
}

impl<T> Deref for Gc<T> {
    type Target = T;

    fn deref(&self) -> &T {
        debug_assert!(!self.ptr.is_null());
        unsafe { &*self.ptr }
    }
}

/// A heap cell kind. Implemented by the closed set of cell structs, each of
/// which stores a [`Header`] as its first field.
pub trait HeapCell {
    const TAG: ValueTag;

    fn header(&self) -> &Header;
    fn header_mut(&mut self) -> &mut Header;
}

/// The owning side of the heap: one variant per cell kind, no virtual
/// dispatch.
pub enum OwnedCell {
    String(Box<Str>),
    Array(Box<Array>),
    Record(Box<Record>),
    Variant(Box<Variant>),
    Function(Box<Function>),
    Reference(Box<Reference>),
    RecordConstructor(Box<RecordConstructor>),
    VariantConstructor(Box<VariantConstructor>),
    Error(Box<RuntimeError>),
}

impl OwnedCell {
    fn header_mut(&mut self) -> &mut Header {
        match self {
            OwnedCell::String(cell) => cell.header_mut(),
            OwnedCell::Array(cell) => cell.header_mut(),
            OwnedCell::Record(cell) => cell.header_mut(),
            OwnedCell::Variant(cell) => cell.header_mut(),
            OwnedCell::Function(cell) => cell.header_mut(),
            OwnedCell::Reference(cell) => cell.header_mut(),
            OwnedCell::RecordConstructor(cell) => cell.header_mut(),
            OwnedCell::VariantConstructor(cell) => cell.header_mut(),
            OwnedCell::Error(cell) => cell.header_mut(),
        }
    }

    /// The cell as a heap-tagged value, for rooting it during the mark phase.
    fn as_value(&mut self) -> Value {
        match self {
            OwnedCell::String(cell) => Value::String(Gc::from_ptr(&mut **cell)),
            OwnedCell::Array(cell) => Value::Array(Gc::from_ptr(&mut **cell)),
            OwnedCell::Record(cell) => Value::Record(Gc::from_ptr(&mut **cell)),
            OwnedCell::Variant(cell) => Value::Variant(Gc::from_ptr(&mut **cell)),
            OwnedCell::Function(cell) => Value::Function(Gc::from_ptr(&mut **cell)),
            OwnedCell::Reference(cell) => Value::Reference(Gc::from_ptr(&mut **cell)),
            OwnedCell::RecordConstructor(cell) => Value::RecordConstructor(Gc::from_ptr(&mut **cell)),
            OwnedCell::VariantConstructor(cell) => Value::VariantConstructor(Gc::from_ptr(&mut **cell)),
            OwnedCell::Error(cell) => Value::Error(Gc::from_ptr(&mut **cell)),
        }
    }
}

macro_rules! impl_heap_cell {
    ($ty:ty, $variant:ident) => {
        impl HeapCell for $ty {
            const TAG: ValueTag = ValueTag::$variant;

            fn header(&self) -> &Header {
                &self.header
            }

            fn header_mut(&mut self) -> &mut Header {
                &mut self.header
            }
        }

        impl From<Box<$ty>> for OwnedCell {
            fn from(cell: Box<$ty>) -> Self {
                OwnedCell::$variant(cell)
            }
        }

        impl From<Gc<$ty>> for Value {
            fn from(cell: Gc<$ty>) -> Self {
                Value::$variant(cell)
            }
        }
    };
}

impl_heap_cell!(Str, String);
impl_heap_cell!(Array, Array);
impl_heap_cell!(Record, Record);
impl_heap_cell!(Variant, Variant);
impl_heap_cell!(Function, Function);
impl_heap_cell!(Reference, Reference);
impl_heap_cell!(RecordConstructor, RecordConstructor);
impl_heap_cell!(VariantConstructor, VariantConstructor);
impl_heap_cell!(RuntimeError, Error);

/// A scoped guard keeping a freshly allocated cell alive until it is linked
/// into the stack, the global scope, or another reachable cell.
///
/// Every allocation returns one. The transient root count is incremented on
/// construction and decremented on drop, so the cell is protected on every
/// exit path while further allocations might trigger a collection.
pub struct Rooted<T: HeapCell> {
    gc: Gc<T>,
}

impl<T: HeapCell> Rooted<T> {
    pub(crate) fn new(gc: Gc<T>) -> Self {
        gc.to_obj().header_mut().transient_roots += 1;
        Self { gc }
    }

    pub fn as_gc(&self) -> Gc<T> {
        self.gc
    }

    pub fn as_value(&self) -> Value
    where
        Gc<T>: Into<Value>,
    {
        self.gc.into()
    }
}

impl<T: HeapCell> Deref for Rooted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.gc.to_obj()
    }
}

impl<T: HeapCell> DerefMut for Rooted<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.gc.to_obj()
    }
}

impl<T: HeapCell> Drop for Rooted<T> {
    fn drop(&mut self) {
        let header = self.gc.to_obj().header_mut();
        debug_assert!(header.transient_roots > 0);
        header.transient_roots -= 1;
    }
}

/// The heap manager: allocates cells and reclaims the unreachable ones.
pub struct Heap {
    cells: Vec<OwnedCell>,
    threshold: usize,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            threshold: INITIAL_GC_THRESHOLD,
        }
    }

    /// Allocate a cell, returning a transiently rooted handle to it.
    pub fn alloc<T>(&mut self, cell: T) -> Rooted<T>
    where
        T: HeapCell,
        OwnedCell: From<Box<T>>,
    {
        debug_assert_eq!(cell.header().tag(), T::TAG);
        let mut boxed = Box::new(cell);
        let ptr: *mut T = &mut *boxed;
        self.cells.push(OwnedCell::from(boxed));
        Rooted::new(Gc::from_ptr(ptr))
    }

    /// Whether the heap has grown past the threshold set by the last pass.
    pub fn should_collect(&self) -> bool {
        self.cells.len() >= self.threshold
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Run one mark-and-sweep pass over the given roots.
    ///
    /// Transiently rooted cells are added to the root set internally. The
    /// caller supplies everything else: stack values and global references.
    pub fn collect(&mut self, roots: impl Iterator<Item = Value>) {
        let mut worklist: Vec<Value> = roots.collect();
        for cell in &mut self.cells {
            let rooted = cell.header_mut().transient_roots > 0;
            if rooted {
                worklist.push(cell.as_value());
            }
        }

        while let Some(value) = worklist.pop() {
            mark(value, &mut worklist);
        }

        let before = self.cells.len();
        self.cells.retain_mut(|cell| {
            let header = cell.header_mut();
            if header.marked {
                header.marked = false;
                true
            } else {
                false
            }
        });

        let live = self.cells.len();
        self.threshold = usize::max(INITIAL_GC_THRESHOLD, live * 2);
        debug!("gc pass: {} live, {} swept, next threshold {}", live, before - live, self.threshold);
    }
}

/// Mark one value's cell and queue its outgoing edges.
fn mark(value: Value, worklist: &mut Vec<Value>) {
    match value {
        Value::Null | Value::Boolean(_) | Value::Integer(_) | Value::Float(_) | Value::NativeFunction(_) | Value::BackendHandle(_) => {}
        Value::String(cell) => {
            visit(cell.to_obj().header_mut());
        }
        Value::Error(cell) => {
            visit(cell.to_obj().header_mut());
        }
        Value::RecordConstructor(cell) => {
            visit(cell.to_obj().header_mut());
        }
        Value::VariantConstructor(cell) => {
            visit(cell.to_obj().header_mut());
        }
        Value::Reference(cell) => {
            let reference = cell.to_obj();
            if visit(reference.header_mut()) {
                worklist.push(reference.value);
            }
        }
        Value::Array(cell) => {
            let array = cell.to_obj();
            if visit(array.header_mut()) {
                for element in &array.elements {
                    worklist.push(Value::Reference(*element));
                }
            }
        }
        Value::Record(cell) => {
            let record = cell.to_obj();
            if visit(record.header_mut()) {
                for field in record.fields.values() {
                    worklist.push(*field);
                }
            }
        }
        Value::Variant(cell) => {
            let variant = cell.to_obj();
            if visit(variant.header_mut()) {
                worklist.push(variant.inner_value);
            }
        }
        Value::Function(cell) => {
            let function = cell.to_obj();
            if visit(function.header_mut()) {
                for capture in &function.captures {
                    worklist.push(Value::Reference(*capture));
                }
            }
        }
    }
}

/// Set the mark bit; returns false if the cell was already visited.
fn visit(header: &mut Header) -> bool {
    if header.marked {
        false
    } else {
        header.marked = true;
        true
    }
}
