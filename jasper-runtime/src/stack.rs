//! The evaluation stack.
//!
//! One contiguous sequence of values serves as operand stack, local-binding
//! storage and closure-frame storage. Addressing is either relative to the
//! top of stack ([`Stack::access`]) or relative to the active frame base
//! ([`Stack::frame_at`]); frame offsets are computed once by the layout pass
//! and only applied here, never recomputed.

use crate::value::Value;

#[derive(Default)]
pub struct Stack {
    values: Vec<Value>,
    frame_ptr: usize,
    frame_saves: Vec<usize>,
    region_saves: Vec<usize>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Pop the top of stack. The caller must have established non-emptiness;
    /// popping an empty stack is a programming error, not a recoverable fault.
    pub fn pop_unsafe(&mut self) -> Value {
        match self.values.pop() {
            Some(value) => value,
            None => unreachable!("popped an empty stack"),
        }
    }

    /// Read the value `depth` slots below the top of stack.
    pub fn access(&self, depth: usize) -> Value {
        self.values[self.values.len() - 1 - depth]
    }

    /// Mutate a slot in place, without a pop/push round trip.
    pub fn access_mut(&mut self, depth: usize) -> &mut Value {
        let index = self.values.len() - 1 - depth;
        &mut self.values[index]
    }

    /// Read the value at an absolute stack index.
    pub fn at(&self, index: usize) -> Value {
        self.values[index]
    }

    /// Read the slot at the given offset from the active frame base. Negative
    /// offsets address slots below the base (the callee sits at -1).
    pub fn frame_at(&self, offset: i32) -> Value {
        self.values[self.frame_index(offset)]
    }

    pub fn frame_at_mut(&mut self, offset: i32) -> &mut Value {
        let index = self.frame_index(offset);
        &mut self.values[index]
    }

    /// A contiguous run of frame slots, used to hand argument spans to native
    /// functions.
    pub fn frame_slice(&self, offset: usize, count: usize) -> &[Value] {
        let start = self.frame_ptr + offset;
        &self.values[start..start + count]
    }

    fn frame_index(&self, offset: i32) -> usize {
        let index = self.frame_ptr as i64 + offset as i64;
        debug_assert!(index >= 0);
        index as usize
    }

    /// Bracket a lexical block: bindings declared inside the region are
    /// discarded when it ends.
    pub fn start_stack_region(&mut self) {
        self.region_saves.push(self.values.len());
    }

    pub fn end_stack_region(&mut self) {
        match self.region_saves.pop() {
            Some(saved) => self.values.truncate(saved),
            None => unreachable!("ended a stack region that was never started"),
        }
    }

    /// Bracket a call: `base` becomes the frame base for `frame_at` during
    /// callee evaluation. [`Stack::end_stack_frame`] collapses everything from
    /// `base` upward, leaving the call result in the slot just below it.
    pub fn start_stack_frame(&mut self, base: usize) {
        self.frame_saves.push(self.frame_ptr);
        self.frame_ptr = base;
    }

    pub fn end_stack_frame(&mut self) {
        self.values.truncate(self.frame_ptr);
        match self.frame_saves.pop() {
            Some(saved) => self.frame_ptr = saved,
            None => unreachable!("ended a stack frame that was never started"),
        }
    }

    /// Every live slot, bottom to top. This is the stack's contribution to the
    /// collector's root set.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}
