//!
//! The Jasper runtime core: a typed-AST evaluator over a garbage-collected
//! heap and a frame-addressed evaluation stack.
//!
//! The frontend hands this crate a typed AST with layout already resolved
//! (identifier origins, frame offsets, capture lists, type-function
//! metadata); the finished global scope and values are what the native
//! code-generation backend consumes.

/// The central evaluator state: stack, heap, global scope.
pub mod compiler;
/// Facilities for evaluating AST nodes.
pub mod eval;
/// The mark-and-sweep heap and GC handles.
pub mod gc;
/// Definitions for the built-in native functions.
pub mod primitives;
/// The frame-addressed evaluation stack.
pub mod stack;
/// Facilities for manipulating values.
pub mod value;
/// The heap cell kinds.
pub mod vm_objects;
