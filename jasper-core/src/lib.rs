//!
//! This crate contains common types shared between the Jasper frontend, the
//! runtime core and the native code-generation backend.
//!

/// The typed Jasper Abstract Syntax Tree: the common frontend output.
pub mod ast;
/// Opaque handles into the code-generation backend.
pub mod backend;
/// Facilities for string interning.
pub mod interner;
/// Resolved type-function metadata, produced by the type checker.
pub mod types;
