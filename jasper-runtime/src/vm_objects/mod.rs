//! The heap cell kinds managed by the collector.
//!
//! Every cell starts with a [`Header`](crate::gc::Header) carrying its type
//! tag, the mark bit, and the transient root count. The kind set is closed;
//! the collector dispatches over it without virtual calls.

pub mod array;
pub mod constructor;
pub mod error;
pub mod function;
pub mod record;
pub mod reference;
pub mod string;
pub mod variant;
