//! The typed Jasper AST, as handed to the runtime by the frontend.
//!
//! Nodes arrive with the layout pass already run: identifiers carry their
//! resolved origin and frame offset, function literals carry their capture
//! lists with outer/inner offsets, and type-level nodes carry stable handles
//! into the resolved [`TypeTable`](crate::types::TypeTable).

use crate::interner::Interned;
use crate::types::{MonoId, TypeFunctionId};
use indexmap::IndexMap;
use std::rc::Rc;

/// Sentinel for a frame offset the layout pass never assigned.
///
/// One of these reaching the evaluator is a fatal internal error (missing
/// layout), never a user-facing one.
pub const UNRESOLVED_OFFSET: i32 = i32::MIN;

/// Where an identifier's binding lives, as resolved by the layout pass.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IdentifierOrigin {
    Global,
    Local,
    Capture,
}

#[derive(Debug, Clone)]
pub struct IdentifierExpr {
    pub name: Interned,
    pub origin: IdentifierOrigin,
    pub frame_offset: i32,
}

/// One captured binding of a function literal.
///
/// `outer_frame_offset` addresses the captured Reference in the frame that
/// builds the closure; `inner_frame_offset` is where the callee expects it.
#[derive(Debug, Clone)]
pub struct Capture {
    pub name: Interned,
    pub outer_frame_offset: i32,
    pub inner_frame_offset: i32,
}

/// A function literal definition. Shared by every closure built from it.
#[derive(Debug)]
pub struct FunctionDef {
    pub params: Vec<Declaration>,
    pub captures: Vec<Capture>,
    pub body: Expr,
}

/// A binding declaration, local or global.
#[derive(Debug)]
pub struct Declaration {
    pub name: Interned,
    pub value: Option<Expr>,
    pub frame_offset: i32,
}

impl Declaration {
    pub fn new(name: Interned, value: Option<Expr>) -> Self {
        Self {
            name,
            value,
            frame_offset: UNRESOLVED_OFFSET,
        }
    }
}

#[derive(Debug)]
pub struct MatchCase {
    /// The binding the matched variant's inner value is rebound to.
    pub binding: Declaration,
    pub body: Expr,
}

#[derive(Debug)]
pub enum Expr {
    IntegerLiteral(i32),
    NumberLiteral(f64),
    StringLiteral(Interned),
    BooleanLiteral(bool),
    NullLiteral,
    ArrayLiteral(Vec<Expr>),
    FunctionLiteral(Rc<FunctionDef>),
    Identifier(IdentifierExpr),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Access {
        target: Box<Expr>,
        member: Interned,
    },
    Match {
        target: Box<Expr>,
        cases: IndexMap<Interned, MatchCase>,
    },
    Construct {
        constructor: Box<Expr>,
        args: Vec<Expr>,
    },
    /// A block in expression position; its value is whatever the block returns.
    Sequence(Block),
    /// A record type expression, usable as a first-class record constructor.
    StructExpr {
        fields: Vec<Interned>,
    },
    /// A variant type expression; evaluates to a record of its constructors.
    UnionExpr {
        constructors: Vec<Interned>,
    },
    TypeTerm {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// A resolved type function; evaluation delegates to the syntax it was made from.
    TypeFunctionHandle {
        id: TypeFunctionId,
        syntax: Box<Expr>,
    },
    /// A resolved mono type; evaluates to the constructor for its type function.
    MonoTypeHandle {
        id: MonoId,
    },
    /// A resolved variant constructor reference, e.g. `Option.Some`.
    Constructor {
        mono: MonoId,
        id: Interned,
    },
}

#[derive(Debug)]
pub enum Stmt {
    Block(Block),
    Declaration(Declaration),
    Return(Expr),
    IfElse {
        condition: Expr,
        body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    /// An expression in statement position; its value is discarded.
    Expr(Expr),
}

#[derive(Debug, Default)]
pub struct Block {
    pub body: Vec<Stmt>,
}

/// A whole program: its global declarations plus the dependency-component
/// order they must be evaluated in.
///
/// Each component is an ordered set of indices into `declarations`; mutually
/// recursive globals share a component. The order is computed by the frontend,
/// never by the runtime.
#[derive(Debug, Default)]
pub struct Program {
    pub declarations: Vec<Declaration>,
    pub declaration_order: Vec<Vec<usize>>,
}
