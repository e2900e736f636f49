//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Two closed node families, [`Expr`] and [`Stmt`], consumed by exhaustive
//! `match` in the resolver and the interpreter.  Every expression carries an
//! [`ExprId`] so the resolver can key scope distances on node identity.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Stable identity of one expression node.
///
/// Ids are drawn from a process‑wide counter, so trees parsed at different
/// times (e.g. successive REPL lines) never collide in the locals table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the *terminal leaves* of the expression tree and
/// therefore do **not** retain a reference to the originating [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// One expression node: identity plus shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr<'a> {
    pub id: ExprId,
    pub kind: ExprKind<'a>,
}

impl<'a> Expr<'a> {
    pub fn new(kind: ExprKind<'a>) -> Self {
        Self {
            id: ExprId::fresh(),
            kind,
        }
    }
}

/// Every kind of *expression* in Lox.  Lifetimes `'a` tie nodes that contain
/// token references back to the borrowed token slice held by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind<'a> {
    /// Assignment expression: `identifier "=" expression`
    Assign {
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Function‑ or method‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        callee: Box<Expr<'a>>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: &'a Token<'a>,
        arguments: Vec<Expr<'a>>,
    },

    /// object.property
    Get {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
    },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr<'a>>),

    Literal(LiteralValue),

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>, // `AND` or `OR`
        right: Box<Expr<'a>>,
    },

    /// object.property = value
    Set {
        object: Box<Expr<'a>>,
        name: &'a Token<'a>,
        value: Box<Expr<'a>>,
    },

    /// `super.method`
    Super {
        keyword: &'a Token<'a>,
        method: &'a Token<'a>,
    },

    /// The 'this' keyword inside a method.
    This(&'a Token<'a>),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Variable access ‑ resolves to the identifier’s current value at runtime.
    Variable(&'a Token<'a>),
}

/// A function or method declaration.  Shared by reference between the tree
/// and every runtime function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl<'a> {
    pub name: &'a Token<'a>,
    pub params: Vec<&'a Token<'a>>,
    pub body: Vec<Stmt<'a>>,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
///
/// There is no `for` node: the parser desugars `for` into `Block` + `While`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt<'a>>),

    Class {
        name: &'a Token<'a>,
        /// Always an `ExprKind::Variable` when present.
        superclass: Option<Expr<'a>>,
        methods: Vec<Rc<FunctionDecl<'a>>>,
    },

    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr<'a>),

    Function(Rc<FunctionDecl<'a>>),

    If {
        condition: Expr<'a>,
        then_branch: Box<Stmt<'a>>,
        else_branch: Option<Box<Stmt<'a>>>,
    },

    Print(Expr<'a>),

    Return {
        /// The `return` keyword token (for error locations).
        keyword: &'a Token<'a>,
        /// Absent ⇒ `nil` is returned.
        value: Option<Expr<'a>>,
    },

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: &'a Token<'a>,
        initializer: Option<Expr<'a>>,
    },

    While {
        condition: Expr<'a>,
        body: Box<Stmt<'a>>,
    },
}
