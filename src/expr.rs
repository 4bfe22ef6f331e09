use crate::token::Token;

/// Expression nodes.
///
/// Every node that names a variable (`Variable`, `Assign`, `SelfExpr`,
/// `Super`) carries a parse-time `id`.  The resolver keys its scope-distance
/// map on these ids, so they must be unique across everything a single
/// interpreter will ever evaluate; the parser hands out ids from a base the
/// runtime advances between source units.
#[derive(Debug)]
pub enum Expr {
    // Literal token: NUMBER, STRING, TRUE, FALSE or NIL.
    Literal(Token),

    // Parenthesized grouping.
    Grouping(Box<Expr>),

    // Prefix operator application: '!', '-', 'not'.
    Unary(Token, Box<Expr>),

    // Arithmetic / comparison / equality operators.
    Binary(Box<Expr>, Token, Box<Expr>),

    // Short-circuiting 'and' / 'or'.
    Logical(Box<Expr>, Token, Box<Expr>),

    // Variable read.
    Variable {
        id: usize,
        name: Token,
    },

    // Variable assignment.
    Assign {
        id: usize,
        name: Token,
        value: Box<Expr>,
    },

    // Call with the closing parenthesis kept for diagnostics.
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    // Property read: object.name
    Get {
        object: Box<Expr>,
        name: Token,
    },

    // Property write: object.name = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    // Subscript read: object[index]
    Index {
        object: Box<Expr>,
        bracket: Token,
        index: Box<Expr>,
    },

    // Subscript write: object[index] = value
    SetIndex {
        object: Box<Expr>,
        bracket: Token,
        index: Box<Expr>,
        value: Box<Expr>,
    },

    // The 'self' keyword inside a method body.
    SelfExpr {
        id: usize,
        keyword: Token,
    },

    // super.method inside a subclass method body.
    Super {
        id: usize,
        keyword: Token,
        method: Token,
    },

    // List literal: [e, ...]
    List {
        bracket: Token,
        elements: Vec<Expr>,
    },

    // Dict literal: { key: value, ... }
    Dict {
        brace: Token,
        pairs: Vec<(Expr, Expr)>,
    },

    // Safe expression: ?expr yields nil instead of raising.
    Safe(Box<Expr>),
}
