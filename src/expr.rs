use std::mem;

use crate::token::Token;

/// A **literal constant** that appears directly in the source code.
///
/// The parser copies the value out of the token so the tree does not need
/// to keep the literal token itself.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// The `nil` literal.
    Nil,

    /// `true` / `false`.
    Bool(bool),

    /// Numeric literal, always an IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),
}

/// **Abstract‑Syntax‑Tree node** for every kind of *expression*.
///
/// Each node owns its children exclusively; the tree is immutable once the
/// parser has produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Assignment expression: `identifier "=" expression`
    Assign { name: Token, value: Box<Expr> },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        /// Operator token such as `+`, `*`, `==`, …
        operator: Token,
        right: Box<Expr>,
    },

    /// Function‑ or class‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get { object: Box<Expr>, name: Token },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This(Token),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary { operator: Token, right: Box<Expr> },

    /// Variable access, resolved dynamically at runtime.
    Variable(Token),
}

/// Double dispatch over [`Expr`]: one method per variant.
pub trait ExprVisitor<R> {
    fn visit_assign(&mut self, name: &Token, value: &Expr) -> R;
    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> R;
    fn visit_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> R;
    fn visit_get(&mut self, object: &Expr, name: &Token) -> R;
    fn visit_grouping(&mut self, inner: &Expr) -> R;
    fn visit_literal(&mut self, value: &LiteralValue) -> R;
    fn visit_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> R;
    fn visit_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> R;
    fn visit_this(&mut self, keyword: &Token) -> R;
    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> R;
    fn visit_variable(&mut self, name: &Token) -> R;
}

impl Expr {
    pub fn accept<R, V: ExprVisitor<R> + ?Sized>(&self, visitor: &mut V) -> R {
        match self {
            Expr::Assign { name, value } => visitor.visit_assign(name, value),

            Expr::Binary {
                left,
                operator,
                right,
            } => visitor.visit_binary(left, operator, right),

            Expr::Call {
                callee,
                paren,
                arguments,
            } => visitor.visit_call(callee, paren, arguments),

            Expr::Get { object, name } => visitor.visit_get(object, name),

            Expr::Grouping(inner) => visitor.visit_grouping(inner),

            Expr::Literal(value) => visitor.visit_literal(value),

            Expr::Logical {
                left,
                operator,
                right,
            } => visitor.visit_logical(left, operator, right),

            Expr::Set {
                object,
                name,
                value,
            } => visitor.visit_set(object, name, value),

            Expr::This(keyword) => visitor.visit_this(keyword),

            Expr::Unary { operator, right } => visitor.visit_unary(operator, right),

            Expr::Variable(name) => visitor.visit_variable(name),
        }
    }

    /// Move this node out, leaving a `nil` literal behind.
    pub fn detach(&mut self) -> Expr {
        mem::replace(self, Expr::Literal(LiteralValue::Nil))
    }

    /// Push every direct child onto `pending`, leaving leaves in its place.
    fn take_children(&mut self, pending: &mut Vec<Expr>) {
        match self {
            Expr::Assign { value, .. } => pending.push(value.detach()),

            Expr::Binary { left, right, .. }
            | Expr::Logical { left, right, .. } => {
                pending.push(left.detach());
                pending.push(right.detach());
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                pending.push(callee.detach());
                pending.append(arguments);
            }

            Expr::Get { object, .. } => pending.push(object.detach()),

            Expr::Grouping(inner) => pending.push(inner.detach()),

            Expr::Set { object, value, .. } => {
                pending.push(object.detach());
                pending.push(value.detach());
            }

            Expr::Unary { right, .. } => pending.push(right.detach()),

            Expr::Literal(_) | Expr::This(_) | Expr::Variable(_) => {}
        }
    }
}

/// Operator chains can nest hundreds of thousands of nodes deep. Children
/// are unlinked onto a worklist so dropping a tree never recurses.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending: Vec<Expr> = Vec::new();
        self.take_children(&mut pending);

        while let Some(mut expr) = pending.pop() {
            expr.take_children(&mut pending);
        }
    }
}
