use std::mem;
use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// `fun name(params) { body }`, also used for class methods.
///
/// Shared through `Rc` because every function value created from the
/// declaration points back at it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (at most 127).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Token,
    pub methods: Vec<Rc<FunctionDecl>>,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a
/// sequence of these nodes returned by [`crate::parser::Parser::parse`].
///
/// `for` loops have no node of their own: the parser desugars them into
/// `Block` + `While`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    Class(ClassDecl),

    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Function(Rc<FunctionDecl>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    Print(Expr),

    Return {
        /// The `return` keyword token (for runtime error locations).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    /// `"var" IDENT ("=" initializer)? ";"`
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}

/// Double dispatch over [`Stmt`]: one method per variant.
pub trait StmtVisitor<R> {
    fn visit_block(&mut self, statements: &[Stmt]) -> R;
    fn visit_class(&mut self, decl: &ClassDecl) -> R;
    fn visit_expression(&mut self, expr: &Expr) -> R;
    fn visit_function(&mut self, decl: &Rc<FunctionDecl>) -> R;
    fn visit_if(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> R;
    fn visit_print(&mut self, expr: &Expr) -> R;
    fn visit_return(&mut self, keyword: &Token, value: Option<&Expr>) -> R;
    fn visit_var(&mut self, name: &Token, initializer: Option<&Expr>) -> R;
    fn visit_while(&mut self, condition: &Expr, body: &Stmt) -> R;
}

impl Stmt {
    pub fn accept<R, V: StmtVisitor<R> + ?Sized>(&self, visitor: &mut V) -> R {
        match self {
            Stmt::Block(statements) => visitor.visit_block(statements),

            Stmt::Class(decl) => visitor.visit_class(decl),

            Stmt::Expression(expr) => visitor.visit_expression(expr),

            Stmt::Function(decl) => visitor.visit_function(decl),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => visitor.visit_if(condition, then_branch, else_branch.as_deref()),

            Stmt::Print(expr) => visitor.visit_print(expr),

            Stmt::Return { keyword, value } => visitor.visit_return(keyword, value.as_ref()),

            Stmt::Var { name, initializer } => visitor.visit_var(name, initializer.as_ref()),

            Stmt::While { condition, body } => visitor.visit_while(condition, body),
        }
    }
}

impl Stmt {
    fn detach(&mut self) -> Stmt {
        mem::replace(self, Stmt::Block(Vec::new()))
    }

    /// Push every directly nested statement onto `pending`. Function bodies
    /// are only unlinked once no function value shares the declaration.
    fn take_children(&mut self, pending: &mut Vec<Stmt>) {
        match self {
            Stmt::Block(statements) => pending.append(statements),

            Stmt::Class(decl) => {
                for method in &mut decl.methods {
                    if let Some(method) = Rc::get_mut(method) {
                        pending.append(&mut method.body);
                    }
                }
            }

            Stmt::Function(decl) => {
                if let Some(decl) = Rc::get_mut(decl) {
                    pending.append(&mut decl.body);
                }
            }

            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                pending.push(then_branch.detach());
                if let Some(else_branch) = else_branch {
                    pending.push(else_branch.detach());
                }
            }

            Stmt::While { body, .. } => pending.push(body.detach()),

            Stmt::Expression(_) | Stmt::Print(_) | Stmt::Return { .. } | Stmt::Var { .. } => {}
        }
    }
}

/// Nested blocks and `if`/`else` chains are dropped through a worklist
/// rather than recursively; expressions take care of themselves.
impl Drop for Stmt {
    fn drop(&mut self) {
        let mut pending: Vec<Stmt> = Vec::new();
        self.take_children(&mut pending);

        while let Some(mut stmt) = pending.pop() {
            stmt.take_children(&mut pending);
        }
    }
}
