use std::rc::Rc;

use crate::expr::{Expr, ExprVisitor, LiteralValue};
use crate::stmt::{ClassDecl, FunctionDecl, Stmt, StmtVisitor};
use crate::token::Token;

const RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 1024 * 1024;

/// Converts syntax trees to a parenthesised prefix form, e.g.
/// `(+ 1.0 (group 2.0))` or `(var x (* 2.0 3.0))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        expr.accept(&mut AstPrinter)
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        stmt.accept(&mut AstPrinter)
    }

    fn parenthesize(&mut self, name: &str, exprs: &[&Expr]) -> String {
        let mut s = format!("({}", name);
        for expr in exprs {
            s.push(' ');
            s.push_str(&stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || expr.accept(self)));
        }
        s.push(')');
        s
    }

    fn join_block(&mut self, head: String, statements: &[Stmt]) -> String {
        let mut s = head;
        for stmt in statements {
            s.push(' ');
            s.push_str(&stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || stmt.accept(self)));
        }
        s.push(')');
        s
    }

    fn function(&mut self, keyword: &str, decl: &FunctionDecl) -> String {
        let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
        let head = format!("({} {} ({})", keyword, decl.name.lexeme, params.join(" "));
        self.join_block(head, &decl.body)
    }
}

impl ExprVisitor<String> for AstPrinter {
    fn visit_assign(&mut self, name: &Token, value: &Expr) -> String {
        self.parenthesize(&format!("= {}", name.lexeme), &[value])
    }

    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_call(&mut self, callee: &Expr, _paren: &Token, arguments: &[Expr]) -> String {
        let mut exprs: Vec<&Expr> = vec![callee];
        exprs.extend(arguments.iter());
        self.parenthesize("call", &exprs)
    }

    fn visit_get(&mut self, object: &Expr, name: &Token) -> String {
        format!("(. {} {})", object.accept(self), name.lexeme)
    }

    fn visit_grouping(&mut self, inner: &Expr) -> String {
        self.parenthesize("group", &[inner])
    }

    fn visit_literal(&mut self, value: &LiteralValue) -> String {
        match value {
            LiteralValue::Nil => "nil".into(),

            LiteralValue::Bool(b) => b.to_string(),

            LiteralValue::Str(s) => s.clone(),

            // 3.0 → "3.0", 2.5 → "2.5"
            LiteralValue::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{:.1}", n)
                } else {
                    n.to_string()
                }
            }
        }
    }

    fn visit_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> String {
        format!(
            "(= (. {} {}) {})",
            object.accept(self),
            name.lexeme,
            value.accept(self)
        )
    }

    fn visit_this(&mut self, _keyword: &Token) -> String {
        "this".into()
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[right])
    }

    fn visit_variable(&mut self, name: &Token) -> String {
        name.lexeme.clone()
    }
}

impl StmtVisitor<String> for AstPrinter {
    fn visit_block(&mut self, statements: &[Stmt]) -> String {
        self.join_block("(block".into(), statements)
    }

    fn visit_class(&mut self, decl: &ClassDecl) -> String {
        let mut s = format!("(class {}", decl.name.lexeme);
        for method in &decl.methods {
            s.push(' ');
            s.push_str(&self.function("method", method));
        }
        s.push(')');
        s
    }

    fn visit_expression(&mut self, expr: &Expr) -> String {
        self.parenthesize(";", &[expr])
    }

    fn visit_function(&mut self, decl: &Rc<FunctionDecl>) -> String {
        self.function("fun", decl)
    }

    fn visit_if(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> String {
        let mut s = format!(
            "(if {} {}",
            condition.accept(self),
            then_branch.accept(self)
        );
        if let Some(else_branch) = else_branch {
            s.push(' ');
            s.push_str(&else_branch.accept(self));
        }
        s.push(')');
        s
    }

    fn visit_print(&mut self, expr: &Expr) -> String {
        self.parenthesize("print", &[expr])
    }

    fn visit_return(&mut self, _keyword: &Token, value: Option<&Expr>) -> String {
        match value {
            Some(value) => self.parenthesize("return", &[value]),
            None => "(return)".into(),
        }
    }

    fn visit_var(&mut self, name: &Token, initializer: Option<&Expr>) -> String {
        match initializer {
            Some(init) => self.parenthesize(&format!("var {}", name.lexeme), &[init]),
            None => format!("(var {})", name.lexeme),
        }
    }

    fn visit_while(&mut self, condition: &Expr, body: &Stmt) -> String {
        format!("(while {} {})", condition.accept(self), body.accept(self))
    }
}
