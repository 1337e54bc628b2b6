//! Tree‑walking evaluator.
//!
//! Two mutually recursive walks, [`Interpreter::execute`] over statements
//! and [`Interpreter::evaluate`] over expressions, share one register: the
//! current environment. `return` does not unwind the host stack; statement
//! execution yields a [`Flow`] that every block checks and passes up until
//! the enclosing call consumes it.

use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::expr::{Expr, LiteralValue};
use crate::stmt::{ClassDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{Class, Function, Instance, NativeFunction, Value};

/// Deepest allowed nesting of user calls before `StackOverflow` is raised.
pub const MAX_CALL_DEPTH: usize = 1024;

const RED_ZONE: usize = 128 * 1024;
const STACK_GROWTH: usize = 2 * 1024 * 1024;

/// Outcome of executing a statement.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<W: Write = io::Stdout> {
    globals: EnvRef,
    environment: EnvRef,
    out: W,
    depth: usize,
}

impl Interpreter<io::Stdout> {
    /// An interpreter whose `print` goes to standard output.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Creates a new Interpreter writing to `out` and defines native
    /// functions such as `clock`.
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(std::cell::RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: |_args: &[Value]| {
                    let micros: i64 = chrono::Utc::now().timestamp_micros();
                    Ok(Value::Number(micros as f64 / 1_000_000.0))
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            out,
            depth: 0,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// The outermost scope; persists for the lifetime of the interpreter.
    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Executes a program. A runtime error stops it and leaves the
    /// interpreter back at global scope, ready for the next input.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}

                // the parser rejects top-level `return`; stop quietly if one slips through
                Ok(Flow::Return(_)) => break,

                Err(e) => {
                    debug!("Runtime error: {}", e);
                    self.environment = Rc::clone(&self.globals);
                    self.depth = 0;
                    return Err(e);
                }
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ───────────────────────────── statements ─────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, value.duplicate());
            }

            Stmt::Block(statements) => {
                debug!("Entering block with {} statements", statements.len());
                let scope = Environment::child_of(&self.environment);
                return self.execute_block(statements, scope);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment));
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Class(decl) => self.define_class(decl),

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    /// Runs `statements` inside `scope`, restoring the previous environment
    /// on every exit path (normal completion, `return`, or error).
    pub fn execute_block(&mut self, statements: &[Stmt], scope: EnvRef) -> Result<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, scope);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn define_class(&mut self, decl: &ClassDecl) {
        debug!("Defining class '{}'", decl.name.lexeme);

        let methods: HashMap<String, Rc<Function>> = decl
            .methods
            .iter()
            .map(|method| {
                let function = Function::new(Rc::clone(method), Rc::clone(&self.environment));
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = Class {
            name: decl.name.lexeme.clone(),
            methods,
        };

        self.environment
            .borrow_mut()
            .define(&decl.name.lexeme, Value::Class(Rc::new(class)));
    }

    // ───────────────────────────── expressions ────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Nil => Value::Nil,
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match (operator.token_type, right) {
                    (TokenType::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
                    (TokenType::MINUS, _) => {
                        Err(LoxError::runtime(operator.line, "Operand must be a number."))
                    }
                    (TokenType::BANG, value) => Ok(Value::Bool(!value.is_truthy())),
                    (other, _) => Err(LoxError::runtime(
                        operator.line,
                        format!("Invalid unary operator {:?}.", other),
                    )),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let truthy = left.is_truthy();

                let short_circuit = match operator.token_type {
                    TokenType::OR => truthy,
                    _ => !truthy,
                };

                if short_circuit {
                    Ok(Value::Bool(truthy))
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable(name) => self.look_up(name),

            Expr::This(keyword) => self.environment.borrow().get("this").ok_or_else(|| {
                LoxError::runtime(keyword.line, "Can't use 'this' outside of a class.")
            }),

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;

                let assigned = self
                    .environment
                    .borrow_mut()
                    .assign(&name.lexeme, value.duplicate());

                if !assigned {
                    return Err(LoxError::runtime(
                        name.line,
                        format!("Undefined variable '{}'.", name.lexeme),
                    ));
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(&callee, paren, args)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;
                self.get_property(&object, name)
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.set_field(&name.lexeme, value.duplicate());

                Ok(value)
            }
        }
    }

    fn look_up(&self, name: &Token) -> Result<Value> {
        self.environment
            .borrow()
            .get(&name.lexeme)
            .ok_or_else(|| {
                LoxError::runtime(
                    name.line,
                    format!("Undefined variable '{}'.", name.lexeme),
                )
            })
    }

    /// Fields shadow methods; methods fetched through an instance are bound
    /// to it, methods fetched from the class itself are not.
    fn get_property(&self, object: &Value, name: &Token) -> Result<Value> {
        let found: Option<Value> = match object {
            Value::Instance(instance) => instance.field(&name.lexeme).or_else(|| {
                instance
                    .class
                    .find_method(&name.lexeme)
                    .map(|method| Value::Function(bind(&method, instance)))
            }),

            Value::Class(class) => class.find_method(&name.lexeme).map(Value::Function),

            _ => {
                return Err(LoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                ))
            }
        };

        found.ok_or_else(|| {
            LoxError::runtime(
                name.line,
                format!("Undefined property '{}'.", name.lexeme),
            )
        })
    }

    // ─────────────────────────────── calls ────────────────────────────────

    fn call_value(&mut self, callee: &Value, paren: &Token, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::Function(function) => {
                check_arity(function.arity(), args.len(), paren)?;
                self.call_function(function, args, paren.line)
            }

            Value::NativeFunction(native) => {
                check_arity(native.arity, args.len(), paren)?;
                debug!("Calling native function '{}'", native.name);
                (native.func)(&args).map_err(|message| LoxError::runtime(paren.line, message))
            }

            Value::Class(class) => {
                check_arity(class.arity(), args.len(), paren)?;

                let instance = Rc::new(Instance::new(Rc::clone(class)));
                debug!("Instantiated class '{}'", class.name);

                if let Some(init) = class.find_method("init") {
                    self.call_function(&bind(&init, &instance), args, paren.line)?;
                }

                Ok(Value::Instance(instance))
            }

            other => Err(LoxError::runtime(
                paren.line,
                format!(
                    "Can only call functions and classes, not {}.",
                    other.type_name()
                ),
            )),
        }
    }

    /// One call frame: a fresh scope parented at the closure, holding the
    /// parameters, in which the body runs.
    fn call_function(&mut self, function: &Function, args: Vec<Value>, line: usize) -> Result<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(LoxError::StackOverflow { line });
        }

        debug!("Calling user-defined function '{}'", function.name());

        let frame: EnvRef = Environment::child_of(&function.closure);
        {
            let mut frame = frame.borrow_mut();
            for (param, arg) in function.declaration.params.iter().zip(args) {
                frame.define(&param.lexeme, arg);
            }
        }

        self.depth += 1;
        let result = self.execute_block(&function.declaration.body, frame);
        self.depth -= 1;

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

/// A copy of `method` whose closure additionally binds `this`.
fn bind(method: &Function, instance: &Rc<Instance>) -> Rc<Function> {
    let scope: EnvRef = Environment::child_of(&method.closure);
    scope
        .borrow_mut()
        .define("this", Value::Instance(Rc::clone(instance)));

    Rc::new(Function::new(Rc::clone(&method.declaration), scope))
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> Result<()> {
    if expected != got {
        return Err(LoxError::runtime(
            paren.line,
            format!("Expected {} arguments but got {}.", expected, got),
        ));
    }
    Ok(())
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
    }
}

fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    debug!("Binary {} on {} and {}", operator.lexeme, left, right);

    match operator.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            _ => Err(LoxError::runtime(
                operator.line,
                "Operands must be two numbers or two strings.",
            )),
        },

        TokenType::MINUS => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a - b))
        }

        TokenType::STAR => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a * b))
        }

        TokenType::SLASH => {
            let (a, b) = number_operands(operator, &left, &right)?;
            if b == 0.0 {
                return Err(LoxError::runtime(operator.line, "Division by zero."));
            }
            Ok(Value::Number(a / b))
        }

        TokenType::GREATER => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a > b))
        }

        TokenType::GREATER_EQUAL => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a >= b))
        }

        TokenType::LESS => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a < b))
        }

        TokenType::LESS_EQUAL => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a <= b))
        }

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left.equals(&right))),

        TokenType::BANG_EQUAL => Ok(Value::Bool(!left.equals(&right))),

        other => Err(LoxError::runtime(
            operator.line,
            format!("Invalid binary operator {:?}.", other),
        )),
    }
}
