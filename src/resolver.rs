//! Static resolution pass for the Nox interpreter.
//!
//! This module performs a single AST walk to:
//! 1. **Build lexical scopes**: maintains a stack of `HashMap<String,bool>`
//!    tracking declared (false) and fully defined (true) names in each nested
//!    block, function, loop or class.
//! 2. **Enforce static rules**: redeclaration in the same scope, reading a
//!    variable in its own initializer, `return` outside functions, `return`
//!    with a value inside an initializer, `self`/`super` outside classes, and
//!    `break`/`continue` outside loops.
//! 3. **Record binding distances**: for every reference node (`Variable`,
//!    `Assign`, `SelfExpr`, `Super`), calls back into the interpreter to note
//!    how many frames up the chain the name lives.  References that match no
//!    scope fall through to the global environment at runtime.
//!
//! Resolution halts on the first static error; there is no recovery.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::error::{NoxError, Result};
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// What kind of function body we are inside; validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class.
    None,

    /// Inside a class declaration _without_ a superclass.
    Class,

    /// Inside a class declaration _with_ a superclass.
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances by calling back into the interpreter.
pub struct Resolver<'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    inside_loop: bool,
}

impl<'interp> Resolver<'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            inside_loop: false,
        }
    }

    /// Walk all top-level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<()> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods)?,

            Stmt::Block(statements) => {
                // 1. Push a new anonymous scope for `{ … }`
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s)?;
                }

                // 2. Pop the block scope
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // 1. Declare the variable name (marked but not yet usable)
                self.declare(name)?;

                // 2. Resolve the initializer expression, if any
                if let Some(expr) = initializer {
                    self.resolve_expr(expr)?;
                }

                // 3. Define the variable so it's available in this scope
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // 1. Declare & define the function name (allow recursion)
                self.declare(&declaration.name)?;
                self.define(&declaration.name);

                // 2. Resolve parameters and body under a function context
                self.resolve_function(declaration, FunctionType::Function)?;
            }

            Stmt::Expression(expr) => {
                self.resolve_expr(expr)?;
            }

            Stmt::Print(expressions) => {
                for expr in expressions {
                    self.resolve_expr(expr)?;
                }
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;

                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch)?;
                }
            }

            Stmt::Return { keyword, value } => {
                // 1. `return` only makes sense inside a function body
                if self.current_function == FunctionType::None {
                    return Err(NoxError::resolve(
                        keyword.line,
                        "Cannot return from top-level code.",
                    ));
                }

                // 2. Initializers may `return`, but never with a value
                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        return Err(NoxError::resolve(
                            keyword.line,
                            "Cannot return a value from an initializer.",
                        ));
                    }

                    self.resolve_expr(value)?;
                }
            }

            Stmt::While { condition, body } => {
                let was_inside = self.inside_loop;
                self.inside_loop = true;

                self.resolve_expr(condition)?;
                self.resolve_stmt(body)?;

                self.inside_loop = was_inside;
            }

            Stmt::ForIn {
                index_var,
                value_var,
                iterable,
                body,
            } => {
                // 1. The iterable is evaluated outside the loop scope
                self.resolve_expr(iterable)?;

                let was_inside = self.inside_loop;
                self.inside_loop = true;

                // 2. Loop variables live in their own scope around the body
                self.begin_scope();

                if let Some(var) = index_var {
                    self.declare(var)?;
                    self.define(var);
                }

                if let Some(var) = value_var {
                    self.declare(var)?;
                    self.define(var);
                }

                self.resolve_stmt(body)?;

                self.end_scope();

                self.inside_loop = was_inside;
            }

            Stmt::Break(keyword) => {
                if !self.inside_loop {
                    return Err(NoxError::resolve(
                        keyword.line,
                        "Can't use 'break' outside of a loop.",
                    ));
                }
            }

            Stmt::Continue(keyword) => {
                if !self.inside_loop {
                    return Err(NoxError::resolve(
                        keyword.line,
                        "Can't use 'continue' outside of a loop.",
                    ));
                }
            }

            Stmt::With {
                resource,
                alias,
                body,
            } => {
                self.resolve_expr(resource)?;

                self.begin_scope();
                self.declare(alias)?;
                self.define(alias);
                self.resolve_stmt(body)?;
                self.end_scope();
            }

            // Imported names are only known at runtime; the loader resolves
            // the module source against its own top level.
            Stmt::Import { .. } => {}

            Stmt::Export(declaration) => {
                self.resolve_stmt(declaration)?;
            }
        }

        Ok(())
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        // 1. Self-inheritance guard (only meaningful for a plain name)
        if let Some(Expr::Variable {
            name: super_name, ..
        }) = superclass
        {
            if super_name.lexeme == name.lexeme {
                return Err(NoxError::resolve(
                    super_name.line,
                    "A class can't inherit from itself.",
                ));
            }
        }

        // 2. Declare & define the class name so methods can refer to it
        self.declare(name)?;
        self.define(name);

        // 3. Save and enter the class context
        let enclosing_class: ClassType = self.current_class;

        self.current_class = if superclass.is_some() {
            ClassType::Subclass
        } else {
            ClassType::Class
        };

        // 4. If there is a superclass, resolve it and open a `super` scope
        if let Some(superclass) = superclass {
            self.resolve_expr(superclass)?;

            self.begin_scope();
            if let Some(scope) = self.scopes.last_mut() {
                scope.insert("super".to_string(), true);
            }
        }

        // 5. Open the implicit `self` scope shared by all methods
        self.begin_scope();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert("self".to_string(), true);
        }

        // 6. Resolve each method in its own function context
        for method in methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            self.resolve_function(method, kind)?;
        }

        // 7. Close the `self` scope
        self.end_scope();

        // 8. If we opened a `super` scope, close it now
        if superclass.is_some() {
            self.end_scope();
        }

        // 9. Restore the outer class context
        self.current_class = enclosing_class;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) | Expr::Safe(inner) => {
                self.resolve_expr(inner)?;
            }

            Expr::Unary(_, right) => {
                self.resolve_expr(right)?;
            }

            Expr::Binary(left, _, right) | Expr::Logical(left, _, right) => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            Expr::Variable { id, name } => {
                // Reading a name that is declared but not yet defined in the
                // current scope means `let x = x;`
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        return Err(NoxError::resolve(
                            name.line,
                            "Cannot read local variable in its own initializer.",
                        ));
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee)?;

                for argument in arguments {
                    self.resolve_expr(argument)?;
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object)?;
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(value)?;
            }

            Expr::Index { object, index, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(index)?;
            }

            Expr::SetIndex {
                object,
                index,
                value,
                ..
            } => {
                self.resolve_expr(object)?;
                self.resolve_expr(index)?;
                self.resolve_expr(value)?;
            }

            Expr::SelfExpr { id, keyword } => {
                if self.current_class == ClassType::None {
                    return Err(NoxError::resolve(
                        keyword.line,
                        "Cannot use 'self' outside of a class.",
                    ));
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        return Err(NoxError::resolve(
                            keyword.line,
                            "Cannot use 'super' outside of a class.",
                        ));
                    }
                    ClassType::Class => {
                        return Err(NoxError::resolve(
                            keyword.line,
                            "Cannot use 'super' in a class with no superclass.",
                        ));
                    }
                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword);
            }

            Expr::List { elements, .. } => {
                for element in elements {
                    self.resolve_expr(element)?;
                }
            }

            Expr::Dict { pairs, .. } => {
                for (key, value) in pairs {
                    self.resolve_expr(key)?;
                    self.resolve_expr(value)?;
                }
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope plumbing
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_function(&mut self, declaration: &FunctionDecl, kind: FunctionType) -> Result<()> {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        // A function body starts outside any loop, even when the
        // declaration sits inside one.
        let was_inside_loop = self.inside_loop;
        self.inside_loop = false;

        self.begin_scope();

        for param in &declaration.params {
            self.declare(param)?;
            self.define(param);
        }

        for stmt in &declaration.body {
            self.resolve_stmt(stmt)?;
        }

        self.end_scope();

        self.inside_loop = was_inside_loop;
        self.current_function = enclosing_function;

        Ok(())
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) -> Result<()> {
        let Some(scope) = self.scopes.last_mut() else {
            // Top level: the runtime definition check owns globals.
            return Ok(());
        };

        if scope.contains_key(&name.lexeme) {
            return Err(NoxError::resolve(
                name.line,
                format!("Variable '{}' already declared in this scope.", name.lexeme),
            ));
        }

        scope.insert(name.lexeme.clone(), false);

        Ok(())
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Walk frames innermost-out; the first hit records its distance on the
    /// node.  No hit means the reference is global (or undefined, which the
    /// runtime reports).
    fn resolve_local(&mut self, node_id: usize, name: &Token) {
        for (hops, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(node_id, hops);
                return;
            }
        }
    }
}
