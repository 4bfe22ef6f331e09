use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::slice;

use log::debug;

use crate::builtins;
use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::{Exec, NoxError, Result, Signal};
use crate::expr::Expr;
use crate::file;
use crate::function::Function;
use crate::modules::{self, Module};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{self, Value};

/// The tree-walking evaluator.
///
/// Owns the global frame, the pointer to the current scope, the resolver's
/// node-id → depth map, and the module cache.  Everything it raises travels
/// as a [`Signal`]; only [`Interpreter::interpret`] collapses signals back
/// into plain errors for the run loop.
pub struct Interpreter {
    pub(crate) globals: Rc<RefCell<Environment>>,
    pub(crate) environment: Rc<RefCell<Environment>>,
    pub(crate) locals: HashMap<usize, usize>,
    pub(crate) modules: HashMap<PathBuf, Value>,
    pub(crate) next_node_id: usize,
    stringify: fn(&Value) -> String,
    capture: Option<Rc<RefCell<String>>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        builtins::install(&globals);

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            modules: HashMap::new(),
            next_node_id: 0,
            stringify: value::stringify,
            capture: None,
        }
    }

    /// The script-level global frame; the builtin registry lives here.
    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        Rc::clone(&self.globals)
    }

    /// Swap in a different value printer (the REPL installs its own).
    pub fn set_stringify(&mut self, stringify: fn(&Value) -> String) {
        self.stringify = stringify;
    }

    /// Redirect `print` into a buffer and hand it back; used by tests and
    /// embedders that want the output as data.
    pub fn capture_output(&mut self) -> Rc<RefCell<String>> {
        let buffer = Rc::new(RefCell::new(String::new()));
        self.capture = Some(Rc::clone(&buffer));
        buffer
    }

    /// First unclaimed AST node id.  The runtime threads this through every
    /// parser it creates so ids stay unique across REPL lines and modules.
    pub fn next_node_id(&self) -> usize {
        self.next_node_id
    }

    pub fn claim_node_ids(&mut self, up_to: usize) {
        self.next_node_id = self.next_node_id.max(up_to);
    }

    /// Resolver callback: record the scope distance for one reference node.
    pub fn resolve(&mut self, node_id: usize, depth: usize) {
        debug!("Resolved node {} at depth {}", node_id, depth);
        self.locals.insert(node_id, depth);
    }

    /// Run a resolved program.  Stray signals cannot occur here (the
    /// resolver rejects misplaced `return`/`break`/`continue`), so any
    /// residue collapses into an error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for statement in statements {
            self.execute(statement).map_err(Signal::into_error)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn execute(&mut self, stmt: &Stmt) -> Exec<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expressions) => {
                let mut parts: Vec<String> = Vec::with_capacity(expressions.len());

                for expr in expressions {
                    let value: Value = self.evaluate(expr)?;
                    parts.push((self.stringify)(&value));
                }

                self.write_line(&parts.join(" "));

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.define_checked(name, value)
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body) {
                        Ok(()) => {}
                        Err(Signal::Break) => break,
                        Err(Signal::Continue) => continue,
                        Err(other) => return Err(other),
                    }
                }

                Ok(())
            }

            Stmt::ForIn {
                index_var,
                value_var,
                iterable,
                body,
            } => self.execute_for_in(index_var, value_var, iterable, body),

            Stmt::Function(declaration) => {
                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.define_checked(&declaration.name, Value::Function(Rc::new(function)))
            }

            Stmt::Return { keyword: _, value } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Signal::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),

            Stmt::Break(_) => Err(Signal::Break),

            Stmt::Continue(_) => Err(Signal::Continue),

            Stmt::With {
                resource,
                alias,
                body,
            } => {
                let resource_value: Value = self.evaluate(resource)?;

                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));
                environment
                    .borrow_mut()
                    .define(&alias.lexeme, resource_value.clone());

                let result = self.execute_block(slice::from_ref(body.as_ref()), environment);

                // The close hook runs on every exit path; its own failures
                // are swallowed.
                self.close_resource(&resource_value);

                result
            }

            Stmt::Import { path, alias } => modules::execute_import(self, path, alias.as_ref()),

            Stmt::Export(declaration) => self.execute(declaration),
        }
    }

    /// Runs `statements` in `environment`, restoring the previous scope on
    /// every exit path, error unwind included.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Exec<()> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Exec<()> {
        let superclass_value: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                other => {
                    return Err(Signal::runtime(
                        name,
                        format!("Superclass must be a class, got {}.", other.type_name()),
                    ))
                }
            },
            None => None,
        };

        self.define_checked(name, Value::Nil)?;

        let enclosing: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        // Methods of a subclass close over a hidden frame binding `super`.
        if let Some(class) = &superclass_value {
            let super_env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                &self.environment,
            ))));
            super_env
                .borrow_mut()
                .define("super", Value::Class(Rc::clone(class)));
            self.environment = super_env;
        }

        let mut method_map: HashMap<String, Function> = HashMap::new();

        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            method_map.insert(
                method.name.lexeme.clone(),
                Function::new(Rc::clone(method), Rc::clone(&self.environment), is_initializer),
            );
        }

        let class = Class::new(name.lexeme.clone(), superclass_value, method_map);

        self.environment = enclosing;

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))
            .map_err(Signal::from)
    }

    fn execute_for_in(
        &mut self,
        index_var: &Option<Token>,
        value_var: &Option<Token>,
        iterable: &Expr,
        body: &Stmt,
    ) -> Exec<()> {
        let iterable_value: Value = self.evaluate(iterable)?;

        match iterable_value {
            Value::List(elements) => {
                let snapshot: Vec<Value> = elements.borrow().clone();

                for (index, element) in snapshot.into_iter().enumerate() {
                    let keep_going = self.run_iteration(
                        index_var,
                        value_var,
                        Some(Value::Number(index as f64)),
                        Some(element),
                        body,
                    )?;
                    if !keep_going {
                        break;
                    }
                }

                Ok(())
            }

            Value::Dict(entries) => {
                let snapshot: Vec<(String, Value)> = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();

                for (key, element) in snapshot {
                    let keep_going = self.run_iteration(
                        index_var,
                        value_var,
                        Some(Value::String(key)),
                        Some(element),
                        body,
                    )?;
                    if !keep_going {
                        break;
                    }
                }

                Ok(())
            }

            Value::String(text) => {
                for (position, ch) in text.chars().enumerate() {
                    let keep_going = self.run_iteration(
                        index_var,
                        value_var,
                        Some(Value::Number(position as f64)),
                        Some(Value::String(ch.to_string())),
                        body,
                    )?;
                    if !keep_going {
                        break;
                    }
                }

                Ok(())
            }

            // Bare `for { ... }` desugars to iterating `true`; `false`
            // iterates zero times.
            Value::Bool(condition) => {
                if condition {
                    loop {
                        let keep_going = self.run_iteration(index_var, value_var, None, None, body)?;
                        if !keep_going {
                            break;
                        }
                    }
                }

                Ok(())
            }

            other => {
                let anchor: Token = value_var
                    .clone()
                    .unwrap_or_else(|| Token::synthetic("for"));
                Err(Signal::runtime(
                    &anchor,
                    format!("Object is not iterable: {}.", other.type_name()),
                ))
            }
        }
    }

    /// One loop iteration in a fresh child environment.  Returns false when
    /// the body broke out of the loop.
    fn run_iteration(
        &mut self,
        index_var: &Option<Token>,
        value_var: &Option<Token>,
        index_value: Option<Value>,
        element_value: Option<Value>,
        body: &Stmt,
    ) -> Exec<bool> {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.environment,
        ))));

        if let (Some(var), Some(value)) = (index_var, index_value) {
            environment.borrow_mut().define(&var.lexeme, value);
        }

        if let (Some(var), Some(value)) = (value_var, element_value) {
            environment.borrow_mut().define(&var.lexeme, value);
        }

        match self.execute_block(slice::from_ref(body), environment) {
            Ok(()) => Ok(true),
            Err(Signal::Continue) => Ok(true),
            Err(Signal::Break) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// `with` close hook: file handles close directly, instances get their
    /// zero-argument `close` method when they have one.  Failures and close
    /// results are discarded.
    fn close_resource(&mut self, resource: &Value) {
        match resource {
            Value::File(handle) => {
                let _ = handle.borrow_mut().close();
            }

            Value::Instance(instance) => {
                let close = instance.borrow().class.find_method("close");

                if let Some(close) = close {
                    if close.arity() == 0 {
                        let _ = close.bind(Rc::clone(instance)).call(self, Vec::new());
                    }
                }
            }

            _ => {}
        }
    }

    fn define_checked(&mut self, name: &Token, value: Value) -> Exec<()> {
        if self.environment.borrow().is_defined_locally(&name.lexeme) {
            return Err(Signal::runtime(
                name,
                format!("Variable '{}' already defined in this scope.", name.lexeme),
            ));
        }

        self.environment.borrow_mut().define(&name.lexeme, value);

        Ok(())
    }

    fn write_line(&mut self, text: &str) {
        match &self.capture {
            Some(buffer) => {
                let mut buffer = buffer.borrow_mut();
                buffer.push_str(text);
                buffer.push('\n');
            }
            None => println!("{}", text),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn evaluate(&mut self, expr: &Expr) -> Exec<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary(op, right) => self.evaluate_unary(op, right),

            Expr::Binary(left, op, right) => self.evaluate_binary(left, op, right),

            Expr::Logical(left, op, right) => self.evaluate_logical(left, op, right),

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        if !Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        ) {
                            return Err(Signal::runtime(
                                name,
                                format!("Undefined variable '{}'.", name.lexeme),
                            ));
                        }
                    }
                    None => {
                        Environment::root(&self.environment)
                            .borrow_mut()
                            .assign(name, value.clone())
                            .map_err(Signal::from)?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_value: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee_value, args, paren)
            }

            Expr::Get { object, name } => self.evaluate_get(object, name),

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object_value: Value = self.evaluate(object)?;

                match object_value {
                    Value::Instance(instance) => {
                        let value: Value = self.evaluate(value)?;
                        Instance::set(&instance, name, value.clone())?;
                        Ok(value)
                    }

                    other => Err(Signal::runtime(
                        name,
                        format!("Only instances have fields, got {}.", other.type_name()),
                    )),
                }
            }

            Expr::Index {
                object,
                bracket,
                index,
            } => self.evaluate_index(object, bracket, index),

            Expr::SetIndex {
                object,
                bracket,
                index,
                value,
            } => self.evaluate_set_index(object, bracket, index, value),

            Expr::SelfExpr { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::List { elements, .. } => {
                let mut values: Vec<Value> = Vec::with_capacity(elements.len());

                for element in elements {
                    values.push(self.evaluate(element)?);
                }

                Ok(Value::list(values))
            }

            Expr::Dict { brace, pairs } => {
                let mut entries: HashMap<String, Value> = HashMap::with_capacity(pairs.len());

                for (key_expr, value_expr) in pairs {
                    let key: Value = self.evaluate(key_expr)?;
                    let value: Value = self.evaluate(value_expr)?;

                    match key {
                        Value::String(key) => {
                            entries.insert(key, value);
                        }
                        other => {
                            return Err(Signal::runtime(
                                brace,
                                format!(
                                    "Dictionary keys must be strings, got {}.",
                                    other.type_name()
                                ),
                            ))
                        }
                    }
                }

                Ok(Value::dict(entries))
            }

            // Runtime errors inside the operand collapse to nil; signals
            // and non-runtime failures keep unwinding.
            Expr::Safe(inner) => match self.evaluate(inner) {
                Err(Signal::Error(NoxError::Runtime { .. })) => Ok(Value::Nil),
                other => other,
            },
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Exec<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(Signal::runtime(token, "Invalid literal.")),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, right: &Expr) -> Exec<Value> {
        let value: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                other => Err(Signal::runtime(
                    op,
                    format!("Operand must be a number, got {}.", other.type_name()),
                )),
            },

            TokenType::BANG | TokenType::NOT => Ok(Value::Bool(!value.is_truthy())),

            _ => Err(Signal::runtime(op, "Invalid unary operator.")),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> Exec<Value> {
        let left_value: Value = self.evaluate(left)?;

        match op.token_type {
            TokenType::OR => {
                if left_value.is_truthy() {
                    return Ok(left_value);
                }
            }

            TokenType::AND => {
                if !left_value.is_truthy() {
                    return Ok(left_value);
                }
            }

            _ => return Err(Signal::runtime(op, "Invalid logical operator.")),
        }

        self.evaluate(right)
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Exec<Value> {
        let left_value: Value = self.evaluate(left)?;
        let right_value: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::PLUS => match (&left_value, &right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                // Either side being a string turns `+` into concatenation of
                // the stringified operands.
                (l, r) if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) => {
                    Ok(Value::String(format!(
                        "{}{}",
                        (self.stringify)(l),
                        (self.stringify)(r)
                    )))
                }

                (l, r) => Err(Signal::runtime(
                    op,
                    format!(
                        "Operands must be two numbers or two strings, got {} and {}.",
                        l.type_name(),
                        r.type_name()
                    ),
                )),
            },

            TokenType::MINUS => {
                let (a, b) = self.number_operands(op, &left_value, &right_value)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = self.number_operands(op, &left_value, &right_value)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = self.number_operands(op, &left_value, &right_value)?;

                if b == 0.0 {
                    return Err(Signal::runtime(op, "Division by zero."));
                }

                Ok(Value::Number(a / b))
            }

            // Integer remainder: both operands truncate toward zero.
            TokenType::PERCENT => {
                let (a, b) = self.number_operands(op, &left_value, &right_value)?;

                if b == 0.0 {
                    return Err(Signal::runtime(op, "Division by zero."));
                }

                Ok(Value::Number(((a as i64) % (b as i64)) as f64))
            }

            TokenType::DOUBLE_STAR => {
                let (a, b) = self.number_operands(op, &left_value, &right_value)?;

                if b < 0.0 {
                    return Err(Signal::runtime(op, "Exponent must be a non-negative number."));
                }

                if a == 0.0 && b == 0.0 {
                    return Err(Signal::runtime(op, "0 raised to the power of 0 is undefined."));
                }

                Ok(Value::Number(a.powf(b)))
            }

            TokenType::GREATER => {
                let (a, b) = self.number_operands(op, &left_value, &right_value)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = self.number_operands(op, &left_value, &right_value)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = self.number_operands(op, &left_value, &right_value)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = self.number_operands(op, &left_value, &right_value)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_value == right_value)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_value != right_value)),

            _ => Err(Signal::runtime(op, "Invalid binary operator.")),
        }
    }

    fn number_operands(&self, op: &Token, left: &Value, right: &Value) -> Exec<(f64, f64)> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),

            (Value::Number(_), other) => Err(Signal::runtime(
                op,
                format!("Right operand must be a number, got {}.", other.type_name()),
            )),

            (other, _) => Err(Signal::runtime(
                op,
                format!("Left operand must be a number, got {}.", other.type_name()),
            )),
        }
    }

    /// Resolved references jump exactly `distance` frames; everything else
    /// falls through to the top level the running code descends from (the
    /// script globals, or the defining module's own top level).
    fn look_up_variable(&mut self, name: &Token, node_id: usize) -> Exec<Value> {
        match self.locals.get(&node_id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme)
                .ok_or_else(|| {
                    Signal::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
                }),

            None => Environment::root(&self.environment)
                .borrow()
                .get(name)
                .map_err(Signal::from),
        }
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>, paren: &Token) -> Exec<Value> {
        match callee {
            Value::Function(function) => {
                if args.len() != function.arity() {
                    return Err(Signal::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            function.arity(),
                            args.len()
                        ),
                    ));
                }

                function.call(self, args)
            }

            Value::Class(class) => {
                if args.len() != class.arity() {
                    return Err(Signal::runtime(
                        paren,
                        format!("Expected {} arguments but got {}.", class.arity(), args.len()),
                    ));
                }

                Class::instantiate(&class, self, args)
            }

            Value::Builtin(builtin) => {
                if builtin.arity >= 0 && args.len() != builtin.arity as usize {
                    return Err(Signal::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            builtin.arity,
                            args.len()
                        ),
                    ));
                }

                (builtin.func)(&args).map_err(|message| Signal::runtime(paren, message))
            }

            Value::Nil => Err(Signal::runtime(paren, "Attempt to call nil.")),

            other => Err(Signal::runtime(
                paren,
                format!(
                    "Can only call functions and classes, got {}.",
                    other.type_name()
                ),
            )),
        }
    }

    fn evaluate_get(&mut self, object: &Expr, name: &Token) -> Exec<Value> {
        let object_value: Value = self.evaluate(object)?;

        match object_value {
            Value::Instance(instance) => Instance::get(&instance, name),

            Value::List(elements) => builtins::list_method(&elements, &name.lexeme)
                .ok_or_else(|| undefined_property(name, "list")),

            Value::Dict(entries) => builtins::dict_method(&entries, &name.lexeme)
                .ok_or_else(|| undefined_property(name, "dict")),

            Value::String(text) => builtins::string_method(&text, &name.lexeme)
                .ok_or_else(|| undefined_property(name, "string")),

            Value::File(handle) => file::method(&handle, &name.lexeme)
                .ok_or_else(|| undefined_property(name, "file")),

            Value::Module(module) => Module::get(&module, name),

            other => Err(Signal::runtime(
                name,
                format!(
                    "Only instances, collections, files and modules have properties, got {}.",
                    other.type_name()
                ),
            )),
        }
    }

    fn evaluate_index(&mut self, object: &Expr, bracket: &Token, index: &Expr) -> Exec<Value> {
        let object_value: Value = self.evaluate(object)?;
        let index_value: Value = self.evaluate(index)?;

        match object_value {
            Value::List(elements) => {
                let position = self.list_index(bracket, &elements.borrow(), &index_value)?;
                Ok(elements.borrow()[position].clone())
            }

            Value::Dict(entries) => match index_value {
                Value::String(key) => match entries.borrow().get(&key) {
                    Some(value) => Ok(value.clone()),
                    None => Err(Signal::runtime(
                        bracket,
                        format!("Key '{}' not found in dictionary.", key),
                    )),
                },

                other => Err(Signal::runtime(
                    bracket,
                    format!("Dictionary keys must be strings, got {}.", other.type_name()),
                )),
            },

            other => Err(Signal::runtime(
                bracket,
                format!(
                    "Only lists and dictionaries support indexing, got {}.",
                    other.type_name()
                ),
            )),
        }
    }

    fn evaluate_set_index(
        &mut self,
        object: &Expr,
        bracket: &Token,
        index: &Expr,
        value: &Expr,
    ) -> Exec<Value> {
        let object_value: Value = self.evaluate(object)?;
        let index_value: Value = self.evaluate(index)?;
        let value: Value = self.evaluate(value)?;

        match object_value {
            Value::List(elements) => {
                let position = self.list_index(bracket, &elements.borrow(), &index_value)?;
                elements.borrow_mut()[position] = value.clone();
                Ok(value)
            }

            Value::Dict(entries) => match index_value {
                Value::String(key) => {
                    entries.borrow_mut().insert(key, value.clone());
                    Ok(value)
                }

                other => Err(Signal::runtime(
                    bracket,
                    format!("Dictionary keys must be strings, got {}.", other.type_name()),
                )),
            },

            other => Err(Signal::runtime(
                bracket,
                format!(
                    "Only lists and dictionaries support indexing, got {}.",
                    other.type_name()
                ),
            )),
        }
    }

    fn list_index(&self, bracket: &Token, elements: &[Value], index: &Value) -> Exec<usize> {
        let number = match index {
            Value::Number(n) => *n,
            other => {
                return Err(Signal::runtime(
                    bracket,
                    format!("List index must be a number, got {}.", other.type_name()),
                ))
            }
        };

        let position = number as i64;

        if position < 0 || position as usize >= elements.len() {
            return Err(Signal::runtime(
                bracket,
                format!("List index out of range: {}.", position),
            ));
        }

        Ok(position as usize)
    }

    /// `super.method`: the superclass sits at the recorded depth, the
    /// receiver one frame below it.  The method is looked up starting at the
    /// superclass and bound to the current instance.
    fn evaluate_super(&mut self, node_id: usize, keyword: &Token, method: &Token) -> Exec<Value> {
        let distance: usize = match self.locals.get(&node_id) {
            Some(&distance) => distance,
            None => return Err(Signal::runtime(keyword, "Unresolved 'super' reference.")),
        };

        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Some(Value::Class(class)) => class,
            _ => return Err(Signal::runtime(keyword, "Invalid superclass.")),
        };

        let instance = match Environment::get_at(&self.environment, distance.saturating_sub(1), "self") {
            Some(Value::Instance(instance)) => instance,
            _ => return Err(Signal::runtime(keyword, "Invalid instance for 'super'.")),
        };

        let bound = superclass
            .find_method(&method.lexeme)
            .ok_or_else(|| {
                Signal::runtime(
                    method,
                    format!("Undefined property '{}'.", method.lexeme),
                )
            })?
            .bind(instance);

        Ok(Value::Function(Rc::new(bound)))
    }
}

fn undefined_property(name: &Token, kind: &str) -> Signal {
    Signal::runtime(
        name,
        format!("Undefined property '{}' for {} value.", name.lexeme, kind),
    )
}
