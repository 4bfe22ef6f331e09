//! Module loading.
//!
//! `import "path" [as alias]` normalizes the path against the current
//! working directory, appends `.nox` when no extension is present, and
//! canonicalizes the result.  A per-interpreter cache keyed by the canonical
//! path makes loading idempotent: the second import of a path yields the
//! identical module object.  Only `export`-annotated bindings are visible to
//! importers.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use log::info;

use crate::builtins;
use crate::environment::Environment;
use crate::error::{Exec, Signal};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// An evaluated module: its top-level environment plus the names `export`
/// marked as public.  Wrapped as a first-class `Value::Module`.
pub struct Module {
    pub path: PathBuf,
    pub env: Rc<RefCell<Environment>>,
    pub exports: Vec<String>,
}

impl Module {
    /// Property access on a module value reads an exported binding.
    pub fn get(module: &Rc<Module>, name: &Token) -> Exec<Value> {
        if module.exports.iter().any(|export| export == &name.lexeme) {
            if let Some(value) = module.env.borrow().get_local(&name.lexeme) {
                return Ok(value);
            }
        }

        Err(Signal::runtime(
            name,
            format!(
                "Module '{}' has no exported member '{}'.",
                module.path.display(),
                name.lexeme
            ),
        ))
    }
}

/// Evaluate one `import` statement in the current scope.
pub fn execute_import(
    interpreter: &mut Interpreter,
    path: &Token,
    alias: Option<&Token>,
) -> Exec<()> {
    let module_value = load(interpreter, path)?;

    match alias {
        // `import "p" as m` binds the module object itself.
        Some(alias) => {
            interpreter
                .environment
                .borrow_mut()
                .define(&alias.lexeme, module_value);
        }

        // Bare `import "p"` copies every exported binding into the
        // importing scope.
        None => {
            if let Value::Module(module) = &module_value {
                for export in &module.exports {
                    if let Some(value) = module.env.borrow().get_local(export) {
                        interpreter.environment.borrow_mut().define(export, value);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Load a module through the cache, evaluating it on a miss.
pub fn load(interpreter: &mut Interpreter, path_token: &Token) -> Exec<Value> {
    let raw_path = match &path_token.token_type {
        TokenType::STRING(path) => path.clone(),
        _ => {
            return Err(Signal::runtime(
                path_token,
                "Module path must be a string literal.",
            ))
        }
    };

    let mut resolved = PathBuf::from(&raw_path);
    if resolved.extension().is_none() {
        resolved.set_extension("nox");
    }

    // Relative paths resolve against the current working directory.
    let canonical = resolved.canonicalize().map_err(|e| {
        Signal::runtime(
            path_token,
            format!("Cannot open module '{}': {}.", raw_path, e),
        )
    })?;

    if let Some(cached) = interpreter.modules.get(&canonical) {
        return Ok(cached.clone());
    }

    info!("Loading module {}", canonical.display());

    let source = fs::read(&canonical).map_err(|e| {
        Signal::runtime(
            path_token,
            format!("Cannot read module '{}': {}.", raw_path, e),
        )
    })?;

    let scanner = Scanner::new(source);
    let mut parser = Parser::with_id_base(scanner, interpreter.next_node_id());
    let statements = parser.parse().map_err(Signal::from)?;
    interpreter.claim_node_ids(parser.next_node_id());

    let mut resolver = Resolver::new(interpreter);
    resolver.resolve(&statements).map_err(Signal::from)?;

    // The module body runs in a brand-new top level: its own globals, its
    // own copy of the builtin registry, no enclosing link.
    let module_env = Rc::new(RefCell::new(Environment::new()));
    builtins::install(&module_env);

    // The module env is a chain root of its own, so unresolved references
    // inside module code land in the module's top level, not the host's.
    let saved_environment =
        std::mem::replace(&mut interpreter.environment, Rc::clone(&module_env));

    let result = statements
        .iter()
        .try_for_each(|stmt| interpreter.execute(stmt));

    interpreter.environment = saved_environment;

    result?;

    let module = Rc::new(Module {
        path: canonical.clone(),
        env: module_env,
        exports: collect_exports(&statements),
    });

    let value = Value::Module(module);

    // Cached only after a successful load; cyclic imports stay undetected.
    interpreter.modules.insert(canonical, value.clone());

    Ok(value)
}

/// Names introduced under `export` at the module's top level.
fn collect_exports(statements: &[Stmt]) -> Vec<String> {
    let mut exports: Vec<String> = Vec::new();

    for statement in statements {
        if let Stmt::Export(declaration) = statement {
            match declaration.as_ref() {
                Stmt::Var { name, .. } => exports.push(name.lexeme.clone()),
                Stmt::Function(decl) => exports.push(decl.name.lexeme.clone()),
                Stmt::Class { name, .. } => exports.push(name.lexeme.clone()),
                _ => {}
            }
        }
    }

    exports
}
