use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::file::FileHandle;
use crate::function::Function;
use crate::modules::Module;

/// Native callable body.  Builtins return their failure as a bare message;
/// the evaluator anchors it to the call-site token.
pub type NativeFn = Box<dyn Fn(&[Value]) -> std::result::Result<Value, String>>;

/// A native function injected by the registry or produced by a builtin
/// method table.  `arity < 0` means variadic; the body checks its own
/// argument count.
pub struct Builtin {
    pub name: String,
    pub arity: isize,
    pub func: NativeFn,
}

impl Builtin {
    pub fn new<F>(name: &str, arity: isize, func: F) -> Value
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + 'static,
    {
        Value::Builtin(Rc::new(Builtin {
            name: name.to_string(),
            arity,
            func: Box::new(func),
        }))
    }
}

/// Runtime value taxonomy.  Compound values are shared handles; cloning a
/// `Value` clones the handle, not the payload.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<HashMap<String, Value>>>),
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
    Builtin(Rc<Builtin>),
    File(Rc<RefCell<FileHandle>>),
    Module(Rc<Module>),
}

impl Value {
    pub fn list(elements: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    pub fn dict(entries: HashMap<String, Value>) -> Value {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    /// Only `nil` and `false` are falsey; every other value, including 0,
    /// "" and empty collections, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Builtin(_) => "builtin",
            Value::File(_) => "file",
            Value::Module(_) => "module",
        }
    }
}

/// Deep-structural equality for compound values; identity for everything
/// that closes over behavior (functions, classes, builtins, files, modules).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,

            (Value::Bool(a), Value::Bool(b)) => a == b,

            (Value::Number(a), Value::Number(b)) => a == b,

            (Value::String(a), Value::String(b)) => a == b,

            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),

            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),

            (Value::Instance(a), Value::Instance(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                Rc::ptr_eq(&a.class, &b.class) && a.fields == b.fields
            }

            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),

            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),

            (Value::File(a), Value::File(b)) => Rc::ptr_eq(a, b),

            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),

            _ => false,
        }
    }
}

/// Compact rendering used by `print`, string concatenation and diagnostics.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::List(elements) => {
                let items: Vec<String> =
                    elements.borrow().iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }

            Value::Dict(entries) => {
                let items: Vec<String> = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{:?}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", items.join(", "))
            }

            Value::Function(func) => write!(f, "<function {}>", func.declaration.name.lexeme),

            Value::Class(class) => write!(f, "<class {}>", class.name),

            Value::Instance(instance) => {
                write!(f, "<instance of {}>", instance.borrow().class.name)
            }

            Value::Builtin(builtin) => write!(f, "<native fn {}>", builtin.name),

            Value::File(handle) => write!(f, "<file {}>", handle.borrow().path().display()),

            Value::Module(module) => write!(f, "<module {}>", module.path.display()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Default stringify hook handed to the interpreter; the REPL or host may
/// plug in a fancier printer with the same signature.
pub fn stringify(value: &Value) -> String {
    value.to_string()
}
