use std::cell::RefCell;
use std::rc::Rc;

use crate::class::Instance;
use crate::environment::Environment;
use crate::error::{Exec, Signal};
use crate::interpreter::Interpreter;
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// A user function: declaration plus the environment it was created in.
/// Methods are plain functions whose closure gains a `self` frame via
/// [`Function::bind`].
#[derive(Clone)]
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Function {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Fresh function whose closure wraps the original with `self` bound to
    /// the instance.  `super` (when present) sits one frame further out, so
    /// the resolver's depth arithmetic holds for method bodies.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));

        environment
            .borrow_mut()
            .define("self", Value::Instance(instance));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    /// Call protocol: parameter frame over the closure, body execution, and
    /// interception of the return signal at this boundary only.  An
    /// initializer always yields the instance bound at `self`, whether or
    /// not an explicit `return` ran.
    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Exec<Value> {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));

        for (param, arg) in self.declaration.params.iter().zip(args) {
            environment.borrow_mut().define(&param.lexeme, arg);
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => {
                if self.is_initializer {
                    self.bound_instance()
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(Signal::Return(value)) => {
                if self.is_initializer {
                    self.bound_instance()
                } else {
                    Ok(value)
                }
            }

            Err(other) => Err(other),
        }
    }

    fn bound_instance(&self) -> Exec<Value> {
        Environment::get_at(&self.closure, 0, "self").ok_or_else(|| {
            Signal::runtime(&self.declaration.name, "Initializer has no bound instance.")
        })
    }
}
