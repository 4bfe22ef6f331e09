use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Exec, Signal};
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// A class: name, optional superclass, and its method templates.  Method
/// lookup walks the inheritance chain; the subclass wins on a name clash.
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Function>,
    ) -> Self {
        Class {
            name,
            superclass,
            methods,
        }
    }

    pub fn find_method(&self, name: &str) -> Option<Function> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// Constructor arity is the initializer's arity, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method("init")
            .map(|init| init.arity())
            .unwrap_or(0)
    }

    /// Calling a class builds an instance with empty fields and runs `init`
    /// bound to it when the class (or an ancestor) declares one.
    pub fn instantiate(
        class: &Rc<Class>,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
    ) -> Exec<Value> {
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(class))));

        if let Some(initializer) = class.find_method("init") {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, args)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// One object: a class pointer and mutable fields.
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property read: fields first, then a method bound to this instance.
    /// Lookup never falls through silently.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Exec<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = instance.borrow().class.find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance)))));
        }

        let class_name = instance.borrow().class.name.clone();

        Err(Signal::runtime(
            name,
            format!(
                "Undefined property '{}' in instance of class '{}'.",
                name.lexeme, class_name
            ),
        ))
    }

    /// Field write.  Methods may not be shadowed by fields.
    pub fn set(instance: &Rc<RefCell<Instance>>, name: &Token, value: Value) -> Exec<()> {
        if instance.borrow().class.find_method(&name.lexeme).is_some() {
            return Err(Signal::runtime(
                name,
                format!("Cannot shadow method '{}' with a field.", name.lexeme),
            ));
        }

        instance
            .borrow_mut()
            .fields
            .insert(name.lexeme.clone(), value);

        Ok(())
    }
}
