use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::object::Object;
use crate::token::Token;

/// A lexically nested name→value frame. Frames form a chain toward a root
/// (globals) via `enclosing`; a frame is shared (`Rc<RefCell<_>>`) because
/// closures retain the frame active at their declaration even after that
/// scope's block has exited.
#[derive(Debug)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Object>,
}

impl Environment {
    pub fn new(enclosing: Option<Rc<RefCell<Environment>>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment { enclosing, values: HashMap::new() }))
    }

    /// Creates or overwrites the binding in this frame.
    pub fn define(&mut self, name: &str, value: Object) {
        self.values.insert(name.to_string(), value);
    }

    /// Reads `name`, walking toward globals. Used only for unresolved
    /// (global) access — locals go through `get_at`.
    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }
        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        })
    }

    /// Assigns to the nearest enclosing frame that already binds `name`.
    /// Used only for unresolved (global) assignment.
    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }
        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }
        Err(RuntimeError {
            token: name.clone(),
            message: format!("Undefined variable '{}'.", name.lexeme),
        })
    }

    fn ancestor(&self, distance: usize) -> Rc<RefCell<Environment>> {
        let mut environment = Rc::clone(
            self.enclosing.as_ref().expect("resolved depth outruns the environment chain"),
        );
        for _ in 1..distance {
            let parent = Rc::clone(
                environment
                    .borrow()
                    .enclosing
                    .as_ref()
                    .expect("resolved depth outruns the environment chain"),
            );
            environment = parent;
        }
        environment
    }

    /// Walks exactly `distance` parents and reads `name` directly. The
    /// resolver guarantees the binding exists there; a miss is a bug in the
    /// resolver, not a user-visible error, so this panics rather than
    /// returning a `Result`.
    pub fn get_at(&self, distance: usize, name: &str) -> Object {
        let values = if distance == 0 { None } else { Some(self.ancestor(distance)) };

        match &values {
            Some(env) => env
                .borrow()
                .values
                .get(name)
                .cloned()
                .unwrap_or_else(|| panic!("resolver recorded depth {distance} for undefined '{name}'")),
            None => self
                .values
                .get(name)
                .cloned()
                .unwrap_or_else(|| panic!("resolver recorded depth 0 for undefined '{name}'")),
        }
    }

    pub fn assign_at(&mut self, distance: usize, name: &str, value: Object) {
        if distance == 0 {
            self.values.insert(name.to_string(), value);
        } else {
            self.ancestor(distance).borrow_mut().values.insert(name.to_string(), value);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::Type;

    fn token(name: &str) -> Token {
        Token::new(Type::Identifier, name.to_string(), None, 1)
    }

    #[test]
    fn define_then_get_round_trips() {
        let env = Environment::new(None);
        env.borrow_mut().define("a", Object::Number(1.0));
        assert_eq!(env.borrow().get(&token("a")).unwrap(), Object::Number(1.0));
    }

    #[test]
    fn get_falls_back_to_enclosing() {
        let globals = Environment::new(None);
        globals.borrow_mut().define("a", Object::Number(1.0));
        let local = Environment::new(Some(Rc::clone(&globals)));
        assert_eq!(local.borrow().get(&token("a")).unwrap(), Object::Number(1.0));
    }

    #[test]
    fn assign_without_prior_define_errors() {
        let env = Environment::new(None);
        assert!(env.borrow_mut().assign(&token("missing"), Object::Nil).is_err());
    }

    #[test]
    fn get_at_zero_reads_current_frame() {
        let env = Environment::new(None);
        env.borrow_mut().define("a", Object::Bool(true));
        assert_eq!(env.borrow().get_at(0, "a"), Object::Bool(true));
    }

    #[test]
    fn get_at_walks_exact_distance() {
        let globals = Environment::new(None);
        globals.borrow_mut().define("a", Object::Number(9.0));
        let middle = Environment::new(Some(Rc::clone(&globals)));
        let inner = Environment::new(Some(Rc::clone(&middle)));
        assert_eq!(inner.borrow().get_at(2, "a"), Object::Number(9.0));
    }

    #[test]
    fn assign_at_mutates_the_targeted_frame_only() {
        let globals = Environment::new(None);
        globals.borrow_mut().define("a", Object::Number(1.0));
        let local = Environment::new(Some(Rc::clone(&globals)));
        local.borrow_mut().assign_at(1, "a", Object::Number(2.0));
        assert_eq!(globals.borrow().get_at(0, "a"), Object::Number(2.0));
    }
}
