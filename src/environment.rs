use crate::value::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

/// A handle to one scope of bindings. Cloning the handle shares the scope.
///
/// Lookups walk outward through the enclosing scopes, but writes always land
/// in this scope, so assigning to an outer name from an inner scope shadows
/// it rather than updating it.
#[derive(Clone, Default)]
pub struct Environment {
    data: Rc<RefCell<Scope>>,
}

#[derive(Default)]
struct Scope {
    values: BTreeMap<String, Value>,
    constants: BTreeSet<String>,
    parent: Option<Environment>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }

    pub fn new_child(&self) -> Environment {
        Environment {
            data: Rc::new(RefCell::new(Scope {
                parent: Some(self.clone()),
                ..Scope::default()
            })),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let data = self.data.borrow();
        match data.values.get(name) {
            Some(value) => Some(value.clone()),
            None => data.parent.as_ref().and_then(|parent| parent.get(name)),
        }
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.data.borrow().values.get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        self.data
            .borrow_mut()
            .values
            .insert(name.to_string(), value);
    }

    pub fn define_constant(&self, name: &str, value: Value) {
        let mut data = self.data.borrow_mut();
        data.values.insert(name.to_string(), value);
        data.constants.insert(name.to_string());
    }

    /// Whether the binding `get` would find is a constant.
    pub fn is_constant(&self, name: &str) -> bool {
        let data = self.data.borrow();
        if data.values.contains_key(name) {
            data.constants.contains(name)
        } else {
            data.parent
                .as_ref()
                .map_or(false, |parent| parent.is_constant(name))
        }
    }

    pub fn delete(&self, name: &str) -> Option<Value> {
        let mut data = self.data.borrow_mut();
        data.constants.remove(name);
        data.values.remove(name)
    }

    pub fn equals(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

// Values can hold functions that capture this environment, so printing the
// bindings could recurse forever. Only the names are shown.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Environment")
            .field("names", &data.values.keys().collect::<Vec<_>>())
            .field("has_parent", &data.parent.is_some())
            .finish()
    }
}
