//! Constructor-based instance checks

use crate::error::{Result, SchematicError};
use crate::value::{Class, Function, Value};

/// Checks that a value was constructed by a class or one of its subclasses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceGuard {
    class: Class,
}

impl InstanceGuard {
    /// Build a guard from a constructor value.
    ///
    /// Fails with [`SchematicError::NotAConstructor`] if the candidate is not
    /// a constructor function.
    pub fn new(candidate: &Value) -> Result<Self> {
        candidate
            .as_function()
            .and_then(Function::as_class)
            .map(Self::for_class)
            .ok_or(SchematicError::NotAConstructor)
    }

    pub fn for_class(class: &Class) -> Self {
        Self {
            class: class.clone(),
        }
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn is(&self, value: &Value) -> bool {
        matches!(value, Value::Instance(instance) if instance.class().is_a(&self.class))
    }
}

impl From<InstanceGuard> for Function {
    fn from(guard: InstanceGuard) -> Self {
        let name = format!("instanceof {}", guard.class.name());
        Function::named(name, move |value| guard.is(value))
    }
}

/// Turn a constructor into a predicate usable as a type in any schema
pub fn is_instance(candidate: &Value) -> Result<Function> {
    InstanceGuard::new(candidate).map(Function::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn non_constructors() -> Vec<Value> {
        vec![
            Value::Null,
            Value::Undefined,
            Value::from(""),
            Value::from(123),
            Value::Bool(true),
            Value::BigInt(123),
            Value::Date(Utc::now()),
            Value::symbol("123"),
            Value::object(Vec::<(String, Value)>::new()),
            Value::array(Vec::<Value>::new()),
            Value::function(|_| true),
        ]
    }

    #[test]
    fn test_rejects_non_constructors() {
        for value in non_constructors() {
            let err = InstanceGuard::new(&value).unwrap_err();
            assert!(matches!(err, SchematicError::NotAConstructor));
            assert_eq!(err.to_string(), "Expected a constructor function");
            assert!(is_instance(&value).is_err());
        }
    }

    #[test]
    fn test_accepts_constructors() {
        let test = Class::new("Test");
        let guard = InstanceGuard::new(&test.constructor()).unwrap();
        assert_eq!(guard.class(), &test);
        assert!(is_instance(&Class::new("Other").constructor()).is_ok());
    }

    #[test]
    fn test_guard_checks_inheritance() {
        let animal = Class::new("Animal");
        let dog = Class::extends("Dog", &animal);
        let guard = InstanceGuard::for_class(&animal);

        assert!(guard.is(&animal.construct()));
        assert!(guard.is(&dog.construct()));
        assert!(!InstanceGuard::for_class(&dog).is(&animal.construct()));
        assert!(!guard.is(&Value::object([("name", "rex")])));
        assert!(!guard.is(&Value::Null));
    }

    #[test]
    fn test_guard_as_predicate() {
        let test = Class::new("Test");
        let predicate = is_instance(&test.constructor()).unwrap();

        assert!(!predicate.is_constructor());
        assert_eq!(predicate.name(), Some("instanceof Test"));
        assert!(predicate.test(&test.construct()));
        assert!(!predicate.test(&Value::Date(Utc::now())));
        assert!(!predicate.test(&Value::from("hello")));
    }
}
