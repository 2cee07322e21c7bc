//! Dynamic runtime values
//!
//! Schemas describe the shape of arbitrary values, so the crate carries its
//! own value model instead of relying on a data-only format such as JSON:
//! besides the JSON data types it knows about `undefined`, big integers,
//! symbols, dates, callable predicates, constructors and the instances they
//! build, and compiled [`Schematic`]s.
//!
//! Children are shared behind `Arc`, so cloning a value is cheap and object
//! identity (the `Arc` pointer) is stable for as long as the value lives.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::schematic::Schematic;

/// Insertion-ordered object fields
pub type Object = IndexMap<String, Value>;

/// Signature of a user-supplied predicate
pub type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;

/// A dynamically typed value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent, or explicitly undefined
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(Arc<str>),
    Symbol(Symbol),
    Date(DateTime<Utc>),
    Array(Arc<Vec<Value>>),
    Object(Arc<Object>),
    Function(Function),
    Instance(Instance),
    Schematic(Schematic),
}

impl Value {
    /// Build an object from key/value pairs, keeping their order
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(Arc::new(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        ))
    }

    /// Build an array
    pub fn array<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::Array(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Wrap a closure as a callable predicate value
    pub fn function<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Value::Function(Function::predicate(predicate))
    }

    /// Create a fresh symbol with a description
    pub fn symbol(description: impl Into<String>) -> Self {
        Value::Symbol(Symbol::new(description))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value is a non-null object in the broad sense: plain
    /// objects, arrays, dates, class instances and schematics
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            Value::Object(_)
                | Value::Array(_)
                | Value::Date(_)
                | Value::Instance(_)
                | Value::Schematic(_)
        )
    }

    pub fn is_schematic(&self) -> bool {
        matches!(self, Value::Schematic(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Plain object fields (not instance fields)
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Look up a field on an object or an instance
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(key),
            Value::Instance(instance) => instance.fields.get(key),
            _ => None,
        }
    }

    /// Short name of the runtime kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Instance(_) => "instance",
            Value::Schematic(_) => "schematic",
        }
    }
}

/// A unique symbol; two symbols are equal only if they are the same symbol
#[derive(Clone)]
pub struct Symbol(Arc<Option<String>>);

impl Symbol {
    pub fn new(description: impl Into<String>) -> Self {
        Self(Arc::new(Some(description.into())))
    }

    pub fn anonymous() -> Self {
        Self(Arc::new(None))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or_default())
    }
}

/// A constructor, with optional single inheritance
#[derive(Clone)]
pub struct Class(Arc<ClassInner>);

struct ClassInner {
    name: String,
    parent: Option<Class>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::new(ClassInner {
            name: name.into(),
            parent: None,
        }))
    }

    /// Declare a subclass of `parent`
    pub fn extends(name: impl Into<String>, parent: &Class) -> Self {
        Self(Arc::new(ClassInner {
            name: name.into(),
            parent: Some(parent.clone()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&Class> {
        self.0.parent.as_ref()
    }

    /// Whether this class is `other` or inherits from it
    pub fn is_a(&self, other: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if Arc::ptr_eq(&class.0, &other.0) {
                return true;
            }
            current = class.parent();
        }
        false
    }

    /// Construct an instance without fields
    pub fn construct(&self) -> Value {
        self.construct_with(Vec::<(String, Value)>::new())
    }

    /// Construct an instance carrying the given fields
    pub fn construct_with<K, V, I>(&self, fields: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Instance(Instance {
            class: self.clone(),
            fields: Arc::new(
                fields
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        })
    }

    /// The constructor as a function value
    pub fn constructor(&self) -> Value {
        Value::Function(Function::constructor(self.clone()))
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent() {
            Some(parent) => write!(f, "Class({} extends {})", self.name(), parent.name()),
            None => write!(f, "Class({})", self.name()),
        }
    }
}

/// An object built by a [`Class`]
#[derive(Debug, Clone)]
pub struct Instance {
    class: Class,
    fields: Arc<Object>,
}

impl Instance {
    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn fields(&self) -> &Object {
        &self.fields
    }
}

/// A callable value: either a predicate or a constructor
#[derive(Clone)]
pub struct Function(Arc<Callable>);

enum Callable {
    Predicate {
        name: Option<String>,
        call: Box<PredicateFn>,
    },
    Constructor(Class),
}

impl Function {
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(Callable::Predicate {
            name: None,
            call: Box::new(predicate),
        }))
    }

    /// A predicate with a name, shown in diagnostics
    pub fn named<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(Callable::Predicate {
            name: Some(name.into()),
            call: Box::new(predicate),
        }))
    }

    pub fn constructor(class: Class) -> Self {
        Self(Arc::new(Callable::Constructor(class)))
    }

    pub fn name(&self) -> Option<&str> {
        match &*self.0 {
            Callable::Predicate { name, .. } => name.as_deref(),
            Callable::Constructor(class) => Some(class.name()),
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(&*self.0, Callable::Constructor(_))
    }

    pub fn as_class(&self) -> Option<&Class> {
        match &*self.0 {
            Callable::Constructor(class) => Some(class),
            Callable::Predicate { .. } => None,
        }
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Apply the function as a predicate.
    ///
    /// Constructors test instance membership. A predicate that panics counts
    /// as `false`; the panic never reaches the caller.
    pub fn test(&self, value: &Value) -> bool {
        match &*self.0 {
            Callable::Predicate { name, call } => {
                match panic::catch_unwind(AssertUnwindSafe(|| call(value))) {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(
                            function = name.as_deref().unwrap_or("<anonymous>"),
                            "predicate panicked, treating it as a non-match"
                        );
                        false
                    }
                }
            }
            Callable::Constructor(class) => {
                matches!(value, Value::Instance(instance) if instance.class.is_a(class))
            }
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Callable::Predicate { name, .. } => {
                write!(f, "Function({})", name.as_deref().unwrap_or("<anonymous>"))
            }
            Callable::Constructor(class) => write!(f, "Constructor({})", class.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }
}

impl From<Object> for Value {
    fn from(fields: Object) -> Self {
        Value::Object(Arc::new(fields))
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::Symbol(symbol)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<&Class> for Value {
    fn from(class: &Class) -> Self {
        class.constructor()
    }
}

impl From<Schematic> for Value {
    fn from(schematic: Schematic) -> Self {
        Value::Schematic(schematic)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.as_str().into()),
            serde_json::Value::Array(items) => {
                Value::Array(Arc::new(items.iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(fields) => Value::Object(Arc::new(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::from(value)))
                    .collect(),
            )),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from(&json)
    }
}
