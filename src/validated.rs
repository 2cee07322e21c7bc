//! Compiled schemas
//!
//! A [`ValidatedSchema`] is the flat, immutable result of compiling a
//! [`SchemaDef`](crate::definition::SchemaDef): every property is addressed
//! by its full dotted path and carries the alternatives it accepts.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::instance::InstanceGuard;
use crate::schematic::Schematic;
use crate::types::TypeName;
use crate::validator::validate;
use crate::value::{Function, Value};

/// One way a property value may be accepted
#[derive(Debug, Clone)]
pub enum TypeAlternative {
    Name(TypeName),
    Predicate(Function),
    Instance(InstanceGuard),
    /// The value must satisfy a nested schema as a whole
    Nested(Arc<ValidatedSchema>),
    Schematic(Schematic),
}

impl TypeAlternative {
    /// Does the value satisfy this alternative, ignoring validators?
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            TypeAlternative::Name(name) => name.matches(value),
            TypeAlternative::Predicate(function) => function.test(value),
            TypeAlternative::Instance(guard) => guard.is(value),
            TypeAlternative::Nested(schema) => validate(schema, value),
            TypeAlternative::Schematic(schematic) => schematic.is(value),
        }
    }

    pub fn type_name(&self) -> Option<TypeName> {
        match self {
            TypeAlternative::Name(name) => Some(*name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeAlternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAlternative::Name(name) => write!(f, "{}", name),
            TypeAlternative::Predicate(function) => {
                f.write_str(function.name().unwrap_or("predicate"))
            }
            TypeAlternative::Instance(guard) => write!(f, "instanceof {}", guard.class().name()),
            TypeAlternative::Nested(_) => f.write_str("schema"),
            TypeAlternative::Schematic(_) => f.write_str("schematic"),
        }
    }
}

/// A compiled property
#[derive(Debug, Clone)]
pub struct ValidatedProperty {
    pub path: String,
    pub required: bool,
    pub types: Vec<TypeAlternative>,
    pub validators: IndexMap<TypeName, Vec<Function>>,
}

impl ValidatedProperty {
    /// The first alternative that accepts the value.
    ///
    /// A type-name alternative only counts when every validator registered
    /// for that name also accepts the value. Validators never run for a
    /// value whose base type does not match.
    pub fn matching(&self, value: &Value) -> Option<&TypeAlternative> {
        self.types.iter().find(|alternative| {
            if !alternative.accepts(value) {
                return false;
            }
            match alternative.type_name().and_then(|name| self.validators.get(&name)) {
                Some(validators) => validators.iter().all(|validator| validator.test(value)),
                None => true,
            }
        })
    }

    /// Whether an absent value is acceptable
    pub fn accepts_undefined(&self) -> bool {
        self.types
            .iter()
            .any(|alternative| alternative.type_name() == Some(TypeName::Undefined))
    }
}

/// A compiled schema
#[derive(Debug, Clone)]
pub struct ValidatedSchema {
    properties: IndexMap<String, ValidatedProperty>,
    keys: Vec<String>,
    enabled: bool,
    depth: usize,
}

impl ValidatedSchema {
    /// Assemble a schema from compiled properties, visiting them in `keys`
    /// order
    pub(crate) fn new(properties: IndexMap<String, ValidatedProperty>, keys: Vec<String>) -> Self {
        let depth = keys
            .iter()
            .map(|key| crate::flatten::depth(key))
            .max()
            .unwrap_or(0);

        Self {
            properties,
            keys,
            enabled: true,
            depth,
        }
    }

    /// A schema that rejects every value
    pub fn disabled() -> Self {
        Self {
            properties: IndexMap::new(),
            keys: Vec::new(),
            enabled: false,
            depth: 0,
        }
    }

    /// Property paths in validation order
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn get(&self, path: &str) -> Option<&ValidatedProperty> {
        self.properties.get(path)
    }

    /// Properties in validation order
    pub fn properties(&self) -> impl Iterator<Item = &ValidatedProperty> {
        self.keys.iter().filter_map(|key| self.properties.get(key))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Deepest property path, in segments
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// A serializable outline of the schema
    pub fn describe(&self) -> Vec<PropertySummary> {
        self.properties()
            .map(|property| PropertySummary {
                path: property.path.clone(),
                required: property.required,
                types: property.types.iter().map(ToString::to_string).collect(),
                validators: property
                    .validators
                    .iter()
                    .map(|(name, functions)| (*name, functions.len()))
                    .collect(),
            })
            .collect()
    }
}

/// Outline of one compiled property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySummary {
    pub path: String,
    pub required: bool,
    pub types: Vec<String>,
    /// Number of validators per type name
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub validators: IndexMap<TypeName, usize>,
}
