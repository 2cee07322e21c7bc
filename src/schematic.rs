//! Reusable compiled schemas

use std::sync::Arc;

use crate::compiler::Compiler;
use crate::definition::SchemaDef;
use crate::error::Result;
use crate::validated::{PropertySummary, ValidatedSchema};
use crate::validator::validate;
use crate::value::Value;

/// A compiled schema that can be used as a type guard, nested inside other
/// schemas, or passed back wherever a raw schema is accepted
#[derive(Debug, Clone)]
pub struct Schematic {
    schema: Arc<ValidatedSchema>,
}

impl Schematic {
    /// Compile a raw schema. Wrapping an existing schematic returns it
    /// unchanged.
    pub fn new(raw: &Value) -> Result<Self> {
        match raw {
            Value::Schematic(schematic) => Ok(schematic.clone()),
            _ => Compiler::uncached().schematic(raw),
        }
    }

    pub fn from_definition(definition: &SchemaDef) -> Result<Self> {
        Compiler::uncached()
            .compile_definition(definition)
            .map(|schema| Self::from_schema(Arc::new(schema)))
    }

    pub fn from_schema(schema: Arc<ValidatedSchema>) -> Self {
        Self { schema }
    }

    /// Does the value satisfy the schema?
    pub fn is(&self, value: &Value) -> bool {
        validate(&self.schema, value)
    }

    /// `false` for a schema compiled from an empty definition under the
    /// disabling policy
    pub fn is_enabled(&self) -> bool {
        self.schema.is_enabled()
    }

    pub fn schema(&self) -> &Arc<ValidatedSchema> {
        &self.schema
    }

    /// Whether both handles share one compiled schema
    pub fn ptr_eq(&self, other: &Schematic) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
    }

    pub fn describe(&self) -> Vec<PropertySummary> {
        self.schema.describe()
    }
}

pub fn is_schematic(value: &Value) -> bool {
    value.is_schematic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeName;
    use serde_json::json;

    #[test]
    fn test_wrapping_is_idempotent() {
        let schematic = Schematic::new(&Value::from(json!({"a": "string"}))).unwrap();
        let wrapped = Schematic::new(&Value::from(schematic.clone())).unwrap();
        assert!(wrapped.ptr_eq(&schematic));
    }

    #[test]
    fn test_is_schematic() {
        let schematic = Schematic::new(&Value::from(json!({"a": "string"}))).unwrap();
        assert!(is_schematic(&Value::from(schematic)));
        assert!(!is_schematic(&Value::from(json!({"a": "string"}))));
        assert!(!is_schematic(&Value::Null));
    }

    #[test]
    fn test_from_definition() {
        let schematic =
            Schematic::from_definition(&SchemaDef::new().with("count", TypeName::Number)).unwrap();
        assert!(schematic.is(&Value::from(json!({"count": 3}))));
        assert!(!schematic.is(&Value::from(json!({"count": "3"}))));
        assert_eq!(schematic.describe()[0].path, "count");
    }

    #[test]
    fn test_schematic_as_property_type() {
        let inner = Schematic::new(&Value::from(json!({"name": "string"}))).unwrap();
        let outer = Schematic::new(&Value::object([("inner", Value::from(inner))])).unwrap();

        assert!(outer.is(&Value::from(json!({"inner": {"name": "x"}}))));
        assert!(!outer.is(&Value::from(json!({"inner": {"name": 1}}))));
        assert!(!outer.is(&Value::from(json!({}))));
    }
}
