//! Value validation against a compiled schema

use tracing::trace;

use crate::flatten::{flatten, is_descendant};
use crate::types::TypeName;
use crate::validated::ValidatedSchema;
use crate::value::Value;

static UNDEFINED: Value = Value::Undefined;

/// Check a candidate value against a compiled schema.
///
/// Properties are visited in schema order and the first failure returns
/// `false`. Once a property is satisfied by anything other than the `object`
/// type, its descendants are no longer checked: an absent optional parent or
/// a scalar chosen over a nested shape has no children to validate.
pub fn validate(schema: &ValidatedSchema, value: &Value) -> bool {
    if !schema.is_enabled() {
        trace!("schema is disabled");
        return false;
    }

    if !value.is_object_like() {
        trace!(kind = value.kind(), "candidate is not an object");
        return false;
    }

    let flattened = flatten(value, schema.depth());
    let mut satisfied: Vec<&str> = Vec::new();

    for key in schema.keys() {
        if satisfied.iter().any(|ancestor| is_descendant(key, ancestor)) {
            continue;
        }

        let Some(property) = schema.get(key) else {
            continue;
        };
        let candidate = flattened.get(key).unwrap_or(&UNDEFINED);

        if property.required && candidate.is_undefined() {
            trace!(path = key.as_str(), "required property is missing");
            return false;
        }

        match property.matching(candidate) {
            Some(alternative) => {
                if alternative.type_name() != Some(TypeName::Object) {
                    satisfied.push(key);
                }
            }
            None => {
                trace!(path = key.as_str(), kind = candidate.kind(), "property does not match");
                return false;
            }
        }
    }

    true
}
