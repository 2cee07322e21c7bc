//! Schema definitions
//!
//! A [`SchemaDef`] is the structural, uncompiled form of a schema. Each
//! property is decided by its variant rather than by sniffing reserved key
//! names, so a typed definition can describe a data field literally named
//! `$type` without ambiguity.
//!
//! Definitions come from two places:
//!
//! - the builder API (`SchemaDef::new().with(..)`), and
//! - [`SchemaDef::from_value`] / [`SchemaDef::from_json`], which read the
//!   free-form object notation where `$required`, `$type` and `$validators`
//!   are control properties:
//!
//! ```text
//! {
//!   "name": "string",
//!   "tags": ["array", "null"],
//!   "age": { "$type": "number", "$required": false },
//!   "address": { "street": "string", "zip": ["string", "number"] }
//! }
//! ```

use indexmap::IndexMap;

use crate::error::{Result, SchematicError};
use crate::flatten::join;
use crate::schematic::Schematic;
use crate::types::TypeName;
use crate::value::{Class, Function, Object, Value};

pub const PROPERTY_REQUIRED: &str = "$required";
pub const PROPERTY_TYPE: &str = "$type";
pub const PROPERTY_VALIDATORS: &str = "$validators";

const CONTROL_PROPERTIES: [&str; 3] = [PROPERTY_REQUIRED, PROPERTY_TYPE, PROPERTY_VALIDATORS];

/// Extra predicates per type name, run only after that type matched
pub type ValidatorMap = IndexMap<TypeName, Vec<Function>>;

/// An uncompiled schema: named properties in declaration order
#[derive(Debug, Clone, Default)]
pub struct SchemaDef {
    properties: IndexMap<String, PropertyDef>,
}

/// How a single property is declared
#[derive(Debug, Clone)]
pub enum PropertyDef {
    /// A single required type
    Type(TypeDef),
    /// Required, matching any of the listed types
    Types(Vec<TypeDef>),
    /// Explicit record with required-ness and validators
    Record(PropertyRecord),
    /// An object whose own properties are declared inline
    Nested(NestedDef),
}

/// One accepted kind of value
#[derive(Debug, Clone)]
pub enum TypeDef {
    Name(TypeName),
    /// Instances of the class or its subclasses
    Constructor(Class),
    Predicate(Function),
    /// A sub-schema the value must satisfy as a whole
    Schema(SchemaDef),
    Schematic(Schematic),
}

#[derive(Debug, Clone)]
pub struct PropertyRecord {
    pub required: bool,
    pub types: Vec<TypeDef>,
    pub validators: ValidatorMap,
}

#[derive(Debug, Clone)]
pub struct NestedDef {
    pub required: bool,
    pub validators: ValidatorMap,
    pub schema: SchemaDef,
}

impl SchemaDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property, builder style
    pub fn with(mut self, key: impl Into<String>, property: impl Into<PropertyDef>) -> Self {
        self.insert(key, property);
        self
    }

    /// Add or replace a property
    pub fn insert(&mut self, key: impl Into<String>, property: impl Into<PropertyDef>) {
        self.properties.insert(key.into(), property.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyDef> {
        self.properties.get(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDef)> {
        self.properties.iter().map(|(key, def)| (key.as_str(), def))
    }

    /// Read a definition from the object notation
    pub fn from_value(raw: &Value) -> Result<Self> {
        match raw {
            Value::Object(fields) => parse_fields(fields, None),
            _ => Err(SchematicError::InvalidSchema),
        }
    }

    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        Self::from_value(&Value::from(json))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json(&json)
    }
}

impl PropertyRecord {
    /// A required property accepting any of `types`
    pub fn new<T, I>(types: I) -> Self
    where
        T: Into<TypeDef>,
        I: IntoIterator<Item = T>,
    {
        Self {
            required: true,
            types: types.into_iter().map(Into::into).collect(),
            validators: ValidatorMap::new(),
        }
    }

    pub fn optional(self) -> Self {
        self.required(false)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Attach a validator closure for `type_name`
    pub fn validator<F>(self, type_name: TypeName, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validator_fn(type_name, Function::predicate(predicate))
    }

    pub fn validator_fn(mut self, type_name: TypeName, function: Function) -> Self {
        self.validators.entry(type_name).or_default().push(function);
        self
    }
}

impl NestedDef {
    pub fn new(schema: SchemaDef) -> Self {
        Self {
            required: true,
            validators: ValidatorMap::new(),
            schema,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

impl From<TypeName> for TypeDef {
    fn from(name: TypeName) -> Self {
        TypeDef::Name(name)
    }
}

impl From<&Class> for TypeDef {
    fn from(class: &Class) -> Self {
        TypeDef::Constructor(class.clone())
    }
}

impl From<Function> for TypeDef {
    fn from(function: Function) -> Self {
        match function.as_class() {
            Some(class) => TypeDef::Constructor(class.clone()),
            None => TypeDef::Predicate(function),
        }
    }
}

impl From<SchemaDef> for TypeDef {
    fn from(schema: SchemaDef) -> Self {
        TypeDef::Schema(schema)
    }
}

impl From<Schematic> for TypeDef {
    fn from(schematic: Schematic) -> Self {
        TypeDef::Schematic(schematic)
    }
}

impl From<TypeDef> for PropertyDef {
    fn from(def: TypeDef) -> Self {
        PropertyDef::Type(def)
    }
}

impl From<TypeName> for PropertyDef {
    fn from(name: TypeName) -> Self {
        PropertyDef::Type(name.into())
    }
}

impl From<&Class> for PropertyDef {
    fn from(class: &Class) -> Self {
        PropertyDef::Type(class.into())
    }
}

impl From<Function> for PropertyDef {
    fn from(function: Function) -> Self {
        PropertyDef::Type(function.into())
    }
}

impl From<Schematic> for PropertyDef {
    fn from(schematic: Schematic) -> Self {
        PropertyDef::Type(schematic.into())
    }
}

impl From<Vec<TypeDef>> for PropertyDef {
    fn from(types: Vec<TypeDef>) -> Self {
        PropertyDef::Types(types)
    }
}

impl From<PropertyRecord> for PropertyDef {
    fn from(record: PropertyRecord) -> Self {
        PropertyDef::Record(record)
    }
}

impl From<NestedDef> for PropertyDef {
    fn from(nested: NestedDef) -> Self {
        PropertyDef::Nested(nested)
    }
}

/// As a property, a schema declares a required nested object
impl From<SchemaDef> for PropertyDef {
    fn from(schema: SchemaDef) -> Self {
        PropertyDef::Nested(NestedDef::new(schema))
    }
}

fn is_control(key: &str) -> bool {
    CONTROL_PROPERTIES.contains(&key)
}

fn parse_fields(fields: &Object, prefix: Option<&str>) -> Result<SchemaDef> {
    let mut schema = SchemaDef::new();
    for (key, value) in fields.iter() {
        if is_control(key) {
            continue;
        }
        let path = join(prefix, key);
        schema.insert(key.clone(), parse_property(&path, value)?);
    }
    Ok(schema)
}

fn parse_property(path: &str, value: &Value) -> Result<PropertyDef> {
    let fields = match value {
        Value::Object(fields) => fields,
        Value::Array(_) => return parse_types(path, value).map(PropertyDef::Types),
        other => return parse_type(path, other).map(PropertyDef::Type),
    };

    let required = parse_required(path, fields)?;
    let validators = parse_validators(path, fields.get(PROPERTY_VALIDATORS))?;

    if let Some(types) = fields.get(PROPERTY_TYPE) {
        if let Some(key) = fields.keys().find(|key| !is_control(key)) {
            return Err(SchematicError::UnexpectedProperty {
                path: path.to_string(),
                key: key.clone(),
            });
        }
        return Ok(PropertyDef::Record(PropertyRecord {
            required: required.unwrap_or(true),
            types: parse_types(path, types)?,
            validators,
        }));
    }

    if fields.is_empty() {
        return Err(SchematicError::EmptySchema {
            path: Some(path.to_string()),
        });
    }

    Ok(PropertyDef::Nested(NestedDef {
        required: required.unwrap_or(true),
        validators,
        schema: parse_fields(fields, Some(path))?,
    }))
}

fn parse_required(path: &str, fields: &Object) -> Result<Option<bool>> {
    match fields.get(PROPERTY_REQUIRED) {
        None => Ok(None),
        Some(Value::Bool(required)) => Ok(Some(*required)),
        Some(_) => Err(SchematicError::InvalidRequired {
            path: path.to_string(),
        }),
    }
}

fn parse_types(path: &str, value: &Value) -> Result<Vec<TypeDef>> {
    let types = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| parse_type(path, item))
            .collect::<Result<Vec<_>>>()?,
        other => vec![parse_type(path, other)?],
    };

    if types.is_empty() {
        return Err(SchematicError::InvalidPropertyType {
            path: path.to_string(),
        });
    }

    Ok(types)
}

fn parse_type(path: &str, value: &Value) -> Result<TypeDef> {
    match value {
        Value::String(name) => TypeName::from_name(name).map(TypeDef::Name),
        Value::Function(function) => Some(TypeDef::from(function.clone())),
        Value::Schematic(schematic) => Some(TypeDef::Schematic(schematic.clone())),
        Value::Object(fields) => return parse_alternative_schema(path, fields).map(TypeDef::Schema),
        _ => None,
    }
    .ok_or_else(|| SchematicError::InvalidPropertyType {
        path: path.to_string(),
    })
}

/// An object given as a type alternative is a self-contained sub-schema; it
/// may not carry control properties of its own.
fn parse_alternative_schema(path: &str, fields: &Object) -> Result<SchemaDef> {
    if fields.is_empty() {
        return Err(SchematicError::EmptySchema {
            path: Some(path.to_string()),
        });
    }

    if let Some(property) = CONTROL_PROPERTIES
        .into_iter()
        .find(|property| fields.contains_key(*property))
    {
        return Err(SchematicError::DisallowedProperty {
            path: path.to_string(),
            property,
        });
    }

    parse_fields(fields, Some(path))
}

fn parse_validators(path: &str, value: Option<&Value>) -> Result<ValidatorMap> {
    let fields = match value {
        None | Some(Value::Undefined) | Some(Value::Null) => return Ok(ValidatorMap::new()),
        Some(Value::Object(fields)) => fields,
        Some(_) => {
            return Err(SchematicError::InvalidValidators {
                path: path.to_string(),
            })
        }
    };

    let mut validators = ValidatorMap::new();
    for (name, value) in fields.iter() {
        let type_name = TypeName::from_name(name).ok_or_else(|| SchematicError::UnknownValidator {
            path: path.to_string(),
            name: name.clone(),
        })?;

        let invalid = || SchematicError::InvalidValidator {
            path: path.to_string(),
            name: name.clone(),
        };

        let functions = match value {
            Value::Function(function) => vec![function.clone()],
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_function().cloned().ok_or_else(invalid))
                .collect::<Result<Vec<_>>>()?,
            _ => return Err(invalid()),
        };

        validators.entry(type_name).or_default().extend(functions);
    }

    Ok(validators)
}
