//! Schema compilation
//!
//! Turns a [`SchemaDef`] into a flat [`ValidatedSchema`]. Nested property
//! objects are expanded into dotted paths on the parent; object alternatives
//! (`$type: [{ .. }]`) compile to independent sub-schemas.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use indexmap::map::Entry;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::{CompilerConfig, EmptySchemaPolicy};
use crate::definition::{PropertyDef, SchemaDef, TypeDef, ValidatorMap};
use crate::error::{Result, SchematicError};
use crate::flatten::join;
use crate::instance::InstanceGuard;
use crate::schematic::Schematic;
use crate::types::TypeName;
use crate::validated::{TypeAlternative, ValidatedProperty, ValidatedSchema};
use crate::value::{Object, Value};

/// Compiles raw schemas, optionally memoizing them per raw schema object
#[derive(Debug, Clone)]
pub struct Compiler {
    config: CompilerConfig,
    cache: Option<SchemaCache>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        let cache = config.cache.then(SchemaCache::default);
        Self { config, cache }
    }

    /// A compiler with default settings and no cache
    pub fn uncached() -> Self {
        Self::new(CompilerConfig {
            cache: false,
            ..CompilerConfig::default()
        })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&SchemaCache> {
        self.cache.as_ref()
    }

    /// Compile a raw schema value.
    ///
    /// A schematic yields its own compiled schema. Compiling the same raw
    /// object twice returns the same `Arc` while the cache is enabled.
    pub fn compile(&self, raw: &Value) -> Result<Arc<ValidatedSchema>> {
        let fields = match raw {
            Value::Schematic(schematic) => return Ok(schematic.schema().clone()),
            Value::Object(fields) => fields,
            _ => return Err(SchematicError::InvalidSchema),
        };

        if let Some(schema) = self.cache.as_ref().and_then(|cache| cache.get(fields)) {
            trace!(properties = schema.len(), "schema cache hit");
            return Ok(schema);
        }

        let definition = SchemaDef::from_value(raw)?;
        let schema = Arc::new(self.compile_definition(&definition)?);

        if let Some(cache) = &self.cache {
            cache.insert(fields, schema.clone());
        }

        Ok(schema)
    }

    /// Compile a typed definition
    pub fn compile_definition(&self, definition: &SchemaDef) -> Result<ValidatedSchema> {
        let schema = self.build(definition, None, true)?;
        debug!(
            properties = schema.len(),
            depth = schema.depth(),
            enabled = schema.is_enabled(),
            "compiled schema"
        );
        Ok(schema)
    }

    /// Compile a raw schema straight into a [`Schematic`]
    pub fn schematic(&self, raw: &Value) -> Result<Schematic> {
        self.compile(raw).map(Schematic::from_schema)
    }

    /// `label` prefixes error paths for sub-schemas; only the root schema
    /// sorts its keys.
    fn build(&self, definition: &SchemaDef, label: Option<&str>, sort: bool) -> Result<ValidatedSchema> {
        if definition.is_empty() {
            return match self.config.empty_schema {
                EmptySchemaPolicy::Reject => Err(SchematicError::EmptySchema {
                    path: label.map(str::to_string),
                }),
                EmptySchemaPolicy::Disable => Ok(ValidatedSchema::disabled()),
            };
        }

        let mut builder = Builder {
            compiler: self,
            label,
            properties: IndexMap::new(),
        };
        builder.add_fields(definition, None)?;

        let mut properties = builder.properties;
        for property in properties.values_mut() {
            if !property.required && !property.accepts_undefined() {
                property.types.push(TypeAlternative::Name(TypeName::Undefined));
            }
            property.required = property.required && !property.accepts_undefined();
        }

        let mut keys: Vec<String> = properties.keys().cloned().collect();
        if sort {
            keys.sort();
        }

        Ok(ValidatedSchema::new(properties, keys))
    }
}

struct Builder<'a> {
    compiler: &'a Compiler,
    label: Option<&'a str>,
    properties: IndexMap<String, ValidatedProperty>,
}

impl Builder<'_> {
    fn add_fields(&mut self, definition: &SchemaDef, prefix: Option<&str>) -> Result<()> {
        for (key, property) in definition.iter() {
            let path = join(prefix, key);

            match property {
                PropertyDef::Type(def) => {
                    let types = vec![self.resolve(def, &path)?];
                    self.add(path, true, types, ValidatorMap::new());
                }
                PropertyDef::Types(defs) => {
                    let types = self.resolve_all(defs, &path)?;
                    self.add(path, true, types, ValidatorMap::new());
                }
                PropertyDef::Record(record) => {
                    let types = self.resolve_all(&record.types, &path)?;
                    self.add(path, record.required, types, record.validators.clone());
                }
                PropertyDef::Nested(nested) => {
                    let types = vec![TypeAlternative::Name(TypeName::Object)];
                    self.add(path.clone(), nested.required, types, nested.validators.clone());
                    self.add_fields(&nested.schema, Some(&path))?;
                }
            }
        }
        Ok(())
    }

    /// Merge into an existing entry for the same path
    fn add(&mut self, path: String, required: bool, types: Vec<TypeAlternative>, validators: ValidatorMap) {
        let existing = match self.properties.entry(path) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let path = entry.key().clone();
                entry.insert(ValidatedProperty {
                    path,
                    required,
                    types,
                    validators,
                });
                return;
            }
        };

        for alternative in types {
            let duplicate = alternative.type_name().is_some_and(|name| {
                existing
                    .types
                    .iter()
                    .any(|known| known.type_name() == Some(name))
            });
            if !duplicate {
                existing.types.push(alternative);
            }
        }
        existing.required = existing.required && required;
        for (name, functions) in validators {
            existing.validators.entry(name).or_default().extend(functions);
        }
    }

    fn label(&self, path: &str) -> String {
        join(self.label, path)
    }

    fn resolve_all(&self, defs: &[TypeDef], path: &str) -> Result<Vec<TypeAlternative>> {
        if defs.is_empty() {
            return Err(SchematicError::InvalidPropertyType {
                path: self.label(path),
            });
        }
        defs.iter().map(|def| self.resolve(def, path)).collect()
    }

    fn resolve(&self, def: &TypeDef, path: &str) -> Result<TypeAlternative> {
        Ok(match def {
            TypeDef::Name(name) => TypeAlternative::Name(*name),
            TypeDef::Constructor(class) => TypeAlternative::Instance(InstanceGuard::for_class(class)),
            TypeDef::Predicate(function) => TypeAlternative::Predicate(function.clone()),
            TypeDef::Schema(schema) => {
                let label = self.label(path);
                let nested = self.compiler.build(schema, Some(&label), false)?;
                TypeAlternative::Nested(Arc::new(nested))
            }
            TypeDef::Schematic(schematic) => TypeAlternative::Schematic(schematic.clone()),
        })
    }
}

/// Compiled schemas keyed by the identity of their raw schema object.
///
/// Entries hold the raw object weakly; once it is dropped the entry is
/// treated as absent and purged on the next insert.
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    entries: Arc<RwLock<HashMap<usize, CacheEntry>>>,
}

#[derive(Debug)]
struct CacheEntry {
    source: Weak<Object>,
    schema: Arc<ValidatedSchema>,
}

impl SchemaCache {
    pub fn get(&self, source: &Arc<Object>) -> Option<Arc<ValidatedSchema>> {
        let entries = self.entries.read();
        let entry = entries.get(&Self::key(source))?;
        let live = entry.source.upgrade()?;
        Arc::ptr_eq(&live, source).then(|| entry.schema.clone())
    }

    pub fn insert(&self, source: &Arc<Object>, schema: Arc<ValidatedSchema>) {
        let mut entries = self.entries.write();
        entries.retain(|_, entry| entry.source.strong_count() > 0);
        entries.insert(
            Self::key(source),
            CacheEntry {
                source: Arc::downgrade(source),
                schema,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    fn key(source: &Arc<Object>) -> usize {
        Arc::as_ptr(source) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(json: serde_json::Value) -> Result<Arc<ValidatedSchema>> {
        Compiler::default().compile(&Value::from(json))
    }

    fn type_names(property: &ValidatedProperty) -> Vec<String> {
        property.types.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_nested_properties_flatten_to_paths() {
        let schema = compile(json!({
            "name": "string",
            "address": {"street": "string", "geo": {"lat": "number"}}
        }))
        .unwrap();

        assert_eq!(
            schema.keys(),
            ["address", "address.geo", "address.geo.lat", "address.street", "name"]
        );
        assert_eq!(type_names(schema.get("address").unwrap()), vec!["object"]);
        assert!(schema.get("address.geo.lat").unwrap().required);
        assert_eq!(schema.depth(), 3);
    }

    #[test]
    fn test_optional_properties_accept_undefined() {
        let schema = compile(json!({
            "age": {"$type": "number", "$required": false},
            "maybe": ["string", "undefined"],
            "address": {"$required": false, "street": "string"}
        }))
        .unwrap();

        let age = schema.get("age").unwrap();
        assert!(!age.required);
        assert_eq!(type_names(age), vec!["number", "undefined"]);

        let maybe = schema.get("maybe").unwrap();
        assert!(!maybe.required);
        assert_eq!(type_names(maybe), vec!["string", "undefined"]);

        assert!(!schema.get("address").unwrap().required);
        assert!(schema.get("address.street").unwrap().required);
    }

    #[test]
    fn test_repeated_paths_merge() {
        let schema = compile(json!({
            "a": {"b": "string"},
            "a.b": {"$type": ["number", "string"], "$required": false}
        }))
        .unwrap();

        let merged = schema.get("a.b").unwrap();
        assert_eq!(type_names(merged), vec!["string", "number", "undefined"]);
        assert!(!merged.required);
    }

    #[test]
    fn test_alternative_schemas_compile_separately() {
        let schema = compile(json!({
            "value": {"$type": ["number", {"b": "string", "a": {"c": "boolean"}}]}
        }))
        .unwrap();

        let value = schema.get("value").unwrap();
        assert_eq!(type_names(value), vec!["number", "schema"]);
        assert!(schema.get("value.b").is_none());

        match &value.types[1] {
            TypeAlternative::Nested(nested) => {
                assert_eq!(nested.keys(), ["b", "a", "a.c"]);
            }
            other => panic!("Expected nested schema, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_errors_carry_full_path() {
        let err = compile(json!({
            "outer": {"$type": [{"inner": {"$type": []}}]}
        }))
        .unwrap_err();
        assert_eq!(err.path(), Some("outer.inner"));
    }

    #[test]
    fn test_empty_schema_policy() {
        assert!(matches!(compile(json!({})), Err(SchematicError::EmptySchema { path: None })));

        let disabling = Compiler::new(CompilerConfig {
            empty_schema: EmptySchemaPolicy::Disable,
            ..CompilerConfig::default()
        });
        let schema = disabling.compile(&Value::from(json!({}))).unwrap();
        assert!(!schema.is_enabled());

        let typed = SchemaDef::new().with("a", TypeDef::Schema(SchemaDef::new()));
        assert!(matches!(
            Compiler::default().compile_definition(&typed),
            Err(SchematicError::EmptySchema { path: Some(ref p) }) if p == "a"
        ));
        let schema = disabling.compile_definition(&typed).unwrap();
        match &schema.get("a").unwrap().types[0] {
            TypeAlternative::Nested(nested) => assert!(!nested.is_enabled()),
            other => panic!("Expected nested schema, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_schemas_rejected() {
        let compiler = Compiler::default();
        for raw in [Value::Null, Value::from("x"), Value::from(1), Value::array(vec![1])] {
            assert!(matches!(compiler.compile(&raw), Err(SchematicError::InvalidSchema)));
        }
    }

    #[test]
    fn test_cache_returns_same_schema() {
        let compiler = Compiler::default();
        let raw = Value::from(json!({"a": "string"}));

        let first = compiler.compile(&raw).unwrap();
        let second = compiler.compile(&raw.clone()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(compiler.cache().unwrap().len(), 1);

        let same_shape = Value::from(json!({"a": "string"}));
        let third = compiler.compile(&same_shape).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_cache_drops_dead_entries() {
        let compiler = Compiler::default();
        let cache = compiler.cache().unwrap();

        let raw = Value::from(json!({"a": "string"}));
        compiler.compile(&raw).unwrap();
        drop(raw);

        let other = Value::from(json!({"b": "number"}));
        compiler.compile(&other).unwrap();
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_uncached_compiler_recompiles() {
        let compiler = Compiler::uncached();
        assert!(compiler.cache().is_none());

        let raw = Value::from(json!({"a": "string"}));
        let first = compiler.compile(&raw).unwrap();
        let second = compiler.compile(&raw).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_schematic_input_passes_through() {
        let compiler = Compiler::default();
        let schematic = compiler.schematic(&Value::from(json!({"a": "string"}))).unwrap();
        let schema = compiler.compile(&Value::from(schematic.clone())).unwrap();
        assert!(Arc::ptr_eq(&schema, schematic.schema()));
    }
}
