//! Schematic
//!
//! Runtime object-shape validation from declarative schemas. A schema maps
//! property names to the types they accept; compiling it produces a
//! reusable [`Schematic`] that answers "does this value have that shape?".
//!
//! ## Features
//!
//! - **Type registry**: built-in type names such as `string`, `numerical` or
//!   `date-like`, plus predicates and constructor (instance) checks
//! - **Nested schemas**: inline objects expand into dotted paths; object
//!   alternatives and schematics compose as whole-value checks
//! - **Validators**: extra predicates per type name, run only after the base
//!   type matched
//! - **Caching**: a compiler reuses the compiled schema for the same raw
//!   schema object
//!
//! ## Example
//!
//! ```text
//! {
//!   "name": "string",
//!   "age": { "$type": "number", "$required": false },
//!   "address": { "street": "string", "zip": ["string", "number"] }
//! }
//! ```
//!
//! Compilation is fallible and reports malformed schemas through
//! [`SchematicError`]; validation itself only ever answers `true` or `false`.

pub mod compiler;
pub mod config;
pub mod definition;
pub mod error;
pub mod flatten;
pub mod instance;
pub mod loader;
pub mod schematic;
pub mod types;
pub mod validated;
pub mod validator;
pub mod value;

pub use compiler::{Compiler, SchemaCache};
pub use config::{CompilerConfig, EmptySchemaPolicy, LoggingConfig, SchematicConfig};
pub use definition::{NestedDef, PropertyDef, PropertyRecord, SchemaDef, TypeDef};
pub use error::{Result, SchematicError};
pub use instance::{is_instance, InstanceGuard};
pub use schematic::{is_schematic, Schematic};
pub use types::TypeName;
pub use validated::{PropertySummary, TypeAlternative, ValidatedProperty, ValidatedSchema};
pub use validator::validate;
pub use value::{Class, Function, Object, Symbol, Value};
