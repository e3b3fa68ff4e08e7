//! # sf-mapping
//!
//! Declarative mapping between Rust structs and Salesforce records.
//!
//! Record types describe their wire schema once, in [`Record::declare`].
//! Everything else is driven by the resulting [`ObjectDescriptor`]s:
//!
//! - [`MappingContext`] builds, validates and caches descriptors per type
//! - [`Serializer`] turns records into create/update/patch payloads
//! - [`Deserializer`] populates records from API responses
//! - [`PolymorphicResolver`] picks the concrete type of polymorphic lookups
//! - [`QueryExpander`] rewrites `SELECT *` and `Rel.*` in SOQL templates
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Record::declare(&mut Schema<Self>)                 │
//! │  - Fields, accessors, wire names, relationship tags         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   MappingContext                            │
//! │  - One ObjectDescriptor per type, built on first lookup     │
//! │  - Validates the graph reachable through record fields      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Serializer / Deserializer / QueryExpander                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use busbar_sf_mapping::{MappingContext, Record, Schema, SerializeMode};
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Account {
//!     id: Option<String>,
//!     name: Option<String>,
//! }
//!
//! impl Record for Account {
//!     fn declare(schema: &mut Schema<Self>) {
//!         schema.attributes();
//!         schema
//!             .field::<Option<String>>("id")
//!             .get(|a| a.id.clone())
//!             .set(|a, v| a.id = v)
//!             .read_only();
//!         schema
//!             .field::<Option<String>>("name")
//!             .get(|a| a.name.clone())
//!             .set(|a, v| a.name = v);
//!     }
//! }
//!
//! let context = MappingContext::new();
//! let account = Account { id: None, name: Some("Acme".into()) };
//! let body = context.serializer().serialize(&account, SerializeMode::Create).unwrap();
//! assert_eq!(body.to_string(), r#"{"attributes":{"type":"Account"},"Name":"Acme"}"#);
//!
//! let soql = context.query_expander().expand::<Account>("SELECT * FROM Account").unwrap();
//! assert_eq!(soql, "SELECT Id, Name FROM Account");
//! ```

mod builder;
mod descriptor;
mod deserializer;
mod error;
mod query;
mod record;
mod registry;
mod resolver;
mod schema;
mod serializer;
mod value;

#[cfg(test)]
mod fixtures;

pub use descriptor::{FieldDescriptor, ObjectDescriptor, RelationshipDirection, ValueType, ATTRIBUTES};
pub use deserializer::Deserializer;
pub use error::{Error, ErrorCategory, ErrorKind, Result};
pub use query::QueryExpander;
pub use record::{AnyRecord, DynRecord, Record, RecordType};
pub use registry::MappingContext;
pub use resolver::PolymorphicResolver;
pub use schema::{FieldBuilder, PolymorphicValue, Schema};
pub use serializer::{SerializeMode, Serializer};
pub use value::{
    format_datetime, parse_datetime, FieldType, FieldValue, Reference, DATETIME_FORMAT,
    DATE_FORMAT,
};
