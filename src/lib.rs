//! # busbar-sf-records
//!
//! Declarative record mapping and batched operations for Salesforce.
//!
//! Record types declare their wire schema once. The mapping layer derives
//! payloads, query field lists and response decoding from that declaration,
//! and the operations layer groups create/get/update/patch/delete/query
//! requests into batches sent over a pluggable transport.
//!
//! ## Crates
//!
//! - **busbar-sf-mapping** - Descriptors, serializer, deserializer, polymorphic resolver, SOQL wildcard expansion
//! - **busbar-sf-operations** - Operations, batches, executor and the `Transport` trait
//! - **busbar-sf-rest** - Composite Batch transport over the REST API (feature `rest`, on by default)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use busbar_sf_records::{Batch, CompositeBatchTransport, Executor, Record, Schema};
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
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = Executor::new(CompositeBatchTransport::from_env()?);
//!
//!     let mut batch = Batch::new();
//!     let created = batch.create(Account { name: Some("Acme".into()), ..Default::default() });
//!     let accounts = batch.query::<Account>("SELECT * FROM Account LIMIT 10");
//!     executor.execute(&batch).await?;
//!
//!     println!("created {}", created.result()?);
//!     for account in accounts.result()? {
//!         println!("{:?}", account.name);
//!     }
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
pub use busbar_sf_mapping as mapping;
pub use busbar_sf_operations as operations;
#[cfg(feature = "rest")]
pub use busbar_sf_rest as rest;

// Re-export commonly used types at the top level
pub use busbar_sf_mapping::{AnyRecord, MappingContext, Record, RecordType, Reference, Schema, SerializeMode};
pub use busbar_sf_operations::{
    Batch, Executor, ExecutorConfig, OperationFailure, OperationState, RecordOperation, Transport,
};
#[cfg(feature = "rest")]
pub use busbar_sf_rest::{CompositeBatchTransport, RestConfig};
