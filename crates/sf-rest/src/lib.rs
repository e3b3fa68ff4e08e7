//! # sf-rest
//!
//! Salesforce REST transport for `busbar-sf-operations`.
//!
//! [`CompositeBatchTransport`] sends each group of record requests as one
//! call to the Composite Batch resource (`/services/data/vXX.X/composite/batch`),
//! up to 25 subrequests at a time.
//!
//! ## Features
//!
//! - **Create / Get / Update / Patch / Delete** - mapped onto `sobjects` subrequests
//! - **Query** - `query?q=` subrequests, with `nextRecordsUrl` paging
//! - **Per-entry failures** - Salesforce error arrays become [`RemoteFailure`]s
//! - **Input validation** - object names, ids and field lists are checked
//!   before they reach a URL
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_operations::{Batch, Executor};
//! use busbar_sf_rest::CompositeBatchTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = CompositeBatchTransport::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token_here",
//!     )?;
//!     let executor = Executor::new(transport);
//!
//!     let mut batch = Batch::new();
//!     let accounts = batch.query::<Account>("SELECT * FROM Account LIMIT 10");
//!     executor.execute(&batch).await?;
//!
//!     for account in accounts.result()? {
//!         println!("{:?}", account);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`RemoteFailure`]: busbar_sf_operations::RemoteFailure

mod composite;
mod config;
mod error;
pub mod security;
mod transport;

pub use composite::{
    ApiError, CompositeBatchRequest, CompositeBatchResponse, CompositeBatchSubrequest,
    CompositeBatchSubresponse, MAX_BATCH_SUBREQUESTS,
};
pub use config::{RestConfig, RestConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use transport::CompositeBatchTransport;

/// Default Salesforce API version.
pub const DEFAULT_API_VERSION: &str = "62.0";

/// Default User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("busbar-sf-rest/", env!("CARGO_PKG_VERSION"));
