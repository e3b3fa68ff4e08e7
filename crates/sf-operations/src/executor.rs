//! Validates, encodes and dispatches batches.

use std::collections::HashSet;
use std::sync::Arc;

use busbar_sf_mapping::MappingContext;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::batch::Batch;
use crate::config::ExecutorConfig;
use crate::encoder::RequestEncoder;
use crate::error::{IllegalStateError, Result};
use crate::operation::{Operation, OperationFailure, OperationKind, OperationState};
use crate::transport::{Transport, TransportError, WireRequest, WireResponse};

type Entry = (Arc<dyn Operation>, WireRequest);

/// Runs batches of operations through a [`Transport`].
///
/// Nothing is sent unless every operation in the batch is fresh, appears
/// once, and encodes. Requests then go out in submission order, in chunks
/// no larger than both the configured and the transport's batch size.
/// Each operation completes with its own result or failure; a failed chunk
/// fails only its own operations.
///
/// # Example
///
/// ```rust,ignore
/// use busbar_sf_operations::{Batch, Executor};
///
/// let executor = Executor::new(transport);
///
/// let mut batch = Batch::new();
/// let id = batch.create(account);
/// let contacts = batch.query::<Contact>("SELECT * FROM Contact LIMIT 10");
///
/// executor.execute(&batch).await?;
/// println!("{} -> {} contacts", id.result()?, contacts.result()?.len());
/// ```
pub struct Executor<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    transport: T,
    context: Arc<MappingContext>,
    config: ExecutorConfig,
}

impl<T> Clone for Executor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport> Executor<T> {
    /// Executor with default configuration over the global mapping context.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ExecutorConfig::default())
    }

    pub fn with_config(transport: T, config: ExecutorConfig) -> Self {
        Self::with_context(transport, config, MappingContext::global())
    }

    pub fn with_context(transport: T, config: ExecutorConfig, context: Arc<MappingContext>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                context,
                config,
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.inner.config
    }

    pub fn context(&self) -> &Arc<MappingContext> {
        &self.inner.context
    }

    /// Run `batch` and wait until every operation has completed.
    ///
    /// Errors only when the batch is rejected before sending. Per-operation
    /// failures are read from the operations.
    #[instrument(skip(self, batch), fields(operations = batch.len()))]
    pub async fn execute(&self, batch: &Batch) -> Result<()> {
        let entries = self.prepare(batch)?;
        self.dispatch(entries).await;
        Ok(())
    }

    /// Validate and encode `batch` now, then dispatch it on a spawned task.
    ///
    /// Must be called within a Tokio runtime.
    #[instrument(skip(self, batch), fields(operations = batch.len()))]
    pub fn submit(&self, batch: Batch) -> Result<JoinHandle<()>> {
        let entries = self.prepare(&batch)?;
        let executor = self.clone();
        Ok(tokio::spawn(async move { executor.dispatch(entries).await }))
    }

    fn prepare(&self, batch: &Batch) -> Result<Vec<Entry>> {
        let operations = batch.operations();

        let mut seen = HashSet::with_capacity(operations.len());
        for operation in operations {
            if operation.state() != OperationState::Created {
                return Err(IllegalStateError::new(format!(
                    "{} operation {} was already submitted ({:?})",
                    operation.kind(),
                    operation.id(),
                    operation.state()
                ))
                .into());
            }
            if !seen.insert(operation.id()) {
                return Err(IllegalStateError::new(format!(
                    "{} operation {} appears more than once in the batch",
                    operation.kind(),
                    operation.id()
                ))
                .into());
            }
        }

        let mut encoder = RequestEncoder::new(&self.inner.context, operations.len());
        for operation in operations {
            operation.accept(&mut encoder)?;
        }
        let requests = encoder.into_requests();

        for (i, operation) in operations.iter().enumerate() {
            if let Err(e) = operation.begin() {
                // Lost a race with another submission of the same operation.
                let failure =
                    OperationFailure::transport(&TransportError::new("batch was not dispatched"));
                for started in &operations[..i] {
                    started.abort(failure.clone());
                }
                return Err(e.into());
            }
        }

        Ok(operations.iter().cloned().zip(requests).collect())
    }

    async fn dispatch(&self, entries: Vec<Entry>) {
        if entries.is_empty() {
            return;
        }

        let chunk_size = self
            .inner
            .config
            .max_batch_size
            .min(self.inner.transport.max_batch_size())
            .max(1);

        let mut chunks = Vec::new();
        let mut entries = entries.into_iter();
        loop {
            let chunk: Vec<Entry> = entries.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            chunks.push(chunk);
        }

        debug!(chunks = chunks.len(), chunk_size, "Dispatching batch");

        let sends: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| self.dispatch_chunk(index, chunk).boxed())
            .collect();

        stream::iter(sends)
            .buffered(self.inner.config.max_concurrent_batches.max(1))
            .collect::<Vec<()>>()
            .await;
    }

    async fn dispatch_chunk(&self, index: usize, chunk: Vec<Entry>) {
        let (operations, requests): (Vec<_>, Vec<_>) = chunk.into_iter().unzip();
        let expected = requests.len();
        debug!(chunk = index, requests = expected, "Sending chunk");

        let responses = match self.inner.transport.send(requests).await {
            Ok(responses) if responses.len() == expected => responses,
            Ok(responses) => {
                let err = TransportError::new(format!(
                    "expected {} responses, got {}",
                    expected,
                    responses.len()
                ));
                warn!(chunk = index, error = %err, "Chunk response count mismatch");
                abort_all(&operations, &err);
                return;
            }
            Err(err) => {
                warn!(chunk = index, error = %err, "Chunk failed");
                abort_all(&operations, &err);
                return;
            }
        };

        for (operation, response) in operations.iter().zip(responses) {
            let response =
                if operation.kind() == OperationKind::Query && self.inner.config.follow_query_pages {
                    match self.follow_pages(response).await {
                        Ok(response) => response,
                        Err(err) => {
                            operation.abort(OperationFailure::transport(&err));
                            continue;
                        }
                    }
                } else {
                    response
                };
            operation.complete(response, &self.inner.context);
        }
    }

    /// Fetch and append remaining pages of a query response.
    async fn follow_pages(&self, response: WireResponse) -> std::result::Result<WireResponse, TransportError> {
        let mut page = match response {
            Ok(page) => page,
            Err(failure) => return Ok(Err(failure)),
        };

        while let Some(next_records_url) = next_records_url(&page) {
            debug!(next = %next_records_url, "Fetching next query page");
            let mut responses = self
                .inner
                .transport
                .send(vec![WireRequest::QueryMore { next_records_url }])
                .await?;

            let next = match responses.pop() {
                Some(next) if responses.is_empty() => next,
                _ => {
                    return Err(TransportError::new(
                        "expected exactly one response for the next query page",
                    ))
                }
            };
            let next = match next {
                Ok(next) => next,
                Err(failure) => return Ok(Err(failure)),
            };
            if !merge_page(&mut page, next) {
                return Err(TransportError::new("malformed query page"));
            }
        }

        Ok(Ok(page))
    }
}

fn abort_all(operations: &[Arc<dyn Operation>], err: &TransportError) {
    let failure = OperationFailure::transport(err);
    for operation in operations {
        operation.abort(failure.clone());
    }
}

fn next_records_url(page: &Value) -> Option<String> {
    if page.get("done").and_then(Value::as_bool) != Some(false) {
        return None;
    }
    page.get("nextRecordsUrl")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Append `next`'s records to `page` and take over its paging state.
fn merge_page(page: &mut Value, next: Value) -> bool {
    let (Some(page), Value::Object(mut next)) = (page.as_object_mut(), next) else {
        return false;
    };

    if let Some(Value::Array(more)) = next.remove("records") {
        match page.get_mut("records") {
            Some(Value::Array(records)) => records.extend(more),
            _ => {
                page.insert("records".to_string(), Value::Array(more));
            }
        }
    }
    page.insert(
        "done".to_string(),
        next.remove("done").unwrap_or(Value::Bool(true)),
    );
    match next.remove("nextRecordsUrl") {
        Some(url) => page.insert("nextRecordsUrl".to_string(), url),
        None => page.remove("nextRecordsUrl"),
    };
    true
}
