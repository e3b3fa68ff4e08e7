//! The concrete operation kinds.
//!
//! Each kind owns its inputs plus a [`RecordOperation`] handle, and derefs
//! to that handle so its state and outcome can be read directly.

use std::marker::PhantomData;
use std::ops::Deref;

use busbar_sf_mapping::{MappingContext, Record, RecordType};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::{IllegalStateError, Result};
use crate::operation::private::Lifecycle;
use crate::operation::{Operation, OperationFailure, OperationKind, OperationState, RecordOperation};
use crate::transport::WireResponse;
use crate::visitor::OperationVisitor;

type Outcome<R> = std::result::Result<R, OperationFailure>;

fn settle<R: Clone + Send + Sync + 'static>(handle: &RecordOperation<R>, outcome: Outcome<R>) {
    let settled = match outcome {
        Ok(result) => handle.succeed(result),
        Err(failure) => handle.fail(failure),
    };
    if let Err(e) = settled {
        warn!(operation = %handle.id(), error = %e, "Dropped operation completion");
    }
}

/// `Ok(())` for any successful response; kinds with no result body.
fn acknowledged(response: WireResponse) -> Outcome<()> {
    response.map(|_| ()).map_err(OperationFailure::remote)
}

/// Insert a new record. Result: the new record's id.
pub struct CreateOperation<T> {
    record: T,
    handle: RecordOperation<String>,
}

impl<T: Record> CreateOperation<T> {
    pub fn new(record: T) -> Self {
        Self {
            record,
            handle: RecordOperation::new(OperationKind::Create),
        }
    }

    pub fn record(&self) -> &T {
        &self.record
    }

    pub fn handle(&self) -> RecordOperation<String> {
        self.handle.clone()
    }
}

impl<T> Deref for CreateOperation<T> {
    type Target = RecordOperation<String>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<T: Record> Operation for CreateOperation<T> {
    fn id(&self) -> Uuid {
        self.handle.id()
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Create
    }

    fn state(&self) -> OperationState {
        self.handle.state()
    }

    fn accept(&self, visitor: &mut dyn OperationVisitor) -> Result<()> {
        visitor.visit_create(&self.record)
    }
}

impl<T: Record> Lifecycle for CreateOperation<T> {
    fn begin(&self) -> std::result::Result<(), IllegalStateError> {
        self.handle.start()
    }

    fn complete(&self, response: WireResponse, _context: &MappingContext) {
        let outcome = match response {
            Ok(body) => body
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| OperationFailure::deserialization("create response has no id")),
            Err(remote) => Err(OperationFailure::remote(remote)),
        };
        settle(&self.handle, outcome);
    }

    fn abort(&self, failure: OperationFailure) {
        settle(&self.handle, Err(failure));
    }
}

/// Fetch one record by id. Result: the record.
pub struct GetOperation<T> {
    id: String,
    handle: RecordOperation<T>,
}

impl<T: Record> GetOperation<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: RecordOperation::new(OperationKind::Get),
        }
    }

    pub fn record_id(&self) -> &str {
        &self.id
    }

    pub fn handle(&self) -> RecordOperation<T> {
        self.handle.clone()
    }
}

impl<T> Deref for GetOperation<T> {
    type Target = RecordOperation<T>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<T: Record> Operation for GetOperation<T> {
    fn id(&self) -> Uuid {
        self.handle.id()
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Get
    }

    fn state(&self) -> OperationState {
        self.handle.state()
    }

    fn accept(&self, visitor: &mut dyn OperationVisitor) -> Result<()> {
        visitor.visit_get(RecordType::of::<T>(), &self.id)
    }
}

impl<T: Record> Lifecycle for GetOperation<T> {
    fn begin(&self) -> std::result::Result<(), IllegalStateError> {
        self.handle.start()
    }

    fn complete(&self, response: WireResponse, context: &MappingContext) {
        let outcome = response.map_err(OperationFailure::remote).and_then(|body| {
            context
                .deserializer()
                .deserialize::<T>(&body)
                .map_err(|e| OperationFailure::deserialization(e.to_string()))
        });
        settle(&self.handle, outcome);
    }

    fn abort(&self, failure: OperationFailure) {
        settle(&self.handle, Err(failure));
    }
}

/// Overwrite every updatable field of a record, nulls included.
pub struct UpdateOperation<T> {
    id: String,
    record: T,
    handle: RecordOperation<()>,
}

impl<T: Record> UpdateOperation<T> {
    pub fn new(id: impl Into<String>, record: T) -> Self {
        Self {
            id: id.into(),
            record,
            handle: RecordOperation::new(OperationKind::Update),
        }
    }

    pub fn record_id(&self) -> &str {
        &self.id
    }

    pub fn record(&self) -> &T {
        &self.record
    }

    pub fn handle(&self) -> RecordOperation<()> {
        self.handle.clone()
    }
}

impl<T> Deref for UpdateOperation<T> {
    type Target = RecordOperation<()>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<T: Record> Operation for UpdateOperation<T> {
    fn id(&self) -> Uuid {
        self.handle.id()
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Update
    }

    fn state(&self) -> OperationState {
        self.handle.state()
    }

    fn accept(&self, visitor: &mut dyn OperationVisitor) -> Result<()> {
        visitor.visit_update(&self.record, &self.id)
    }
}

impl<T: Record> Lifecycle for UpdateOperation<T> {
    fn begin(&self) -> std::result::Result<(), IllegalStateError> {
        self.handle.start()
    }

    fn complete(&self, response: WireResponse, _context: &MappingContext) {
        settle(&self.handle, acknowledged(response));
    }

    fn abort(&self, failure: OperationFailure) {
        settle(&self.handle, Err(failure));
    }
}

/// Write only the non-null updatable fields of a record.
pub struct PatchOperation<T> {
    id: String,
    record: T,
    handle: RecordOperation<()>,
}

impl<T: Record> PatchOperation<T> {
    pub fn new(id: impl Into<String>, record: T) -> Self {
        Self {
            id: id.into(),
            record,
            handle: RecordOperation::new(OperationKind::Patch),
        }
    }

    pub fn record_id(&self) -> &str {
        &self.id
    }

    pub fn record(&self) -> &T {
        &self.record
    }

    pub fn handle(&self) -> RecordOperation<()> {
        self.handle.clone()
    }
}

impl<T> Deref for PatchOperation<T> {
    type Target = RecordOperation<()>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<T: Record> Operation for PatchOperation<T> {
    fn id(&self) -> Uuid {
        self.handle.id()
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Patch
    }

    fn state(&self) -> OperationState {
        self.handle.state()
    }

    fn accept(&self, visitor: &mut dyn OperationVisitor) -> Result<()> {
        visitor.visit_patch(&self.record, &self.id)
    }
}

impl<T: Record> Lifecycle for PatchOperation<T> {
    fn begin(&self) -> std::result::Result<(), IllegalStateError> {
        self.handle.start()
    }

    fn complete(&self, response: WireResponse, _context: &MappingContext) {
        settle(&self.handle, acknowledged(response));
    }

    fn abort(&self, failure: OperationFailure) {
        settle(&self.handle, Err(failure));
    }
}

/// Delete one record by id.
pub struct DeleteOperation<T> {
    id: String,
    handle: RecordOperation<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> DeleteOperation<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: RecordOperation::new(OperationKind::Delete),
            _record: PhantomData,
        }
    }

    pub fn record_id(&self) -> &str {
        &self.id
    }

    pub fn handle(&self) -> RecordOperation<()> {
        self.handle.clone()
    }
}

impl<T> Deref for DeleteOperation<T> {
    type Target = RecordOperation<()>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<T: Record> Operation for DeleteOperation<T> {
    fn id(&self) -> Uuid {
        self.handle.id()
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Delete
    }

    fn state(&self) -> OperationState {
        self.handle.state()
    }

    fn accept(&self, visitor: &mut dyn OperationVisitor) -> Result<()> {
        visitor.visit_delete(RecordType::of::<T>(), &self.id)
    }
}

impl<T: Record> Lifecycle for DeleteOperation<T> {
    fn begin(&self) -> std::result::Result<(), IllegalStateError> {
        self.handle.start()
    }

    fn complete(&self, response: WireResponse, _context: &MappingContext) {
        settle(&self.handle, acknowledged(response));
    }

    fn abort(&self, failure: OperationFailure) {
        settle(&self.handle, Err(failure));
    }
}

/// Run a SOQL template. Rows decode as `Row`, then map onto `Out` by wire
/// name when the two differ.
///
/// `*` and `Rel.*` in the template are expanded from `Row`'s descriptor.
pub struct QueryOperation<Row, Out = Row> {
    soql: String,
    handle: RecordOperation<Vec<Out>>,
    _row: PhantomData<fn() -> Row>,
}

impl<Row: Record, Out: Record> QueryOperation<Row, Out> {
    pub fn new(soql: impl Into<String>) -> Self {
        Self {
            soql: soql.into(),
            handle: RecordOperation::new(OperationKind::Query),
            _row: PhantomData,
        }
    }

    /// The unexpanded template.
    pub fn soql(&self) -> &str {
        &self.soql
    }

    pub fn handle(&self) -> RecordOperation<Vec<Out>> {
        self.handle.clone()
    }

    fn decode(&self, body: &Value, context: &MappingContext) -> Outcome<Vec<Out>> {
        let records = body
            .get("records")
            .and_then(Value::as_array)
            .ok_or_else(|| OperationFailure::deserialization("query response has no records"))?;

        let deserializer = context.deserializer();
        records
            .iter()
            .map(|document| {
                let row = deserializer.deserialize::<Row>(document)?;
                deserializer.remap::<Out>(&row)
            })
            .collect::<busbar_sf_mapping::Result<Vec<_>>>()
            .map_err(|e| OperationFailure::deserialization(e.to_string()))
    }
}

impl<Row, Out> Deref for QueryOperation<Row, Out> {
    type Target = RecordOperation<Vec<Out>>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<Row: Record, Out: Record> Operation for QueryOperation<Row, Out> {
    fn id(&self) -> Uuid {
        self.handle.id()
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Query
    }

    fn state(&self) -> OperationState {
        self.handle.state()
    }

    fn accept(&self, visitor: &mut dyn OperationVisitor) -> Result<()> {
        visitor.visit_query(&self.soql, RecordType::of::<Row>())
    }
}

impl<Row: Record, Out: Record> Lifecycle for QueryOperation<Row, Out> {
    fn begin(&self) -> std::result::Result<(), IllegalStateError> {
        self.handle.start()
    }

    fn complete(&self, response: WireResponse, context: &MappingContext) {
        let outcome = response
            .map_err(OperationFailure::remote)
            .and_then(|body| self.decode(&body, context));
        settle(&self.handle, outcome);
    }

    fn abort(&self, failure: OperationFailure) {
        settle(&self.handle, Err(failure));
    }
}
