//! An ordered group of operations submitted together.

use std::fmt;
use std::sync::Arc;

use busbar_sf_mapping::Record;

use crate::kinds::{
    CreateOperation, DeleteOperation, GetOperation, PatchOperation, QueryOperation, UpdateOperation,
};
use crate::operation::{Operation, RecordOperation};

/// Operations in submission order.
///
/// The convenience methods build an operation, add it, and hand back its
/// observer handle.
///
/// ```rust,ignore
/// let mut batch = Batch::new();
/// let created = batch.create(Account { name: Some("Acme".into()), ..Default::default() });
/// let rows = batch.query::<Account>("SELECT * FROM Account WHERE Industry = 'Energy'");
///
/// executor.execute(&batch).await?;
/// println!("new id: {}", created.result()?);
/// ```
#[derive(Clone, Default)]
pub struct Batch {
    operations: Vec<Arc<dyn Operation>>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an already-built operation.
    pub fn push(&mut self, operation: Arc<dyn Operation>) -> &mut Self {
        self.operations.push(operation);
        self
    }

    pub fn create<T: Record>(&mut self, record: T) -> RecordOperation<String> {
        let operation = CreateOperation::new(record);
        let handle = operation.handle();
        self.push(Arc::new(operation));
        handle
    }

    pub fn get<T: Record>(&mut self, id: impl Into<String>) -> RecordOperation<T> {
        let operation = GetOperation::<T>::new(id);
        let handle = operation.handle();
        self.push(Arc::new(operation));
        handle
    }

    pub fn update<T: Record>(&mut self, id: impl Into<String>, record: T) -> RecordOperation<()> {
        let operation = UpdateOperation::new(id, record);
        let handle = operation.handle();
        self.push(Arc::new(operation));
        handle
    }

    pub fn patch<T: Record>(&mut self, id: impl Into<String>, record: T) -> RecordOperation<()> {
        let operation = PatchOperation::new(id, record);
        let handle = operation.handle();
        self.push(Arc::new(operation));
        handle
    }

    pub fn delete<T: Record>(&mut self, id: impl Into<String>) -> RecordOperation<()> {
        let operation = DeleteOperation::<T>::new(id);
        let handle = operation.handle();
        self.push(Arc::new(operation));
        handle
    }

    pub fn query<Row: Record>(&mut self, soql: impl Into<String>) -> RecordOperation<Vec<Row>> {
        self.query_as::<Row, Row>(soql)
    }

    /// Query decoding rows as `Row` and returning them mapped onto `Out`.
    pub fn query_as<Row: Record, Out: Record>(
        &mut self,
        soql: impl Into<String>,
    ) -> RecordOperation<Vec<Out>> {
        let operation = QueryOperation::<Row, Out>::new(soql);
        let handle = operation.handle();
        self.push(Arc::new(operation));
        handle
    }

    pub fn operations(&self) -> &[Arc<dyn Operation>] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.operations.iter().map(|op| (op.kind(), op.id(), op.state())))
            .finish()
    }
}
