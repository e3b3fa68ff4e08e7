//! Double dispatch over operation kinds.

use busbar_sf_mapping::{DynRecord, RecordType};

use crate::error::Result;

/// One method per operation kind, called from [`Operation::accept`](crate::Operation::accept).
///
/// Lets code handle every kind without downcasting. The executor's request
/// encoder is one implementation.
pub trait OperationVisitor {
    fn visit_create(&mut self, record: &dyn DynRecord) -> Result<()>;

    fn visit_get(&mut self, record_type: RecordType, id: &str) -> Result<()>;

    fn visit_update(&mut self, record: &dyn DynRecord, id: &str) -> Result<()>;

    fn visit_patch(&mut self, record: &dyn DynRecord, id: &str) -> Result<()>;

    fn visit_delete(&mut self, record_type: RecordType, id: &str) -> Result<()>;

    /// `soql` is the unexpanded template; `row_type` is the type rows decode into.
    fn visit_query(&mut self, soql: &str, row_type: RecordType) -> Result<()>;
}
