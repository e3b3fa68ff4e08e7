//! Turns operations into wire requests.

use busbar_sf_mapping::{DynRecord, MappingContext, RecordType, SerializeMode};

use crate::error::Result;
use crate::visitor::OperationVisitor;
use crate::transport::WireRequest;

/// Visitor that appends one [`WireRequest`] per visited operation.
pub(crate) struct RequestEncoder<'a> {
    context: &'a MappingContext,
    requests: Vec<WireRequest>,
}

impl<'a> RequestEncoder<'a> {
    pub(crate) fn new(context: &'a MappingContext, capacity: usize) -> Self {
        Self {
            context,
            requests: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn into_requests(self) -> Vec<WireRequest> {
        self.requests
    }

    fn object(&self, record_type: RecordType) -> Result<String> {
        Ok(self
            .context
            .descriptor_of(record_type)?
            .wire_name()
            .to_string())
    }

    fn body(&self, record: &dyn DynRecord, mode: SerializeMode) -> Result<serde_json::Value> {
        Ok(self.context.serializer().serialize_dyn(record, mode)?)
    }
}

impl OperationVisitor for RequestEncoder<'_> {
    fn visit_create(&mut self, record: &dyn DynRecord) -> Result<()> {
        let request = WireRequest::Create {
            object: self.object(record.record_type())?,
            body: self.body(record, SerializeMode::Create)?,
        };
        self.requests.push(request);
        Ok(())
    }

    fn visit_get(&mut self, record_type: RecordType, id: &str) -> Result<()> {
        let descriptor = self.context.descriptor_of(record_type)?;
        let request = WireRequest::Get {
            object: descriptor.wire_name().to_string(),
            id: id.to_string(),
            fields: descriptor
                .scalar_fields()
                .map(|f| f.wire_name().to_string())
                .collect(),
        };
        self.requests.push(request);
        Ok(())
    }

    fn visit_update(&mut self, record: &dyn DynRecord, id: &str) -> Result<()> {
        let request = WireRequest::Update {
            object: self.object(record.record_type())?,
            id: id.to_string(),
            body: self.body(record, SerializeMode::Update)?,
        };
        self.requests.push(request);
        Ok(())
    }

    fn visit_patch(&mut self, record: &dyn DynRecord, id: &str) -> Result<()> {
        let request = WireRequest::Patch {
            object: self.object(record.record_type())?,
            id: id.to_string(),
            body: self.body(record, SerializeMode::Patch)?,
        };
        self.requests.push(request);
        Ok(())
    }

    fn visit_delete(&mut self, record_type: RecordType, id: &str) -> Result<()> {
        let request = WireRequest::Delete {
            object: self.object(record_type)?,
            id: id.to_string(),
        };
        self.requests.push(request);
        Ok(())
    }

    fn visit_query(&mut self, soql: &str, row_type: RecordType) -> Result<()> {
        let soql = self.context.query_expander().expand_for(row_type, soql)?;
        self.requests.push(WireRequest::Query { soql });
        Ok(())
    }
}
