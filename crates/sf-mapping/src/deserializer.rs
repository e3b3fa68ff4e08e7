//! JSON wire documents to records.

use serde_json::Value;

use crate::descriptor::{FieldDescriptor, ValueType};
use crate::error::{Error, ErrorKind, Result};
use crate::record::{AnyRecord, DynRecord, Record, RecordType};
use crate::registry::MappingContext;
use crate::serializer::SerializeMode;
use crate::value::{self, FieldValue};

/// Populates records from wire documents.
///
/// Unknown keys are ignored. Transient, attributes and write-less fields are
/// never written. Polymorphic values are resolved through
/// [`PolymorphicResolver`](crate::PolymorphicResolver).
#[derive(Debug, Clone, Copy)]
pub struct Deserializer<'a> {
    context: &'a MappingContext,
}

impl<'a> Deserializer<'a> {
    pub fn new(context: &'a MappingContext) -> Self {
        Self { context }
    }

    pub fn deserialize<T: Record>(&self, document: &Value) -> Result<T> {
        self.deserialize_dyn(RecordType::of::<T>(), document)?
            .downcast::<T>()
            .map_err(|found| {
                Error::new(ErrorKind::TypeMismatch {
                    field: None,
                    expected: std::any::type_name::<T>(),
                    found: found.record_type().to_string(),
                })
            })
    }

    /// Deserialize into a type known only at runtime.
    ///
    /// Abstract types are resolved to one of their subtypes by discriminator.
    pub fn deserialize_dyn(&self, record_type: RecordType, document: &Value) -> Result<AnyRecord> {
        let object = document
            .as_object()
            .ok_or_else(|| Error::new(ErrorKind::NotAnObject(record_type.to_string())))?;

        let record_type = if record_type.is_abstract() {
            self.context
                .resolver()
                .resolve(&record_type.subtypes(), document)?
        } else {
            record_type
        };

        let descriptor = self.context.descriptor_of(record_type)?;
        let mut record = record_type.instantiate();

        for (key, wire) in object {
            let Some(field) = descriptor.field(key) else {
                continue;
            };
            if field.is_attributes() || !field.is_writable() {
                continue;
            }
            let value = self.from_wire(field, wire).map_err(|e| e.in_field(key))?;
            field
                .write(record.as_dyn_mut().as_any_mut(), value)
                .map_err(|e| e.in_field(key))?;
        }

        Ok(record)
    }

    /// Copy `source` into `Out` field by field, matching on wire names.
    ///
    /// Used to project query rows onto a narrower result type.
    pub fn remap<Out: Record>(&self, source: &dyn DynRecord) -> Result<Out> {
        if let Some(same) = source.as_any().downcast_ref::<Out>() {
            return Ok(same.clone());
        }
        let document = self
            .context
            .serializer()
            .serialize_dyn(source, SerializeMode::Full)?;
        self.deserialize(&document)
    }

    fn from_wire(&self, field: &FieldDescriptor, wire: &Value) -> Result<FieldValue> {
        if wire.is_null() {
            return Ok(FieldValue::Null);
        }

        match field.value_type() {
            ValueType::Record(_) => self.nested(field, wire).map(FieldValue::Record),
            ValueType::RecordCollection(_) => {
                let items = wire
                    .as_array()
                    .or_else(|| wire.get("records").and_then(Value::as_array))
                    .ok_or_else(|| value::wire_mismatch("array or query result", wire))?;
                items
                    .iter()
                    .map(|item| self.nested(field, item))
                    .collect::<Result<Vec<_>>>()
                    .map(FieldValue::Records)
            }
            value_type => value::scalar_from_wire(value_type, wire),
        }
    }

    fn nested(&self, field: &FieldDescriptor, wire: &Value) -> Result<AnyRecord> {
        let target = if field.is_polymorphic() {
            self.context.resolver().resolve(field.candidates(), wire)?
        } else {
            field
                .target()
                .ok_or_else(|| value::wire_mismatch("scalar", wire))?
        };
        self.deserialize_dyn(target, wire)
    }
}

impl MappingContext {
    pub fn deserializer(&self) -> Deserializer<'_> {
        Deserializer::new(self)
    }
}
