//! Immutable wire schemas for record types and their fields.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::record::RecordType;
use crate::value::FieldValue;

/// Wire key of the type-discriminator field.
pub const ATTRIBUTES: &str = "attributes";

pub(crate) type Reader = Arc<dyn Fn(&dyn Any) -> Option<FieldValue> + Send + Sync>;
pub(crate) type Writer = Arc<dyn Fn(&mut dyn Any, FieldValue) -> Result<()> + Send + Sync>;

/// Semantic type of a mapped field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Boolean,
    Integer,
    Double,
    String,
    DateTime,
    Date,
    /// Id of another record.
    Reference,
    /// A nested record. `None` when the field is polymorphic without a
    /// declared base type.
    Record(Option<RecordType>),
    /// A collection of records.
    RecordCollection(Option<RecordType>),
    /// The synthetic `attributes` discriminator field.
    Attributes,
}

impl ValueType {
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            ValueType::Record(_) | ValueType::RecordCollection(_) | ValueType::Attributes
        )
    }
}

/// How a record-valued field relates to its owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelationshipDirection {
    #[default]
    None,
    /// Holds the owning/parent record; fetched one hop shallow.
    ChildToParent,
    /// Holds child records; fetched only when referenced explicitly.
    ParentToChild,
}

/// One mapped property of a record type.
#[derive(Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) wire_name: String,
    pub(crate) value_type: ValueType,
    pub(crate) insertable: bool,
    pub(crate) updatable: bool,
    pub(crate) relationship: RelationshipDirection,
    pub(crate) candidates: Vec<RecordType>,
    pub(crate) transient: bool,
    pub(crate) first: bool,
    pub(crate) reader: Option<Reader>,
    pub(crate) writer: Option<Writer>,
}

impl FieldDescriptor {
    /// Rust property name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_insertable(&self) -> bool {
        self.insertable
    }

    pub fn is_updatable(&self) -> bool {
        self.updatable
    }

    pub fn relationship(&self) -> RelationshipDirection {
        self.relationship
    }

    /// Concrete types this field may hold at runtime; empty when monomorphic.
    pub fn candidates(&self) -> &[RecordType] {
        &self.candidates
    }

    pub fn is_polymorphic(&self) -> bool {
        !self.candidates.is_empty()
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn is_first(&self) -> bool {
        self.first
    }

    pub fn is_attributes(&self) -> bool {
        self.value_type == ValueType::Attributes
    }

    pub fn is_readable(&self) -> bool {
        self.reader.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.writer.is_some()
    }

    /// Declared record type of a nested or collection field.
    pub fn target(&self) -> Option<RecordType> {
        match self.value_type {
            ValueType::Record(target) | ValueType::RecordCollection(target) => target,
            _ => None,
        }
    }

    /// Every record type this field can reach: its candidates, or its target.
    pub fn referenced_types(&self) -> Vec<RecordType> {
        if self.is_polymorphic() {
            self.candidates.clone()
        } else {
            self.target().into_iter().collect()
        }
    }

    /// Read this field from `record`; `None` when it has no read binding.
    pub fn read(&self, record: &dyn Any) -> Option<FieldValue> {
        self.reader.as_ref().and_then(|read| read(record))
    }

    /// Write `value` into `record`. Fields without a write binding are skipped.
    pub fn write(&self, record: &mut dyn Any, value: FieldValue) -> Result<()> {
        match &self.writer {
            Some(write) => write(record, value),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("value_type", &self.value_type)
            .field("insertable", &self.insertable)
            .field("updatable", &self.updatable)
            .field("relationship", &self.relationship)
            .field("candidates", &self.candidates)
            .field("transient", &self.transient)
            .field("first", &self.first)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Wire schema of one record type.
///
/// Built once per type by the [`MappingContext`](crate::MappingContext) and
/// shared immutably afterwards.
#[derive(Debug, Clone)]
pub struct ObjectDescriptor {
    pub(crate) record_type: RecordType,
    pub(crate) wire_name: String,
    pub(crate) is_custom: bool,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) index: HashMap<String, usize>,
}

impl ObjectDescriptor {
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Name used on the wire, e.g. `Account` or `Invoice__c`.
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    pub fn is_custom(&self) -> bool {
        self.is_custom
    }

    pub fn is_abstract(&self) -> bool {
        self.record_type.is_abstract()
    }

    /// All fields in emission order, transient ones included.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look a field up by wire name.
    pub fn field(&self, wire_name: &str) -> Option<&FieldDescriptor> {
        self.index.get(wire_name).map(|&i| &self.fields[i])
    }

    /// Fields that take part in wire mapping.
    pub fn mapped_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.transient)
    }

    /// Mapped scalar fields, in emission order.
    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.mapped_fields().filter(|f| f.value_type.is_scalar())
    }

    pub fn has_attributes(&self) -> bool {
        self.fields.iter().any(FieldDescriptor::is_attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Account, Contact, Task};
    use crate::MappingContext;

    #[test]
    fn test_value_type_is_scalar() {
        assert!(ValueType::String.is_scalar());
        assert!(ValueType::Reference.is_scalar());
        assert!(!ValueType::Record(None).is_scalar());
        assert!(!ValueType::RecordCollection(None).is_scalar());
        assert!(!ValueType::Attributes.is_scalar());
    }

    #[test]
    fn test_field_lookup_and_targets() {
        let context = MappingContext::new();
        let contact = context.descriptor::<Contact>().unwrap();

        let account = contact.field("Account").unwrap();
        assert_eq!(account.relationship(), RelationshipDirection::ChildToParent);
        assert_eq!(account.target(), Some(RecordType::of::<Account>()));
        assert_eq!(account.referenced_types(), vec![RecordType::of::<Account>()]);
        assert!(!account.is_polymorphic());

        assert!(contact.field("account").is_none());
        assert!(contact.has_attributes());
    }

    #[test]
    fn test_polymorphic_referenced_types() {
        let context = MappingContext::new();
        let task = context.descriptor::<Task>().unwrap();
        let what = task.field("What").unwrap();

        assert!(what.is_polymorphic());
        assert_eq!(what.referenced_types(), what.candidates().to_vec());
    }

    #[test]
    fn test_read_write_through_descriptor() {
        let context = MappingContext::new();
        let descriptor = context.descriptor::<Account>().unwrap();
        let name = descriptor.field("Name").unwrap();

        let mut account = Account::default();
        name.write(&mut account, FieldValue::String("Acme".into()))
            .unwrap();
        assert_eq!(account.name.as_deref(), Some("Acme"));
        assert_eq!(
            name.read(&account),
            Some(FieldValue::String("Acme".into()))
        );
    }
}
