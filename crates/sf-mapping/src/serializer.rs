//! Records to JSON wire documents.

use serde_json::{json, Map, Value};

use crate::descriptor::{FieldDescriptor, RelationshipDirection, ATTRIBUTES};
use crate::error::Result;
use crate::record::{DynRecord, Record};
use crate::registry::MappingContext;
use crate::value::FieldValue;

/// Which fields a payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializeMode {
    /// Every readable mapped field, read-only ones and child collections included.
    #[default]
    Full,
    /// Insertable fields.
    Create,
    /// Updatable fields, nulls included so they clear the remote value.
    Update,
    /// Updatable fields that are not null.
    Patch,
}

impl SerializeMode {
    fn includes(self, field: &FieldDescriptor) -> bool {
        let children = field.relationship() == RelationshipDirection::ParentToChild;
        match self {
            SerializeMode::Full => true,
            SerializeMode::Create => field.is_insertable() && !children,
            SerializeMode::Update | SerializeMode::Patch => field.is_updatable() && !children,
        }
    }
}

/// Turns records into wire documents using their descriptors.
///
/// The `attributes` discriminator, when declared, is always the first key.
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'a> {
    context: &'a MappingContext,
}

impl<'a> Serializer<'a> {
    pub fn new(context: &'a MappingContext) -> Self {
        Self { context }
    }

    pub fn serialize<T: Record>(&self, record: &T, mode: SerializeMode) -> Result<Value> {
        self.serialize_dyn(record, mode)
    }

    /// Serialize a record whose type is only known at runtime.
    ///
    /// Nested records recurse with the same mode and their own descriptor.
    pub fn serialize_dyn(&self, record: &dyn DynRecord, mode: SerializeMode) -> Result<Value> {
        let descriptor = self.context.descriptor_of(record.record_type())?;
        let mut object = Map::with_capacity(descriptor.fields().len());

        for field in descriptor.mapped_fields() {
            if field.is_attributes() {
                object.insert(
                    ATTRIBUTES.to_string(),
                    json!({ "type": descriptor.wire_name() }),
                );
                continue;
            }
            if !mode.includes(field) {
                continue;
            }
            let Some(value) = field.read(record.as_any()) else {
                continue;
            };
            if mode == SerializeMode::Patch && value.is_null() {
                continue;
            }
            object.insert(field.wire_name().to_string(), self.to_wire(value, mode)?);
        }

        Ok(Value::Object(object))
    }

    fn to_wire(&self, value: FieldValue, mode: SerializeMode) -> Result<Value> {
        match value {
            FieldValue::Record(record) => self.serialize_dyn(record.as_dyn(), mode),
            FieldValue::Records(records) => records
                .iter()
                .map(|record| self.serialize_dyn(record.as_dyn(), mode))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            scalar => Ok(scalar.scalar_to_wire()),
        }
    }
}

impl MappingContext {
    pub fn serializer(&self) -> Serializer<'_> {
        Serializer::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::{AnyRecord, Reference};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn keys(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    fn account() -> Account {
        Account {
            id: Some("001000000000001AAA".into()),
            name: Some("Acme".into()),
            industry: None,
            annual_revenue: Some(1_500_000.0),
            created_date: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()),
            contacts: vec![Contact {
                last_name: Some("Doe".into()),
                ..Default::default()
            }],
            dirty: true,
        }
    }

    #[test]
    fn test_full_mode() {
        let context = MappingContext::new();
        let value = context
            .serializer()
            .serialize(&account(), SerializeMode::Full)
            .unwrap();

        assert_eq!(
            keys(&value),
            vec!["attributes", "Id", "Name", "Industry", "AnnualRevenue", "CreatedDate", "Contacts"]
        );
        assert_eq!(value["attributes"], json!({"type": "Account"}));
        assert_eq!(value["Industry"], Value::Null);
        assert_eq!(value["CreatedDate"], json!("2024-01-15T10:30:00.000+0000"));
        assert_eq!(value["Contacts"][0]["attributes"], json!({"type": "Contact"}));
        assert_eq!(value["Contacts"][0]["LastName"], json!("Doe"));
        assert!(value.get("Dirty").is_none());
    }

    #[test]
    fn test_create_mode_skips_read_only_and_children() {
        let context = MappingContext::new();
        let value = context
            .serializer()
            .serialize(&account(), SerializeMode::Create)
            .unwrap();

        assert_eq!(
            keys(&value),
            vec!["attributes", "Name", "Industry", "AnnualRevenue"]
        );
    }

    #[test]
    fn test_update_and_patch_modes() {
        let context = MappingContext::new();
        let contact = Contact {
            id: Some("003000000000001AAA".into()),
            audit: Audit {
                owner_id: Some("005000000000001AAA".into()),
                last_modified_date: Some(Utc::now()),
            },
            last_name: Some("Doe".into()),
            account_id: Some(Reference::new("001000000000001AAA")),
            ..Default::default()
        };

        let update = context
            .serializer()
            .serialize(&contact, SerializeMode::Update)
            .unwrap();
        assert_eq!(
            keys(&update),
            vec!["attributes", "OwnerId", "FirstName", "LastName", "Email", "AccountId"]
        );
        assert_eq!(update["FirstName"], Value::Null);
        assert_eq!(update["AccountId"], json!("001000000000001AAA"));

        let patch = context
            .serializer()
            .serialize(&contact, SerializeMode::Patch)
            .unwrap();
        assert_eq!(
            keys(&patch),
            vec!["attributes", "OwnerId", "LastName", "AccountId"]
        );
    }

    #[test]
    fn test_nested_and_polymorphic_records() {
        let context = MappingContext::new();
        let task = Task {
            subject: Some("Call".into()),
            what: Some(AnyRecord::new(Opportunity {
                name: Some("Big Deal".into()),
                close_date: NaiveDate::from_ymd_opt(2024, 6, 30),
                ..Default::default()
            })),
            ..Default::default()
        };

        let value = context
            .serializer()
            .serialize(&task, SerializeMode::Full)
            .unwrap();
        assert_eq!(value["What"]["attributes"], json!({"type": "Opportunity"}));
        assert_eq!(value["What"]["CloseDate"], json!("2024-06-30"));
        assert_eq!(value["Who"], Value::Null);

        // Parent references are read-only.
        let create = context
            .serializer()
            .serialize(&task, SerializeMode::Create)
            .unwrap();
        assert!(create.get("What").is_none());
    }

    #[test]
    fn test_custom_object() {
        let context = MappingContext::new();
        let invoice = Invoice {
            name: Some("INV-1".into()),
            amount: Some(99.5),
            issued: NaiveDate::from_ymd_opt(2024, 3, 1),
        };
        let value = context
            .serializer()
            .serialize(&invoice, SerializeMode::Create)
            .unwrap();
        assert_eq!(
            value,
            json!({
                "attributes": {"type": "Invoice__c"},
                "Name": "INV-1",
                "Amount__c": 99.5,
                "Issued_On__c": "2024-03-01"
            })
        );
    }

    #[test]
    fn test_write_only_field_not_emitted() {
        let context = MappingContext::new();
        let one_way = OneWay {
            computed: Some("x".into()),
            secret: Some("hidden".into()),
        };
        let value = context
            .serializer()
            .serialize(&one_way, SerializeMode::Full)
            .unwrap();
        assert_eq!(value, json!({"Computed": "x"}));
    }

    #[test]
    fn test_mapping_error_propagates() {
        let context = MappingContext::new();
        let err = context
            .serializer()
            .serialize(&DuplicateWire::default(), SerializeMode::Full)
            .unwrap_err();
        assert!(err.is_mapping());
    }
}
