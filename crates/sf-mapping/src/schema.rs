//! Declaration API used by [`Record::declare`].
//!
//! A declaration registers each mapped property with its accessors and tags.
//! It replaces reflection: the builder only ever sees what is declared here.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::descriptor::{Reader, RelationshipDirection, ValueType, Writer};
use crate::error::{Error, ErrorKind, Result};
use crate::record::{AnyRecord, Record, RecordType};
use crate::value::{self, FieldType, FieldValue};

/// Collects the declared fields and type-level tags of a record type.
pub struct Schema<T> {
    decl: Declaration,
    _marker: PhantomData<fn(T) -> T>,
}

/// Type-erased output of a [`Schema`].
#[derive(Default)]
pub(crate) struct Declaration {
    pub(crate) wire_name: Option<String>,
    pub(crate) custom: bool,
    pub(crate) attributes: bool,
    pub(crate) fields: Vec<FieldDeclaration>,
}

#[derive(Clone)]
pub(crate) struct FieldDeclaration {
    pub(crate) name: String,
    pub(crate) wire_name: Option<String>,
    pub(crate) value_type: ValueType,
    pub(crate) insertable: bool,
    pub(crate) updatable: bool,
    pub(crate) relationship: RelationshipDirection,
    pub(crate) candidates: Vec<RecordType>,
    pub(crate) polymorphic: bool,
    pub(crate) transient: bool,
    pub(crate) first: bool,
    pub(crate) custom: bool,
    pub(crate) inherited: bool,
    pub(crate) reader: Option<Reader>,
    pub(crate) writer: Option<Writer>,
}

impl FieldDeclaration {
    fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            wire_name: None,
            value_type,
            insertable: true,
            updatable: true,
            relationship: RelationshipDirection::None,
            candidates: Vec::new(),
            polymorphic: false,
            transient: false,
            first: false,
            custom: false,
            inherited: false,
            reader: None,
            writer: None,
        }
    }
}

pub(crate) fn declaration_of<T: Record>() -> Declaration {
    let mut schema = Schema::<T>::new();
    T::declare(&mut schema);
    schema.decl
}

impl<T: Record> Schema<T> {
    fn new() -> Self {
        Self {
            decl: Declaration::default(),
            _marker: PhantomData,
        }
    }

    /// Override the wire name, which otherwise defaults to the type's name.
    pub fn wire_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.decl.wire_name = Some(name.into());
        self
    }

    /// Mark as a custom object: the wire name gets the `__c` suffix.
    pub fn custom(&mut self) -> &mut Self {
        self.decl.custom = true;
        self
    }

    /// Emit the `attributes` type discriminator as the first wire key.
    pub fn attributes(&mut self) -> &mut Self {
        self.decl.attributes = true;
        self
    }

    /// Declare a scalar field.
    pub fn field<V: FieldType>(&mut self, name: &str) -> FieldBuilder<'_, T, V> {
        self.push(
            FieldDeclaration::new(name, V::value_type()),
            V::into_value,
            V::from_value,
        )
    }

    /// Declare a nested record field of a concrete type.
    pub fn record<R: Record>(&mut self, name: &str) -> FieldBuilder<'_, T, Option<R>> {
        self.push(
            FieldDeclaration::new(name, ValueType::Record(Some(RecordType::of::<R>()))),
            value::record_into_value::<R>,
            value::record_from_value::<R>,
        )
    }

    /// Declare a collection of records of a concrete type.
    pub fn records<R: Record>(&mut self, name: &str) -> FieldBuilder<'_, T, Vec<R>> {
        self.push(
            FieldDeclaration::new(
                name,
                ValueType::RecordCollection(Some(RecordType::of::<R>())),
            ),
            value::records_into_value::<R>,
            value::records_from_value::<R>,
        )
    }

    /// Declare a polymorphic record field typed with the base `B`.
    ///
    /// Candidates default to `B::subtypes()`; tag explicit ones with
    /// [`FieldBuilder::candidates`].
    pub fn any_record<B: Record>(&mut self, name: &str) -> FieldBuilder<'_, T, Option<AnyRecord>> {
        let mut decl =
            FieldDeclaration::new(name, ValueType::Record(Some(RecordType::of::<B>())));
        decl.polymorphic = true;
        self.push(
            decl,
            value::any_record_into_value,
            value::any_record_from_value,
        )
    }

    /// Declare a polymorphic record field with no common base type.
    ///
    /// Candidates must be tagged with [`FieldBuilder::candidates`].
    pub fn polymorphic(&mut self, name: &str) -> FieldBuilder<'_, T, Option<AnyRecord>> {
        let mut decl = FieldDeclaration::new(name, ValueType::Record(None));
        decl.polymorphic = true;
        self.push(
            decl,
            value::any_record_into_value,
            value::any_record_from_value,
        )
    }

    /// Declare a collection whose elements are polymorphic over `B`.
    pub fn any_records<B: Record>(&mut self, name: &str) -> FieldBuilder<'_, T, Vec<AnyRecord>> {
        let mut decl = FieldDeclaration::new(
            name,
            ValueType::RecordCollection(Some(RecordType::of::<B>())),
        );
        decl.polymorphic = true;
        self.push(
            decl,
            value::any_records_into_value,
            value::any_records_from_value,
        )
    }

    /// Pull in every field declared by `B`, reached through `project`.
    ///
    /// Fields declared on `Self` with the same wire name as an inherited one
    /// replace it in place.
    pub fn inherit<B: Record>(
        &mut self,
        project: fn(&T) -> &B,
        project_mut: fn(&mut T) -> &mut B,
    ) -> &mut Self {
        let base = declaration_of::<B>();
        self.decl.attributes |= base.attributes;

        for mut field in base.fields {
            field.inherited = true;
            field.reader = field.reader.map(|read| {
                Arc::new(move |record: &dyn Any| {
                    record
                        .downcast_ref::<T>()
                        .and_then(|record| read(project(record) as &dyn Any))
                }) as Reader
            });
            field.writer = field.writer.map(|write| {
                Arc::new(move |record: &mut dyn Any, value: FieldValue| -> Result<()> {
                    match record.downcast_mut::<T>() {
                        Some(record) => write(project_mut(record) as &mut dyn Any, value),
                        None => Err(wrong_record::<T>()),
                    }
                }) as Writer
            });
            self.decl.fields.push(field);
        }
        self
    }

    fn push<V>(
        &mut self,
        decl: FieldDeclaration,
        into_value: fn(V) -> FieldValue,
        from_value: fn(FieldValue) -> Result<V>,
    ) -> FieldBuilder<'_, T, V> {
        self.decl.fields.push(decl);
        let index = self.decl.fields.len() - 1;
        FieldBuilder {
            decl: &mut self.decl.fields[index],
            into_value,
            from_value,
            _marker: PhantomData,
        }
    }
}

fn wrong_record<T: 'static>() -> Error {
    Error::new(ErrorKind::TypeMismatch {
        field: None,
        expected: std::any::type_name::<T>(),
        found: "a different record type".to_string(),
    })
}

/// Tags and accessors of one declared field.
pub struct FieldBuilder<'a, T, V> {
    decl: &'a mut FieldDeclaration,
    into_value: fn(V) -> FieldValue,
    from_value: fn(FieldValue) -> Result<V>,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T: Record, V: 'static> FieldBuilder<'_, T, V> {
    /// Read binding.
    pub fn get(self, get: impl Fn(&T) -> V + Send + Sync + 'static) -> Self {
        let into_value = self.into_value;
        self.decl.reader = Some(Arc::new(move |record: &dyn Any| {
            record
                .downcast_ref::<T>()
                .map(|record| into_value(get(record)))
        }));
        self
    }

    /// Write binding.
    pub fn set(self, set: impl Fn(&mut T, V) + Send + Sync + 'static) -> Self {
        let from_value = self.from_value;
        self.decl.writer = Some(Arc::new(move |record: &mut dyn Any, value: FieldValue| -> Result<()> {
            let record = record.downcast_mut::<T>().ok_or_else(wrong_record::<T>)?;
            set(record, from_value(value)?);
            Ok(())
        }));
        self
    }

    /// Explicit wire name, instead of one derived from the property name.
    pub fn wire(self, wire_name: impl Into<String>) -> Self {
        self.decl.wire_name = Some(wire_name.into());
        self
    }

    pub fn insertable(self, insertable: bool) -> Self {
        self.decl.insertable = insertable;
        self
    }

    pub fn updatable(self, updatable: bool) -> Self {
        self.decl.updatable = updatable;
        self
    }

    /// Never emitted on create, update or patch payloads.
    pub fn read_only(self) -> Self {
        self.insertable(false).updatable(false)
    }

    /// Excluded from wire mapping entirely.
    pub fn transient(self) -> Self {
        self.decl.transient = true;
        self
    }

    /// Emit before all fields not marked first.
    pub fn first(self) -> Self {
        self.decl.first = true;
        self
    }

    /// Custom field: the derived wire name gets the `__c` suffix.
    pub fn custom(self) -> Self {
        self.decl.custom = true;
        self
    }

    /// Reference to the owning record (child-to-parent).
    pub fn parent(self) -> Self {
        self.decl.relationship = RelationshipDirection::ChildToParent;
        self
    }

    /// Collection of child records (parent-to-child).
    pub fn children(self) -> Self {
        self.decl.relationship = RelationshipDirection::ParentToChild;
        self
    }
}

/// Field values that can hold more than one record type.
pub trait PolymorphicValue {}

impl PolymorphicValue for Option<AnyRecord> {}
impl PolymorphicValue for Vec<AnyRecord> {}

impl<T: Record, V: PolymorphicValue + 'static> FieldBuilder<'_, T, V> {
    /// Concrete types this field may resolve to, in match order.
    pub fn candidates(self, candidates: impl IntoIterator<Item = RecordType>) -> Self {
        for candidate in candidates {
            if !self.decl.candidates.contains(&candidate) {
                self.decl.candidates.push(candidate);
            }
        }
        self
    }
}

/// Derive a wire name from a Rust property name: `billing_city` → `BillingCity`.
pub(crate) fn derive_wire_name(name: &str, custom: bool) -> String {
    let mut wire = String::with_capacity(name.len() + 3);
    for part in name.split('_').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            wire.extend(first.to_uppercase());
            wire.push_str(chars.as_str());
        }
    }
    if custom {
        with_custom_suffix(wire)
    } else {
        wire
    }
}

pub(crate) fn with_custom_suffix(name: String) -> String {
    if name.ends_with("__c") {
        name
    } else {
        format!("{}__c", name)
    }
}
