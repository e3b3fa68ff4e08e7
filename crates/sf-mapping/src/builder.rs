//! Turns a record type's declaration into an [`ObjectDescriptor`].
//!
//! This is the per-type half of descriptor construction. It never looks at
//! other types' declarations, so it can run while the registry holds only
//! this type's slot. Cross-type checks (candidate collisions, referenced
//! types building at all) live in the registry's graph validation.

use std::collections::HashMap;

use tracing::debug;

use crate::descriptor::{FieldDescriptor, ObjectDescriptor, ValueType, ATTRIBUTES};
use crate::error::{Error, ErrorKind, Result};
use crate::record::RecordType;
use crate::schema::{derive_wire_name, with_custom_suffix, FieldDeclaration};

pub(crate) fn build(record_type: RecordType) -> Result<ObjectDescriptor> {
    let decl = record_type.declaration();
    let record = record_type.short_name();

    let wire_name = decl
        .wire_name
        .unwrap_or_else(|| record.to_string());
    let wire_name = if decl.custom {
        with_custom_suffix(wire_name)
    } else {
        wire_name
    };

    let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(decl.fields.len() + 1);
    let mut inherited: Vec<bool> = Vec::with_capacity(decl.fields.len() + 1);
    let mut seen: HashMap<String, usize> = HashMap::new();

    if decl.attributes {
        seen.insert(ATTRIBUTES.to_string(), 0);
        fields.push(attributes_field());
        inherited.push(false);
    }

    for field in decl.fields {
        let is_inherited = field.inherited;
        let descriptor = describe_field(record, field)?;

        if descriptor.transient {
            fields.push(descriptor);
            inherited.push(is_inherited);
            continue;
        }

        match seen.get(&descriptor.wire_name) {
            // Most-derived declaration wins, keeping the inherited position.
            Some(&i) if inherited[i] && !is_inherited => {
                fields[i] = descriptor;
                inherited[i] = false;
            }
            // Overridden before `inherit`; the derived declaration stays.
            Some(&i) if is_inherited && !inherited[i] => {}
            Some(_) => {
                return Err(Error::new(ErrorKind::DuplicateWireName {
                    record: record.to_string(),
                    wire_name: descriptor.wire_name,
                }));
            }
            None => {
                seen.insert(descriptor.wire_name.clone(), fields.len());
                fields.push(descriptor);
                inherited.push(is_inherited);
            }
        }
    }

    // Stable partition: leading fields first, declaration order otherwise.
    let (mut ordered, rest): (Vec<_>, Vec<_>) = fields.into_iter().partition(|f| f.first);
    ordered.extend(rest);

    let index = ordered
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.transient)
        .map(|(i, f)| (f.wire_name.clone(), i))
        .collect();

    debug!(
        record = %record_type,
        wire_name = %wire_name,
        fields = ordered.len(),
        "Built object descriptor"
    );

    Ok(ObjectDescriptor {
        record_type,
        wire_name,
        is_custom: decl.custom,
        fields: ordered,
        index,
    })
}

fn attributes_field() -> FieldDescriptor {
    FieldDescriptor {
        name: ATTRIBUTES.to_string(),
        wire_name: ATTRIBUTES.to_string(),
        value_type: ValueType::Attributes,
        insertable: true,
        updatable: true,
        relationship: Default::default(),
        candidates: Vec::new(),
        transient: false,
        first: true,
        reader: None,
        writer: None,
    }
}

fn describe_field(record: &str, field: FieldDeclaration) -> Result<FieldDescriptor> {
    if !field.transient && field.reader.is_none() && field.writer.is_none() {
        return Err(Error::new(ErrorKind::UnreachableField {
            record: record.to_string(),
            field: field.name,
        }));
    }

    let wire_name = match field.wire_name {
        Some(wire) if field.custom => with_custom_suffix(wire),
        Some(wire) => wire,
        None => derive_wire_name(&field.name, field.custom),
    };

    let target = match field.value_type {
        ValueType::Record(target) | ValueType::RecordCollection(target) => target,
        _ => None,
    };

    let candidates = if field.polymorphic {
        let candidates = resolve_candidates(&field.candidates, target);
        if candidates.is_empty() {
            return Err(Error::new(ErrorKind::EmptyCandidates {
                record: record.to_string(),
                field: field.name,
            }));
        }
        if let Some(candidate) = candidates.iter().find(|c| c.is_abstract()) {
            return Err(Error::new(ErrorKind::InvalidCandidate {
                record: record.to_string(),
                field: field.name,
                candidate: candidate.to_string(),
                reason: "abstract types cannot be instantiated".to_string(),
            }));
        }
        candidates
    } else {
        if let Some(target) = target.filter(RecordType::is_abstract) {
            return Err(Error::new(ErrorKind::AbstractTarget {
                record: record.to_string(),
                field: field.name,
                target: target.to_string(),
            }));
        }
        Vec::new()
    };

    Ok(FieldDescriptor {
        name: field.name,
        wire_name,
        value_type: field.value_type,
        insertable: field.insertable,
        updatable: field.updatable,
        relationship: field.relationship,
        candidates,
        transient: field.transient,
        first: field.first,
        reader: field.reader,
        writer: field.writer,
    })
}

/// Explicit candidates win; otherwise the declared base (when concrete)
/// followed by its subtypes.
fn resolve_candidates(explicit: &[RecordType], base: Option<RecordType>) -> Vec<RecordType> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    let Some(base) = base else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    if !base.is_abstract() {
        candidates.push(base);
    }
    for subtype in base.subtypes() {
        if !candidates.contains(&subtype) {
            candidates.push(subtype);
        }
    }
    candidates
}
