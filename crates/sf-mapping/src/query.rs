//! Wildcard expansion for SOQL templates.
//!
//! Templates are otherwise opaque text. Two markers are rewritten:
//!
//! - a standalone `*` becomes the root type's select list;
//! - `Path.*` (e.g. `Account.*` or `Account.Owner.*`) walks record fields by
//!   wire name and becomes the target type's scalar fields, each prefixed
//!   with the path.
//!
//! A token is delimited by whitespace and commas only, so function calls such
//! as `COUNT(*)` pass through unchanged. Single-quoted literals are skipped.

use crate::descriptor::{FieldDescriptor, ObjectDescriptor, RelationshipDirection, ValueType};
use crate::error::{Error, ErrorKind, Result};
use crate::record::{Record, RecordType};
use crate::registry::MappingContext;

/// Rewrites `*` markers in query templates into explicit field lists.
#[derive(Debug, Clone, Copy)]
pub struct QueryExpander<'a> {
    context: &'a MappingContext,
}

impl<'a> QueryExpander<'a> {
    pub fn new(context: &'a MappingContext) -> Self {
        Self { context }
    }

    /// Expand `template` with `T` as the root type.
    ///
    /// ```rust,ignore
    /// let soql = context
    ///     .query_expander()
    ///     .expand::<Contact>("SELECT * FROM Contact WHERE LastName = 'O''Neil'")?;
    /// ```
    pub fn expand<T: Record>(&self, template: &str) -> Result<String> {
        self.expand_for(RecordType::of::<T>(), template)
    }

    pub fn expand_for(&self, root: RecordType, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len() * 2);
        let mut token: Option<usize> = None;
        let mut in_literal = false;
        let mut escaped = false;

        for (i, c) in template.char_indices() {
            if in_literal {
                out.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '\'' {
                    in_literal = false;
                }
                continue;
            }

            let delimiter = c.is_whitespace() || c == ',' || c == '\'';
            if !delimiter {
                token.get_or_insert(i);
                continue;
            }
            if let Some(start) = token.take() {
                self.expand_token(root, &template[start..i], &mut out)?;
            }
            out.push(c);
            in_literal = c == '\'';
        }
        if let Some(start) = token {
            self.expand_token(root, &template[start..], &mut out)?;
        }

        Ok(out)
    }

    /// Wire field names a bare `*` expands to for `root`.
    ///
    /// Scalars by wire name, embedded records by wire name, and one hop
    /// (`Rel.Field`) through each child-to-parent reference. Collections are
    /// never included.
    pub fn select_list(&self, root: RecordType) -> Result<Vec<String>> {
        let descriptor = self.context.descriptor_of(root)?;
        let mut fields = Vec::new();

        for field in descriptor.mapped_fields() {
            match (field.value_type(), field.relationship()) {
                (ValueType::Attributes, _) | (ValueType::RecordCollection(_), _) => {}
                (ValueType::Record(_), RelationshipDirection::ChildToParent) => {
                    for scalar in self.reachable_scalars(field)? {
                        fields.push(format!("{}.{}", field.wire_name(), scalar));
                    }
                }
                _ => fields.push(field.wire_name().to_string()),
            }
        }

        Ok(fields)
    }

    fn expand_token(&self, root: RecordType, token: &str, out: &mut String) -> Result<()> {
        let body = token.trim_end_matches(')');
        let tail = &token[body.len()..];

        if body == "*" {
            let fields = self.select_list(root)?;
            if fields.is_empty() {
                return Err(unresolved(root, body, "type has no selectable fields"));
            }
            out.push_str(&fields.join(", "));
        } else if let Some(path) = body.strip_suffix(".*").filter(|p| !p.is_empty()) {
            let fields = self.path_fields(root, path)?;
            out.push_str(&fields.join(", "));
        } else {
            out.push_str(body);
        }

        out.push_str(tail);
        Ok(())
    }

    /// `Path.Field` for every scalar field at the end of `path`.
    fn path_fields(&self, root: RecordType, path: &str) -> Result<Vec<String>> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut descriptor = self.context.descriptor_of(root)?;
        let mut scalars = Vec::new();

        for (i, segment) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            let field = descriptor
                .field(segment)
                .ok_or_else(|| unresolved(root, path, &format!("no field '{}'", segment)))?;

            if !matches!(field.value_type(), ValueType::Record(_)) {
                return Err(unresolved(
                    root,
                    path,
                    &format!("'{}' is not a single-record field", segment),
                ));
            }

            if field.is_polymorphic() {
                if !last {
                    return Err(unresolved(
                        root,
                        path,
                        &format!("cannot traverse polymorphic field '{}'", segment),
                    ));
                }
                scalars = self.reachable_scalars(field)?;
                break;
            }

            let target = field
                .target()
                .ok_or_else(|| unresolved(root, path, "field has no record type"))?;
            descriptor = self.context.descriptor_of(target)?;
            if last {
                scalars = scalar_names(&descriptor);
            }
        }

        if scalars.is_empty() {
            return Err(unresolved(root, path, "target has no scalar fields"));
        }
        Ok(scalars
            .into_iter()
            .map(|scalar| format!("{}.{}", path, scalar))
            .collect())
    }

    /// Scalar fields of a record field's target, or the scalars common to
    /// every candidate when it is polymorphic.
    fn reachable_scalars(&self, field: &FieldDescriptor) -> Result<Vec<String>> {
        let mut types = field.referenced_types().into_iter();
        let Some(first) = types.next() else {
            return Ok(Vec::new());
        };

        let first = self.context.descriptor_of(first)?;
        let mut common = scalar_names(&first);
        for other in types {
            let other = self.context.descriptor_of(other)?;
            common.retain(|name| {
                other
                    .field(name)
                    .is_some_and(|f| f.value_type().is_scalar())
            });
        }
        Ok(common)
    }
}

fn scalar_names(descriptor: &ObjectDescriptor) -> Vec<String> {
    descriptor
        .scalar_fields()
        .map(|f| f.wire_name().to_string())
        .collect()
}

fn unresolved(root: RecordType, path: &str, reason: &str) -> Error {
    Error::new(ErrorKind::UnresolvedWildcard {
        record: root.to_string(),
        path: path.to_string(),
        reason: reason.to_string(),
    })
}

impl MappingContext {
    pub fn query_expander(&self) -> QueryExpander<'_> {
        QueryExpander::new(self)
    }
}
