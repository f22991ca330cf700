//! Structured server errors and notices.
use std::{fmt, ops::Deref};

use super::field::{Field, FieldType};

/// Diagnostic fields reported by the server in an error or notice.
#[derive(Clone, PartialEq, Eq)]
pub struct Diagnostic {
    fields: Vec<Field>,
}

macro_rules! accessor {
    ($($(#[$doc:meta])* $name:ident => $kind:ident;)*) => {
        impl Diagnostic {
            $(
                $(#[$doc])*
                pub fn $name(&self) -> Option<&str> {
                    self.get(FieldType::$kind)
                }
            )*
        }
    };
}

impl Diagnostic {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// All fields in the order the server sent them.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the first field value of given type.
    pub fn get(&self, kind: FieldType) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.kind == kind)
            .map(|field| field.value.as_str())
    }
}

accessor! {
    /// The SQLSTATE code for the error.
    code => Code;
    column_name => ColumnName;
    constraint_name => ConstraintName;
    data_type_name => DataTypeName;
    /// Secondary error message carrying more detail about the problem.
    detail => Detail;
    file => File;
    /// Suggestion what to do about the problem.
    hint => Hint;
    internal_position => InternalPosition;
    internal_query => InternalQuery;
    line => Line;
    /// The primary human-readable error message.
    message => Message;
    /// Error cursor position as an index into the original query string, in characters.
    position => Position;
    routine => Routine;
    schema_name => SchemaName;
    /// `ERROR`, `FATAL`, or `PANIC` for errors, `WARNING`, `NOTICE`, `DEBUG`, `INFO`, or `LOG`
    /// for notices, possibly localized.
    severity_localized => SeverityLocalized;
    /// Same as [`severity_localized`][Diagnostic::severity_localized] but never localized.
    ///
    /// Only sent by servers since 9.6.
    severity_non_localized => SeverityNonLocalized;
    table_name => TableName;
    /// Context in which the error occurred, including procedural language call stack.
    where_context => Where;
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = self
            .severity_non_localized()
            .or(self.severity_localized())
            .unwrap_or("ERROR");
        write!(f, "{severity}: {}", self.message().unwrap_or("unknown error"))?;
        if let Some(code) = self.code() {
            write!(f, " ({code})")?;
        }
        if let Some(detail) = self.detail() {
            write!(f, ", {detail}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_map();
        for field in &self.fields {
            dbg.entry(&field.kind, &field.value);
        }
        dbg.finish()
    }
}

/// An error reported by the server through `ErrorResponse`.
///
/// Every server reported failure surfaces as this type, use [`Deref`] to access the
/// [`Diagnostic`] fields.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseError {
    diagnostic: Diagnostic,
}

impl DatabaseError {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { diagnostic: Diagnostic::new(fields) }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        self.diagnostic
    }
}

impl From<Diagnostic> for DatabaseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self { diagnostic }
    }
}

impl Deref for DatabaseError {
    type Target = Diagnostic;

    fn deref(&self) -> &Diagnostic {
        &self.diagnostic
    }
}

impl std::error::Error for DatabaseError { }

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.diagnostic, f)
    }
}

impl fmt::Debug for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DatabaseError").field(&self.diagnostic).finish()
    }
}
