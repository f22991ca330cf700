use crate::{
    common::ByteStr,
    postgres::{Oid, PgFormat, backend::{FieldDescription, RowDescription}, type_name},
};

/// Description of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    name: ByteStr,
    table_oid: Oid,
    column: i16,
    type_oid: Oid,
    type_size: i16,
    type_modifier: i32,
    format: PgFormat,
}

impl ColumnMetadata {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Object ID of the owning table, zero when the column is not a table column.
    pub fn table_oid(&self) -> Oid {
        self.table_oid
    }

    /// Attribute number within the owning table, zero when the column is not a table column.
    pub fn column(&self) -> i16 {
        self.column
    }

    pub fn type_oid(&self) -> Oid {
        self.type_oid
    }

    /// Returns the postgres name of the column type, if it is a builtin type.
    pub fn type_name(&self) -> Option<&'static str> {
        type_name(self.type_oid)
    }

    /// Data type size, negative for variable width types.
    pub fn type_size(&self) -> i16 {
        self.type_size
    }

    pub fn type_modifier(&self) -> i32 {
        self.type_modifier
    }

    pub fn format(&self) -> PgFormat {
        self.format
    }
}

impl From<FieldDescription> for ColumnMetadata {
    fn from(field: FieldDescription) -> Self {
        Self {
            name: field.name,
            table_oid: field.table_oid,
            column: field.column,
            type_oid: field.type_oid,
            type_size: field.type_size,
            type_modifier: field.type_modifier,
            format: field.format,
        }
    }
}

/// Columns of a result, shared by all of its rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowMetadata {
    columns: Vec<ColumnMetadata>,
}

impl RowMetadata {
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn get(&self, index: usize) -> Option<&ColumnMetadata> {
        self.columns.get(index)
    }

    /// Position of the column with exactly given `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(ColumnMetadata::name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<RowDescription> for RowMetadata {
    fn from(description: RowDescription) -> Self {
        Self { columns: description.fields.into_iter().map(Into::into).collect() }
    }
}
