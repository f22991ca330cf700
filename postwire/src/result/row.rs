use bytes::Bytes;
use std::{fmt, sync::Arc};

use super::RowMetadata;
use crate::codec::{Codecs, Decode, DecodeError};

/// One row of a result.
///
/// Column values are slices of the received buffer, they are released when the row is dropped.
pub struct Row {
    columns: Vec<Option<Bytes>>,
    metadata: Arc<RowMetadata>,
    codecs: Arc<Codecs>,
}

impl Row {
    pub(crate) fn new(
        columns: Vec<Option<Bytes>>,
        metadata: Arc<RowMetadata>,
        codecs: Arc<Codecs>,
    ) -> Result<Self, DecodeError> {
        if columns.len() != metadata.len() {
            return Err(DecodeError::ColumnCount { described: metadata.len(), found: columns.len() });
        }
        Ok(Self { columns, metadata, codecs })
    }

    /// Decode a column by position or by case sensitive name.
    pub fn get<T: Decode>(&self, index: impl Index) -> Result<T, DecodeError> {
        let index = index.position(&self.metadata)?;
        let column = &self.metadata.columns()[index];
        self.codecs.decode(self.columns[index].as_deref(), column.format(), column.type_oid())
    }

    /// Raw column value, [`None`] for NULL.
    pub fn get_raw(&self, index: impl Index) -> Result<Option<&[u8]>, DecodeError> {
        let index = index.position(&self.metadata)?;
        Ok(self.columns[index].as_deref())
    }

    pub fn metadata(&self) -> &RowMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.metadata.names().zip(&self.columns) {
            map.entry(&name, &value.as_deref().map(String::from_utf8_lossy));
        }
        map.finish()
    }
}

/// Type that can index a column of a [`Row`].
pub trait Index: sealed::Sealed {
    /// Returns the column position.
    fn position(self, metadata: &RowMetadata) -> Result<usize, DecodeError>;
}

impl Index for usize {
    fn position(self, metadata: &RowMetadata) -> Result<usize, DecodeError> {
        if self < metadata.len() {
            Ok(self)
        } else {
            Err(DecodeError::IndexOutOfBounds { index: self, len: metadata.len() })
        }
    }
}

impl Index for &str {
    fn position(self, metadata: &RowMetadata) -> Result<usize, DecodeError> {
        metadata.position(self).ok_or_else(|| DecodeError::ColumnNotFound {
            name: self.to_owned(),
            columns: metadata.names().map(String::from).collect(),
        })
    }
}

mod sealed {
    pub trait Sealed { }
    impl Sealed for usize { }
    impl Sealed for &str { }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{mock::row_description, postgres::{BackendMessage, oid}};

    fn metadata() -> Arc<RowMetadata> {
        let BackendMessage::RowDescription(description) =
            row_description(&[("id", oid::INT4), ("name", oid::TEXT)])
        else {
            unreachable!()
        };
        Arc::new(description.into())
    }

    fn row(values: &[Option<&'static str>]) -> Result<Row, DecodeError> {
        let columns = values.iter().map(|v| v.map(|s| Bytes::from_static(s.as_bytes()))).collect();
        Row::new(columns, metadata(), Arc::new(Codecs::default()))
    }

    #[test]
    fn get_by_index_and_name() {
        let row = row(&[Some("7"), None]).unwrap();
        assert_eq!(row.get::<i32>(0).unwrap(), 7);
        assert_eq!(row.get::<i32>("id").unwrap(), 7);
        assert_eq!(row.get::<Option<String>>("name").unwrap(), None);
        assert_eq!(row.metadata().get(1).unwrap().type_name(), Some("text"));
    }

    #[test]
    fn lookup_errors() {
        let row = row(&[Some("7"), Some("ferris")]).unwrap();
        let err = row.get::<i32>("ID").unwrap_err();
        assert_eq!(err.to_string(), "Column name 'ID' does not exist in column names [id, name]");

        let err = row.get::<i32>(2).unwrap_err();
        assert_eq!(err.to_string(), "Column index 2 is larger than the number of columns 2");
    }

    #[test]
    fn column_count_mismatch() {
        let err = row(&[Some("7")]).unwrap_err();
        assert!(matches!(err, DecodeError::ColumnCount { described: 2, found: 1 }));
    }
}
