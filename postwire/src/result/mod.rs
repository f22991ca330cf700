//! Outcome of one executed statement.
//!
//! - [`PgResult`]
//! - [`Row`]
//! - [`RowMetadata`] and [`ColumnMetadata`]
use bytes::Bytes;
use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use crate::{
    Result,
    codec::Codecs,
    postgres::{BackendMessage, ProtocolError, backend::{DataRow, RowDescription}},
};

mod metadata;
mod row;

pub use metadata::{ColumnMetadata, RowMetadata};
pub use row::{Index, Row};

/// The backend messages answering one statement.
///
/// An `ErrorResponse` among them is reported as [`ErrorKind::Database`][crate::ErrorKind] by
/// every accessor.
pub struct PgResult {
    messages: Vec<BackendMessage>,
    codecs: Arc<Codecs>,
    metadata: OnceLock<Arc<RowMetadata>>,
}

impl PgResult {
    pub(crate) fn new(messages: Vec<BackendMessage>, codecs: Arc<Codecs>) -> Self {
        Self { messages, codecs, metadata: OnceLock::new() }
    }

    /// Number of rows affected, if the command reports one.
    ///
    /// A `COPY TO STDOUT` reports none, its rows are in [`copy_data`][PgResult::copy_data].
    pub fn rows_updated(&self) -> Result<Option<u64>> {
        self.check()?;
        if self.is_copy_out() {
            return Ok(None);
        }
        Ok(self.messages.iter().find_map(|message| match message {
            BackendMessage::CommandComplete(complete) => complete.rows,
            _ => None,
        }))
    }

    /// Tag of the completed command, e.g. `INSERT`.
    pub fn command(&self) -> Option<&str> {
        self.messages.iter().find_map(|message| match message {
            BackendMessage::CommandComplete(complete) => Some(complete.command.as_str()),
            _ => None,
        })
    }

    /// Columns of the result, empty when the statement returns no rows.
    pub fn metadata(&self) -> Result<Arc<RowMetadata>> {
        self.check()?;
        let metadata = self.metadata.get_or_init(|| {
            let description = self.messages.iter().find_map(|message| match message {
                BackendMessage::RowDescription(description) => Some(description.clone()),
                _ => None,
            });
            Arc::new(description.map(RowMetadata::from).unwrap_or_default())
        });
        Ok(metadata.clone())
    }

    /// Project every row with `f`.
    ///
    /// Each row is dropped as soon as `f` returns, its buffers are not retained. An
    /// `ErrorResponse` is yielded as an error in its position, and ends the iteration.
    pub fn map<T, F>(self, f: F) -> Map<F>
    where
        F: FnMut(&Row, &RowMetadata) -> Result<T>,
    {
        Map {
            metadata: self.metadata.into_inner(),
            messages: self.messages.into_iter(),
            codecs: self.codecs,
            f,
            done: false,
        }
    }

    /// Data of a `COPY .. TO STDOUT`.
    pub fn copy_data(&self) -> Result<Vec<Bytes>> {
        self.check()?;
        Ok(self
            .messages
            .iter()
            .filter_map(|message| match message {
                BackendMessage::CopyData(copy) => Some(copy.data.clone()),
                _ => None,
            })
            .collect())
    }

    /// Returns `true` if the server reported an error.
    pub fn is_error(&self) -> bool {
        self.messages.iter().any(|message| matches!(message, BackendMessage::ErrorResponse(_)))
    }

    fn is_copy_out(&self) -> bool {
        self.messages.iter().any(|message| matches!(message, BackendMessage::CopyOutResponse(_)))
    }

    fn check(&self) -> Result<()> {
        match self.messages.iter().find_map(|message| match message {
            BackendMessage::ErrorResponse(err) => Some(err),
            _ => None,
        }) {
            Some(err) => Err(err.clone().into_error().into()),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for PgResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgResult")
            .field("command", &self.command())
            .field("messages", &self.messages.len())
            .finish()
    }
}

/// Rows of a [`PgResult`] projected by a function, returned from [`PgResult::map`].
pub struct Map<F> {
    messages: std::vec::IntoIter<BackendMessage>,
    metadata: Option<Arc<RowMetadata>>,
    codecs: Arc<Codecs>,
    f: F,
    done: bool,
}

impl<F> Map<F> {
    fn project<T>(&mut self, data: DataRow) -> Result<T>
    where
        F: FnMut(&Row, &RowMetadata) -> Result<T>,
    {
        let Some(metadata) = self.metadata.clone() else {
            return Err(ProtocolError::unexpected(RowDescription::MSGTYPE, DataRow::MSGTYPE).into());
        };
        // dropped on return and on unwind
        let row = Row::new(data.columns, metadata, self.codecs.clone())?;
        (self.f)(&row, row.metadata())
    }
}

impl<T, F> Iterator for Map<F>
where
    F: FnMut(&Row, &RowMetadata) -> Result<T>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for message in self.messages.by_ref() {
            match message {
                BackendMessage::RowDescription(description) => {
                    if self.metadata.is_none() {
                        self.metadata = Some(Arc::new(description.into()));
                    }
                }
                BackendMessage::DataRow(data) => return Some(self.project(data)),
                BackendMessage::ErrorResponse(err) => {
                    self.done = true;
                    return Some(Err(err.into_error().into()));
                }
                _ => {}
            }
        }

        self.done = true;
        None
    }
}

impl<F> fmt::Debug for Map<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map").field("remaining", &self.messages.len()).finish()
    }
}

#[cfg(test)]
mod test {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::{
        ErrorKind,
        codec::DecodeError,
        mock::{command_complete, data_row, error_response, row_description},
        postgres::{PgFormat, backend::{CopyData, CopyOutResponse}, oid},
    };

    fn result(messages: Vec<BackendMessage>) -> PgResult {
        PgResult::new(messages, Arc::new(Codecs::default()))
    }

    fn select() -> PgResult {
        result(vec![
            row_description(&[("id", oid::INT4), ("name", oid::TEXT)]),
            data_row(&[Some("1"), Some("ferris")]),
            data_row(&[Some("2"), None]),
            command_complete("SELECT 2"),
        ])
    }

    #[test]
    fn map_rows() {
        let result = select();
        assert_eq!(result.rows_updated().unwrap(), Some(2));
        assert_eq!(result.command(), Some("SELECT"));
        assert_eq!(result.metadata().unwrap().names().collect::<Vec<_>>(), ["id", "name"]);

        let rows = result
            .map(|row, _| Ok((row.get::<i32>(0)?, row.get::<Option<String>>("name")?)))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rows, vec![(1, Some("ferris".to_owned())), (2, None)]);
    }

    #[test]
    fn no_rows() {
        let result = result(vec![command_complete("INSERT 0 3")]);
        assert_eq!(result.rows_updated().unwrap(), Some(3));
        assert!(result.metadata().unwrap().is_empty());
        assert_eq!(result.map(|_, _| Ok(())).count(), 0);
    }

    #[test]
    fn error_surfaces_from_accessors() {
        let result = result(vec![
            row_description(&[("id", oid::INT4)]),
            data_row(&[Some("1")]),
            error_response("22012", "division by zero"),
        ]);
        assert!(result.is_error());
        let err = result.rows_updated().unwrap_err();
        assert_eq!(err.as_database().unwrap().code(), Some("22012"));
        assert!(result.metadata().is_err());

        let mut rows = result.map(|row, _| row.get::<i32>(0).map_err(Into::into));
        assert_eq!(rows.next().unwrap().unwrap(), 1);
        assert!(matches!(rows.next().unwrap().unwrap_err().kind(), ErrorKind::Database(_)));
        assert!(rows.next().is_none());
    }

    #[test]
    fn column_count_is_checked() {
        let result = result(vec![
            row_description(&[("id", oid::INT4), ("name", oid::TEXT)]),
            data_row(&[Some("1")]),
            command_complete("SELECT 1"),
        ]);
        let err = result.map(|_, _| Ok(())).next().unwrap().unwrap_err();
        let ErrorKind::Decode(DecodeError::ColumnCount { described, found }) = err.kind() else {
            panic!("{err}")
        };
        assert_eq!((*described, *found), (2, 1));
    }

    #[test]
    fn copy_out() {
        let result = result(vec![
            CopyOutResponse { format: PgFormat::Text, column_formats: vec![PgFormat::Text; 2] }.into(),
            BackendMessage::CopyData(CopyData { data: Bytes::from_static(b"1\tferris\n") }),
            BackendMessage::CopyData(CopyData { data: Bytes::from_static(b"2\tcorro\n") }),
            command_complete("COPY 2"),
        ]);
        assert_eq!(result.copy_data().unwrap(), vec![&b"1\tferris\n"[..], &b"2\tcorro\n"[..]]);
        assert_eq!(result.rows_updated().unwrap(), None);
        assert_eq!(result.command(), Some("COPY"));
    }

    fn shared_column() -> (Bytes, PgResult) {
        let value = Bytes::from(b"42".to_vec());
        let result = result(vec![
            row_description(&[("n", oid::INT4)]),
            DataRow { columns: vec![Some(value.clone())] }.into(),
            command_complete("SELECT 1"),
        ]);
        (value, result)
    }

    #[test]
    fn row_released_after_projection() {
        let (column, result) = shared_column();
        assert!(!column.is_unique());

        let mut rows = result.map(|row, _| {
            Ok(row.get::<i32>(0)?)
        });
        assert_eq!(rows.next().unwrap().unwrap(), 42);
        assert!(column.is_unique());
        assert!(rows.next().is_none());
    }

    #[test]
    fn row_released_when_projection_fails() {
        let (column, result) = shared_column();
        let mut rows = result.map(|row, _| Ok(row.get::<String>(0)?));
        assert!(rows.next().unwrap().is_err());
        assert!(column.is_unique());

        let (column, result) = shared_column();
        let mut rows = result.map(|_, _| -> Result<()> { panic!("projection panicked") });
        assert!(catch_unwind(AssertUnwindSafe(|| rows.next())).is_err());
        assert!(column.is_unique());
    }
}
