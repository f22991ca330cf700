//! Transaction control.
//!
//! - [`TransactionStatus`]
//! - [`IsolationLevel`] and [`Mutability`]
//! - the RAII [`Transaction`] guard
use std::{fmt, ops::Deref};

use crate::{
    Result,
    client::Client,
    common::verbose,
    connection::Connection,
    postgres::Request,
};

pub use crate::postgres::TransactionStatus;

/// Transaction isolation level.
///
/// <https://www.postgresql.org/docs/current/transaction-iso.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Whether a transaction may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    ReadOnly,
    ReadWrite,
}

impl Mutability {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadOnly => "READ ONLY",
            Self::ReadWrite => "READ WRITE",
        }
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// An RAII implementation of transaction scope.
///
/// To begin a transaction, use [`Connection::begin`].
///
/// To commit transaction, use [`Transaction::commit`].
///
/// If not committed, when this structure is dropped, the transaction is rolled back. The
/// rollback is submitted without waiting for its completion.
///
/// # Example
///
/// ```no_run
/// # async fn test(conn: postwire::Connection) -> postwire::Result<()> {
/// let tx = conn.begin().await?;
///
/// tx.create_statement("INSERT INTO post(name) VALUES ('foo')")?
///     .execute()
///     .await?
///     .rows_updated()
///     .await?;
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
pub struct Transaction<'c, C: Client> {
    conn: &'c Connection<C>,
    finished: bool,
}

impl<'c, C: Client> Transaction<'c, C> {
    pub(crate) fn new(conn: &'c Connection<C>) -> Self {
        Self { conn, finished: false }
    }

    /// Commit transaction.
    pub async fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.conn.commit_transaction().await
    }

    /// Rollback transaction.
    pub async fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.conn.rollback_transaction().await
    }
}

impl<C: Client> Deref for Transaction<'_, C> {
    type Target = Connection<C>;

    fn deref(&self) -> &Self::Target {
        self.conn
    }
}

impl<C: Client> Drop for Transaction<'_, C> {
    fn drop(&mut self) {
        if self.finished || self.conn.transaction_status() == TransactionStatus::Idle {
            return;
        }
        verbose!("Rollback on drop");
        // replies are discarded
        drop(self.conn.client().exchange(Request::query("ROLLBACK")));
    }
}

impl<C: Client> fmt::Debug for Transaction<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction").field("finished", &self.finished).finish()
    }
}
