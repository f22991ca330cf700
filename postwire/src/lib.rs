//! Postgres wire protocol client
//!
//! # Examples
//!
//! Parameterized statement, prepared once and executed per binding:
//!
//! ```no_run
//! use postwire::Connection;
//!
//! # async fn app() -> postwire::Result<()> {
//! let conn = Connection::connect_env().await?;
//!
//! let mut stmt = conn.create_statement("INSERT INTO post(id, name) VALUES ($1, $2)")?;
//! stmt.bind(0, 1)?.bind(1, "foo")?.add()?;
//! stmt.bind(0, 2)?.bind(1, "bar")?;
//!
//! let inserted = stmt.execute().await?.rows_updated().await?;
//! assert_eq!(inserted, 2);
//! # Ok(())
//! # }
//! ```
//!
//! Simple statements, possibly multiple in one query string:
//!
//! ```no_run
//! # async fn app(conn: postwire::Connection) -> postwire::Result<()> {
//! let mut results = conn
//!     .create_statement("SELECT 420; SELECT 'foo' AS name")?
//!     .execute()
//!     .await?;
//!
//! while let Some(result) = results.next().await {
//!     let result = result?;
//!     println!("{:?}", result.metadata()?);
//!     for row in result.map(|row, _| Ok(format!("{row:?}"))) {
//!         println!("{}", row?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod common;
mod ext;

// Protocol
pub mod postgres;

// Encoding
pub mod codec;

// Component
pub mod statement;
pub mod result;

// Operation
pub mod client;
pub mod query;
pub mod transaction;

// Connection
pub mod connection;

mod error;

#[cfg(test)]
mod mock;

pub use codec::{Codecs, Decode, DecodeError, Encode, EncodeError};
pub use result::{PgResult, Row, RowMetadata, ColumnMetadata};
pub use statement::{Batch, Statement};
pub use query::Results;

pub use client::{Client, PgClient};
pub use connection::{Connection, Config};
pub use transaction::{IsolationLevel, Mutability, Transaction, TransactionStatus};
pub use error::{Error, ErrorKind, Result, UsageError};
