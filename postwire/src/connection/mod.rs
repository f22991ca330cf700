//! The [`Connection`] façade.
use std::sync::{Arc, atomic::AtomicU64};
use tokio::sync::broadcast;

use crate::{
    Result,
    client::{Client, PgClient},
    codec::{Codecs, Parameter},
    error::UsageError,
    postgres::{Diagnostic, backend::NotificationResponse},
    query::{self, Results},
    statement::{Batch, Statement, StatementCache},
    transaction::{IsolationLevel, Mutability, Transaction, TransactionStatus},
};

pub mod config;
pub(crate) mod startup;

pub use config::{Config, ParseError};
pub use startup::UnsupportedAuth;

use TransactionStatus::{Failed, Idle, Open};

/// A postgres connection.
///
/// Statements of one connection are executed in submission order. Prepared statements are
/// cached per connection.
///
/// # Example
///
/// ```no_run
/// # async fn app() -> postwire::Result<()> {
/// let conn = postwire::Connection::connect_env().await?;
///
/// let mut stmt = conn.create_statement("SELECT id, name FROM post WHERE id = $1")?;
/// stmt.bind(0, 420)?;
///
/// let mut results = stmt.execute().await?;
/// while let Some(result) = results.next().await {
///     for post in result?.map(|row, _| Ok((row.get::<i32>("id")?, row.get::<String>(1)?))) {
///         let (id, name) = post?;
///         println!("{id}: {name}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Connection<C: Client = PgClient> {
    client: C,
    cache: StatementCache,
    portals: AtomicU64,
    codecs: Arc<Codecs>,
}

impl<C: Client> Connection<C> {
    /// Connection over given client with builtin codecs.
    pub fn new(client: C) -> Self {
        Self::with_codecs(client, Codecs::default())
    }

    pub fn with_codecs(client: C, codecs: Codecs) -> Self {
        Self {
            client,
            cache: StatementCache::new(),
            portals: AtomicU64::new(0),
            codecs: Arc::new(codecs),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn codecs(&self) -> &Codecs {
        &self.codecs
    }

    pub(crate) fn codecs_arc(&self) -> Arc<Codecs> {
        self.codecs.clone()
    }

    pub fn statement_cache(&self) -> &StatementCache {
        &self.cache
    }

    /// The transaction status reported by the last completed exchange.
    pub fn transaction_status(&self) -> TransactionStatus {
        self.client.transaction_status()
    }

    /// Create a statement, routed by its sql text.
    pub fn create_statement(&self, sql: impl Into<String>) -> Result<Statement<'_, C>> {
        Statement::new(self, sql.into())
    }

    /// Create an empty batch of simple statements.
    pub fn create_batch(&self) -> Batch<'_, C> {
        Batch::new(self)
    }

    pub(crate) async fn execute_extended(
        &self,
        sql: &str,
        bindings: &[Vec<Parameter>],
    ) -> Result<Results> {
        query::extended::execute(
            &self.client,
            &self.cache,
            &self.portals,
            self.codecs.clone(),
            sql,
            bindings,
        )
        .await
    }

    /// Begin a transaction, returning a guard that rolls back on drop.
    pub async fn begin(&self) -> Result<Transaction<'_, C>> {
        self.begin_transaction().await?;
        Ok(Transaction::new(self))
    }

    pub async fn begin_transaction(&self) -> Result<()> {
        self.control("begin a transaction", &[Idle], "BEGIN").await
    }

    pub async fn commit_transaction(&self) -> Result<()> {
        self.control("commit a transaction", &[Open], "COMMIT").await
    }

    pub async fn rollback_transaction(&self) -> Result<()> {
        self.control("rollback a transaction", &[Open, Failed], "ROLLBACK").await
    }

    /// Create a savepoint, `name` is sent verbatim.
    pub async fn create_savepoint(&self, name: &str) -> Result<()> {
        let sql = format!("SAVEPOINT {name}");
        self.control("create a savepoint", &[Open], &sql).await
    }

    pub async fn release_savepoint(&self, name: &str) -> Result<()> {
        let sql = format!("RELEASE SAVEPOINT {name}");
        self.control("release a savepoint", &[Open], &sql).await
    }

    pub async fn rollback_transaction_to_savepoint(&self, name: &str) -> Result<()> {
        let sql = format!("ROLLBACK TO SAVEPOINT {name}");
        self.control("rollback to a savepoint", &[Open, Failed], &sql).await
    }

    /// Set the isolation level of the current transaction, or of the session when there is
    /// none.
    pub async fn set_transaction_isolation_level(&self, level: IsolationLevel) -> Result<()> {
        self.characteristics("set the isolation level", &format!("ISOLATION LEVEL {level}")).await
    }

    /// Set the mutability of the current transaction, or of the session when there is none.
    pub async fn set_transaction_mutability(&self, mutability: Mutability) -> Result<()> {
        self.characteristics("set the transaction mutability", mutability.as_sql()).await
    }

    async fn characteristics(&self, operation: &str, mode: &str) -> Result<()> {
        let sql = match self.transaction_status() {
            Open => format!("SET TRANSACTION {mode}"),
            Idle => format!("SET SESSION CHARACTERISTICS AS TRANSACTION {mode}"),
            Failed => return Err(not_allowed(operation, Failed)),
        };
        self.run(&sql).await
    }

    async fn control(
        &self,
        operation: &str,
        allowed: &[TransactionStatus],
        sql: &str,
    ) -> Result<()> {
        let status = self.transaction_status();
        if !allowed.contains(&status) {
            return Err(not_allowed(operation, status));
        }
        self.run(sql).await
    }

    async fn run(&self, sql: &str) -> Result<()> {
        query::simple::execute(&self.client, self.codecs.clone(), sql).rows_updated().await?;
        Ok(())
    }
}

fn not_allowed(operation: &str, status: TransactionStatus) -> crate::Error {
    let status = match status {
        Idle => "not in a transaction",
        Open => "in a transaction",
        Failed => "in a failed transaction",
    };
    UsageError::new(format!("Cannot {operation}, the connection is {status}")).into()
}

impl Connection<PgClient> {
    /// Connect with a `postgres://` url.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with(&Config::parse(url)?).await
    }

    /// Connect with config from environment variables, see [`Config::from_env`].
    pub async fn connect_env() -> Result<Self> {
        Self::connect_with(&Config::from_env()).await
    }

    pub async fn connect_with(config: &Config) -> Result<Self> {
        Ok(Self::new(PgClient::connect(config).await?))
    }

    /// Returns the last reported value of a run-time parameter, e.g. `server_version`.
    pub fn parameter_status(&self, name: &str) -> Option<String> {
        self.client.parameter_status(name)
    }

    pub fn process_id(&self) -> Option<u32> {
        self.client.process_id()
    }

    pub fn secret_key(&self) -> Option<u32> {
        self.client.secret_key()
    }

    /// Subscribe to notices.
    pub fn notices(&self) -> broadcast::Receiver<Diagnostic> {
        self.client.notices()
    }

    /// Subscribe to notifications of channels this connection `LISTEN` to.
    pub fn notifications(&self) -> broadcast::Receiver<NotificationResponse> {
        self.client.notifications()
    }

    /// Gracefully close the connection, pending executions complete first.
    pub async fn close(self) -> Result<()> {
        self.client.close().await
    }
}

impl<C: Client + std::fmt::Debug> std::fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("client", &self.client)
            .field("statements", &self.cache.len())
            .finish()
    }
}
