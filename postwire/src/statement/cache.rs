//! Per connection prepared statement cache.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, atomic::AtomicU64},
};
use tokio::sync::OnceCell;

use super::StatementName;
use crate::{
    Result,
    client::Client,
    common::verbose,
    postgres::{
        BackendMessage, DatabaseError, Oid, ProtocolError, Request,
        backend::{ParseComplete, ReadyForQuery},
        frontend::{Parse, Sync},
    },
};

/// A preparation outcome, the server rejecting the statement is shared with every waiter.
type Prepared = std::result::Result<StatementName, DatabaseError>;

type Slot = Arc<OnceCell<Prepared>>;

type Key = (String, Vec<Oid>);

/// Maps sql text and parameter types to a server side prepared statement.
///
/// `Parse` is sent once per distinct key, concurrent callers of an unresolved key await the
/// same preparation. Prepared statements are never evicted, a statement the server rejected is
/// removed so a later call prepares it again.
#[derive(Debug, Default)]
pub struct StatementCache {
    entries: Mutex<HashMap<Key, Slot>>,
    ids: AtomicU64,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the prepared statement name of `sql` with parameter `types`, preparing it when
    /// it is not yet prepared.
    pub async fn get_name<C>(&self, client: &C, sql: &str, types: &[Oid]) -> Result<StatementName>
    where
        C: Client + ?Sized,
    {
        let key = (sql.to_owned(), types.to_vec());

        // check and insert under one lock
        let slot = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone();

        match slot.get_or_try_init(|| self.prepare(client, sql, types)).await? {
            Ok(name) => Ok(name.clone()),
            Err(err) => {
                self.evict(&key, &slot);
                Err(err.clone().into())
            }
        }
    }

    /// Number of cached entries, including preparations in flight.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(&self, key: &Key, slot: &Slot) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        // a retry may already own a new slot
        if entries.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            entries.remove(key);
        }
    }

    async fn prepare<C>(&self, client: &C, sql: &str, types: &[Oid]) -> Result<Prepared>
    where
        C: Client + ?Sized,
    {
        let name = StatementName::next(&self.ids);
        verbose!(%name, sql, "Parse");

        let mut request = Request::new();
        request.push(Parse { prepare_name: name.as_str(), sql, oids: types }).push(Sync);

        let mut responses = client.exchange(request);
        let mut parsed = false;
        let mut error = None;

        while let Some(message) = responses.next().await {
            match message? {
                BackendMessage::ParseComplete(_) => parsed = true,
                BackendMessage::ErrorResponse(err) => {
                    error.get_or_insert(err.into_error());
                }
                f => return Err(ProtocolError::unexpected_phase(f.msgtype(), "parse").into()),
            }
        }

        match (error, parsed) {
            (Some(err), _) => Ok(Err(err)),
            (None, true) => Ok(Ok(name)),
            (None, false) => {
                Err(ProtocolError::unexpected(ParseComplete::MSGTYPE, ReadyForQuery::MSGTYPE).into())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        mock::{TestClient, error_response},
        postgres::{TransactionStatus, oid},
    };

    fn parse(name: &str, sql: &str, types: &[Oid]) -> Request {
        let mut request = Request::new();
        request.push(Parse { prepare_name: name, sql, oids: types }).push(Sync);
        request
    }

    #[tokio::test]
    async fn single_flight() {
        let sql = "SELECT * FROM t WHERE id = $1";
        let client = TestClient::new();
        client.expect(parse("S_0", sql, &[oid::INT4]), [ParseComplete.into()], TransactionStatus::Idle);

        let cache = StatementCache::new();
        let calls = (0..8).map(|_| cache.get_name(&client, sql, &[oid::INT4]));
        let names = futures::future::join_all(calls).await;

        assert_eq!(client.exchanges(), 1);
        for name in names {
            assert_eq!(name.unwrap().as_str(), "S_0");
        }
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn keyed_by_parameter_types() {
        let sql = "SELECT $1";
        let client = TestClient::new();
        client
            .expect(parse("S_0", sql, &[oid::INT4]), [ParseComplete.into()], TransactionStatus::Idle)
            .expect(parse("S_1", sql, &[oid::VARCHAR]), [ParseComplete.into()], TransactionStatus::Idle);

        let cache = StatementCache::new();
        assert_eq!(cache.get_name(&client, sql, &[oid::INT4]).await.unwrap().as_str(), "S_0");
        assert_eq!(cache.get_name(&client, sql, &[oid::VARCHAR]).await.unwrap().as_str(), "S_1");
        assert_eq!(cache.get_name(&client, sql, &[oid::INT4]).await.unwrap().as_str(), "S_0");
        assert_eq!(client.exchanges(), 2);
    }

    #[tokio::test]
    async fn failed_preparation_is_shared_then_evicted() {
        let sql = "SELEC $1";
        let client = TestClient::new();
        client
            .expect(parse("S_0", sql, &[]), [error_response("42601", "syntax error")], TransactionStatus::Idle)
            .expect(parse("S_1", sql, &[]), [error_response("42601", "syntax error")], TransactionStatus::Idle);

        let cache = StatementCache::new();
        let (a, b) = tokio::join!(cache.get_name(&client, sql, &[]), cache.get_name(&client, sql, &[]));
        assert_eq!(a.unwrap_err().as_database().unwrap().code(), Some("42601"));
        assert_eq!(b.unwrap_err().as_database().unwrap().code(), Some("42601"));
        assert_eq!(client.exchanges(), 1);
        assert!(cache.is_empty());

        // prepared again
        assert!(cache.get_name(&client, sql, &[]).await.is_err());
        assert_eq!(client.exchanges(), 2);
    }
}
