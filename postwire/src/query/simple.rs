//! Simple query flow.
//!
//! <https://www.postgresql.org/docs/current/protocol-flow.html#PROTOCOL-FLOW-SIMPLE-QUERY>
use std::sync::Arc;

use super::Results;
use crate::{
    client::Client,
    codec::Codecs,
    common::verbose,
    postgres::{BackendMessage, Request},
};

/// Every statement of a query string ends with one of these.
fn is_statement_end(message: &BackendMessage) -> bool {
    matches!(
        message,
        BackendMessage::CommandComplete(_)
            | BackendMessage::EmptyQueryResponse(_)
            | BackendMessage::ErrorResponse(_)
    )
}

/// Send `sql` as a single `Query`, it may contain multiple statements.
pub(crate) fn execute<C>(client: &C, codecs: Arc<Codecs>, sql: &str) -> Results
where
    C: Client + ?Sized,
{
    verbose!(sql, "Query");
    Results::new(client.exchange(Request::query(sql)), is_statement_end, codecs)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ErrorKind,
        mock::{TestClient, command_complete, data_row, error_response, row_description},
        postgres::{TransactionStatus, backend::EmptyQueryResponse, oid},
    };

    #[tokio::test]
    async fn one_result_per_statement() {
        let client = TestClient::new();
        client.expect(
            Request::query("SELECT 1; ; UPDATE t SET a = 1"),
            [
                row_description(&[("?column?", oid::INT4)]),
                data_row(&[Some("1")]),
                command_complete("SELECT 1"),
                EmptyQueryResponse.into(),
                command_complete("UPDATE 4"),
            ],
            TransactionStatus::Idle,
        );

        let codecs = Arc::new(Codecs::default());
        let results = execute(&client, codecs, "SELECT 1; ; UPDATE t SET a = 1").collect().await.unwrap();
        assert_eq!(results.len(), 3);

        let one = results[0].metadata().unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(results[1].rows_updated().unwrap(), None);
        assert_eq!(results[2].rows_updated().unwrap(), Some(4));
    }

    #[tokio::test]
    async fn error_is_its_own_result() {
        let client = TestClient::new();
        client.expect(
            Request::query("SELECT 1/0"),
            [row_description(&[("?column?", oid::INT4)]), error_response("22012", "division by zero")],
            TransactionStatus::Idle,
        );

        let mut results = execute(&client, Arc::new(Codecs::default()), "SELECT 1/0");
        let result = results.next().await.unwrap().unwrap();
        let err = result.rows_updated().unwrap_err();
        let ErrorKind::Database(err) = err.kind() else { panic!("{err}") };
        assert_eq!(err.message(), Some("division by zero"));
        assert!(results.next().await.is_none());
    }

    #[tokio::test]
    async fn rows_updated_sums_statements() {
        let client = TestClient::new();
        client.expect(
            Request::query("DELETE FROM a; DELETE FROM b"),
            [command_complete("DELETE 2"), command_complete("DELETE 3")],
            TransactionStatus::Idle,
        );

        let results = execute(&client, Arc::new(Codecs::default()), "DELETE FROM a; DELETE FROM b");
        assert_eq!(results.rows_updated().await.unwrap(), 5);
    }
}
