use postwire::{Connection, IsolationLevel, Result, TransactionStatus};

pub async fn main() -> Result<()> {
    let conn = Connection::connect_env().await?;

    {
        let tx = conn.begin().await?;
        tx.set_transaction_isolation_level(IsolationLevel::Serializable).await?;
        tx.create_statement("DELETE FROM post")?.execute().await?.rows_updated().await?;
        // rolled back on drop
    }

    let tx = conn.begin().await?;
    tx.create_savepoint("before_update").await?;
    let err = tx
        .create_statement("UPDATE post SET name = 1 / 0")?
        .execute()
        .await?
        .rows_updated()
        .await
        .unwrap_err();
    tracing::warn!(code = err.as_database().and_then(|e| e.code()), "update failed");
    assert_eq!(tx.transaction_status(), TransactionStatus::Failed);

    tx.rollback_transaction_to_savepoint("before_update").await?;
    tx.commit().await?;

    conn.close().await?;
    Ok(())
}
