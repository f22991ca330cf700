use std::env::var;
use postwire::{Config, Connection, Result};

pub async fn main() -> Result<()> {
    if let Ok(url) = var("DATABASE_URL") {
        let conn = Connection::connect(&url).await?;
        conn.create_statement("SELECT 1")?.execute().await?.rows_updated().await?;
        conn.close().await?;
    }

    let conn = Connection::connect_with(&Config::from_env().application_name("postwire-example")).await?;
    tracing::info!(
        server_version = conn.parameter_status("server_version"),
        process_id = conn.process_id(),
        "connected"
    );

    let mut notices = conn.notices();
    conn.create_statement("DO $$ BEGIN RAISE NOTICE 'hello'; END $$")?
        .execute()
        .await?
        .rows_updated()
        .await?;
    if let Ok(notice) = notices.try_recv() {
        tracing::info!(message = notice.message(), "notice");
    }

    conn.close().await?;
    Ok(())
}
