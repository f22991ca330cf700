use postwire::{Connection, Result, codec::Json};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Profile {
    bio: String,
}

pub async fn main() -> Result<()> {
    let conn = Connection::connect_env().await?;

    let mut batch = conn.create_batch();
    batch
        .add("DROP TABLE IF EXISTS post")
        .add("CREATE TABLE post(id serial PRIMARY KEY, name text, profile jsonb, created_at timestamp DEFAULT now())");
    batch.execute().rows_updated().await?;

    let mut insert = conn.create_statement("INSERT INTO post(name, profile) VALUES ($1, $2)")?;
    for id in 0..24 {
        insert
            .bind(0, format!("post{id}"))?
            .bind_named("$2", Json(Profile { bio: format!("bio of {id}") }))?
            .add()?;
    }

    // every inserted row, one result per binding
    let mut keys = insert.execute_returning_generated_keys().await?;
    while let Some(result) = keys.next().await {
        for id in result?.map(|row, _| Ok(row.get::<i32>("id")?)) {
            tracing::debug!(id = id?, "inserted");
        }
    }

    let mut select = conn.create_statement("SELECT id, name, profile, created_at FROM post WHERE id <= $1")?;
    select.bind(0, 3)?;

    let results = select.execute().await?.collect().await?;
    for result in results {
        let metadata = result.metadata()?;
        tracing::info!(columns = ?metadata.names().collect::<Vec<_>>(), "select");

        for post in result.map(|row, _| {
            let name: String = row.get("name")?;
            let Json(profile) = row.get::<Json<Profile>>("profile")?;
            let created_at: PrimitiveDateTime = row.get(3)?;
            Ok((name, profile, created_at))
        }) {
            let (name, profile, created_at) = post?;
            tracing::info!(name = name.as_str(), bio = profile.bio.as_str(), %created_at, "post");
        }
    }

    let mut results = conn.create_statement("SELECT count(*)::int4 FROM post; SELECT 'end'")?.execute().await?;
    while let Some(result) = results.next().await {
        tracing::info!(rows = ?result?.rows_updated()?, "result");
    }

    conn.close().await?;
    Ok(())
}
