//! Publishing connection records
//!
//! Auto-post requires a connection that is both marked default and currently
//! connected; the scheduler skips the whole auto-post pass otherwise.

use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// A configured CMS connection
#[derive(Debug, Clone)]
pub struct PublishConnection {
    pub id: Uuid,
    pub name: String,
    pub endpoint_url: String,
    pub is_default: bool,
    pub connected: bool,
}

impl PublishConnection {
    pub fn new(name: String, endpoint_url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            endpoint_url,
            is_default: false,
            connected: false,
        }
    }
}

/// Save a connection (upsert by id)
pub async fn save_connection(pool: &SqlitePool, connection: &PublishConnection) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO publish_connections (id, name, endpoint_url, is_default, connected)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            endpoint_url = excluded.endpoint_url,
            is_default = excluded.is_default,
            connected = excluded.connected
        "#,
    )
    .bind(connection.id.to_string())
    .bind(&connection.name)
    .bind(&connection.endpoint_url)
    .bind(connection.is_default as i64)
    .bind(connection.connected as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Whether any default, currently-connected connection exists
pub async fn has_default_connected(pool: &SqlitePool) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM publish_connections WHERE is_default = 1 AND connected = 1",
    )
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_default_connected_detection() {
        let pool = test_pool().await;
        assert!(!has_default_connected(&pool).await.unwrap());

        let mut conn = PublishConnection::new("main".to_string(), "https://cms.example".to_string());
        conn.is_default = true;
        save_connection(&pool, &conn).await.unwrap();
        // Default but not connected
        assert!(!has_default_connected(&pool).await.unwrap());

        conn.connected = true;
        save_connection(&pool, &conn).await.unwrap();
        assert!(has_default_connected(&pool).await.unwrap());
    }
}
