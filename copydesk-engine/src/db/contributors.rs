//! Contributor persistence (read-mostly)

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::Contributor;

/// Save a contributor profile (upsert by id)
pub async fn save_contributor(pool: &SqlitePool, contributor: &Contributor) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO contributors (id, name, expertise_areas, content_type_preferences, style_profile)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            expertise_areas = excluded.expertise_areas,
            content_type_preferences = excluded.content_type_preferences,
            style_profile = excluded.style_profile
        "#,
    )
    .bind(contributor.id.to_string())
    .bind(&contributor.name)
    .bind(serde_json::to_string(&contributor.expertise_areas)?)
    .bind(serde_json::to_string(&contributor.content_type_preferences)?)
    .bind(&contributor.style_profile)
    .execute(pool)
    .await?;

    Ok(())
}

/// All contributors in insertion order (stable matcher tie-break depends on
/// deterministic ordering)
pub async fn load_all_contributors(pool: &SqlitePool) -> Result<Vec<Contributor>> {
    let rows = sqlx::query("SELECT * FROM contributors ORDER BY rowid ASC")
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|row| {
            let id_str: String = row.get("id");
            let areas_json: String = row.get("expertise_areas");
            let prefs_json: String = row.get("content_type_preferences");
            Ok(Contributor {
                id: Uuid::parse_str(&id_str)?,
                name: row.get("name"),
                expertise_areas: serde_json::from_str(&areas_json)?,
                content_type_preferences: serde_json::from_str(&prefs_json)?,
                style_profile: row.get("style_profile"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_roundtrip_preserves_order() {
        let pool = test_pool().await;
        let first = Contributor::new("First".to_string(), vec!["savings".to_string()], vec![]);
        let second = Contributor::new("Second".to_string(), vec!["loans".to_string()], vec![]);
        save_contributor(&pool, &first).await.unwrap();
        save_contributor(&pool, &second).await.unwrap();

        let all = load_all_contributors(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "First");
        assert_eq!(all[1].name, "Second");
    }
}
