use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Pool, Postgres, Row};
use fitroom_common::models::{Avatar, AvatarAnalysis};
use fitroom_common::traits::repository_traits::AvatarRepository;

use crate::Error;

#[derive(Clone)]
pub struct PostgresAvatarRepository {
    pool: Pool<Postgres>,
}

impl PostgresAvatarRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvatarRepository for PostgresAvatarRepository {
    async fn get_avatar(&self, user_id: &str, avatar_id: &str) -> Result<Option<Avatar>, Error> {
        let row = sqlx::query(
            r#"
            SELECT avatar_id, user_id, name, source_photo_key, body_profile, height_cm,
                   created_at, updated_at
            FROM avatar
            WHERE avatar_id = $1
              AND user_id = $2
            "#,
        )
            .bind(avatar_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row {
            Ok(Some(Avatar {
                avatar_id: r.try_get("avatar_id")?,
                user_id: r.try_get("user_id")?,
                name: r.try_get("name")?,
                source_photo_key: r.try_get("source_photo_key")?,
                body_profile: r.try_get("body_profile")?,
                height_cm: r.try_get("height_cm")?,
                created_at: r.try_get("created_at")?,
                updated_at: r.try_get("updated_at")?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn latest_analysis(&self, avatar_id: &str) -> Result<Option<AvatarAnalysis>, Error> {
        let row = sqlx::query(
            r#"
            SELECT analysis_id, avatar_id, model, raw_json, created_at
            FROM avatar_analysis
            WHERE avatar_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
            .bind(avatar_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row {
            Ok(Some(AvatarAnalysis {
                analysis_id: r.try_get("analysis_id")?,
                avatar_id: r.try_get("avatar_id")?,
                model: r.try_get("model")?,
                raw_json: r.try_get("raw_json")?,
                created_at: r.try_get("created_at")?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn insert_analysis(&self, analysis: &AvatarAnalysis) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO avatar_analysis (analysis_id, avatar_id, model, raw_json, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
            .bind(&analysis.analysis_id)
            .bind(&analysis.avatar_id)
            .bind(&analysis.model)
            .bind(&analysis.raw_json)
            .bind(analysis.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_body_profile(&self, avatar_id: &str, profile: &Value) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE avatar
               SET body_profile = $2,
                   updated_at = now()
             WHERE avatar_id = $1
            "#,
        )
            .bind(avatar_id)
            .bind(profile)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
