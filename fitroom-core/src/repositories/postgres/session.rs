use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use fitroom_common::traits::auth_traits::SessionResolver;

use crate::Error;

/// Looks bearer tokens up in the `session` table written by the auth service.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: Pool<Postgres>,
}

impl PostgresSessionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionResolver for PostgresSessionRepository {
    async fn resolve_user(&self, token: &str) -> Result<Option<String>, Error> {
        let row = sqlx::query(
            r#"
            SELECT user_id
            FROM session
            WHERE token = $1
              AND expires_at > now()
            "#,
        )
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(r.try_get("user_id")?)),
            None => Ok(None),
        }
    }
}
