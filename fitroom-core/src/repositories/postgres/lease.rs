use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use tracing::debug;
use fitroom_common::models::LeaseKind;
use fitroom_common::traits::repository_traits::LeaseRepository;

use crate::Error;

/// Claims generation leases on `outfit` and `tryon` rows with one guarded UPDATE.
#[derive(Clone)]
pub struct PostgresLeaseRepository {
    pool: Pool<Postgres>,
}

impl PostgresLeaseRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn lease_table(kind: LeaseKind) -> (&'static str, &'static str) {
    match kind {
        LeaseKind::Outfit => ("outfit", "outfit_id"),
        LeaseKind::Tryon => ("tryon", "tryon_id"),
    }
}

#[async_trait]
impl LeaseRepository for PostgresLeaseRepository {
    async fn try_claim(
        &self,
        kind: LeaseKind,
        id: &str,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let (table, id_column) = lease_table(kind);
        let sql = format!(
            r#"
            UPDATE {table}
               SET status = 'running',
                   generation_started_at = $2,
                   error_code = NULL,
                   error_message = NULL,
                   updated_at = $2
             WHERE {id_column} = $1
               AND (
                    status IN ('pending', 'failed')
                    OR (status = 'running'
                        AND (generation_started_at IS NULL OR generation_started_at < $3))
               )
            "#
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(now)
            .bind(stale_before)
            .execute(&self.pool)
            .await?;

        let claimed = result.rows_affected() == 1;
        debug!(%kind, id, claimed, "lease claim");
        Ok(claimed)
    }
}
