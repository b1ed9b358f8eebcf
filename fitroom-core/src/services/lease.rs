// File: fitroom-core/src/services/lease.rs

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Duration as ChronoDuration, SubsecRound, Utc};
use tracing::debug;
use fitroom_common::models::LeaseKind;
use fitroom_common::traits::repository_traits::LeaseRepository;

use crate::Error;

/// A won claim. `started_at` is the fencing token for completion writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub kind: LeaseKind,
    pub id: String,
    pub started_at: DateTime<Utc>,
}

/// Hands out exclusive generation rights on outfit and try-on rows.
#[derive(Clone)]
pub struct LeaseManager {
    repo: Arc<dyn LeaseRepository>,
    stale_after: ChronoDuration,
}

impl LeaseManager {
    pub fn new(repo: Arc<dyn LeaseRepository>, stale_after: Duration) -> Self {
        let stale_after = ChronoDuration::from_std(stale_after).unwrap_or(ChronoDuration::minutes(5));
        Self { repo, stale_after }
    }

    pub async fn try_claim(&self, kind: LeaseKind, id: &str) -> Result<Option<Lease>, Error> {
        self.try_claim_at(kind, id, Utc::now()).await
    }

    /// Claim as of `now`. Timestamps are cut to microseconds so the token
    /// round-trips through Postgres unchanged.
    pub async fn try_claim_at(
        &self,
        kind: LeaseKind,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Lease>, Error> {
        let now = now.trunc_subsecs(6);
        let stale_before = now - self.stale_after;

        if self.repo.try_claim(kind, id, now, stale_before).await? {
            debug!(%kind, id, "lease claimed");
            Ok(Some(Lease { kind, id: id.to_string(), started_at: now }))
        } else {
            debug!(%kind, id, "lease held elsewhere");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitroom_common::models::GenerationStatus;
    use crate::test_utils::memory::MemoryStore;

    fn manager(store: &Arc<MemoryStore>) -> LeaseManager {
        LeaseManager::new(store.clone(), Duration::from_secs(300))
    }

    #[tokio::test]
    async fn claims_pending_once() -> Result<(), Error> {
        let store = Arc::new(MemoryStore::new());
        let outfit = store.seed_outfit("u1", "a1", "work");
        let leases = manager(&store);

        let lease = leases.try_claim(LeaseKind::Outfit, &outfit).await?;
        assert!(lease.is_some());
        assert!(leases.try_claim(LeaseKind::Outfit, &outfit).await?.is_none());
        assert_eq!(store.outfit(&outfit).map(|o| o.status), Some(GenerationStatus::Running));
        Ok(())
    }

    #[tokio::test]
    async fn reclaims_only_after_threshold() -> Result<(), Error> {
        let store = Arc::new(MemoryStore::new());
        let outfit = store.seed_outfit("u1", "a1", "work");
        let leases = manager(&store);
        let start = Utc::now();

        leases.try_claim_at(LeaseKind::Outfit, &outfit, start).await?;
        let early = start + ChronoDuration::minutes(4);
        assert!(leases.try_claim_at(LeaseKind::Outfit, &outfit, early).await?.is_none());

        let late = start + ChronoDuration::minutes(6);
        let lease = leases.try_claim_at(LeaseKind::Outfit, &outfit, late).await?;
        assert_eq!(lease.map(|l| l.started_at), Some(late.trunc_subsecs(6)));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_row_is_not_claimed() -> Result<(), Error> {
        let store = Arc::new(MemoryStore::new());
        let leases = manager(&store);
        assert!(leases.try_claim(LeaseKind::Tryon, "missing").await?.is_none());
        Ok(())
    }
}
