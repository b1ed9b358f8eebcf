use async_trait::async_trait;
use crate::error::Error;

/// Resolves an inbound bearer token to the user it was issued for.
/// Session issuance lives outside this workspace.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve_user(&self, token: &str) -> Result<Option<String>, Error>;
}
