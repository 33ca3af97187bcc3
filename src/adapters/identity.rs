use crate::core::{IdentityResolver, LedgerStore, UnitOfWork};
use crate::domain::model::{Profile, ProfileId};
use crate::utils::error::{LedgerError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves a caller token holding a numeric profile id, the form the
/// `profile_id` request header takes.
pub struct ProfileIdResolver<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> ProfileIdResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: LedgerStore> IdentityResolver for ProfileIdResolver<S> {
    async fn resolve(&self, token: &str) -> Result<Profile> {
        let Ok(id) = token.trim().parse::<ProfileId>() else {
            tracing::debug!("Rejecting malformed caller token");
            return Err(LedgerError::NotAuthorized);
        };

        let profile = self.store.inspect(move |work| Ok(work.profile(id))).await?;
        profile.ok_or_else(|| {
            tracing::debug!(profile_id = id, "Caller token names no profile");
            LedgerError::NotAuthorized
        })
    }
}
