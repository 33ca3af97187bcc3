use crate::core::{LedgerStore, UnitOfWork};
use crate::domain::model::{ClientSpend, DateWindow, LedgerPolicy};
use crate::utils::error::{LedgerError, Result};
use std::cmp::Reverse;
use std::sync::Arc;

/// Earnings reports over paid jobs.
///
/// Groups come from the store as plain sums; ordering, tie-breaking and
/// limiting are decided here so every store backend reports identically.
pub struct ReportingAggregator<S: LedgerStore> {
    store: Arc<S>,
    default_limit: usize,
}

impl<S: LedgerStore> ReportingAggregator<S> {
    pub fn new(store: Arc<S>, policy: &LedgerPolicy) -> Self {
        Self {
            store,
            default_limit: policy.best_clients_default_limit,
        }
    }

    /// Contractor profession with the highest paid total among jobs created
    /// in the window. Ties go to the alphabetically first profession.
    pub async fn best_profession(&self, window: DateWindow) -> Result<String> {
        let mut groups = self
            .store
            .inspect(move |work| work.paid_by_profession(&window))
            .await?;

        groups.sort_by(|a, b| {
            b.earned
                .cmp(&a.earned)
                .then_with(|| a.profession.cmp(&b.profession))
        });

        let best = groups
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::not_found("no paid jobs in range"))?;

        tracing::debug!(profession = %best.profession, earned = %best.earned, "Best profession");
        Ok(best.profession)
    }

    /// Clients ranked by total paid for jobs settled in the window, highest
    /// first, ties by ascending id.
    pub async fn best_clients(
        &self,
        window: DateWindow,
        limit: Option<usize>,
    ) -> Result<Vec<ClientSpend>> {
        let limit = match limit {
            Some(0) => return Err(LedgerError::bad_request("limit must be at least 1")),
            Some(n) => n,
            None => self.default_limit,
        };

        let mut groups = self
            .store
            .inspect(move |work| work.paid_by_client(&window))
            .await?;

        groups.sort_by_key(|g| (Reverse(g.paid), g.client.id));

        let ranked: Vec<ClientSpend> = groups
            .into_iter()
            .take(limit)
            .map(|g| ClientSpend {
                id: g.client.id,
                full_name: g.client.full_name(),
                paid: g.paid,
            })
            .collect();

        tracing::debug!(limit, count = ranked.len(), "Best clients");
        Ok(ranked)
    }
}
