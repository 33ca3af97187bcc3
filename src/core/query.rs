use crate::core::access::{AccessGuard, Party};
use crate::core::{LedgerStore, UnitOfWork};
use crate::domain::model::{Contract, ContractId, ContractStatus, Job, Profile};
use crate::utils::error::{LedgerError, Result};
use std::sync::Arc;

/// Read-only listings scoped to the calling profile.
pub struct QueryService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> QueryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// A single contract, visible only to its contractor.
    pub async fn get_contract(&self, caller: &Profile, id: ContractId) -> Result<Contract> {
        let contract = self
            .store
            .inspect(move |work| Ok(work.contract(id)))
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("contract {}", id)))?;

        AccessGuard::reveal(caller, contract, Party::Contractor)
    }

    /// Contracts the caller is party to, excluding terminated ones.
    pub async fn list_contracts_for(&self, caller: &Profile) -> Result<Vec<Contract>> {
        let caller_id = caller.id;
        let contracts = self
            .store
            .inspect(move |work| Ok(work.contracts_of_party(caller_id)))
            .await?;

        let open: Vec<Contract> = contracts
            .into_iter()
            .filter(|c| AccessGuard::permits(caller, c, Party::Either))
            .filter(|c| c.status != ContractStatus::Terminated)
            .collect();

        tracing::debug!(profile_id = caller_id, count = open.len(), "Listed contracts");
        Ok(open)
    }

    /// Unpaid jobs under the caller's in-progress contracts.
    pub async fn list_unpaid_jobs_for(&self, caller: &Profile) -> Result<Vec<Job>> {
        let caller_id = caller.id;
        let jobs = self
            .store
            .inspect(move |work| {
                let active: Vec<ContractId> = work
                    .contracts_of_party(caller_id)
                    .into_iter()
                    .filter(|c| c.status == ContractStatus::InProgress)
                    .map(|c| c.id)
                    .collect();
                Ok(work.unpaid_jobs_in(&active))
            })
            .await?;

        tracing::debug!(profile_id = caller_id, count = jobs.len(), "Listed unpaid jobs");
        Ok(jobs)
    }
}
