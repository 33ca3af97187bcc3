use crate::core::{LedgerStore, UnitOfWork};
use crate::domain::model::{
    ClientTotal, Contract, ContractId, DateWindow, Job, JobId, Money, Profile, ProfessionEarnings,
    ProfileId, ProfileKind,
};
use crate::utils::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Full contents of a [`MemoryStore`]. Also the unit-of-work handle: each
/// transaction runs against a private copy.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    profiles: BTreeMap<ProfileId, Profile>,
    contracts: BTreeMap<ContractId, Contract>,
    jobs: BTreeMap<JobId, Job>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.insert(profile.id, profile);
        self
    }

    pub fn with_contract(mut self, contract: Contract) -> Self {
        self.contracts.insert(contract.id, contract);
        self
    }

    pub fn with_job(mut self, job: Job) -> Self {
        self.jobs.insert(job.id, job);
        self
    }

    /// Walks paid jobs inside `window` (by the timestamp `at` picks) and
    /// yields each with the profile of the given role on its contract.
    fn paid_jobs_with_party<'a>(
        &'a self,
        window: &'a DateWindow,
        at: impl Fn(&Job) -> Option<DateTime<Utc>> + 'a,
        kind: ProfileKind,
    ) -> impl Iterator<Item = (&'a Job, &'a Profile)> + 'a {
        self.jobs
            .values()
            .filter(|job| job.paid)
            .filter(move |job| at(job).is_some_and(|ts| window.contains(ts)))
            .filter_map(move |job| {
                let contract = self.contracts.get(&job.contract_id)?;
                let party_id = match kind {
                    ProfileKind::Client => contract.client_id,
                    ProfileKind::Contractor => contract.contractor_id,
                };
                let party = self.profiles.get(&party_id)?;
                (party.kind == kind).then_some((job, party))
            })
    }
}

impl UnitOfWork for LedgerState {
    fn profile(&self, id: ProfileId) -> Option<Profile> {
        self.profiles.get(&id).cloned()
    }

    fn contract(&self, id: ContractId) -> Option<Contract> {
        self.contracts.get(&id).cloned()
    }

    fn job(&self, id: JobId) -> Option<Job> {
        self.jobs.get(&id).cloned()
    }

    fn contracts_of_party(&self, profile_id: ProfileId) -> Vec<Contract> {
        self.contracts
            .values()
            .filter(|c| c.involves(profile_id))
            .cloned()
            .collect()
    }

    fn contracts_of_client(&self, client_id: ProfileId) -> Vec<Contract> {
        self.contracts
            .values()
            .filter(|c| c.client_id == client_id)
            .cloned()
            .collect()
    }

    fn unpaid_jobs_in(&self, contract_ids: &[ContractId]) -> Vec<Job> {
        let wanted: HashSet<ContractId> = contract_ids.iter().copied().collect();
        self.jobs
            .values()
            .filter(|job| !job.paid && wanted.contains(&job.contract_id))
            .cloned()
            .collect()
    }

    fn unpaid_total_in(&self, contract_ids: &[ContractId]) -> Result<Money> {
        let wanted: HashSet<ContractId> = contract_ids.iter().copied().collect();
        Money::checked_sum(
            self.jobs
                .values()
                .filter(|job| !job.paid && wanted.contains(&job.contract_id))
                .map(|job| job.price),
        )
    }

    fn paid_by_profession(&self, created: &DateWindow) -> Result<Vec<ProfessionEarnings>> {
        let mut groups: BTreeMap<String, Money> = BTreeMap::new();
        for (job, contractor) in
            self.paid_jobs_with_party(created, |job| Some(job.created_at), ProfileKind::Contractor)
        {
            let Some(profession) = contractor.profession.as_ref() else {
                continue;
            };
            let earned = groups.entry(profession.clone()).or_insert(Money::ZERO);
            *earned = earned.checked_add(job.price)?;
        }

        Ok(groups
            .into_iter()
            .map(|(profession, earned)| ProfessionEarnings { profession, earned })
            .collect())
    }

    fn paid_by_client(&self, settled: &DateWindow) -> Result<Vec<ClientTotal>> {
        let mut groups: BTreeMap<ProfileId, ClientTotal> = BTreeMap::new();
        for (job, client) in
            self.paid_jobs_with_party(settled, |job| job.payment_date, ProfileKind::Client)
        {
            let entry = groups.entry(client.id).or_insert_with(|| ClientTotal {
                client: client.clone(),
                paid: Money::ZERO,
            });
            entry.paid = entry.paid.checked_add(job.price)?;
        }

        Ok(groups.into_values().collect())
    }

    fn set_balance(&mut self, id: ProfileId, balance: Money) -> Result<usize> {
        let profile = self
            .profiles
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found(format!("profile {}", id)))?;
        profile.balance = balance;
        Ok(1)
    }

    fn mark_paid(&mut self, id: JobId, at: DateTime<Utc>) -> Result<usize> {
        let job = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found(format!("job {}", id)))?;
        job.paid = true;
        job.payment_date = Some(at);
        Ok(1)
    }
}

/// In-process [`LedgerStore`]. Transactions are serialized by one async
/// mutex, so every unit of work observes and commits a consistent state.
/// Writers work on a private copy; readers borrow the committed state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<LedgerState>>,
}

impl MemoryStore {
    pub fn new(state: LedgerState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> LedgerState {
        self.state.lock().await.clone()
    }
}

impl LedgerStore for MemoryStore {
    type Work = LedgerState;

    async fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut Self::Work) -> Result<T> + Send,
    {
        let mut committed = self.state.lock().await;
        let mut draft = committed.clone();

        let outcome = work(&mut draft)?;

        *committed = draft;
        Ok(outcome)
    }

    async fn inspect<T, F>(&self, read: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&Self::Work) -> Result<T> + Send,
    {
        let committed = self.state.lock().await;
        read(&committed)
    }
}
