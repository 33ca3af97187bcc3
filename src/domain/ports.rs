use crate::domain::model::{
    ClientTotal, Contract, ContractId, DateWindow, Job, JobId, Money, Profile, ProfessionEarnings,
    ProfileId,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Handle to the store inside one atomic unit of work.
///
/// Scans carry fixed predicates; callers never compose filters ad hoc.
pub trait UnitOfWork {
    fn profile(&self, id: ProfileId) -> Option<Profile>;
    fn contract(&self, id: ContractId) -> Option<Contract>;
    fn job(&self, id: JobId) -> Option<Job>;

    /// Contracts where the profile is the client or the contractor, any status.
    fn contracts_of_party(&self, profile_id: ProfileId) -> Vec<Contract>;

    /// Contracts where the profile is the client, any status.
    fn contracts_of_client(&self, client_id: ProfileId) -> Vec<Contract>;

    /// Jobs under the given contracts whose paid flag is not set.
    fn unpaid_jobs_in(&self, contract_ids: &[ContractId]) -> Vec<Job>;

    /// Sum of prices over `unpaid_jobs_in(contract_ids)`. Fails when the
    /// total does not fit in a `Money`.
    fn unpaid_total_in(&self, contract_ids: &[ContractId]) -> Result<Money>;

    /// Paid jobs created inside the window, summed per contractor profession.
    fn paid_by_profession(&self, created: &DateWindow) -> Result<Vec<ProfessionEarnings>>;

    /// Paid jobs settled inside the window, summed per client.
    fn paid_by_client(&self, settled: &DateWindow) -> Result<Vec<ClientTotal>>;

    fn set_balance(&mut self, id: ProfileId, balance: Money) -> Result<usize>;

    /// Sets the paid flag and payment timestamp of a job.
    fn mark_paid(&mut self, id: JobId, at: DateTime<Utc>) -> Result<usize>;
}

/// Durable home of profiles, contracts and jobs.
pub trait LedgerStore: Send + Sync {
    type Work: UnitOfWork + Send;

    /// Runs `work` as one serializable transaction. Writes become visible
    /// only when `work` returns `Ok`; an `Err` leaves the store untouched.
    fn atomically<T, F>(&self, work: F) -> impl std::future::Future<Output = Result<T>> + Send
    where
        T: Send,
        F: FnOnce(&mut Self::Work) -> Result<T> + Send;

    /// Runs `read` against the committed state. Sees a consistent view but
    /// cannot write.
    fn inspect<T, F>(&self, read: F) -> impl std::future::Future<Output = Result<T>> + Send
    where
        T: Send,
        F: FnOnce(&Self::Work) -> Result<T> + Send;
}

/// Maps an inbound caller token to a profile.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Profile>;
}
