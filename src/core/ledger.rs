use crate::core::deposit::DepositLimiter;
use crate::core::payment::PaymentProcessor;
use crate::core::query::QueryService;
use crate::core::reporting::ReportingAggregator;
use crate::core::{IdentityResolver, LedgerStore};
use crate::domain::model::{
    ClientSpend, Contract, ContractId, DateWindow, Job, JobId, LedgerPolicy, MutationCount,
};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Caller-facing operation surface. Profile-scoped operations take the raw
/// caller token and resolve it before delegating; reports need no caller.
pub struct LedgerService<S: LedgerStore, R: IdentityResolver> {
    resolver: R,
    query: QueryService<S>,
    payments: PaymentProcessor<S>,
    deposits: DepositLimiter<S>,
    reports: ReportingAggregator<S>,
}

impl<S: LedgerStore, R: IdentityResolver> LedgerService<S, R> {
    pub fn new(store: Arc<S>, resolver: R, policy: &LedgerPolicy) -> Self {
        Self {
            resolver,
            query: QueryService::new(store.clone()),
            payments: PaymentProcessor::new(store.clone(), policy),
            deposits: DepositLimiter::new(store.clone(), policy),
            reports: ReportingAggregator::new(store, policy),
        }
    }

    pub async fn get_contract(&self, caller: &str, id: ContractId) -> Result<Contract> {
        let profile = self.resolver.resolve(caller).await?;
        self.query.get_contract(&profile, id).await
    }

    pub async fn list_contracts(&self, caller: &str) -> Result<Vec<Contract>> {
        let profile = self.resolver.resolve(caller).await?;
        self.query.list_contracts_for(&profile).await
    }

    pub async fn list_unpaid_jobs(&self, caller: &str) -> Result<Vec<Job>> {
        let profile = self.resolver.resolve(caller).await?;
        self.query.list_unpaid_jobs_for(&profile).await
    }

    pub async fn pay_job(&self, caller: &str, job_id: JobId) -> Result<MutationCount> {
        let profile = self.resolver.resolve(caller).await?;
        self.payments.pay(job_id, &profile).await
    }

    pub async fn deposit(&self, caller: &str, amount: Option<Decimal>) -> Result<MutationCount> {
        let profile = self.resolver.resolve(caller).await?;
        self.deposits.deposit(&profile, amount).await
    }

    pub async fn best_profession(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<String> {
        self.reports.best_profession(DateWindow::new(start, end)?).await
    }

    pub async fn best_clients(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<ClientSpend>> {
        self.reports
            .best_clients(DateWindow::new(start, end)?, limit)
            .await
    }
}
