use crate::core::access::{AccessGuard, Party};
use crate::core::{LedgerStore, UnitOfWork};
use crate::domain::model::{ContractStatus, JobId, LedgerPolicy, MutationCount, Profile};
use crate::utils::error::{LedgerError, Result};
use chrono::Utc;
use std::sync::Arc;

/// Moves a job's price from the paying client to the contractor.
pub struct PaymentProcessor<S: LedgerStore> {
    store: Arc<S>,
    allow_terminated: bool,
}

impl<S: LedgerStore> PaymentProcessor<S> {
    pub fn new(store: Arc<S>, policy: &LedgerPolicy) -> Self {
        Self {
            store,
            allow_terminated: policy.allow_payment_on_terminated,
        }
    }

    /// Pays for one job. Every check and write happens inside a single unit
    /// of work, so a rejected payment changes nothing and two racing
    /// payments of the same job cannot both observe it unpaid.
    pub async fn pay(&self, job_id: JobId, payer: &Profile) -> Result<MutationCount> {
        let payer_id = payer.id;
        let allow_terminated = self.allow_terminated;

        let receipt = self
            .store
            .atomically(move |work| {
                let job = work
                    .job(job_id)
                    .ok_or_else(|| LedgerError::not_found(format!("job {}", job_id)))?;

                if job.paid {
                    return Err(LedgerError::conflict(format!(
                        "job {} is already paid",
                        job_id
                    )));
                }

                // Balance as committed, not as seen when the caller was resolved.
                let payer = work
                    .profile(payer_id)
                    .ok_or_else(|| LedgerError::not_found(format!("profile {}", payer_id)))?;

                if job.price > payer.balance {
                    return Err(LedgerError::forbidden(format!(
                        "insufficient funds: balance {} is below price {}",
                        payer.balance, job.price
                    )));
                }

                let contract = work.contract(job.contract_id).ok_or_else(|| {
                    LedgerError::not_found(format!("contract {}", job.contract_id))
                })?;
                AccessGuard::authorize(&payer, &contract, Party::Client)?;

                if contract.status == ContractStatus::Terminated && !allow_terminated {
                    return Err(LedgerError::forbidden(format!(
                        "contract {} is terminated",
                        contract.id
                    )));
                }

                if work.profile(contract.contractor_id).is_none() {
                    return Err(LedgerError::not_found(format!(
                        "profile {}",
                        contract.contractor_id
                    )));
                }

                work.set_balance(payer.id, payer.balance.checked_sub(job.price)?)?;

                // Re-read after the debit so a self-contract nets to zero.
                let contractor = work.profile(contract.contractor_id).ok_or_else(|| {
                    LedgerError::not_found(format!("profile {}", contract.contractor_id))
                })?;
                work.set_balance(contractor.id, contractor.balance.checked_add(job.price)?)?;

                let rows = work.mark_paid(job.id, Utc::now())?;
                Ok((MutationCount(rows), job.price, contractor.id))
            })
            .await;

        match receipt {
            Ok((rows, price, contractor_id)) => {
                tracing::info!(
                    job_id,
                    payer_id,
                    contractor_id,
                    %price,
                    "Job paid"
                );
                Ok(rows)
            }
            Err(e) => {
                tracing::warn!(job_id, payer_id, error = %e, "Payment rejected");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{LedgerState, MemoryStore};
    use crate::domain::model::{Contract, Job, Money, ProfileKind};
    use crate::utils::error::ErrorKind;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn money(value: Decimal) -> Money {
        Money::from_decimal(value).unwrap()
    }

    fn profile(id: u64, kind: ProfileKind, balance: Decimal) -> Profile {
        Profile {
            id,
            first_name: format!("P{}", id),
            last_name: "Test".to_string(),
            profession: Some("Programmer".to_string()),
            balance: money(balance),
            kind,
        }
    }

    fn contract(id: u64, status: ContractStatus, client_id: u64, contractor_id: u64) -> Contract {
        Contract {
            id,
            terms: String::new(),
            status,
            client_id,
            contractor_id,
        }
    }

    fn job(id: u64, contract_id: u64, price: Decimal) -> Job {
        Job {
            id,
            description: String::new(),
            price: money(price),
            paid: false,
            payment_date: None,
            contract_id,
            created_at: Utc.with_ymd_and_hms(2020, 8, 1, 0, 0, 0).unwrap(),
        }
    }

    fn fixture() -> (Arc<MemoryStore>, Profile) {
        let client = profile(1, ProfileKind::Client, dec!(231.11));
        let state = LedgerState::new()
            .with_profile(client.clone())
            .with_profile(profile(5, ProfileKind::Contractor, dec!(64)))
            .with_profile(profile(2, ProfileKind::Client, dec!(500)))
            .with_contract(contract(1, ContractStatus::InProgress, 1, 5))
            .with_contract(contract(2, ContractStatus::Terminated, 1, 5))
            .with_contract(contract(3, ContractStatus::InProgress, 1, 77))
            .with_job(job(1, 1, dec!(202)))
            .with_job(job(2, 1, dec!(300)))
            .with_job(job(3, 2, dec!(10)))
            .with_job(job(4, 3, dec!(10)))
            .with_job(job(5, 404, dec!(10)));
        (Arc::new(MemoryStore::new(state)), client)
    }

    async fn balance(store: &MemoryStore, id: u64) -> Money {
        store.snapshot().await.profile(id).unwrap().balance
    }

    #[tokio::test]
    async fn test_pay_transfers_exact_amount() {
        let (store, client) = fixture();
        let processor = PaymentProcessor::new(store.clone(), &LedgerPolicy::default());

        let rows = processor.pay(1, &client).await.unwrap();

        assert_eq!(rows, MutationCount(1));
        assert_eq!(balance(&store, 1).await, money(dec!(29.11)));
        assert_eq!(balance(&store, 5).await, money(dec!(266)));
        let job = store.snapshot().await.job(1).unwrap();
        assert!(job.paid);
        assert!(job.payment_date.is_some());
    }

    #[tokio::test]
    async fn test_second_payment_conflicts() {
        let (store, client) = fixture();
        let processor = PaymentProcessor::new(store.clone(), &LedgerPolicy::default());

        processor.pay(1, &client).await.unwrap();
        let err = processor.pay(1, &client).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(balance(&store, 1).await, money(dec!(29.11)));
        assert_eq!(balance(&store, 5).await, money(dec!(266)));
    }

    #[tokio::test]
    async fn test_insufficient_funds_is_forbidden() {
        let (store, client) = fixture();
        let processor = PaymentProcessor::new(store.clone(), &LedgerPolicy::default());

        let err = processor.pay(2, &client).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(balance(&store, 1).await, money(dec!(231.11)));
        assert!(!store.snapshot().await.job(2).unwrap().paid);
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let (store, client) = fixture();
        let processor = PaymentProcessor::new(store.clone(), &LedgerPolicy::default());

        assert_eq!(
            processor.pay(99, &client).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            processor.pay(5, &client).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );

        // Contractor profile 77 does not exist: nothing may be debited.
        assert_eq!(
            processor.pay(4, &client).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(balance(&store, 1).await, money(dec!(231.11)));
        assert!(!store.snapshot().await.job(4).unwrap().paid);
    }

    #[tokio::test]
    async fn test_only_the_contract_client_may_pay() {
        let (store, _) = fixture();
        let processor = PaymentProcessor::new(store.clone(), &LedgerPolicy::default());
        let other = profile(2, ProfileKind::Client, dec!(500));

        let err = processor.pay(1, &other).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(balance(&store, 2).await, money(dec!(500)));
    }

    #[tokio::test]
    async fn test_terminated_contract_policy() {
        let (store, client) = fixture();
        let strict = LedgerPolicy {
            allow_payment_on_terminated: false,
            ..LedgerPolicy::default()
        };

        let err = PaymentProcessor::new(store.clone(), &strict)
            .pay(3, &client)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        PaymentProcessor::new(store.clone(), &LedgerPolicy::default())
            .pay(3, &client)
            .await
            .unwrap();
        assert_eq!(balance(&store, 1).await, money(dec!(221.11)));
    }
}
