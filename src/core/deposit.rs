use crate::core::{LedgerStore, UnitOfWork};
use crate::domain::model::{
    ContractId, DepositDirection, LedgerPolicy, Money, MutationCount, Profile,
};
use crate::utils::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Caps a self-deposit at a fraction of the client's unpaid exposure.
pub struct DepositLimiter<S: LedgerStore> {
    store: Arc<S>,
    ratio: Decimal,
    direction: DepositDirection,
}

impl<S: LedgerStore> DepositLimiter<S> {
    pub fn new(store: Arc<S>, policy: &LedgerPolicy) -> Self {
        Self {
            store,
            ratio: policy.deposit_exposure_ratio,
            direction: policy.deposit_direction,
        }
    }

    pub async fn deposit(&self, profile: &Profile, amount: Option<Decimal>) -> Result<MutationCount> {
        let amount = match amount {
            Some(value) if value > Decimal::ZERO => Money::from_decimal(value)?,
            _ => return Err(LedgerError::bad_request("amount must be a positive number")),
        };

        let profile_id = profile.id;
        let ratio = self.ratio;
        let direction = self.direction;

        let outcome = self
            .store
            .atomically(move |work| {
                let contracts: Vec<ContractId> = work
                    .contracts_of_client(profile_id)
                    .into_iter()
                    .map(|c| c.id)
                    .collect();
                let total_unpaid = work.unpaid_total_in(&contracts)?;

                // Exact product; compared without rounding so the boundary is accepted.
                let limit = total_unpaid
                    .amount()
                    .checked_mul(ratio)
                    .ok_or_else(|| LedgerError::internal("deposit limit overflow"))?;
                if amount.amount() > limit {
                    return Err(LedgerError::forbidden(format!(
                        "deposit {} exceeds limit {} ({} of unpaid {})",
                        amount, limit, ratio, total_unpaid
                    )));
                }

                let current = work
                    .profile(profile_id)
                    .ok_or_else(|| LedgerError::not_found(format!("profile {}", profile_id)))?;
                let balance = match direction {
                    DepositDirection::Credit => current.balance.checked_add(amount)?,
                    DepositDirection::Debit => current.balance.checked_sub(amount)?,
                };
                let rows = work.set_balance(profile_id, balance)?;
                Ok((MutationCount(rows), balance))
            })
            .await;

        match outcome {
            Ok((rows, balance)) => {
                tracing::info!(profile_id, %amount, %balance, ?direction, "Deposit applied");
                Ok(rows)
            }
            Err(e) => {
                tracing::warn!(profile_id, %amount, error = %e, "Deposit rejected");
                Err(e)
            }
        }
    }
}
