use crate::domain::model::{Contract, Profile};
use crate::utils::error::{LedgerError, Result};

/// Which side of a contract a caller must be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Either,
    Client,
    Contractor,
}

/// Ownership checks for contract-scoped resources.
pub struct AccessGuard;

impl AccessGuard {
    pub fn permits(caller: &Profile, contract: &Contract, party: Party) -> bool {
        match party {
            Party::Either => contract.involves(caller.id),
            Party::Client => contract.client_id == caller.id,
            Party::Contractor => contract.contractor_id == caller.id,
        }
    }

    /// For lookups: a contract the caller does not own is reported as absent.
    pub fn reveal(caller: &Profile, contract: Contract, party: Party) -> Result<Contract> {
        if Self::permits(caller, &contract, party) {
            Ok(contract)
        } else {
            tracing::debug!(
                profile_id = caller.id,
                contract_id = contract.id,
                "Hiding contract from non-owner"
            );
            Err(LedgerError::not_found(format!("contract {}", contract.id)))
        }
    }

    /// For mutations where the resource is already known to exist.
    pub fn authorize(caller: &Profile, contract: &Contract, party: Party) -> Result<()> {
        if Self::permits(caller, contract, party) {
            Ok(())
        } else {
            tracing::warn!(
                profile_id = caller.id,
                contract_id = contract.id,
                ?party,
                "Caller does not own contract"
            );
            Err(LedgerError::forbidden(format!(
                "profile {} may not act on contract {}",
                caller.id, contract.id
            )))
        }
    }
}
