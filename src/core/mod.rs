pub mod access;
pub mod deposit;
pub mod ledger;
pub mod payment;
pub mod query;
pub mod reporting;

pub use crate::domain::model::{Contract, Job, Money, Profile};
pub use crate::domain::ports::{IdentityResolver, LedgerStore, UnitOfWork};
pub use crate::utils::error::Result;
