pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{identity::ProfileIdResolver, memory::MemoryStore};
pub use config::LedgerConfig;
pub use core::ledger::LedgerService;
pub use domain::model::{DepositDirection, LedgerPolicy, Money};
pub use utils::error::{ErrorKind, LedgerError, Result};
