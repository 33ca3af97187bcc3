use crate::adapters::memory::{LedgerState, MemoryStore};
use crate::domain::model::{Contract, Job, LedgerPolicy, Profile, ProfileKind};
use crate::utils::error::{LedgerError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Ledger configuration: business policy plus the records the store starts with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub policy: LedgerPolicy,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl LedgerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LedgerError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LedgerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LEDGER_RATIO})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LedgerError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_range_exclusive_min(
            "policy.deposit_exposure_ratio",
            self.policy.deposit_exposure_ratio,
            Decimal::ZERO,
            Decimal::ONE,
        )?;
        validation::validate_positive_number(
            "policy.best_clients_default_limit",
            self.policy.best_clients_default_limit,
            1,
        )?;

        validation::validate_unique_ids("profiles.id", self.profiles.iter().map(|p| p.id))?;
        validation::validate_unique_ids("contracts.id", self.contracts.iter().map(|c| c.id))?;
        validation::validate_unique_ids("jobs.id", self.jobs.iter().map(|j| j.id))?;

        let kinds: HashMap<u64, ProfileKind> =
            self.profiles.iter().map(|p| (p.id, p.kind)).collect();

        for profile in &self.profiles {
            validation::validate_non_empty_string("profiles.first_name", &profile.first_name)?;
            if profile.kind == ProfileKind::Contractor {
                let profession = profile.profession.as_deref().unwrap_or_default();
                validation::validate_non_empty_string("profiles.profession", profession)?;
            }
        }

        for contract in &self.contracts {
            Self::check_party(contract, "client_id", contract.client_id, ProfileKind::Client, &kinds)?;
            Self::check_party(
                contract,
                "contractor_id",
                contract.contractor_id,
                ProfileKind::Contractor,
                &kinds,
            )?;
        }

        for job in &self.jobs {
            if !self.contracts.iter().any(|c| c.id == job.contract_id) {
                return Err(LedgerError::InvalidConfigValueError {
                    field: "jobs.contract_id".to_string(),
                    value: job.contract_id.to_string(),
                    reason: format!("Job {} references an unknown contract", job.id),
                });
            }
            if !job.price.is_positive() {
                return Err(LedgerError::InvalidConfigValueError {
                    field: "jobs.price".to_string(),
                    value: job.price.to_string(),
                    reason: format!("Job {} must have a positive price", job.id),
                });
            }
            if job.paid != job.payment_date.is_some() {
                return Err(LedgerError::InvalidConfigValueError {
                    field: "jobs.payment_date".to_string(),
                    value: format!("{:?}", job.payment_date),
                    reason: format!("Job {} must carry a payment date exactly when paid", job.id),
                });
            }
        }

        Ok(())
    }

    fn check_party(
        contract: &Contract,
        field: &str,
        profile_id: u64,
        expected: ProfileKind,
        kinds: &HashMap<u64, ProfileKind>,
    ) -> Result<()> {
        match kinds.get(&profile_id) {
            Some(kind) if *kind == expected => Ok(()),
            Some(kind) => Err(LedgerError::InvalidConfigValueError {
                field: format!("contracts.{}", field),
                value: profile_id.to_string(),
                reason: format!(
                    "Contract {} expects a {:?} profile, found {:?}",
                    contract.id, expected, kind
                ),
            }),
            None => Err(LedgerError::InvalidConfigValueError {
                field: format!("contracts.{}", field),
                value: profile_id.to_string(),
                reason: format!("Contract {} references an unknown profile", contract.id),
            }),
        }
    }

    /// Seeds an in-memory store with the configured records.
    pub fn build_store(&self) -> MemoryStore {
        let mut state = LedgerState::new();
        for profile in &self.profiles {
            state = state.with_profile(profile.clone());
        }
        for contract in &self.contracts {
            state = state.with_contract(contract.clone());
        }
        for job in &self.jobs {
            state = state.with_job(job.clone());
        }
        MemoryStore::new(state)
    }
}

impl Validate for LedgerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
