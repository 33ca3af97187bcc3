use crate::utils::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ProfileId = u64;
pub type ContractId = u64;
pub type JobId = u64;

/// Monetary amount, always held at exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Accepts only amounts representable in whole cents.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        if value.normalize().scale() > 2 {
            return Err(LedgerError::bad_request(format!(
                "amount {} has more than two fractional digits",
                value
            )));
        }
        let mut cents = value;
        cents.rescale(2);
        Ok(Money(cents))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn checked_add(self, other: Money) -> Result<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| LedgerError::internal("balance overflow"))
    }

    pub fn checked_sub(self, other: Money) -> Result<Money> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or_else(|| LedgerError::internal("balance underflow"))
    }

    /// Adds up `amounts`, failing instead of wrapping past `Decimal::MAX`.
    pub fn checked_sum<I>(amounts: I) -> Result<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |total, amount| total.checked_add(amount))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::from_decimal(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Client,
    Contractor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    New,
    InProgress,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub profession: Option<String>,
    pub balance: Money,
    #[serde(rename = "type")]
    pub kind: ProfileKind,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    #[serde(default)]
    pub terms: String,
    pub status: ContractStatus,
    pub client_id: ProfileId,
    pub contractor_id: ProfileId,
}

impl Contract {
    pub fn involves(&self, profile_id: ProfileId) -> bool {
        self.client_id == profile_id || self.contractor_id == profile_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    pub contract_id: ContractId,
    pub created_at: DateTime<Utc>,
}

/// Inclusive `[start, end]` time range used by the reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(LedgerError::bad_request(format!(
                "start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Sum of paid job prices grouped by contractor profession.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfessionEarnings {
    pub profession: String,
    pub earned: Money,
}

/// Sum of paid job prices grouped by client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientTotal {
    pub client: Profile,
    pub paid: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSpend {
    pub id: ProfileId,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub paid: Money,
}

/// Number of records a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MutationCount(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositDirection {
    /// The deposited amount is added to the balance.
    #[default]
    Credit,
    /// The deposited amount is subtracted from the balance.
    Debit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerPolicy {
    pub deposit_exposure_ratio: Decimal,
    pub deposit_direction: DepositDirection,
    pub best_clients_default_limit: usize,
    pub allow_payment_on_terminated: bool,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            deposit_exposure_ratio: Decimal::new(25, 2),
            deposit_direction: DepositDirection::Credit,
            best_clients_default_limit: 2,
            allow_payment_on_terminated: true,
        }
    }
}
