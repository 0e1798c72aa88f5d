use crate::amount::U256;
use crate::error::{Result, StakingError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Class of blockchains sharing one call-payload convention.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ChainFamily {
    Account,
    Utxo,
    Federated,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Stake,
    Unstake,
    Redelegate,
    ClaimRewards,
    ClaimAllRewards,
    WithdrawRewards,
    EnableAutocompound,
    DisableAutocompound,
}

impl OperationType {
    pub const ALL: [OperationType; 8] = [
        OperationType::Stake,
        OperationType::Unstake,
        OperationType::Redelegate,
        OperationType::ClaimRewards,
        OperationType::ClaimAllRewards,
        OperationType::WithdrawRewards,
        OperationType::EnableAutocompound,
        OperationType::DisableAutocompound,
    ];
}

/// Lifecycle status of a locally recorded staking transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
    Rejected,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

/// Status as reported by the external transaction service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExternalStatus {
    Pending,
    Confirmed,
    Failed,
    Rejected,
    Unknown,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum LockupPeriod {
    Flexible,
    ThirtyDays,
    NinetyDays,
    OneHundredEightyDays,
    ThreeHundredSixtyFiveDays,
}

impl LockupPeriod {
    pub fn days(&self) -> u64 {
        match self {
            LockupPeriod::Flexible => 0,
            LockupPeriod::ThirtyDays => 30,
            LockupPeriod::NinetyDays => 90,
            LockupPeriod::OneHundredEightyDays => 180,
            LockupPeriod::ThreeHundredSixtyFiveDays => 365,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DelegationStatus {
    Active,
    Unbonding,
    Unlocked,
    Claimed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ValidatorStatus {
    Active,
    Inactive,
    Jailed,
    Unbonding,
    Waiting,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegation {
    pub id: String,
    pub validator_address: String,
    pub amount: String,
    #[serde(default)]
    pub period: Option<LockupPeriod>,
    pub status: DelegationStatus,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    pub address: String,
    pub name: String,
    pub status: ValidatorStatus,
    /// Commission in percent.
    pub commission: f64,
    pub total_stake: String,
    #[serde(default)]
    pub self_stake: Option<String>,
    #[serde(default)]
    pub delegator_count: Option<u64>,
}

impl Validator {
    pub fn total_stake_value(&self) -> U256 {
        U256::from_dec_str(&self.total_stake).unwrap_or_else(|_| U256::zero())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingReward {
    pub id: String,
    #[serde(default)]
    pub staking_id: Option<String>,
    pub validator_address: String,
    pub amount: String,
    #[serde(default)]
    pub claimed: bool,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RewardHistoryQuery {
    pub period: Option<String>,
    pub validator: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl RewardHistoryQuery {
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut query_params = vec![];
        if let Some(period) = &self.period {
            query_params.push(("period", period.to_owned()));
        }
        if let Some(validator) = &self.validator {
            query_params.push(("validator", validator.to_owned()));
        }
        if let Some(offset) = self.offset {
            query_params.push(("offset", offset.to_string()));
        }
        if let Some(limit) = self.limit {
            query_params.push(("limit", limit.to_string()));
        }
        query_params
    }
}

/// Request handed to the transaction service for signing and broadcast.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub data: String,
}

/// Existing entity a transaction acts on.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Backreference {
    Delegation(String),
    Reward(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingTransaction {
    pub id: Uuid,
    pub network_id: String,
    #[serde(rename = "type")]
    pub operation: OperationType,
    pub from_address: String,
    pub validator_address: String,
    pub new_validator_address: Option<String>,
    pub amount: Option<String>,
    pub period: Option<LockupPeriod>,
    pub auto_compound_percentage: Option<f64>,
    pub tx_hash: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub backreference: Option<Backreference>,
    /// Hex of the submitted call payload, `0x` prefixed.
    pub data: String,
}

impl StakingTransaction {
    pub fn new(
        network_id: &str,
        operation: OperationType,
        from_address: &str,
        validator_address: &str,
        tx_hash: String,
        data: String,
    ) -> StakingTransaction {
        let now = Utc::now();
        let id_seed = format!("{}:{}", network_id, tx_hash);
        StakingTransaction {
            id: Uuid::new_v5(&Uuid::NAMESPACE_DNS, id_seed.as_bytes()),
            network_id: network_id.to_owned(),
            operation,
            from_address: from_address.to_owned(),
            validator_address: validator_address.to_owned(),
            new_validator_address: None,
            amount: None,
            period: None,
            auto_compound_percentage: None,
            tx_hash,
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
            backreference: None,
            data,
        }
    }

    pub fn with_amount(mut self, amount: U256) -> Self {
        self.amount = Some(amount.to_string());
        self
    }

    pub fn with_period(mut self, period: LockupPeriod) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_new_validator(mut self, new_validator_address: &str) -> Self {
        self.new_validator_address = Some(new_validator_address.to_owned());
        self
    }

    pub fn with_auto_compound_percentage(mut self, percentage: f64) -> Self {
        self.auto_compound_percentage = Some(percentage);
        self
    }

    pub fn with_backreference(mut self, backreference: Backreference) -> Self {
        self.backreference = Some(backreference);
        self
    }

    /// Moves a pending record to a terminal status. Only one transition is ever
    /// accepted.
    pub fn transition(&mut self, to: TransactionStatus) -> Result<()> {
        if self.status.is_terminal() || !to.is_terminal() {
            return Err(StakingError::InvalidTransition {
                id: self.id.to_string(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}
