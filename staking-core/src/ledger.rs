use crate::dto::{DelegationStatus, OperationType, StakingTransaction, TransactionStatus};
use crate::error::{Result, StakingError};
use crate::monitor::{AbandonReason, CompletionHandler};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Local book of the staking transactions created by this process.
#[derive(Clone, Default)]
pub struct TransactionLedger {
    transactions: Arc<RwLock<HashMap<Uuid, StakingTransaction>>>,
}

impl TransactionLedger {
    pub fn new() -> TransactionLedger {
        TransactionLedger::default()
    }

    /// Records a new transaction. An id that is already present, e.g. a hash
    /// the transaction service handed out twice, is left untouched.
    pub async fn insert(&self, transaction: StakingTransaction) -> Result<()> {
        match self.transactions.write().await.entry(transaction.id) {
            Entry::Occupied(existing) => Err(StakingError::AlreadyRecorded {
                id: transaction.id.to_string(),
                status: existing.get().status,
            }),
            Entry::Vacant(slot) => {
                slot.insert(transaction);
                Ok(())
            }
        }
    }

    pub async fn get(&self, id: &Uuid) -> Option<StakingTransaction> {
        self.transactions.read().await.get(id).cloned()
    }

    /// Newest first.
    pub async fn list_by_address(&self, address: &str) -> Vec<StakingTransaction> {
        let mut transactions: Vec<StakingTransaction> = self
            .transactions
            .read()
            .await
            .values()
            .filter(|transaction| transaction.from_address.eq_ignore_ascii_case(address))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        transactions
    }

    pub async fn list_pending(&self) -> Vec<StakingTransaction> {
        self.transactions
            .read()
            .await
            .values()
            .filter(|transaction| transaction.status == TransactionStatus::Pending)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.transactions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.transactions.read().await.is_empty()
    }

    /// Drops terminal records last updated more than `max_age` ago and
    /// returns how many went. Pending records stay until their monitor
    /// settles them. Entries otherwise live as long as the ledger.
    pub async fn prune_settled(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut transactions = self.transactions.write().await;
        let before = transactions.len();
        transactions.retain(|_, transaction| {
            !transaction.status.is_terminal() || transaction.updated_at >= cutoff
        });
        let pruned = before - transactions.len();
        if pruned > 0 {
            info!("Pruned {} settled transactions", pruned);
        }
        pruned
    }

    /// Stores the terminal record produced by a monitor. A record that is
    /// already terminal in the ledger is never overwritten.
    pub async fn record_outcome(&self, transaction: &StakingTransaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        match transactions.get(&transaction.id) {
            Some(existing) if existing.status.is_terminal() => {
                Err(StakingError::InvalidTransition {
                    id: transaction.id.to_string(),
                    from: existing.status,
                    to: transaction.status,
                })
            }
            _ => {
                transactions.insert(transaction.id, transaction.clone());
                Ok(())
            }
        }
    }
}

/// Delegation state the aggregate source is expected to show once the
/// operation is confirmed.
pub fn expected_delegation_status(operation: OperationType) -> Option<DelegationStatus> {
    match operation {
        OperationType::Stake | OperationType::Redelegate => Some(DelegationStatus::Active),
        OperationType::Unstake => Some(DelegationStatus::Unbonding),
        _ => None,
    }
}

/// Completion handler used by every staking operation: records the outcome
/// and logs what the confirmed operation implies.
pub struct LedgerCompletionHandler {
    ledger: TransactionLedger,
}

impl LedgerCompletionHandler {
    pub fn new(ledger: TransactionLedger) -> LedgerCompletionHandler {
        LedgerCompletionHandler { ledger }
    }

    fn log_confirmed(transaction: &StakingTransaction) {
        match transaction.operation {
            OperationType::Stake | OperationType::Unstake | OperationType::Redelegate => {
                let validator = transaction
                    .new_validator_address
                    .as_deref()
                    .unwrap_or(&transaction.validator_address);
                if let Some(status) = expected_delegation_status(transaction.operation) {
                    info!(
                        "Delegation of {} to {} expected {}",
                        transaction.from_address, validator, status
                    );
                }
            }
            OperationType::ClaimRewards
            | OperationType::ClaimAllRewards
            | OperationType::WithdrawRewards => {
                info!(
                    "Rewards of {} from {} expected claimed",
                    transaction.from_address, transaction.validator_address
                );
            }
            OperationType::EnableAutocompound => {
                info!(
                    "Autocompound at {:?}% enabled for {} on {}",
                    transaction.auto_compound_percentage,
                    transaction.from_address,
                    transaction.validator_address
                );
            }
            OperationType::DisableAutocompound => {
                info!(
                    "Autocompound disabled for {} on {}",
                    transaction.from_address, transaction.validator_address
                );
            }
        }
    }
}

#[async_trait]
impl CompletionHandler for LedgerCompletionHandler {
    async fn on_complete(&self, transaction: &StakingTransaction) {
        if let Err(error) = self.ledger.record_outcome(transaction).await {
            warn!("Could not record outcome: {}", error);
            return;
        }
        match transaction.status {
            TransactionStatus::Confirmed => Self::log_confirmed(transaction),
            status => warn!(
                "{} {} from {} ended {}",
                transaction.operation, transaction.tx_hash, transaction.from_address, status
            ),
        }
    }

    async fn on_abandoned(&self, transaction: &StakingTransaction, reason: AbandonReason) {
        warn!(
            "{} {} left {} in the ledger: {:?}",
            transaction.operation, transaction.tx_hash, transaction.status, reason
        );
    }
}
