//! Staking operation façades.
//!
//! Every write operation follows one template: validate, resolve the network,
//! encode with the family's encoder, submit, record a PENDING transaction and
//! hand it to a monitor without waiting for the outcome.

pub mod autocompound;
pub mod delegation;
pub mod rewards;
pub mod validators;

use crate::aggregate::StakingDataSource;
use crate::amount::U256;
use crate::dto::{ChainFamily, OperationType, StakingTransaction, TransactionRequest};
use crate::encoder::{payload_hex, EncodeArg};
use crate::error::Result;
use crate::ledger::{LedgerCompletionHandler, TransactionLedger};
use crate::monitor::{CompletionHandler, MonitorHandle, TransactionMonitor};
use crate::network::{NetworkRegistry, ResolvedNetwork};
use crate::submitter::TransactionSubmitter;
use std::sync::Arc;
use tracing::{info, warn};

pub use autocompound::AutocompoundService;
pub use delegation::DelegationService;
pub use rewards::RewardsService;
pub use validators::{ValidatorFilter, ValidatorService, ValidatorSort};

/// A submitted operation: the PENDING record and the handle of its monitor.
pub struct PendingOperation {
    pub transaction: StakingTransaction,
    pub monitor: MonitorHandle,
}

impl PendingOperation {
    /// Detaches the monitor, which keeps running in the background.
    pub fn into_transaction(self) -> StakingTransaction {
        self.transaction
    }
}

/// Describes one write operation after validation.
pub(crate) struct OperationCall<'a> {
    pub operation: OperationType,
    pub from: &'a str,
    pub validator: &'a str,
    pub args: Vec<EncodeArg>,
    /// Native value attached to the call, if any.
    pub value: Option<U256>,
}

/// Components shared by the operation services.
pub struct Pipeline {
    registry: Arc<NetworkRegistry>,
    submitter: TransactionSubmitter,
    monitor: TransactionMonitor,
    data_source: Arc<dyn StakingDataSource>,
    ledger: TransactionLedger,
}

impl Pipeline {
    pub fn new(
        registry: Arc<NetworkRegistry>,
        submitter: TransactionSubmitter,
        monitor: TransactionMonitor,
        data_source: Arc<dyn StakingDataSource>,
        ledger: TransactionLedger,
    ) -> Pipeline {
        Pipeline {
            registry,
            submitter,
            monitor,
            data_source,
            ledger,
        }
    }

    pub fn registry(&self) -> &Arc<NetworkRegistry> {
        &self.registry
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    pub fn data_source(&self) -> &Arc<dyn StakingDataSource> {
        &self.data_source
    }

    pub fn resolve(&self, network_id: &str) -> Result<ResolvedNetwork> {
        self.registry.resolve(network_id)
    }

    /// Aggregate endpoint of the network, `None` logged when not configured.
    pub(crate) fn endpoint<'a>(&self, resolved: &'a ResolvedNetwork) -> Option<&'a str> {
        match resolved.api_endpoint.as_deref() {
            Some(endpoint) => Some(endpoint),
            None => {
                warn!(
                    "No aggregate endpoint configured for {} ({})",
                    resolved.network.id, resolved.chain_family
                );
                None
            }
        }
    }

    /// Encodes, submits, records and starts monitoring. Nothing is recorded
    /// when submission fails.
    pub(crate) async fn execute<F>(
        &self,
        resolved: &ResolvedNetwork,
        call: OperationCall<'_>,
        build: F,
    ) -> Result<PendingOperation>
    where
        F: FnOnce(StakingTransaction) -> StakingTransaction,
    {
        let payload = resolved.encoder.encode(call.operation, &call.args)?;
        let data = payload_hex(&payload);
        let request = TransactionRequest {
            from: call.from.to_owned(),
            to: resolved.network.staking_contract.to_owned(),
            value: call.value.map(|value| value.to_string()),
            data: data.to_owned(),
        };
        let tx_hash = self.submitter.submit(&request, &resolved.network.id).await?;

        let transaction = build(StakingTransaction::new(
            &resolved.network.id,
            call.operation,
            call.from,
            call.validator,
            tx_hash,
            data,
        ));
        if let Err(error) = self.ledger.insert(transaction.clone()).await {
            warn!("Not monitoring {} again: {}", transaction.tx_hash, error);
            return Err(error);
        }
        info!(
            "{} {} recorded as {} ({})",
            transaction.operation, transaction.tx_hash, transaction.id, transaction.status
        );

        let handler: Arc<dyn CompletionHandler> =
            Arc::new(LedgerCompletionHandler::new(self.ledger.clone()));
        let monitor = self
            .monitor
            .start(transaction.clone(), resolved.chain_family, handler);
        Ok(PendingOperation {
            transaction,
            monitor,
        })
    }
}

/// Native value is only attached on account chains, where the staked amount
/// travels with the call.
pub(crate) fn call_value(
    family: ChainFamily,
    operation: OperationType,
    amount: U256,
) -> Option<U256> {
    match (family, operation) {
        (ChainFamily::Account, OperationType::Stake) => Some(amount),
        _ => None,
    }
}

/// Lower-case address without `0x`, for comparisons.
pub fn normalize_address(address: &str) -> String {
    address
        .strip_prefix("0x")
        .unwrap_or(address)
        .to_ascii_lowercase()
}

pub fn same_address(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}
