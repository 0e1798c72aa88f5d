use crate::dto::TransactionRequest;
use crate::error::{Result, StakingError};
use crate::transaction_service::TransactionService;
use std::sync::Arc;
use tracing::{info, warn};

/// Hands assembled requests to the transaction service.
#[derive(Clone)]
pub struct TransactionSubmitter {
    transaction_service: Arc<dyn TransactionService>,
}

impl TransactionSubmitter {
    pub fn new(transaction_service: Arc<dyn TransactionService>) -> TransactionSubmitter {
        TransactionSubmitter {
            transaction_service,
        }
    }

    pub fn transaction_service(&self) -> &Arc<dyn TransactionService> {
        &self.transaction_service
    }

    pub async fn submit(&self, request: &TransactionRequest, network_id: &str) -> Result<String> {
        match self
            .transaction_service
            .send_transaction(request, network_id)
            .await
        {
            Ok(tx_hash) if tx_hash.trim().is_empty() => {
                warn!("Empty tx hash for request from {} on {}", request.from, network_id);
                Err(StakingError::Broadcast(
                    "transaction service returned an empty hash".to_owned(),
                ))
            }
            Ok(tx_hash) => {
                info!("Submitted {} on {} from {}", tx_hash, network_id, request.from);
                Ok(tx_hash)
            }
            Err(error) => {
                warn!("Submission on {} failed: {}", network_id, error);
                Err(StakingError::Broadcast(error.to_string()))
            }
        }
    }
}
