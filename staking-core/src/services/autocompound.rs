use super::{OperationCall, PendingOperation, Pipeline};
use crate::amount::{to_basis_points, validate_percentage};
use crate::dto::OperationType;
use crate::encoder::EncodeArg;
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AutocompoundService {
    pipeline: Arc<Pipeline>,
}

impl AutocompoundService {
    pub fn new(pipeline: Arc<Pipeline>) -> AutocompoundService {
        AutocompoundService { pipeline }
    }

    /// Restakes `percentage` percent of future rewards from `validator`.
    pub async fn enable_autocompound(
        &self,
        network_id: &str,
        from: &str,
        validator: &str,
        percentage: f64,
    ) -> Result<PendingOperation> {
        validate_percentage(percentage)?;
        let resolved = self.pipeline.resolve(network_id)?;
        info!(
            "enable autocompound {}% for {} on {}",
            percentage, validator, network_id
        );
        let call = OperationCall {
            operation: OperationType::EnableAutocompound,
            from,
            validator,
            args: vec![
                EncodeArg::address(validator),
                EncodeArg::uint(to_basis_points(percentage)),
            ],
            value: None,
        };
        self.pipeline
            .execute(&resolved, call, |transaction| {
                transaction.with_auto_compound_percentage(percentage)
            })
            .await
    }

    pub async fn disable_autocompound(
        &self,
        network_id: &str,
        from: &str,
        validator: &str,
    ) -> Result<PendingOperation> {
        let resolved = self.pipeline.resolve(network_id)?;
        info!("disable autocompound for {} on {}", validator, network_id);
        let call = OperationCall {
            operation: OperationType::DisableAutocompound,
            from,
            validator,
            args: vec![EncodeArg::address(validator)],
            value: None,
        };
        self.pipeline.execute(&resolved, call, |transaction| transaction).await
    }
}
