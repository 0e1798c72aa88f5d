use super::{call_value, same_address, OperationCall, PendingOperation, Pipeline};
use crate::amount::{
    parse_base_units, share_of, to_basis_points, validate_percentage, Amount, U256,
};
use crate::dto::{Backreference, Delegation, DelegationStatus, LockupPeriod, OperationType};
use crate::encoder::{pad_address, EncodeArg};
use crate::error::{Result, StakingError};
use crate::network::ResolvedNetwork;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct DelegationService {
    pipeline: Arc<Pipeline>,
}

impl DelegationService {
    pub fn new(pipeline: Arc<Pipeline>) -> DelegationService {
        DelegationService { pipeline }
    }

    pub async fn stake(
        &self,
        network_id: &str,
        from: &str,
        validator: &str,
        amount: &str,
        period: LockupPeriod,
    ) -> Result<PendingOperation> {
        let amount = parse_base_units(amount)?;
        let resolved = self.pipeline.resolve(network_id)?;
        info!("stake {} to {} on {}", amount, validator, network_id);

        let call = OperationCall {
            operation: OperationType::Stake,
            from,
            validator,
            args: vec![
                EncodeArg::address(validator),
                EncodeArg::uint(amount),
                EncodeArg::uint(period.days()),
            ],
            value: call_value(resolved.chain_family, OperationType::Stake, amount),
        };
        self.pipeline
            .execute(&resolved, call, |transaction| {
                transaction.with_amount(amount).with_period(period)
            })
            .await
    }

    /// Unstakes `percentage` percent of an existing delegation.
    pub async fn unstake(
        &self,
        network_id: &str,
        from: &str,
        delegation_id: &str,
        percentage: f64,
    ) -> Result<PendingOperation> {
        validate_percentage(percentage)?;
        let resolved = self.pipeline.resolve(network_id)?;
        let delegation = self.find_delegation(&resolved, from, delegation_id).await?;
        if delegation.status != DelegationStatus::Active {
            return Err(StakingError::validation(format!(
                "delegation {} is {}",
                delegation.id, delegation.status
            )));
        }
        let delegated = parse_base_units(&delegation.amount)?;
        let amount = share_of(delegated, to_basis_points(percentage));
        if amount.is_zero() {
            return Err(StakingError::validation(format!(
                "{}% of {} rounds to zero",
                percentage, delegated
            )));
        }
        info!(
            "unstake {} ({}%) of delegation {} on {}",
            amount, percentage, delegation.id, network_id
        );

        let call = OperationCall {
            operation: OperationType::Unstake,
            from,
            validator: &delegation.validator_address,
            args: vec![
                EncodeArg::address(&delegation.validator_address),
                EncodeArg::uint(amount),
            ],
            value: None,
        };
        let delegation_id = delegation.id.to_owned();
        let period = delegation.period;
        self.pipeline
            .execute(&resolved, call, move |transaction| {
                let transaction = transaction
                    .with_amount(amount)
                    .with_backreference(Backreference::Delegation(delegation_id));
                match period {
                    Some(period) => transaction.with_period(period),
                    None => transaction,
                }
            })
            .await
    }

    /// Moves `amount` of a delegation to another validator; `Amount::All`
    /// moves all of it.
    pub async fn redelegate(
        &self,
        network_id: &str,
        from: &str,
        delegation_id: &str,
        new_validator: &str,
        amount: Amount,
    ) -> Result<PendingOperation> {
        if amount == Amount::Exact(U256::zero()) {
            return Err(StakingError::validation("amount must be greater than zero"));
        }
        pad_address(new_validator)?;
        let resolved = self.pipeline.resolve(network_id)?;
        let delegation = self.find_delegation(&resolved, from, delegation_id).await?;
        if same_address(&delegation.validator_address, new_validator) {
            return Err(StakingError::validation(format!(
                "delegation {} is already with {}",
                delegation.id, new_validator
            )));
        }
        if delegation.status != DelegationStatus::Active {
            return Err(StakingError::validation(format!(
                "delegation {} is {}",
                delegation.id, delegation.status
            )));
        }
        let amount = amount.resolve(parse_base_units(&delegation.amount)?)?;
        info!(
            "redelegate {} from {} to {} on {}",
            amount, delegation.validator_address, new_validator, network_id
        );

        let call = OperationCall {
            operation: OperationType::Redelegate,
            from,
            validator: &delegation.validator_address,
            args: vec![
                EncodeArg::address(&delegation.validator_address),
                EncodeArg::address(new_validator),
                EncodeArg::uint(amount),
            ],
            value: None,
        };
        let delegation_id = delegation.id.to_owned();
        self.pipeline
            .execute(&resolved, call, move |transaction| {
                transaction
                    .with_amount(amount)
                    .with_new_validator(new_validator)
                    .with_backreference(Backreference::Delegation(delegation_id))
            })
            .await
    }

    /// Empty when the aggregate source is unavailable.
    pub async fn get_delegations(
        &self,
        network_id: &str,
        address: &str,
    ) -> Result<Vec<Delegation>> {
        let resolved = self.pipeline.resolve(network_id)?;
        Ok(self.read_delegations(&resolved, address).await)
    }

    async fn read_delegations(&self, resolved: &ResolvedNetwork, address: &str) -> Vec<Delegation> {
        match self.pipeline.endpoint(resolved) {
            Some(endpoint) => {
                self.pipeline
                    .data_source()
                    .get_delegations(endpoint, address)
                    .await
            }
            None => vec![],
        }
    }

    async fn find_delegation(
        &self,
        resolved: &ResolvedNetwork,
        from: &str,
        delegation_id: &str,
    ) -> Result<Delegation> {
        self.read_delegations(resolved, from)
            .await
            .into_iter()
            .find(|delegation| delegation.id == delegation_id)
            .ok_or_else(|| StakingError::not_found("delegation", delegation_id))
    }
}
