use super::{normalize_address, same_address, OperationCall, PendingOperation, Pipeline};
use crate::amount::{parse_base_units, Amount, U256};
use crate::dto::{Backreference, OperationType, RewardHistoryQuery, StakingReward};
use crate::encoder::EncodeArg;
use crate::error::{Result, StakingError};
use crate::network::ResolvedNetwork;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct RewardsService {
    pipeline: Arc<Pipeline>,
}

impl RewardsService {
    pub fn new(pipeline: Arc<Pipeline>) -> RewardsService {
        RewardsService { pipeline }
    }

    /// Claims the pending rewards earned with one validator.
    pub async fn claim_rewards(
        &self,
        network_id: &str,
        from: &str,
        validator: &str,
    ) -> Result<PendingOperation> {
        let resolved = self.pipeline.resolve(network_id)?;
        let pending = self.read_pending(&resolved, from).await;
        if !pending
            .iter()
            .any(|reward| same_address(&reward.validator_address, validator))
        {
            return Err(StakingError::validation(format!(
                "no pending rewards from {} for {}",
                validator, from
            )));
        }
        info!("claim rewards of {} from {} on {}", from, validator, network_id);

        let call = OperationCall {
            operation: OperationType::ClaimRewards,
            from,
            validator,
            args: vec![EncodeArg::address(validator)],
            value: None,
        };
        self.pipeline.execute(&resolved, call, |transaction| transaction).await
    }

    /// Claims from every validator that currently owes `from` rewards.
    pub async fn claim_all_rewards(
        &self,
        network_id: &str,
        from: &str,
    ) -> Result<PendingOperation> {
        let resolved = self.pipeline.resolve(network_id)?;
        let pending = self.read_pending(&resolved, from).await;
        let validators = unique_validators(&pending);
        if validators.is_empty() {
            return Err(StakingError::validation(format!(
                "no pending rewards for {}",
                from
            )));
        }
        info!(
            "claim all rewards of {} from {} validators on {}",
            from,
            validators.len(),
            network_id
        );

        let mut args = Vec::with_capacity(validators.len() + 1);
        args.push(EncodeArg::uint(validators.len() as u64));
        args.extend(validators.iter().map(|validator| EncodeArg::address(validator)));
        let joined = validators.join(",");
        let call = OperationCall {
            operation: OperationType::ClaimAllRewards,
            from,
            validator: &joined,
            args,
            value: None,
        };
        self.pipeline.execute(&resolved, call, |transaction| transaction).await
    }

    /// Withdraws a single reward; `Amount::All` withdraws its full amount.
    pub async fn withdraw_reward(
        &self,
        network_id: &str,
        from: &str,
        reward_id: &str,
        amount: Amount,
    ) -> Result<PendingOperation> {
        if amount == Amount::Exact(U256::zero()) {
            return Err(StakingError::validation("amount must be greater than zero"));
        }
        let resolved = self.pipeline.resolve(network_id)?;
        let reward = self
            .read_reward(&resolved, reward_id)
            .await
            .ok_or_else(|| StakingError::not_found("reward", reward_id))?;
        if reward.claimed {
            return Err(StakingError::validation(format!(
                "reward {} is already claimed",
                reward.id
            )));
        }
        let amount = amount.resolve(parse_base_units(&reward.amount)?)?;
        info!("withdraw {} of reward {} on {}", amount, reward.id, network_id);

        let call = OperationCall {
            operation: OperationType::WithdrawRewards,
            from,
            validator: &reward.validator_address,
            args: vec![
                EncodeArg::address(&reward.validator_address),
                EncodeArg::uint(amount),
            ],
            value: None,
        };
        let reward_id = reward.id.to_owned();
        self.pipeline
            .execute(&resolved, call, move |transaction| {
                transaction
                    .with_amount(amount)
                    .with_backreference(Backreference::Reward(reward_id))
            })
            .await
    }

    /// Unclaimed rewards; empty when the aggregate source is unavailable.
    pub async fn get_pending_rewards(
        &self,
        network_id: &str,
        address: &str,
    ) -> Result<Vec<StakingReward>> {
        let resolved = self.pipeline.resolve(network_id)?;
        Ok(self.read_pending(&resolved, address).await)
    }

    pub async fn get_reward_history(
        &self,
        network_id: &str,
        address: &str,
        query: &RewardHistoryQuery,
    ) -> Result<Vec<StakingReward>> {
        let resolved = self.pipeline.resolve(network_id)?;
        Ok(match self.pipeline.endpoint(&resolved) {
            Some(endpoint) => {
                self.pipeline
                    .data_source()
                    .get_reward_history(endpoint, address, query)
                    .await
            }
            None => vec![],
        })
    }

    pub async fn get_reward(
        &self,
        network_id: &str,
        reward_id: &str,
    ) -> Result<Option<StakingReward>> {
        let resolved = self.pipeline.resolve(network_id)?;
        Ok(self.read_reward(&resolved, reward_id).await)
    }

    async fn read_pending(&self, resolved: &ResolvedNetwork, address: &str) -> Vec<StakingReward> {
        let rewards = match self.pipeline.endpoint(resolved) {
            Some(endpoint) => {
                self.pipeline
                    .data_source()
                    .get_pending_rewards(endpoint, address)
                    .await
            }
            None => vec![],
        };
        rewards.into_iter().filter(|reward| !reward.claimed).collect()
    }

    async fn read_reward(
        &self,
        resolved: &ResolvedNetwork,
        reward_id: &str,
    ) -> Option<StakingReward> {
        let endpoint = self.pipeline.endpoint(resolved)?;
        self.pipeline
            .data_source()
            .get_reward(endpoint, reward_id)
            .await
    }
}

/// Validator addresses of `rewards`, each once, in first-seen order.
pub fn unique_validators(rewards: &[StakingReward]) -> Vec<String> {
    let mut seen = HashSet::new();
    rewards
        .iter()
        .filter(|reward| seen.insert(normalize_address(&reward.validator_address)))
        .map(|reward| reward.validator_address.to_owned())
        .collect()
}
