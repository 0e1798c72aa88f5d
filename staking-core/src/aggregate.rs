use crate::dto::{Delegation, RewardHistoryQuery, StakingReward, Validator};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

/// Off-chain aggregate view of delegations, rewards and validators.
///
/// Every read degrades to an empty collection or `None` instead of failing.
#[async_trait]
pub trait StakingDataSource: Send + Sync {
    async fn get_delegations(&self, endpoint: &str, address: &str) -> Vec<Delegation>;

    async fn get_pending_rewards(&self, endpoint: &str, address: &str) -> Vec<StakingReward>;

    async fn get_reward_history(
        &self,
        endpoint: &str,
        address: &str,
        query: &RewardHistoryQuery,
    ) -> Vec<StakingReward>;

    async fn get_reward(&self, endpoint: &str, reward_id: &str) -> Option<StakingReward>;

    async fn list_validators(&self, endpoint: &str) -> Vec<Validator>;

    async fn get_validator(&self, endpoint: &str, address: &str) -> Option<Validator>;
}

#[derive(Deserialize)]
struct DelegationsResponse {
    delegations: Vec<Delegation>,
}

#[derive(Deserialize)]
struct RewardsResponse {
    rewards: Vec<StakingReward>,
}

#[derive(Deserialize)]
struct RewardResponse {
    reward: Option<StakingReward>,
}

#[derive(Deserialize)]
struct ValidatorsResponse {
    validators: Vec<Validator>,
}

#[derive(Deserialize)]
struct ValidatorResponse {
    validator: Option<Validator>,
}

pub struct AggregateClient {
    client: reqwest::Client,
}

impl AggregateClient {
    pub fn new(client: reqwest::Client) -> AggregateClient {
        AggregateClient { client }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: String, query: &[(&str, String)]) -> Option<T> {
        info!("aggregate url: {:?}", url);
        match self.client.get(&url).query(query).send().await {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => match resp.json::<T>().await {
                    Ok(value) => Some(value),
                    Err(error) => {
                        warn!("Converting to json failed for {}: {:?}", url, error);
                        None
                    }
                },
                Err(error) => {
                    let status = error
                        .status()
                        .map(|status| status.to_string())
                        .unwrap_or_default();
                    warn!("{} reqwest bad status {}: {:?}", url, status, error);
                    None
                }
            },
            Err(error) => {
                warn!("bad response from {}: {:?}", url, error);
                None
            }
        }
    }
}

#[async_trait]
impl StakingDataSource for AggregateClient {
    async fn get_delegations(&self, endpoint: &str, address: &str) -> Vec<Delegation> {
        self.fetch::<DelegationsResponse>(format!("{}/delegations/{}", endpoint, address), &[])
            .await
            .map(|resp| resp.delegations)
            .unwrap_or_default()
    }

    async fn get_pending_rewards(&self, endpoint: &str, address: &str) -> Vec<StakingReward> {
        self.fetch::<RewardsResponse>(format!("{}/pending/{}", endpoint, address), &[])
            .await
            .map(|resp| resp.rewards)
            .unwrap_or_default()
    }

    async fn get_reward_history(
        &self,
        endpoint: &str,
        address: &str,
        query: &RewardHistoryQuery,
    ) -> Vec<StakingReward> {
        self.fetch::<RewardsResponse>(
            format!("{}/history/{}", endpoint, address),
            &query.to_query_params(),
        )
        .await
        .map(|resp| resp.rewards)
        .unwrap_or_default()
    }

    async fn get_reward(&self, endpoint: &str, reward_id: &str) -> Option<StakingReward> {
        self.fetch::<RewardResponse>(format!("{}/reward/{}", endpoint, reward_id), &[])
            .await
            .and_then(|resp| resp.reward)
    }

    async fn list_validators(&self, endpoint: &str) -> Vec<Validator> {
        self.fetch::<ValidatorsResponse>(format!("{}/validators", endpoint), &[])
            .await
            .map(|resp| resp.validators)
            .unwrap_or_default()
    }

    async fn get_validator(&self, endpoint: &str, address: &str) -> Option<Validator> {
        self.fetch::<ValidatorResponse>(format!("{}/validators/{}", endpoint, address), &[])
            .await
            .and_then(|resp| resp.validator)
    }
}
