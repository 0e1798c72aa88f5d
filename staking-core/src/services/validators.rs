use super::{normalize_address, same_address, Pipeline};
use crate::dto::{Validator, ValidatorStatus};
use crate::error::{Result, StakingError};
use crate::network::ResolvedNetwork;
use std::cmp::Ordering;
use std::sync::Arc;
use strum::{Display, EnumString};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ValidatorSort {
    /// Largest total stake first.
    #[default]
    Stake,
    /// Lowest commission first.
    Commission,
    Name,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidatorFilter {
    pub status: Option<ValidatorStatus>,
    pub sort: ValidatorSort,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Read-only validator queries. Nothing here submits a transaction.
#[derive(Clone)]
pub struct ValidatorService {
    pipeline: Arc<Pipeline>,
}

impl ValidatorService {
    pub fn new(pipeline: Arc<Pipeline>) -> ValidatorService {
        ValidatorService { pipeline }
    }

    pub async fn list_validators(
        &self,
        network_id: &str,
        filter: &ValidatorFilter,
    ) -> Result<Vec<Validator>> {
        let resolved = self.pipeline.resolve(network_id)?;
        let mut validators: Vec<Validator> = self
            .read_validators(&resolved)
            .await
            .into_iter()
            .filter(|validator| filter.status.map_or(true, |status| validator.status == status))
            .collect();
        validators.sort_by(|a, b| compare(filter.sort, a, b));
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(validators
            .into_iter()
            .skip(filter.offset)
            .take(limit)
            .collect())
    }

    /// Case-insensitive substring match on name or address.
    pub async fn search_validators(&self, network_id: &str, query: &str) -> Result<Vec<Validator>> {
        let resolved = self.pipeline.resolve(network_id)?;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(vec![]);
        }
        let address_query = normalize_address(&query);
        let mut validators: Vec<Validator> = self
            .read_validators(&resolved)
            .await
            .into_iter()
            .filter(|validator| {
                validator.name.to_lowercase().contains(&query)
                    || normalize_address(&validator.address).contains(&address_query)
            })
            .collect();
        validators.sort_by(|a, b| compare(ValidatorSort::Stake, a, b));
        Ok(validators)
    }

    pub async fn get_validator_details(
        &self,
        network_id: &str,
        address: &str,
    ) -> Result<Validator> {
        let resolved = self.pipeline.resolve(network_id)?;
        let endpoint = self
            .pipeline
            .endpoint(&resolved)
            .ok_or_else(|| StakingError::not_found("validator", address))?;
        self.pipeline
            .data_source()
            .get_validator(endpoint, address)
            .await
            .filter(|validator| same_address(&validator.address, address))
            .ok_or_else(|| StakingError::not_found("validator", address))
    }

    async fn read_validators(&self, resolved: &ResolvedNetwork) -> Vec<Validator> {
        match self.pipeline.endpoint(resolved) {
            Some(endpoint) => self.pipeline.data_source().list_validators(endpoint).await,
            None => vec![],
        }
    }
}

fn compare(sort: ValidatorSort, a: &Validator, b: &Validator) -> Ordering {
    match sort {
        ValidatorSort::Stake => b.total_stake_value().cmp(&a.total_stake_value()),
        ValidatorSort::Commission => a
            .commission
            .partial_cmp(&b.commission)
            .unwrap_or(Ordering::Equal),
        ValidatorSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    }
    .then_with(|| a.address.cmp(&b.address))
}
