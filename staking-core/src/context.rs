use crate::aggregate::{AggregateClient, StakingDataSource};
use crate::config::StakingConfig;
use crate::dto::ChainFamily;
use crate::encoder::EncoderRegistry;
use crate::error::Result;
use crate::ledger::TransactionLedger;
use crate::monitor::{MonitorConfig, TransactionMonitor};
use crate::network::{ApiEndpoints, NetworkRegistry, NetworkService, NetworkTable};
use crate::services::{
    AutocompoundService, DelegationService, Pipeline, RewardsService, ValidatorService,
};
use crate::submitter::TransactionSubmitter;
use crate::transaction_service::{HttpTransactionService, TransactionService};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Owns every staking component. Built once by whatever composes the
/// application and passed around explicitly.
#[derive(Clone)]
pub struct StakingContext {
    pub delegation: DelegationService,
    pub rewards: RewardsService,
    pub autocompound: AutocompoundService,
    pub validators: ValidatorService,
    pipeline: Arc<Pipeline>,
}

impl StakingContext {
    pub fn new(
        networks: Arc<dyn NetworkService>,
        encoders: EncoderRegistry,
        endpoints: HashMap<ChainFamily, ApiEndpoints>,
        transaction_service: Arc<dyn TransactionService>,
        data_source: Arc<dyn StakingDataSource>,
        monitor_config: MonitorConfig,
    ) -> StakingContext {
        let registry = Arc::new(NetworkRegistry::new(networks, encoders, endpoints));
        let pipeline = Arc::new(Pipeline::new(
            registry,
            TransactionSubmitter::new(transaction_service.clone()),
            TransactionMonitor::new(transaction_service, monitor_config),
            data_source,
            TransactionLedger::new(),
        ));
        StakingContext {
            delegation: DelegationService::new(pipeline.clone()),
            rewards: RewardsService::new(pipeline.clone()),
            autocompound: AutocompoundService::new(pipeline.clone()),
            validators: ValidatorService::new(pipeline.clone()),
            pipeline,
        }
    }

    /// HTTP collaborators and the default encoders, configured from `config`.
    pub fn from_config(config: &StakingConfig) -> Result<StakingContext> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let networks = NetworkTable::new(config.network_table());
        info!(
            "Staking context with {} networks, {} endpoint families",
            networks.networks().len(),
            config.endpoints.len()
        );
        Ok(StakingContext::new(
            Arc::new(networks),
            EncoderRegistry::with_defaults(),
            config.endpoints.clone(),
            Arc::new(HttpTransactionService::new(
                client.clone(),
                &config.transaction_service_url,
                config.transaction_service_token.clone(),
            )),
            Arc::new(AggregateClient::new(client)),
            config.monitor_config(),
        ))
    }

    pub fn registry(&self) -> &Arc<NetworkRegistry> {
        self.pipeline.registry()
    }

    pub fn ledger(&self) -> &TransactionLedger {
        self.pipeline.ledger()
    }
}
