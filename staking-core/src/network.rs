use crate::dto::ChainFamily;
use crate::encoder::{ChainEncoder, EncoderRegistry};
use crate::error::{Result, StakingError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct NetworkDescriptor {
    pub id: String,
    pub name: String,
    pub chain_family: ChainFamily,
    pub is_mainnet: bool,
    /// Contract (or module account) staking calls are addressed to.
    pub staking_contract: String,
}

/// Aggregate read API base urls of one chain family.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ApiEndpoints {
    pub mainnet: String,
    pub testnet: String,
}

impl ApiEndpoints {
    pub fn select(&self, is_mainnet: bool) -> &str {
        if is_mainnet {
            &self.mainnet
        } else {
            &self.testnet
        }
    }
}

/// Lookup of network descriptors by id.
pub trait NetworkService: Send + Sync {
    fn get_network_by_id(&self, id: &str) -> Option<NetworkDescriptor>;

    fn is_mainnet(&self, id: &str) -> Option<bool> {
        self.get_network_by_id(id).map(|network| network.is_mainnet)
    }
}

/// Caller supplied network table.
#[derive(Clone, Debug, Default)]
pub struct NetworkTable {
    networks: HashMap<String, NetworkDescriptor>,
}

impl NetworkTable {
    pub fn new(networks: Vec<NetworkDescriptor>) -> NetworkTable {
        NetworkTable {
            networks: networks
                .into_iter()
                .map(|network| (network.id.to_owned(), network))
                .collect(),
        }
    }

    pub fn with_defaults() -> NetworkTable {
        NetworkTable::new(default_networks())
    }

    pub fn networks(&self) -> Vec<&NetworkDescriptor> {
        let mut networks: Vec<&NetworkDescriptor> = self.networks.values().collect();
        networks.sort_by(|a, b| a.id.cmp(&b.id));
        networks
    }
}

impl NetworkService for NetworkTable {
    fn get_network_by_id(&self, id: &str) -> Option<NetworkDescriptor> {
        self.networks.get(id).cloned()
    }
}

pub fn default_networks() -> Vec<NetworkDescriptor> {
    let network = |id: &str, name: &str, chain_family, is_mainnet, staking_contract: &str| {
        NetworkDescriptor {
            id: id.to_owned(),
            name: name.to_owned(),
            chain_family,
            is_mainnet,
            staking_contract: staking_contract.to_owned(),
        }
    };
    vec![
        network(
            "catena-mainnet",
            "Catena",
            ChainFamily::Account,
            true,
            "0x0000000000000000000000000000000000001000",
        ),
        network(
            "catena-testnet",
            "Catena Testnet",
            ChainFamily::Account,
            false,
            "0x0000000000000000000000000000000000001000",
        ),
        network(
            "ordo-mainnet",
            "Ordo",
            ChainFamily::Utxo,
            true,
            "0x00000000000000000000000000000000000000a1",
        ),
        network(
            "ordo-testnet",
            "Ordo Testnet",
            ChainFamily::Utxo,
            false,
            "0x00000000000000000000000000000000000000a1",
        ),
        network(
            "foedus-mainnet",
            "Foedus",
            ChainFamily::Federated,
            true,
            "0x000000000000000000000000000000000000f0ed",
        ),
        network(
            "foedus-testnet",
            "Foedus Testnet",
            ChainFamily::Federated,
            false,
            "0x000000000000000000000000000000000000f0ed",
        ),
    ]
}

/// Everything an operation needs to know about its network.
#[derive(Clone)]
pub struct ResolvedNetwork {
    pub network: NetworkDescriptor,
    pub chain_family: ChainFamily,
    pub is_mainnet: bool,
    /// Aggregate read API of the family, mainnet or testnet variant.
    pub api_endpoint: Option<String>,
    pub encoder: Arc<dyn ChainEncoder>,
}

pub struct NetworkRegistry {
    networks: Arc<dyn NetworkService>,
    encoders: EncoderRegistry,
    endpoints: HashMap<ChainFamily, ApiEndpoints>,
}

impl NetworkRegistry {
    pub fn new(
        networks: Arc<dyn NetworkService>,
        encoders: EncoderRegistry,
        endpoints: HashMap<ChainFamily, ApiEndpoints>,
    ) -> NetworkRegistry {
        NetworkRegistry {
            networks,
            encoders,
            endpoints,
        }
    }

    pub fn network_service(&self) -> &Arc<dyn NetworkService> {
        &self.networks
    }

    pub fn resolve(&self, network_id: &str) -> Result<ResolvedNetwork> {
        let network = self
            .networks
            .get_network_by_id(network_id)
            .ok_or_else(|| StakingError::NetworkNotFound(network_id.to_owned()))?;
        let encoder = self.encoders.get(network.chain_family)?;
        let api_endpoint = self
            .endpoints
            .get(&network.chain_family)
            .map(|endpoints| endpoints.select(network.is_mainnet).trim_end_matches('/').to_owned());
        Ok(ResolvedNetwork {
            chain_family: network.chain_family,
            is_mainnet: network.is_mainnet,
            api_endpoint,
            encoder,
            network,
        })
    }
}
