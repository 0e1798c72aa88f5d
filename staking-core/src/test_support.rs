// In-memory collaborators shared by the unit tests.

use crate::aggregate::StakingDataSource;
use crate::dto::{
    ChainFamily, Delegation, DelegationStatus, ExternalStatus, LockupPeriod, RewardHistoryQuery,
    StakingReward, StakingTransaction, TransactionRequest, Validator, ValidatorStatus,
};
use crate::encoder::EncoderRegistry;
use crate::error::ServiceError;
use crate::monitor::{AbandonReason, CompletionHandler, MonitorConfig};
use crate::network::{ApiEndpoints, NetworkTable};
use crate::services::same_address;
use crate::transaction_service::TransactionService;
use crate::StakingContext;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const VALIDATOR_A: &str = "0xAAA0000000000000000000000000000000AAAA";
pub const VALIDATOR_B: &str = "0xBBB0000000000000000000000000000000BBBB";
pub const VALIDATOR_C: &str = "0xCCC0000000000000000000000000000000CCCC";
pub const DELEGATOR: &str = "0x1234000000000000000000000000000000005678";

pub struct FakeTransactionService {
    script: Mutex<VecDeque<Result<ExternalStatus, String>>>,
    fallback: ExternalStatus,
    send_error: Option<String>,
    fixed_hash: Option<String>,
    sent: Mutex<Vec<(TransactionRequest, String)>>,
    status_calls: AtomicUsize,
}

impl FakeTransactionService {
    /// Every status poll reports `fallback` once the script is exhausted.
    pub fn scripted(script: Vec<Result<ExternalStatus, &str>>, fallback: ExternalStatus) -> Self {
        FakeTransactionService {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|step| step.map_err(|error| error.to_owned()))
                    .collect(),
            ),
            fallback,
            send_error: None,
            fixed_hash: None,
            sent: Mutex::new(vec![]),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn confirming() -> Self {
        Self::scripted(vec![], ExternalStatus::Confirmed)
    }

    pub fn failing_sends(error: &str) -> Self {
        FakeTransactionService {
            send_error: Some(error.to_owned()),
            ..Self::confirming()
        }
    }

    /// Hands out the same hash for every send, like an idempotent resubmit.
    pub fn repeating_hash(tx_hash: &str) -> Self {
        FakeTransactionService {
            fixed_hash: Some(tx_hash.to_owned()),
            ..Self::confirming()
        }
    }

    pub fn sent(&self) -> Vec<(TransactionRequest, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn status_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionService for FakeTransactionService {
    async fn send_transaction(
        &self,
        request: &TransactionRequest,
        network_id: &str,
    ) -> Result<String, ServiceError> {
        if let Some(error) = &self.send_error {
            return Err(ServiceError::Rejected(error.to_owned()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((request.clone(), network_id.to_owned()));
        match &self.fixed_hash {
            Some(tx_hash) => Ok(tx_hash.to_owned()),
            None => Ok(format!("0xfeed{:04}", sent.len())),
        }
    }

    async fn get_transaction_status(
        &self,
        _network_id: &str,
        _tx_hash: &str,
    ) -> Result<ExternalStatus, ServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(error)) => Err(ServiceError::Other(error)),
            None => Ok(self.fallback),
        }
    }
}

#[derive(Default)]
pub struct FakeDataSource {
    pub delegations: Vec<Delegation>,
    pub pending: Vec<StakingReward>,
    pub history: Vec<StakingReward>,
    pub validators: Vec<Validator>,
    pub reads: AtomicUsize,
}

impl FakeDataSource {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StakingDataSource for FakeDataSource {
    async fn get_delegations(&self, _endpoint: &str, _address: &str) -> Vec<Delegation> {
        self.read();
        self.delegations.clone()
    }

    async fn get_pending_rewards(&self, _endpoint: &str, _address: &str) -> Vec<StakingReward> {
        self.read();
        self.pending.clone()
    }

    async fn get_reward_history(
        &self,
        _endpoint: &str,
        _address: &str,
        query: &RewardHistoryQuery,
    ) -> Vec<StakingReward> {
        self.read();
        self.history
            .iter()
            .filter(|reward| {
                query
                    .validator
                    .as_deref()
                    .map_or(true, |validator| same_address(&reward.validator_address, validator))
            })
            .cloned()
            .collect()
    }

    async fn get_reward(&self, _endpoint: &str, reward_id: &str) -> Option<StakingReward> {
        self.read();
        self.pending
            .iter()
            .chain(self.history.iter())
            .find(|reward| reward.id == reward_id)
            .cloned()
    }

    async fn list_validators(&self, _endpoint: &str) -> Vec<Validator> {
        self.read();
        self.validators.clone()
    }

    async fn get_validator(&self, _endpoint: &str, address: &str) -> Option<Validator> {
        self.read();
        self.validators
            .iter()
            .find(|validator| same_address(&validator.address, address))
            .cloned()
    }
}

#[derive(Default)]
pub struct CountingHandler {
    pub completed: Mutex<Vec<StakingTransaction>>,
    pub abandoned: Mutex<Vec<AbandonReason>>,
}

impl CountingHandler {
    pub fn completed(&self) -> Vec<StakingTransaction> {
        self.completed.lock().unwrap().clone()
    }

    pub fn abandoned(&self) -> Vec<AbandonReason> {
        self.abandoned.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionHandler for CountingHandler {
    async fn on_complete(&self, transaction: &StakingTransaction) {
        self.completed.lock().unwrap().push(transaction.clone());
    }

    async fn on_abandoned(&self, _transaction: &StakingTransaction, reason: AbandonReason) {
        self.abandoned.lock().unwrap().push(reason);
    }
}

pub fn fast_monitor_config() -> MonitorConfig {
    MonitorConfig {
        initial_delay: Duration::from_secs(1),
        poll_interval: Duration::from_secs(1),
        max_poll_interval: Duration::from_secs(4),
        backoff_multiplier: 2.0,
        max_attempts: 10,
        deadline: Duration::from_secs(3600),
    }
}

pub fn test_endpoints() -> HashMap<ChainFamily, ApiEndpoints> {
    [ChainFamily::Account, ChainFamily::Utxo, ChainFamily::Federated]
        .into_iter()
        .map(|family| {
            (
                family,
                ApiEndpoints {
                    mainnet: format!("http://aggregate.test/{}/mainnet", family),
                    testnet: format!("http://aggregate.test/{}/testnet", family),
                },
            )
        })
        .collect()
}

pub fn test_context(
    transaction_service: Arc<FakeTransactionService>,
    data_source: Arc<FakeDataSource>,
) -> StakingContext {
    StakingContext::new(
        Arc::new(NetworkTable::with_defaults()),
        EncoderRegistry::with_defaults(),
        test_endpoints(),
        transaction_service,
        data_source,
        fast_monitor_config(),
    )
}

pub fn delegation(id: &str, validator: &str, amount: &str, status: DelegationStatus) -> Delegation {
    Delegation {
        id: id.to_owned(),
        validator_address: validator.to_owned(),
        amount: amount.to_owned(),
        period: Some(LockupPeriod::ThirtyDays),
        status,
    }
}

pub fn reward(id: &str, validator: &str, amount: &str) -> StakingReward {
    StakingReward {
        id: id.to_owned(),
        staking_id: None,
        validator_address: validator.to_owned(),
        amount: amount.to_owned(),
        claimed: false,
        timestamp: Some(1_700_000_000),
    }
}

pub fn validator(
    address: &str,
    name: &str,
    status: ValidatorStatus,
    commission: f64,
    stake: &str,
) -> Validator {
    Validator {
        address: address.to_owned(),
        name: name.to_owned(),
        status,
        commission,
        total_stake: stake.to_owned(),
        self_stake: None,
        delegator_count: Some(10),
    }
}

/// Answers every request on a local port with `status` and `body`, and
/// returns the base url.
pub async fn serve_http(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request(&mut stream).await;
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
                     Connection: close\r\n\r\n{}",
                    status,
                    if status < 400 { "OK" } else { "Error" },
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    format!("http://{}", address)
}

async fn read_request(stream: &mut TcpStream) {
    let mut received = Vec::new();
    let mut buffer = [0u8; 1024];
    loop {
        match stream.read(&mut buffer).await {
            Ok(0) | Err(_) => return,
            Ok(read) => received.extend_from_slice(&buffer[..read]),
        }
        let text = String::from_utf8_lossy(&received);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if received.len() >= end + 4 + length {
                return;
            }
        }
    }
}
