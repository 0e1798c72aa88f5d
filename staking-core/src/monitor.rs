use crate::dto::{ChainFamily, ExternalStatus, StakingTransaction, TransactionStatus};
use crate::error::StakingError;
use crate::transaction_service::TransactionService;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    pub initial_delay: Duration,
    pub poll_interval: Duration,
    pub max_poll_interval: Duration,
    pub backoff_multiplier: f64,
    pub max_attempts: u32,
    /// Measured from the moment monitoring starts.
    pub deadline: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            initial_delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(3),
            max_poll_interval: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            max_attempts: 100,
            deadline: Duration::from_secs(30 * 60),
        }
    }
}

impl MonitorConfig {
    pub fn next_interval(&self, current: Duration) -> Duration {
        let multiplier = if self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0 {
            self.backoff_multiplier
        } else {
            1.0
        };
        current.mul_f64(multiplier).min(self.max_poll_interval)
    }
}

/// Maps the external status onto a terminal local status, or `None` while the
/// transaction should still be considered in flight.
///
/// Federated chains finalise instantly, so a hash they do not know once the
/// initial delay has passed was dropped.
pub fn terminal_status(family: ChainFamily, status: ExternalStatus) -> Option<TransactionStatus> {
    match status {
        ExternalStatus::Confirmed => Some(TransactionStatus::Confirmed),
        ExternalStatus::Failed => Some(TransactionStatus::Failed),
        ExternalStatus::Rejected => Some(TransactionStatus::Rejected),
        ExternalStatus::Pending => None,
        ExternalStatus::Unknown => match family {
            ChainFamily::Federated => Some(TransactionStatus::Rejected),
            ChainFamily::Account | ChainFamily::Utxo => None,
        },
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AbandonReason {
    Expired,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MonitorOutcome {
    Completed(StakingTransaction),
    Abandoned {
        transaction: StakingTransaction,
        reason: AbandonReason,
    },
}

impl MonitorOutcome {
    pub fn transaction(&self) -> &StakingTransaction {
        match self {
            MonitorOutcome::Completed(transaction) => transaction,
            MonitorOutcome::Abandoned { transaction, .. } => transaction,
        }
    }
}

/// Operation specific reaction to the end of monitoring. Exactly one of the two
/// hooks runs, exactly once, per monitored transaction.
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn on_complete(&self, transaction: &StakingTransaction);

    async fn on_abandoned(&self, transaction: &StakingTransaction, reason: AbandonReason) {
        warn!(
            "Stopped monitoring {} ({}) while {}: {:?}",
            transaction.tx_hash, transaction.operation, transaction.status, reason
        );
    }
}

pub struct MonitorHandle {
    transaction_id: uuid::Uuid,
    cancel: watch::Sender<bool>,
    join: JoinHandle<MonitorOutcome>,
}

impl MonitorHandle {
    pub fn transaction_id(&self) -> uuid::Uuid {
        self.transaction_id
    }

    /// Observed before the next poll.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// `None` if the monitoring task panicked.
    pub async fn wait(self) -> Option<MonitorOutcome> {
        match self.join.await {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                warn!("Monitor for {} ended abnormally: {}", self.transaction_id, error);
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct TransactionMonitor {
    transaction_service: Arc<dyn TransactionService>,
    config: MonitorConfig,
}

impl TransactionMonitor {
    pub fn new(
        transaction_service: Arc<dyn TransactionService>,
        config: MonitorConfig,
    ) -> TransactionMonitor {
        TransactionMonitor {
            transaction_service,
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Spawns a task that owns `transaction` until it reaches a terminal status
    /// or monitoring is abandoned.
    pub fn start(
        &self,
        transaction: StakingTransaction,
        family: ChainFamily,
        handler: Arc<dyn CompletionHandler>,
    ) -> MonitorHandle {
        let (cancel, cancel_rx) = watch::channel(false);
        let transaction_id = transaction.id;
        let join = tokio::spawn(run(
            self.transaction_service.clone(),
            self.config.clone(),
            transaction,
            family,
            handler,
            cancel_rx,
        ));
        MonitorHandle {
            transaction_id,
            cancel,
            join,
        }
    }
}

async fn run(
    transaction_service: Arc<dyn TransactionService>,
    config: MonitorConfig,
    mut transaction: StakingTransaction,
    family: ChainFamily,
    handler: Arc<dyn CompletionHandler>,
    mut cancel_rx: watch::Receiver<bool>,
) -> MonitorOutcome {
    let started = Instant::now();
    info!(
        "Monitoring {} {} on {}",
        transaction.operation, transaction.tx_hash, transaction.network_id
    );

    if wait_or_cancel(config.initial_delay, &mut cancel_rx).await {
        return abandon(transaction, AbandonReason::Cancelled, handler.as_ref()).await;
    }

    let mut interval = config.poll_interval;
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match transaction_service
            .get_transaction_status(&transaction.network_id, &transaction.tx_hash)
            .await
        {
            Ok(status) => match terminal_status(family, status) {
                Some(terminal) => {
                    if let Err(error) = transaction.transition(terminal) {
                        warn!("{}", error);
                    }
                    info!(
                        "{} {} is {} after {} polls",
                        transaction.operation, transaction.tx_hash, transaction.status, attempts
                    );
                    handler.on_complete(&transaction).await;
                    return MonitorOutcome::Completed(transaction);
                }
                None => debug!("{} still {}", transaction.tx_hash, status),
            },
            Err(error) => {
                let error = StakingError::StatusFetch(error.to_string());
                warn!("{} attempt {}: {}", transaction.tx_hash, attempts, error);
            }
        }

        if attempts >= config.max_attempts || started.elapsed() >= config.deadline {
            return abandon(transaction, AbandonReason::Expired, handler.as_ref()).await;
        }
        if wait_or_cancel(interval, &mut cancel_rx).await {
            return abandon(transaction, AbandonReason::Cancelled, handler.as_ref()).await;
        }
        interval = config.next_interval(interval);
    }
}

async fn abandon(
    transaction: StakingTransaction,
    reason: AbandonReason,
    handler: &dyn CompletionHandler,
) -> MonitorOutcome {
    handler.on_abandoned(&transaction, reason).await;
    MonitorOutcome::Abandoned {
        transaction,
        reason,
    }
}

/// Sleeps for `duration`; returns true if cancellation was requested first.
/// A dropped handle detaches the monitor rather than cancelling it.
async fn wait_or_cancel(duration: Duration, cancel_rx: &mut watch::Receiver<bool>) -> bool {
    if *cancel_rx.borrow() {
        return true;
    }
    let delay = sleep(duration);
    tokio::pin!(delay);
    loop {
        tokio::select! {
            _ = &mut delay => return false,
            changed = cancel_rx.changed() => match changed {
                Ok(()) => {
                    if *cancel_rx.borrow() {
                        return true;
                    }
                }
                Err(_) => {
                    (&mut delay).await;
                    return false;
                }
            }
        }
    }
}
