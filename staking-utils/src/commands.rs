use clap::{Args, Subcommand};
use serde::Serialize;
use staking_core::amount::Amount;
use staking_core::dto::{LockupPeriod, RewardHistoryQuery, StakingTransaction, ValidatorStatus};
use staking_core::monitor::{AbandonReason, MonitorOutcome};
use staking_core::services::{PendingOperation, ValidatorFilter, ValidatorSort};
use std::error::Error;
use tracing::info;

#[derive(Debug, Args)]
pub struct NetworkArgs {
    /// Network id, viz. catena-mainnet
    #[clap(short, long)]
    pub network: String,
}

#[derive(Debug, Args)]
pub struct AccountArgs {
    #[clap(flatten)]
    pub network: NetworkArgs,

    /// Delegator address
    #[clap(short, long)]
    pub address: String,
}

#[derive(Debug, Subcommand)]
pub enum ValidatorCommands {
    /// List validators of a network
    List {
        #[clap(flatten)]
        network: NetworkArgs,

        /// Only validators with this status, viz. ACTIVE
        #[clap(long)]
        status: Option<ValidatorStatus>,

        /// stake, commission or name
        #[clap(long, default_value_t = ValidatorSort::Stake)]
        sort: ValidatorSort,

        #[clap(long, default_value_t = 0)]
        offset: usize,

        #[clap(long)]
        limit: Option<usize>,
    },
    /// Search validators by name or address
    Search {
        #[clap(flatten)]
        network: NetworkArgs,

        #[clap(short, long)]
        query: String,
    },
    /// Details of one validator
    Details {
        #[clap(flatten)]
        network: NetworkArgs,

        #[clap(short, long)]
        validator: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum RewardCommands {
    /// Unclaimed rewards of a delegator
    Pending(AccountArgs),
    /// Reward history of a delegator
    History {
        #[clap(flatten)]
        account: AccountArgs,

        /// Period understood by the aggregate source, viz. 30d
        #[clap(long)]
        period: Option<String>,

        #[clap(long)]
        validator: Option<String>,

        #[clap(long)]
        offset: Option<u32>,

        #[clap(long)]
        limit: Option<u32>,
    },
}

#[derive(Debug, Args)]
pub struct StakeArgs {
    #[clap(flatten)]
    pub account: AccountArgs,

    #[clap(short, long)]
    pub validator: String,

    /// Amount in base units
    #[clap(long)]
    pub amount: String,

    /// FLEXIBLE, THIRTY_DAYS, NINETY_DAYS, ONE_HUNDRED_EIGHTY_DAYS or THREE_HUNDRED_SIXTY_FIVE_DAYS
    #[clap(long, default_value_t = LockupPeriod::Flexible)]
    pub period: LockupPeriod,
}

#[derive(Debug, Args)]
pub struct UnstakeArgs {
    #[clap(flatten)]
    pub account: AccountArgs,

    #[clap(short, long)]
    pub delegation: String,

    /// Percentage of the delegation, 0 to 100
    #[clap(short, long)]
    pub percentage: f64,
}

#[derive(Debug, Args)]
pub struct RedelegateArgs {
    #[clap(flatten)]
    pub account: AccountArgs,

    #[clap(short, long)]
    pub delegation: String,

    /// Destination validator
    #[clap(long)]
    pub to: String,

    /// Amount in base units, or "all"
    #[clap(long, value_parser = parse_amount, default_value = "all")]
    pub amount: Amount,
}

#[derive(Debug, Args)]
pub struct ClaimArgs {
    #[clap(flatten)]
    pub account: AccountArgs,

    #[clap(short, long)]
    pub validator: String,
}

#[derive(Debug, Args)]
pub struct WithdrawArgs {
    #[clap(flatten)]
    pub account: AccountArgs,

    #[clap(short, long)]
    pub reward: String,

    /// Amount in base units, or "all"
    #[clap(long, value_parser = parse_amount, default_value = "all")]
    pub amount: Amount,
}

#[derive(Debug, Subcommand)]
pub enum AutocompoundCommands {
    /// Restake a percentage of future rewards
    Enable {
        #[clap(flatten)]
        account: AccountArgs,

        #[clap(short, long)]
        validator: String,

        /// Percentage of rewards, 0 to 100
        #[clap(short, long)]
        percentage: f64,
    },
    Disable(ClaimArgs),
}

fn parse_amount(value: &str) -> Result<Amount, String> {
    value.parse::<Amount>().map_err(|error| error.to_string())
}

pub fn validator_filter(
    status: Option<ValidatorStatus>,
    sort: ValidatorSort,
    offset: usize,
    limit: Option<usize>,
) -> ValidatorFilter {
    ValidatorFilter {
        status,
        sort,
        offset,
        limit,
    }
}

pub fn history_query(
    period: Option<String>,
    validator: Option<String>,
    offset: Option<u32>,
    limit: Option<u32>,
) -> RewardHistoryQuery {
    RewardHistoryQuery {
        period,
        validator,
        offset,
        limit,
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    transaction: &'a StakingTransaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    abandoned: Option<String>,
}

/// Prints the PENDING record, or waits for the monitor and prints the final
/// record when `wait` is set.
pub async fn report(operation: PendingOperation, wait: bool) -> Result<(), Box<dyn Error>> {
    if !wait {
        return print_json(&Report {
            transaction: &operation.into_transaction(),
            abandoned: None,
        });
    }
    info!("Waiting for {}", operation.transaction.tx_hash);
    let pending = operation.transaction.clone();
    match operation.monitor.wait().await {
        Some(MonitorOutcome::Completed(transaction)) => print_json(&Report {
            transaction: &transaction,
            abandoned: None,
        }),
        Some(MonitorOutcome::Abandoned {
            transaction,
            reason,
        }) => print_json(&Report {
            transaction: &transaction,
            abandoned: Some(describe(reason)),
        }),
        None => print_json(&Report {
            transaction: &pending,
            abandoned: Some("monitor stopped".to_owned()),
        }),
    }
}

fn describe(reason: AbandonReason) -> String {
    match reason {
        AbandonReason::Expired => "gave up waiting".to_owned(),
        AbandonReason::Cancelled => "cancelled".to_owned(),
    }
}
