mod commands;

use clap::{Parser, Subcommand};
use commands::{
    history_query, print_json, report, validator_filter, AccountArgs, AutocompoundCommands,
    ClaimArgs, RedelegateArgs, RewardCommands, StakeArgs, UnstakeArgs, ValidatorCommands,
    WithdrawArgs,
};
use staking_core::config::{StakingConfig, DEFAULT_CONFIG_FILE};
use staking_core::StakingContext;
use std::error::Error;
use tracing::debug;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[derive(Debug, Parser)]
#[clap(name = "staking-utils")]
#[clap(about = "Staking operations across chain families", long_about = None)]
struct Cli {
    /// Toml configuration file, values may be overridden with STAKING_ variables
    #[clap(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Block until the submitted transaction reaches a final status
    #[clap(short, long, global = true)]
    wait: bool,

    #[clap(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Known networks
    Networks,
    #[clap(subcommand)]
    Validators(ValidatorCommands),
    /// Delegations of an address
    Delegations(AccountArgs),
    #[clap(subcommand)]
    Rewards(RewardCommands),
    Stake(StakeArgs),
    Unstake(UnstakeArgs),
    Redelegate(RedelegateArgs),
    /// Claim pending rewards from one validator
    Claim(ClaimArgs),
    /// Claim pending rewards from every validator
    ClaimAll(AccountArgs),
    /// Withdraw a single reward
    Withdraw(WithdrawArgs),
    #[clap(subcommand)]
    Autocompound(AutocompoundCommands),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli: Cli = Cli::parse();
    let config = StakingConfig::load(&cli.config)?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &config.rust_log);
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("staking_utils={}", &config.core_log).parse()?)
                .add_directive(format!("staking_core={}", &config.core_log).parse()?),
        )
        .with_span_events(FmtSpan::FULL)
        .with_writer(std::io::stderr)
        .init();
    debug!("Loaded {}", cli.config);

    if let Commands::Networks = cli.commands {
        return print_json(&config.network_table());
    }
    let context = StakingContext::from_config(&config)?;
    let wait = cli.wait;

    match cli.commands {
        Commands::Networks => {}
        Commands::Validators(command) => match command {
            ValidatorCommands::List {
                network,
                status,
                sort,
                offset,
                limit,
            } => {
                let filter = validator_filter(status, sort, offset, limit);
                let validators = context
                    .validators
                    .list_validators(&network.network, &filter)
                    .await?;
                print_json(&validators)?;
            }
            ValidatorCommands::Search { network, query } => {
                let validators = context
                    .validators
                    .search_validators(&network.network, &query)
                    .await?;
                print_json(&validators)?;
            }
            ValidatorCommands::Details { network, validator } => {
                let validator = context
                    .validators
                    .get_validator_details(&network.network, &validator)
                    .await?;
                print_json(&validator)?;
            }
        },
        Commands::Delegations(account) => {
            let delegations = context
                .delegation
                .get_delegations(&account.network.network, &account.address)
                .await?;
            print_json(&delegations)?;
        }
        Commands::Rewards(command) => match command {
            RewardCommands::Pending(account) => {
                let rewards = context
                    .rewards
                    .get_pending_rewards(&account.network.network, &account.address)
                    .await?;
                print_json(&rewards)?;
            }
            RewardCommands::History {
                account,
                period,
                validator,
                offset,
                limit,
            } => {
                let query = history_query(period, validator, offset, limit);
                let rewards = context
                    .rewards
                    .get_reward_history(&account.network.network, &account.address, &query)
                    .await?;
                print_json(&rewards)?;
            }
        },
        Commands::Stake(args) => {
            let operation = context
                .delegation
                .stake(
                    &args.account.network.network,
                    &args.account.address,
                    &args.validator,
                    &args.amount,
                    args.period,
                )
                .await?;
            report(operation, wait).await?;
        }
        Commands::Unstake(args) => {
            let operation = context
                .delegation
                .unstake(
                    &args.account.network.network,
                    &args.account.address,
                    &args.delegation,
                    args.percentage,
                )
                .await?;
            report(operation, wait).await?;
        }
        Commands::Redelegate(args) => {
            let operation = context
                .delegation
                .redelegate(
                    &args.account.network.network,
                    &args.account.address,
                    &args.delegation,
                    &args.to,
                    args.amount,
                )
                .await?;
            report(operation, wait).await?;
        }
        Commands::Claim(args) => {
            let operation = context
                .rewards
                .claim_rewards(
                    &args.account.network.network,
                    &args.account.address,
                    &args.validator,
                )
                .await?;
            report(operation, wait).await?;
        }
        Commands::ClaimAll(account) => {
            let operation = context
                .rewards
                .claim_all_rewards(&account.network.network, &account.address)
                .await?;
            report(operation, wait).await?;
        }
        Commands::Withdraw(args) => {
            let operation = context
                .rewards
                .withdraw_reward(
                    &args.account.network.network,
                    &args.account.address,
                    &args.reward,
                    args.amount,
                )
                .await?;
            report(operation, wait).await?;
        }
        Commands::Autocompound(command) => {
            let operation = match command {
                AutocompoundCommands::Enable {
                    account,
                    validator,
                    percentage,
                } => {
                    context
                        .autocompound
                        .enable_autocompound(
                            &account.network.network,
                            &account.address,
                            &validator,
                            percentage,
                        )
                        .await?
                }
                AutocompoundCommands::Disable(args) => {
                    context
                        .autocompound
                        .disable_autocompound(
                            &args.account.network.network,
                            &args.account.address,
                            &args.validator,
                        )
                        .await?
                }
            };
            report(operation, wait).await?;
        }
    }

    Ok(())
}
