// Unit tests to cover the staking operation services

use crate::amount::{Amount, U256};
use crate::dto::{
    Backreference, DelegationStatus, LockupPeriod, OperationType, TransactionStatus,
    ValidatorStatus,
};
use crate::encoder::{pad_address, pad_uint256};
use crate::method;
use crate::monitor::MonitorOutcome;
use crate::services::rewards::unique_validators;
use crate::services::{ValidatorFilter, ValidatorSort};
use crate::test_support::*;
use crate::{StakingContext, StakingError};
use std::sync::Arc;

type Harness = (Arc<FakeTransactionService>, Arc<FakeDataSource>, StakingContext);

fn setup(data_source: FakeDataSource) -> Harness {
    setup_with(FakeTransactionService::confirming(), data_source)
}

fn setup_with(service: FakeTransactionService, data_source: FakeDataSource) -> Harness {
    let service = Arc::new(service);
    let data_source = Arc::new(data_source);
    let context = test_context(service.clone(), data_source.clone());
    (service, data_source, context)
}

fn payload_words(data: &str) -> ([u8; 4], Vec<String>) {
    let bytes = hex::decode(data.trim_start_matches("0x")).unwrap();
    let mut tag = [0u8; 4];
    tag.copy_from_slice(&bytes[..4]);
    let words = bytes[4..].chunks(32).map(hex::encode).collect();
    (tag, words)
}

fn delegations() -> FakeDataSource {
    FakeDataSource {
        delegations: vec![
            delegation("d1", VALIDATOR_A, "1000", DelegationStatus::Active),
            delegation("d2", VALIDATOR_B, "400", DelegationStatus::Unbonding),
        ],
        ..FakeDataSource::default()
    }
}

#[tokio::test(start_paused = true)]
async fn stake_records_pending_and_confirms() {
    let (service, _, context) = setup(FakeDataSource::default());

    let pending = context
        .delegation
        .stake("catena-mainnet", DELEGATOR, VALIDATOR_A, "1000", LockupPeriod::ThirtyDays)
        .await
        .unwrap();

    let transaction = &pending.transaction;
    assert_eq!(transaction.operation, OperationType::Stake);
    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert_eq!(transaction.amount.as_deref(), Some("1000"));
    assert_eq!(transaction.period, Some(LockupPeriod::ThirtyDays));
    assert_eq!(transaction.tx_hash, "0xfeed0001");

    let (tag, words) = payload_words(&transaction.data);
    assert_eq!(tag, method::account::STAKE);
    assert_eq!(words[0], pad_address(VALIDATOR_A).unwrap());
    assert_eq!(words[1], pad_uint256(U256::from(1000u64)));
    assert_eq!(words[2], pad_uint256(U256::from(30u64)));

    let sent = service.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0.value.as_deref(), Some("1000"));
    assert_eq!(sent[0].0.data, transaction.data);
    assert_eq!(sent[0].1, "catena-mainnet");

    let stored = context.ledger().get(&transaction.id).await.unwrap();
    assert_eq!(stored.status, TransactionStatus::Pending);

    let outcome = pending.monitor.wait().await.unwrap();
    assert!(matches!(outcome, MonitorOutcome::Completed(_)));
    assert_eq!(
        context.ledger().get(&transaction.id).await.unwrap().status,
        TransactionStatus::Confirmed
    );
}

#[tokio::test(start_paused = true)]
async fn stake_on_utxo_carries_no_value() {
    let (service, _, context) = setup(FakeDataSource::default());
    let pending = context
        .delegation
        .stake("ordo-testnet", DELEGATOR, VALIDATOR_B, "25", LockupPeriod::Flexible)
        .await
        .unwrap();

    let (tag, words) = payload_words(&pending.transaction.data);
    assert_eq!(tag, method::utxo::STAKE);
    assert_eq!(words[2], pad_uint256(U256::zero()));
    assert_eq!(service.sent()[0].0.value, None);
}

#[tokio::test]
async fn stake_rejects_bad_amounts() {
    let (service, _, context) = setup(FakeDataSource::default());
    for amount in ["0", "-5", "1.5", "lots"] {
        let result = context
            .delegation
            .stake("catena-mainnet", DELEGATOR, VALIDATOR_A, amount, LockupPeriod::Flexible)
            .await;
        assert!(matches!(result, Err(StakingError::Validation(_))), "{}", amount);
    }
    assert_eq!(service.send_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unstake_takes_share_of_delegation() {
    let (_, _, context) = setup(delegations());
    let pending = context
        .delegation
        .unstake("catena-mainnet", DELEGATOR, "d1", 50.0)
        .await
        .unwrap();

    let transaction = &pending.transaction;
    assert_eq!(transaction.operation, OperationType::Unstake);
    assert_eq!(transaction.amount.as_deref(), Some("500"));
    assert_eq!(transaction.validator_address, VALIDATOR_A);
    assert_eq!(
        transaction.backreference,
        Some(Backreference::Delegation("d1".to_owned()))
    );
    let (tag, words) = payload_words(&transaction.data);
    assert_eq!(tag, method::account::UNSTAKE);
    assert_eq!(words[1], pad_uint256(U256::from(500u64)));
}

#[tokio::test]
async fn unstake_missing_delegation_is_not_found() {
    let (service, _, context) = setup(delegations());
    let result = context
        .delegation
        .unstake("catena-mainnet", DELEGATOR, "nope", 10.0)
        .await;
    assert!(matches!(result, Err(StakingError::NotFound { kind: "delegation", .. })));
    assert_eq!(service.send_count(), 0);
}

#[tokio::test]
async fn unstake_requires_active_delegation() {
    let (service, _, context) = setup(delegations());
    let result = context
        .delegation
        .unstake("catena-mainnet", DELEGATOR, "d2", 10.0)
        .await;
    assert!(matches!(result, Err(StakingError::Validation(_))));
    assert_eq!(service.send_count(), 0);
}

#[tokio::test]
async fn unstake_share_rounding_to_zero_is_rejected() {
    let (service, _, context) = setup(delegations());
    let result = context
        .delegation
        .unstake("catena-mainnet", DELEGATOR, "d1", 0.0)
        .await;
    assert!(matches!(result, Err(StakingError::Validation(_))));
    assert_eq!(service.send_count(), 0);
}

#[tokio::test]
async fn out_of_range_percentages_fail_before_any_io() {
    let (service, data_source, context) = setup(delegations());
    for percentage in [-1.0, 101.0] {
        let unstake = context
            .delegation
            .unstake("catena-mainnet", DELEGATOR, "d1", percentage)
            .await;
        assert!(matches!(unstake, Err(StakingError::Validation(_))));

        let enable = context
            .autocompound
            .enable_autocompound("catena-mainnet", DELEGATOR, VALIDATOR_A, percentage)
            .await;
        assert!(matches!(enable, Err(StakingError::Validation(_))));
    }
    assert_eq!(data_source.reads(), 0);
    assert_eq!(service.send_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn redelegate_all_moves_full_delegation() {
    let (_, _, context) = setup(delegations());
    let pending = context
        .delegation
        .redelegate("catena-mainnet", DELEGATOR, "d1", VALIDATOR_C, Amount::All)
        .await
        .unwrap();

    let transaction = &pending.transaction;
    assert_eq!(transaction.amount.as_deref(), Some("1000"));
    assert_eq!(transaction.new_validator_address.as_deref(), Some(VALIDATOR_C));
    let (tag, words) = payload_words(&transaction.data);
    assert_eq!(tag, method::account::REDELEGATE);
    assert_eq!(words[0], pad_address(VALIDATOR_A).unwrap());
    assert_eq!(words[1], pad_address(VALIDATOR_C).unwrap());
}

#[tokio::test]
async fn redelegate_to_same_validator_is_rejected() {
    let (service, _, context) = setup(delegations());
    let result = context
        .delegation
        .redelegate(
            "catena-mainnet",
            DELEGATOR,
            "d1",
            &VALIDATOR_A.to_lowercase(),
            Amount::All,
        )
        .await;
    assert!(matches!(result, Err(StakingError::Validation(_))));

    let too_much = context
        .delegation
        .redelegate(
            "catena-mainnet",
            DELEGATOR,
            "d1",
            VALIDATOR_B,
            Amount::Exact(U256::from(1001u64)),
        )
        .await;
    assert!(matches!(too_much, Err(StakingError::Validation(_))));
    assert_eq!(service.send_count(), 0);
}

#[tokio::test]
async fn redelegate_rejects_malformed_validator_before_reading() {
    let (service, data_source, context) = setup(delegations());
    for new_validator in ["0x0xccc", "not-an-address", ""] {
        let result = context
            .delegation
            .redelegate("catena-mainnet", DELEGATOR, "d1", new_validator, Amount::All)
            .await;
        assert!(matches!(result, Err(StakingError::Validation(_))), "{}", new_validator);
    }
    assert_eq!(data_source.reads(), 0);
    assert_eq!(service.send_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn repeated_hash_keeps_settled_record() {
    let (service, _, context) =
        setup_with(FakeTransactionService::repeating_hash("0xdup"), FakeDataSource::default());

    let first = context
        .delegation
        .stake("catena-mainnet", DELEGATOR, VALIDATOR_A, "1000", LockupPeriod::Flexible)
        .await
        .unwrap();
    let id = first.transaction.id;
    assert!(matches!(first.monitor.wait().await, Some(MonitorOutcome::Completed(_))));
    assert_eq!(
        context.ledger().get(&id).await.unwrap().status,
        TransactionStatus::Confirmed
    );
    let polls = service.status_count();

    let again = context
        .delegation
        .stake("catena-mainnet", DELEGATOR, VALIDATOR_A, "1000", LockupPeriod::Flexible)
        .await;
    assert!(matches!(
        again,
        Err(StakingError::AlreadyRecorded { status: TransactionStatus::Confirmed, .. })
    ));
    assert_eq!(service.send_count(), 2);

    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    assert_eq!(service.status_count(), polls);
    assert_eq!(context.ledger().len().await, 1);
    assert_eq!(
        context.ledger().get(&id).await.unwrap().status,
        TransactionStatus::Confirmed
    );
}

#[tokio::test(start_paused = true)]
async fn claim_rewards_for_one_validator() {
    let (_, _, context) = setup(FakeDataSource {
        pending: vec![reward("r1", VALIDATOR_A, "10")],
        ..FakeDataSource::default()
    });
    let pending = context
        .rewards
        .claim_rewards("foedus-mainnet", DELEGATOR, VALIDATOR_A)
        .await
        .unwrap();
    let (tag, words) = payload_words(&pending.transaction.data);
    assert_eq!(tag, method::federated::CLAIM_REWARDS);
    assert_eq!(words, vec![pad_address(VALIDATOR_A).unwrap()]);

    let nothing_owed = context
        .rewards
        .claim_rewards("foedus-mainnet", DELEGATOR, VALIDATOR_B)
        .await;
    assert!(matches!(nothing_owed, Err(StakingError::Validation(_))));
}

#[tokio::test(start_paused = true)]
async fn claim_all_deduplicates_validators_in_order() {
    let (_, _, context) = setup(FakeDataSource {
        pending: vec![
            reward("r1", VALIDATOR_B, "10"),
            reward("r2", VALIDATOR_A, "5"),
            reward("r3", &VALIDATOR_B.to_lowercase(), "7"),
            reward("r4", VALIDATOR_C, "1"),
        ],
        ..FakeDataSource::default()
    });
    let pending = context
        .rewards
        .claim_all_rewards("catena-mainnet", DELEGATOR)
        .await
        .unwrap();

    let transaction = &pending.transaction;
    assert_eq!(transaction.operation, OperationType::ClaimAllRewards);
    assert_eq!(
        transaction.validator_address,
        format!("{},{},{}", VALIDATOR_B, VALIDATOR_A, VALIDATOR_C)
    );
    let (tag, words) = payload_words(&transaction.data);
    assert_eq!(tag, method::account::CLAIM_ALL_REWARDS);
    assert_eq!(
        words,
        vec![
            pad_uint256(U256::from(3u64)),
            pad_address(VALIDATOR_B).unwrap(),
            pad_address(VALIDATOR_A).unwrap(),
            pad_address(VALIDATOR_C).unwrap(),
        ]
    );
}

#[tokio::test]
async fn claim_all_without_rewards_is_rejected() {
    let mut claimed = reward("r1", VALIDATOR_A, "10");
    claimed.claimed = true;
    let (service, _, context) = setup(FakeDataSource {
        pending: vec![claimed],
        ..FakeDataSource::default()
    });
    let result = context.rewards.claim_all_rewards("catena-mainnet", DELEGATOR).await;
    assert!(matches!(result, Err(StakingError::Validation(_))));
    assert_eq!(service.send_count(), 0);
}

#[test]
fn unique_validators_keeps_first_spelling() {
    let rewards = vec![
        reward("r1", "0xAbC", "1"),
        reward("r2", "abc", "1"),
        reward("r3", "0xdef", "1"),
    ];
    assert_eq!(unique_validators(&rewards), vec!["0xAbC", "0xdef"]);
    assert!(unique_validators(&[]).is_empty());
}

#[tokio::test(start_paused = true)]
async fn withdraw_all_or_exact_amount() {
    let (_, _, context) = setup(FakeDataSource {
        pending: vec![reward("r1", VALIDATOR_A, "80")],
        ..FakeDataSource::default()
    });

    let all = context
        .rewards
        .withdraw_reward("catena-mainnet", DELEGATOR, "r1", Amount::All)
        .await
        .unwrap();
    assert_eq!(all.transaction.amount.as_deref(), Some("80"));
    assert_eq!(
        all.transaction.backreference,
        Some(Backreference::Reward("r1".to_owned()))
    );

    let exact = context
        .rewards
        .withdraw_reward("catena-mainnet", DELEGATOR, "r1", Amount::Exact(U256::from(30u64)))
        .await
        .unwrap();
    assert_eq!(exact.transaction.amount.as_deref(), Some("30"));
    assert_ne!(all.transaction.id, exact.transaction.id);
}

#[tokio::test]
async fn withdraw_rejects_missing_or_claimed_rewards() {
    let mut claimed = reward("r2", VALIDATOR_A, "80");
    claimed.claimed = true;
    let (service, _, context) = setup(FakeDataSource {
        history: vec![claimed],
        ..FakeDataSource::default()
    });

    let missing = context
        .rewards
        .withdraw_reward("catena-mainnet", DELEGATOR, "r9", Amount::All)
        .await;
    assert!(matches!(missing, Err(StakingError::NotFound { kind: "reward", .. })));

    let already = context
        .rewards
        .withdraw_reward("catena-mainnet", DELEGATOR, "r2", Amount::All)
        .await;
    assert!(matches!(already, Err(StakingError::Validation(_))));

    let zero = context
        .rewards
        .withdraw_reward("catena-mainnet", DELEGATOR, "r2", Amount::Exact(U256::zero()))
        .await;
    assert!(matches!(zero, Err(StakingError::Validation(_))));
    assert_eq!(service.send_count(), 0);
}

#[tokio::test]
async fn broadcast_failure_records_nothing() {
    let service = Arc::new(FakeTransactionService::failing_sends("nonce too low"));
    let context = test_context(service.clone(), Arc::new(FakeDataSource::default()));

    let result = context
        .autocompound
        .disable_autocompound("catena-mainnet", DELEGATOR, VALIDATOR_A)
        .await;
    assert!(matches!(result, Err(StakingError::Broadcast(_))));
    assert!(context.ledger().is_empty().await);
    assert_eq!(service.status_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn enable_autocompound_encodes_basis_points() {
    let (_, _, context) = setup(FakeDataSource::default());
    let pending = context
        .autocompound
        .enable_autocompound("ordo-mainnet", DELEGATOR, VALIDATOR_A, 12.5)
        .await
        .unwrap();
    assert_eq!(pending.transaction.auto_compound_percentage, Some(12.5));
    let (tag, words) = payload_words(&pending.transaction.data);
    assert_eq!(tag, method::utxo::ENABLE_AUTOCOMPOUND);
    assert_eq!(words[1], pad_uint256(U256::from(1250u64)));
}

#[tokio::test]
async fn unknown_network_fails_every_read() {
    let (_, data_source, context) = setup(delegations());
    assert!(matches!(
        context.delegation.get_delegations("nowhere", DELEGATOR).await,
        Err(StakingError::NetworkNotFound(_))
    ));
    assert!(matches!(
        context.rewards.get_pending_rewards("nowhere", DELEGATOR).await,
        Err(StakingError::NetworkNotFound(_))
    ));
    assert_eq!(data_source.reads(), 0);
}

#[tokio::test]
async fn pending_rewards_hide_claimed_ones() {
    let mut claimed = reward("r2", VALIDATOR_B, "3");
    claimed.claimed = true;
    let (_, _, context) = setup(FakeDataSource {
        pending: vec![reward("r1", VALIDATOR_A, "5"), claimed],
        ..FakeDataSource::default()
    });
    let rewards = context
        .rewards
        .get_pending_rewards("catena-testnet", DELEGATOR)
        .await
        .unwrap();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].id, "r1");
}

fn validator_set() -> FakeDataSource {
    FakeDataSource {
        validators: vec![
            validator(VALIDATOR_A, "Alpine", ValidatorStatus::Active, 5.0, "100"),
            validator(VALIDATOR_B, "borealis", ValidatorStatus::Active, 1.0, "300"),
            validator(VALIDATOR_C, "Cirrus", ValidatorStatus::Jailed, 3.0, "200"),
        ],
        ..FakeDataSource::default()
    }
}

fn addresses(validators: &[crate::dto::Validator]) -> Vec<&str> {
    validators.iter().map(|validator| validator.address.as_str()).collect()
}

#[tokio::test]
async fn list_validators_filters_sorts_and_pages() {
    let (_, _, context) = setup(validator_set());

    let by_stake = context
        .validators
        .list_validators("catena-mainnet", &ValidatorFilter::default())
        .await
        .unwrap();
    assert_eq!(addresses(&by_stake), vec![VALIDATOR_B, VALIDATOR_C, VALIDATOR_A]);

    let active = context
        .validators
        .list_validators(
            "catena-mainnet",
            &ValidatorFilter {
                status: Some(ValidatorStatus::Active),
                sort: ValidatorSort::Commission,
                ..ValidatorFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(addresses(&active), vec![VALIDATOR_B, VALIDATOR_A]);

    let page = context
        .validators
        .list_validators(
            "catena-mainnet",
            &ValidatorFilter {
                sort: ValidatorSort::Name,
                offset: 1,
                limit: Some(1),
                ..ValidatorFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(addresses(&page), vec![VALIDATOR_B]);
}

#[tokio::test]
async fn validator_reads_are_repeatable() {
    let (service, data_source, context) = setup(validator_set());

    let first = context
        .validators
        .get_validator_details("ordo-mainnet", VALIDATOR_B)
        .await
        .unwrap();
    let second = context
        .validators
        .get_validator_details("ordo-mainnet", VALIDATOR_B)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.name, "borealis");
    assert_eq!(data_source.reads(), 2);

    let filter = ValidatorFilter::default();
    let listed = context
        .validators
        .list_validators("ordo-mainnet", &filter)
        .await
        .unwrap();
    let listed_again = context
        .validators
        .list_validators("ordo-mainnet", &filter)
        .await
        .unwrap();
    assert_eq!(listed, listed_again);
    assert_eq!(data_source.reads(), 4);
    assert_eq!(service.send_count(), 0);
}

#[tokio::test]
async fn search_matches_name_or_address() {
    let (_, _, context) = setup(validator_set());

    let by_name = context
        .validators
        .search_validators("catena-mainnet", "BOREAL")
        .await
        .unwrap();
    assert_eq!(addresses(&by_name), vec![VALIDATOR_B]);

    let by_address = context
        .validators
        .search_validators("catena-mainnet", "0xccc0")
        .await
        .unwrap();
    assert_eq!(addresses(&by_address), vec![VALIDATOR_C]);

    assert!(context
        .validators
        .search_validators("catena-mainnet", "  ")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn validator_details_or_not_found() {
    let (_, _, context) = setup(validator_set());
    let details = context
        .validators
        .get_validator_details("catena-mainnet", &VALIDATOR_C.to_lowercase())
        .await
        .unwrap();
    assert_eq!(details.name, "Cirrus");

    let missing = context
        .validators
        .get_validator_details("catena-mainnet", "0xdead")
        .await;
    assert!(matches!(missing, Err(StakingError::NotFound { kind: "validator", .. })));
}
