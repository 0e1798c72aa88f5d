use crate::amount::U256;
use crate::dto::{ChainFamily, OperationType};
use crate::error::{Result, StakingError};
use crate::method;
use std::collections::HashMap;
use std::sync::Arc;

/// Width of one argument word in hex characters (32 bytes).
pub const WORD_HEX_LEN: usize = 64;
pub const METHOD_TAG_LEN: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeArg {
    Address(String),
    Uint(U256),
}

impl EncodeArg {
    pub fn address(address: &str) -> EncodeArg {
        EncodeArg::Address(address.to_owned())
    }

    pub fn uint<T: Into<U256>>(value: T) -> EncodeArg {
        EncodeArg::Uint(value.into())
    }

    fn kind(&self) -> ArgKind {
        match self {
            EncodeArg::Address(_) => ArgKind::Address,
            EncodeArg::Uint(_) => ArgKind::Uint,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ArgKind {
    Address,
    Uint,
}

enum ArgLayout {
    Fixed(&'static [ArgKind]),
    /// A uint count followed by that many addresses.
    CountedAddresses,
}

fn layout(operation: OperationType) -> ArgLayout {
    use ArgKind::*;
    match operation {
        OperationType::Stake => ArgLayout::Fixed(&[Address, Uint, Uint]),
        OperationType::Unstake => ArgLayout::Fixed(&[Address, Uint]),
        OperationType::Redelegate => ArgLayout::Fixed(&[Address, Address, Uint]),
        OperationType::ClaimRewards => ArgLayout::Fixed(&[Address]),
        OperationType::ClaimAllRewards => ArgLayout::CountedAddresses,
        OperationType::WithdrawRewards => ArgLayout::Fixed(&[Address, Uint]),
        OperationType::EnableAutocompound => ArgLayout::Fixed(&[Address, Uint]),
        OperationType::DisableAutocompound => ArgLayout::Fixed(&[Address]),
    }
}

fn check_layout(operation: OperationType, args: &[EncodeArg]) -> Result<()> {
    match layout(operation) {
        ArgLayout::Fixed(kinds) => {
            if kinds.len() != args.len() {
                return Err(StakingError::validation(format!(
                    "{} expects {} arguments, got {}",
                    operation,
                    kinds.len(),
                    args.len()
                )));
            }
            for (position, (kind, arg)) in kinds.iter().zip(args).enumerate() {
                if *kind != arg.kind() {
                    return Err(StakingError::validation(format!(
                        "{} argument {} should be {:?}, got {:?}",
                        operation,
                        position,
                        kind,
                        arg.kind()
                    )));
                }
            }
            Ok(())
        }
        ArgLayout::CountedAddresses => {
            let count = match args.first() {
                Some(EncodeArg::Uint(count)) => *count,
                _ => {
                    return Err(StakingError::validation(format!(
                        "{} expects a leading count",
                        operation
                    )))
                }
            };
            let addresses = &args[1..];
            if count != U256::from(addresses.len()) {
                return Err(StakingError::validation(format!(
                    "{} count {} does not match {} addresses",
                    operation,
                    count,
                    addresses.len()
                )));
            }
            if addresses.iter().any(|arg| arg.kind() != ArgKind::Address) {
                return Err(StakingError::validation(format!(
                    "{} expects only addresses after the count",
                    operation
                )));
            }
            Ok(())
        }
    }
}

/// Right-aligns an address in a 32 byte word. One leading `0x` is stripped.
pub fn pad_address(address: &str) -> Result<String> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    if stripped.is_empty() || stripped.len() > WORD_HEX_LEN {
        return Err(StakingError::validation(format!(
            "address {:?} must hold 1 to {} hex characters",
            address, WORD_HEX_LEN
        )));
    }
    if !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(StakingError::validation(format!(
            "address {:?} is not hex",
            address
        )));
    }
    Ok(format!(
        "{:0>width$}",
        stripped.to_ascii_lowercase(),
        width = WORD_HEX_LEN
    ))
}

pub fn pad_uint256(value: U256) -> String {
    format!("{:0>width$}", format!("{:x}", value), width = WORD_HEX_LEN)
}

/// Tag followed by one 32 byte word per argument.
pub fn encode_fixed_width(
    method_tag: [u8; METHOD_TAG_LEN],
    operation: OperationType,
    args: &[EncodeArg],
) -> Result<Vec<u8>> {
    check_layout(operation, args)?;
    let mut payload = Vec::with_capacity(METHOD_TAG_LEN + args.len() * WORD_HEX_LEN / 2);
    payload.extend_from_slice(&method_tag);
    for arg in args {
        let word = match arg {
            EncodeArg::Address(address) => pad_address(address)?,
            EncodeArg::Uint(value) => pad_uint256(*value),
        };
        let bytes = hex::decode(&word)
            .map_err(|error| StakingError::validation(format!("bad word {}: {}", word, error)))?;
        payload.extend_from_slice(&bytes);
    }
    Ok(payload)
}

pub fn payload_hex(payload: &[u8]) -> String {
    format!("0x{}", hex::encode(payload))
}

pub trait ChainEncoder: Send + Sync {
    fn family(&self) -> ChainFamily;

    fn method_tag(&self, operation: OperationType) -> [u8; METHOD_TAG_LEN];

    fn encode(&self, operation: OperationType, args: &[EncodeArg]) -> Result<Vec<u8>> {
        encode_fixed_width(self.method_tag(operation), operation, args)
    }
}

pub struct AccountChainEncoder;

impl ChainEncoder for AccountChainEncoder {
    fn family(&self) -> ChainFamily {
        ChainFamily::Account
    }

    fn method_tag(&self, operation: OperationType) -> [u8; METHOD_TAG_LEN] {
        match operation {
            OperationType::Stake => method::account::STAKE,
            OperationType::Unstake => method::account::UNSTAKE,
            OperationType::Redelegate => method::account::REDELEGATE,
            OperationType::ClaimRewards => method::account::CLAIM_REWARDS,
            OperationType::ClaimAllRewards => method::account::CLAIM_ALL_REWARDS,
            OperationType::WithdrawRewards => method::account::WITHDRAW_REWARDS,
            OperationType::EnableAutocompound => method::account::ENABLE_AUTOCOMPOUND,
            OperationType::DisableAutocompound => method::account::DISABLE_AUTOCOMPOUND,
        }
    }
}

pub struct UtxoChainEncoder;

impl ChainEncoder for UtxoChainEncoder {
    fn family(&self) -> ChainFamily {
        ChainFamily::Utxo
    }

    fn method_tag(&self, operation: OperationType) -> [u8; METHOD_TAG_LEN] {
        match operation {
            OperationType::Stake => method::utxo::STAKE,
            OperationType::Unstake => method::utxo::UNSTAKE,
            OperationType::Redelegate => method::utxo::REDELEGATE,
            OperationType::ClaimRewards => method::utxo::CLAIM_REWARDS,
            OperationType::ClaimAllRewards => method::utxo::CLAIM_ALL_REWARDS,
            OperationType::WithdrawRewards => method::utxo::WITHDRAW_REWARDS,
            OperationType::EnableAutocompound => method::utxo::ENABLE_AUTOCOMPOUND,
            OperationType::DisableAutocompound => method::utxo::DISABLE_AUTOCOMPOUND,
        }
    }
}

pub struct FederatedChainEncoder;

impl ChainEncoder for FederatedChainEncoder {
    fn family(&self) -> ChainFamily {
        ChainFamily::Federated
    }

    fn method_tag(&self, operation: OperationType) -> [u8; METHOD_TAG_LEN] {
        match operation {
            OperationType::Stake => method::federated::STAKE,
            OperationType::Unstake => method::federated::UNSTAKE,
            OperationType::Redelegate => method::federated::REDELEGATE,
            OperationType::ClaimRewards => method::federated::CLAIM_REWARDS,
            OperationType::ClaimAllRewards => method::federated::CLAIM_ALL_REWARDS,
            OperationType::WithdrawRewards => method::federated::WITHDRAW_REWARDS,
            OperationType::EnableAutocompound => method::federated::ENABLE_AUTOCOMPOUND,
            OperationType::DisableAutocompound => method::federated::DISABLE_AUTOCOMPOUND,
        }
    }
}

/// Encoders keyed by the chain family they serve.
#[derive(Clone, Default)]
pub struct EncoderRegistry {
    encoders: HashMap<ChainFamily, Arc<dyn ChainEncoder>>,
}

impl EncoderRegistry {
    pub fn new() -> EncoderRegistry {
        EncoderRegistry::default()
    }

    pub fn with_defaults() -> EncoderRegistry {
        let mut registry = EncoderRegistry::new();
        registry.register(Arc::new(AccountChainEncoder));
        registry.register(Arc::new(UtxoChainEncoder));
        registry.register(Arc::new(FederatedChainEncoder));
        registry
    }

    /// Replaces any encoder already registered for the same family.
    pub fn register(&mut self, encoder: Arc<dyn ChainEncoder>) {
        self.encoders.insert(encoder.family(), encoder);
    }

    pub fn contains(&self, family: ChainFamily) -> bool {
        self.encoders.contains_key(&family)
    }

    pub fn get(&self, family: ChainFamily) -> Result<Arc<dyn ChainEncoder>> {
        self.encoders
            .get(&family)
            .cloned()
            .ok_or(StakingError::UnsupportedChainFamily(family))
    }
}
