use crate::error::{Result, StakingError};
use std::fmt;
use std::str::FromStr;

// The expansion names `Result` unqualified, so it cannot share a scope with
// the crate alias.
mod wide {
    uint::construct_uint! {
        pub struct U256(4);
    }
}

pub use wide::U256;

const BASIS_POINTS: u64 = 10_000;

/// Amount requested by a withdraw-style operation.
///
/// `All` stands for the full outstanding amount of the targeted entity, which
/// is only known once that entity has been read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Amount {
    Exact(U256),
    All,
}

impl Amount {
    /// Picks the concrete amount against what is outstanding. Exact amounts
    /// must be positive and may not exceed the outstanding amount.
    pub fn resolve(&self, outstanding: U256) -> Result<U256> {
        match self {
            Amount::All => {
                if outstanding.is_zero() {
                    return Err(StakingError::validation("nothing outstanding"));
                }
                Ok(outstanding)
            }
            Amount::Exact(value) => {
                if value.is_zero() {
                    Err(StakingError::validation("amount must be greater than zero"))
                } else if *value > outstanding {
                    Err(StakingError::validation(format!(
                        "amount {} exceeds outstanding {}",
                        value, outstanding
                    )))
                } else {
                    Ok(*value)
                }
            }
        }
    }
}

impl FromStr for Amount {
    type Err = StakingError;

    fn from_str(value: &str) -> Result<Amount> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(Amount::All);
        }
        parse_base_units(value).map(Amount::Exact)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Exact(value) => write!(f, "{}", value),
            Amount::All => write!(f, "all"),
        }
    }
}

/// Parses a positive integer amount of base units.
pub fn parse_base_units(value: &str) -> Result<U256> {
    let amount = U256::from_dec_str(value.trim()).map_err(|error| {
        StakingError::validation(format!("invalid amount {:?}: {:?}", value, error))
    })?;
    if amount.is_zero() {
        return Err(StakingError::validation("amount must be greater than zero"));
    }
    Ok(amount)
}

pub fn validate_percentage(percentage: f64) -> Result<()> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(StakingError::validation(format!(
            "percentage {} outside [0, 100]",
            percentage
        )));
    }
    Ok(())
}

/// Percentage expressed in basis points, e.g. 12.5% -> 1250.
pub fn to_basis_points(percentage: f64) -> u64 {
    (percentage * 100.0).round() as u64
}

/// Share of `amount` covered by `basis_points`, rounded down.
pub fn share_of(amount: U256, basis_points: u64) -> U256 {
    let basis_points = U256::from(basis_points);
    match amount.checked_mul(basis_points) {
        Some(scaled) => scaled / U256::from(BASIS_POINTS),
        None => amount / U256::from(BASIS_POINTS) * basis_points,
    }
}
