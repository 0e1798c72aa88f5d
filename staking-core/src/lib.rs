//! Staking transaction lifecycle: build, submit and track delegation, reward
//! and autocompound operations across chain families.

pub mod aggregate;
pub mod amount;
pub mod config;
pub mod context;
pub mod dto;
pub mod encoder;
pub mod error;
pub mod ledger;
pub mod method;
pub mod monitor;
pub mod network;
pub mod services;
pub mod submitter;
pub mod transaction_service;

pub use context::StakingContext;
pub use error::{Result, StakingError};

#[cfg(test)]
mod test_support;






#[cfg(test)]
mod services_tests;
