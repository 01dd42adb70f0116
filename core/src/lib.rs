//! Wallet/contract binding layer for the presale dashboard.
//!
//! [`PresaleService`] is the one object pages talk to: it reads sale state
//! from the presale contract, submits transactions with the fixed gas policy
//! in [`gas`], and announces confirmed writes through a refresh counter.

pub mod abi;
pub mod binding;
pub mod chain;
pub mod config;
pub mod error;
pub mod format;
pub mod gas;
pub mod models;
pub mod notify;
pub mod referral;
pub mod storage;

pub use binding::PresaleService;
pub use ethers::types::{Address, H256, U256};
