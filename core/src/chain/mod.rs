//! Seam between the binding layer and the Ethereum client.
//!
//! [`PresaleChain`] is everything [`crate::binding::PresaleService`] needs from
//! the network: typed reads of the presale contract and its tokens, gas
//! quotes, and submission of a [`ContractCall`]. [`rpc::EthersChain`] is the
//! JSON-RPC implementation.

use std::fmt;

use async_trait::async_trait;
use ethers::types::{Address, U256};
use thiserror::Error;

use crate::gas::GasSettings;
use crate::models::{
    ContractBalances, ContractInfo, RawReferralInfo, RawStake, RawStakeDetails, RawStakingInfo,
    RawTransaction, RawUserStakingInfo, TxReceiptSummary,
};

pub mod rpc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("user rejected transaction")]
    Rejected,
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("insufficient funds for gas * price + value")]
    InsufficientFunds,
    #[error("cannot estimate gas: {0}")]
    GasEstimation(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("transaction dropped before confirmation")]
    Dropped,
    #[error("no signer connected")]
    NoSigner,
    #[error("{0}")]
    Other(String),
}

impl ChainError {
    /// Sorts a provider, signer or contract error into a variant by its text.
    pub fn classify(err: impl fmt::Display) -> Self {
        let message = err.to_string();
        let lower = message.to_lowercase();

        if lower.contains("user rejected")
            || lower.contains("user denied")
            || lower.contains("rejected by user")
        {
            return ChainError::Rejected;
        }
        if lower.contains("insufficient funds") {
            return ChainError::InsufficientFunds;
        }
        if let Some(idx) = lower.find("execution reverted") {
            let rest = &message[idx + "execution reverted".len()..];
            let reason = rest
                .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
                .split(['"', '\n', ','])
                .next()
                .unwrap_or_default()
                .trim();
            let reason = if reason.is_empty() {
                "execution reverted".to_string()
            } else {
                reason.to_string()
            };
            return ChainError::Reverted(reason);
        }
        if lower.contains("error sending request")
            || lower.contains("connection refused")
            || lower.contains("timed out")
            || lower.contains("dns error")
        {
            return ChainError::Network(message);
        }
        ChainError::Other(message)
    }
}

/// A state-changing call on the presale contract, or an ERC-20 approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    BuyWithEth { value: U256 },
    BuyWithUsdt { amount: U256 },
    BuyWithUsdc { amount: U256 },
    BuyUsdt { value: U256 },
    BuyUsdc { value: U256 },
    UpdateStablecoinPrice { price: U256 },
    UpdateTokenPrice { price: U256 },
    UpdateUsdt { token: Address, ratio: U256 },
    UpdateUsdc { token: Address, ratio: U256 },
    SetSaleToken { token: Address },
    SetBlockStatus { user: Address, blocked: bool },
    WithdrawTokens { token: Address, amount: U256 },
    StakeTokens { amount: U256, lock_period: U256 },
    HarvestRewards { stake_id: U256 },
    UnstakeTokens { stake_id: U256 },
    UnstakeEarly { stake_id: U256 },
    UpdateBaseApy { apy: U256 },
    UpdateMinStakeAmount { amount: U256 },
    RegisterReferrer { referrer: Address },
    Approve { token: Address, spender: Address, amount: U256 },
}

impl ContractCall {
    pub fn method(&self) -> &'static str {
        match self {
            ContractCall::BuyWithEth { .. } => "buyWithETH",
            ContractCall::BuyWithUsdt { .. } => "buyWithUSDT",
            ContractCall::BuyWithUsdc { .. } => "buyWithUSDC",
            ContractCall::BuyUsdt { .. } => "buyUSDT",
            ContractCall::BuyUsdc { .. } => "buyUSDC",
            ContractCall::UpdateStablecoinPrice { .. } => "updateStablecoinPrice",
            ContractCall::UpdateTokenPrice { .. } => "updateTokenPrice",
            ContractCall::UpdateUsdt { .. } => "updateUSDT",
            ContractCall::UpdateUsdc { .. } => "updateUSDC",
            ContractCall::SetSaleToken { .. } => "setSaleToken",
            ContractCall::SetBlockStatus { .. } => "setBlockStatus",
            ContractCall::WithdrawTokens { .. } => "withdrawTokens",
            ContractCall::StakeTokens { .. } => "stakeTokens",
            ContractCall::HarvestRewards { .. } => "harvestRewards",
            ContractCall::UnstakeTokens { .. } => "unstakeTokens",
            ContractCall::UnstakeEarly { .. } => "unstakeEarly",
            ContractCall::UpdateBaseApy { .. } => "updateBaseAPY",
            ContractCall::UpdateMinStakeAmount { .. } => "updateMinStakeAmount",
            ContractCall::RegisterReferrer { .. } => "registerReferrer",
            ContractCall::Approve { .. } => "approve",
        }
    }

    /// Wei attached to the call.
    pub fn value(&self) -> U256 {
        match self {
            ContractCall::BuyWithEth { value }
            | ContractCall::BuyUsdt { value }
            | ContractCall::BuyUsdc { value } => *value,
            _ => U256::zero(),
        }
    }

    /// Address the transaction is sent to.
    pub fn target(&self, presale: Address) -> Address {
        match self {
            ContractCall::Approve { token, .. } => *token,
            _ => presale,
        }
    }
}

impl fmt::Display for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = self.method();
        match self {
            ContractCall::BuyWithEth { value }
            | ContractCall::BuyUsdt { value }
            | ContractCall::BuyUsdc { value } => write!(f, "{method}() value={value} wei"),
            ContractCall::BuyWithUsdt { amount }
            | ContractCall::BuyWithUsdc { amount }
            | ContractCall::UpdateMinStakeAmount { amount } => write!(f, "{method}({amount})"),
            ContractCall::UpdateStablecoinPrice { price }
            | ContractCall::UpdateTokenPrice { price } => write!(f, "{method}({price})"),
            ContractCall::UpdateUsdt { token, ratio } | ContractCall::UpdateUsdc { token, ratio } => {
                write!(f, "{method}({token:?}, {ratio})")
            }
            ContractCall::SetSaleToken { token } => write!(f, "{method}({token:?})"),
            ContractCall::SetBlockStatus { user, blocked } => {
                write!(f, "{method}({user:?}, {blocked})")
            }
            ContractCall::WithdrawTokens { token, amount } => {
                write!(f, "{method}({token:?}, {amount})")
            }
            ContractCall::StakeTokens { amount, lock_period } => {
                write!(f, "{method}({amount}, {lock_period})")
            }
            ContractCall::HarvestRewards { stake_id }
            | ContractCall::UnstakeTokens { stake_id }
            | ContractCall::UnstakeEarly { stake_id } => write!(f, "{method}({stake_id})"),
            ContractCall::UpdateBaseApy { apy } => write!(f, "{method}({apy})"),
            ContractCall::RegisterReferrer { referrer } => write!(f, "{method}({referrer:?})"),
            ContractCall::Approve {
                token,
                spender,
                amount,
            } => write!(f, "{token:?}.{method}({spender:?}, {amount})"),
        }
    }
}

/// What the signer is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub call: ContractCall,
    pub from: Address,
    pub to: Address,
    pub gas: GasSettings,
}

/// Asks the wallet holder to sign. Declining surfaces as
/// [`ChainError::Rejected`].
#[async_trait]
pub trait SignaturePrompt: Send + Sync {
    async fn confirm(&self, request: &SignRequest) -> bool;
}

/// Signs everything without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl SignaturePrompt for AutoApprove {
    async fn confirm(&self, _request: &SignRequest) -> bool {
        true
    }
}

#[async_trait]
pub trait PresaleChain: Send + Sync {
    fn contract_address(&self) -> Address;

    /// The connected wallet, if a signer is configured.
    fn signer_address(&self) -> Option<Address>;

    async fn contract_deployed(&self) -> Result<bool, ChainError>;

    async fn owner(&self) -> Result<Address, ChainError>;

    async fn contract_info(&self) -> Result<ContractInfo, ChainError>;

    async fn contract_balances(&self) -> Result<ContractBalances, ChainError>;

    async fn total_penalty_collected(&self) -> Result<U256, ChainError>;

    async fn user_transactions(&self, user: Address) -> Result<Vec<RawTransaction>, ChainError>;

    async fn all_transactions(&self) -> Result<Vec<RawTransaction>, ChainError>;

    async fn user_stakes(&self, user: Address) -> Result<Vec<RawStake>, ChainError>;

    async fn stake_details(&self, stake_id: U256) -> Result<RawStakeDetails, ChainError>;

    async fn staking_info(&self) -> Result<RawStakingInfo, ChainError>;

    async fn user_staking_info(&self, user: Address) -> Result<RawUserStakingInfo, ChainError>;

    async fn referral_info(&self, user: Address) -> Result<RawReferralInfo, ChainError>;

    async fn user_referrals(&self, user: Address) -> Result<Vec<Address>, ChainError>;

    async fn eth_balance(&self, owner: Address) -> Result<U256, ChainError>;

    async fn token_total_supply(&self, token: Address) -> Result<U256, ChainError>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    async fn gas_price(&self) -> Result<U256, ChainError>;

    async fn estimate_gas(&self, call: &ContractCall) -> Result<U256, ChainError>;

    /// Signs, sends, and waits for one confirmation.
    async fn submit(
        &self,
        call: &ContractCall,
        gas: GasSettings,
    ) -> Result<TxReceiptSummary, ChainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_picks_out_user_rejection() {
        assert_eq!(
            ChainError::classify("MetaMask Tx Signature: User denied transaction signature."),
            ChainError::Rejected
        );
        assert_eq!(
            ChainError::classify("user rejected transaction"),
            ChainError::Rejected
        );
    }

    #[test]
    fn classify_extracts_revert_reason() {
        let err = ChainError::classify(
            r#"(code: 3, message: execution reverted: Address is blocked, data: Some(String("0x08c3")))"#,
        );
        assert_eq!(err, ChainError::Reverted("Address is blocked".into()));

        let bare = ChainError::classify("execution reverted");
        assert_eq!(bare, ChainError::Reverted("execution reverted".into()));
    }

    #[test]
    fn classify_funds_and_network() {
        assert_eq!(
            ChainError::classify("insufficient funds for gas * price + value: balance 0"),
            ChainError::InsufficientFunds
        );
        assert!(matches!(
            ChainError::classify("error sending request for url (http://localhost:8545/)"),
            ChainError::Network(_)
        ));
        assert!(matches!(ChainError::classify("nonce too low"), ChainError::Other(_)));
    }

    #[test]
    fn calls_know_their_target_and_value() {
        let presale = Address::repeat_byte(0x11);
        let token = Address::repeat_byte(0x22);
        let approve = ContractCall::Approve {
            token,
            spender: presale,
            amount: U256::from(5u64),
        };
        assert_eq!(approve.target(presale), token);
        assert_eq!(approve.value(), U256::zero());

        let buy = ContractCall::BuyWithEth {
            value: U256::from(10u64),
        };
        assert_eq!(buy.target(presale), presale);
        assert_eq!(buy.value(), U256::from(10u64));
        assert_eq!(buy.method(), "buyWithETH");
        assert_eq!(
            ContractCall::UpdateBaseApy { apy: U256::one() }.method(),
            "updateBaseAPY"
        );
    }
}
