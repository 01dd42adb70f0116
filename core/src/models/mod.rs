use chrono::{DateTime, Utc};
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

// reads directly from the presale contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub token_address: Address,
    pub token_balance: U256,
    pub eth_price: U256,
    pub stablecoin_price: U256,
    pub total_sold: U256,
    pub usdt_address: Address,
    pub usdc_address: Address,
    pub usdt_token_ratio: U256,
    pub usdc_token_ratio: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractBalances {
    pub token_balance: U256,
    pub usdt_balance: U256,
    pub usdc_balance: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub user: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub timestamp: U256,
    pub transaction_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStake {
    pub id: U256,
    pub amount: U256,
    pub start_time: U256,
    pub lock_period: U256,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStakeDetails {
    pub amount: U256,
    pub start_time: U256,
    pub lock_period: U256,
    pub pending_rewards: U256,
    pub time_remaining: U256,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStakingInfo {
    pub base_apy_rate: U256,
    pub min_staking_amount: U256,
    pub total_tokens_staked: U256,
    pub total_rewards_paid: U256,
    pub number_of_stakers: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawUserStakingInfo {
    pub total_user_staked: U256,
    pub total_pending_rewards: U256,
    pub active_stakes_count: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReferralInfo {
    pub referrer: Address,
    pub total_referrals: U256,
    pub total_rewards_earned: U256,
    pub reward_percentage: U256,
}

// display/JSON operations

/// Sale token, ETH and stablecoin balances of the wallet and the contract.
/// Replaced as a whole on every refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalances {
    pub token_supply: U256,
    pub user_token_balance: U256,
    pub user_eth_balance: U256,
    pub user_usdt_balance: U256,
    pub user_usdc_balance: U256,
    pub contract_token_balance: U256,
    pub contract_eth_balance: U256,
    pub contract_usdt_balance: U256,
    pub contract_usdc_balance: U256,
    pub total_penalty: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSnapshot {
    pub contract_info: ContractInfo,
    pub balances: TokenBalances,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub timestamp: DateTime<Utc>,
    pub user: Address,
    pub token_in: String,
    pub token_out: String,
    pub token_in_address: Address,
    pub token_out_address: Address,
    pub amount_in: String,
    pub amount_out: String,
    pub transaction_type: String,
}

impl TransactionRecord {
    pub fn is_referral(&self) -> bool {
        self.transaction_type == REFERRAL_TRANSACTION
    }
}

pub const BUY_TRANSACTION: &str = "BUY";
pub const REFERRAL_TRANSACTION: &str = "REFERRAL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub id: U256,
    pub amount: String,
    /// Unix seconds.
    pub start_time: u64,
    /// Days.
    pub lock_period: u64,
    pub pending_rewards: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRecord {
    pub referrer: Address,
    pub total_referrals: String,
    pub total_rewards_earned: String,
    pub reward_percentage: String,
}

impl ReferralRecord {
    pub fn has_referrer(&self) -> bool {
        !self.referrer.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralTransaction {
    pub timestamp: u64,
    pub referred_user: Address,
    pub purchase_amount: String,
    pub reward_amount: String,
}

/// Sale parameters combined with staking parameters and the wallet's
/// staking totals. Amounts are formatted token units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakingOverview {
    pub sale_token: Address,
    pub token_balance: String,
    pub eth_price: String,
    pub stablecoin_price: String,
    pub total_sold: String,
    pub usdt_address: Address,
    pub usdc_address: Address,
    pub usdt_token_ratio: String,
    pub usdc_token_ratio: String,
    pub base_apy: String,
    pub min_stake_amount: String,
    pub total_staked: String,
    pub total_rewards_distributed: String,
    pub total_stakers: String,
    pub user_staked: String,
    pub pending_rewards: String,
    pub active_stakes_count: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingBalances {
    pub token_balance: String,
    pub usdt_balance: String,
    pub usdc_balance: String,
    pub user_balance: String,
    pub user_staked: String,
    pub pending_rewards: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceiptSummary {
    pub transaction_hash: H256,
    pub to: Option<Address>,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub status: Option<u64>,
}

impl TxReceiptSummary {
    pub fn succeeded(&self) -> bool {
        self.status != Some(0)
    }
}

/// What a buyer pays with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentToken {
    Eth,
    Usdt,
    Usdc,
}

impl PaymentToken {
    pub const ALL: [PaymentToken; 3] = [PaymentToken::Eth, PaymentToken::Usdt, PaymentToken::Usdc];

    pub fn symbol(&self) -> &'static str {
        match self {
            PaymentToken::Eth => "ETH",
            PaymentToken::Usdt => "USDT",
            PaymentToken::Usdc => "USDC",
        }
    }

    pub fn decimals(&self) -> u32 {
        match self {
            PaymentToken::Eth => 18,
            PaymentToken::Usdt | PaymentToken::Usdc => 6,
        }
    }
}
