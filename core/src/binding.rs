//! The binding layer every page talks to.
//!
//! [`PresaleService`] wraps a [`PresaleChain`] with the dashboard's write
//! flow (toast, optional approval, discounted gas, padded limit, submit,
//! refresh) and turns raw contract reads into display records.

use std::sync::Arc;

use chrono::Utc;
use ethers::types::{Address, U256};
use tokio::sync::{watch, RwLock};
use tracing::{debug, warn};

use crate::chain::{ChainError, ContractCall, PresaleChain};
use crate::config::{parse_address, Config};
use crate::error::{handle_transaction_error, TxError};
use crate::format::{
    format_amount, format_token_amount, format_transaction_amount, is_valid_address,
    parse_amount, parse_integer, stablecoin_received, timestamp_from_secs, units_to_f64,
    STABLE_DECIMALS, TOKEN_DECIMALS,
};
use crate::gas::{discounted_gas_price, padded_gas_limit, GasSettings};
use crate::models::{
    ContractInfo, PaymentToken, RawTransaction, ReferralRecord, ReferralTransaction,
    SaleSnapshot, StakeRecord, StakingBalances, StakingOverview, TokenBalances,
    TransactionRecord, TxReceiptSummary, REFERRAL_TRANSACTION,
};
use crate::notify::{Notifier, ToastId};
use crate::referral::{referral_link, ReferralOutcome};
use crate::storage::{
    LocalStore, StablecoinPurchaseRecord, WithdrawalRecord, RECENT_TRANSACTIONS_KEY,
    WITHDRAWALS_KEY,
};

/// `Ok(None)` means nothing was sent: no wallet, or the user declined.
pub type TxResult = Result<Option<TxReceiptSummary>, TxError>;

const DEFAULT_BASE_APY: &str = "12";
const DEFAULT_MIN_STAKE: &str = "100";
const UPDATED: &str = "Successfully State updated";

struct Approval {
    token: Address,
    amount: U256,
    symbol: String,
    /// Skip the approve when the allowance already covers `amount`.
    check_allowance: bool,
}

struct WriteOp {
    action: &'static str,
    start: String,
    success: String,
    approval: Option<Approval>,
    call: ContractCall,
}

pub struct PresaleService {
    chain: Arc<dyn PresaleChain>,
    notifier: Arc<dyn Notifier>,
    config: Config,
    store: LocalStore,
    refresh: watch::Sender<u64>,
    snapshot: RwLock<Option<SaleSnapshot>>,
}

impl PresaleService {
    pub fn new(chain: Arc<dyn PresaleChain>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        let store = LocalStore::new(config.storage_dir());
        let (refresh, _) = watch::channel(0);
        Self {
            chain,
            notifier,
            config,
            store,
            refresh,
            snapshot: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// The connected wallet.
    pub fn account(&self) -> Option<Address> {
        self.chain.signer_address()
    }

    /// Ticks after every confirmed write.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.refresh.subscribe()
    }

    pub fn refresh_count(&self) -> u64 {
        *self.refresh.borrow()
    }

    async fn execute(&self, op: WriteOp) -> TxResult {
        let Some(account) = self.account() else {
            debug!("{} skipped, no wallet connected", op.action);
            return Ok(None);
        };
        let toast = self.notifier.start(&op.start);

        match self.send(account, toast, &op).await {
            Ok(receipt) => {
                debug!(hash = ?receipt.transaction_hash, "{} done", op.action);
                self.refresh.send_modify(|count| *count += 1);
                self.notifier.complete(toast, &op.success);
                Ok(Some(receipt))
            }
            Err(err) => {
                let err = handle_transaction_error(&err, op.action);
                if err.is_rejection() {
                    self.notifier.reject(toast, "Transaction rejected by user");
                    return Ok(None);
                }
                self.notifier
                    .fail(toast, &format!("Transaction failed: {}", err.message));
                Err(err)
            }
        }
    }

    async fn send(
        &self,
        account: Address,
        toast: ToastId,
        op: &WriteOp,
    ) -> Result<TxReceiptSummary, ChainError> {
        if let Some(approval) = &op.approval {
            self.approve(account, toast, approval).await?;
        }

        let gas_price = discounted_gas_price(self.chain.gas_price().await?);
        let estimate = self.chain.estimate_gas(&op.call).await?;
        let gas = GasSettings {
            gas_price,
            gas_limit: Some(padded_gas_limit(estimate)),
        };
        debug!(%gas_price, %estimate, "submitting {}", op.call);
        self.chain.submit(&op.call, gas).await
    }

    async fn approve(
        &self,
        account: Address,
        toast: ToastId,
        approval: &Approval,
    ) -> Result<(), ChainError> {
        let spender = self.chain.contract_address();
        if approval.check_allowance {
            let allowance = self
                .chain
                .token_allowance(approval.token, account, spender)
                .await?;
            if allowance >= approval.amount {
                self.notifier.update(
                    toast,
                    &format!(
                        "{} already approved, proceeding with purchase...",
                        approval.symbol
                    ),
                );
                return Ok(());
            }
        }

        let call = ContractCall::Approve {
            token: approval.token,
            spender,
            amount: approval.amount,
        };
        let gas = GasSettings {
            gas_price: discounted_gas_price(self.chain.gas_price().await?),
            gas_limit: None,
        };
        self.chain.submit(&call, gas).await?;

        let message = if approval.check_allowance {
            format!("{} spending approved!", approval.symbol)
        } else {
            "Approval complete. Staking tokens...".to_string()
        };
        self.notifier.approve(toast, &message);
        Ok(())
    }

    /// Bad input: fails a toast and returns without touching the chain.
    fn invalid(&self, start: &str, message: impl Into<String>) -> TxResult {
        if self.account().is_none() {
            return Ok(None);
        }
        let err = TxError::invalid_input(message);
        let toast = self.notifier.start(start);
        self.notifier.fail(toast, &err.message);
        Err(err)
    }

    fn symbol(&self) -> &str {
        &self.config.token.symbol
    }

    /// Token addresses as the contract last reported them. The owner can
    /// repoint any of them, so the configured addresses are only used until
    /// the first refresh.
    async fn token_addresses(&self) -> TokenAddresses {
        let configured = TokenAddresses::configured(&self.config);
        match self.snapshot().await {
            Some(snapshot) => configured.updated_from(&snapshot.contract_info),
            None => configured,
        }
    }

    async fn stablecoin_address(&self, payment: PaymentToken) -> Address {
        let addresses = self.token_addresses().await;
        match payment {
            PaymentToken::Usdc => addresses.usdc,
            _ => addresses.usdt,
        }
    }

    /// Smallest stake the contract accepts, falling back to the configured
    /// minimum when the staking section cannot be read.
    async fn min_stake(&self) -> U256 {
        match self.chain.staking_info().await {
            Ok(info) => info.min_staking_amount,
            Err(e) => {
                warn!("Error getting staking info: {e}");
                let configured = self.config.min_stake_amount.as_deref();
                parse_amount(configured.unwrap_or(DEFAULT_MIN_STAKE), TOKEN_DECIMALS)
                    .unwrap_or_default()
            }
        }
    }

    /// The wallet's sale-token balance from the snapshot, or read directly
    /// before the first refresh.
    async fn wallet_token_balance(&self, account: Address) -> Option<U256> {
        if let Some(snapshot) = self.snapshot().await {
            return Some(snapshot.balances.user_token_balance);
        }
        let token = self.token_addresses().await.sale;
        self.chain
            .token_balance(token, account)
            .await
            .map_err(|e| warn!("Error getting token balance: {e}"))
            .ok()
    }

    // sale

    pub async fn buy_with_eth(&self, eth_amount: &str) -> TxResult {
        let start = format!(
            "Initializing buy With {} transaction...",
            self.config.token.currency
        );
        let value = match positive_amount(eth_amount, TOKEN_DECIMALS) {
            Ok(value) => value,
            Err(e) => return self.invalid(&start, e),
        };
        let eth_amount = eth_amount.trim();
        self.execute(WriteOp {
            action: "buying with ETH",
            success: format!("Successfully purchased {eth_amount} {}!", self.symbol()),
            start,
            approval: None,
            call: ContractCall::BuyWithEth { value },
        })
        .await
    }

    pub async fn buy_with_usdt(&self, amount: &str) -> TxResult {
        self.buy_with_stablecoin(PaymentToken::Usdt, amount).await
    }

    pub async fn buy_with_usdc(&self, amount: &str) -> TxResult {
        self.buy_with_stablecoin(PaymentToken::Usdc, amount).await
    }

    /// The contract takes whole stablecoin units; the approval covers the
    /// same amount in base units.
    async fn buy_with_stablecoin(&self, payment: PaymentToken, amount: &str) -> TxResult {
        let symbol = payment.symbol();
        let start = format!("Initializing buy With {symbol} transaction...");
        let whole = match parse_integer(amount) {
            Ok(whole) if !whole.is_zero() => whole,
            Ok(_) => return self.invalid(&start, "Amount must be greater than 0"),
            Err(e) => return self.invalid(&start, e),
        };
        let units = match parse_amount(amount, STABLE_DECIMALS) {
            Ok(units) => units,
            Err(e) => return self.invalid(&start, e),
        };
        let amount = amount.trim();
        let call = match payment {
            PaymentToken::Usdc => ContractCall::BuyWithUsdc { amount: whole },
            _ => ContractCall::BuyWithUsdt { amount: whole },
        };
        self.execute(WriteOp {
            action: "buying with stablecoin",
            success: format!("Successfully purchased with {amount} {symbol}!"),
            start,
            approval: Some(Approval {
                token: self.stablecoin_address(payment).await,
                amount: units,
                symbol: symbol.to_string(),
                check_allowance: true,
            }),
            call,
        })
        .await
    }

    pub async fn buy_usdt(&self, eth_amount: &str) -> TxResult {
        self.buy_stablecoin(PaymentToken::Usdt, eth_amount).await
    }

    pub async fn buy_usdc(&self, eth_amount: &str) -> TxResult {
        self.buy_stablecoin(PaymentToken::Usdc, eth_amount).await
    }

    /// Swaps ETH for a stablecoin held by the contract and records the
    /// purchase in the display cache.
    async fn buy_stablecoin(&self, payment: PaymentToken, eth_amount: &str) -> TxResult {
        let symbol = payment.symbol();
        let start = format!("Initializing buy With {symbol} transaction...");
        let value = match positive_amount(eth_amount, TOKEN_DECIMALS) {
            Ok(value) => value,
            Err(e) => return self.invalid(&start, e),
        };
        let eth_amount = eth_amount.trim();
        let call = match payment {
            PaymentToken::Usdc => ContractCall::BuyUsdc { value },
            _ => ContractCall::BuyUsdt { value },
        };
        let receipt = self
            .execute(WriteOp {
                action: "buying stablecoin",
                success: format!("Successfully purchased with {eth_amount} {symbol}!"),
                start,
                approval: None,
                call,
            })
            .await?;

        if let Some(receipt) = &receipt {
            let price = match self.snapshot().await {
                Some(s) => units_to_f64(s.contract_info.stablecoin_price, TOKEN_DECIMALS),
                None => 0.0,
            };
            let now = Utc::now();
            self.store.record(
                RECENT_TRANSACTIONS_KEY,
                StablecoinPurchaseRecord {
                    id: now.timestamp_millis() as u64,
                    kind: "BUY".to_string(),
                    stablecoin: symbol.to_string(),
                    eth_amount: eth_amount.to_string(),
                    stablecoin_amount: stablecoin_received(eth_amount, price),
                    timestamp: now,
                    hash: receipt.transaction_hash,
                },
            );
        }
        Ok(receipt)
    }

    // admin

    async fn admin_update(&self, call: ContractCall) -> TxResult {
        self.execute(WriteOp {
            action: "updating contract state",
            start: format!("Initializing {} transaction...", call.method()),
            success: UPDATED.to_string(),
            approval: None,
            call,
        })
        .await
    }

    fn admin_start(method: &str) -> String {
        format!("Initializing {method} transaction...")
    }

    pub async fn update_stablecoin_price(&self, price: &str) -> TxResult {
        match positive_amount(price, TOKEN_DECIMALS) {
            Ok(price) => {
                self.admin_update(ContractCall::UpdateStablecoinPrice { price })
                    .await
            }
            Err(e) => self.invalid(&Self::admin_start("updateStablecoinPrice"), e),
        }
    }

    pub async fn update_token_price(&self, price: &str) -> TxResult {
        match positive_amount(price, TOKEN_DECIMALS) {
            Ok(price) => self.admin_update(ContractCall::UpdateTokenPrice { price }).await,
            Err(e) => self.invalid(&Self::admin_start("updateTokenPrice"), e),
        }
    }

    pub async fn update_usdt(&self, token: &str, ratio: &str) -> TxResult {
        match parse_token_ratio(token, ratio) {
            Ok((token, ratio)) => {
                self.admin_update(ContractCall::UpdateUsdt { token, ratio })
                    .await
            }
            Err(e) => self.invalid(&Self::admin_start("updateUSDT"), e),
        }
    }

    pub async fn update_usdc(&self, token: &str, ratio: &str) -> TxResult {
        match parse_token_ratio(token, ratio) {
            Ok((token, ratio)) => {
                self.admin_update(ContractCall::UpdateUsdc { token, ratio })
                    .await
            }
            Err(e) => self.invalid(&Self::admin_start("updateUSDC"), e),
        }
    }

    pub async fn set_sale_token(&self, token: &str) -> TxResult {
        match checked_address(token) {
            Ok(token) => self.admin_update(ContractCall::SetSaleToken { token }).await,
            Err(e) => self.invalid(&Self::admin_start("setSaleToken"), e),
        }
    }

    pub async fn set_block_status(&self, user: &str, blocked: bool) -> TxResult {
        match checked_address(user) {
            Ok(user) => {
                self.admin_update(ContractCall::SetBlockStatus { user, blocked })
                    .await
            }
            Err(e) => self.invalid(&Self::admin_start("setBlockStatus"), e),
        }
    }

    /// Decimals for a token the contract holds: 6 for the stablecoins, 18
    /// for ETH and the sale token.
    pub fn token_decimals(&self, token: Address) -> u32 {
        if self.config.is_stablecoin(token) {
            STABLE_DECIMALS
        } else {
            TOKEN_DECIMALS
        }
    }

    /// Display name of a token address in records.
    pub fn token_name(&self, token: Address) -> String {
        if token == self.config.usdt_address {
            "USDT".to_string()
        } else if token == self.config.usdc_address {
            "USDC".to_string()
        } else if token == self.config.token_address {
            self.config.token.symbol.clone()
        } else {
            "ETH".to_string()
        }
    }

    /// What the last snapshot says the contract holds of `token`.
    fn contract_holding(balances: &TokenBalances, config: &Config, token: Address) -> U256 {
        if token == config.usdt_address {
            balances.contract_usdt_balance
        } else if token == config.usdc_address {
            balances.contract_usdc_balance
        } else if token == config.token_address {
            balances.contract_token_balance
        } else {
            balances.contract_eth_balance
        }
    }

    /// Withdraws `amount` (decimal, in the token's own units) of `token`
    /// from the contract to the owner.
    pub async fn withdraw_tokens(&self, token: Address, amount: &str) -> TxResult {
        let start = Self::admin_start("withdrawTokens");
        let decimals = self.token_decimals(token);
        let units = match positive_amount(amount, decimals) {
            Ok(units) => units,
            Err(e) => return self.invalid(&start, e),
        };
        if let Some(snapshot) = self.snapshot().await {
            let held = Self::contract_holding(&snapshot.balances, &self.config, token);
            if units > held {
                return self.invalid(&start, "Amount exceeds contract balance");
            }
        }

        let receipt = self
            .admin_update(ContractCall::WithdrawTokens {
                token,
                amount: units,
            })
            .await?;

        if let (Some(receipt), Some(account)) = (&receipt, self.account()) {
            let now = Utc::now();
            self.store.record(
                WITHDRAWALS_KEY,
                WithdrawalRecord {
                    id: now.timestamp_millis() as u64,
                    token: self.token_name(token),
                    amount: amount.trim().to_string(),
                    timestamp: now,
                    address: account,
                    status: "completed".to_string(),
                    hash: receipt.transaction_hash,
                },
            );
        }
        Ok(receipt)
    }

    // staking

    pub async fn stake_tokens(&self, amount: &str, lock_days: u64) -> TxResult {
        let amount = amount.trim();
        let start = format!(
            "Initializing staking of {amount} {} tokens...",
            self.symbol()
        );
        let units = match positive_amount(amount, TOKEN_DECIMALS) {
            Ok(units) => units,
            Err(e) => return self.invalid(&start, e),
        };
        if !self.config.lock_periods.contains(&lock_days) {
            return self.invalid(&start, format!("Invalid lock period: {lock_days} days"));
        }
        let Some(account) = self.account() else {
            return Ok(None);
        };
        let min = self.min_stake().await;
        if units < min {
            return self.invalid(
                &start,
                format!(
                    "Minimum stake amount is {} {}",
                    format_amount(min, TOKEN_DECIMALS, 2),
                    self.symbol()
                ),
            );
        }
        if let Some(balance) = self.wallet_token_balance(account).await {
            if units > balance {
                return self.invalid(&start, format!("Insufficient {} balance", self.symbol()));
            }
        }
        let token = self.token_addresses().await.sale;
        self.execute(WriteOp {
            action: "staking tokens",
            success: format!(
                "Successfully staked {amount} {} for {lock_days} days!",
                self.symbol()
            ),
            start,
            approval: Some(Approval {
                token,
                amount: units,
                symbol: self.symbol().to_string(),
                check_allowance: false,
            }),
            call: ContractCall::StakeTokens {
                amount: units,
                lock_period: U256::from(lock_days),
            },
        })
        .await
    }

    pub async fn harvest_rewards(&self, stake_id: U256) -> TxResult {
        self.execute(WriteOp {
            action: "harvesting rewards",
            start: format!("Initializing reward harvest for stake #{stake_id}..."),
            success: format!("Successfully harvested rewards from stake #{stake_id}!"),
            approval: None,
            call: ContractCall::HarvestRewards { stake_id },
        })
        .await
    }

    pub async fn unstake_tokens(&self, stake_id: U256) -> TxResult {
        self.execute(WriteOp {
            action: "unstaking tokens",
            start: format!("Initializing unstake for stake #{stake_id}..."),
            success: format!("Successfully unstaked tokens from stake #{stake_id}!"),
            approval: None,
            call: ContractCall::UnstakeTokens { stake_id },
        })
        .await
    }

    pub async fn unstake_early(&self, stake_id: U256) -> TxResult {
        self.execute(WriteOp {
            action: "unstaking early",
            start: "Initializing early unstake with 5% penalty...".to_string(),
            success: "Successfully unstaked tokens with 5% penalty!".to_string(),
            approval: None,
            call: ContractCall::UnstakeEarly { stake_id },
        })
        .await
    }

    pub async fn update_base_apy(&self, apy: &str) -> TxResult {
        let apy = apy.trim();
        let start = format!("Updating base APY to {apy}%...");
        let value = match parse_integer(apy) {
            Ok(value) if !value.is_zero() => value,
            _ => return self.invalid(&start, "APY must be greater than 0"),
        };
        self.execute(WriteOp {
            action: "updating base APY",
            start,
            success: format!("Successfully updated base APY to {value}%!"),
            approval: None,
            call: ContractCall::UpdateBaseApy { apy: value },
        })
        .await
    }

    pub async fn update_min_stake_amount(&self, amount: &str) -> TxResult {
        let start = "Updating minimum stake amount...".to_string();
        let units = match positive_amount(amount, TOKEN_DECIMALS) {
            Ok(units) => units,
            Err(e) => return self.invalid(&start, e),
        };
        self.execute(WriteOp {
            action: "updating minimum stake amount",
            start,
            success: format!(
                "Successfully updated minimum stake amount to {} tokens!",
                amount.trim()
            ),
            approval: None,
            call: ContractCall::UpdateMinStakeAmount { amount: units },
        })
        .await
    }

    // referral

    pub async fn register_referrer(&self, referrer: &str) -> TxResult {
        let start = "Registering referrer...".to_string();
        let referrer = match checked_address(referrer) {
            Ok(referrer) => referrer,
            Err(e) => return self.invalid(&start, e),
        };
        self.execute(WriteOp {
            action: "registering referrer",
            start,
            success: "Successfully registered referrer!".to_string(),
            approval: None,
            call: ContractCall::RegisterReferrer { referrer },
        })
        .await
    }

    /// Registers the referrer named by a launch code, unless the wallet
    /// already has one or the code points back at the wallet.
    pub async fn handle_referral_registration(
        &self,
        code: Option<&str>,
    ) -> Result<ReferralOutcome, TxError> {
        let Some(account) = self.account() else {
            return Ok(ReferralOutcome::NotConnected);
        };
        if let Some(info) = self.referral_info(account).await {
            if info.has_referrer() {
                debug!(referrer = ?info.referrer, "wallet already has a referrer");
                return Ok(ReferralOutcome::AlreadyReferred(info.referrer));
            }
        }
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(ReferralOutcome::NoCode);
        };
        let referrer = match checked_address(code) {
            Ok(referrer) => referrer,
            Err(_) => return Ok(ReferralOutcome::InvalidCode(code.to_string())),
        };
        if referrer == account {
            return Ok(ReferralOutcome::SelfReferral);
        }
        match self.register_referrer(code).await? {
            Some(receipt) => Ok(ReferralOutcome::Registered(receipt)),
            None => Ok(ReferralOutcome::NotRegistered),
        }
    }

    pub fn referral_link(&self, account: Address) -> String {
        referral_link(&self.config.domain_url, account)
    }

    pub async fn referral_info(&self, account: Address) -> Option<ReferralRecord> {
        match self.chain.referral_info(account).await {
            Ok(raw) => Some(ReferralRecord {
                referrer: raw.referrer,
                total_referrals: raw.total_referrals.to_string(),
                total_rewards_earned: format_token_amount(raw.total_rewards_earned, TOKEN_DECIMALS),
                reward_percentage: raw.reward_percentage.to_string(),
            }),
            Err(e) => {
                warn!("Error getting referral info: {e}");
                None
            }
        }
    }

    pub async fn user_referrals(&self, account: Address) -> Vec<Address> {
        self.chain
            .user_referrals(account)
            .await
            .unwrap_or_else(|e| {
                warn!("Error getting user referrals: {e}");
                Vec::new()
            })
    }

    pub async fn referral_transactions(&self, account: Address) -> Vec<ReferralTransaction> {
        match self.chain.user_transactions(account).await {
            Ok(txs) => txs
                .into_iter()
                .filter(|tx| tx.transaction_type == REFERRAL_TRANSACTION)
                .map(|tx| ReferralTransaction {
                    timestamp: tx.timestamp.low_u64(),
                    referred_user: tx.user,
                    purchase_amount: format_token_amount(tx.amount_in, TOKEN_DECIMALS),
                    reward_amount: format_token_amount(tx.amount_out, TOKEN_DECIMALS),
                })
                .collect(),
            Err(e) => {
                warn!("Error getting referral transactions: {e}");
                Vec::new()
            }
        }
    }

    // reads

    /// Re-reads sale state and balances and replaces the snapshot.
    pub async fn refresh(&self) -> Result<SaleSnapshot, ChainError> {
        let chain = &self.chain;
        let contract = chain.contract_address();

        let contract_info = chain.contract_info().await?;
        let addresses = TokenAddresses::configured(&self.config).updated_from(&contract_info);
        let token = addresses.sale;
        let (token_supply, contract_balances, contract_eth_balance, total_penalty) = futures::try_join!(
            chain.token_total_supply(token),
            chain.contract_balances(),
            chain.eth_balance(contract),
            chain.total_penalty_collected(),
        )?;

        let mut balances = TokenBalances {
            token_supply,
            contract_token_balance: contract_balances.token_balance,
            contract_eth_balance,
            contract_usdt_balance: contract_balances.usdt_balance,
            contract_usdc_balance: contract_balances.usdc_balance,
            total_penalty,
            ..TokenBalances::default()
        };

        if let Some(account) = self.account() {
            let (token_balance, eth_balance, usdt_balance, usdc_balance) = futures::try_join!(
                chain.token_balance(token, account),
                chain.eth_balance(account),
                chain.token_balance(addresses.usdt, account),
                chain.token_balance(addresses.usdc, account),
            )?;
            balances.user_token_balance = token_balance;
            balances.user_eth_balance = eth_balance;
            balances.user_usdt_balance = usdt_balance;
            balances.user_usdc_balance = usdc_balance;
        }

        let snapshot = SaleSnapshot {
            contract_info,
            balances,
            refreshed_at: Utc::now(),
        };
        *self.snapshot.write().await = Some(snapshot.clone());
        debug!("sale snapshot refreshed");
        Ok(snapshot)
    }

    pub async fn snapshot(&self) -> Option<SaleSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn contract_deployed(&self) -> bool {
        self.chain.contract_deployed().await.unwrap_or_else(|e| {
            warn!("Error checking contract code: {e}");
            false
        })
    }

    pub async fn is_owner(&self) -> bool {
        let Some(account) = self.account() else {
            return false;
        };
        match self.chain.owner().await {
            Ok(owner) => owner == account,
            Err(e) => {
                warn!("Error checking contract owner: {e}");
                false
            }
        }
    }

    fn transaction_record(&self, raw: RawTransaction) -> TransactionRecord {
        let in_stable = self.config.is_stablecoin(raw.token_in);
        TransactionRecord {
            timestamp: timestamp_from_secs(raw.timestamp.low_u64()),
            user: raw.user,
            token_in: self.token_name(raw.token_in),
            token_out: self.token_name(raw.token_out),
            token_in_address: raw.token_in,
            token_out_address: raw.token_out,
            amount_in: format_transaction_amount(
                raw.amount_in,
                self.token_decimals(raw.token_in),
                in_stable,
            ),
            amount_out: format_amount(raw.amount_out, self.token_decimals(raw.token_out), 2),
            transaction_type: raw.transaction_type,
        }
    }

    pub async fn user_transactions(&self, account: Address) -> Vec<TransactionRecord> {
        match self.chain.user_transactions(account).await {
            Ok(txs) => txs
                .into_iter()
                .map(|tx| self.transaction_record(tx))
                .collect(),
            Err(e) => {
                warn!("Error getting user transactions: {e}");
                Vec::new()
            }
        }
    }

    pub async fn all_transactions(&self) -> Vec<TransactionRecord> {
        match self.chain.all_transactions().await {
            Ok(txs) => txs
                .into_iter()
                .map(|tx| self.transaction_record(tx))
                .collect(),
            Err(e) => {
                warn!("Error getting all transactions: {e}");
                Vec::new()
            }
        }
    }

    /// Active stakes, each with its current pending rewards.
    pub async fn user_stakes(&self, account: Address) -> Vec<StakeRecord> {
        match self.try_user_stakes(account).await {
            Ok(stakes) => stakes,
            Err(e) => {
                warn!("Error getting user stakes: {e}");
                Vec::new()
            }
        }
    }

    async fn try_user_stakes(&self, account: Address) -> Result<Vec<StakeRecord>, ChainError> {
        let mut records = Vec::new();
        for stake in self.chain.user_stakes(account).await? {
            if !stake.active {
                continue;
            }
            let details = self.chain.stake_details(stake.id).await?;
            records.push(StakeRecord {
                id: stake.id,
                amount: format_token_amount(stake.amount, TOKEN_DECIMALS),
                start_time: stake.start_time.low_u64(),
                lock_period: stake.lock_period.low_u64(),
                pending_rewards: format_token_amount(details.pending_rewards, TOKEN_DECIMALS),
                active: true,
            });
        }
        Ok(records)
    }

    /// Sale parameters with staking parameters and the wallet's staking
    /// totals. Falls back to the default APY and minimum stake when the
    /// staking section cannot be read.
    pub async fn staking_overview(&self) -> Option<StakingOverview> {
        let info = match self.chain.contract_info().await {
            Ok(info) => info,
            Err(e) => {
                warn!("Error getting contract info: {e}");
                return None;
            }
        };
        let staking = self
            .chain
            .staking_info()
            .await
            .map_err(|e| warn!("Error getting staking info: {e}"))
            .ok();
        let user = match self.account() {
            Some(account) => match self.chain.user_staking_info(account).await {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Error getting user staking info: {e}");
                    return None;
                }
            },
            None => None,
        };

        let tokens = |v: U256| format_token_amount(v, TOKEN_DECIMALS);
        Some(StakingOverview {
            sale_token: info.token_address,
            token_balance: tokens(info.token_balance),
            eth_price: tokens(info.eth_price),
            stablecoin_price: tokens(info.stablecoin_price),
            total_sold: tokens(info.total_sold),
            usdt_address: info.usdt_address,
            usdc_address: info.usdc_address,
            usdt_token_ratio: info.usdt_token_ratio.to_string(),
            usdc_token_ratio: info.usdc_token_ratio.to_string(),
            base_apy: staking
                .as_ref()
                .map(|s| s.base_apy_rate.to_string())
                .unwrap_or_else(|| DEFAULT_BASE_APY.to_string()),
            min_stake_amount: staking
                .as_ref()
                .map(|s| tokens(s.min_staking_amount))
                .unwrap_or_else(|| DEFAULT_MIN_STAKE.to_string()),
            total_staked: staking
                .as_ref()
                .map(|s| tokens(s.total_tokens_staked))
                .unwrap_or_else(|| "0".to_string()),
            total_rewards_distributed: staking
                .as_ref()
                .map(|s| tokens(s.total_rewards_paid))
                .unwrap_or_else(|| "0".to_string()),
            total_stakers: staking
                .as_ref()
                .map(|s| s.number_of_stakers.to_string())
                .unwrap_or_else(|| "0".to_string()),
            user_staked: user
                .as_ref()
                .map(|u| tokens(u.total_user_staked))
                .unwrap_or_else(|| "0".to_string()),
            pending_rewards: user
                .as_ref()
                .map(|u| tokens(u.total_pending_rewards))
                .unwrap_or_else(|| "0".to_string()),
            active_stakes_count: user
                .as_ref()
                .map(|u| u.active_stakes_count.to_string())
                .unwrap_or_else(|| "0".to_string()),
        })
    }

    pub async fn staking_balances(&self) -> Option<StakingBalances> {
        match self.try_staking_balances().await {
            Ok(balances) => Some(balances),
            Err(e) => {
                warn!("Error getting token balances: {e}");
                None
            }
        }
    }

    async fn try_staking_balances(&self) -> Result<StakingBalances, ChainError> {
        let contract = self.chain.contract_balances().await?;
        let (user_balance, user_staked, pending_rewards) = match self.account() {
            Some(account) => {
                let token = self.token_addresses().await.sale;
                let (balance, staking) = futures::try_join!(
                    self.chain.token_balance(token, account),
                    self.chain.user_staking_info(account),
                )?;
                (
                    balance,
                    staking.total_user_staked,
                    staking.total_pending_rewards,
                )
            }
            None => (U256::zero(), U256::zero(), U256::zero()),
        };
        Ok(StakingBalances {
            token_balance: format_token_amount(contract.token_balance, TOKEN_DECIMALS),
            usdt_balance: format_token_amount(contract.usdt_balance, STABLE_DECIMALS),
            usdc_balance: format_token_amount(contract.usdc_balance, STABLE_DECIMALS),
            user_balance: format_token_amount(user_balance, TOKEN_DECIMALS),
            user_staked: format_token_amount(user_staked, TOKEN_DECIMALS),
            pending_rewards: format_token_amount(pending_rewards, TOKEN_DECIMALS),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct TokenAddresses {
    sale: Address,
    usdt: Address,
    usdc: Address,
}

impl TokenAddresses {
    fn configured(config: &Config) -> Self {
        Self {
            sale: config.token_address,
            usdt: config.usdt_address,
            usdc: config.usdc_address,
        }
    }

    /// Takes each non-zero address the contract reports.
    fn updated_from(self, info: &ContractInfo) -> Self {
        let pick = |reported: Address, configured: Address| {
            if reported.is_zero() {
                configured
            } else {
                reported
            }
        };
        Self {
            sale: pick(info.token_address, self.sale),
            usdt: pick(info.usdt_address, self.usdt),
            usdc: pick(info.usdc_address, self.usdc),
        }
    }
}

fn positive_amount(input: &str, decimals: u32) -> Result<U256, String> {
    let amount = parse_amount(input, decimals)?;
    if amount.is_zero() {
        return Err("Amount must be greater than 0".to_string());
    }
    Ok(amount)
}

fn checked_address(input: &str) -> Result<Address, String> {
    let input = input.trim();
    if !is_valid_address(input) {
        return Err(format!("Invalid address: {input}"));
    }
    parse_address(input).map_err(|e| e.to_string())
}

fn parse_token_ratio(token: &str, ratio: &str) -> Result<(Address, U256), String> {
    let token = checked_address(token)?;
    let ratio = parse_integer(ratio)?;
    if ratio.is_zero() {
        return Err("Ratio must be greater than 0".to_string());
    }
    Ok((token, ratio))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;
    use ethers::types::H256;

    use super::*;
    use crate::error::ErrorCode;
    use crate::models::{
        ContractBalances, ContractInfo, RawReferralInfo, RawStake, RawStakeDetails,
        RawStakingInfo, RawUserStakingInfo, BUY_TRANSACTION,
    };
    use crate::notify::{ToastBoard, ToastLevel};

    const PRESALE: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const TOKEN: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
    const USDT: &str = "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0";
    const USDC: &str = "0xCf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9";

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn wallet() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn test_config() -> Config {
        let storage = std::env::temp_dir().join(format!(
            "presale-binding-{}-{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let vars = HashMap::from([
            ("RPC_URL", "http://127.0.0.1:8545".to_string()),
            ("TOKEN_ICO_ADDRESS", PRESALE.to_string()),
            ("TOKEN_ADDRESS", TOKEN.to_string()),
            ("USDT_ADDRESS", USDT.to_string()),
            ("USDC_ADDRESS", USDC.to_string()),
            ("TOKEN_SYMBOL", "FSX".to_string()),
            ("DOMAIN_URL", "https://presale.example".to_string()),
            ("STORAGE_DIR", storage.display().to_string()),
        ]);
        Config::from_vars(|k| vars.get(k).cloned()).unwrap()
    }

    struct FakeChain {
        signer: Option<Address>,
        owner: Address,
        gas_price: U256,
        estimate: U256,
        allowance: U256,
        sale_token: Address,
        usdt_token: Address,
        wallet_tokens: U256,
        staking: Option<RawStakingInfo>,
        referrer: Address,
        submit_error: Option<ChainError>,
        transactions: Vec<RawTransaction>,
        stakes: Vec<RawStake>,
        submitted: Mutex<Vec<(ContractCall, GasSettings)>>,
    }

    impl FakeChain {
        fn new(signer: Option<Address>) -> Self {
            Self {
                signer,
                owner: wallet(),
                gas_price: U256::from(100u64),
                estimate: U256::from(21_000u64),
                allowance: U256::zero(),
                sale_token: addr(TOKEN),
                usdt_token: addr(USDT),
                wallet_tokens: U256::exp10(21),
                staking: None,
                referrer: Address::zero(),
                submit_error: None,
                transactions: Vec::new(),
                stakes: Vec::new(),
                submitted: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(ContractCall, GasSettings)> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PresaleChain for FakeChain {
        fn contract_address(&self) -> Address {
            addr(PRESALE)
        }

        fn signer_address(&self) -> Option<Address> {
            self.signer
        }

        async fn contract_deployed(&self) -> Result<bool, ChainError> {
            Ok(true)
        }

        async fn owner(&self) -> Result<Address, ChainError> {
            Ok(self.owner)
        }

        async fn contract_info(&self) -> Result<ContractInfo, ChainError> {
            Ok(ContractInfo {
                token_address: self.sale_token,
                token_balance: U256::exp10(24),
                eth_price: U256::exp10(14),
                stablecoin_price: U256::exp10(15) / 2,
                total_sold: U256::exp10(21),
                usdt_address: self.usdt_token,
                usdc_address: addr(USDC),
                usdt_token_ratio: U256::from(25u64),
                usdc_token_ratio: U256::from(25u64),
            })
        }

        async fn contract_balances(&self) -> Result<ContractBalances, ChainError> {
            Ok(ContractBalances {
                token_balance: U256::exp10(24),
                usdt_balance: U256::from(5_000_000u64),
                usdc_balance: U256::from(7_000_000u64),
            })
        }

        async fn total_penalty_collected(&self) -> Result<U256, ChainError> {
            Ok(U256::from(3u64))
        }

        async fn user_transactions(&self, _user: Address) -> Result<Vec<RawTransaction>, ChainError> {
            Ok(self.transactions.clone())
        }

        async fn all_transactions(&self) -> Result<Vec<RawTransaction>, ChainError> {
            Err(ChainError::Network("connection refused".into()))
        }

        async fn user_stakes(&self, _user: Address) -> Result<Vec<RawStake>, ChainError> {
            Ok(self.stakes.clone())
        }

        async fn stake_details(&self, stake_id: U256) -> Result<RawStakeDetails, ChainError> {
            Ok(RawStakeDetails {
                pending_rewards: stake_id * U256::exp10(18),
                active: true,
                ..RawStakeDetails::default()
            })
        }

        async fn staking_info(&self) -> Result<RawStakingInfo, ChainError> {
            self.staking
                .clone()
                .ok_or_else(|| ChainError::Reverted("not available".into()))
        }

        async fn user_staking_info(&self, _user: Address) -> Result<RawUserStakingInfo, ChainError> {
            Ok(RawUserStakingInfo {
                total_user_staked: U256::exp10(20),
                total_pending_rewards: U256::exp10(18),
                active_stakes_count: U256::one(),
            })
        }

        async fn referral_info(&self, _user: Address) -> Result<RawReferralInfo, ChainError> {
            Ok(RawReferralInfo {
                referrer: self.referrer,
                ..RawReferralInfo::default()
            })
        }

        async fn user_referrals(&self, _user: Address) -> Result<Vec<Address>, ChainError> {
            Ok(vec![Address::repeat_byte(0x01)])
        }

        async fn eth_balance(&self, owner: Address) -> Result<U256, ChainError> {
            if owner == addr(PRESALE) {
                Ok(U256::exp10(18))
            } else {
                Ok(U256::exp10(17))
            }
        }

        async fn token_total_supply(&self, _token: Address) -> Result<U256, ChainError> {
            Ok(U256::exp10(27))
        }

        async fn token_balance(&self, token: Address, _owner: Address) -> Result<U256, ChainError> {
            if token == self.sale_token {
                return Ok(self.wallet_tokens);
            }
            Ok(U256::from(token.to_low_u64_be() % 1000))
        }

        async fn token_allowance(
            &self,
            _token: Address,
            _owner: Address,
            _spender: Address,
        ) -> Result<U256, ChainError> {
            Ok(self.allowance)
        }

        async fn gas_price(&self) -> Result<U256, ChainError> {
            Ok(self.gas_price)
        }

        async fn estimate_gas(&self, _call: &ContractCall) -> Result<U256, ChainError> {
            Ok(self.estimate)
        }

        async fn submit(
            &self,
            call: &ContractCall,
            gas: GasSettings,
        ) -> Result<TxReceiptSummary, ChainError> {
            if !matches!(call, ContractCall::Approve { .. }) {
                if let Some(err) = &self.submit_error {
                    return Err(err.clone());
                }
            }
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push((call.clone(), gas));
            Ok(TxReceiptSummary {
                transaction_hash: H256::from_low_u64_be(submitted.len() as u64),
                to: Some(call.target(addr(PRESALE))),
                block_number: Some(1),
                gas_used: gas.gas_limit,
                status: Some(1),
            })
        }
    }

    fn setup(chain: FakeChain) -> (PresaleService, Arc<FakeChain>, Arc<ToastBoard>) {
        let chain = Arc::new(chain);
        let board = Arc::new(ToastBoard::new());
        let service = PresaleService::new(chain.clone(), board.clone(), test_config());
        (service, chain, board)
    }

    #[tokio::test]
    async fn buy_with_eth_uses_discounted_price_and_padded_limit() {
        let (service, chain, board) = setup(FakeChain::new(Some(wallet())));
        let mut refreshes = service.subscribe();

        let receipt = service.buy_with_eth("0.5").await.unwrap();
        assert!(receipt.is_some());

        let calls = chain.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].0,
            ContractCall::BuyWithEth {
                value: U256::exp10(17) * 5
            }
        );
        assert_eq!(calls[0].1.gas_price, U256::from(85u64));
        assert_eq!(calls[0].1.gas_limit, Some(U256::from(25_200u64)));

        assert!(refreshes.has_changed().unwrap());
        assert_eq!(*refreshes.borrow_and_update(), 1);

        let toasts = board.snapshot();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, ToastLevel::Success);
        assert_eq!(toasts[0].message, "Successfully purchased 0.5 FSX!");
    }

    #[tokio::test]
    async fn no_wallet_sends_nothing() {
        let (service, chain, board) = setup(FakeChain::new(None));

        assert_eq!(service.buy_with_eth("1").await, Ok(None));
        assert_eq!(service.update_base_apy("0").await, Ok(None));
        assert!(chain.calls().is_empty());
        assert!(board.snapshot().is_empty());
        assert_eq!(service.refresh_count(), 0);
    }

    #[tokio::test]
    async fn rejected_signature_returns_none_without_failure_toast() {
        let mut fake = FakeChain::new(Some(wallet()));
        fake.submit_error = Some(ChainError::Rejected);
        let (service, _chain, board) = setup(fake);

        assert_eq!(service.harvest_rewards(U256::from(3u64)).await, Ok(None));

        let toasts = board.snapshot();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, ToastLevel::Rejected);
        assert_eq!(toasts[0].message, "Transaction rejected by user");
        assert_eq!(service.refresh_count(), 0);
    }

    #[tokio::test]
    async fn revert_fails_the_toast() {
        let mut fake = FakeChain::new(Some(wallet()));
        fake.submit_error = Some(ChainError::Reverted("Address is blocked".into()));
        let (service, _chain, board) = setup(fake);

        let err = service.buy_with_eth("1").await.unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::CallException));
        assert_eq!(err.message, "Address is blocked");

        let toasts = board.snapshot();
        assert_eq!(toasts[0].level, ToastLevel::Failed);
        assert_eq!(toasts[0].message, "Transaction failed: Address is blocked");
    }

    #[tokio::test]
    async fn stablecoin_purchase_skips_approval_when_allowance_covers() {
        let mut fake = FakeChain::new(Some(wallet()));
        fake.allowance = U256::from(12_000_000u64);
        let (service, chain, board) = setup(fake);

        service.buy_with_usdt("12").await.unwrap();

        let calls = chain.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].0,
            ContractCall::BuyWithUsdt {
                amount: U256::from(12u64)
            }
        );
        assert_eq!(
            board.snapshot()[0].message,
            "Successfully purchased with 12 USDT!"
        );
    }

    #[tokio::test]
    async fn stablecoin_purchase_approves_base_units_first() {
        let (service, chain, _board) = setup(FakeChain::new(Some(wallet())));

        service.buy_with_usdc("12").await.unwrap();

        let calls = chain.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].0,
            ContractCall::Approve {
                token: addr(USDC),
                spender: addr(PRESALE),
                amount: U256::from(12_000_000u64),
            }
        );
        assert_eq!(calls[0].1.gas_price, U256::from(85u64));
        assert_eq!(calls[0].1.gas_limit, None);
        assert_eq!(
            calls[1].0,
            ContractCall::BuyWithUsdc {
                amount: U256::from(12u64)
            }
        );
    }

    #[tokio::test]
    async fn staking_always_approves() {
        let mut fake = FakeChain::new(Some(wallet()));
        fake.allowance = U256::MAX;
        let (service, chain, board) = setup(fake);

        service.stake_tokens("100", 90).await.unwrap();

        let calls = chain.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0].0, ContractCall::Approve { token, .. } if token == addr(TOKEN)));
        assert_eq!(
            calls[1].0,
            ContractCall::StakeTokens {
                amount: U256::exp10(20),
                lock_period: U256::from(90u64),
            }
        );
        assert_eq!(
            board.snapshot()[0].message,
            "Successfully staked 100 FSX for 90 days!"
        );
    }

    #[tokio::test]
    async fn bad_input_never_reaches_the_chain() {
        let (service, chain, board) = setup(FakeChain::new(Some(wallet())));

        let err = service.update_base_apy("0").await.unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::InvalidArgument));
        assert_eq!(err.message, "APY must be greater than 0");

        assert!(service.set_sale_token("0x1234").await.is_err());
        assert!(service.stake_tokens("10", 45).await.is_err());
        assert!(service.buy_with_usdt("1.5").await.is_err());

        assert!(chain.calls().is_empty());
        let toasts = board.snapshot();
        assert_eq!(toasts.len(), 4);
        assert!(toasts.iter().all(|t| t.level == ToastLevel::Failed));
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot() {
        let (service, _chain, _board) = setup(FakeChain::new(Some(wallet())));
        assert!(service.snapshot().await.is_none());

        let snapshot = service.refresh().await.unwrap();
        assert_eq!(snapshot.balances.token_supply, U256::exp10(27));
        assert_eq!(snapshot.balances.contract_eth_balance, U256::exp10(18));
        assert_eq!(snapshot.balances.user_eth_balance, U256::exp10(17));
        assert_eq!(snapshot.balances.contract_usdc_balance, U256::from(7_000_000u64));
        assert_eq!(snapshot.balances.total_penalty, U256::from(3u64));
        assert_eq!(service.snapshot().await, Some(snapshot));
    }

    #[tokio::test]
    async fn withdraw_is_checked_against_contract_balance() {
        let (service, chain, _board) = setup(FakeChain::new(Some(wallet())));
        service.refresh().await.unwrap();

        // the contract holds 5 USDT
        let err = service.withdraw_tokens(addr(USDT), "6").await.unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::InvalidArgument));

        let receipt = service.withdraw_tokens(addr(USDT), "5").await.unwrap().unwrap();
        assert_eq!(
            chain.calls()[0].0,
            ContractCall::WithdrawTokens {
                token: addr(USDT),
                amount: U256::from(5_000_000u64),
            }
        );

        let withdrawals = service.store().withdrawals();
        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].token, "USDT");
        assert_eq!(withdrawals[0].hash, receipt.transaction_hash);
        std::fs::remove_dir_all(service.store().dir()).ok();
    }

    #[tokio::test]
    async fn transactions_are_mapped_for_display() {
        let mut fake = FakeChain::new(Some(wallet()));
        fake.transactions = vec![
            RawTransaction {
                user: wallet(),
                token_in: addr(USDT),
                token_out: addr(TOKEN),
                amount_in: U256::from(2u64),
                amount_out: U256::exp10(18) * 50,
                timestamp: U256::from(1_700_000_000u64),
                transaction_type: BUY_TRANSACTION.to_string(),
            },
            RawTransaction {
                user: Address::repeat_byte(0x02),
                token_in: Address::zero(),
                token_out: addr(TOKEN),
                amount_in: U256::exp10(18),
                amount_out: U256::exp10(17),
                timestamp: U256::from(1_700_000_100u64),
                transaction_type: REFERRAL_TRANSACTION.to_string(),
            },
        ];
        let (service, _chain, _board) = setup(fake);

        let records = service.user_transactions(wallet()).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].token_in, "USDT");
        assert_eq!(records[0].token_out, "FSX");
        assert_eq!(records[0].amount_in, "2.00");
        assert_eq!(records[0].amount_out, "50.00");
        assert_eq!(records[1].token_in, "ETH");
        assert!(records[1].is_referral());

        let referrals = service.referral_transactions(wallet()).await;
        assert_eq!(referrals.len(), 1);
        assert_eq!(referrals[0].referred_user, Address::repeat_byte(0x02));
        assert_eq!(referrals[0].reward_amount, "0.100000000000000000");

        assert!(service.all_transactions().await.is_empty());
    }

    #[tokio::test]
    async fn only_active_stakes_are_listed() {
        let mut fake = FakeChain::new(Some(wallet()));
        let stake = |id: u64, active: bool| RawStake {
            id: U256::from(id),
            amount: U256::exp10(20),
            start_time: U256::from(1_700_000_000u64),
            lock_period: U256::from(30u64),
            active,
        };
        fake.stakes = vec![stake(1, false), stake(2, true)];
        let (service, _chain, _board) = setup(fake);

        let stakes = service.user_stakes(wallet()).await;
        assert_eq!(stakes.len(), 1);
        assert_eq!(stakes[0].id, U256::from(2u64));
        assert_eq!(stakes[0].lock_period, 30);
        assert_eq!(stakes[0].pending_rewards, "2.000000000000000000");
    }

    #[tokio::test]
    async fn overview_falls_back_when_staking_info_fails() {
        let (service, _chain, _board) = setup(FakeChain::new(Some(wallet())));

        let overview = service.staking_overview().await.unwrap();
        assert_eq!(overview.base_apy, "12");
        assert_eq!(overview.min_stake_amount, "100");
        assert_eq!(overview.active_stakes_count, "1");
        assert_eq!(overview.usdt_token_ratio, "25");

        let balances = service.staking_balances().await.unwrap();
        assert_eq!(balances.usdt_balance, "5.000000");
        assert_eq!(balances.user_staked, "100.000000000000000000");
    }

    #[tokio::test]
    async fn referral_registration_outcomes() {
        let (service, chain, _board) = setup(FakeChain::new(Some(wallet())));

        assert_eq!(
            service.handle_referral_registration(None).await,
            Ok(ReferralOutcome::NoCode)
        );
        assert_eq!(
            service.handle_referral_registration(Some("bob")).await,
            Ok(ReferralOutcome::InvalidCode("bob".into()))
        );
        let own = format!("{:?}", wallet());
        assert_eq!(
            service.handle_referral_registration(Some(&own)).await,
            Ok(ReferralOutcome::SelfReferral)
        );
        assert!(chain.calls().is_empty());

        let other = format!("{:?}", Address::repeat_byte(0x0b));
        let outcome = service
            .handle_referral_registration(Some(&other))
            .await
            .unwrap();
        assert!(matches!(outcome, ReferralOutcome::Registered(_)));
        assert_eq!(
            chain.calls()[0].0,
            ContractCall::RegisterReferrer {
                referrer: Address::repeat_byte(0x0b)
            }
        );
    }

    #[tokio::test]
    async fn existing_referrer_is_kept() {
        let mut fake = FakeChain::new(Some(wallet()));
        fake.referrer = Address::repeat_byte(0x0c);
        let (service, chain, _board) = setup(fake);

        let other = format!("{:?}", Address::repeat_byte(0x0b));
        assert_eq!(
            service.handle_referral_registration(Some(&other)).await,
            Ok(ReferralOutcome::AlreadyReferred(Address::repeat_byte(0x0c)))
        );
        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn ownership_and_link() {
        let (service, _chain, _board) = setup(FakeChain::new(Some(wallet())));
        assert!(service.is_owner().await);
        assert!(service
            .referral_link(wallet())
            .starts_with("https://presale.example?ref=0x"));

        let (reader, _chain, _board) = setup(FakeChain::new(None));
        assert!(!reader.is_owner().await);
    }

    #[tokio::test]
    async fn stake_below_contract_minimum_is_refused() {
        let mut fake = FakeChain::new(Some(wallet()));
        fake.staking = Some(RawStakingInfo {
            base_apy_rate: U256::from(12u64),
            min_staking_amount: U256::exp10(20),
            ..RawStakingInfo::default()
        });
        let (service, chain, board) = setup(fake);

        let err = service.stake_tokens("0.001", 30).await.unwrap_err();
        assert_eq!(err.code, Some(ErrorCode::InvalidArgument));
        assert_eq!(err.message, "Minimum stake amount is 100.00 FSX");
        assert!(chain.calls().is_empty());
        assert_eq!(board.snapshot()[0].level, ToastLevel::Failed);

        assert!(service.stake_tokens("150", 30).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn stake_above_wallet_balance_is_refused() {
        let mut fake = FakeChain::new(Some(wallet()));
        fake.wallet_tokens = U256::exp10(20) * 2;
        let (service, chain, _board) = setup(fake);
        service.refresh().await.unwrap();

        let err = service.stake_tokens("250", 90).await.unwrap_err();
        assert_eq!(err.message, "Insufficient FSX balance");
        assert!(chain.calls().is_empty());

        assert!(service.stake_tokens("200", 90).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn approvals_follow_the_addresses_the_contract_reports() {
        let moved_usdt = Address::repeat_byte(0x77);
        let moved_token = Address::repeat_byte(0x66);
        let mut fake = FakeChain::new(Some(wallet()));
        fake.usdt_token = moved_usdt;
        fake.sale_token = moved_token;
        let (service, chain, _board) = setup(fake);
        service.refresh().await.unwrap();

        service.buy_with_usdt("12").await.unwrap();
        service.stake_tokens("100", 30).await.unwrap();

        let calls = chain.calls();
        assert_eq!(
            calls[0].0,
            ContractCall::Approve {
                token: moved_usdt,
                spender: addr(PRESALE),
                amount: U256::from(12_000_000u64),
            }
        );
        assert!(matches!(calls[2].0, ContractCall::Approve { token, .. } if token == moved_token));

        let snapshot = service.snapshot().await.unwrap();
        assert_eq!(snapshot.balances.user_token_balance, U256::exp10(21));
    }

    #[tokio::test]
    async fn stablecoin_swap_is_recorded_with_its_hash() {
        let (service, chain, board) = setup(FakeChain::new(Some(wallet())));
        service.refresh().await.unwrap();

        let receipt = service.buy_usdc("0.01").await.unwrap().unwrap();
        assert_eq!(
            chain.calls()[0].0,
            ContractCall::BuyUsdc {
                value: U256::exp10(16)
            }
        );
        assert_eq!(
            board.snapshot()[0].message,
            "Successfully purchased with 0.01 USDC!"
        );

        let purchases = service.store().stablecoin_purchases();
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].stablecoin, "USDC");
        assert_eq!(purchases[0].eth_amount, "0.01");
        // 0.01 ETH at 0.0005 ETH per coin
        assert_eq!(purchases[0].stablecoin_amount, "20.00");
        assert_eq!(purchases[0].hash, receipt.transaction_hash);
        std::fs::remove_dir_all(service.store().dir()).ok();
    }

    #[tokio::test]
    async fn declined_swap_is_not_recorded() {
        let mut fake = FakeChain::new(Some(wallet()));
        fake.submit_error = Some(ChainError::Rejected);
        let (service, _chain, _board) = setup(fake);

        assert_eq!(service.buy_usdt("0.01").await, Ok(None));
        assert!(service.store().stablecoin_purchases().is_empty());
    }

    #[tokio::test]
    async fn admin_updates_send_parsed_calls() {
        let (service, chain, board) = setup(FakeChain::new(Some(wallet())));
        let new_coin = format!("{:?}", Address::repeat_byte(0x44));
        let blocked = format!(" {:?} ", Address::repeat_byte(0x55));

        service.update_token_price("0.0002").await.unwrap();
        service.update_usdt(&new_coin, "30").await.unwrap();
        service.update_usdc(&new_coin, "40").await.unwrap();
        service.set_block_status(&blocked, true).await.unwrap();
        service.update_min_stake_amount("250").await.unwrap();

        let calls: Vec<ContractCall> = chain.calls().into_iter().map(|(call, _)| call).collect();
        assert_eq!(
            calls,
            vec![
                ContractCall::UpdateTokenPrice {
                    price: U256::exp10(14) * 2
                },
                ContractCall::UpdateUsdt {
                    token: Address::repeat_byte(0x44),
                    ratio: U256::from(30u64),
                },
                ContractCall::UpdateUsdc {
                    token: Address::repeat_byte(0x44),
                    ratio: U256::from(40u64),
                },
                ContractCall::SetBlockStatus {
                    user: Address::repeat_byte(0x55),
                    blocked: true,
                },
                ContractCall::UpdateMinStakeAmount {
                    amount: U256::exp10(18) * 250
                },
            ]
        );

        let messages: Vec<String> = board.snapshot().into_iter().map(|t| t.message).collect();
        assert_eq!(messages[0], "Successfully State updated");
        assert_eq!(messages[3], "Successfully State updated");
        assert_eq!(
            messages[4],
            "Successfully updated minimum stake amount to 250 tokens!"
        );
        assert_eq!(service.refresh_count(), 5);

        assert!(service.update_usdt(&new_coin, "0").await.is_err());
        assert_eq!(chain.calls().len(), 5);
    }

    #[tokio::test]
    async fn early_unstake_reports_the_penalty() {
        let (service, chain, board) = setup(FakeChain::new(Some(wallet())));

        service.unstake_early(U256::from(4u64)).await.unwrap();

        assert_eq!(
            chain.calls()[0].0,
            ContractCall::UnstakeEarly {
                stake_id: U256::from(4u64)
            }
        );
        assert_eq!(
            board.snapshot()[0].message,
            "Successfully unstaked tokens with 5% penalty!"
        );
    }

    /// Keeps every message a toast has shown, in order.
    #[derive(Default)]
    struct RecordingNotifier {
        board: ToastBoard,
        messages: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn start(&self, message: &str) -> ToastId {
            self.messages.lock().unwrap().push(message.to_string());
            self.board.start(message)
        }

        fn set(&self, id: ToastId, level: ToastLevel, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
            self.board.set(id, level, message);
        }
    }

    #[tokio::test]
    async fn purchase_toasts_open_with_the_payment_currency() {
        let notifier = Arc::new(RecordingNotifier::default());
        let chain = Arc::new(FakeChain::new(Some(wallet())));
        let service = PresaleService::new(chain, notifier.clone(), test_config());

        service.buy_usdt("0.01").await.unwrap();
        service.buy_with_usdc("3").await.unwrap();

        let messages = notifier.messages.lock().unwrap().clone();
        assert_eq!(
            messages,
            vec![
                "Initializing buy With USDT transaction...",
                "Successfully purchased with 0.01 USDT!",
                "Initializing buy With USDC transaction...",
                "USDC spending approved!",
                "Successfully purchased with 3 USDC!",
            ]
        );
        std::fs::remove_dir_all(service.config().storage_dir()).ok();
    }
}
