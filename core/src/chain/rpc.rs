use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{transaction::eip2718::TypedTransaction, Address, U256},
};
use tracing::{debug, info};

use super::{ChainError, ContractCall, PresaleChain, SignRequest, SignaturePrompt};
use crate::abi::{Erc20, TokenIco};
use crate::config::Config;
use crate::gas::GasSettings;
use crate::models::{
    ContractBalances, ContractInfo, RawReferralInfo, RawStake, RawStakeDetails, RawStakingInfo,
    RawTransaction, RawUserStakingInfo, TxReceiptSummary,
};

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Presale contract access over JSON-RPC. Reads go through the plain
/// provider so they work without a wallet; writes need the signer.
pub struct EthersChain {
    provider: Arc<Provider<Http>>,
    signer: Option<Arc<SignerClient>>,
    contract_address: Address,
    prompt: Arc<dyn SignaturePrompt>,
}

impl EthersChain {
    /// Read-only access to the contract at `contract_address`.
    pub fn new_with_endpoint(
        endpoint: &str,
        contract_address: Address,
        prompt: Arc<dyn SignaturePrompt>,
    ) -> Result<Self> {
        let provider = Provider::<Http>::try_from(endpoint)
            .with_context(|| format!("invalid RPC url {endpoint}"))?;
        Ok(Self {
            provider: Arc::new(provider),
            signer: None,
            contract_address,
            prompt,
        })
    }

    /// Connects to the configured node, attaching a signer when the config
    /// carries a private key.
    pub async fn connect(config: &Config, prompt: Arc<dyn SignaturePrompt>) -> Result<Self> {
        let mut chain = Self::new_with_endpoint(&config.rpc_url, config.contract_address, prompt)?;

        if let Some(key) = config.private_key.as_deref() {
            let chain_id = match config.chain_id {
                Some(id) => id,
                None => chain
                    .provider
                    .get_chainid()
                    .await
                    .map_err(|e| anyhow!("Failed to fetch chain id from {}: {}", config.rpc_url, e))?
                    .as_u64(),
            };
            let wallet = key
                .trim()
                .parse::<LocalWallet>()
                .map_err(|e| anyhow!("Invalid private key: {}", e))?
                .with_chain_id(chain_id);
            info!(address = ?wallet.address(), chain_id, "wallet connected");
            let provider = chain.provider.as_ref().clone();
            chain.signer = Some(Arc::new(SignerMiddleware::new(provider, wallet)));
        } else {
            info!("no private key configured, running read-only");
        }

        Ok(chain)
    }

    fn reader(&self) -> TokenIco<Provider<Http>> {
        TokenIco::new(self.contract_address, self.provider.clone())
    }

    fn erc20(&self, token: Address) -> Erc20<Provider<Http>> {
        Erc20::new(token, self.provider.clone())
    }

    fn signer(&self) -> Result<&Arc<SignerClient>, ChainError> {
        self.signer.as_ref().ok_or(ChainError::NoSigner)
    }

    fn build_tx(&self, signer: &Arc<SignerClient>, call: &ContractCall) -> TypedTransaction {
        let ico = TokenIco::new(self.contract_address, signer.clone());
        let mut tx = match call.clone() {
            ContractCall::BuyWithEth { value } => ico.buy_with_eth().value(value).legacy().tx,
            ContractCall::BuyWithUsdt { amount } => ico.buy_with_usdt(amount).legacy().tx,
            ContractCall::BuyWithUsdc { amount } => ico.buy_with_usdc(amount).legacy().tx,
            ContractCall::BuyUsdt { value } => ico.buy_usdt().value(value).legacy().tx,
            ContractCall::BuyUsdc { value } => ico.buy_usdc().value(value).legacy().tx,
            ContractCall::UpdateStablecoinPrice { price } => {
                ico.update_stablecoin_price(price).legacy().tx
            }
            ContractCall::UpdateTokenPrice { price } => ico.update_token_price(price).legacy().tx,
            ContractCall::UpdateUsdt { token, ratio } => ico.update_usdt(token, ratio).legacy().tx,
            ContractCall::UpdateUsdc { token, ratio } => ico.update_usdc(token, ratio).legacy().tx,
            ContractCall::SetSaleToken { token } => ico.set_sale_token(token).legacy().tx,
            ContractCall::SetBlockStatus { user, blocked } => {
                ico.set_block_status(user, blocked).legacy().tx
            }
            ContractCall::WithdrawTokens { token, amount } => {
                ico.withdraw_tokens(token, amount).legacy().tx
            }
            ContractCall::StakeTokens {
                amount,
                lock_period,
            } => ico.stake_tokens(amount, lock_period).legacy().tx,
            ContractCall::HarvestRewards { stake_id } => ico.harvest_rewards(stake_id).legacy().tx,
            ContractCall::UnstakeTokens { stake_id } => ico.unstake_tokens(stake_id).legacy().tx,
            ContractCall::UnstakeEarly { stake_id } => ico.unstake_early(stake_id).legacy().tx,
            ContractCall::UpdateBaseApy { apy } => ico.update_base_apy(apy).legacy().tx,
            ContractCall::UpdateMinStakeAmount { amount } => {
                ico.update_min_stake_amount(amount).legacy().tx
            }
            ContractCall::RegisterReferrer { referrer } => {
                ico.register_referrer(referrer).legacy().tx
            }
            ContractCall::Approve {
                token,
                spender,
                amount,
            } => Erc20::new(token, signer.clone())
                .approve(spender, amount)
                .legacy()
                .tx,
        };
        tx.set_from(signer.address());
        tx
    }
}

#[async_trait]
impl PresaleChain for EthersChain {
    fn contract_address(&self) -> Address {
        self.contract_address
    }

    fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    async fn contract_deployed(&self) -> Result<bool, ChainError> {
        let code = self
            .provider
            .get_code(self.contract_address, None)
            .await
            .map_err(ChainError::classify)?;
        debug!(
            "Fetched {} bytes of contract code for {:?}",
            code.len(),
            self.contract_address
        );
        Ok(!code.is_empty())
    }

    async fn owner(&self) -> Result<Address, ChainError> {
        self.reader().owner().call().await.map_err(ChainError::classify)
    }

    async fn contract_info(&self) -> Result<ContractInfo, ChainError> {
        let (
            token_address,
            token_balance,
            eth_price,
            stablecoin_price,
            total_sold,
            usdt_address,
            usdc_address,
            usdt_token_ratio,
            usdc_token_ratio,
        ) = self
            .reader()
            .get_contract_info()
            .call()
            .await
            .map_err(ChainError::classify)?;
        Ok(ContractInfo {
            token_address,
            token_balance,
            eth_price,
            stablecoin_price,
            total_sold,
            usdt_address,
            usdc_address,
            usdt_token_ratio,
            usdc_token_ratio,
        })
    }

    async fn contract_balances(&self) -> Result<ContractBalances, ChainError> {
        let (token_balance, usdt_balance, usdc_balance) = self
            .reader()
            .get_token_balances()
            .call()
            .await
            .map_err(ChainError::classify)?;
        Ok(ContractBalances {
            token_balance,
            usdt_balance,
            usdc_balance,
        })
    }

    async fn total_penalty_collected(&self) -> Result<U256, ChainError> {
        self.reader()
            .get_total_penalty_collected()
            .call()
            .await
            .map_err(ChainError::classify)
    }

    async fn user_transactions(&self, user: Address) -> Result<Vec<RawTransaction>, ChainError> {
        let txs = self
            .reader()
            .get_user_transactions(user)
            .call()
            .await
            .map_err(ChainError::classify)?;
        Ok(txs.into_iter().map(raw_transaction).collect())
    }

    async fn all_transactions(&self) -> Result<Vec<RawTransaction>, ChainError> {
        let txs = self
            .reader()
            .get_all_transactions()
            .call()
            .await
            .map_err(ChainError::classify)?;
        Ok(txs.into_iter().map(raw_transaction).collect())
    }

    async fn user_stakes(&self, user: Address) -> Result<Vec<RawStake>, ChainError> {
        let stakes = self
            .reader()
            .get_user_stakes(user)
            .call()
            .await
            .map_err(ChainError::classify)?;
        Ok(stakes
            .into_iter()
            .map(raw_stake)
            .collect())
    }

    async fn stake_details(&self, stake_id: U256) -> Result<RawStakeDetails, ChainError> {
        let (amount, start_time, lock_period, pending_rewards, time_remaining, active) = self
            .reader()
            .get_stake_details(stake_id)
            .call()
            .await
            .map_err(ChainError::classify)?;
        Ok(RawStakeDetails {
            amount,
            start_time,
            lock_period,
            pending_rewards,
            time_remaining,
            active,
        })
    }

    async fn staking_info(&self) -> Result<RawStakingInfo, ChainError> {
        let (
            base_apy_rate,
            min_staking_amount,
            total_tokens_staked,
            total_rewards_paid,
            number_of_stakers,
        ) = self
            .reader()
            .get_staking_info()
            .call()
            .await
            .map_err(ChainError::classify)?;
        Ok(RawStakingInfo {
            base_apy_rate,
            min_staking_amount,
            total_tokens_staked,
            total_rewards_paid,
            number_of_stakers,
        })
    }

    async fn user_staking_info(&self, user: Address) -> Result<RawUserStakingInfo, ChainError> {
        let (total_user_staked, total_pending_rewards, active_stakes_count) = self
            .reader()
            .get_user_staking_info(user)
            .call()
            .await
            .map_err(ChainError::classify)?;
        Ok(RawUserStakingInfo {
            total_user_staked,
            total_pending_rewards,
            active_stakes_count,
        })
    }

    async fn referral_info(&self, user: Address) -> Result<RawReferralInfo, ChainError> {
        let (referrer, total_referrals, total_rewards_earned, reward_percentage) = self
            .reader()
            .get_referral_info(user)
            .call()
            .await
            .map_err(ChainError::classify)?;
        Ok(RawReferralInfo {
            referrer,
            total_referrals,
            total_rewards_earned,
            reward_percentage,
        })
    }

    async fn user_referrals(&self, user: Address) -> Result<Vec<Address>, ChainError> {
        self.reader()
            .get_user_referrals(user)
            .call()
            .await
            .map_err(ChainError::classify)
    }

    async fn eth_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(owner, None)
            .await
            .map_err(ChainError::classify)
    }

    async fn token_total_supply(&self, token: Address) -> Result<U256, ChainError> {
        self.erc20(token)
            .total_supply()
            .call()
            .await
            .map_err(ChainError::classify)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        self.erc20(token)
            .balance_of(owner)
            .call()
            .await
            .map_err(ChainError::classify)
    }

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        self.erc20(token)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(ChainError::classify)
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(ChainError::classify)
    }

    async fn estimate_gas(&self, call: &ContractCall) -> Result<U256, ChainError> {
        let signer = self.signer()?;
        let tx = self.build_tx(signer, call);
        signer
            .estimate_gas(&tx, None)
            .await
            .map_err(|e| match ChainError::classify(e) {
                ChainError::Other(message) => ChainError::GasEstimation(message),
                other => other,
            })
    }

    async fn submit(
        &self,
        call: &ContractCall,
        gas: GasSettings,
    ) -> Result<TxReceiptSummary, ChainError> {
        let signer = self.signer()?;
        let mut tx = self.build_tx(signer, call);
        tx.set_gas_price(gas.gas_price);
        if let Some(limit) = gas.gas_limit {
            tx.set_gas(limit);
        }

        let request = SignRequest {
            call: call.clone(),
            from: signer.address(),
            to: call.target(self.contract_address),
            gas,
        };
        if !self.prompt.confirm(&request).await {
            return Err(ChainError::Rejected);
        }

        debug!(%call, gas_price = %gas.gas_price, "sending transaction");
        let pending = signer
            .send_transaction(tx, None)
            .await
            .map_err(ChainError::classify)?;
        let receipt = pending
            .confirmations(1)
            .await
            .map_err(ChainError::classify)?
            .ok_or(ChainError::Dropped)?;

        let summary = TxReceiptSummary {
            transaction_hash: receipt.transaction_hash,
            to: receipt.to,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            gas_used: receipt.gas_used,
            status: receipt.status.map(|s| s.as_u64()),
        };
        if !summary.succeeded() {
            return Err(ChainError::Reverted(format!(
                "{} reverted in {:?}",
                call.method(),
                summary.transaction_hash
            )));
        }
        info!(tx = ?summary.transaction_hash, block = ?summary.block_number, "{} confirmed", call.method());
        Ok(summary)
    }
}

type StakeEntryTuple = (U256, U256, U256, U256, U256, U256, bool);

fn raw_stake((id, amount, start_time, lock_period, _, _, active): StakeEntryTuple) -> RawStake {
    RawStake {
        id,
        amount,
        start_time,
        lock_period,
        active,
    }
}

/// `SaleTransaction` as abigen decodes it from the human-readable ABI.
type SaleTransactionTuple = (Address, Address, Address, U256, U256, U256, String);

fn raw_transaction(
    (user, token_in, token_out, amount_in, amount_out, timestamp, transaction_type): SaleTransactionTuple,
) -> RawTransaction {
    RawTransaction {
        user,
        token_in,
        token_out,
        amount_in,
        amount_out,
        timestamp,
        transaction_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{GetAllTransactionsReturn, GetUserStakesReturn};

    #[test]
    fn decoded_stakes_map_by_position() {
        let decoded = GetUserStakesReturn(vec![
            (
                U256::from(1),
                U256::from(500),
                U256::from(1_700_000_000u64),
                U256::from(90),
                U256::from(1_700_000_500u64),
                U256::from(7),
                true,
            ),
            (
                U256::from(2),
                U256::from(10),
                U256::zero(),
                U256::from(30),
                U256::zero(),
                U256::zero(),
                false,
            ),
        ]);
        let stakes: Vec<RawStake> = decoded.0.into_iter().map(raw_stake).collect();

        assert_eq!(stakes[0].id, U256::from(1));
        assert_eq!(stakes[0].amount, U256::from(500));
        assert_eq!(stakes[0].start_time, U256::from(1_700_000_000u64));
        assert_eq!(stakes[0].lock_period, U256::from(90));
        assert!(stakes[0].active);
        assert!(!stakes[1].active);
    }

    #[test]
    fn decoded_transactions_map_by_position() {
        let user = Address::repeat_byte(0x11);
        let usdt = Address::repeat_byte(0x22);
        let token = Address::repeat_byte(0x33);
        let decoded = GetAllTransactionsReturn(vec![(
            user,
            usdt,
            token,
            U256::from(12_000_000u64),
            U256::from(240u64),
            U256::from(1_700_000_000u64),
            "BUY".to_string(),
        )]);
        let txs: Vec<RawTransaction> = decoded.0.into_iter().map(raw_transaction).collect();

        assert_eq!(
            txs,
            vec![RawTransaction {
                user,
                token_in: usdt,
                token_out: token,
                amount_in: U256::from(12_000_000u64),
                amount_out: U256::from(240u64),
                timestamp: U256::from(1_700_000_000u64),
                transaction_type: "BUY".into(),
            }]
        );
    }
}
