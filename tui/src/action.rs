use presale_core::binding::TxResult;
use presale_core::models::PaymentToken;
use presale_core::{Address, PresaleService, U256};

/// A write a page asks for. Runs on the tokio runtime; the result goes back
/// to the page that asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    BuyWithEth(String),
    BuyWithStablecoin(PaymentToken, String),
    BuyStablecoin(PaymentToken, String),
    UpdateTokenPrice(String),
    UpdateStablecoinPrice(String),
    UpdateStablecoin {
        coin: PaymentToken,
        token: String,
        ratio: String,
    },
    SetSaleToken(String),
    SetBlockStatus(String, bool),
    Withdraw(Address, String),
    Stake(String, u64),
    Harvest(U256),
    Unstake(U256),
    UnstakeEarly(U256),
    UpdateBaseApy(String),
    UpdateMinStake(String),
    RegisterReferrer(String),
}

impl Action {
    pub fn describe(&self) -> String {
        match self {
            Action::BuyWithEth(amount) => format!("Buying with {amount} ETH"),
            Action::BuyWithStablecoin(coin, amount) => {
                format!("Buying with {amount} {}", coin.symbol())
            }
            Action::BuyStablecoin(coin, eth) => format!("Buying {} with {eth} ETH", coin.symbol()),
            Action::UpdateTokenPrice(_) => "Updating token price".to_string(),
            Action::UpdateStablecoinPrice(_) => "Updating stablecoin price".to_string(),
            Action::UpdateStablecoin { coin, .. } => format!("Updating {}", coin.symbol()),
            Action::SetSaleToken(_) => "Setting sale token".to_string(),
            Action::SetBlockStatus(_, true) => "Blocking address".to_string(),
            Action::SetBlockStatus(_, false) => "Unblocking address".to_string(),
            Action::Withdraw(_, amount) => format!("Withdrawing {amount}"),
            Action::Stake(amount, days) => format!("Staking {amount} for {days} days"),
            Action::Harvest(id) => format!("Harvesting stake #{id}"),
            Action::Unstake(id) => format!("Unstaking #{id}"),
            Action::UnstakeEarly(id) => format!("Unstaking #{id} early"),
            Action::UpdateBaseApy(_) => "Updating base APY".to_string(),
            Action::UpdateMinStake(_) => "Updating minimum stake".to_string(),
            Action::RegisterReferrer(_) => "Registering referrer".to_string(),
        }
    }

    pub async fn run(self, service: &PresaleService) -> TxResult {
        match self {
            Action::BuyWithEth(amount) => service.buy_with_eth(&amount).await,
            Action::BuyWithStablecoin(PaymentToken::Usdc, amount) => {
                service.buy_with_usdc(&amount).await
            }
            Action::BuyWithStablecoin(_, amount) => service.buy_with_usdt(&amount).await,
            Action::BuyStablecoin(PaymentToken::Usdc, eth) => service.buy_usdc(&eth).await,
            Action::BuyStablecoin(_, eth) => service.buy_usdt(&eth).await,
            Action::UpdateTokenPrice(price) => service.update_token_price(&price).await,
            Action::UpdateStablecoinPrice(price) => service.update_stablecoin_price(&price).await,
            Action::UpdateStablecoin {
                coin: PaymentToken::Usdc,
                token,
                ratio,
            } => service.update_usdc(&token, &ratio).await,
            Action::UpdateStablecoin { token, ratio, .. } => {
                service.update_usdt(&token, &ratio).await
            }
            Action::SetSaleToken(token) => service.set_sale_token(&token).await,
            Action::SetBlockStatus(user, blocked) => service.set_block_status(&user, blocked).await,
            Action::Withdraw(token, amount) => service.withdraw_tokens(token, &amount).await,
            Action::Stake(amount, days) => service.stake_tokens(&amount, days).await,
            Action::Harvest(id) => service.harvest_rewards(id).await,
            Action::Unstake(id) => service.unstake_tokens(id).await,
            Action::UnstakeEarly(id) => service.unstake_early(id).await,
            Action::UpdateBaseApy(apy) => service.update_base_apy(&apy).await,
            Action::UpdateMinStake(amount) => service.update_min_stake_amount(&amount).await,
            Action::RegisterReferrer(referrer) => service.register_referrer(&referrer).await,
        }
    }
}
