use presale_core::config::Config;
use presale_core::models::{
    ReferralRecord, ReferralTransaction, SaleSnapshot, StakeRecord, StakingBalances,
    StakingOverview, TransactionRecord,
};
use presale_core::storage::{StablecoinPurchaseRecord, WithdrawalRecord};
use presale_core::{Address, PresaleService};
use tracing::{debug, warn};

/// Everything the pages display, fetched in one pass.
#[derive(Debug, Clone, Default)]
pub struct PageData {
    pub account: Option<Address>,
    pub is_owner: bool,
    pub deployed: bool,
    pub snapshot: Option<SaleSnapshot>,
    pub overview: Option<StakingOverview>,
    pub staking: Option<StakingBalances>,
    pub stakes: Vec<StakeRecord>,
    pub transactions: Vec<TransactionRecord>,
    pub all_transactions: Vec<TransactionRecord>,
    pub referral: Option<ReferralRecord>,
    pub referrals: Vec<Address>,
    pub referral_transactions: Vec<ReferralTransaction>,
    pub referral_link: Option<String>,
    pub purchases: Vec<StablecoinPurchaseRecord>,
    pub withdrawals: Vec<WithdrawalRecord>,
    pub error: Option<String>,
}

pub async fn load(service: &PresaleService) -> PageData {
    let account = service.account();
    let mut data = PageData {
        account,
        deployed: service.contract_deployed().await,
        ..PageData::default()
    };
    if !data.deployed {
        data.error = Some(format!(
            "No contract code at {:?}",
            service.config().contract_address
        ));
        return data;
    }

    match service.refresh().await {
        Ok(snapshot) => data.snapshot = Some(snapshot),
        Err(e) => {
            warn!("Error refreshing sale data: {e}");
            data.error = Some(e.to_string());
        }
    }

    let (is_owner, overview, staking, all_transactions) = tokio::join!(
        service.is_owner(),
        service.staking_overview(),
        service.staking_balances(),
        service.all_transactions(),
    );
    data.is_owner = is_owner;
    data.overview = overview;
    data.staking = staking;
    data.all_transactions = all_transactions;

    if let Some(account) = account {
        let (stakes, transactions, referral, referrals, referral_transactions) = tokio::join!(
            service.user_stakes(account),
            service.user_transactions(account),
            service.referral_info(account),
            service.user_referrals(account),
            service.referral_transactions(account),
        );
        data.stakes = stakes;
        data.transactions = transactions;
        data.referral = referral;
        data.referrals = referrals;
        data.referral_transactions = referral_transactions;
        data.referral_link = Some(service.referral_link(account));
    }

    data.purchases = service.store().stablecoin_purchases();
    data.withdrawals = service.store().withdrawals();
    debug!(
        transactions = data.transactions.len(),
        stakes = data.stakes.len(),
        "page data loaded"
    );
    data
}

/// The read context every page renders from.
pub struct View<'a> {
    pub config: &'a Config,
    pub data: &'a PageData,
}
