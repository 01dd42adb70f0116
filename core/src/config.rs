use std::{fs::OpenOptions, io::Read, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context, Result};
use ethers::types::Address;
use serde::Deserialize;

pub const DEFAULT_LOCK_PERIODS: [u64; 4] = [30, 90, 180, 365];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// The presale contract.
    pub contract_address: Address,
    /// The sale token.
    pub token_address: Address,
    pub usdt_address: Address,
    pub usdc_address: Address,
    /// Placeholder address the contract uses for native ETH.
    #[serde(default)]
    pub eth_address: Address,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub token: TokenMetadata,
    #[serde(default)]
    pub domain_url: String,
    #[serde(default = "default_lock_periods")]
    pub lock_periods: Vec<u64>,
    #[serde(default)]
    pub min_stake_amount: Option<String>,
    #[serde(default)]
    pub explorer_url: Option<String>,
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub supply: String,
    pub currency: String,
    pub blockchain: String,
    pub per_token_usd_price: String,
    pub next_per_token_usd_price: String,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        TokenMetadata {
            name: "Token".to_string(),
            symbol: "TOKEN".to_string(),
            decimals: 18,
            supply: String::new(),
            currency: "ETH".to_string(),
            blockchain: String::new(),
            per_token_usd_price: String::new(),
            next_per_token_usd_price: String::new(),
        }
    }
}

fn default_lock_periods() -> Vec<u64> {
    DEFAULT_LOCK_PERIODS.to_vec()
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .open(config_path)
            .with_context(|| format!("Error opening config file {config_path}"))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config = serde_json::from_str::<Config>(&contents)
            .with_context(|| format!("Error parsing config file {config_path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| var(key).ok_or_else(|| anyhow!("{key} must be set"));
        let address = |key: &str| -> Result<Address> {
            let raw = required(key)?;
            parse_address(&raw).with_context(|| format!("{key} is not an address"))
        };

        let defaults = TokenMetadata::default();
        let token = TokenMetadata {
            name: var("TOKEN_NAME").unwrap_or(defaults.name),
            symbol: var("TOKEN_SYMBOL").unwrap_or(defaults.symbol),
            decimals: match var("TOKEN_DECIMAL") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("TOKEN_DECIMAL {raw:?} is not a number"))?,
                None => defaults.decimals,
            },
            supply: var("TOKEN_SUPPLY").unwrap_or(defaults.supply),
            currency: var("CURRENCY").unwrap_or(defaults.currency),
            blockchain: var("BLOCKCHAIN").unwrap_or(defaults.blockchain),
            per_token_usd_price: var("PER_TOKEN_USD_PRICE").unwrap_or(defaults.per_token_usd_price),
            next_per_token_usd_price: var("NEXT_PER_TOKEN_USD_PRICE")
                .unwrap_or(defaults.next_per_token_usd_price),
        };

        let config = Config {
            rpc_url: required("RPC_URL")?,
            chain_id: match var("CHAIN_ID") {
                Some(raw) => Some(
                    raw.trim()
                        .parse()
                        .with_context(|| format!("CHAIN_ID {raw:?} is not a number"))?,
                ),
                None => None,
            },
            contract_address: address("TOKEN_ICO_ADDRESS")?,
            token_address: address("TOKEN_ADDRESS")?,
            usdt_address: address("USDT_ADDRESS")?,
            usdc_address: address("USDC_ADDRESS")?,
            eth_address: match var("ETH_ADDRESS") {
                Some(raw) => parse_address(&raw).context("ETH_ADDRESS is not an address")?,
                None => Address::zero(),
            },
            private_key: var("PRIVATE_KEY").filter(|k| !k.trim().is_empty()),
            token,
            domain_url: var("DOMAIN_URL").unwrap_or_default(),
            lock_periods: match var("LOCK_PERIODS") {
                Some(raw) => parse_lock_periods(&raw)?,
                None => default_lock_periods(),
            },
            min_stake_amount: var("MIN_STAKE_AMOUNT"),
            explorer_url: var("EXPLORER_ADDRESS_URL"),
            storage_dir: var("STORAGE_DIR").map(PathBuf::from),
            log_file: var("LOG_FILE").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(anyhow!("rpc_url must not be empty"));
        }
        if self.lock_periods.is_empty() {
            return Err(anyhow!("at least one lock period is required"));
        }
        Ok(())
    }

    /// Where the display cache lives.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".presale-dashboard"))
    }

    pub fn is_stablecoin(&self, token: Address) -> bool {
        token == self.usdt_address || token == self.usdc_address
    }
}

pub fn parse_address(raw: &str) -> Result<Address> {
    Address::from_str(raw.trim()).map_err(|e| anyhow!("{raw:?}: {e}"))
}

fn parse_lock_periods(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u64>()
                .with_context(|| format!("lock period {p:?} is not a number of days"))
        })
        .collect()
}
