//! Display cache: string-keyed JSON lists in a directory, one file per key.

use std::{
    fs::{self, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ethers::types::{Address, H256};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

pub const RECENT_TRANSACTIONS_KEY: &str = "recentTransactions";
pub const WITHDRAWALS_KEY: &str = "withdrawals";

/// A stablecoin bought with ETH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StablecoinPurchaseRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub stablecoin: String,
    pub eth_amount: String,
    pub stablecoin_amount: String,
    pub timestamp: DateTime<Utc>,
    pub hash: H256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRecord {
    pub id: u64,
    pub token: String,
    pub amount: String,
    pub timestamp: DateTime<Utc>,
    pub address: Address,
    pub status: String,
    pub hash: H256,
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// The list stored under `key`. Missing or unreadable blobs read as empty.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.try_load(key) {
            Ok(items) => items,
            Err(e) => {
                warn!("Error reading {key} from local storage: {e:#}");
                Vec::new()
            }
        }
    }

    fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut file = OpenOptions::new()
            .read(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let items = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(items)
    }

    /// Replaces the list under `key`. Returns whether the write succeeded.
    pub fn save<T: Serialize>(&self, key: &str, items: &[T]) -> bool {
        match self.try_save(key, items) {
            Ok(()) => true,
            Err(e) => {
                warn!("Error saving {key} to local storage: {e:#}");
                false
            }
        }
    }

    fn try_save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path(key);
        let json = serde_json::to_string_pretty(items)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        file.write_all(json.as_bytes())?;
        debug!("Wrote {} entries to {}", items.len(), path.display());
        Ok(())
    }

    /// Puts `item` at the front of the list under `key`.
    pub fn record<T>(&self, key: &str, item: T) -> bool
    where
        T: Serialize + DeserializeOwned,
    {
        let mut items: Vec<T> = self.load(key);
        items.insert(0, item);
        self.save(key, &items)
    }

    pub fn stablecoin_purchases(&self) -> Vec<StablecoinPurchaseRecord> {
        self.load(RECENT_TRANSACTIONS_KEY)
    }

    pub fn withdrawals(&self) -> Vec<WithdrawalRecord> {
        self.load(WITHDRAWALS_KEY)
    }
}
