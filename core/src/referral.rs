use ethers::types::Address;

use crate::models::TxReceiptSummary;

/// The `ref` query parameter of a launch URL, or the input itself when it
/// is already a bare code.
pub fn referral_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let Some((_, query)) = input.split_once('?') else {
        return Some(input.to_string());
    };
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "ref")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `{domain}?ref={account}`, checksummed.
pub fn referral_link(domain_url: &str, account: Address) -> String {
    format!(
        "{}?ref={}",
        domain_url,
        ethers::utils::to_checksum(&account, None)
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferralOutcome {
    /// No wallet connected.
    NotConnected,
    AlreadyReferred(Address),
    NoCode,
    InvalidCode(String),
    SelfReferral,
    Registered(TxReceiptSummary),
    /// Declined at the signing prompt.
    NotRegistered,
}
