//! Display helpers shared by the pages: addresses, hashes, large numbers,
//! token unit conversion, and the purchase / staking previews.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use ethers::{
    types::{Address, H256, U256},
    utils::{format_units, parse_units, to_checksum},
};

use crate::models::PaymentToken;

pub const TOKEN_DECIMALS: u32 = 18;
pub const STABLE_DECIMALS: u32 = 6;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// `0x1234...abcd`: the first 6 and last 4 characters.
pub fn format_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

pub fn short_address(address: Address) -> String {
    format_address(&checksum(address))
}

pub fn checksum(address: Address) -> String {
    to_checksum(&address, None)
}

/// The zero address stands for native ETH in transaction records.
pub fn token_label(address: Address) -> String {
    if address.is_zero() {
        "ETH".to_string()
    } else {
        short_address(address)
    }
}

pub fn format_hash(hash: H256) -> String {
    format_address(&format!("{hash:?}"))
}

/// Matches `0x` followed by exactly 40 hex digits, case-insensitive.
pub fn is_valid_address(input: &str) -> bool {
    input.len() == 42
        && (input.starts_with("0x") || input.starts_with("0X"))
        && input[2..].chars().all(|c| c.is_ascii_hexdigit())
}

pub fn to_fixed(value: f64, digits: usize) -> String {
    format!("{value:.digits$}")
}

/// 1,500 -> `1.50 K`, 2,500,000 -> `2.50 M`, 3,200,000,000 -> `3.20 B`.
/// Below a thousand the value is shown with two decimals.
pub fn format_large_number(value: f64) -> String {
    if value == 0.0 || value.is_nan() {
        return "0".to_string();
    }
    if value >= 1e9 {
        format!("{} B", to_fixed(value / 1e9, 2))
    } else if value >= 1e6 {
        format!("{} M", to_fixed(value / 1e6, 2))
    } else if value >= 1e3 {
        format!("{} K", to_fixed(value / 1e3, 2))
    } else {
        to_fixed(value, 2)
    }
}

/// Base units to a float in whole tokens.
pub fn units_to_f64(amount: U256, decimals: u32) -> f64 {
    format_token_amount(amount, decimals)
        .parse()
        .unwrap_or_default()
}

/// Base units to a full-precision decimal string.
pub fn format_token_amount(amount: U256, decimals: u32) -> String {
    format_units(amount, decimals).unwrap_or_else(|_| "0".to_string())
}

/// Base units to a decimal string with a fixed number of digits.
pub fn format_amount(amount: U256, decimals: u32, digits: usize) -> String {
    to_fixed(units_to_f64(amount, decimals), digits)
}

/// Parses a user-entered decimal string into base units.
pub fn parse_amount(input: &str, decimals: u32) -> Result<U256, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("amount is required".to_string());
    }
    parse_units(trimmed, decimals)
        .map(Into::into)
        .map_err(|e| format!("invalid amount {trimmed:?}: {e}"))
}

/// Parses a whole number such as a ratio, an APY or a stake id.
pub fn parse_integer(input: &str) -> Result<U256, String> {
    let trimmed = input.trim();
    U256::from_dec_str(trimmed).map_err(|_| format!("{trimmed:?} is not a whole number"))
}

fn positive(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Tokens received for `amount` of the payment token, to 6 decimals.
/// `eth_price` is the ETH price of one token in wei; `ratio` is tokens per
/// stablecoin.
pub fn calculate_token_amount(
    amount: &str,
    payment: PaymentToken,
    eth_price: U256,
    ratio: U256,
) -> String {
    let Some(amount) = positive(amount) else {
        return "0".to_string();
    };
    let tokens = match payment {
        PaymentToken::Eth => {
            let price = units_to_f64(eth_price, TOKEN_DECIMALS);
            if price > 0.0 {
                amount / price
            } else {
                0.0
            }
        }
        PaymentToken::Usdt | PaymentToken::Usdc => amount * ratio.low_u128() as f64,
    };
    to_fixed(tokens, 6)
}

/// Stablecoin received for `eth_amount` at `stablecoin_price` ETH per coin.
pub fn stablecoin_received(eth_amount: &str, stablecoin_price: f64) -> String {
    match positive(eth_amount) {
        Some(eth) if stablecoin_price > 0.0 => to_fixed(eth / stablecoin_price, 2),
        _ => "0".to_string(),
    }
}

/// Share of the sale already sold, clamped to 100 and rounded to 2 decimals.
pub fn progress_percentage(total_sold: f64, remaining: f64) -> f64 {
    let supply = total_sold + remaining;
    let supply = if supply > 0.0 { supply } else { 1.0 };
    let percentage = (total_sold / supply * 100.0).min(100.0);
    to_fixed(percentage, 2).parse().unwrap_or_default()
}

/// Longer locks earn a multiple of the base APY.
pub fn apy_for_period(base_apy: f64, lock_days: u64) -> f64 {
    match lock_days {
        90 => base_apy * 1.5,
        180 => base_apy * 2.0,
        365 => base_apy * 3.0,
        _ => base_apy,
    }
}

pub fn estimate_stake_reward(amount: &str, apy: f64, lock_days: u64) -> String {
    let Some(amount) = positive(amount) else {
        return "0".to_string();
    };
    let daily_rate = apy / 365.0 / 100.0;
    to_fixed(amount * daily_rate * lock_days as f64, 4)
}

pub fn time_remaining(start_time: u64, lock_days: u64, now: DateTime<Utc>) -> String {
    let end = start_time.saturating_add(lock_days.saturating_mul(SECONDS_PER_DAY));
    let now = now.timestamp().max(0) as u64;
    if now >= end {
        return "Unlocked".to_string();
    }
    format!("{} days", (end - now) / SECONDS_PER_DAY)
}

/// `YYYY-MM-DD HH:mm:ss` in the given timezone.
pub fn format_timestamp<Tz>(timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn timestamp_from_secs(secs: u64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs as i64, 0)
        .single()
        .unwrap_or_default()
}

/// Amount column of the transaction tables. Stablecoin inputs below one
/// cent are scaled by 10^6 so their digits stay visible.
pub fn format_transaction_amount(amount: U256, decimals: u32, stablecoin: bool) -> String {
    let value = units_to_f64(amount, decimals);
    if stablecoin && value > 0.0 && value < 0.01 {
        to_fixed(value * 1_000_000.0, 2)
    } else {
        to_fixed(value, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_keeps_first_six_and_last_four() {
        let address = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
        assert_eq!(format_address(address), "0x5FbD...0aa3");
        assert_eq!(format_address(""), "");

        let parsed: Address = address.parse().unwrap();
        assert_eq!(short_address(parsed), "0x5FbD...0aa3");
        assert_eq!(token_label(Address::zero()), "ETH");
    }

    #[test]
    fn address_validation_matches_hex_pattern() {
        assert!(is_valid_address("0x5FbDB2315678afecb367f032d93F642f64180aa3"));
        assert!(is_valid_address("0X5FBDB2315678AFECB367F032D93F642F64180AA3"));
        assert!(!is_valid_address("0x5FbDB2315678afecb367f032d93F642f64180aa"));
        assert!(!is_valid_address("5FbDB2315678afecb367f032d93F642f64180aa3ab"));
        assert!(!is_valid_address("0x5FbDB2315678afecb367f032d93F642f64180aaz"));
    }

    #[test]
    fn large_numbers_get_suffixes() {
        assert_eq!(format_large_number(1_500.0), "1.50 K");
        assert_eq!(format_large_number(2_500_000.0), "2.50 M");
        assert_eq!(format_large_number(3_200_000_000.0), "3.20 B");
        assert_eq!(format_large_number(999.5), "999.50");
        assert_eq!(format_large_number(42.0), "42.00");
        assert_eq!(format_large_number(0.0), "0");
    }

    #[test]
    fn eth_purchase_divides_by_token_price() {
        // 0.0001 ETH per token
        let price = U256::exp10(14);
        assert_eq!(
            calculate_token_amount("0.5", PaymentToken::Eth, price, U256::zero()),
            "5000.000000"
        );
        assert_eq!(
            calculate_token_amount("0", PaymentToken::Eth, price, U256::zero()),
            "0"
        );
        assert_eq!(
            calculate_token_amount("abc", PaymentToken::Eth, price, U256::zero()),
            "0"
        );
    }

    #[test]
    fn stablecoin_purchase_multiplies_by_ratio() {
        assert_eq!(
            calculate_token_amount("12", PaymentToken::Usdt, U256::zero(), U256::from(25u64)),
            "300.000000"
        );
    }

    #[test]
    fn progress_is_clamped_and_rounded() {
        assert_eq!(progress_percentage(250.0, 750.0), 25.0);
        assert_eq!(progress_percentage(1.0, 2.0), 33.33);
        assert_eq!(progress_percentage(100.0, 0.0), 100.0);
        assert_eq!(progress_percentage(0.0, 0.0), 0.0);
    }

    #[test]
    fn staking_previews() {
        assert_eq!(apy_for_period(12.0, 30), 12.0);
        assert_eq!(apy_for_period(12.0, 90), 18.0);
        assert_eq!(apy_for_period(12.0, 180), 24.0);
        assert_eq!(apy_for_period(12.0, 365), 36.0);
        assert_eq!(apy_for_period(12.0, 7), 12.0);

        assert_eq!(estimate_stake_reward("1000", 36.5, 365), "365.0000");
        assert_eq!(estimate_stake_reward("", 36.5, 365), "0");
    }

    #[test]
    fn remaining_lock_time() {
        let start = 1_700_000_000;
        let now = timestamp_from_secs(start + 10 * SECONDS_PER_DAY + 5);
        assert_eq!(time_remaining(start, 30, now), "19 days");
        assert_eq!(time_remaining(start, 10, now), "Unlocked");
    }

    #[test]
    fn unit_conversion() {
        let one_and_half = U256::from(1_500_000u64);
        assert_eq!(format_amount(one_and_half, STABLE_DECIMALS, 2), "1.50");
        assert_eq!(format_token_amount(U256::exp10(18), TOKEN_DECIMALS), "1.000000000000000000");
        assert_eq!(parse_amount("1.5", STABLE_DECIMALS).unwrap(), one_and_half);
        assert!(parse_amount("", STABLE_DECIMALS).is_err());
        assert!(parse_amount("1.2.3", TOKEN_DECIMALS).is_err());
        assert_eq!(parse_integer(" 42 ").unwrap(), U256::from(42u64));
        assert!(parse_integer("4.2").is_err());
    }

    #[test]
    fn tiny_stablecoin_amounts_are_scaled() {
        // 0.000002 USDT
        assert_eq!(format_transaction_amount(U256::from(2u64), 6, true), "2.00");
        assert_eq!(format_transaction_amount(U256::from(2u64), 6, false), "0.00");
        assert_eq!(format_transaction_amount(U256::from(1_250_000u64), 6, true), "1.25");
    }

    #[test]
    fn timestamps_and_stablecoin_preview() {
        let ts = timestamp_from_secs(1_700_000_000);
        assert_eq!(format_timestamp(&ts), "2023-11-14 22:13:20");
        assert_eq!(stablecoin_received("1", 0.0005), "2000.00");
        assert_eq!(stablecoin_received("1", 0.0), "0");
    }
}
