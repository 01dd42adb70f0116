use presale_core::format::{
    format_amount, format_large_number, progress_percentage, short_address, units_to_f64,
    STABLE_DECIMALS, TOKEN_DECIMALS,
};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Gauge, Paragraph},
    Frame,
};

use super::{details, Page};
use crate::data::View;

/// Sale overview: progress, prices and balances.
pub struct Dashboard;

impl Page for Dashboard {
    fn title(&self) -> &'static str {
        "Dashboard"
    }

    fn render(&self, frame: &mut Frame, area: Rect, view: &View, _focused: bool) {
        let token = &view.config.token;
        let Some(snapshot) = &view.data.snapshot else {
            let text = view
                .data
                .error
                .clone()
                .unwrap_or_else(|| "Loading sale data...".to_string());
            frame.render_widget(Paragraph::new(text).block(Block::bordered()), area);
            return;
        };
        let info = &snapshot.contract_info;
        let balances = &snapshot.balances;

        let [sale_area, gauge_area, balance_area] = Layout::vertical([
            Constraint::Length(10),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .areas(area);

        let sold = units_to_f64(info.total_sold, TOKEN_DECIMALS);
        let remaining = units_to_f64(info.token_balance, TOKEN_DECIMALS);
        let progress = progress_percentage(sold, remaining);

        frame.render_widget(
            details(
                "Presale",
                vec![
                    ("Token", format!("{} ({})", token.name, token.symbol)),
                    ("Network", token.blockchain.clone()),
                    (
                        "Price",
                        format!(
                            "{} {} per token",
                            format_amount(info.eth_price, TOKEN_DECIMALS, 6),
                            token.currency
                        ),
                    ),
                    (
                        "USD price",
                        format!(
                            "${} (next stage ${})",
                            token.per_token_usd_price, token.next_per_token_usd_price
                        ),
                    ),
                    ("Total sold", format_large_number(sold)),
                    ("Available", format_large_number(remaining)),
                    (
                        "Total supply",
                        format_large_number(units_to_f64(balances.token_supply, TOKEN_DECIMALS)),
                    ),
                    ("Sale token", short_address(info.token_address)),
                ],
            ),
            sale_area,
        );

        frame.render_widget(
            Gauge::default()
                .block(Block::bordered().title("Sale progress"))
                .gauge_style(Style::default().fg(Color::Green))
                .ratio((progress / 100.0).clamp(0.0, 1.0))
                .label(format!("{progress:.2}%")),
            gauge_area,
        );

        let [wallet_area, contract_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(balance_area);

        let wallet = match view.data.account {
            Some(account) => vec![
                ("Address", short_address(account)),
                (
                    token.symbol.as_str(),
                    format_amount(balances.user_token_balance, TOKEN_DECIMALS, 2),
                ),
                ("ETH", format_amount(balances.user_eth_balance, TOKEN_DECIMALS, 4)),
                ("USDT", format_amount(balances.user_usdt_balance, STABLE_DECIMALS, 2)),
                ("USDC", format_amount(balances.user_usdc_balance, STABLE_DECIMALS, 2)),
            ],
            None => vec![("Address", "read-only".to_string())],
        };
        frame.render_widget(details("Wallet", wallet), wallet_area);

        frame.render_widget(
            details(
                "Contract",
                vec![
                    (
                        token.symbol.as_str(),
                        format_amount(balances.contract_token_balance, TOKEN_DECIMALS, 2),
                    ),
                    ("ETH", format_amount(balances.contract_eth_balance, TOKEN_DECIMALS, 4)),
                    ("USDT", format_amount(balances.contract_usdt_balance, STABLE_DECIMALS, 2)),
                    ("USDC", format_amount(balances.contract_usdc_balance, STABLE_DECIMALS, 2)),
                    ("Updated", snapshot.refreshed_at.format("%H:%M:%S").to_string()),
                ],
            ),
            contract_area,
        );
    }
}
