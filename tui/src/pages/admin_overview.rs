use presale_core::format::{
    format_amount, format_large_number, short_address, units_to_f64, STABLE_DECIMALS,
    TOKEN_DECIMALS,
};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    widgets::{Block, Paragraph},
    Frame,
};

use super::{details, owner_only_notice, Page};
use crate::data::View;

pub struct AdminOverview;

impl Page for AdminOverview {
    fn title(&self) -> &'static str {
        "Admin Overview"
    }

    fn owner_only(&self) -> bool {
        true
    }

    fn render(&self, frame: &mut Frame, area: Rect, view: &View, _focused: bool) {
        if !view.data.is_owner {
            owner_only_notice(frame, area);
            return;
        }
        let Some(snapshot) = &view.data.snapshot else {
            frame.render_widget(
                Paragraph::new("Loading...").block(Block::bordered()),
                area,
            );
            return;
        };
        let info = &snapshot.contract_info;
        let balances = &snapshot.balances;
        let symbol = view.config.token.symbol.as_str();

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(area);

        frame.render_widget(
            details(
                "Sale configuration",
                vec![
                    ("Contract", short_address(view.config.contract_address)),
                    ("Sale token", short_address(info.token_address)),
                    ("Token price (ETH)", format_amount(info.eth_price, TOKEN_DECIMALS, 6)),
                    (
                        "Stablecoin price",
                        format_amount(info.stablecoin_price, TOKEN_DECIMALS, 6),
                    ),
                    ("USDT", short_address(info.usdt_address)),
                    ("USDT ratio", info.usdt_token_ratio.to_string()),
                    ("USDC", short_address(info.usdc_address)),
                    ("USDC ratio", info.usdc_token_ratio.to_string()),
                    (
                        "Total sold",
                        format_large_number(units_to_f64(info.total_sold, TOKEN_DECIMALS)),
                    ),
                ],
            ),
            left,
        );

        let mut stats = vec![
            (
                symbol,
                format_amount(balances.contract_token_balance, TOKEN_DECIMALS, 2),
            ),
            ("ETH", format_amount(balances.contract_eth_balance, TOKEN_DECIMALS, 4)),
            ("USDT", format_amount(balances.contract_usdt_balance, STABLE_DECIMALS, 2)),
            ("USDC", format_amount(balances.contract_usdc_balance, STABLE_DECIMALS, 2)),
            (
                "Penalties collected",
                format_amount(balances.total_penalty, TOKEN_DECIMALS, 4),
            ),
        ];
        if let Some(overview) = &view.data.overview {
            stats.push(("Base APY", format!("{}%", overview.base_apy)));
            stats.push(("Minimum stake", overview.min_stake_amount.clone()));
            stats.push(("Total staked", overview.total_staked.clone()));
            stats.push(("Rewards paid", overview.total_rewards_distributed.clone()));
            stats.push(("Stakers", overview.total_stakers.clone()));
        }
        stats.push(("Transactions", view.data.all_transactions.len().to_string()));
        frame.render_widget(details("Holdings and staking", stats), right);
    }
}
