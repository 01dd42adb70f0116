use crossterm::event::KeyEvent;
use presale_core::binding::TxResult;
use presale_core::config::Config;
use presale_core::format::{
    format_amount, format_hash, format_timestamp, short_address, STABLE_DECIMALS, TOKEN_DECIMALS,
};
use presale_core::models::TokenBalances;
use presale_core::{Address, U256};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    Frame,
};

use super::{details, owner_only_notice, table, Page};
use crate::action::Action;
use crate::data::View;
use crate::widgets::form::{Field, Form};

const TOKEN: usize = 0;
const AMOUNT: usize = 1;

struct Withdrawable {
    symbol: String,
    address: Address,
    decimals: u32,
    balance: fn(&TokenBalances) -> U256,
}

/// Owner withdrawal of sale tokens, ETH or stablecoins held by the contract.
pub struct WithdrawTokens {
    form: Form,
    tokens: Vec<Withdrawable>,
}

impl WithdrawTokens {
    pub fn new(config: &Config) -> Self {
        let tokens = vec![
            Withdrawable {
                symbol: config.token.symbol.clone(),
                address: config.token_address,
                decimals: TOKEN_DECIMALS,
                balance: |b| b.contract_token_balance,
            },
            Withdrawable {
                symbol: "ETH".to_string(),
                address: config.eth_address,
                decimals: TOKEN_DECIMALS,
                balance: |b| b.contract_eth_balance,
            },
            Withdrawable {
                symbol: "USDT".to_string(),
                address: config.usdt_address,
                decimals: STABLE_DECIMALS,
                balance: |b| b.contract_usdt_balance,
            },
            Withdrawable {
                symbol: "USDC".to_string(),
                address: config.usdc_address,
                decimals: STABLE_DECIMALS,
                balance: |b| b.contract_usdc_balance,
            },
        ];
        Self {
            form: Form::new(vec![
                Field::choice("Token", tokens.iter().map(|t| t.symbol.clone())),
                Field::text("Amount"),
            ]),
            tokens,
        }
    }

    fn selected(&self) -> &Withdrawable {
        &self.tokens[self.form.choice(TOKEN) % self.tokens.len()]
    }
}

impl Page for WithdrawTokens {
    fn title(&self) -> &'static str {
        "Withdraw Tokens"
    }

    fn owner_only(&self) -> bool {
        true
    }

    fn render(&self, frame: &mut Frame, area: Rect, view: &View, focused: bool) {
        if !view.data.is_owner {
            owner_only_notice(frame, area);
            return;
        }
        let [top, history] =
            Layout::vertical([Constraint::Length(9), Constraint::Min(0)]).areas(area);
        let [form_area, info_area] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(top);

        self.form.render(frame, form_area, "Withdraw", focused);

        let token = self.selected();
        let balance = view
            .data
            .snapshot
            .as_ref()
            .map(|s| format_amount((token.balance)(&s.balances), token.decimals, 4))
            .unwrap_or_else(|| "0".to_string());
        frame.render_widget(
            details(
                "Contract holdings",
                vec![
                    ("Token", token.symbol.clone()),
                    ("Address", short_address(token.address)),
                    ("Available", balance),
                ],
            ),
            info_area,
        );

        let rows = view
            .data
            .withdrawals
            .iter()
            .map(|w| {
                vec![
                    format_timestamp(&w.timestamp),
                    w.token.clone(),
                    w.amount.clone(),
                    w.status.clone(),
                    format_hash(w.hash),
                ]
            })
            .collect();
        frame.render_widget(
            table(
                "Withdrawal history",
                vec!["Time", "Token", "Amount", "Status", "Hash"],
                rows,
                vec![
                    Constraint::Length(20),
                    Constraint::Length(8),
                    Constraint::Length(16),
                    Constraint::Length(10),
                    Constraint::Min(14),
                ],
            ),
            history,
        );
    }

    fn handle_key(&mut self, key: KeyEvent, view: &View) -> Option<Action> {
        if !view.data.is_owner || !self.form.handle_key(key) {
            return None;
        }
        let address = self.selected().address;
        Some(Action::Withdraw(address, self.form.value(AMOUNT).to_string()))
    }

    fn submitted(&mut self, action: &Action) {
        self.form.submitted(&action.describe());
    }

    fn finish(&mut self, result: &TxResult) {
        self.form.finish(result);
    }
}
