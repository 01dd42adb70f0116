use crossterm::event::KeyEvent;
use presale_core::binding::TxResult;
use presale_core::format::{
    format_amount, format_hash, format_timestamp, stablecoin_received, units_to_f64,
    STABLE_DECIMALS, TOKEN_DECIMALS,
};
use presale_core::models::PaymentToken;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    Frame,
};

use super::{connect_notice, details, table, Page};
use crate::action::Action;
use crate::data::View;
use crate::widgets::form::{Field, Form};

const COIN: usize = 0;
const ETH: usize = 1;
const COINS: [PaymentToken; 2] = [PaymentToken::Usdt, PaymentToken::Usdc];

/// Buys USDT or USDC from the contract with ETH.
pub struct StablecoinPurchase {
    form: Form,
}

impl StablecoinPurchase {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                Field::choice("Receive", COINS.iter().map(|c| c.symbol())),
                Field::text("ETH amount"),
            ]),
        }
    }

    fn coin(&self) -> PaymentToken {
        COINS[self.form.choice(COIN) % COINS.len()]
    }
}

impl Page for StablecoinPurchase {
    fn title(&self) -> &'static str {
        "Stablecoin Purchase"
    }

    fn render(&self, frame: &mut Frame, area: Rect, view: &View, focused: bool) {
        let [top, history] =
            Layout::vertical([Constraint::Length(9), Constraint::Min(0)]).areas(area);
        let [form_area, info_area] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(top);

        if view.data.account.is_none() {
            connect_notice(frame, form_area);
        } else {
            self.form.render(frame, form_area, "Buy stablecoin", focused);
        }

        let coin = self.coin();
        let (price, available) = match &view.data.snapshot {
            Some(s) => (
                units_to_f64(s.contract_info.stablecoin_price, TOKEN_DECIMALS),
                match coin {
                    PaymentToken::Usdc => s.balances.contract_usdc_balance,
                    _ => s.balances.contract_usdt_balance,
                },
            ),
            None => (0.0, Default::default()),
        };
        frame.render_widget(
            details(
                "Quote",
                vec![
                    (
                        "You receive",
                        format!(
                            "{} {}",
                            stablecoin_received(self.form.value(ETH), price),
                            coin.symbol()
                        ),
                    ),
                    ("ETH per coin", format!("{price}")),
                    (
                        "Available",
                        format_amount(available, STABLE_DECIMALS, 2),
                    ),
                ],
            ),
            info_area,
        );

        let rows = view
            .data
            .purchases
            .iter()
            .map(|p| {
                vec![
                    format_timestamp(&p.timestamp),
                    p.stablecoin.clone(),
                    p.eth_amount.clone(),
                    p.stablecoin_amount.clone(),
                    format_hash(p.hash),
                ]
            })
            .collect();
        frame.render_widget(
            table(
                "Recent purchases",
                vec!["Time", "Coin", "ETH", "Received", "Hash"],
                rows,
                vec![
                    Constraint::Length(20),
                    Constraint::Length(6),
                    Constraint::Length(12),
                    Constraint::Length(12),
                    Constraint::Min(14),
                ],
            ),
            history,
        );
    }

    fn handle_key(&mut self, key: KeyEvent, view: &View) -> Option<Action> {
        if view.data.account.is_none() || !self.form.handle_key(key) {
            return None;
        }
        Some(Action::BuyStablecoin(
            self.coin(),
            self.form.value(ETH).to_string(),
        ))
    }

    fn submitted(&mut self, action: &Action) {
        self.form.submitted(&action.describe());
    }

    fn finish(&mut self, result: &TxResult) {
        self.form.finish(result);
    }
}
