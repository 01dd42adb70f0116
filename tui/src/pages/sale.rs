use crossterm::event::KeyEvent;
use presale_core::binding::TxResult;
use presale_core::format::{calculate_token_amount, format_amount, STABLE_DECIMALS, TOKEN_DECIMALS};
use presale_core::models::PaymentToken;
use presale_core::U256;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    Frame,
};

use super::{connect_notice, details, Page};
use crate::action::Action;
use crate::data::View;
use crate::widgets::form::{Field, Form};

const PAYMENT: usize = 0;
const AMOUNT: usize = 1;

pub struct TokenSale {
    form: Form,
}

impl TokenSale {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                Field::choice("Pay with", PaymentToken::ALL.iter().map(|p| p.symbol())),
                Field::text("Amount"),
            ]),
        }
    }

    fn payment(&self) -> PaymentToken {
        PaymentToken::ALL[self.form.choice(PAYMENT) % PaymentToken::ALL.len()]
    }
}

impl Page for TokenSale {
    fn title(&self) -> &'static str {
        "Token Sale"
    }

    fn render(&self, frame: &mut Frame, area: Rect, view: &View, focused: bool) {
        let [form_area, info_area] =
            Layout::vertical([Constraint::Length(9), Constraint::Min(0)]).areas(area);
        if view.data.account.is_none() {
            connect_notice(frame, form_area);
        } else {
            self.form.render(frame, form_area, "Buy tokens", focused);
        }

        let payment = self.payment();
        let snapshot = view.data.snapshot.as_ref();
        let (eth_price, ratio) = snapshot
            .map(|s| {
                let ratio = match payment {
                    PaymentToken::Usdc => s.contract_info.usdc_token_ratio,
                    _ => s.contract_info.usdt_token_ratio,
                };
                (s.contract_info.eth_price, ratio)
            })
            .unwrap_or((U256::zero(), U256::zero()));
        let balance = snapshot
            .map(|s| match payment {
                PaymentToken::Eth => format_amount(s.balances.user_eth_balance, TOKEN_DECIMALS, 4),
                PaymentToken::Usdt => {
                    format_amount(s.balances.user_usdt_balance, STABLE_DECIMALS, 2)
                }
                PaymentToken::Usdc => {
                    format_amount(s.balances.user_usdc_balance, STABLE_DECIMALS, 2)
                }
            })
            .unwrap_or_else(|| "0".to_string());
        let symbol = &view.config.token.symbol;

        frame.render_widget(
            details(
                "Purchase",
                vec![
                    (
                        "You receive",
                        format!(
                            "{} {symbol}",
                            calculate_token_amount(
                                self.form.value(AMOUNT),
                                payment,
                                eth_price,
                                ratio
                            )
                        ),
                    ),
                    (
                        "ETH per token",
                        format_amount(eth_price, TOKEN_DECIMALS, 6),
                    ),
                    ("Tokens per coin", ratio.to_string()),
                    ("Your balance", format!("{balance} {}", payment.symbol())),
                ],
            ),
            info_area,
        );
    }

    fn handle_key(&mut self, key: KeyEvent, view: &View) -> Option<Action> {
        if view.data.account.is_none() || !self.form.handle_key(key) {
            return None;
        }
        let amount = self.form.value(AMOUNT).to_string();
        Some(match self.payment() {
            PaymentToken::Eth => Action::BuyWithEth(amount),
            coin => Action::BuyWithStablecoin(coin, amount),
        })
    }

    fn submitted(&mut self, action: &Action) {
        self.form.submitted(&action.describe());
    }

    fn finish(&mut self, result: &TxResult) {
        self.form.finish(result);
    }
}
