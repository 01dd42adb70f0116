use crossterm::event::KeyEvent;
use presale_core::binding::TxResult;
use presale_core::models::PaymentToken;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    Frame,
};

use super::{details, owner_only_notice, Page};
use crate::action::Action;
use crate::data::View;
use crate::widgets::form::{Field, Form};

const FUNCTION: usize = 0;
const VALUE: usize = 1;
const RATIO: usize = 2;

const FUNCTIONS: [(&str, &str); 9] = [
    ("Update token price", "price in ETH"),
    ("Update stablecoin price", "price in ETH"),
    ("Update USDT", "token address + ratio"),
    ("Update USDC", "token address + ratio"),
    ("Set sale token", "token address"),
    ("Block address", "wallet address"),
    ("Unblock address", "wallet address"),
    ("Update base APY", "whole percent"),
    ("Update minimum stake", "token amount"),
];

pub struct AdminFunctions {
    form: Form,
}

impl AdminFunctions {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                Field::choice("Function", FUNCTIONS.iter().map(|(name, _)| *name)),
                Field::text("Value"),
                Field::text("Ratio"),
            ]),
        }
    }

    fn action(&self) -> Action {
        let value = self.form.value(VALUE).to_string();
        let ratio = self.form.value(RATIO).to_string();
        match self.form.choice(FUNCTION) {
            0 => Action::UpdateTokenPrice(value),
            1 => Action::UpdateStablecoinPrice(value),
            2 => Action::UpdateStablecoin {
                coin: PaymentToken::Usdt,
                token: value,
                ratio,
            },
            3 => Action::UpdateStablecoin {
                coin: PaymentToken::Usdc,
                token: value,
                ratio,
            },
            4 => Action::SetSaleToken(value),
            5 => Action::SetBlockStatus(value, true),
            6 => Action::SetBlockStatus(value, false),
            7 => Action::UpdateBaseApy(value),
            _ => Action::UpdateMinStake(value),
        }
    }
}

impl Page for AdminFunctions {
    fn title(&self) -> &'static str {
        "Admin Functions"
    }

    fn owner_only(&self) -> bool {
        true
    }

    fn render(&self, frame: &mut Frame, area: Rect, view: &View, focused: bool) {
        if !view.data.is_owner {
            owner_only_notice(frame, area);
            return;
        }
        let [form_area, help_area] =
            Layout::vertical([Constraint::Length(10), Constraint::Min(0)]).areas(area);
        self.form.render(frame, form_area, "Contract settings", focused);

        let (name, input) = FUNCTIONS[self.form.choice(FUNCTION) % FUNCTIONS.len()];
        let mut rows = vec![("Function", name.to_string()), ("Value", input.to_string())];
        if let Some(overview) = &view.data.overview {
            rows.push(("Current APY", format!("{}%", overview.base_apy)));
            rows.push(("Current min stake", overview.min_stake_amount.clone()));
            rows.push(("Token price", overview.eth_price.clone()));
            rows.push(("Stablecoin price", overview.stablecoin_price.clone()));
        }
        frame.render_widget(details("Details", rows), help_area);
    }

    fn handle_key(&mut self, key: KeyEvent, view: &View) -> Option<Action> {
        if !view.data.is_owner || !self.form.handle_key(key) {
            return None;
        }
        Some(self.action())
    }

    fn submitted(&mut self, action: &Action) {
        self.form.submitted(&action.describe());
    }

    fn finish(&mut self, result: &TxResult) {
        self.form.finish(result);
    }
}
