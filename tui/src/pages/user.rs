use crossterm::event::KeyEvent;
use presale_core::binding::TxResult;
use presale_core::format::{
    format_amount, format_timestamp, short_address, timestamp_from_secs, STABLE_DECIMALS,
    TOKEN_DECIMALS,
};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    Frame,
};

use super::{connect_notice, details, table, Page};
use crate::action::Action;
use crate::data::View;
use crate::widgets::form::{Field, Form};

const REFERRER: usize = 0;

/// Wallet balances, staking totals and the referral programme.
pub struct UserDashboard {
    form: Form,
}

impl UserDashboard {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![Field::text("Referrer")]),
        }
    }
}

impl Page for UserDashboard {
    fn title(&self) -> &'static str {
        "User Dashboard"
    }

    fn render(&self, frame: &mut Frame, area: Rect, view: &View, focused: bool) {
        let Some(account) = view.data.account else {
            connect_notice(frame, area);
            return;
        };
        let [top, middle, bottom] = Layout::vertical([
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Min(0),
        ])
        .areas(area);
        let [wallet_area, referral_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(top);
        let [form_area, referrals_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(middle);

        let symbol = view.config.token.symbol.as_str();
        let mut wallet = vec![("Address", short_address(account))];
        if let Some(s) = &view.data.snapshot {
            wallet.push((
                symbol,
                format_amount(s.balances.user_token_balance, TOKEN_DECIMALS, 2),
            ));
            wallet.push(("ETH", format_amount(s.balances.user_eth_balance, TOKEN_DECIMALS, 4)));
            wallet.push((
                "USDT",
                format_amount(s.balances.user_usdt_balance, STABLE_DECIMALS, 2),
            ));
            wallet.push((
                "USDC",
                format_amount(s.balances.user_usdc_balance, STABLE_DECIMALS, 2),
            ));
        }
        if let Some(staking) = &view.data.staking {
            wallet.push(("Staked", staking.user_staked.clone()));
            wallet.push(("Pending rewards", staking.pending_rewards.clone()));
        }
        frame.render_widget(details("Wallet", wallet), wallet_area);

        let mut referral = vec![(
            "Your link",
            view.data.referral_link.clone().unwrap_or_default(),
        )];
        if let Some(info) = &view.data.referral {
            let referrer = if info.has_referrer() {
                short_address(info.referrer)
            } else {
                "none".to_string()
            };
            referral.push(("Referred by", referrer));
            referral.push(("Referrals", info.total_referrals.clone()));
            referral.push((
                "Rewards earned",
                format!("{} {symbol}", info.total_rewards_earned),
            ));
            referral.push(("Reward rate", format!("{}%", info.reward_percentage)));
        }
        frame.render_widget(details("Referral", referral), referral_area);

        self.form.render(frame, form_area, "Register referrer", focused);

        let referred: Vec<Vec<String>> = view
            .data
            .referrals
            .iter()
            .map(|a| vec![short_address(*a)])
            .collect();
        frame.render_widget(
            table(
                "Your referrals",
                vec!["Address"],
                referred,
                vec![Constraint::Min(14)],
            ),
            referrals_area,
        );

        let rows = view
            .data
            .referral_transactions
            .iter()
            .map(|tx| {
                vec![
                    format_timestamp(&timestamp_from_secs(tx.timestamp)),
                    short_address(tx.referred_user),
                    tx.purchase_amount.clone(),
                    tx.reward_amount.clone(),
                ]
            })
            .collect();
        frame.render_widget(
            table(
                "Referral rewards",
                vec!["Time", "User", "Purchase", "Reward"],
                rows,
                vec![
                    Constraint::Length(20),
                    Constraint::Length(14),
                    Constraint::Length(24),
                    Constraint::Min(12),
                ],
            ),
            bottom,
        );
    }

    fn handle_key(&mut self, key: KeyEvent, view: &View) -> Option<Action> {
        if view.data.account.is_none() || !self.form.handle_key(key) {
            return None;
        }
        Some(Action::RegisterReferrer(
            self.form.value(REFERRER).to_string(),
        ))
    }

    fn submitted(&mut self, action: &Action) {
        self.form.submitted(&action.describe());
    }

    fn finish(&mut self, result: &TxResult) {
        self.form.finish(result);
    }
}
