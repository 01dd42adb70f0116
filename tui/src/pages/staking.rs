use chrono::{DateTime, Utc};
use crossterm::event::KeyEvent;
use presale_core::binding::TxResult;
use presale_core::config::Config;
use presale_core::format::{
    apy_for_period, estimate_stake_reward, format_timestamp, parse_integer, timestamp_from_secs,
    time_remaining,
};
use presale_core::models::StakeRecord;
use presale_core::U256;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    Frame,
};

use super::{connect_notice, details, table, Page};
use crate::action::Action;
use crate::data::View;
use crate::widgets::form::{Field, Form};

const OPERATION: usize = 0;
const AMOUNT: usize = 1;
const LOCK: usize = 2;
const STAKE_ID: usize = 3;

const OPERATIONS: [&str; 4] = ["Stake", "Harvest", "Unstake", "Unstake early (5% penalty)"];

pub struct Staking {
    form: Form,
    lock_periods: Vec<u64>,
}

impl Staking {
    pub fn new(config: &Config) -> Self {
        Self {
            form: Form::new(vec![
                Field::choice("Operation", OPERATIONS),
                Field::text("Amount"),
                Field::choice(
                    "Lock period",
                    config.lock_periods.iter().map(|d| format!("{d} days")),
                ),
                Field::text("Stake #"),
            ]),
            lock_periods: config.lock_periods.clone(),
        }
    }

    fn lock_days(&self) -> u64 {
        self.lock_periods
            .get(self.form.choice(LOCK))
            .copied()
            .unwrap_or_default()
    }
}

const UNLOCKED: &str = "Unlocked";

/// Harvest works on any active stake. Unstaking is only offered once the
/// lock has run out, early unstaking only while it is still running.
fn stake_action(
    operation: usize,
    id: U256,
    stakes: &[StakeRecord],
    now: DateTime<Utc>,
) -> Result<Action, String> {
    let stake = stakes
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| format!("No active stake #{id}"))?;
    let unlocked = time_remaining(stake.start_time, stake.lock_period, now) == UNLOCKED;
    match operation {
        1 => Ok(Action::Harvest(id)),
        2 if unlocked => Ok(Action::Unstake(id)),
        2 => Err(format!("Stake #{id} is still locked, unstake early instead")),
        _ if unlocked => Err(format!("Stake #{id} is unlocked, unstake without penalty")),
        _ => Ok(Action::UnstakeEarly(id)),
    }
}

fn base_apy(view: &View) -> f64 {
    view.data
        .overview
        .as_ref()
        .and_then(|o| o.base_apy.parse().ok())
        .unwrap_or(12.0)
}

impl Page for Staking {
    fn title(&self) -> &'static str {
        "Staking"
    }

    fn render(&self, frame: &mut Frame, area: Rect, view: &View, focused: bool) {
        let [top, stakes_area] =
            Layout::vertical([Constraint::Length(11), Constraint::Min(0)]).areas(area);
        let [form_area, info_area] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(top);

        if view.data.account.is_none() {
            connect_notice(frame, form_area);
        } else {
            self.form.render(frame, form_area, "Stake", focused);
        }

        let symbol = &view.config.token.symbol;
        let base = base_apy(view);
        let days = self.lock_days();
        let apy = apy_for_period(base, days);
        let overview = view.data.overview.as_ref();
        let value = |v: Option<&String>| v.cloned().unwrap_or_else(|| "0".to_string());
        frame.render_widget(
            details(
                "Staking",
                vec![
                    ("APY for period", format!("{apy}%")),
                    (
                        "Estimated reward",
                        format!(
                            "{} {symbol}",
                            estimate_stake_reward(self.form.value(AMOUNT), apy, days)
                        ),
                    ),
                    (
                        "Minimum stake",
                        format!("{} {symbol}", value(overview.map(|o| &o.min_stake_amount))),
                    ),
                    ("You staked", value(overview.map(|o| &o.user_staked))),
                    ("Pending rewards", value(overview.map(|o| &o.pending_rewards))),
                    ("Total staked", value(overview.map(|o| &o.total_staked))),
                    ("Stakers", value(overview.map(|o| &o.total_stakers))),
                ],
            ),
            info_area,
        );

        let now = Utc::now();
        let rows = view
            .data
            .stakes
            .iter()
            .map(|s| {
                vec![
                    format!("#{}", s.id),
                    s.amount.clone(),
                    format!("{} days", s.lock_period),
                    format!("{}%", apy_for_period(base, s.lock_period)),
                    format_timestamp(&timestamp_from_secs(s.start_time)),
                    s.pending_rewards.clone(),
                    time_remaining(s.start_time, s.lock_period, now),
                ]
            })
            .collect();
        frame.render_widget(
            table(
                "Your stakes",
                vec!["Id", "Amount", "Lock", "APY", "Started", "Pending", "Remaining"],
                rows,
                vec![
                    Constraint::Length(5),
                    Constraint::Length(14),
                    Constraint::Length(9),
                    Constraint::Length(6),
                    Constraint::Length(20),
                    Constraint::Length(14),
                    Constraint::Min(9),
                ],
            ),
            stakes_area,
        );
    }

    fn handle_key(&mut self, key: KeyEvent, view: &View) -> Option<Action> {
        if view.data.account.is_none() || !self.form.handle_key(key) {
            return None;
        }
        let operation = self.form.choice(OPERATION);
        if operation == 0 {
            return Some(Action::Stake(
                self.form.value(AMOUNT).to_string(),
                self.lock_days(),
            ));
        }
        let id = match parse_integer(self.form.value(STAKE_ID).trim_start_matches('#')) {
            Ok(id) => id,
            Err(e) => {
                self.form.rejected(e);
                return None;
            }
        };
        match stake_action(operation, id, &view.data.stakes, Utc::now()) {
            Ok(action) => Some(action),
            Err(e) => {
                self.form.rejected(e);
                None
            }
        }
    }

    fn submitted(&mut self, action: &Action) {
        self.form.submitted(&action.describe());
    }

    fn finish(&mut self, result: &TxResult) {
        self.form.finish(result);
    }
}
