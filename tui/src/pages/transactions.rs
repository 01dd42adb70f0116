use crossterm::event::{KeyCode, KeyEvent};
use presale_core::format::{format_timestamp, short_address};
use presale_core::models::TransactionRecord;
use ratatui::{
    layout::{Constraint, Rect},
    Frame,
};

use super::{table, Page};
use crate::action::Action;
use crate::data::View;

/// Sale history. The owner can switch between their own records and the
/// whole contract's with `a`.
#[derive(Default)]
pub struct Transactions {
    show_all: bool,
}

impl Page for Transactions {
    fn title(&self) -> &'static str {
        "Transactions"
    }

    fn render(&self, frame: &mut Frame, area: Rect, view: &View, _focused: bool) {
        let all = self.show_all && view.data.is_owner;
        let (title, records): (&str, &[TransactionRecord]) = if all {
            ("All transactions  [a] mine", view.data.all_transactions.as_slice())
        } else if view.data.is_owner {
            ("Your transactions  [a] all", view.data.transactions.as_slice())
        } else {
            ("Your transactions", view.data.transactions.as_slice())
        };

        let rows = records
            .iter()
            .map(|tx| {
                vec![
                    format_timestamp(&tx.timestamp),
                    tx.transaction_type.clone(),
                    short_address(tx.user),
                    format!("{} {}", tx.amount_in, tx.token_in),
                    format!("{} {}", tx.amount_out, tx.token_out),
                ]
            })
            .collect();
        frame.render_widget(
            table(
                title,
                vec!["Time", "Type", "User", "Paid", "Received"],
                rows,
                vec![
                    Constraint::Length(20),
                    Constraint::Length(9),
                    Constraint::Length(14),
                    Constraint::Length(18),
                    Constraint::Min(18),
                ],
            ),
            area,
        );
    }

    fn handle_key(&mut self, key: KeyEvent, view: &View) -> Option<Action> {
        if key.code == KeyCode::Char('a') && view.data.is_owner {
            self.show_all = !self.show_all;
        }
        None
    }
}
