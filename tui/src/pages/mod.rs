use crossterm::event::KeyEvent;
use presale_core::binding::TxResult;
use presale_core::config::Config;
use ratatui::{
    layout::{Constraint, Rect},
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Paragraph, Row, Table},
    Frame,
};

use crate::action::Action;
use crate::data::View;

mod admin_functions;
mod admin_overview;
mod dashboard;
mod sale;
mod stablecoin;
mod staking;
mod transactions;
mod user;
mod withdraw;

pub trait Page {
    fn title(&self) -> &'static str;

    fn owner_only(&self) -> bool {
        false
    }

    fn render(&self, frame: &mut Frame, area: Rect, view: &View, focused: bool);

    fn handle_key(&mut self, _key: KeyEvent, _view: &View) -> Option<Action> {
        None
    }

    /// The page's action was handed to the runtime.
    fn submitted(&mut self, _action: &Action) {}

    fn finish(&mut self, _result: &TxResult) {}
}

pub fn all(config: &Config) -> Vec<Box<dyn Page>> {
    vec![
        Box::new(dashboard::Dashboard),
        Box::new(sale::TokenSale::new()),
        Box::new(stablecoin::StablecoinPurchase::new()),
        Box::new(staking::Staking::new(config)),
        Box::new(withdraw::WithdrawTokens::new(config)),
        Box::new(user::UserDashboard::new()),
        Box::new(transactions::Transactions::default()),
        Box::new(admin_overview::AdminOverview),
        Box::new(admin_functions::AdminFunctions::new()),
    ]
}

/// `label: value` rows.
pub(crate) fn details<'a>(title: &'a str, rows: Vec<(&'a str, String)>) -> Paragraph<'a> {
    let lines: Vec<Line> = rows
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::raw(format!("{label:<22}")).dark_gray(),
                Span::raw(value),
            ])
        })
        .collect();
    Paragraph::new(lines).block(Block::bordered().title(title))
}

pub(crate) fn table<'a>(
    title: &'a str,
    header: Vec<&'a str>,
    rows: Vec<Vec<String>>,
    widths: Vec<Constraint>,
) -> Table<'a> {
    let empty = rows.is_empty();
    let mut rows: Vec<Row> = rows.into_iter().map(Row::new).collect();
    if empty {
        rows.push(Row::new(vec!["No records".to_string()]));
    }
    Table::new(rows, widths)
        .header(Row::new(header).bold())
        .block(Block::bordered().title(title))
}

pub(crate) fn owner_only_notice(frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new("Only the contract owner can use this page.")
            .block(Block::bordered().title("Owner only"))
            .red(),
        area,
    );
}

pub(crate) fn connect_notice(frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new("No wallet connected. Set PRIVATE_KEY to sign transactions.")
            .block(Block::bordered())
            .yellow(),
        area,
    );
}
