use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use presale_core::binding::TxResult;
use presale_core::format::{format_amount, short_address, TOKEN_DECIMALS};
use presale_core::notify::{ToastBoard, ToastLevel};
use presale_core::PresaleService;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, Clear, List, ListState, Paragraph, Wrap},
    DefaultTerminal, Frame,
};
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
};
use tracing::{debug, info};

use crate::action::Action;
use crate::data::{self, PageData, View};
use crate::pages::{self, Page};
use crate::prompt::PendingSignature;

const TICK: Duration = Duration::from_millis(100);
const TOAST_SECONDS: i64 = 8;

pub enum AppEvent {
    Loaded(Box<PageData>),
    Finished { page: usize, result: TxResult },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Sidebar,
    Page,
}

pub struct App {
    service: Arc<PresaleService>,
    board: Arc<ToastBoard>,
    runtime: Handle,
    pages: Vec<Box<dyn Page>>,
    selected: usize,
    focus: Focus,
    data: PageData,
    loading: bool,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events: mpsc::UnboundedReceiver<AppEvent>,
    prompts: mpsc::UnboundedReceiver<PendingSignature>,
    pending: Option<PendingSignature>,
    refreshes: watch::Receiver<u64>,
    exit: bool,
}

impl App {
    pub fn new(
        service: Arc<PresaleService>,
        board: Arc<ToastBoard>,
        runtime: Handle,
        prompts: mpsc::UnboundedReceiver<PendingSignature>,
    ) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let pages = pages::all(service.config());
        let refreshes = service.subscribe();
        Self {
            service,
            board,
            runtime,
            pages,
            selected: 0,
            focus: Focus::Sidebar,
            data: PageData::default(),
            loading: false,
            events_tx,
            events,
            prompts,
            pending: None,
            refreshes,
            exit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.reload();
        while !self.exit {
            terminal.draw(|frame| self.draw(frame))?;
            self.drain();
            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        // decline anything still waiting so its task can finish
        if let Some(pending) = self.pending.take() {
            pending.answer(false);
        }
        Ok(())
    }

    fn reload(&mut self) {
        self.loading = true;
        let service = self.service.clone();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let data = data::load(&service).await;
            let _ = tx.send(AppEvent::Loaded(Box::new(data)));
        });
    }

    fn submit(&mut self, page: usize, action: Action) {
        debug!(?action, "submitting from {}", self.pages[page].title());
        self.pages[page].submitted(&action);
        let service = self.service.clone();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = action.run(&service).await;
            let _ = tx.send(AppEvent::Finished { page, result });
        });
    }

    fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                AppEvent::Loaded(data) => {
                    self.data = *data;
                    self.loading = false;
                }
                AppEvent::Finished { page, result } => {
                    if let Some(page) = self.pages.get_mut(page) {
                        page.finish(&result);
                    }
                }
            }
        }

        if self.pending.is_none() {
            if let Ok(pending) = self.prompts.try_recv() {
                self.pending = Some(pending);
            }
        }

        if self.refreshes.has_changed().unwrap_or(false) {
            let count = *self.refreshes.borrow_and_update();
            info!(count, "transaction confirmed, reloading");
            self.reload();
        }

        self.board.prune(Utc::now(), TOAST_SECONDS);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.exit = true;
            return;
        }

        if let Some(pending) = self.pending.take() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => pending.answer(true),
                KeyCode::Char('n') | KeyCode::Esc => pending.answer(false),
                _ => self.pending = Some(pending),
            }
            return;
        }

        match self.focus {
            Focus::Sidebar => match key.code {
                KeyCode::Char('q') => self.exit = true,
                KeyCode::Char('r') => self.reload(),
                KeyCode::Up | KeyCode::Char('k') => {
                    self.selected = (self.selected + self.pages.len() - 1) % self.pages.len();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.selected = (self.selected + 1) % self.pages.len();
                }
                KeyCode::Enter | KeyCode::Right | KeyCode::Tab => self.focus = Focus::Page,
                _ => {}
            },
            Focus::Page => {
                if key.code == KeyCode::Esc {
                    self.focus = Focus::Sidebar;
                    return;
                }
                let view = View {
                    config: self.service.config(),
                    data: &self.data,
                };
                let action = self.pages[self.selected].handle_key(key, &view);
                if let Some(action) = action {
                    self.submit(self.selected, action);
                }
            }
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(6),
        ])
        .areas(frame.area());
        let [sidebar, content] =
            Layout::horizontal([Constraint::Length(24), Constraint::Min(0)]).areas(body);

        self.draw_header(frame, header);
        self.draw_sidebar(frame, sidebar);

        let view = View {
            config: self.service.config(),
            data: &self.data,
        };
        self.pages[self.selected].render(frame, content, &view, self.focus == Focus::Page);

        self.draw_toasts(frame, footer);
        if let Some(pending) = &self.pending {
            draw_signature_modal(frame, pending);
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let config = self.service.config();
        let wallet = match self.data.account {
            Some(account) => short_address(account),
            None => "read-only".to_string(),
        };
        let mut text = format!(
            " {} presale | {} | {}",
            config.token.symbol, config.token.blockchain, wallet
        );
        if self.data.is_owner {
            text.push_str(" (owner)");
        }
        if self.loading {
            text.push_str(" | loading...");
        }
        frame.render_widget(Line::from(text).bold(), area);
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<Line> = self
            .pages
            .iter()
            .map(|page| {
                if page.owner_only() && !self.data.is_owner {
                    Line::from(page.title()).dark_gray()
                } else {
                    Line::from(page.title())
                }
            })
            .collect();
        let block = Block::bordered().title("Menu");
        let block = if self.focus == Focus::Sidebar {
            block.yellow()
        } else {
            block
        };
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).bold())
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_toasts(&self, frame: &mut Frame, area: Rect) {
        let mut toasts = self.board.snapshot();
        let skip = toasts.len().saturating_sub(4);
        let lines: Vec<Line> = toasts
            .drain(skip..)
            .map(|toast| {
                let line = Line::from(toast.message);
                match toast.level {
                    ToastLevel::Pending | ToastLevel::Info => line.yellow(),
                    ToastLevel::Approved => line.cyan(),
                    ToastLevel::Success => line.green(),
                    ToastLevel::Rejected => line.magenta(),
                    ToastLevel::Failed => line.red(),
                }
            })
            .collect();
        let help = "[↑/↓] page  [Enter] open  [Esc] menu  [r] reload  [q] quit";
        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::bordered().title("Notifications").title_bottom(help))
                .wrap(Wrap { trim: true }),
            area,
        );
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn draw_signature_modal(frame: &mut Frame, pending: &PendingSignature) {
    let request = &pending.request;
    let area = centered(frame.area(), 72, 11);
    let gas_limit = match request.gas.gas_limit {
        Some(limit) => limit.to_string(),
        None => "signer default".to_string(),
    };
    let lines = vec![
        Line::from(request.call.to_string()),
        Line::from(""),
        Line::from(format!("From       {:?}", request.from)),
        Line::from(format!("To         {:?}", request.to)),
        Line::from(format!(
            "Value      {} ETH",
            format_amount(request.call.value(), TOKEN_DECIMALS, 6)
        )),
        Line::from(format!(
            "Gas price  {} gwei",
            format_amount(request.gas.gas_price, 9, 2)
        )),
        Line::from(format!("Gas limit  {gas_limit}")),
        Line::from(""),
        Line::from("[y] sign   [n] reject").bold(),
    ];
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::bordered().title("Signature request").yellow())
            .wrap(Wrap { trim: false }),
        area,
    );
}
