use crossterm::event::{KeyCode, KeyEvent};
use presale_core::binding::TxResult;
use presale_core::format::format_hash;
use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};

pub enum FieldKind {
    Text,
    Choice(Vec<String>),
}

pub struct Field {
    pub label: &'static str,
    pub kind: FieldKind,
    value: String,
    selected: usize,
}

impl Field {
    pub fn text(label: &'static str) -> Self {
        Self {
            label,
            kind: FieldKind::Text,
            value: String::new(),
            selected: 0,
        }
    }

    pub fn choice<S: Into<String>>(label: &'static str, options: impl IntoIterator<Item = S>) -> Self {
        Self {
            label,
            kind: FieldKind::Choice(options.into_iter().map(Into::into).collect()),
            value: String::new(),
            selected: 0,
        }
    }

    fn display(&self) -> String {
        match &self.kind {
            FieldKind::Text => self.value.clone(),
            FieldKind::Choice(options) => format!(
                "< {} >",
                options.get(self.selected).map(String::as_str).unwrap_or("")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Pending(String),
    Done(String),
    Failed(String),
}

/// Labelled inputs with one focused field. Enter submits.
pub struct Form {
    fields: Vec<Field>,
    focus: usize,
    pub status: Option<Status>,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            focus: 0,
            status: None,
        }
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields
            .get(idx)
            .map(|f| f.value.trim())
            .unwrap_or_default()
    }

    pub fn choice(&self, idx: usize) -> usize {
        self.fields.get(idx).map(|f| f.selected).unwrap_or_default()
    }

    pub fn set_value(&mut self, idx: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(idx) {
            field.value = value.into();
        }
    }

    /// Returns true when the user submits.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let count = self.fields.len();
        if count == 0 {
            return key.code == KeyCode::Enter;
        }
        let field = &mut self.fields[self.focus];
        match key.code {
            KeyCode::Enter => return true,
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % count,
            KeyCode::BackTab | KeyCode::Up => self.focus = (self.focus + count - 1) % count,
            KeyCode::Left | KeyCode::Right => {
                if let FieldKind::Choice(options) = &field.kind {
                    let n = options.len().max(1);
                    field.selected = if key.code == KeyCode::Right {
                        (field.selected + 1) % n
                    } else {
                        (field.selected + n - 1) % n
                    };
                }
            }
            KeyCode::Backspace => {
                field.value.pop();
            }
            KeyCode::Char(c) => {
                if matches!(field.kind, FieldKind::Text) {
                    field.value.push(c);
                }
            }
            _ => {}
        }
        false
    }

    /// Clears text inputs. Choices keep their selection.
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.focus = 0;
    }

    pub fn submitted(&mut self, what: &str) {
        self.status = Some(Status::Pending(format!("{what}: waiting for confirmation...")));
    }

    pub fn rejected(&mut self, message: impl Into<String>) {
        self.status = Some(Status::Failed(message.into()));
    }

    /// Resets after a submit and shows the hash or failure text.
    pub fn finish(&mut self, result: &TxResult) {
        self.status = Some(match result {
            Ok(Some(receipt)) => {
                Status::Done(format!("Confirmed: {}", format_hash(receipt.transaction_hash)))
            }
            Ok(None) => Status::Failed("Not sent".to_string()),
            Err(err) => Status::Failed(err.message.clone()),
        });
        self.reset();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, title: &str, focused: bool) {
        let mut lines: Vec<Line> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let active = focused && i == self.focus;
                let marker = if active { "> " } else { "  " };
                let value = if active && matches!(field.kind, FieldKind::Text) {
                    format!("{}_", field.display())
                } else {
                    field.display()
                };
                let style = if active {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{marker}{:<16}", field.label), style),
                    Span::raw(value),
                ])
            })
            .collect();

        lines.push(Line::from(""));
        lines.push(Line::from("[Enter] submit  [Tab] next field  [←/→] change option".dark_gray()));
        if let Some(status) = &self.status {
            lines.push(match status {
                Status::Pending(s) => Line::from(s.as_str().yellow()),
                Status::Done(s) => Line::from(s.as_str().green()),
                Status::Failed(s) => Line::from(s.as_str().red()),
            });
        }

        let block = if focused {
            Block::bordered().title(title.to_string()).yellow()
        } else {
            Block::bordered().title(title.to_string())
        };
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn form() -> Form {
        Form::new(vec![
            Field::choice("Pay with", ["ETH", "USDT", "USDC"]),
            Field::text("Amount"),
        ])
    }

    #[test]
    fn typing_goes_to_the_focused_text_field() {
        let mut form = form();
        form.handle_key(key(KeyCode::Char('1')));
        assert_eq!(form.value(0), "");

        form.handle_key(key(KeyCode::Tab));
        for c in "0.5x".chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
        form.handle_key(key(KeyCode::Backspace));
        assert_eq!(form.value(1), "0.5");
        assert!(form.handle_key(key(KeyCode::Enter)));
    }

    #[test]
    fn choices_wrap_around() {
        let mut form = form();
        form.handle_key(key(KeyCode::Left));
        assert_eq!(form.choice(0), 2);
        form.handle_key(key(KeyCode::Right));
        assert_eq!(form.choice(0), 0);
    }

    #[test]
    fn finish_resets_inputs() {
        let mut form = form();
        form.set_value(1, "12");
        form.finish(&Ok(None));
        assert_eq!(form.value(1), "");
        assert_eq!(form.status, Some(Status::Failed("Not sent".into())));
    }
}
