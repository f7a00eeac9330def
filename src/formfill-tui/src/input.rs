//! Instruction editor and key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use unicode_width::UnicodeWidthStr;

/// Instructions loaded by `F1`..`F3`.
pub const PRESETS: [&str; 3] = ["資料Aを入力して", "資料Bを入力して", "資料Cを入力して"];

/// An edit to the instruction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Insert(char),
    InsertStr(String),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Clear,
}

/// What a key press asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Edit(EditOp),
    Run,
    Stop,
    /// Load [`PRESETS`] entry `n`.
    Preset(usize),
    Reset,
    Quit,
}

/// Map a key event to an action.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let action = match key.code {
        KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('r') if ctrl => Action::Reset,
        KeyCode::Char('u') if ctrl => Action::Edit(EditOp::Clear),
        KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => return None,
        KeyCode::Char(c) => Action::Edit(EditOp::Insert(c)),
        KeyCode::Enter => Action::Run,
        KeyCode::Esc => Action::Stop,
        KeyCode::F(n @ 1..=3) => Action::Preset(usize::from(n - 1)),
        KeyCode::Backspace => Action::Edit(EditOp::Backspace),
        KeyCode::Delete => Action::Edit(EditOp::Delete),
        KeyCode::Left => Action::Edit(EditOp::Left),
        KeyCode::Right => Action::Edit(EditOp::Right),
        KeyCode::Home => Action::Edit(EditOp::Home),
        KeyCode::End => Action::Edit(EditOp::End),
        _ => return None,
    };
    Some(action)
}

/// Single-line text input with a cursor.
///
/// The cursor is a byte offset that always sits on a character boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionInput {
    text: String,
    cursor: usize,
}

impl InstructionInput {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace the whole text, cursor at the end.
    pub fn set(&mut self, text: impl Into<String>) {
        *self = Self::new(text);
    }

    /// Display width of the text left of the cursor.
    pub fn cursor_column(&self) -> usize {
        self.text[..self.cursor].width()
    }

    pub fn apply(&mut self, op: EditOp) {
        match op {
            EditOp::Insert(c) => {
                self.text.insert(self.cursor, c);
                self.cursor += c.len_utf8();
            }
            EditOp::InsertStr(s) => {
                // pasted newlines would end up invisible on a single line
                let s: String = s.chars().filter(|c| !c.is_control()).collect();
                self.text.insert_str(self.cursor, &s);
                self.cursor += s.len();
            }
            EditOp::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.text.replace_range(prev..self.cursor, "");
                    self.cursor = prev;
                }
            }
            EditOp::Delete => {
                if let Some(next) = self.next_boundary() {
                    self.text.replace_range(self.cursor..next, "");
                }
            }
            EditOp::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor = prev;
                }
            }
            EditOp::Right => {
                if let Some(next) = self.next_boundary() {
                    self.cursor = next;
                }
            }
            EditOp::Home => self.cursor = 0,
            EditOp::End => self.cursor = self.text.len(),
            EditOp::Clear => self.set(String::new()),
        }
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }
}
