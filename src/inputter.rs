use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single line editor behind the search box. Cursor positions count chars, not bytes.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    original_input: String,
    curser_pos: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    /// The text differs from what it was before this key.
    pub changed: bool,
    pub curser_pos: usize,
}

impl Inputter {
    /// Start editing `initial`. Cancelling restores it.
    pub fn begin(&mut self, initial: &str) -> InputResult {
        self.current_input = initial.to_string();
        self.original_input = initial.to_string();
        self.curser_pos = initial.chars().count();
        self.result(false, false, false)
    }

    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        let before = self.current_input.clone();
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => return self.result(true, false, false),
            (KeyCode::Esc, _) => return self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.curser_pos = self.curser_pos.saturating_sub(1),
            (KeyCode::Right, _) => {
                self.curser_pos = std::cmp::min(self.curser_pos + 1, self.len());
            }
            (KeyCode::Home, _) => self.curser_pos = 0,
            (KeyCode::End, _) => self.curser_pos = self.len(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.current_input.clear();
                self.curser_pos = 0;
            }
            (kc, km) if !km.contains(KeyModifiers::CONTROL) => self.key(kc),
            _ => {}
        }
        let changed = before != self.current_input;
        trace!("Search input '{}' (changed: {changed})", self.current_input);
        self.result(false, false, changed)
    }

    fn result(&self, finished: bool, canceled: bool, changed: bool) -> InputResult {
        InputResult {
            input: self.current_input.clone(),
            finished,
            canceled,
            changed,
            curser_pos: self.curser_pos,
        }
    }

    fn len(&self) -> usize {
        self.current_input.chars().count()
    }

    fn escape(&mut self) -> InputResult {
        let changed = self.current_input != self.original_input;
        self.current_input = self.original_input.clone();
        self.curser_pos = self.len();
        self.result(true, true, changed)
    }

    fn backspace(&mut self) {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            self.current_input.remove(self.getbytepos());
        }
    }

    fn delete(&mut self) {
        if self.curser_pos < self.len() {
            self.current_input.remove(self.getbytepos());
        }
    }

    fn key(&mut self, code: KeyCode) {
        if let Some(chr) = code.as_char() {
            self.current_input.insert(self.getbytepos(), chr);
            self.curser_pos += 1;
        }
    }

    fn getbytepos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
