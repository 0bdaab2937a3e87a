use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

const MAX_DIGITS: usize = 9;

/// Single line input that only accepts digits.
#[derive(Default)]
pub struct Inputter {
    digits: String,
    curser_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
}

impl InputResult {
    pub fn value(&self) -> Option<usize> {
        self.input.parse().ok()
    }
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.enter(),
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Char(chr), KeyModifiers::NONE | KeyModifiers::SHIFT) => self.digit(chr),
            (kc, km) => {
                trace!("Ignoring {kc:?} {km:?} in numeric input");
                self.get()
            }
        }
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.digits.clone(),
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.digits.clear();
        self.curser_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    // Deletes the digit left of the curser
    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.digits.remove(self.curser_pos - 1);
            self.curser_pos -= 1;
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.digits.len() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn digit(&mut self, chr: char) -> InputResult {
        if chr.is_ascii_digit() && self.digits.len() < MAX_DIGITS {
            self.digits.insert(self.curser_pos, chr);
            self.curser_pos += 1;
        }
        self.get()
    }
}
