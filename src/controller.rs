use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind,
};

use crate::domain::{CMDMode, Message, TableConfig, TableError};
use crate::model::Model;
use crate::ui::TableUI;

/// Maps terminal events to messages.
///
/// Page messages are only produced for pages that exist, the model itself
/// does not validate them.
pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TableConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model, ui: &TableUI) -> Result<Option<Message>, TableError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        let message = match event::read()? {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                self.handle_key(key, model)
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse, model, ui),
            _ => None,
        };
        Ok(message)
    }

    // A left click on a header cell activates it, all other mouse input is ignored.
    fn handle_mouse(&self, mouse: MouseEvent, model: &Model, ui: &TableUI) -> Option<Message> {
        if model.raw_keyevents() || model.show_popup() {
            return None;
        }
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return None;
        }
        let message = ui
            .header_cell_at(mouse.column, mouse.row)
            .and_then(|idx| model.header_cells().get(idx).map(|cell| cell.activate()));
        trace!("Mapped: {mouse:?} => {message:?}");
        message
    }

    fn handle_key(&self, key: KeyEvent, model: &Model) -> Option<Message> {
        if model.raw_keyevents() {
            return Some(Message::RawKey(key));
        }

        let state = model.state();
        let nrecords = model.records().len();
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::FocusPreviousColumn),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::FocusNextColumn),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Enter | KeyCode::Char('s') => model
                .header_cells()
                .get(model.focused_column())
                .map(|cell| cell.activate()),
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                model.header_cells().get(idx).map(|cell| cell.activate())
            }
            KeyCode::Char('n') | KeyCode::PageDown => state
                .has_next_page(nrecords)
                .then(|| Message::ChangePage(state.page_index + 1)),
            KeyCode::Char('p') | KeyCode::PageUp => state
                .page_index
                .checked_sub(1)
                .map(Message::ChangePage),
            KeyCode::Home => (state.page_index != 0).then_some(Message::ChangePage(0)),
            KeyCode::End => state
                .page_count(nrecords)
                .checked_sub(1)
                .filter(|&last| last != state.page_index)
                .map(Message::ChangePage),
            KeyCode::Char('r') => Self::next_page_size(model).map(Message::ChangePageSize),
            KeyCode::Char('R') => Some(Message::EnterCommand(CMDMode::PageSize)),
            KeyCode::Char('g') => Some(Message::EnterCommand(CMDMode::GotoPage)),
            KeyCode::Char('y') => Some(Message::CopyRow),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    // Cycle through the configured options, starting over after the largest one.
    fn next_page_size(model: &Model) -> Option<NonZeroUsize> {
        let current = model.state().page_size;
        let options = model.page_size_options();
        options
            .iter()
            .find(|&&size| size > current)
            .or_else(|| options.first())
            .copied()
    }
}
