use std::num::NonZeroUsize;
use std::time::Instant;

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace};

use crate::domain::{CMDMode, Message, TableConfig, TableError};
use crate::header::{HeaderCell, header_cells};
use crate::inputter::{InputResult, Inputter};
use crate::record::{ColumnDescriptor, Field, Record};
use crate::view_state::{ViewState, VisibleRows};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

pub struct Model {
    name: String,
    config: TableConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    records: Vec<Record>,
    columns: Vec<ColumnDescriptor>,
    state: ViewState,
    focused_column: usize,
    curser_row: usize,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(
        name: impl Into<String>,
        records: Vec<Record>,
        columns: Vec<ColumnDescriptor>,
        config: &TableConfig,
    ) -> Self {
        let state = ViewState::new(config.sort_key, config.sort_direction, config.page_size);
        let mut model = Self {
            name: name.into(),
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            records,
            columns,
            state,
            focused_column: 0,
            curser_row: 0,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        // Start with the keyboard on the sorted column if it is shown.
        if let Some(idx) = model.columns.iter().position(|c| c.id == state.sort_key) {
            model.focused_column = idx;
        }
        model.set_status_message(format!("Loaded {} records", model.records.len()));
        model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn page_size_options(&self) -> &[NonZeroUsize] {
        &self.config.page_size_options
    }

    pub fn header_cells(&self) -> Vec<HeaderCell> {
        header_cells(&self.columns, self.state.sort_key, self.state.sort_direction)
    }

    pub fn visible_rows(&self) -> VisibleRows<'_> {
        self.state.visible_rows(&self.records)
    }

    pub fn focused_column(&self) -> usize {
        self.focused_column
    }

    pub fn curser_row(&self) -> usize {
        self.curser_row
    }

    pub fn show_popup(&self) -> bool {
        self.modus == Modus::POPUP
    }

    pub fn cmd_mode(&self) -> Option<CMDMode> {
        self.cmd_mode
    }

    pub fn cmd_input(&self) -> &InputResult {
        &self.last_input
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TableError> {
        if let Some(msg) = message {
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::Help => self.show_help(),
                    Message::SortRequested(field) => self.request_sort(field),
                    Message::ChangePage(page_index) => self.change_page(page_index),
                    Message::ChangePageSize(page_size) => self.change_page_size(page_size),
                    Message::FocusPreviousColumn => {
                        self.focused_column = self.focused_column.saturating_sub(1)
                    }
                    Message::FocusNextColumn => {
                        if self.focused_column + 1 < self.columns.len() {
                            self.focused_column += 1;
                        }
                    }
                    Message::MoveUp => self.curser_row = self.curser_row.saturating_sub(1),
                    Message::MoveDown => {
                        if self.curser_row + 1 < self.visible_rows().rows.len() {
                            self.curser_row += 1;
                        }
                    }
                    Message::CopyRow => self.copy_row(),
                    Message::EnterCommand(mode) => self.enter_cmd_mode(mode),
                    Message::Exit | Message::RawKey(_) => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help => self.exit(),
                    _ => (),
                },
                Modus::CMDINPUT => {
                    if let Message::RawKey(key) = msg {
                        self.raw_input(key)
                    }
                }
            }
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn request_sort(&mut self, field: Field) {
        self.state = self.state.request_sort(field);
        info!(
            "Sort requested: {} {:?}",
            self.state.sort_key, self.state.sort_direction
        );
        if let Some(idx) = self.columns.iter().position(|c| c.id == field) {
            self.focused_column = idx;
        }
        self.set_status_message(format!(
            "Sorted by {} {}",
            field,
            self.state.sort_direction.arrow()
        ));
    }

    fn change_page(&mut self, page_index: usize) {
        self.state = self.state.change_page(page_index);
        info!("Page changed: {}", page_index);
        self.clamp_curser();
    }

    fn change_page_size(&mut self, page_size: NonZeroUsize) {
        self.state = self.state.change_page_size(page_size);
        info!("Page size changed: {}", page_size);
        self.clamp_curser();
        self.set_status_message(format!("{} rows per page", page_size));
    }

    fn clamp_curser(&mut self) {
        let shown = self.visible_rows().rows.len();
        self.curser_row = std::cmp::min(self.curser_row, shown.saturating_sub(1));
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn exit(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {:?} ...", mode);
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.input.clear();
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.handle_cmd_input();
        }
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {:?}", self.last_input);
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        let mode = self.cmd_mode.take();
        if self.last_input.canceled {
            return;
        }
        let Some(value) = self.last_input.value() else {
            self.set_status_message("Expected a number!");
            return;
        };

        match mode {
            Some(CMDMode::GotoPage) => {
                let pages = self.state.page_count(self.records.len());
                if (1..=pages).contains(&value) {
                    self.change_page(value - 1);
                } else {
                    self.set_status_message(format!("Page {value} does not exist (1-{pages})"));
                }
            }
            Some(CMDMode::PageSize) => match NonZeroUsize::new(value) {
                Some(page_size) => self.change_page_size(page_size),
                None => self.set_status_message("Rows per page must be at least 1!"),
            },
            None => debug!("Cmd mode is none!"),
        }
    }

    fn current_record(&self) -> Option<&Record> {
        self.visible_rows().rows.get(self.curser_row).copied()
    }

    fn copy_row(&mut self) {
        let Some(record) = self.current_record() else {
            return;
        };
        let key = record.service_definition().unwrap_or("row").to_string();
        let row_content = row_as_csv(record, &self.columns);
        trace!("Row content: {}", row_content);

        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(row_content)) {
            Ok(_) => self.set_status_message(format!("Copied {key} to clipboard.")),
            Err(e) => {
                trace!("Error copying to clipboard: {:?}", e);
                self.set_status_message("Clipboard not available!");
            }
        }
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping || needs_escaping {
        out = format!("\"{out}\"");
    }
    out
}

pub fn row_as_csv(record: &Record, columns: &[ColumnDescriptor]) -> String {
    columns
        .iter()
        .map(|c| wrap_cell_content(&record.display(c.id)))
        .collect::<Vec<String>>()
        .join(",")
}
