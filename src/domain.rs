use std::fmt;
use std::io::Error;
use std::num::NonZeroUsize;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

use crate::record::Field;
use crate::view_state::SortDirection;

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(5).unwrap();
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [5, 10, 25];

pub const HELP_TEXT: &str = "\
Sorting
  ←/→ h/l     focus previous/next column
  Enter s     sort by focused column
  1-9         sort by column N
  click       sort by clicked header
Paging
  n PageDown  next page
  p PageUp    previous page
  Home/End    first/last page
  g           go to page
  r           cycle rows per page
  R           set rows per page
Rows
  ↑/↓ k/j     move row cursor
  y           copy row as CSV
Other
  ?           this help
  Esc         close popup / cancel input
  q           quit";

#[derive(Debug)]
pub enum TableError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    UnknownField(String),
    MissingField(Field),
    InvalidValue { field: Field, value: String },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::IoError(e) => write!(f, "io error: {e}"),
            TableError::PolarsError(e) => write!(f, "polars error: {e}"),
            TableError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            TableError::FileNotFound => f.write_str("file not found"),
            TableError::PermissionDenied => f.write_str("permission denied"),
            TableError::UnknownFileType => f.write_str("unknown file type"),
            TableError::UnknownField(name) => write!(f, "unknown field \"{name}\""),
            TableError::MissingField(field) => write!(f, "missing column \"{field}\""),
            TableError::InvalidValue { field, value } => {
                write!(f, "invalid value \"{value}\" for {field}")
            }
        }
    }
}

impl std::error::Error for TableError {}

impl From<Error> for TableError {
    fn from(err: Error) -> Self {
        TableError::IoError(err)
    }
}

impl From<PolarsError> for TableError {
    fn from(err: PolarsError) -> Self {
        TableError::PolarsError(err)
    }
}

/// What the numeric command line is currently asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CMDMode {
    GotoPage,
    PageSize,
}

impl CMDMode {
    pub fn prompt(&self) -> &'static str {
        match self {
            CMDMode::GotoPage => "Go to page: ",
            CMDMode::PageSize => "Rows per page: ",
        }
    }
}

/// Every change to the model goes through one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Help,
    Exit,
    SortRequested(Field),
    ChangePage(usize),
    ChangePageSize(NonZeroUsize),
    FocusPreviousColumn,
    FocusNextColumn,
    MoveUp,
    MoveDown,
    CopyRow,
    EnterCommand(CMDMode),
    RawKey(KeyEvent),
}

#[derive(Debug, Clone, Setters)]
pub struct TableConfig {
    pub event_poll_time: u64,
    pub page_size: NonZeroUsize,
    pub page_size_options: Vec<NonZeroUsize>,
    pub sort_key: Field,
    pub sort_direction: SortDirection,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: PAGE_SIZE_OPTIONS
                .iter()
                .filter_map(|&n| NonZeroUsize::new(n))
                .collect(),
            sort_key: Field::ServiceDefinition,
            sort_direction: SortDirection::Ascending,
        }
    }
}
