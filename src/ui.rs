use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use crate::domain::HELP_TEXT;
use crate::header::{HeaderCell, aligned, header_row, pad};
use crate::model::Model;
use crate::record::Record;
use crate::view_state::VisibleRows;

pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const CMDLINE_HEIGH: u16 = 1;
pub const PAGER_HEIGHT: u16 = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 2;
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub struct TableUI {
    // Where each header cell was drawn in the last frame.
    header_areas: Vec<Rect>,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the header cell drawn at the given terminal position.
    pub fn header_cell_at(&self, column: u16, row: u16) -> Option<usize> {
        self.header_areas
            .iter()
            .position(|area| area.contains(Position::new(column, row)))
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let title = Line::from(Span::from(format!(" {} ", model.name())).bold());
        let instructions = Line::from(vec![
            " Sort ".into(),
            "<Enter>".blue().bold(),
            " Page ".into(),
            "<n/p>".blue().bold(),
            " Rows ".into(),
            "<r>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);
        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());

        let [table_area, pager_area, status_area] = Layout::vertical([
            Constraint::Min(TABLE_HEADER_HEIGHT),
            Constraint::Length(PAGER_HEIGHT),
            Constraint::Length(CMDLINE_HEIGH),
        ])
        .areas(inner);

        let visible = model.visible_rows();
        let cells = model.header_cells();
        self.draw_table(model, &cells, &visible, frame, table_area);
        self.draw_pager(model, &visible, frame, pager_area);
        self.draw_statusline(model, &cells, frame, status_area);

        if model.show_popup() {
            self.draw_popup(frame, inner);
        }
    }

    fn draw_table(
        &mut self,
        model: &Model,
        cells: &[HeaderCell],
        visible: &VisibleRows,
        frame: &mut Frame,
        area: Rect,
    ) {
        let columns = model.columns();
        let widths = column_widths(model.records(), cells);
        // Same split the table does for its columns.
        let header_area = Rect {
            height: TABLE_HEADER_HEIGHT.min(area.height),
            ..area
        };
        self.header_areas = Layout::horizontal(widths.clone())
            .flex(Flex::Start)
            .spacing(1)
            .split(header_area)
            .to_vec();

        let mut rows: Vec<Row> = visible
            .rows
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let row = Row::new(columns.iter().map(|c| {
                    Cell::from(aligned(
                        pad(record.display(c.id), !c.disable_padding),
                        c.numeric,
                    ))
                }));
                if idx == model.curser_row() {
                    row.style(Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    row
                }
            })
            .collect();
        // Blank rows keep the table height the same on the last page.
        rows.extend(std::iter::repeat_n(Row::default(), visible.filler));

        let table = Table::new(rows, widths)
            .header(header_row(cells, model.focused_column()))
            .column_spacing(1)
            .flex(Flex::Start);
        frame.render_widget(table, area);
    }

    fn draw_pager(&self, model: &Model, visible: &VisibleRows, frame: &mut Frame, area: Rect) {
        let state = model.state();
        let (first, last) = if visible.rows.is_empty() {
            (0, 0)
        } else {
            (visible.first_row + 1, visible.first_row + visible.rows.len())
        };
        let has_previous = state.page_index > 0;
        let has_next = state.has_next_page(visible.total);

        let arrow = |symbol: &'static str, enabled: bool| {
            if enabled {
                Span::from(symbol).bold()
            } else {
                Span::from(symbol).dim()
            }
        };
        let line = Line::from(vec![
            Span::from(format!("Rows per page: {}   ", state.page_size)),
            Span::from(format!("{first}-{last} of {}   ", visible.total)),
            arrow("‹", has_previous),
            Span::from(" "),
            arrow("›", has_next),
            Span::from(" "),
        ]);
        frame.render_widget(Paragraph::new(line).right_aligned(), area);
    }

    fn draw_statusline(&self, model: &Model, cells: &[HeaderCell], frame: &mut Frame, area: Rect) {
        if let Some(mode) = model.cmd_mode() {
            let input = model.cmd_input();
            let prompt = mode.prompt();
            let line = Line::from(vec![prompt.yellow(), input.input.clone().into()]);
            frame.render_widget(Paragraph::new(line), area);
            let x = area.x + (prompt.chars().count() + input.curser_pos) as u16;
            frame.set_cursor_position((x, area.y));
            return;
        }

        let message = if model.last_status_message_update().elapsed() < STATUS_MESSAGE_TIMEOUT {
            model.status_message().to_string()
        } else {
            String::new()
        };
        let hint = cells
            .get(model.focused_column())
            .map(|cell| format!("Sort by {} ", cell.label))
            .unwrap_or_default();
        let hint_width = hint.chars().count() as u16;
        let [message_area, hint_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(hint_width)]).areas(area);
        frame.render_widget(Paragraph::new(message), message_area);
        frame.render_widget(
            Paragraph::new(Line::from(Span::from(hint).dim())).right_aligned(),
            hint_area,
        );
    }

    fn draw_popup(&self, frame: &mut Frame, area: Rect) {
        let width = HELP_TEXT.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let height = HELP_TEXT.lines().count() as u16 + 2;
        let [area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);
        let [area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);

        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::ROUNDED);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(HELP_TEXT).block(block), area);
    }
}

/// Width of every column is the widest of its header and all of its values,
/// so the columns do not jump when the page changes.
fn column_widths(records: &[Record], cells: &[HeaderCell]) -> Vec<Constraint> {
    cells
        .iter()
        .map(|cell| {
            // room for the sort arrow on every header
            let header = cell.label.chars().count() + COLUMN_WIDTH_MARGIN;
            let values = records
                .iter()
                .map(|r| r.display(cell.id).chars().count())
                .max()
                .unwrap_or(0);
            let padding = if cell.padded { 2 } else { 0 };
            Constraint::Length((std::cmp::max(header, values) + padding) as u16)
        })
        .collect()
}
