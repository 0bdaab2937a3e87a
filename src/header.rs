//! Header cells of the table.
//!
//! The header is derived from the column descriptors and the current sort
//! state on every frame. It holds no state of its own, activating a cell only
//! produces a [`Message::SortRequested`] for the model to apply.

use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Cell, Row},
};

use crate::domain::Message;
use crate::record::{ColumnDescriptor, Field};
use crate::view_state::SortDirection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub id: Field,
    pub label: String,
    pub numeric: bool,
    pub padded: bool,
    /// Set only on the column the table is sorted by.
    pub sort: Option<SortDirection>,
}

impl HeaderCell {
    pub fn is_active(&self) -> bool {
        self.sort.is_some()
    }

    pub fn activate(&self) -> Message {
        Message::SortRequested(self.id)
    }

    pub fn text(&self) -> String {
        let label = match self.sort {
            Some(direction) => format!("{} {}", self.label, direction.arrow()),
            None => self.label.clone(),
        };
        pad(label, self.padded)
    }
}

pub fn header_cells(
    columns: &[ColumnDescriptor],
    sort_key: Field,
    sort_direction: SortDirection,
) -> Vec<HeaderCell> {
    columns
        .iter()
        .map(|column| HeaderCell {
            id: column.id,
            label: column.label.clone(),
            numeric: column.numeric,
            padded: !column.disable_padding,
            sort: (column.id == sort_key).then_some(sort_direction),
        })
        .collect()
}

/// Build the ratatui header row. `focused` is the column the keyboard is on.
pub fn header_row(cells: &[HeaderCell], focused: usize) -> Row<'static> {
    Row::new(cells.iter().enumerate().map(|(idx, cell)| {
        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if cell.is_active() {
            style = style.fg(Color::Yellow);
        }
        if idx == focused {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        Cell::from(aligned(cell.text(), cell.numeric)).style(style)
    }))
}

pub fn pad(text: String, padded: bool) -> String {
    if padded { format!(" {text} ") } else { text }
}

pub fn aligned(text: String, numeric: bool) -> Line<'static> {
    let alignment = if numeric {
        Alignment::Right
    } else {
        Alignment::Left
    };
    Line::from(text).alignment(alignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::service_columns;

    #[test]
    fn only_sorted_column_is_active() {
        let cells = header_cells(&service_columns(), Field::Port, SortDirection::Descending);
        let active: Vec<&HeaderCell> = cells.iter().filter(|c| c.is_active()).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, Field::Port);
        assert_eq!(active[0].sort, Some(SortDirection::Descending));
        assert_eq!(active[0].text(), " Port ▼ ");
    }

    #[test]
    fn no_active_cell_for_unlisted_sort_key() {
        let columns: Vec<ColumnDescriptor> = service_columns()
            .into_iter()
            .filter(|c| c.id != Field::Udp)
            .collect();
        let cells = header_cells(&columns, Field::Udp, SortDirection::Ascending);
        assert!(cells.iter().all(|c| !c.is_active()));
    }

    #[test]
    fn activating_a_cell_requests_sort_by_its_id() {
        let cells = header_cells(&service_columns(), Field::Id, SortDirection::Ascending);
        for cell in &cells {
            assert_eq!(cell.activate(), Message::SortRequested(cell.id));
        }
    }

    #[test]
    fn unpadded_columns_keep_bare_label() {
        let cells = header_cells(&service_columns(), Field::Id, SortDirection::Ascending);
        assert_eq!(cells[0].text(), "ID ▲");
        assert_eq!(cells[1].text(), " Service Definition ");
    }

    #[test]
    fn numeric_cells_align_right() {
        assert_eq!(aligned("80".into(), true).alignment, Some(Alignment::Right));
        assert_eq!(aligned("x".into(), false).alignment, Some(Alignment::Left));
    }
}
