use std::num::NonZeroUsize;

use crate::record::{Field, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Sort and pagination state of the table.
///
/// The state is a plain value. Every user action produces a new state through
/// one of the reducers below, nothing is changed in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub sort_key: Field,
    pub sort_direction: SortDirection,
    pub page_index: usize,
    pub page_size: NonZeroUsize,
}

impl ViewState {
    pub fn new(sort_key: Field, sort_direction: SortDirection, page_size: NonZeroUsize) -> Self {
        Self {
            sort_key,
            sort_direction,
            page_index: 0,
            page_size,
        }
    }

    /// Same key flips the direction, a new key starts descending.
    pub fn request_sort(self, key: Field) -> Self {
        let sort_direction = if key == self.sort_key {
            self.sort_direction.toggled()
        } else {
            SortDirection::Descending
        };
        Self {
            sort_key: key,
            sort_direction,
            ..self
        }
    }

    // No bounds check here, the pager only offers existing pages.
    pub fn change_page(self, page_index: usize) -> Self {
        Self { page_index, ..self }
    }

    // Keeps the page index even if it is now past the end.
    pub fn change_page_size(self, page_size: NonZeroUsize) -> Self {
        Self { page_size, ..self }
    }

    pub fn first_row(&self) -> usize {
        self.page_index.saturating_mul(self.page_size.get())
    }

    pub fn page_count(&self, nrecords: usize) -> usize {
        nrecords.div_ceil(self.page_size.get())
    }

    pub fn has_next_page(&self, nrecords: usize) -> bool {
        self.page_index + 1 < self.page_count(nrecords)
    }

    pub fn visible_rows<'a>(&self, records: &'a [Record]) -> VisibleRows<'a> {
        let sorted = sort(records, self.sort_key, self.sort_direction);
        let rows = paginate(&sorted, self.page_index, self.page_size).to_vec();
        let filler = filler_rows(rows.len(), self.page_size);
        VisibleRows {
            rows,
            filler,
            first_row: self.first_row(),
            total: records.len(),
        }
    }
}

/// The records of the current page and how many blank rows pad it.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRows<'a> {
    pub rows: Vec<&'a Record>,
    pub filler: usize,
    pub first_row: usize,
    pub total: usize,
}

/// Sort a working copy of `records`. Ties keep no particular order.
pub fn sort<'a>(records: &'a [Record], key: Field, direction: SortDirection) -> Vec<&'a Record> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    match direction {
        SortDirection::Ascending => sorted.sort_unstable_by(|a, b| a.compare_by(b, key)),
        SortDirection::Descending => sorted.sort_unstable_by(|a, b| b.compare_by(a, key)),
    }
    sorted
}

/// Slice `[page_index * page_size, page_index * page_size + page_size)`, clamped to `rows`.
pub fn paginate<T>(rows: &[T], page_index: usize, page_size: NonZeroUsize) -> &[T] {
    let begin = std::cmp::min(page_index.saturating_mul(page_size.get()), rows.len());
    let end = std::cmp::min(begin.saturating_add(page_size.get()), rows.len());
    &rows[begin..end]
}

pub fn filler_rows(shown: usize, page_size: NonZeroUsize) -> usize {
    page_size.get().saturating_sub(shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn service(id: u32, name: &str) -> Record {
        Record::new()
            .with(Field::Id, Value::Number(id as f64))
            .with(Field::ServiceDefinition, Value::Text(name.to_string()))
            .with(Field::Port, Value::Number(8000.0 + id as f64))
    }

    fn services(n: u32) -> Vec<Record> {
        (0..n).map(|i| service(i, &format!("svc-{i:02}"))).collect()
    }

    fn names(rows: &[&Record]) -> Vec<String> {
        rows.iter()
            .map(|r| r.service_definition().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn request_sort_toggles_same_key() {
        let state = ViewState::new(Field::ServiceDefinition, SortDirection::Ascending, size(5));
        let once = state.request_sort(Field::ServiceDefinition);
        assert_eq!(once.sort_direction, SortDirection::Descending);
        let twice = once.request_sort(Field::ServiceDefinition);
        assert_eq!(twice.sort_direction, SortDirection::Ascending);
        assert_eq!(twice.sort_key, Field::ServiceDefinition);
    }

    #[test]
    fn request_sort_new_key_starts_descending() {
        let state = ViewState::new(Field::ServiceDefinition, SortDirection::Ascending, size(5));
        let state = state.request_sort(Field::Port);
        assert_eq!(state.sort_key, Field::Port);
        assert_eq!(state.sort_direction, SortDirection::Descending);

        let state = state.request_sort(Field::Id);
        assert_eq!(state.sort_direction, SortDirection::Descending);
    }

    #[test]
    fn reducers_return_new_states() {
        let state = ViewState::new(Field::Id, SortDirection::Ascending, size(5));
        let _ = state.change_page(3).change_page_size(size(10)).request_sort(Field::Port);
        assert_eq!(state, ViewState::new(Field::Id, SortDirection::Ascending, size(5)));
    }

    #[test]
    fn change_page_size_keeps_page_index() {
        let state = ViewState::new(Field::Id, SortDirection::Ascending, size(5)).change_page(3);
        let state = state.change_page_size(size(25));
        assert_eq!(state.page_index, 3);
        assert_eq!(state.page_size.get(), 25);
        // 10 records no longer reach page 3
        assert!(state.visible_rows(&services(10)).rows.is_empty());
    }

    #[test]
    fn change_page_does_not_validate() {
        let state = ViewState::new(Field::Id, SortDirection::Ascending, size(5)).change_page(99);
        assert_eq!(state.page_index, 99);
        let records = services(3);
        let visible = state.visible_rows(&records);
        assert!(visible.rows.is_empty());
        assert_eq!(visible.filler, 5);
    }

    #[test]
    fn sort_by_service_definition_ascending() {
        let records = vec![service(1, "b"), service(2, "a")];
        let sorted = sort(&records, Field::ServiceDefinition, SortDirection::Ascending);
        assert_eq!(names(&sorted), vec!["a", "b"]);
        // the input order is untouched
        assert_eq!(records[0].service_definition(), Some("b"));
    }

    #[test]
    fn descending_is_ascending_reversed_for_unique_keys() {
        let records: Vec<Record> = [7, 3, 9, 1, 4]
            .into_iter()
            .map(|i| service(i, &format!("svc-{i}")))
            .collect();
        for key in [Field::Id, Field::ServiceDefinition, Field::Port] {
            let mut ascending = sort(&records, key, SortDirection::Ascending);
            ascending.reverse();
            assert_eq!(ascending, sort(&records, key, SortDirection::Descending));
        }
    }

    #[test]
    fn sorting_sorted_rows_is_idempotent() {
        let records = services(12);
        let once: Vec<Record> = sort(&records, Field::Port, SortDirection::Descending)
            .into_iter()
            .cloned()
            .collect();
        let twice = sort(&once, Field::Port, SortDirection::Descending);
        assert_eq!(twice, once.iter().collect::<Vec<_>>());
    }

    #[test]
    fn nan_ports_keep_the_sort_ordered() {
        // Every 7th port is NaN, enough rows to leave the small-slice sort path.
        let records: Vec<Record> = (0..200u32)
            .map(|i| {
                let port = if i % 7 == 0 { f64::NAN } else { ((i * 37) % 101) as f64 };
                service(i, &format!("svc-{i:03}")).with(Field::Port, Value::Number(port))
            })
            .collect();

        let ascending = sort(&records, Field::Port, SortDirection::Ascending);
        assert_eq!(ascending.len(), records.len());
        assert!(
            ascending
                .windows(2)
                .all(|w| w[0].compare_by(w[1], Field::Port).is_le())
        );
        let first_nan = ascending
            .iter()
            .position(|r| matches!(r.get(Field::Port), Some(Value::Number(n)) if n.is_nan()))
            .unwrap();
        assert_eq!(first_nan, records.len() - records.len().div_ceil(7));

        let descending = sort(&records, Field::Port, SortDirection::Descending);
        assert!(
            descending
                .windows(2)
                .all(|w| w[0].compare_by(w[1], Field::Port).is_ge())
        );
    }

    #[test]
    fn pages_concatenate_to_sorted_rows() {
        let records = services(13);
        let sorted = sort(&records, Field::ServiceDefinition, SortDirection::Ascending);
        let page_size = size(5);
        let state = ViewState::new(Field::ServiceDefinition, SortDirection::Ascending, page_size);

        let pages = state.page_count(records.len());
        assert_eq!(pages, 3);
        let mut all = Vec::new();
        for page in 0..pages {
            let visible = state.change_page(page).visible_rows(&records);
            all.extend(visible.rows);
        }
        assert_eq!(all, sorted);
        assert_eq!(all.len(), records.len());
    }

    #[test]
    fn partial_single_page_gets_filler_rows() {
        let state = ViewState::new(Field::Id, SortDirection::Ascending, size(5));
        let records = services(3);
        let visible = state.visible_rows(&records);
        assert_eq!(visible.rows.len(), 3);
        assert_eq!(visible.filler, 2);
    }

    #[test]
    fn second_page_shows_remaining_rows() {
        let records = services(7);
        let state = ViewState::new(Field::Id, SortDirection::Ascending, size(5)).change_page(1);
        let visible = state.visible_rows(&records);
        assert_eq!(names(&visible.rows), vec!["svc-05", "svc-06"]);
        assert_eq!(visible.filler, 3);
        assert_eq!(visible.first_row, 5);
        assert_eq!(visible.total, 7);
    }

    #[test]
    fn paginate_clamps_to_bounds() {
        let rows = [1, 2, 3, 4, 5, 6, 7];
        assert_eq!(paginate(&rows, 0, size(3)), &[1, 2, 3]);
        assert_eq!(paginate(&rows, 2, size(3)), &[7]);
        assert!(paginate(&rows, 3, size(3)).is_empty());
        assert!(paginate(&rows, usize::MAX, size(3)).is_empty());
    }

    #[test]
    fn next_page_availability() {
        let state = ViewState::new(Field::Id, SortDirection::Ascending, size(5));
        assert!(state.has_next_page(7));
        assert!(!state.change_page(1).has_next_page(7));
        assert!(!state.has_next_page(5));
        assert_eq!(state.page_count(0), 0);
    }
}
