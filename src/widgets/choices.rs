//! Filterable, windowed choice list shared by the select prompts.

use crate::core::style::Style;
use crate::render::Printer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectChoice {
    pub value: String,
    pub label: String,
}

impl SelectChoice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl From<&str> for SelectChoice {
    fn from(value: &str) -> Self {
        Self::new(value, value)
    }
}

/// Highlighted row, filter text and the visible subset of a choice list.
#[derive(Debug, Clone)]
pub(crate) struct ChoiceList {
    entries: Vec<SelectChoice>,
    /// Original indexes of the entries matching `filter`.
    filtered: Vec<usize>,
    /// Position within `filtered`.
    current: Option<usize>,
    filter: String,
    display_count: usize,
    display_numbers: bool,
}

impl ChoiceList {
    pub(crate) fn new(entries: Vec<SelectChoice>, display_count: usize, display_numbers: bool) -> Self {
        let filtered = (0..entries.len()).collect();
        Self {
            entries,
            filtered,
            current: None,
            filter: String::new(),
            display_count: display_count.max(1),
            display_numbers,
        }
    }

    pub(crate) fn entries(&self) -> &[SelectChoice] {
        &self.entries
    }

    pub(crate) fn filter(&self) -> &str {
        &self.filter
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// Highlights the entry with original index `index`, if it is visible.
    pub(crate) fn highlight(&mut self, index: usize) {
        self.current = self.filtered.iter().position(|&entry| entry == index);
    }

    /// Original index of the highlighted entry.
    pub(crate) fn current(&self) -> Option<usize> {
        self.current.and_then(|pos| self.filtered.get(pos).copied())
    }

    pub(crate) fn move_up(&mut self) {
        let count = self.filtered.len();
        if count == 0 {
            return;
        }
        let pos = self.current.unwrap_or(0);
        self.current = Some((pos + count - 1) % count);
    }

    pub(crate) fn move_down(&mut self) {
        let count = self.filtered.len();
        if count == 0 {
            return;
        }
        self.current = Some(self.current.map_or(0, |pos| (pos + 1) % count));
    }

    /// Narrows the list to entries whose value or label contains `filter`, ignoring case.
    /// With numbers shown, a filter that parses as a 1-based number matches that entry too.
    pub(crate) fn set_filter(&mut self, filter: &str) {
        if filter == self.filter {
            return;
        }
        self.filter = filter.to_string();
        let needle = filter.to_lowercase();
        let number = if self.display_numbers {
            filter.parse::<usize>().ok()
        } else {
            None
        };
        self.filtered = self
            .entries
            .iter()
            .enumerate()
            .filter(|(index, entry)| {
                needle.is_empty()
                    || number == Some(index + 1)
                    || entry.value.to_lowercase().contains(&needle)
                    || entry.label.to_lowercase().contains(&needle)
            })
            .map(|(index, _)| index)
            .collect();

        self.current = match self.current {
            _ if self.filtered.is_empty() => None,
            Some(pos) if pos < self.filtered.len() => Some(pos),
            _ => Some(0),
        };
    }

    /// Prints the visible window, with `...` above or below when entries are hidden.
    ///
    /// `row` renders one entry: `(original index, label with match underlined, number prefix,
    /// highlighted)`.
    pub(crate) fn render<F>(&self, printer: &Printer, indent: &str, mut row: F)
    where
        F: FnMut(usize, &str, &str, bool),
    {
        let total = self.filtered.len();
        let selected = self.current.unwrap_or(0);
        let (start, end) = window(selected, self.display_count, total);
        let digits = self.entries.len().to_string().len();
        let style = printer.style();

        if start > 0 {
            printer.fprintln(format_args!("{indent}  ..."));
        }
        for (offset, &index) in self.filtered[start..end].iter().enumerate() {
            let entry = &self.entries[index];
            let label = underline_match(style, &entry.label, &self.filter);
            let number = if self.display_numbers {
                format!("{:>digits$}. ", index + 1)
            } else {
                String::new()
            };
            row(index, &label, &number, self.current == Some(start + offset));
        }
        if end < total {
            // Two-digit positions push the labels one column right.
            let pad = if end >= 10 { " " } else { "  " };
            printer.fprintln(format_args!("{indent}{pad}..."));
        }
    }
}

/// Range of `total` rows to show so that `selected` sits near the middle of `display` rows.
pub(crate) fn window(selected: usize, display: usize, total: usize) -> (usize, usize) {
    let half = display / 2;
    if selected < half {
        return (0, total.min(display));
    }
    let start = selected - half;
    let end = start + display;
    if end > total {
        (total.saturating_sub(display), total)
    } else {
        (start, end)
    }
}

/// Underlines the first case-insensitive occurrence of `filter` in `label`.
pub(crate) fn underline_match(style: &Style, label: &str, filter: &str) -> String {
    if filter.is_empty() {
        return label.to_string();
    }
    let lower = label.to_lowercase();
    // Lowercasing can change byte offsets (e.g. 'İ'); skip the underline rather than guess.
    if lower.len() != label.len() {
        return label.to_string();
    }
    let Some(start) = lower.find(&filter.to_lowercase()) else {
        return label.to_string();
    };
    let end = start + filter.to_lowercase().len();
    if !label.is_char_boundary(start) || !label.is_char_boundary(end) {
        return label.to_string();
    }
    format!(
        "{}{}{}",
        &label[..start],
        style.underline(&label[start..end]),
        &label[end..]
    )
}

#[cfg(test)]
mod tests {
    use super::{underline_match, window, ChoiceList, SelectChoice};
    use crate::core::style::Style;
    use pretty_assertions::assert_eq;

    fn colors() -> ChoiceList {
        ChoiceList::new(
            ["Red", "Green", "Blue"].into_iter().map(SelectChoice::from).collect(),
            6,
            false,
        )
    }

    #[test]
    fn arrows_wrap_around() {
        let mut list = colors();
        list.highlight(0);
        list.move_up();
        assert_eq!(list.current(), Some(2));
        list.move_down();
        assert_eq!(list.current(), Some(0));
    }

    #[test]
    fn filter_matches_value_or_label_ignoring_case() {
        let mut list = ChoiceList::new(
            vec![
                SelectChoice::new("eastus", "East US"),
                SelectChoice::new("westus", "West US"),
                SelectChoice::new("northeurope", "North Europe"),
            ],
            6,
            false,
        );
        list.highlight(2);
        list.set_filter("US");
        assert_eq!(list.filtered, vec![0, 1]);
        assert_eq!(list.current(), Some(0));

        list.set_filter("nothing");
        assert!(list.is_empty());
        assert_eq!(list.current(), None);
    }

    #[test]
    fn numeric_filter_selects_by_position_when_numbers_shown() {
        let mut list = ChoiceList::new(
            ["a", "b", "c"].into_iter().map(SelectChoice::from).collect(),
            6,
            true,
        );
        list.set_filter("2");
        assert_eq!(list.filtered, vec![1]);
    }

    #[test]
    fn window_keeps_selection_centred() {
        assert_eq!(window(0, 6, 3), (0, 3));
        assert_eq!(window(2, 6, 20), (0, 6));
        assert_eq!(window(10, 6, 20), (7, 13));
        assert_eq!(window(19, 6, 20), (14, 20));
    }

    #[test]
    fn underline_wraps_the_matching_slice() {
        let style = Style::colored();
        assert_eq!(
            underline_match(&style, "Green", "RE"),
            "G\x1b[4mre\x1b[24men"
        );
        assert_eq!(underline_match(&Style::plain(), "Green", "re"), "Green");
    }
}
