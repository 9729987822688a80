//! Render snapshot of a selector

use colored::Colorize;

/// What the open list shows.
///
/// Loading, "no data" and "nothing matches the search" are separate states
/// so a presenter never confuses a pending fetch with an empty result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListBody {
    Loading,
    /// The collection itself is empty, or the fetch failed
    Empty,
    /// Items exist but none contain the search text
    NoMatches { query: String },
    Rows(Vec<Row>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub text: String,
    pub selected: bool,
    pub highlighted: bool,
}

/// Everything a presenter needs to draw one selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorView {
    pub label: String,
    pub required: bool,
    /// Display text of the selected item, or the placeholder
    pub summary: String,
    pub has_selection: bool,
    pub search: String,
    pub open: bool,
    pub body: ListBody,
}

impl SelectorView {
    /// A required selector with nothing chosen
    pub fn is_missing_required(&self) -> bool {
        self.required && !self.has_selection
    }

    /// Plain terminal rendering, one entry per line
    pub fn lines(&self) -> Vec<String> {
        let marker = if self.required { " *" } else { "" };
        let summary = if self.has_selection {
            self.summary.normal()
        } else {
            self.summary.dimmed()
        };

        let mut lines = vec![format!("{}{}: {}", self.label.bold(), marker.red(), summary)];
        if !self.open {
            return lines;
        }

        lines.push(format!("  search: {}", self.search));
        match &self.body {
            ListBody::Loading => lines.push(format!("  {}", "Loading...".dimmed())),
            ListBody::Empty => lines.push(format!("  {}", "No data available".yellow())),
            ListBody::NoMatches { query } => {
                lines.push(format!("  {} \"{}\"", "No results for".yellow(), query))
            }
            ListBody::Rows(rows) => {
                for row in rows {
                    let prefix = if row.highlighted { ">" } else { " " };
                    lines.push(format!(" {}{}", prefix, row.text));
                }
            }
        }
        lines
    }
}
