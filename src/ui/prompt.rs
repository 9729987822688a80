//! Interactive terminal presenter for [`RemoteSelector`]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::selector::{
    FetchTicket, ItemSource, ListBody, PointerDown, PointerHub, RemoteSelector, SelectItem,
};

/// Caller-owned selection, updated by the selector's `on_select` callback
pub struct Selection<T> {
    cell: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for Selection<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Clone + Send + 'static> Selection<T> {
    pub fn new() -> Self {
        Self {
            cell: Arc::new(Mutex::new(None)),
        }
    }

    /// Callback to hand to [`RemoteSelector::new`]
    pub fn sink(&self) -> impl FnMut(Option<&T>) + Send + 'static {
        let cell = Arc::clone(&self.cell);
        move |item: Option<&T>| {
            if let Ok(mut current) = cell.lock() {
                *current = item.cloned();
            }
        }
    }

    pub fn get(&self) -> Option<T> {
        self.cell.lock().ok().and_then(|current| current.clone())
    }
}

impl<T: Clone + Send + 'static> Default for Selection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// How the prompt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptExit {
    Chosen,
    /// Esc, or nothing to choose from
    Dismissed,
}

/// Run a pending fetch behind a spinner
pub async fn fetch_with_spinner<T, K, S>(
    selector: &mut RemoteSelector<T, K>,
    ticket: FetchTicket,
    source: &S,
) -> bool
where
    T: SelectItem + Send,
    K: Sync,
    S: ItemSource<T, K> + ?Sized,
{
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Loading...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let applied = selector.fetch_pending(ticket, source).await;

    spinner.finish_and_clear();
    applied
}

const SEARCH_ENTRY: &str = "🔍 Search...";
const CLEAR_ENTRY: &str = "✕ Clear selection";

/// Let the user search and pick from an already loaded selector.
///
/// Esc is delivered to `hub` as a pointer-down outside the selector, which
/// closes it the same way a click elsewhere would.
pub fn run<T, K>(selector: &mut RemoteSelector<T, K>, hub: &PointerHub, selection: &Selection<T>) -> PromptExit
where
    T: SelectItem + Clone + Send + 'static,
{
    selector.open();

    loop {
        let current = selection.get();
        let view = selector.view(current.as_ref());
        let header = if matches!(view.body, ListBody::Rows(_)) { 2 } else { usize::MAX };
        for line in view.lines().iter().take(header) {
            println!("{}", line);
        }

        let rows = match view.body {
            ListBody::Rows(rows) => rows,
            ListBody::Loading | ListBody::Empty => {
                hub.dispatch(&PointerDown::background());
                return PromptExit::Dismissed;
            }
            ListBody::NoMatches { .. } => {
                match super::menu::ask("Search", true) {
                    Some(text) => selector.set_search(text),
                    None => {
                        hub.dispatch(&PointerDown::background());
                        return PromptExit::Dismissed;
                    }
                }
                continue;
            }
        };

        let mut entries: Vec<String> = rows.iter().map(|r| r.text.clone()).collect();
        entries.push(SEARCH_ENTRY.dimmed().to_string());
        if current.is_some() {
            entries.push(CLEAR_ENTRY.dimmed().to_string());
        }

        let default = rows.iter().position(|r| r.selected).unwrap_or(0);
        let picked = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(view.label.as_str())
            .items(&entries)
            .default(default)
            .interact_opt()
            .ok()
            .flatten();

        match picked {
            None => {
                hub.dispatch(&PointerDown::background());
                return PromptExit::Dismissed;
            }
            Some(i) if i < rows.len() => {
                let id = selector.filtered().get(i).map(|item| item.id());
                if let Some(id) = id {
                    if selector.choose(&id) {
                        return PromptExit::Chosen;
                    }
                }
            }
            Some(i) if i == rows.len() => {
                let text = super::menu::ask("Search", true).unwrap_or_default();
                selector.set_search(text);
            }
            Some(_) => selector.clear(),
        }
    }
}
