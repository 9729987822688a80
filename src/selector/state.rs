//! Selector state machine

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

use super::filter::filter_items;
use super::item::SelectItem;
use super::pointer::{NodeId, PointerHub, PointerSubscription};
use super::source::ItemSource;
use super::view::{ListBody, Row, SelectorView};
use crate::error::Result;

/// Progress of the most recent fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// Not mounted yet, or unmounted
    Idle,
    Loading,
    Ready,
    /// The last fetch failed; items are empty
    Failed,
}

/// Receipt for an issued fetch. Only the most recently issued ticket may
/// complete; older ones are discarded when they resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "pass the ticket to `complete` or `fetch_pending`"]
pub struct FetchTicket {
    seq: u64,
}

/// State shared with the outside-click listener
#[derive(Debug, Default)]
struct Interaction {
    open: bool,
    search: String,
    /// Index into the filtered rows
    highlight: Option<usize>,
}

impl Interaction {
    fn close(&mut self) {
        self.open = false;
        self.search.clear();
        self.highlight = None;
    }
}

fn lock(interaction: &Mutex<Interaction>) -> MutexGuard<'_, Interaction> {
    interaction
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

type PostFilter<T> = Box<dyn Fn(Vec<T>) -> Vec<T> + Send + Sync>;
type OnSelect<T> = Box<dyn FnMut(Option<&T>) + Send>;

/// Search-filterable dropdown over a remotely fetched collection.
///
/// `T` is the item type, `K` the optional refetch key. The selected item is
/// never stored here: callers pass it to [`RemoteSelector::view`] and learn
/// about changes through the `on_select` callback.
pub struct RemoteSelector<T: SelectItem, K = ()> {
    root: NodeId,
    label: String,
    placeholder: String,
    required: bool,
    key: Option<K>,
    items: Vec<T>,
    phase: FetchPhase,
    /// Sequence number of the latest issued fetch
    issued: u64,
    interaction: Arc<Mutex<Interaction>>,
    post_filter: Option<PostFilter<T>>,
    on_select: OnSelect<T>,
    subscription: Option<PointerSubscription>,
}

impl<T: SelectItem, K> RemoteSelector<T, K> {
    pub fn new(label: impl Into<String>, on_select: impl FnMut(Option<&T>) + Send + 'static) -> Self {
        Self {
            root: NodeId::next(),
            label: label.into(),
            placeholder: "Select...".into(),
            required: false,
            key: None,
            items: Vec::new(),
            phase: FetchPhase::Idle,
            issued: 0,
            interaction: Arc::new(Mutex::new(Interaction::default())),
            post_filter: None,
            on_select: Box::new(on_select),
            subscription: None,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Initial refetch key, used by the fetch issued on mount
    pub fn with_key(mut self, key: K) -> Self {
        self.key = Some(key);
        self
    }

    /// Post-fetch filter applied to every accepted result, e.g. "only
    /// derivations destined to the department chosen in this form"
    pub fn with_post_filter(mut self, filter: impl Fn(Vec<T>) -> Vec<T> + Send + Sync + 'static) -> Self {
        self.post_filter = Some(Box::new(filter));
        self
    }

    /// Root node of this selector in the rendered tree
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    fn interaction(&self) -> MutexGuard<'_, Interaction> {
        lock(&self.interaction)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Attach the outside-click listener and issue the initial fetch
    pub fn mount(&mut self, hub: &PointerHub) -> FetchTicket {
        self.attach(hub);
        self.begin()
    }

    /// Attach the outside-click listener without fetching. For keyed
    /// selectors with nothing to list until [`set_key`](Self::set_key).
    pub fn attach(&mut self, hub: &PointerHub) {
        let root = self.root;
        let interaction = Arc::clone(&self.interaction);
        self.subscription = Some(hub.subscribe(move |event| {
            if event.is_within(root) {
                return;
            }
            let mut state = lock(&interaction);
            if state.open {
                state.close();
            }
        }));
    }

    /// Release the listener and discard fetched data. A fetch still in
    /// flight is ignored when it resolves.
    pub fn unmount(&mut self) {
        self.subscription = None;
        self.items = Vec::new();
        self.phase = FetchPhase::Idle;
        self.issued += 1;
        self.interaction().close();
    }

    // -------------------------------------------------------------------------
    // Fetching
    // -------------------------------------------------------------------------

    /// Issue a new fetch, superseding any pending one
    pub fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        self.phase = FetchPhase::Loading;
        FetchTicket { seq: self.issued }
    }

    /// Apply a fetch result. Returns `false` when the ticket is stale and the
    /// result was dropped.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<Vec<T>>) -> bool {
        if ticket.seq != self.issued {
            debug!(
                "{}: dropping stale fetch #{} (latest #{})",
                self.label, ticket.seq, self.issued
            );
            return false;
        }

        match result {
            Ok(items) => {
                self.items = match &self.post_filter {
                    Some(filter) => filter(items),
                    None => items,
                };
                self.phase = FetchPhase::Ready;
                debug!("{}: loaded {} item(s)", self.label, self.items.len());
            }
            Err(e) => {
                warn!("{}: fetch failed: {}", self.label, e);
                self.items = Vec::new();
                self.phase = FetchPhase::Failed;
            }
        }
        self.interaction().highlight = None;
        true
    }

    /// Run the fetch for `ticket` against `source` and apply the result
    pub async fn fetch_pending<S>(&mut self, ticket: FetchTicket, source: &S) -> bool
    where
        S: ItemSource<T, K> + ?Sized,
        T: Send,
        K: Sync,
    {
        let result = source.fetch(self.key.as_ref()).await;
        self.complete(ticket, result)
    }

    /// Issue a fetch and wait for it
    pub async fn load<S>(&mut self, source: &S) -> bool
    where
        S: ItemSource<T, K> + ?Sized,
        T: Send,
        K: Sync,
    {
        let ticket = self.begin();
        self.fetch_pending(ticket, source).await
    }

    // -------------------------------------------------------------------------
    // Search and open state
    // -------------------------------------------------------------------------

    pub fn search(&self) -> String {
        self.interaction().search.clone()
    }

    /// Replace the search text (one keystroke). Typing opens the list.
    pub fn set_search(&mut self, text: impl Into<String>) {
        let mut state = self.interaction();
        state.search = text.into();
        state.open = true;
        state.highlight = None;
    }

    /// Items matching the current search text
    pub fn filtered(&self) -> Vec<&T> {
        let search = self.search();
        filter_items(&self.items, &search)
    }

    pub fn is_open(&self) -> bool {
        self.interaction().open
    }

    pub fn open(&mut self) {
        self.interaction().open = true;
    }

    /// Close the list; the search text is reset
    pub fn close(&mut self) {
        self.interaction().close();
    }

    pub fn toggle(&mut self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    // -------------------------------------------------------------------------
    // Highlight (keyboard navigation)
    // -------------------------------------------------------------------------

    pub fn highlighted(&self) -> Option<usize> {
        self.interaction().highlight
    }

    pub fn highlight_next(&mut self) {
        let len = self.filtered().len();
        let mut state = self.interaction();
        state.highlight = match (state.highlight, len) {
            (_, 0) => None,
            (Some(i), _) if i + 1 < len => Some(i + 1),
            _ => Some(0),
        };
    }

    pub fn highlight_prev(&mut self) {
        let len = self.filtered().len();
        let mut state = self.interaction();
        state.highlight = match (state.highlight, len) {
            (_, 0) => None,
            (Some(i), _) if i > 0 => Some(i - 1),
            _ => Some(len - 1),
        };
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Report the item with `id` as chosen, then clear search and close.
    /// Returns `false` if no fetched item has that id.
    pub fn choose(&mut self, id: &T::Id) -> bool {
        let Some(item) = self.items.iter().find(|item| &item.id() == id) else {
            return false;
        };
        (self.on_select)(Some(item));
        self.interaction().close();
        true
    }

    /// Choose the highlighted row, if any
    pub fn choose_highlighted(&mut self) -> bool {
        let id = self
            .highlighted()
            .and_then(|i| self.filtered().get(i).map(|item| item.id()));
        match id {
            Some(id) => self.choose(&id),
            None => false,
        }
    }

    /// Report "nothing selected" and clear the search. The list stays as it is.
    pub fn clear(&mut self) {
        (self.on_select)(None);
        let mut state = self.interaction();
        state.search.clear();
        state.highlight = None;
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    pub fn view(&self, selected: Option<&T>) -> SelectorView {
        let selected_id = selected.map(|item| item.id());
        let (open, search, highlight) = {
            let state = self.interaction();
            (state.open, state.search.clone(), state.highlight)
        };

        let body = if self.phase == FetchPhase::Loading {
            ListBody::Loading
        } else if self.items.is_empty() {
            ListBody::Empty
        } else {
            let filtered = filter_items(&self.items, &search);
            if filtered.is_empty() {
                ListBody::NoMatches { query: search.clone() }
            } else {
                ListBody::Rows(
                    filtered
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            let is_selected = selected_id.as_ref() == Some(&item.id());
                            Row {
                                text: item.render(is_selected),
                                selected: is_selected,
                                highlighted: highlight == Some(i),
                            }
                        })
                        .collect(),
                )
            }
        };

        SelectorView {
            label: self.label.clone(),
            required: self.required,
            summary: selected
                .map(|item| item.display_text())
                .unwrap_or_else(|| self.placeholder.clone()),
            has_selection: selected.is_some(),
            search,
            open,
            body,
        }
    }
}

impl<T: SelectItem, K: PartialEq> RemoteSelector<T, K> {
    /// Change the refetch key. Issues exactly one fetch when the key differs
    /// from the current one, none otherwise.
    pub fn set_key(&mut self, key: Option<K>) -> Option<FetchTicket> {
        if self.key == key {
            return None;
        }
        self.key = key;
        Some(self.begin())
    }
}
