//! Remote-backed entity selector
//!
//! A search-filterable dropdown over a collection fetched from an
//! [`ItemSource`]. The selector owns only ephemeral state (fetched items,
//! search text, open flag); the chosen item belongs to the caller and is
//! reported through the `on_select` callback.

pub mod filter;
pub mod item;
pub mod pointer;
pub mod source;
pub mod state;
pub mod view;

pub use filter::{dedup_by_id, filter_items, matches};
pub use item::SelectItem;
pub use pointer::{NodeId, PointerDown, PointerHub, PointerSubscription};
pub use source::{FnSource, ItemSource};
pub use state::{FetchPhase, FetchTicket, RemoteSelector};
pub use view::{ListBody, Row, SelectorView};
