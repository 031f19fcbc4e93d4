//! Observable collections.
//!
//! An [`ObservableCollection`] is an ordered sequence that tells views about
//! every change so they can update incrementally instead of re-reading the
//! whole sequence.
//!
//! # Core Types
//!
//! - `ObservableCollection`: The collection itself
//! - `Item`: Per-element wrapper tracking position and selection
//! - `CollectionSignals`: Signals for change notifications
//! - `ItemsAdded`, `ItemsRemoved`, `ItemsMoved`, `ItemsModified`,
//!   `SelectionChanged`, `ScrolledTo`: Notification payloads
//! - `ValuesView`, `ReadOnlyList`: Read-only element views
//! - `AnyCollection`, `AnyItem`: Element-type-agnostic access
//!
//! # Example
//!
//! ```
//! use horizon_observable::collection::{ObservableCollection, RemoveReason};
//!
//! let tasks = ObservableCollection::<String>::from_items(["write", "review", "ship"].map(String::from));
//!
//! tasks.signals().removed.connect(|event| {
//!     assert_eq!(event.reason, RemoveReason::Remove);
//!     println!("removed {:?}", event.items.iter().map(|i| i.value()).collect::<Vec<_>>());
//! });
//!
//! let review = tasks.item(1).unwrap();
//! let ship = tasks.item(2).unwrap();
//! ship.index_changed.connect(|index| println!("ship moved to {index}"));
//!
//! tasks.remove(&"review".to_string());
//! assert!(review.is_disposed());
//! assert_eq!(ship.index(), 1);
//! ```
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐   mutate   ┌──────────────┐
//! │ ObservableCollection │───────────>│  Item<T> ... │
//! │  (ordered wrappers)  │            │ index/select │
//! └──────────────────────┘            └──────────────┘
//!            │ after unlock                  │
//!            v                               v
//!   ┌───────────────────┐          ┌───────────────────┐
//!   │ CollectionSignals │          │ item-level signals │
//!   └───────────────────┘          └───────────────────┘
//! ```

mod adapter;
mod change;
mod erased;
mod item;
mod observable;
mod selection;

pub use adapter::{
    Comparer, Descending, ErasedValue, ItemComparer, ItemEquality, ItemsView, NaturalOrder,
    ReadOnlyList, ValuesIter, ValuesView,
};
pub use change::{
    AddReason, ChangeAction, ChangeRange, CollectionChange, CollectionSignals, ItemsAdded,
    ItemsModified, ItemsMoved, ItemsRemoved, MoveReason, RemoveReason, ScrollAlignment,
    ScrolledTo, SelectionChanged,
};
pub use erased::{AddedSlot, AnyCollection, AnyItem, RemovedSlot, SelectionSlot};
pub use item::{Item, ItemRef};
pub use observable::{ObservableCollection, OwnerRef};
