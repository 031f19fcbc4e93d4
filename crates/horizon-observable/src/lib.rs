//! Horizon Observable - reactive collections for data-bound views.
//!
//! This crate provides an ordered collection that notifies connected views
//! of every change, plus the per-element wrappers, selection tracking and
//! adapters views need to stay in sync with it.
//!
//! - **Collection**: [`ObservableCollection`] with add/insert/remove/replace,
//!   sorting, reversing, moving and batch operations
//! - **Items**: [`Item`] wrappers tracking index, selection and disposal
//! - **Selection**: A selection set with one primary selection
//! - **Notifications**: One structural notification per logical operation
//! - **Erased access**: [`AnyCollection`] for element-type-agnostic views
//!
//! # Example
//!
//! ```
//! use horizon_observable::{ObservableCollection, MoveReason};
//!
//! let scores = ObservableCollection::<i32>::from_items([30, 10, 20]);
//! scores.signals().moved.connect(|event| {
//!     assert_eq!(event.reason, MoveReason::Sort);
//! });
//!
//! let ten = scores.item(1).unwrap();
//! scores.sort();
//! assert_eq!(ten.index(), 0);
//! assert_eq!(scores.binary_search(&20), Ok(1));
//! ```

pub mod collection;
mod config;
mod error;

pub use collection::{
    AddReason, AnyCollection, AnyItem, ChangeAction, ChangeRange, CollectionChange,
    CollectionSignals, Item, ItemRef, ItemsAdded, ItemsModified, ItemsMoved, ItemsRemoved,
    MoveReason, ObservableCollection, ReadOnlyList, RemoveReason, ScrollAlignment, ScrolledTo,
    SelectionChanged,
};
pub use config::{CollectionBuilder, CollectionConfig};
pub use error::{CollectionError, Result};

pub use horizon_observable_core::{ConnectionId, Signal};
