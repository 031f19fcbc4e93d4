//! Per-element wrapper records.
//!
//! Every element of an [`ObservableCollection`](super::ObservableCollection)
//! is held by an [`Item`] that tracks its position, selection and disposal
//! state. The collection is the only writer of that state; the item itself
//! exposes read accessors, its own signals, and [`Item::set_selected`], which
//! forwards the request to the owning collection.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use horizon_observable_core::logging::targets;
use horizon_observable_core::{Property, Signal};

/// Shared handle to an item wrapper.
pub type ItemRef<T> = Arc<Item<T>>;

/// Callback surface an item uses to route selection requests to its owner.
pub(crate) trait SelectionHost<T>: Send + Sync {
    fn request_selection(&self, item: &Item<T>, selected: bool);
}

/// A collection element together with its position and selection state.
///
/// Two items compare equal when their wrapped values compare equal, so
/// search and removal by value match any wrapper holding an equal value.
/// Use [`Item::is_same`] for identity.
pub struct Item<T: 'static> {
    value: Arc<T>,
    index: Property<usize>,
    selected: Property<bool>,
    disposed: AtomicBool,
    host: Weak<dyn SelectionHost<T>>,

    /// Emitted with the new index whenever the item moves.
    pub index_changed: Signal<usize>,

    /// Emitted with the new state whenever the item is selected or deselected.
    pub selection_changed: Signal<bool>,

    /// Emitted with the field path when the item is reported as modified.
    /// An empty path means the whole item.
    pub modified: Signal<String>,
}

impl<T: Send + Sync + 'static> Item<T> {
    pub(crate) fn new(value: Arc<T>, index: usize, host: Weak<dyn SelectionHost<T>>) -> Self {
        Self {
            value,
            index: Property::new(index),
            selected: Property::new(false),
            disposed: AtomicBool::new(false),
            host,
            index_changed: Signal::new(),
            selection_changed: Signal::new(),
            modified: Signal::new(),
        }
    }

    /// The wrapped value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// A shared handle to the wrapped value.
    pub fn shared_value(&self) -> Arc<T> {
        Arc::clone(&self.value)
    }

    /// The item's position in its collection.
    pub fn index(&self) -> usize {
        self.index.get()
    }

    /// Whether the item is currently selected.
    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    /// Whether the item has been removed or replaced.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Returns `true` if both handles refer to the same wrapper.
    pub fn is_same(&self, other: &Item<T>) -> bool {
        std::ptr::eq(self, other)
    }

    /// Returns `true` if `value` is the very allocation this item wraps.
    pub fn wraps(&self, value: &Arc<T>) -> bool {
        Arc::ptr_eq(&self.value, value)
    }

    /// Request a selection change.
    ///
    /// Setting the current state, or any state on a disposed item, does
    /// nothing. Otherwise the request goes through the owning collection so
    /// its selection set and primary selection stay consistent.
    pub fn set_selected(&self, selected: bool) {
        if self.is_disposed() || self.is_selected() == selected {
            return;
        }

        match self.host.upgrade() {
            Some(host) => host.request_selection(self, selected),
            None => {
                tracing::trace!(target: targets::SELECTION, "item has no live collection");
                if self.selected.set(selected) {
                    self.selection_changed.emit(selected);
                }
            }
        }
    }

    /// Store a new position. Returns `true` if the index changed.
    pub(crate) fn assign_index(&self, index: usize) -> bool {
        !self.is_disposed() && self.index.set(index)
    }

    /// Store the selection flag without change detection.
    pub(crate) fn mark_selected(&self, selected: bool) {
        if !self.is_disposed() {
            self.selected.set_silent(selected);
        }
    }

    pub(crate) fn dispose(&self) {
        self.selected.set_silent(false);
        self.disposed.store(true, Ordering::SeqCst);
    }
}

impl<T: PartialEq + 'static> PartialEq for Item<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.value == *other.value
    }
}

impl<T: Eq + 'static> Eq for Item<T> {}

impl<T: Hash + 'static> Hash for Item<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Item<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("value", &self.value)
            .field("index", &self.index.get())
            .field("selected", &self.selected.get())
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    struct NoHost;

    impl SelectionHost<String> for NoHost {
        fn request_selection(&self, _item: &Item<String>, _selected: bool) {}
    }

    fn detached(value: &str, index: usize) -> Item<String> {
        let host: Weak<dyn SelectionHost<String>> = Weak::<NoHost>::new();
        Item::new(Arc::new(value.to_string()), index, host)
    }

    #[test]
    fn test_item_equality_by_value() {
        let a = detached("x", 0);
        let b = detached("x", 5);
        let c = detached("y", 0);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.is_same(&b));

        let mut set = HashSet::new();
        set.insert(ItemRef::new(a));
        assert!(set.contains(&ItemRef::new(b)));
    }

    #[test]
    fn test_assign_index_reports_change_only() {
        let item = detached("x", 2);
        assert!(!item.assign_index(2));
        assert!(item.assign_index(3));
        assert_eq!(item.index(), 3);
    }

    #[test]
    fn test_disposed_item_ignores_updates() {
        let item = detached("x", 0);
        item.mark_selected(true);
        item.dispose();
        assert!(item.is_disposed());
        assert!(!item.is_selected());
        assert!(!item.assign_index(4));
        item.mark_selected(true);
        item.set_selected(true);
        assert!(!item.is_selected());
    }

    #[test]
    fn test_set_selected_without_collection() {
        let item = detached("x", 0);
        let received = Arc::new(Mutex::new(Vec::new()));
        let recv = received.clone();
        item.selection_changed.connect(move |&selected| recv.lock().push(selected));

        item.set_selected(true);
        item.set_selected(true); // no-op
        item.set_selected(false);

        assert_eq!(*received.lock(), vec![true, false]);
    }

    #[test]
    fn test_wraps_identity() {
        let shared = Arc::new("x".to_string());
        let host: Weak<dyn SelectionHost<String>> = Weak::<NoHost>::new();
        let item = Item::new(shared.clone(), 0, host);
        assert!(item.wraps(&shared));
        assert!(!item.wraps(&Arc::new("x".to_string())));
    }
}
