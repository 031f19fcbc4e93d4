//! Element-type-agnostic access to collections.
//!
//! Generic components (list views, binding layers) often hold collections of
//! element types they know nothing about. [`AnyCollection`] and [`AnyItem`]
//! expose the same operations as their typed counterparts with elements
//! passed as `dyn Any`. Passing an absent element, or one of the wrong type,
//! fails with [`CollectionError::InvalidArgument`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_observable::collection::{AnyCollection, ObservableCollection};
//!
//! let names = ObservableCollection::<String>::new();
//! let erased: &dyn AnyCollection = &names;
//!
//! erased.add_value(Some(Arc::new("ada".to_string()))).unwrap();
//! assert!(erased.add_value(Some(Arc::new(7_u8))).is_err());
//! assert!(erased.add_value(None).is_err());
//!
//! let first = erased.item_at(0).unwrap();
//! assert_eq!(first.downcast_value::<String>().map(String::as_str), Some("ada"));
//! ```

use std::any::{self, Any};
use std::fmt;
use std::sync::Arc;

use horizon_observable_core::ConnectionId;

use super::adapter::{ErasedValue, ReadOnlyList};
use super::change::{
    ChangeAction, ItemsAdded, ItemsModified, ItemsMoved, ItemsRemoved, ScrollAlignment,
    ScrolledTo, SelectionChanged,
};
use super::item::Item;
use super::observable::ObservableCollection;
use crate::error::{CollectionError, Result};

/// An item wrapper with its element type erased.
pub trait AnyItem: Any + Send + Sync {
    /// The item's position in its collection.
    fn index(&self) -> usize;

    /// Whether the item is currently selected.
    fn is_selected(&self) -> bool;

    /// Whether the item has been removed or replaced.
    fn is_disposed(&self) -> bool;

    /// The wrapped element.
    fn value_any(&self) -> &(dyn Any + Send + Sync);

    /// A shared handle to the wrapped element.
    fn shared_value_any(&self) -> ErasedValue;

    /// Request a selection change. See [`Item::set_selected`].
    fn set_selected(&self, selected: bool);

    /// Name of the element type.
    fn value_type_name(&self) -> &'static str;

    /// The wrapper itself, for downcasting to `Item<T>`.
    fn as_any(&self) -> &dyn Any;
}

impl dyn AnyItem {
    /// The wrapped element, if it is a `T`.
    pub fn downcast_value<T: Any>(&self) -> Option<&T> {
        self.value_any().downcast_ref::<T>()
    }

    /// The typed wrapper, if the element type is `T`.
    pub fn downcast_item<T: Send + Sync + 'static>(&self) -> Option<&Item<T>> {
        self.as_any().downcast_ref::<Item<T>>()
    }
}

impl fmt::Debug for dyn AnyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyItem")
            .field("type", &self.value_type_name())
            .field("index", &self.index())
            .field("selected", &self.is_selected())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl<T: Send + Sync + 'static> AnyItem for Item<T> {
    fn index(&self) -> usize {
        Item::index(self)
    }

    fn is_selected(&self) -> bool {
        Item::is_selected(self)
    }

    fn is_disposed(&self) -> bool {
        Item::is_disposed(self)
    }

    fn value_any(&self) -> &(dyn Any + Send + Sync) {
        self.value()
    }

    fn shared_value_any(&self) -> ErasedValue {
        self.shared_value()
    }

    fn set_selected(&self, selected: bool) {
        Item::set_selected(self, selected);
    }

    fn value_type_name(&self) -> &'static str {
        any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn erase_items<T: Send + Sync + 'static>(items: &[Arc<Item<T>>]) -> Vec<Arc<dyn AnyItem>> {
    items
        .iter()
        .map(|item| Arc::clone(item) as Arc<dyn AnyItem>)
        .collect()
}

impl<T: Send + Sync + 'static> ItemsAdded<Item<T>> {
    /// The same notification with its element type erased.
    pub fn erase(&self) -> ItemsAdded<dyn AnyItem> {
        ItemsAdded {
            range: self.range,
            reason: self.reason,
            items: erase_items(&self.items),
        }
    }
}

impl<T: Send + Sync + 'static> ItemsRemoved<Item<T>> {
    /// The same notification with its element type erased.
    pub fn erase(&self) -> ItemsRemoved<dyn AnyItem> {
        ItemsRemoved {
            range: self.range,
            reason: self.reason,
            items: erase_items(&self.items),
        }
    }
}

impl<T: Send + Sync + 'static> SelectionChanged<Item<T>> {
    /// The same notification with its element type erased.
    pub fn erase(&self) -> SelectionChanged<dyn AnyItem> {
        SelectionChanged {
            range: self.range,
            item: Arc::clone(&self.item) as Arc<dyn AnyItem>,
            selected: self.selected,
            primary_index: self.primary_index,
        }
    }
}

/// Slot receiving erased `added` notifications.
pub type AddedSlot = Box<dyn Fn(&ItemsAdded<dyn AnyItem>) + Send + Sync>;
/// Slot receiving erased `removed` notifications.
pub type RemovedSlot = Box<dyn Fn(&ItemsRemoved<dyn AnyItem>) + Send + Sync>;
/// Slot receiving erased `selection_changed` notifications.
pub type SelectionSlot = Box<dyn Fn(&SelectionChanged<dyn AnyItem>) + Send + Sync>;

/// A collection with its element type erased.
///
/// Implemented by every [`ObservableCollection`] whose element type supports
/// equality.
pub trait AnyCollection: Send + Sync {
    /// Name of the element type.
    fn element_type_name(&self) -> &'static str;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The wrapper at `index`.
    fn item_at(&self, index: usize) -> Option<Arc<dyn AnyItem>>;

    /// Snapshot of every wrapper.
    fn items(&self) -> Vec<Arc<dyn AnyItem>>;

    /// Read-only element view. Holds the read lock until dropped.
    fn values(&self) -> Box<dyn ReadOnlyList + '_>;

    /// Position of the first element equal to `value`.
    fn index_of_value(&self, value: &dyn Any) -> Option<usize>;

    /// Returns `true` if an element equal to `value` is present.
    fn contains_value(&self, value: &dyn Any) -> bool {
        self.index_of_value(value).is_some()
    }

    /// Append an element.
    fn add_value(&self, value: Option<ErasedValue>) -> Result<Arc<dyn AnyItem>>;

    /// Insert an element at `index` (`0..=len`).
    fn insert_value(&self, index: usize, value: Option<ErasedValue>) -> Result<Arc<dyn AnyItem>>;

    /// Replace the element at `index`.
    fn replace_value(&self, index: usize, value: Option<ErasedValue>) -> Result<Arc<dyn AnyItem>>;

    /// Remove the first element equal to `value`. Returns `Ok(false)` if
    /// there is none.
    fn remove_value(&self, value: Option<&dyn Any>) -> Result<bool>;

    /// Remove the element at `index`.
    fn remove_at(&self, index: usize) -> Result<()>;

    /// Remove every element.
    fn clear(&self);

    /// Index of the primary selection.
    fn selected_index(&self) -> Option<usize>;

    /// Move the primary selection.
    fn set_selected_index(&self, index: Option<usize>) -> Result<()>;

    /// Every selected wrapper, in selection order.
    fn selected_items(&self) -> Vec<Arc<dyn AnyItem>>;

    /// Apply a selection state to `item` unconditionally.
    fn force_select(&self, item: &dyn AnyItem, selected: bool) -> Result<()>;

    /// Ask views to bring the element at `index` into view.
    fn scroll_to_index(&self, index: usize, alignment: ScrollAlignment, offset: f32) -> Result<()>;

    /// Scroll to the first element equal to `value`.
    fn scroll_to_value(&self, value: &dyn Any, alignment: ScrollAlignment, offset: f32) -> bool;

    /// The most recent scroll request.
    fn last_scroll(&self) -> Option<ScrolledTo>;

    /// Report `count` elements starting at `start` as modified.
    fn notify_modified(&self, start: usize, count: usize, field_path: &str) -> Result<()>;

    /// Suppress (or resume) every collection-level notification.
    fn set_notifications_blocked(&self, blocked: bool);

    /// Subscribe to additions.
    fn on_added(&self, slot: AddedSlot) -> ConnectionId;

    /// Subscribe to removals.
    fn on_removed(&self, slot: RemovedSlot) -> ConnectionId;

    /// Subscribe to modification reports.
    fn on_modified(&self, slot: Box<dyn Fn(&ItemsModified) + Send + Sync>) -> ConnectionId;

    /// Subscribe to reordering.
    fn on_moved(&self, slot: Box<dyn Fn(&ItemsMoved) + Send + Sync>) -> ConnectionId;

    /// Subscribe to selection changes.
    fn on_selection_changed(&self, slot: SelectionSlot) -> ConnectionId;

    /// Subscribe to scroll requests.
    fn on_scrolled_to(&self, slot: Box<dyn Fn(&ScrolledTo) + Send + Sync>) -> ConnectionId;

    /// Disconnect a subscription made through this trait.
    fn disconnect(&self, action: ChangeAction, id: ConnectionId) -> bool;
}

impl<T: PartialEq + Send + Sync + 'static> ObservableCollection<T> {
    fn accept_value(&self, value: Option<ErasedValue>) -> Result<Arc<T>> {
        let value = value.ok_or_else(|| CollectionError::invalid_argument("element is absent"))?;
        value.downcast::<T>().map_err(|_| {
            CollectionError::invalid_argument(format!(
                "element is not of type {}",
                any::type_name::<T>()
            ))
        })
    }
}

impl<T: PartialEq + Send + Sync + 'static> AnyCollection for ObservableCollection<T> {
    fn element_type_name(&self) -> &'static str {
        any::type_name::<T>()
    }

    fn len(&self) -> usize {
        ObservableCollection::len(self)
    }

    fn item_at(&self, index: usize) -> Option<Arc<dyn AnyItem>> {
        self.item(index).map(|item| item as Arc<dyn AnyItem>)
    }

    fn items(&self) -> Vec<Arc<dyn AnyItem>> {
        erase_items::<T>(&ObservableCollection::items(self))
    }

    fn values(&self) -> Box<dyn ReadOnlyList + '_> {
        Box::new(ObservableCollection::values(self))
    }

    fn index_of_value(&self, value: &dyn Any) -> Option<usize> {
        value
            .downcast_ref::<T>()
            .and_then(|value| self.index_of(value))
    }

    fn add_value(&self, value: Option<ErasedValue>) -> Result<Arc<dyn AnyItem>> {
        let value = self.accept_value(value)?;
        Ok(self.add(value) as Arc<dyn AnyItem>)
    }

    fn insert_value(&self, index: usize, value: Option<ErasedValue>) -> Result<Arc<dyn AnyItem>> {
        let value = self.accept_value(value)?;
        Ok(self.insert(index, value)? as Arc<dyn AnyItem>)
    }

    fn replace_value(&self, index: usize, value: Option<ErasedValue>) -> Result<Arc<dyn AnyItem>> {
        let value = self.accept_value(value)?;
        Ok(self.replace(index, value)? as Arc<dyn AnyItem>)
    }

    fn remove_value(&self, value: Option<&dyn Any>) -> Result<bool> {
        let value = value.ok_or_else(|| CollectionError::invalid_argument("element is absent"))?;
        let value = value.downcast_ref::<T>().ok_or_else(|| {
            CollectionError::invalid_argument(format!(
                "element is not of type {}",
                any::type_name::<T>()
            ))
        })?;
        Ok(self.remove(value))
    }

    fn remove_at(&self, index: usize) -> Result<()> {
        ObservableCollection::remove_at(self, index).map(|_| ())
    }

    fn clear(&self) {
        ObservableCollection::clear(self);
    }

    fn selected_index(&self) -> Option<usize> {
        ObservableCollection::selected_index(self)
    }

    fn set_selected_index(&self, index: Option<usize>) -> Result<()> {
        ObservableCollection::set_selected_index(self, index)
    }

    fn selected_items(&self) -> Vec<Arc<dyn AnyItem>> {
        erase_items::<T>(&ObservableCollection::selected_items(self))
    }

    fn force_select(&self, item: &dyn AnyItem, selected: bool) -> Result<()> {
        let item = item.downcast_item::<T>().ok_or_else(|| {
            CollectionError::invalid_argument(format!(
                "item does not wrap {}",
                any::type_name::<T>()
            ))
        })?;
        ObservableCollection::force_select(self, item, selected)
    }

    fn scroll_to_index(&self, index: usize, alignment: ScrollAlignment, offset: f32) -> Result<()> {
        ObservableCollection::scroll_to_index(self, index, alignment, offset)
    }

    fn scroll_to_value(&self, value: &dyn Any, alignment: ScrollAlignment, offset: f32) -> bool {
        value
            .downcast_ref::<T>()
            .is_some_and(|value| ObservableCollection::scroll_to_value(self, value, alignment, offset))
    }

    fn last_scroll(&self) -> Option<ScrolledTo> {
        ObservableCollection::last_scroll(self)
    }

    fn notify_modified(&self, start: usize, count: usize, field_path: &str) -> Result<()> {
        ObservableCollection::notify_modified(self, start, count, field_path)
    }

    fn set_notifications_blocked(&self, blocked: bool) {
        ObservableCollection::set_notifications_blocked(self, blocked);
    }

    fn on_added(&self, slot: AddedSlot) -> ConnectionId {
        self.signals().added.connect(move |event| slot(&event.erase()))
    }

    fn on_removed(&self, slot: RemovedSlot) -> ConnectionId {
        self.signals().removed.connect(move |event| slot(&event.erase()))
    }

    fn on_modified(&self, slot: Box<dyn Fn(&ItemsModified) + Send + Sync>) -> ConnectionId {
        self.signals().modified.connect(move |event| slot(event))
    }

    fn on_moved(&self, slot: Box<dyn Fn(&ItemsMoved) + Send + Sync>) -> ConnectionId {
        self.signals().moved.connect(move |event| slot(event))
    }

    fn on_selection_changed(&self, slot: SelectionSlot) -> ConnectionId {
        self.signals()
            .selection_changed
            .connect(move |event| slot(&event.erase()))
    }

    fn on_scrolled_to(&self, slot: Box<dyn Fn(&ScrolledTo) + Send + Sync>) -> ConnectionId {
        self.signals().scrolled_to.connect(move |event| slot(event))
    }

    fn disconnect(&self, action: ChangeAction, id: ConnectionId) -> bool {
        self.signals().emitter(action).disconnect(id)
    }
}
