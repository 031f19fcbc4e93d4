//! Views and comparers over a collection's wrapper storage.
//!
//! The collection stores one `Arc<Item<T>>` per element. The adapters here
//! present that storage as plain elements without copying it:
//!
//! - [`ItemsView`] and [`ValuesView`] borrow the storage under a read lock.
//! - [`ValuesIter`] unwraps each wrapper to its element while iterating.
//! - [`ReadOnlyList`] is the element-type-agnostic view used by generic
//!   components. Its mutators always fail with `NotSupported`.
//! - [`Comparer`], [`ItemComparer`] and [`ItemEquality`] lift element-level
//!   ordering and equality to wrappers for sorting and searching.
//!
//! Views hold the collection's read lock. Drop them before mutating the
//! collection from the same thread.

use std::any::Any;
use std::cmp::Ordering;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Deref;

use parking_lot::MappedRwLockReadGuard;

use super::item::{Item, ItemRef};
use crate::error::{CollectionError, Result};

/// A type-erased element value.
pub type ErasedValue = std::sync::Arc<dyn Any + Send + Sync>;

/// Borrowed view of the wrapper sequence.
pub struct ItemsView<'a, T: 'static> {
    guard: MappedRwLockReadGuard<'a, [ItemRef<T>]>,
}

impl<'a, T: Send + Sync + 'static> ItemsView<'a, T> {
    pub(crate) fn new(guard: MappedRwLockReadGuard<'a, [ItemRef<T>]>) -> Self {
        Self { guard }
    }
}

impl<T: 'static> Deref for ItemsView<'_, T> {
    type Target = [ItemRef<T>];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Borrowed, read-only view of the element sequence.
///
/// Typed callers get `&T`; untyped callers use the [`ReadOnlyList`] impl.
pub struct ValuesView<'a, T: 'static> {
    guard: MappedRwLockReadGuard<'a, [ItemRef<T>]>,
}

impl<'a, T: Send + Sync + 'static> ValuesView<'a, T> {
    pub(crate) fn new(guard: MappedRwLockReadGuard<'a, [ItemRef<T>]>) -> Self {
        Self { guard }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.guard.len()
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// The element at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.guard.get(index).map(|item| item.value())
    }

    /// Iterate over the elements in order.
    pub fn iter(&self) -> ValuesIter<'_, T> {
        ValuesIter::new(&self.guard)
    }
}

impl<T: PartialEq + Send + Sync + 'static> ValuesView<'_, T> {
    /// Returns `true` if an equal element is present.
    pub fn contains(&self, value: &T) -> bool {
        let equality = ItemEquality::new(value);
        self.guard.iter().any(|item| equality.matches(item))
    }
}

impl<'v, T: Send + Sync + 'static> IntoIterator for &'v ValuesView<'_, T> {
    type Item = &'v T;
    type IntoIter = ValuesIter<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator adapter that unwraps each wrapper to its element.
pub struct ValuesIter<'a, T: 'static> {
    inner: std::slice::Iter<'a, ItemRef<T>>,
}

impl<'a, T: Send + Sync + 'static> ValuesIter<'a, T> {
    pub(crate) fn new(items: &'a [ItemRef<T>]) -> Self {
        Self {
            inner: items.iter(),
        }
    }
}

impl<'a, T: Send + Sync + 'static> Iterator for ValuesIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| item.value())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: Send + Sync + 'static> DoubleEndedIterator for ValuesIter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|item| item.value())
    }
}

impl<T: Send + Sync + 'static> ExactSizeIterator for ValuesIter<'_, T> {}

impl<T: Send + Sync + 'static> FusedIterator for ValuesIter<'_, T> {}

/// Element-type-agnostic, read-only list contract.
///
/// Generic components use this to read any collection's elements. The
/// mutators exist so such components can probe capability; every
/// implementation in this crate rejects them with `NotSupported`.
pub trait ReadOnlyList {
    /// Number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if there are no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Always `true` for views in this crate.
    fn is_read_only(&self) -> bool;

    /// The element at `index`.
    fn get_any(&self, index: usize) -> Option<&(dyn Any + Send + Sync)>;

    /// Iterate over the elements in order.
    fn iter_any(&self) -> Box<dyn Iterator<Item = &(dyn Any + Send + Sync)> + '_>;

    /// Position of the first element equal to `value`. A value of another
    /// type never matches.
    fn index_of_any(&self, value: &dyn Any) -> Option<usize>;

    /// Returns `true` if an element equal to `value` is present.
    fn contains_any(&self, value: &dyn Any) -> bool {
        self.index_of_any(value).is_some()
    }

    /// Append an element.
    fn push_any(&self, value: ErasedValue) -> Result<()>;

    /// Insert an element.
    fn insert_any(&self, index: usize, value: ErasedValue) -> Result<()>;

    /// Overwrite an element.
    fn set_any(&self, index: usize, value: ErasedValue) -> Result<()>;

    /// Remove the first element equal to `value`.
    fn remove_any(&self, value: &dyn Any) -> Result<bool>;

    /// Remove the element at `index`.
    fn remove_at(&self, index: usize) -> Result<()>;

    /// Remove every element.
    fn clear(&self) -> Result<()>;
}

impl<T: PartialEq + Send + Sync + 'static> ReadOnlyList for ValuesView<'_, T> {
    fn len(&self) -> usize {
        self.guard.len()
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn get_any(&self, index: usize) -> Option<&(dyn Any + Send + Sync)> {
        self.guard
            .get(index)
            .map(|item| item.value() as &(dyn Any + Send + Sync))
    }

    fn iter_any(&self) -> Box<dyn Iterator<Item = &(dyn Any + Send + Sync)> + '_> {
        Box::new(self.iter().map(|value| value as &(dyn Any + Send + Sync)))
    }

    fn index_of_any(&self, value: &dyn Any) -> Option<usize> {
        let value = value.downcast_ref::<T>()?;
        let equality = ItemEquality::new(value);
        self.guard.iter().position(|item| equality.matches(item))
    }

    fn push_any(&self, _value: ErasedValue) -> Result<()> {
        Err(CollectionError::not_supported("push"))
    }

    fn insert_any(&self, _index: usize, _value: ErasedValue) -> Result<()> {
        Err(CollectionError::not_supported("insert"))
    }

    fn set_any(&self, _index: usize, _value: ErasedValue) -> Result<()> {
        Err(CollectionError::not_supported("set"))
    }

    fn remove_any(&self, _value: &dyn Any) -> Result<bool> {
        Err(CollectionError::not_supported("remove"))
    }

    fn remove_at(&self, _index: usize) -> Result<()> {
        Err(CollectionError::not_supported("remove_at"))
    }

    fn clear(&self) -> Result<()> {
        Err(CollectionError::not_supported("clear"))
    }
}

/// An ordering over elements.
///
/// Implemented for closures `Fn(&T, &T) -> Ordering`.
pub trait Comparer<T: ?Sized> {
    /// Compare two elements.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T: ?Sized, F> Comparer<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// The element type's own `Ord`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> Comparer<T> for NaturalOrder {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Inverts another comparer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Descending<C>(pub C);

impl<T: ?Sized, C: Comparer<T>> Comparer<T> for Descending<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}

/// Lifts an element comparer to wrappers.
pub struct ItemComparer<'c, T: ?Sized, C: Comparer<T> + ?Sized> {
    comparer: &'c C,
    _marker: PhantomData<fn(&T)>,
}

impl<'c, T: Send + Sync + 'static, C: Comparer<T> + ?Sized> ItemComparer<'c, T, C> {
    /// Wrap an element comparer.
    pub fn new(comparer: &'c C) -> Self {
        Self {
            comparer,
            _marker: PhantomData,
        }
    }

    /// Compare two wrappers by their elements.
    pub fn compare_items(&self, a: &Item<T>, b: &Item<T>) -> Ordering {
        self.comparer.compare(a.value(), b.value())
    }

    /// Compare a wrapper's element against a bare element.
    pub fn compare_to_value(&self, item: &Item<T>, value: &T) -> Ordering {
        self.comparer.compare(item.value(), value)
    }
}

/// Value-equality search predicate over wrappers.
///
/// Matching uses the element's own `PartialEq`, never wrapper identity.
pub struct ItemEquality<'v, T> {
    value: &'v T,
}

impl<'v, T: PartialEq + Send + Sync + 'static> ItemEquality<'v, T> {
    /// Match wrappers whose element equals `value`.
    pub fn new(value: &'v T) -> Self {
        Self { value }
    }

    /// Returns `true` if the wrapper's element equals the target.
    pub fn matches(&self, item: &Item<T>) -> bool {
        item.value() == self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ObservableCollection;

    fn letters() -> ObservableCollection<String> {
        ObservableCollection::from_items(["b", "a", "c"].map(String::from))
    }

    #[test]
    fn test_values_view_typed_access() {
        let collection = letters();
        let values = collection.values();
        assert_eq!(values.len(), 3);
        assert_eq!(values.get(1).map(String::as_str), Some("a"));
        assert!(values.contains(&"c".to_string()));
        let collected: Vec<&str> = values.iter().map(String::as_str).collect();
        assert_eq!(collected, ["b", "a", "c"]);
        let reversed: Vec<&str> = values.iter().rev().map(String::as_str).collect();
        assert_eq!(reversed, ["c", "a", "b"]);
        assert_eq!(values.iter().len(), 3);
    }

    #[test]
    fn test_read_only_list_erased_access() {
        let collection = letters();
        let values = collection.values();
        let list: &dyn ReadOnlyList = &values;

        assert!(list.is_read_only());
        assert_eq!(list.len(), 3);
        assert_eq!(
            list.get_any(2).and_then(|v| v.downcast_ref::<String>()).map(String::as_str),
            Some("c")
        );
        assert_eq!(list.index_of_any(&"a".to_string()), Some(1));
        assert_eq!(list.index_of_any(&42_i32), None);
        assert!(list.contains_any(&"b".to_string()));
        assert_eq!(list.iter_any().count(), 3);
    }

    #[test]
    fn test_read_only_list_rejects_mutation() {
        let collection = letters();
        let values = collection.values();
        let value: ErasedValue = std::sync::Arc::new("z".to_string());

        assert!(matches!(
            values.push_any(value.clone()),
            Err(CollectionError::NotSupported { operation: "push" })
        ));
        assert!(matches!(
            values.insert_any(0, value.clone()),
            Err(CollectionError::NotSupported { .. })
        ));
        assert!(matches!(
            values.set_any(0, value),
            Err(CollectionError::NotSupported { .. })
        ));
        assert!(values.remove_any(&"a".to_string()).is_err());
        assert!(ReadOnlyList::remove_at(&values, 0).is_err());
        assert!(ReadOnlyList::clear(&values).is_err());
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_item_comparer_and_equality() {
        let collection = letters();
        let items = collection.items();
        let by_value = ItemComparer::new(&NaturalOrder);
        assert_eq!(by_value.compare_items(&items[0], &items[1]), Ordering::Greater);
        assert_eq!(
            by_value.compare_to_value(&items[2], &"c".to_string()),
            Ordering::Equal
        );

        let descending = Descending(NaturalOrder);
        let by_desc = ItemComparer::new(&descending);
        assert_eq!(by_desc.compare_items(&items[0], &items[1]), Ordering::Less);

        let target = "a".to_string();
        let equality = ItemEquality::new(&target);
        assert_eq!(items.iter().position(|item| equality.matches(item)), Some(1));
    }

    #[test]
    fn test_closure_comparer() {
        let by_len = |a: &String, b: &String| a.len().cmp(&b.len());
        assert_eq!(
            by_len.compare(&"aa".to_string(), &"b".to_string()),
            Ordering::Greater
        );
    }
}
