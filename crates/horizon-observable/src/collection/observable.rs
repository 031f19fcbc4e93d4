//! The observable collection.
//!
//! [`ObservableCollection<T>`] keeps an ordered sequence of elements, each
//! wrapped in an [`Item`], and tells connected views about every change:
//! additions, removals, reordering, in-place modification, selection and
//! scroll requests.
//!
//! # Notification contract
//!
//! - Each logical operation raises exactly one structural notification;
//!   batch operations raise one notification for the whole batch.
//! - Item-level `index_changed` fires only for wrappers whose index changed.
//! - Notifications are delivered after the collection reaches its new state
//!   and after its lock is released, so slots may read the collection. Slots
//!   must not mutate it.
//!
//! # Example
//!
//! ```
//! use horizon_observable::collection::{ObservableCollection, ScrollAlignment};
//!
//! let fruits = ObservableCollection::<String>::new();
//! fruits.signals().added.connect(|event| {
//!     println!("added {} item(s) at {}", event.range.count(), event.range);
//! });
//!
//! fruits.add("apple".to_string());
//! fruits.add_range(["banana", "cherry"].map(String::from));
//! fruits.set_selected_index(Some(1)).unwrap();
//! fruits.scroll_to_value(&"cherry".to_string(), ScrollAlignment::Center, 0.0);
//!
//! assert_eq!(fruits.len(), 3);
//! assert_eq!(fruits.selected_value().as_deref().map(String::as_str), Some("banana"));
//! ```

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Weak};

use horizon_observable_core::logging::targets;
use horizon_observable_core::{observable_trace, OnceProperty, PerfSpan};
use parking_lot::{RwLock, RwLockReadGuard};

use super::adapter::{Comparer, ItemComparer, ItemEquality, ItemsView, NaturalOrder, ValuesView};
use super::change::{
    AddReason, Batch, ChangeRange, CollectionSignals, ItemsAdded, ItemsModified, ItemsMoved,
    ItemsRemoved, MoveReason, Pending, RemoveReason, ScrollAlignment, ScrolledTo,
};
use super::item::{Item, ItemRef, SelectionHost};
use super::selection::{Promotion, SelectionState};
use crate::config::{CollectionBuilder, CollectionConfig};
use crate::error::{CollectionError, Result};

/// A non-owning reference to whatever owns a collection.
pub type OwnerRef = Weak<dyn Any + Send + Sync>;

struct State<T: 'static> {
    items: Vec<ItemRef<T>>,
    selection: SelectionState<T>,
    last_scroll: Option<ScrolledTo>,
}

impl<T: Send + Sync + 'static> State<T> {
    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(CollectionError::index_out_of_range(index, self.items.len()))
        }
    }

    fn check_range(&self, start: usize, count: usize) -> Result<()> {
        match start.checked_add(count) {
            Some(end) if end <= self.items.len() => Ok(()),
            _ => Err(CollectionError::index_out_of_range(
                start.saturating_add(count),
                self.items.len(),
            )),
        }
    }

    /// The stored handle for `item`, if it belongs to this sequence.
    fn handle_of(&self, item: &Item<T>) -> Option<ItemRef<T>> {
        self.items
            .get(item.index())
            .filter(|handle| handle.is_same(item))
            .cloned()
    }

    /// Bring every index from `from` up to `to` (exclusive) in line with
    /// its position.
    fn renumber(&self, from: usize, to: usize, batch: &mut Batch<T>) {
        for (position, item) in self.items[from..to].iter().enumerate() {
            let index = from + position;
            if item.assign_index(index) {
                batch.push(Pending::IndexChanged(Arc::clone(item), index));
            }
        }
    }

    /// Deselect, dispose and drop `count` wrappers at `start`.
    fn remove_span(
        &mut self,
        start: usize,
        count: usize,
        reason: RemoveReason,
        batch: &mut Batch<T>,
    ) -> Vec<ItemRef<T>> {
        for item in &self.items[start..start + count] {
            if item.is_selected() || self.selection.contains(item) {
                self.selection
                    .deselect(item, Promotion::MostRecent, true, batch);
            }
        }
        for item in &self.items[start..start + count] {
            item.dispose();
        }

        let removed: Vec<ItemRef<T>> = self.items.drain(start..start + count).collect();
        batch.push(Pending::Removed(ItemsRemoved {
            range: ChangeRange::new(start, count),
            reason,
            items: removed.clone(),
        }));
        self.renumber(start, self.items.len(), batch);
        batch.settle_primary(self.selection.primary_index());
        removed
    }

    /// Swap the wrapper at `index` for `replacement`, disposing the old one.
    fn substitute(&mut self, index: usize, replacement: ItemRef<T>, batch: &mut Batch<T>) -> ItemRef<T> {
        let old = Arc::clone(&self.items[index]);
        if old.is_selected() || self.selection.contains(&old) {
            self.selection
                .deselect(&old, Promotion::MostRecent, true, batch);
        }
        old.dispose();
        self.items[index] = replacement;
        batch.settle_primary(self.selection.primary_index());
        old
    }
}

struct Inner<T: 'static> {
    state: RwLock<State<T>>,
    signals: CollectionSignals<T>,
    config: CollectionConfig,
    owner: OnceProperty<OwnerRef>,
    identity_path: OnceProperty<String>,
}

impl<T: Send + Sync + 'static> Inner<T> {
    fn dispatch(&self, batch: Batch<T>) {
        batch.dispatch(&self.signals, &self.config.name, self.config.trace_notifications);
    }
}

impl<T: Send + Sync + 'static> SelectionHost<T> for Inner<T> {
    fn request_selection(&self, item: &Item<T>, selected: bool) {
        let mut batch = Batch::new();
        {
            let mut state = self.state.write();
            let Some(handle) = state.handle_of(item) else {
                tracing::trace!(target: targets::SELECTION, "selection request from foreign item");
                return;
            };
            state.selection.force(&handle, selected, &mut batch);
        }
        self.dispatch(batch);
    }
}

/// An ordered collection that notifies views of every change.
///
/// Cloning yields another handle to the same collection.
pub struct ObservableCollection<T: 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: 'static> Clone for ObservableCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> Default for ObservableCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> ObservableCollection<T> {
    /// Creates an empty collection with default settings.
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::default())
    }

    /// Creates an empty collection with the given settings.
    pub fn with_config(config: CollectionConfig) -> Self {
        let identity_path = match config.identity_path.clone() {
            Some(path) => OnceProperty::with_value("identity_path", path),
            None => OnceProperty::new("identity_path"),
        };

        let state = State {
            items: Vec::with_capacity(config.initial_capacity),
            selection: SelectionState::new(),
            last_scroll: None,
        };

        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                signals: CollectionSignals::new(),
                config,
                owner: OnceProperty::new("owner"),
                identity_path,
            }),
        }
    }

    /// Creates a collection holding `items`, without raising notifications.
    pub fn from_items<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<T>>,
    {
        let collection = Self::new();
        collection.load(items.into_iter().map(Into::into).collect());
        collection
    }

    /// Start building a collection.
    pub fn builder() -> CollectionBuilder<T> {
        CollectionBuilder::new()
    }

    /// Append values without raising notifications. Used while building.
    pub(crate) fn load(&self, values: Vec<Arc<T>>) {
        let mut state = self.inner.state.write();
        let start = state.items.len();
        let items: Vec<ItemRef<T>> = values
            .into_iter()
            .enumerate()
            .map(|(offset, value)| self.wrap(value, start + offset))
            .collect();
        state.items.extend(items);
    }

    fn wrap(&self, value: Arc<T>, index: usize) -> ItemRef<T> {
        let host: Weak<dyn SelectionHost<T>> = Arc::downgrade(&self.inner) as Weak<Inner<T>>;
        Arc::new(Item::new(value, index, host))
    }

    fn read(&self) -> RwLockReadGuard<'_, State<T>> {
        self.inner.state.read()
    }

    fn dispatch(&self, batch: Batch<T>) {
        self.inner.dispatch(batch);
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// The settings this collection was created with.
    pub fn config(&self) -> &CollectionConfig {
        &self.inner.config
    }

    /// The collection's name, used in log output.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Record the collection's owner. Can only be done once.
    pub fn set_owner<O: Any + Send + Sync>(&self, owner: &Arc<O>) -> Result<()> {
        let weak: OwnerRef = Arc::downgrade(owner) as Weak<O>;
        self.set_owner_ref(weak)
    }

    pub(crate) fn set_owner_ref(&self, owner: OwnerRef) -> Result<()> {
        self.inner.owner.set(owner)?;
        Ok(())
    }

    /// The owner, if one was recorded and is still alive.
    pub fn owner(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.inner.owner.get().and_then(|owner| owner.upgrade())
    }

    /// Record the binding path that identifies this collection. Can only be
    /// done once, including through [`CollectionConfig::identity_path`].
    pub fn set_identity_path(&self, path: impl Into<String>) -> Result<()> {
        self.inner.identity_path.set(path.into())?;
        Ok(())
    }

    /// The identity path, if set.
    pub fn identity_path(&self) -> Option<&str> {
        self.inner.identity_path.get().map(String::as_str)
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// The collection-level signals.
    pub fn signals(&self) -> &CollectionSignals<T> {
        &self.inner.signals
    }

    /// Suppress (or resume) every collection-level notification.
    ///
    /// Item-level signals are unaffected.
    pub fn set_notifications_blocked(&self, blocked: bool) {
        self.inner.signals.set_blocked(blocked);
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    /// Returns `true` if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    /// The element at `index`.
    pub fn get(&self, index: usize) -> Option<Arc<T>> {
        self.read().items.get(index).map(|item| item.shared_value())
    }

    /// The wrapper at `index`.
    pub fn item(&self, index: usize) -> Option<ItemRef<T>> {
        self.read().items.get(index).cloned()
    }

    /// The first element.
    pub fn first(&self) -> Option<Arc<T>> {
        self.read().items.first().map(|item| item.shared_value())
    }

    /// The last element.
    pub fn last(&self) -> Option<Arc<T>> {
        self.read().items.last().map(|item| item.shared_value())
    }

    /// Snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.read()
            .items
            .iter()
            .map(|item| item.shared_value())
            .collect()
    }

    /// Borrow the wrapper sequence. Holds the read lock until dropped.
    pub fn items(&self) -> ItemsView<'_, T> {
        ItemsView::new(RwLockReadGuard::map(self.read(), |state| state.items.as_slice()))
    }

    /// Borrow the element sequence. Holds the read lock until dropped.
    pub fn values(&self) -> ValuesView<'_, T> {
        ValuesView::new(RwLockReadGuard::map(self.read(), |state| state.items.as_slice()))
    }

    /// Position of the first element matching `predicate`.
    pub fn find_index<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.read()
            .items
            .iter()
            .position(|item| predicate(item.value()))
    }

    // =========================================================================
    // Structural mutation
    // =========================================================================

    /// Append an element. Raises one `added` notification with reason `Add`.
    pub fn add(&self, value: impl Into<Arc<T>>) -> ItemRef<T> {
        let mut batch = Batch::new();
        let item = {
            let mut state = self.inner.state.write();
            let index = state.items.len();
            let item = self.wrap(value.into(), index);
            state.items.push(Arc::clone(&item));
            batch.push(Pending::Added(ItemsAdded {
                range: ChangeRange::single(index),
                reason: AddReason::Add,
                items: vec![Arc::clone(&item)],
            }));
            observable_trace!(collection = %self.name(), index, "add");
            item
        };
        self.dispatch(batch);
        item
    }

    /// Append several elements. Raises one `added` notification for the
    /// whole batch; nothing if `values` is empty.
    pub fn add_range<I, V>(&self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<T>>,
    {
        let values: Vec<Arc<T>> = values.into_iter().map(Into::into).collect();
        let mut batch = Batch::new();
        {
            let mut state = self.inner.state.write();
            let index = state.items.len();
            self.place(&mut state, index, values, AddReason::Add, &mut batch);
        }
        self.dispatch(batch);
    }

    /// Insert an element at `index` (`0..=len`).
    pub fn insert(&self, index: usize, value: impl Into<Arc<T>>) -> Result<ItemRef<T>> {
        let mut inserted = self.insert_values(index, vec![value.into()], AddReason::Insert)?;
        inserted
            .pop()
            .ok_or_else(|| CollectionError::invalid_operation("insert produced no item"))
    }

    /// Insert several elements at `index` (`0..=len`). Raises one `added`
    /// notification with reason `Insert`.
    pub fn insert_range<I, V>(&self, index: usize, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<T>>,
    {
        let values: Vec<Arc<T>> = values.into_iter().map(Into::into).collect();
        self.insert_values(index, values, AddReason::Insert)?;
        Ok(())
    }

    /// Shared insert path for a caller-supplied position.
    fn insert_values(
        &self,
        index: usize,
        values: Vec<Arc<T>>,
        reason: AddReason,
    ) -> Result<Vec<ItemRef<T>>> {
        let mut batch = Batch::new();
        let inserted = {
            let mut state = self.inner.state.write();
            let len = state.items.len();
            if index > len {
                return Err(CollectionError::index_out_of_range(index, len));
            }
            self.place(&mut state, index, values, reason, &mut batch)
        };
        self.dispatch(batch);
        Ok(inserted)
    }

    /// Wrap `values` and splice them in at `index`, which must be `0..=len`.
    fn place(
        &self,
        state: &mut State<T>,
        index: usize,
        values: Vec<Arc<T>>,
        reason: AddReason,
        batch: &mut Batch<T>,
    ) -> Vec<ItemRef<T>> {
        if values.is_empty() {
            return Vec::new();
        }

        let count = values.len();
        let inserted: Vec<ItemRef<T>> = values
            .into_iter()
            .enumerate()
            .map(|(offset, value)| self.wrap(value, index + offset))
            .collect();
        state.items.splice(index..index, inserted.iter().cloned());

        batch.push(Pending::Added(ItemsAdded {
            range: ChangeRange::new(index, count),
            reason,
            items: inserted.clone(),
        }));
        let len = state.items.len();
        state.renumber(index + count, len, batch);
        tracing::debug!(target: targets::COLLECTION, collection = %self.name(), index, count, ?reason, "inserted");
        inserted
    }

    /// Remove the element at `index`.
    pub fn remove_at(&self, index: usize) -> Result<ItemRef<T>> {
        let mut batch = Batch::new();
        let item = {
            let mut state = self.inner.state.write();
            state.check_index(index)?;
            let item = Arc::clone(&state.items[index]);
            state.remove_span(index, 1, RemoveReason::Remove, &mut batch);
            observable_trace!(collection = %self.name(), index, "remove_at");
            item
        };
        self.dispatch(batch);
        Ok(item)
    }

    /// Remove `count` elements starting at `start`. Raises one `removed`
    /// notification; nothing if `count` is zero.
    pub fn remove_range(&self, start: usize, count: usize) -> Result<Vec<ItemRef<T>>> {
        self.remove_span(start, count, RemoveReason::Remove)
    }

    fn remove_span(&self, start: usize, count: usize, reason: RemoveReason) -> Result<Vec<ItemRef<T>>> {
        let mut batch = Batch::new();
        let removed = {
            let mut state = self.inner.state.write();
            if count == 0 {
                // An empty range is valid anywhere up to the end.
                return if start <= state.items.len() {
                    Ok(Vec::new())
                } else {
                    Err(CollectionError::index_out_of_range(start, state.items.len()))
                };
            }
            state.check_range(start, count)?;
            let removed = state.remove_span(start, count, reason, &mut batch);
            tracing::debug!(target: targets::COLLECTION, collection = %self.name(), start, count, ?reason, "removed");
            removed
        };
        self.dispatch(batch);
        Ok(removed)
    }

    /// Remove every element. Raises one `removed` notification with reason
    /// `Clear`; nothing if already empty.
    pub fn clear(&self) {
        let mut batch = Batch::new();
        {
            let mut state = self.inner.state.write();
            let len = state.items.len();
            if len == 0 {
                return;
            }
            state.remove_span(0, len, RemoveReason::Clear, &mut batch);
            state.selection.clear(&mut batch);
            tracing::debug!(target: targets::COLLECTION, collection = %self.name(), count = len, "cleared");
        }
        self.dispatch(batch);
    }

    /// Replace the element at `index`.
    ///
    /// If `value` is the very allocation already stored there, nothing
    /// happens and the existing wrapper is returned. Otherwise the old
    /// wrapper is disposed and a `removed` then an `added` notification, both
    /// with reason `Replace`, are raised.
    pub fn replace(&self, index: usize, value: impl Into<Arc<T>>) -> Result<ItemRef<T>> {
        let value = value.into();
        let mut batch = Batch::new();
        let replacement = {
            let mut state = self.inner.state.write();
            state.check_index(index)?;
            if state.items[index].wraps(&value) {
                return Ok(Arc::clone(&state.items[index]));
            }

            let replacement = self.wrap(value, index);
            let old = state.substitute(index, Arc::clone(&replacement), &mut batch);
            push_replace(&mut batch, index, vec![old], vec![Arc::clone(&replacement)]);
            observable_trace!(collection = %self.name(), index, "replace");
            replacement
        };
        self.dispatch(batch);
        Ok(replacement)
    }

    /// Replace the whole sequence.
    ///
    /// Positions shared by the old and new sequence are replaced in place
    /// (identical allocations are kept); each contiguous run of replaced
    /// positions raises one `removed`/`added` pair with reason `Replace`.
    /// Extra new values are appended (reason `Add`) and surplus old elements
    /// are removed (reason `Remove`).
    pub fn replace_all<I, V>(&self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<T>>,
    {
        let _span = PerfSpan::new("replace_all");
        let values: Vec<Arc<T>> = values.into_iter().map(Into::into).collect();
        let mut batch = Batch::new();
        {
            let mut state = self.inner.state.write();
            let old_len = state.items.len();
            let new_len = values.len();
            let overlap = old_len.min(new_len);
            let mut values = values.into_iter();

            let mut run: Option<(usize, Vec<ItemRef<T>>, Vec<ItemRef<T>>)> = None;
            for (index, value) in values.by_ref().take(overlap).enumerate() {
                if state.items[index].wraps(&value) {
                    if let Some((start, old, new)) = run.take() {
                        push_replace(&mut batch, start, old, new);
                    }
                    continue;
                }
                let replacement = self.wrap(value, index);
                let old = state.substitute(index, Arc::clone(&replacement), &mut batch);
                let (_, olds, news) = run.get_or_insert_with(|| (index, Vec::new(), Vec::new()));
                olds.push(old);
                news.push(replacement);
            }
            if let Some((start, old, new)) = run.take() {
                push_replace(&mut batch, start, old, new);
            }

            if new_len > old_len {
                let appended: Vec<ItemRef<T>> = values
                    .enumerate()
                    .map(|(offset, value)| self.wrap(value, old_len + offset))
                    .collect();
                state.items.extend(appended.iter().cloned());
                batch.push(Pending::Added(ItemsAdded {
                    range: ChangeRange::new(old_len, new_len - old_len),
                    reason: AddReason::Add,
                    items: appended,
                }));
            } else if new_len < old_len {
                state.remove_span(new_len, old_len - new_len, RemoveReason::Remove, &mut batch);
            }
            tracing::debug!(target: targets::COLLECTION, collection = %self.name(), old_len, new_len, "replaced all");
        }
        self.dispatch(batch);
    }

    // =========================================================================
    // Reordering
    // =========================================================================

    /// Sort `count` elements starting at `start` with `comparer`.
    ///
    /// The sort is stable and keeps every wrapper (and its selection) alive.
    /// Raises one `moved` notification with reason `Sort`; nothing if
    /// `count` is zero. The comparer must not access this collection.
    pub fn sort_range<C>(&self, start: usize, count: usize, comparer: &C) -> Result<()>
    where
        C: Comparer<T> + ?Sized,
    {
        let _span = PerfSpan::new("sort");
        let by_value = ItemComparer::new(comparer);
        self.reorder(start, count, MoveReason::Sort, |items| {
            items.sort_by(|a, b| by_value.compare_items(a, b));
        })
    }

    /// Sort every element with `comparer`.
    pub fn sort_with<C>(&self, comparer: &C)
    where
        C: Comparer<T> + ?Sized,
    {
        let _span = PerfSpan::new("sort");
        let by_value = ItemComparer::new(comparer);
        self.reorder_all(MoveReason::Sort, |items| {
            items.sort_by(|a, b| by_value.compare_items(a, b));
        });
    }

    /// Sort every element with a comparison function.
    pub fn sort_by<F>(&self, compare: F)
    where
        F: Fn(&T, &T) -> Ordering,
    {
        self.sort_with(&compare);
    }

    /// Sort every element by a key.
    pub fn sort_by_key<K, F>(&self, key: F)
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        self.sort_with(&|a: &T, b: &T| key(a).cmp(&key(b)));
    }

    /// Reverse every element. Raises one `moved` notification with reason
    /// `Reverse`.
    pub fn reverse(&self) {
        let _span = PerfSpan::new("reverse");
        self.reorder_all(MoveReason::Reverse, |items| items.reverse());
    }

    /// Reverse `count` elements starting at `start`.
    pub fn reverse_range(&self, start: usize, count: usize) -> Result<()> {
        let _span = PerfSpan::new("reverse");
        self.reorder(start, count, MoveReason::Reverse, |items| items.reverse())
    }

    /// Move the element at `from` so that it ends up at `to`. Raises one
    /// `moved` notification with reason `Move` covering the shifted span.
    pub fn move_item(&self, from: usize, to: usize) -> Result<()> {
        {
            let state = self.read();
            state.check_index(from)?;
            state.check_index(to)?;
        }
        if from == to {
            return Ok(());
        }
        let (start, end) = (from.min(to), from.max(to));
        self.reorder(start, end - start + 1, MoveReason::Move, |items| {
            if from < to {
                items.rotate_left(1);
            } else {
                items.rotate_right(1);
            }
        })
    }

    fn reorder<F>(&self, start: usize, count: usize, reason: MoveReason, arrange: F) -> Result<()>
    where
        F: FnOnce(&mut [ItemRef<T>]),
    {
        let mut batch = Batch::new();
        {
            let mut state = self.inner.state.write();
            state.check_range(start, count)?;
            self.rearrange(&mut state, start, count, reason, arrange, &mut batch);
        }
        self.dispatch(batch);
        Ok(())
    }

    /// Reorder the whole sequence.
    fn reorder_all<F>(&self, reason: MoveReason, arrange: F)
    where
        F: FnOnce(&mut [ItemRef<T>]),
    {
        let mut batch = Batch::new();
        {
            let mut state = self.inner.state.write();
            let len = state.items.len();
            self.rearrange(&mut state, 0, len, reason, arrange, &mut batch);
        }
        self.dispatch(batch);
    }

    /// Apply `arrange` to a span already known to be in range.
    fn rearrange<F>(
        &self,
        state: &mut State<T>,
        start: usize,
        count: usize,
        reason: MoveReason,
        arrange: F,
        batch: &mut Batch<T>,
    ) where
        F: FnOnce(&mut [ItemRef<T>]),
    {
        if count == 0 {
            return;
        }
        arrange(&mut state.items[start..start + count]);
        batch.push(Pending::Moved(ItemsMoved {
            range: ChangeRange::new(start, count),
            reason,
        }));
        state.renumber(start, start + count, batch);
        tracing::debug!(target: targets::COLLECTION, collection = %self.name(), start, count, ?reason, "reordered");
    }

    // =========================================================================
    // Modification and scrolling
    // =========================================================================

    /// Report `count` elements starting at `start` as modified.
    ///
    /// Each wrapper's `modified` signal fires, then one collection-level
    /// `modified` notification carrying `field_path` (empty for the whole
    /// item). The sequence is not changed.
    pub fn notify_modified(&self, start: usize, count: usize, field_path: impl Into<String>) -> Result<()> {
        let field_path = field_path.into();
        let mut batch = Batch::new();
        {
            let state = self.read();
            state.check_range(start, count)?;
            if count == 0 {
                return Ok(());
            }
            for item in &state.items[start..start + count] {
                batch.push(Pending::ItemModified(Arc::clone(item), field_path.clone()));
            }
            batch.push(Pending::Modified(ItemsModified {
                range: ChangeRange::new(start, count),
                field_path,
            }));
        }
        self.dispatch(batch);
        Ok(())
    }

    /// Report the element at `index` as modified.
    pub fn notify_item_modified(&self, index: usize, field_path: impl Into<String>) -> Result<()> {
        self.notify_modified(index, 1, field_path)
    }

    /// Ask views to bring the element at `index` into view.
    ///
    /// The request is remembered as [`last_scroll`](Self::last_scroll).
    pub fn scroll_to_index(&self, index: usize, alignment: ScrollAlignment, offset: f32) -> Result<()> {
        let mut batch = Batch::new();
        {
            let mut state = self.inner.state.write();
            state.check_index(index)?;
            let request = ScrolledTo {
                index,
                alignment,
                offset,
            };
            state.last_scroll = Some(request);
            batch.push(Pending::Scrolled(request));
        }
        self.dispatch(batch);
        Ok(())
    }

    /// The most recent scroll request, for views that connect late.
    pub fn last_scroll(&self) -> Option<ScrolledTo> {
        self.read().last_scroll
    }

    /// Forget the remembered scroll request.
    pub fn clear_last_scroll(&self) {
        self.inner.state.write().last_scroll = None;
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Index of the primary selection.
    pub fn selected_index(&self) -> Option<usize> {
        self.read().selection.primary_index()
    }

    /// Wrapper of the primary selection.
    pub fn selected_item(&self) -> Option<ItemRef<T>> {
        self.read().selection.primary().cloned()
    }

    /// Element of the primary selection.
    pub fn selected_value(&self) -> Option<Arc<T>> {
        self.read()
            .selection
            .primary()
            .map(|item| item.shared_value())
    }

    /// Every selected wrapper, in the order they were selected.
    pub fn selected_items(&self) -> Vec<ItemRef<T>> {
        self.read().selection.members().to_vec()
    }

    /// Every selected element, in the order they were selected.
    pub fn selected_values(&self) -> Vec<Arc<T>> {
        self.read()
            .selection
            .members()
            .iter()
            .map(|item| item.shared_value())
            .collect()
    }

    /// Returns `true` if the element at `index` is selected.
    pub fn is_selected(&self, index: usize) -> bool {
        self.read()
            .items
            .get(index)
            .is_some_and(|item| item.is_selected())
    }

    /// Move the primary selection.
    ///
    /// `Some(index)` deselects the previous primary and selects `index`,
    /// raising one `selection_changed` notification for the new primary (the
    /// previous primary only raises its item-level signal). Setting the
    /// current primary again does nothing. `None` deselects the primary and
    /// leaves no primary; other selected elements stay selected.
    pub fn set_selected_index(&self, index: Option<usize>) -> Result<()> {
        let mut batch = Batch::new();
        {
            let mut state = self.inner.state.write();
            let previous = state.selection.primary().cloned();
            match index {
                Some(index) => {
                    state.check_index(index)?;
                    let target = Arc::clone(&state.items[index]);
                    if previous.as_ref().is_some_and(|p| Arc::ptr_eq(p, &target)) {
                        return Ok(());
                    }
                    if let Some(previous) = previous {
                        state
                            .selection
                            .deselect(&previous, Promotion::MostRecent, false, &mut batch);
                    }
                    state.selection.select(&target, true, &mut batch);
                }
                None => {
                    let Some(previous) = previous else {
                        return Ok(());
                    };
                    state
                        .selection
                        .deselect(&previous, Promotion::Clear, true, &mut batch);
                }
            }
            tracing::debug!(target: targets::SELECTION, collection = %self.name(), ?index, "primary selection set");
        }
        self.dispatch(batch);
        Ok(())
    }

    /// Move the primary selection to `item`, or clear it with `None`.
    ///
    /// Fails with `InvalidArgument` if the wrapper is not part of this
    /// collection (for example because it was disposed).
    pub fn set_selected_item(&self, item: Option<&ItemRef<T>>) -> Result<()> {
        let index = match item {
            Some(item) => Some(self.position_of(item)?),
            None => None,
        };
        self.set_selected_index(index)
    }

    /// Apply a selection state to `item` unconditionally.
    ///
    /// Unlike [`Item::set_selected`], this raises item-level and
    /// collection-level notifications even if the state does not change.
    /// Selecting makes the item primary; deselecting the primary promotes
    /// the most recently selected remaining item. Disposed wrappers are
    /// ignored.
    pub fn force_select(&self, item: &Item<T>, selected: bool) -> Result<()> {
        if item.is_disposed() {
            return Ok(());
        }
        let mut batch = Batch::new();
        {
            let mut state = self.inner.state.write();
            let handle = state
                .handle_of(item)
                .ok_or_else(|| CollectionError::invalid_argument("item belongs to another collection"))?;
            state.selection.force(&handle, selected, &mut batch);
        }
        self.dispatch(batch);
        Ok(())
    }

    /// Force-select the element at `index`.
    pub fn select(&self, index: usize) -> Result<()> {
        let item = self.item_at(index)?;
        self.force_select(&item, true)
    }

    /// Force-deselect the element at `index`.
    pub fn deselect(&self, index: usize) -> Result<()> {
        let item = self.item_at(index)?;
        self.force_select(&item, false)
    }

    /// Deselect every selected element and clear the primary selection.
    pub fn clear_selection(&self) {
        let mut batch = Batch::new();
        self.inner.state.write().selection.clear(&mut batch);
        self.dispatch(batch);
    }

    fn item_at(&self, index: usize) -> Result<ItemRef<T>> {
        let state = self.read();
        state.check_index(index)?;
        Ok(Arc::clone(&state.items[index]))
    }

    fn position_of(&self, item: &Item<T>) -> Result<usize> {
        self.read()
            .handle_of(item)
            .map(|handle| handle.index())
            .ok_or_else(|| CollectionError::invalid_argument("item belongs to another collection"))
    }
}

impl<T: PartialEq + Send + Sync + 'static> ObservableCollection<T> {
    /// Position of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        let equality = ItemEquality::new(value);
        self.read()
            .items
            .iter()
            .position(|item| equality.matches(item))
    }

    /// Position of the last element equal to `value`.
    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        let equality = ItemEquality::new(value);
        self.read()
            .items
            .iter()
            .rposition(|item| equality.matches(item))
    }

    /// Returns `true` if an element equal to `value` is present.
    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// The wrapper of the first element equal to `value`.
    pub fn item_for_value(&self, value: &T) -> Option<ItemRef<T>> {
        let equality = ItemEquality::new(value);
        self.read()
            .items
            .iter()
            .find(|item| equality.matches(item))
            .cloned()
    }

    /// Remove the first element equal to `value`. Returns `false` if there is none.
    pub fn remove(&self, value: &T) -> bool {
        let equality = ItemEquality::new(value);
        let mut batch = Batch::new();
        {
            let mut state = self.inner.state.write();
            let Some(index) = state.items.iter().position(|item| equality.matches(item)) else {
                return false;
            };
            state.remove_span(index, 1, RemoveReason::Remove, &mut batch);
            observable_trace!(collection = %self.name(), index, "remove");
        }
        self.dispatch(batch);
        true
    }

    /// Move the primary selection to the first element equal to `value`, or
    /// clear it with `None`. Returns `false` (and changes nothing) if no
    /// element matches.
    pub fn set_selected_value(&self, value: Option<&T>) -> bool {
        let index = match value {
            Some(value) => match self.index_of(value) {
                Some(index) => Some(index),
                None => return false,
            },
            None => None,
        };
        self.set_selected_index(index).is_ok()
    }

    /// Scroll to the first element equal to `value`.
    ///
    /// Returns `false` without raising anything if no element matches.
    pub fn scroll_to_value(&self, value: &T, alignment: ScrollAlignment, offset: f32) -> bool {
        match self.index_of(value) {
            Some(index) => self.scroll_to_index(index, alignment, offset).is_ok(),
            None => false,
        }
    }

    /// Report the first element equal to `value` as modified. Returns
    /// `false` if no element matches.
    pub fn notify_value_modified(&self, value: &T, field_path: impl Into<String>) -> bool {
        match self.index_of(value) {
            Some(index) => self.notify_modified(index, 1, field_path).is_ok(),
            None => false,
        }
    }

    /// Binary search by `comparer` over a sequence sorted by it.
    ///
    /// Same contract as [`slice::binary_search_by`].
    pub fn binary_search_by<C>(&self, value: &T, comparer: &C) -> std::result::Result<usize, usize>
    where
        C: Comparer<T> + ?Sized,
    {
        let by_value = ItemComparer::new(comparer);
        self.read()
            .items
            .binary_search_by(|item| by_value.compare_to_value(item, value))
    }
}

impl<T: Ord + Send + Sync + 'static> ObservableCollection<T> {
    /// Sort every element by its natural order.
    pub fn sort(&self) {
        self.sort_with(&NaturalOrder);
    }

    /// Binary search over a sequence sorted by natural order.
    pub fn binary_search(&self, value: &T) -> std::result::Result<usize, usize> {
        self.binary_search_by(value, &NaturalOrder)
    }
}

impl<T: Send + Sync + 'static> FromIterator<T> for ObservableCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

impl<T: fmt::Debug + Send + Sync + 'static> fmt::Debug for ObservableCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("ObservableCollection")
            .field("name", &self.inner.config.name)
            .field("len", &state.items.len())
            .field("selected_index", &state.selection.primary_index())
            .finish()
    }
}

fn push_replace<T: Send + Sync + 'static>(
    batch: &mut Batch<T>,
    start: usize,
    old: Vec<ItemRef<T>>,
    new: Vec<ItemRef<T>>,
) {
    let range = ChangeRange::new(start, new.len());
    batch.push(Pending::Removed(ItemsRemoved {
        range,
        reason: RemoveReason::Replace,
        items: old,
    }));
    batch.push(Pending::Added(ItemsAdded {
        range,
        reason: AddReason::Replace,
        items: new,
    }));
}

static_assertions::assert_impl_all!(ObservableCollection<String>: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{ChangeAction, CollectionChange, Descending};
    use parking_lot::Mutex;

    /// Records every collection-level notification as `(action, start, count)`.
    fn record<T: Send + Sync + 'static>(
        collection: &ObservableCollection<T>,
    ) -> Arc<Mutex<Vec<(ChangeAction, usize, usize)>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let signals = collection.signals();

        fn push(log: &Mutex<Vec<(ChangeAction, usize, usize)>>, event: &dyn CollectionChange) {
            let range = event.range();
            log.lock().push((event.action(), range.start(), range.count()));
        }

        let l = log.clone();
        signals.added.connect(move |e| push(&l, e));
        let l = log.clone();
        signals.removed.connect(move |e| push(&l, e));
        let l = log.clone();
        signals.moved.connect(move |e| push(&l, e));
        let l = log.clone();
        signals.modified.connect(move |e| push(&l, e));
        let l = log.clone();
        signals.selection_changed.connect(move |e| push(&l, e));
        let l = log.clone();
        signals.scrolled_to.connect(move |e| push(&l, e));
        log
    }

    fn letters(values: &[&str]) -> ObservableCollection<String> {
        ObservableCollection::from_items(values.iter().map(|v| v.to_string()))
    }

    fn contents(collection: &ObservableCollection<String>) -> Vec<String> {
        collection.values().iter().cloned().collect()
    }

    fn assert_indices_match<T: Send + Sync + 'static>(collection: &ObservableCollection<T>) {
        for (position, item) in collection.items().iter().enumerate() {
            assert_eq!(item.index(), position);
            assert!(!item.is_disposed());
        }
    }

    #[test]
    fn test_add_range_raises_single_event() {
        let collection = letters(&["a"]);
        let log = record(&collection);

        collection.add_range(["b", "c"].map(String::from));
        collection.add_range(Vec::<String>::new());

        assert_eq!(*log.lock(), vec![(ChangeAction::Added, 1, 2)]);
        assert_eq!(contents(&collection), ["a", "b", "c"]);
        assert_indices_match(&collection);
    }

    #[test]
    fn test_insert_shifts_following_items() {
        let collection = letters(&["a", "d"]);
        let d = collection.item(1).unwrap();
        let moves = Arc::new(Mutex::new(Vec::new()));
        let m = moves.clone();
        d.index_changed.connect(move |&index| m.lock().push(index));

        let reasons = Arc::new(Mutex::new(Vec::new()));
        let r = reasons.clone();
        collection
            .signals()
            .added
            .connect(move |e| r.lock().push((e.reason, e.range.start(), e.range.end())));

        collection.insert_range(1, ["b", "c"].map(String::from)).unwrap();
        assert_eq!(contents(&collection), ["a", "b", "c", "d"]);
        assert_eq!(*moves.lock(), vec![3]);
        assert_eq!(*reasons.lock(), vec![(AddReason::Insert, 1, 2)]);
        assert_indices_match(&collection);
    }

    #[test]
    fn test_insert_out_of_range_is_atomic() {
        let collection = letters(&["a"]);
        let log = record(&collection);
        assert_eq!(
            collection.insert(2, "z".to_string()).unwrap_err(),
            CollectionError::index_out_of_range(2, 1)
        );
        assert!(collection.insert(1, "z".to_string()).is_ok());
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_remove_by_value_matches_first() {
        let collection = letters(&["a", "b", "a"]);
        let first = collection.item(0).unwrap();
        let last = collection.item(2).unwrap();

        assert!(collection.remove(&"a".to_string()));
        assert!(first.is_disposed());
        assert!(!last.is_disposed());
        assert_eq!(last.index(), 1);
        assert!(!collection.remove(&"zzz".to_string()));
        assert_eq!(collection.last_index_of(&"a".to_string()), Some(1));
    }

    #[test]
    fn test_remove_range_bounds() {
        let collection = letters(&["a", "b", "c"]);
        assert!(collection.remove_range(2, 2).is_err());
        assert!(collection.remove_range(3, 0).unwrap().is_empty());
        assert!(collection.remove_range(4, 0).is_err());
        let removed = collection.remove_range(0, 2).unwrap();
        assert!(removed.iter().all(|item| item.is_disposed()));
        assert_eq!(contents(&collection), ["c"]);
        assert_indices_match(&collection);
    }

    #[test]
    fn test_remove_at_reports_requested_index() {
        let collection = letters(&["a", "b", "c"]);
        let log = record(&collection);
        assert_eq!(
            collection.remove_at(5).unwrap_err(),
            CollectionError::index_out_of_range(5, 3)
        );
        assert_eq!(
            collection.remove_at(3).unwrap_err(),
            CollectionError::index_out_of_range(3, 3)
        );
        assert!(log.lock().is_empty());
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_selection_payload_agrees_with_live_primary() {
        let collection = letters(&["a", "b", "c"]);
        collection.select(2).unwrap();
        collection.select(0).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let reader = collection.clone();
        let s = seen.clone();
        collection.signals().selection_changed.connect(move |e| {
            s.lock().push((e.primary_index, reader.selected_index()));
        });

        collection.remove_at(0).unwrap();
        assert_eq!(*seen.lock(), vec![(Some(1), Some(1))]);

        collection.clear();
        assert_eq!(*seen.lock(), vec![(Some(1), Some(1)), (None, None)]);

        seen.lock().clear();
        collection.add_range(["x", "y", "z"].map(String::from));
        collection.select(1).unwrap();
        collection.select(0).unwrap();
        seen.lock().clear();
        collection.replace_all(["p", "q", "r"].map(String::from));
        assert_eq!(*seen.lock(), vec![(None, None), (None, None)]);
    }

    #[test]
    fn test_clear_disposes_and_resets_selection() {
        let collection = letters(&["a", "b", "c"]);
        collection.select(0).unwrap();
        collection.select(2).unwrap();
        let items: Vec<_> = collection.items().to_vec();
        let log = record(&collection);

        collection.clear();
        collection.clear();

        assert!(collection.is_empty());
        assert_eq!(collection.selected_index(), None);
        assert!(collection.selected_items().is_empty());
        assert!(items.iter().all(|i| i.is_disposed() && !i.is_selected()));

        let log = log.lock();
        let removed: Vec<_> = log
            .iter()
            .filter(|(action, _, _)| *action == ChangeAction::Removed)
            .collect();
        assert_eq!(removed, vec![&(ChangeAction::Removed, 0, 3)]);
        assert_eq!(log.last().map(|e| e.0), Some(ChangeAction::Removed));
    }

    #[test]
    fn test_replace_identical_allocation_is_noop() {
        let shared = Arc::new("b".to_string());
        let collection = ObservableCollection::<String>::new();
        collection.add("a".to_string());
        let original = collection.add(shared.clone());
        let log = record(&collection);

        let kept = collection.replace(1, shared).unwrap();
        assert!(kept.is_same(&original));
        assert!(log.lock().is_empty());

        // An equal but distinct value is still a replacement.
        let replacement = collection.replace(1, "b".to_string()).unwrap();
        assert!(original.is_disposed());
        assert_eq!(replacement.index(), 1);
        assert_eq!(
            *log.lock(),
            vec![(ChangeAction::Removed, 1, 1), (ChangeAction::Added, 1, 1)]
        );
    }

    #[test]
    fn test_replace_selected_item_deselects_first() {
        let collection = letters(&["a", "b"]);
        collection.set_selected_index(Some(1)).unwrap();
        let log = record(&collection);

        collection.replace(1, "c".to_string()).unwrap();
        assert_eq!(collection.selected_index(), None);
        assert_eq!(
            *log.lock(),
            vec![
                (ChangeAction::SelectionChanged, 1, 1),
                (ChangeAction::Removed, 1, 1),
                (ChangeAction::Added, 1, 1),
            ]
        );
    }

    #[test]
    fn test_replace_all_groups_runs() {
        let keep = Arc::new("keep".to_string());
        let collection = ObservableCollection::<String>::new();
        collection.add_range(vec![
            Arc::new("a".to_string()),
            Arc::new("b".to_string()),
            keep.clone(),
            Arc::new("d".to_string()),
            Arc::new("e".to_string()),
        ]);
        let kept = collection.item(2).unwrap();
        let log = record(&collection);

        collection.replace_all(vec![
            Arc::new("A".to_string()),
            Arc::new("B".to_string()),
            keep,
            Arc::new("D".to_string()),
        ]);

        assert_eq!(contents(&collection), ["A", "B", "keep", "D"]);
        assert!(!kept.is_disposed());
        assert_eq!(
            *log.lock(),
            vec![
                (ChangeAction::Removed, 0, 2),
                (ChangeAction::Added, 0, 2),
                (ChangeAction::Removed, 3, 1),
                (ChangeAction::Added, 3, 1),
                (ChangeAction::Removed, 4, 1),
            ]
        );
        assert_indices_match(&collection);
    }

    #[test]
    fn test_replace_all_grows() {
        let collection = letters(&["a"]);
        let log = record(&collection);
        collection.replace_all(["x", "y", "z"].map(String::from));
        assert_eq!(contents(&collection), ["x", "y", "z"]);
        assert_eq!(
            *log.lock(),
            vec![
                (ChangeAction::Removed, 0, 1),
                (ChangeAction::Added, 0, 1),
                (ChangeAction::Added, 1, 2),
            ]
        );
    }

    #[test]
    fn test_sort_preserves_identity_and_selection() {
        let collection = letters(&["c", "a", "b"]);
        let c = collection.item(0).unwrap();
        collection.select(0).unwrap();
        let log = record(&collection);

        collection.sort();
        assert_eq!(contents(&collection), ["a", "b", "c"]);
        assert!(collection.item(2).unwrap().is_same(&c));
        assert!(c.is_selected());
        assert_eq!(collection.selected_index(), Some(2));
        assert_eq!(*log.lock(), vec![(ChangeAction::Moved, 0, 3)]);

        collection.sort_with(&Descending(NaturalOrder));
        assert_eq!(contents(&collection), ["c", "b", "a"]);
        assert_indices_match(&collection);
    }

    #[test]
    fn test_sort_is_stable() {
        let collection = letters(&["bb", "a", "cc", "d"]);
        collection.sort_by_key(|s| s.len());
        assert_eq!(contents(&collection), ["a", "d", "bb", "cc"]);
        collection.sort_by(|a, b| b.len().cmp(&a.len()));
        assert_eq!(contents(&collection), ["bb", "cc", "a", "d"]);
    }

    #[test]
    fn test_sort_range_and_empty_range() {
        let collection = letters(&["d", "c", "b", "a"]);
        let log = record(&collection);
        collection.sort_range(1, 2, &NaturalOrder).unwrap();
        collection.sort_range(2, 0, &NaturalOrder).unwrap();
        assert!(collection.sort_range(3, 2, &NaturalOrder).is_err());
        assert_eq!(contents(&collection), ["d", "b", "c", "a"]);
        assert_eq!(*log.lock(), vec![(ChangeAction::Moved, 1, 2)]);
    }

    #[test]
    fn test_reverse_range_reasons() {
        let collection = letters(&["a", "b", "c", "d"]);
        let reasons = Arc::new(Mutex::new(Vec::new()));
        let r = reasons.clone();
        collection.signals().moved.connect(move |e| r.lock().push((e.reason, e.range)));

        collection.reverse_range(1, 3).unwrap();
        assert_eq!(contents(&collection), ["a", "d", "c", "b"]);
        collection.reverse();
        assert_eq!(contents(&collection), ["b", "c", "d", "a"]);
        assert_eq!(
            *reasons.lock(),
            vec![
                (MoveReason::Reverse, ChangeRange::new(1, 3)),
                (MoveReason::Reverse, ChangeRange::new(0, 4)),
            ]
        );
    }

    #[test]
    fn test_move_item_both_directions() {
        let collection = letters(&["a", "b", "c", "d"]);
        let a = collection.item(0).unwrap();
        let log = record(&collection);

        collection.move_item(0, 2).unwrap();
        assert_eq!(contents(&collection), ["b", "c", "a", "d"]);
        assert_eq!(a.index(), 2);

        collection.move_item(3, 0).unwrap();
        assert_eq!(contents(&collection), ["d", "b", "c", "a"]);
        collection.move_item(1, 1).unwrap();
        assert!(collection.move_item(0, 4).is_err());

        assert_eq!(
            *log.lock(),
            vec![(ChangeAction::Moved, 0, 3), (ChangeAction::Moved, 0, 4)]
        );
        assert_indices_match(&collection);
    }

    #[test]
    fn test_notify_modified_reaches_items() {
        let collection = letters(&["a", "b", "c"]);
        let b = collection.item(1).unwrap();
        let paths = Arc::new(Mutex::new(Vec::new()));
        let p = paths.clone();
        b.modified.connect(move |path| p.lock().push(path.clone()));
        let fields = Arc::new(Mutex::new(Vec::new()));
        let f = fields.clone();
        collection
            .signals()
            .modified
            .connect(move |e| f.lock().push((e.range, e.field_path.clone())));

        collection.notify_modified(0, 2, "name").unwrap();
        collection.notify_item_modified(1, "").unwrap();
        assert!(collection.notify_modified(2, 2, "name").is_err());
        assert!(collection.notify_value_modified(&"c".to_string(), "title"));
        assert!(!collection.notify_value_modified(&"x".to_string(), "title"));

        assert_eq!(*paths.lock(), vec!["name".to_string(), String::new()]);
        assert_eq!(
            *fields.lock(),
            vec![
                (ChangeRange::new(0, 2), "name".to_string()),
                (ChangeRange::single(1), String::new()),
                (ChangeRange::single(2), "title".to_string()),
            ]
        );
    }

    #[test]
    fn test_scroll_requests_are_remembered() {
        let collection = letters(&["a", "b"]);
        assert!(collection.last_scroll().is_none());
        collection
            .scroll_to_index(1, ScrollAlignment::Start, 4.0)
            .unwrap();
        assert_eq!(
            collection.scroll_to_index(2, ScrollAlignment::Start, 0.0),
            Err(CollectionError::index_out_of_range(2, 2))
        );

        let last = collection.last_scroll().unwrap();
        assert_eq!((last.index, last.alignment, last.offset), (1, ScrollAlignment::Start, 4.0));
        collection.clear_last_scroll();
        assert!(collection.last_scroll().is_none());
    }

    #[test]
    fn test_primary_setter_is_single_select() {
        let collection = letters(&["a", "b", "c"]);
        let log = record(&collection);

        collection.set_selected_index(Some(0)).unwrap();
        collection.set_selected_index(Some(0)).unwrap();
        collection.set_selected_index(Some(1)).unwrap();

        assert_eq!(collection.selected_index(), Some(1));
        assert!(!collection.is_selected(0));
        assert_eq!(collection.selected_values(), vec![Arc::new("b".to_string())]);
        assert_eq!(
            *log.lock(),
            vec![
                (ChangeAction::SelectionChanged, 0, 1),
                (ChangeAction::SelectionChanged, 1, 1),
            ]
        );
        assert!(collection.set_selected_index(Some(3)).is_err());
    }

    #[test]
    fn test_force_select_accumulates() {
        let collection = letters(&["a", "b", "c"]);
        collection.select(0).unwrap();
        collection.select(2).unwrap();
        assert_eq!(collection.selected_index(), Some(2));
        assert_eq!(collection.selected_items().len(), 2);

        // Deselecting the primary promotes the most recent remaining member.
        collection.deselect(2).unwrap();
        assert_eq!(collection.selected_index(), Some(0));

        // Clearing the primary leaves other members selected.
        collection.select(1).unwrap();
        collection.set_selected_index(None).unwrap();
        assert_eq!(collection.selected_index(), None);
        assert!(collection.is_selected(0));
        assert!(!collection.is_selected(1));

        collection.clear_selection();
        assert!(collection.selected_items().is_empty());
        assert!(!collection.is_selected(0));
    }

    #[test]
    fn test_force_select_raises_even_without_change() {
        let collection = letters(&["a"]);
        let item = collection.item(0).unwrap();
        let item_events = Arc::new(Mutex::new(0));
        let i = item_events.clone();
        item.selection_changed.connect(move |_| *i.lock() += 1);
        let log = record(&collection);

        collection.force_select(&item, true).unwrap();
        collection.force_select(&item, true).unwrap();
        item.set_selected(true);

        assert_eq!(*item_events.lock(), 2);
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_item_setter_routes_through_collection() {
        let collection = letters(&["a", "b"]);
        let b = collection.item(1).unwrap();
        b.set_selected(true);
        assert_eq!(collection.selected_index(), Some(1));
        b.set_selected(false);
        assert_eq!(collection.selected_index(), None);
        assert!(collection.selected_items().is_empty());
    }

    #[test]
    fn test_disposed_and_foreign_items() {
        let collection = letters(&["a", "b"]);
        let other = letters(&["a", "b"]);
        let removed = collection.remove_at(0).unwrap();

        assert!(collection.force_select(&removed, true).is_ok());
        assert!(!removed.is_selected());
        assert!(collection.selected_items().is_empty());

        let foreign = other.item(0).unwrap();
        assert!(matches!(
            collection.force_select(&foreign, true),
            Err(CollectionError::InvalidArgument { .. })
        ));
        assert!(collection.set_selected_item(Some(&foreign)).is_err());
        assert!(collection.set_selected_item(Some(&removed)).is_err());
    }

    #[test]
    fn test_selected_value_setter() {
        let collection = letters(&["a", "b"]);
        assert!(collection.set_selected_value(Some(&"b".to_string())));
        assert_eq!(collection.selected_item().map(|i| i.index()), Some(1));
        assert!(!collection.set_selected_value(Some(&"z".to_string())));
        assert_eq!(collection.selected_index(), Some(1));
        assert!(collection.set_selected_value(None));
        assert_eq!(collection.selected_value(), None);
    }

    #[test]
    fn test_lookup_helpers() {
        let collection = letters(&["a", "b", "c"]);
        assert_eq!(collection.index_of(&"b".to_string()), Some(1));
        assert!(collection.contains(&"c".to_string()));
        assert!(collection.item_for_value(&"z".to_string()).is_none());
        assert_eq!(collection.find_index(|v| v.as_str() > "a"), Some(1));
        assert_eq!(collection.first().as_deref().map(String::as_str), Some("a"));
        assert_eq!(collection.last().as_deref().map(String::as_str), Some("c"));
        assert_eq!(collection.get(1).as_deref().map(String::as_str), Some("b"));
        assert_eq!(collection.binary_search(&"b".to_string()), Ok(1));
        assert_eq!(collection.binary_search(&"bb".to_string()), Err(2));

        collection.sort_with(&Descending(NaturalOrder));
        assert_eq!(
            collection.binary_search_by(&"a".to_string(), &Descending(NaturalOrder)),
            Ok(2)
        );
        assert_eq!(
            collection.binary_search_by(&"bb".to_string(), &Descending(NaturalOrder)),
            Err(1)
        );
    }

    #[test]
    fn test_blocked_notifications() {
        let collection = letters(&["a"]);
        let log = record(&collection);
        collection.set_notifications_blocked(true);
        collection.add("b".to_string());
        collection.set_notifications_blocked(false);
        collection.add("c".to_string());
        assert_eq!(*log.lock(), vec![(ChangeAction::Added, 2, 1)]);
    }

    #[test]
    fn test_handlers_can_read_collection() {
        let collection = letters(&["a"]);
        let observed = Arc::new(Mutex::new(Vec::new()));
        let o = observed.clone();
        let reader = collection.clone();
        collection
            .signals()
            .added
            .connect(move |_| o.lock().push(reader.len()));

        collection.add("b".to_string());
        collection.add_range(["c", "d"].map(String::from));
        assert_eq!(*observed.lock(), vec![2, 4]);
    }

    #[test]
    fn test_one_time_settings() {
        let collection = ObservableCollection::<i32>::new();
        let owner = Arc::new(());
        collection.set_owner(&owner).unwrap();
        assert!(matches!(
            collection.set_owner(&owner),
            Err(CollectionError::InvalidOperation { .. })
        ));
        collection.set_identity_path("items").unwrap();
        assert!(collection.set_identity_path("other").is_err());
        assert_eq!(collection.identity_path(), Some("items"));
        assert_eq!(collection.name(), "collection");
    }

    #[test]
    fn test_clone_shares_state() {
        let collection: ObservableCollection<i32> = (1..=3).collect();
        let handle = collection.clone();
        handle.add(4);
        assert_eq!(collection.len(), 4);
        assert!(format!("{:?}", collection).contains("len: 4"));
    }
}
