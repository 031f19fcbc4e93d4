//! Change notifications raised by observable collections.
//!
//! Each notification kind has its own payload type and its own signal in
//! [`CollectionSignals`], so a view subscribes only to what it renders.
//! Payloads that carry wrappers are generic over the wrapper type: typed
//! subscribers see `Item<T>`, erased subscribers see `dyn AnyItem`, and both
//! point at the same allocations.

use std::fmt;
use std::sync::Arc;

use horizon_observable_core::{Signal, SignalEmitter};

use super::item::{Item, ItemRef};

/// The kind of change a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    /// Elements were inserted.
    Added,
    /// Elements were removed.
    Removed,
    /// Elements were reported as modified in place.
    Modified,
    /// Elements were reordered.
    Moved,
    /// An element's selection state was applied.
    SelectionChanged,
    /// A view was asked to bring an element into view.
    ScrolledTo,
}

/// Why elements were added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddReason {
    /// Appended at the end.
    Add,
    /// Inserted at a position.
    Insert,
    /// Substituted for a replaced element.
    Replace,
}

/// Why elements were removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoveReason {
    /// Removed by value or position.
    Remove,
    /// Removed by clearing the collection.
    Clear,
    /// Replaced by a new element.
    Replace,
}

/// Why elements were reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveReason {
    /// Sorted by a comparer.
    Sort,
    /// Reversed.
    Reverse,
    /// A single element was relocated.
    Move,
}

/// Where a scrolled-to element should land in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollAlignment {
    /// Scroll as little as possible to make the element visible.
    #[default]
    Nearest,
    /// Align the element with the start of the viewport.
    Start,
    /// Center the element in the viewport.
    Center,
    /// Align the element with the end of the viewport.
    End,
}

/// An inclusive index range with its element count.
///
/// `end == start + count - 1` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeRange {
    start: usize,
    end: usize,
    count: usize,
}

impl ChangeRange {
    /// Create a range of `count` elements starting at `start`.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero; every notification covers at least one element.
    pub fn new(start: usize, count: usize) -> Self {
        assert!(count > 0, "a change range covers at least one element");
        Self {
            start,
            end: start + count - 1,
            count,
        }
    }

    /// A range covering a single index.
    pub fn single(index: usize) -> Self {
        Self::new(index, 1)
    }

    /// First affected index.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last affected index (inclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of affected elements.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns `true` if `index` falls within the range.
    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

impl fmt::Display for ChangeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Common accessors shared by every notification payload.
pub trait CollectionChange {
    /// The kind of change.
    fn action(&self) -> ChangeAction;

    /// The affected index range.
    fn range(&self) -> ChangeRange;
}

/// Elements were added. Carries the newly created wrappers.
#[derive(Debug)]
pub struct ItemsAdded<I: ?Sized> {
    pub range: ChangeRange,
    pub reason: AddReason,
    pub items: Vec<Arc<I>>,
}

/// Elements were removed. Carries the removed (now disposed) wrappers.
#[derive(Debug)]
pub struct ItemsRemoved<I: ?Sized> {
    pub range: ChangeRange,
    pub reason: RemoveReason,
    pub items: Vec<Arc<I>>,
}

/// Elements were reordered in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemsMoved {
    pub range: ChangeRange,
    pub reason: MoveReason,
}

/// Elements were reported as modified without structural change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemsModified {
    pub range: ChangeRange,
    /// The modified field path. Empty means the whole item.
    pub field_path: String,
}

/// A selection state was applied to a wrapper.
#[derive(Debug)]
pub struct SelectionChanged<I: ?Sized> {
    pub range: ChangeRange,
    pub item: Arc<I>,
    pub selected: bool,
    /// The primary selection index once the raising operation completed.
    pub primary_index: Option<usize>,
}

/// A scroll request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrolledTo {
    pub index: usize,
    pub alignment: ScrollAlignment,
    pub offset: f32,
}

impl<I: ?Sized> Clone for ItemsAdded<I> {
    fn clone(&self) -> Self {
        Self {
            range: self.range,
            reason: self.reason,
            items: self.items.clone(),
        }
    }
}

impl<I: ?Sized> Clone for ItemsRemoved<I> {
    fn clone(&self) -> Self {
        Self {
            range: self.range,
            reason: self.reason,
            items: self.items.clone(),
        }
    }
}

impl<I: ?Sized> Clone for SelectionChanged<I> {
    fn clone(&self) -> Self {
        Self {
            range: self.range,
            item: Arc::clone(&self.item),
            selected: self.selected,
            primary_index: self.primary_index,
        }
    }
}

impl<I: ?Sized> CollectionChange for ItemsAdded<I> {
    fn action(&self) -> ChangeAction {
        ChangeAction::Added
    }

    fn range(&self) -> ChangeRange {
        self.range
    }
}

impl<I: ?Sized> CollectionChange for ItemsRemoved<I> {
    fn action(&self) -> ChangeAction {
        ChangeAction::Removed
    }

    fn range(&self) -> ChangeRange {
        self.range
    }
}

impl CollectionChange for ItemsMoved {
    fn action(&self) -> ChangeAction {
        ChangeAction::Moved
    }

    fn range(&self) -> ChangeRange {
        self.range
    }
}

impl CollectionChange for ItemsModified {
    fn action(&self) -> ChangeAction {
        ChangeAction::Modified
    }

    fn range(&self) -> ChangeRange {
        self.range
    }
}

impl<I: ?Sized> CollectionChange for SelectionChanged<I> {
    fn action(&self) -> ChangeAction {
        ChangeAction::SelectionChanged
    }

    fn range(&self) -> ChangeRange {
        self.range
    }
}

impl CollectionChange for ScrolledTo {
    fn action(&self) -> ChangeAction {
        ChangeAction::ScrolledTo
    }

    fn range(&self) -> ChangeRange {
        ChangeRange::single(self.index)
    }
}

/// Signals emitted by an observable collection.
///
/// Views connect to the kinds they care about. All signals fire after the
/// collection has reached its new state, so slots may query it freely.
pub struct CollectionSignals<T: 'static> {
    /// Emitted after elements are added.
    pub added: Signal<ItemsAdded<Item<T>>>,

    /// Emitted after elements are removed.
    pub removed: Signal<ItemsRemoved<Item<T>>>,

    /// Emitted when elements are reported as modified.
    pub modified: Signal<ItemsModified>,

    /// Emitted after elements are reordered.
    pub moved: Signal<ItemsMoved>,

    /// Emitted when a selection state is applied through the collection.
    pub selection_changed: Signal<SelectionChanged<Item<T>>>,

    /// Emitted when a scroll request is issued.
    pub scrolled_to: Signal<ScrolledTo>,
}

impl<T: 'static> Default for CollectionSignals<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> CollectionSignals<T> {
    /// Creates a new set of collection signals.
    pub fn new() -> Self {
        Self {
            added: Signal::new(),
            removed: Signal::new(),
            modified: Signal::new(),
            moved: Signal::new(),
            selection_changed: Signal::new(),
            scrolled_to: Signal::new(),
        }
    }

    /// The signal for a notification kind, without its argument type.
    pub fn emitter(&self, action: ChangeAction) -> &dyn SignalEmitter {
        match action {
            ChangeAction::Added => &self.added,
            ChangeAction::Removed => &self.removed,
            ChangeAction::Modified => &self.modified,
            ChangeAction::Moved => &self.moved,
            ChangeAction::SelectionChanged => &self.selection_changed,
            ChangeAction::ScrolledTo => &self.scrolled_to,
        }
    }

    fn emitters(&self) -> [&dyn SignalEmitter; 6] {
        [
            &self.added,
            &self.removed,
            &self.modified,
            &self.moved,
            &self.selection_changed,
            &self.scrolled_to,
        ]
    }

    /// Block or unblock every collection-level signal.
    pub fn set_blocked(&self, blocked: bool) {
        for emitter in self.emitters() {
            emitter.set_blocked(blocked);
        }
    }

    /// Returns `true` if every collection-level signal is blocked.
    pub fn is_blocked(&self) -> bool {
        self.emitters().iter().all(|emitter| emitter.is_blocked())
    }

    /// Total number of connected slots across all kinds.
    pub fn connection_count(&self) -> usize {
        self.emitters().iter().map(|emitter| emitter.connection_count()).sum()
    }

    /// Disconnect every slot of every kind.
    pub fn disconnect_all(&self) {
        for emitter in self.emitters() {
            emitter.disconnect_all();
        }
    }
}

/// A notification produced under the collection lock, delivered after it.
pub(crate) enum Pending<T: 'static> {
    IndexChanged(ItemRef<T>, usize),
    ItemSelection(ItemRef<T>, bool),
    ItemModified(ItemRef<T>, String),
    Added(ItemsAdded<Item<T>>),
    Removed(ItemsRemoved<Item<T>>),
    Moved(ItemsMoved),
    Modified(ItemsModified),
    Selection(SelectionChanged<Item<T>>),
    Scrolled(ScrolledTo),
}

/// Ordered notifications for one logical operation.
pub(crate) struct Batch<T: 'static> {
    pending: Vec<Pending<T>>,
}

impl<T: 'static> Batch<T> {
    pub(crate) fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, pending: Pending<T>) {
        self.pending.push(pending);
    }

    /// Report `primary_index` on every queued selection notification.
    pub(crate) fn settle_primary(&mut self, primary_index: Option<usize>) {
        for pending in &mut self.pending {
            if let Pending::Selection(event) = pending {
                event.primary_index = primary_index;
            }
        }
    }

    /// Deliver every notification in order. Must run with no lock held.
    pub(crate) fn dispatch(self, signals: &CollectionSignals<T>, name: &str, trace: bool) {
        for pending in self.pending {
            match pending {
                Pending::IndexChanged(item, index) => item.index_changed.emit(index),
                Pending::ItemSelection(item, selected) => item.selection_changed.emit(selected),
                Pending::ItemModified(item, path) => item.modified.emit(path),
                Pending::Added(event) => {
                    if trace {
                        horizon_observable_core::observable_debug!(
                            collection = name, range = %event.range, reason = ?event.reason, "added"
                        );
                    }
                    signals.added.emit(event);
                }
                Pending::Removed(event) => {
                    if trace {
                        horizon_observable_core::observable_debug!(
                            collection = name, range = %event.range, reason = ?event.reason, "removed"
                        );
                    }
                    signals.removed.emit(event);
                }
                Pending::Moved(event) => {
                    if trace {
                        horizon_observable_core::observable_debug!(
                            collection = name, range = %event.range, reason = ?event.reason, "moved"
                        );
                    }
                    signals.moved.emit(event);
                }
                Pending::Modified(event) => {
                    if trace {
                        horizon_observable_core::observable_debug!(
                            collection = name, range = %event.range, field_path = %event.field_path, "modified"
                        );
                    }
                    signals.modified.emit(event);
                }
                Pending::Selection(event) => {
                    if trace {
                        horizon_observable_core::observable_debug!(
                            collection = name, index = event.range.start(), selected = event.selected, "selection changed"
                        );
                    }
                    signals.selection_changed.emit(event);
                }
                Pending::Scrolled(event) => {
                    if trace {
                        horizon_observable_core::observable_debug!(
                            collection = name, index = event.index, alignment = ?event.alignment, "scrolled to"
                        );
                    }
                    signals.scrolled_to.emit(event);
                }
            }
        }
    }
}
