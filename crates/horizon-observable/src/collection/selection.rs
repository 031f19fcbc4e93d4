//! Selection bookkeeping for observable collections.
//!
//! A collection tracks two related things:
//!
//! - the **selection set**: every wrapper currently marked selected, kept in
//!   the order it was (most recently) selected, and
//! - the **primary selection**: at most one distinguished wrapper, always the
//!   most recently selected member of the set.
//!
//! Deselecting the primary promotes the most recently selected remaining
//! member, unless the caller asks for the primary to be cleared outright.
//! Disposed wrappers never enter the set.

use std::sync::Arc;

use horizon_observable_core::logging::targets;

use super::change::{Batch, ChangeRange, Pending, SelectionChanged};
use super::item::ItemRef;

/// What happens to the primary selection when the primary is deselected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Promotion {
    /// Promote the most recently selected remaining member.
    MostRecent,
    /// Leave the primary unset.
    Clear,
}

pub(crate) struct SelectionState<T: 'static> {
    members: Vec<ItemRef<T>>,
    primary: Option<ItemRef<T>>,
}

impl<T: Send + Sync + 'static> SelectionState<T> {
    pub(crate) fn new() -> Self {
        Self {
            members: Vec::new(),
            primary: None,
        }
    }

    pub(crate) fn primary(&self) -> Option<&ItemRef<T>> {
        self.primary.as_ref()
    }

    pub(crate) fn primary_index(&self) -> Option<usize> {
        self.primary.as_ref().map(|item| item.index())
    }

    /// Members in selection order, oldest first.
    pub(crate) fn members(&self) -> &[ItemRef<T>] {
        &self.members
    }

    pub(crate) fn contains(&self, item: &ItemRef<T>) -> bool {
        self.members.iter().any(|member| Arc::ptr_eq(member, item))
    }

    fn is_primary(&self, item: &ItemRef<T>) -> bool {
        self.primary
            .as_ref()
            .is_some_and(|primary| Arc::ptr_eq(primary, item))
    }

    /// Mark `item` selected and make it the primary selection.
    ///
    /// Applies even if the item is already selected. `announce` controls
    /// whether a collection-level notification accompanies the item-level one.
    pub(crate) fn select(&mut self, item: &ItemRef<T>, announce: bool, batch: &mut Batch<T>) {
        if item.is_disposed() {
            tracing::trace!(target: targets::SELECTION, "ignoring selection of disposed item");
            return;
        }

        item.mark_selected(true);
        self.members.retain(|member| !Arc::ptr_eq(member, item));
        self.members.push(Arc::clone(item));
        self.primary = Some(Arc::clone(item));
        tracing::trace!(target: targets::SELECTION, index = item.index(), members = self.members.len(), "selected");

        self.record(item, true, announce, batch);
    }

    /// Mark `item` deselected and drop it from the set.
    pub(crate) fn deselect(
        &mut self,
        item: &ItemRef<T>,
        promotion: Promotion,
        announce: bool,
        batch: &mut Batch<T>,
    ) {
        if item.is_disposed() {
            tracing::trace!(target: targets::SELECTION, "ignoring deselection of disposed item");
            return;
        }

        item.mark_selected(false);
        self.members.retain(|member| !Arc::ptr_eq(member, item));
        if self.is_primary(item) {
            self.primary = match promotion {
                Promotion::MostRecent => self.members.last().cloned(),
                Promotion::Clear => None,
            };
        }
        tracing::trace!(target: targets::SELECTION, index = item.index(), members = self.members.len(), "deselected");

        self.record(item, false, announce, batch);
    }

    /// Apply a state unconditionally, announcing it at both levels.
    pub(crate) fn force(&mut self, item: &ItemRef<T>, selected: bool, batch: &mut Batch<T>) {
        if selected {
            self.select(item, true, batch);
        } else {
            self.deselect(item, Promotion::MostRecent, true, batch);
        }
    }

    /// Deselect every member, leaving no primary.
    pub(crate) fn clear(&mut self, batch: &mut Batch<T>) {
        let members = std::mem::take(&mut self.members);
        self.primary = None;
        for member in &members {
            self.deselect(member, Promotion::Clear, true, batch);
        }
    }

    fn record(&self, item: &ItemRef<T>, selected: bool, announce: bool, batch: &mut Batch<T>) {
        batch.push(Pending::ItemSelection(Arc::clone(item), selected));
        if announce {
            batch.push(Pending::Selection(SelectionChanged {
                range: ChangeRange::single(item.index()),
                item: Arc::clone(item),
                selected,
                primary_index: self.primary_index(),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::change::CollectionSignals;
    use crate::collection::item::{Item, SelectionHost};
    use parking_lot::Mutex;
    use std::sync::Weak;

    struct Detached;

    impl SelectionHost<u8> for Detached {
        fn request_selection(&self, _item: &Item<u8>, _selected: bool) {}
    }

    fn items(count: u8) -> Vec<ItemRef<u8>> {
        (0..count)
            .map(|value| {
                let host: Weak<dyn SelectionHost<u8>> = Weak::<Detached>::new();
                Arc::new(Item::new(Arc::new(value), value as usize, host))
            })
            .collect()
    }

    /// Dispatch `batch` and return `(index, selected, primary)` per collection-level event.
    fn announced(batch: Batch<u8>) -> Vec<(usize, bool, Option<usize>)> {
        let signals = CollectionSignals::<u8>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = log.clone();
        signals
            .selection_changed
            .connect(move |e| l.lock().push((e.range.start(), e.selected, e.primary_index)));
        batch.dispatch(&signals, "test", false);
        let events = log.lock().clone();
        events
    }

    #[test]
    fn test_select_moves_member_to_end() {
        let items = items(3);
        let mut state = SelectionState::new();
        let mut batch = Batch::new();

        state.select(&items[0], true, &mut batch);
        state.select(&items[1], true, &mut batch);
        state.select(&items[0], true, &mut batch);

        let order: Vec<usize> = state.members().iter().map(|i| i.index()).collect();
        assert_eq!(order, vec![1, 0]);
        assert_eq!(state.primary_index(), Some(0));
        assert_eq!(
            announced(batch),
            vec![(0, true, Some(0)), (1, true, Some(1)), (0, true, Some(0))]
        );
    }

    #[test]
    fn test_deselect_promotion() {
        let items = items(3);
        let mut state = SelectionState::new();
        let mut batch = Batch::new();
        for item in &items {
            state.select(item, false, &mut batch);
        }

        state.deselect(&items[2], Promotion::MostRecent, true, &mut batch);
        assert_eq!(state.primary_index(), Some(1));
        state.deselect(&items[1], Promotion::Clear, true, &mut batch);
        assert_eq!(state.primary_index(), None);
        assert!(state.contains(&items[0]));
        assert!(items[0].is_selected());
        assert!(!items[1].is_selected());

        assert_eq!(announced(batch), vec![(2, false, Some(1)), (1, false, None)]);
    }

    #[test]
    fn test_disposed_items_are_ignored() {
        let items = items(1);
        let mut state = SelectionState::new();
        let mut batch = Batch::new();
        items[0].dispose();

        state.force(&items[0], true, &mut batch);
        assert!(state.primary().is_none());
        assert!(!state.contains(&items[0]));
        assert!(announced(batch).is_empty());
    }

    #[test]
    fn test_clear_empties_set() {
        let items = items(2);
        let mut state = SelectionState::new();
        let mut batch = Batch::new();
        state.force(&items[0], true, &mut batch);
        state.force(&items[1], true, &mut batch);

        state.clear(&mut batch);
        assert!(state.members().is_empty());
        assert!(state.primary().is_none());
        assert!(items.iter().all(|i| !i.is_selected()));
        assert_eq!(announced(batch).len(), 4);
    }
}
