//! Single selection over an ordered collection, first item by default.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState<T> {
    Empty,
    HasSelection(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange<T> {
    pub previous: Option<T>,
    pub current: Option<T>,
}

/// Keeps exactly one member selected while the attached collection is
/// non-empty.
///
/// The policy does not own the collection. Callers pass the live slice after
/// every change; each transition returns `Some(change)` only when the
/// selection actually moved, so observers see one event per change.
#[derive(Debug, Clone)]
pub struct SelectionPolicy<T: Copy + Eq> {
    state: SelectionState<T>,
    attached: bool,
}

impl<T: Copy + Eq> Default for SelectionPolicy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq> SelectionPolicy<T> {
    pub fn new() -> Self {
        Self {
            state: SelectionState::Empty,
            attached: false,
        }
    }

    pub fn state(&self) -> SelectionState<T> {
        self.state
    }

    pub fn selected(&self) -> Option<T> {
        match self.state {
            SelectionState::Empty => None,
            SelectionState::HasSelection(item) => Some(item),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Attach to a collection. Any previous attachment is dropped first, so
    /// the state is recomputed from scratch.
    pub fn attach(&mut self, items: &[T]) -> Option<SelectionChange<T>> {
        let previous = self.selected();
        self.attached = true;
        self.state = SelectionState::Empty;
        self.settle(items);
        self.change_from(previous)
    }

    pub fn detach(&mut self) -> Option<SelectionChange<T>> {
        let previous = self.selected();
        self.attached = false;
        self.state = SelectionState::Empty;
        self.change_from(previous)
    }

    pub fn on_inserted(&mut self, items: &[T]) -> Option<SelectionChange<T>> {
        if !self.attached {
            return None;
        }
        let previous = self.selected();
        self.settle(items);
        self.change_from(previous)
    }

    pub fn on_removed(&mut self, items: &[T], removed: T) -> Option<SelectionChange<T>> {
        if !self.attached {
            return None;
        }
        let previous = self.selected();
        if previous == Some(removed) {
            self.state = SelectionState::Empty;
        }
        self.settle(items);
        self.change_from(previous)
    }

    /// Explicit selection. Fails, leaving the state unchanged, when `item`
    /// is not in `items`.
    pub fn select(&mut self, items: &[T], item: T) -> Result<Option<SelectionChange<T>>, T> {
        if !self.attached || !items.contains(&item) {
            return Err(item);
        }
        let previous = self.selected();
        self.state = SelectionState::HasSelection(item);
        Ok(self.change_from(previous))
    }

    fn settle(&mut self, items: &[T]) {
        self.state = match (self.state, items.first()) {
            (_, None) => SelectionState::Empty,
            (SelectionState::HasSelection(current), Some(_)) if items.contains(&current) => {
                SelectionState::HasSelection(current)
            }
            (_, Some(first)) => SelectionState::HasSelection(*first),
        };
    }

    fn change_from(&self, previous: Option<T>) -> Option<SelectionChange<T>> {
        let current = self.selected();
        (previous != current).then_some(SelectionChange { previous, current })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_item_is_selected_by_default() {
        let mut policy = SelectionPolicy::new();
        assert!(policy.attach(&[] as &[u8]).is_none());
        assert_eq!(policy.state(), SelectionState::Empty);
        let change = policy.on_inserted(&[7u8]).expect("selection change");
        assert_eq!(change.current, Some(7));
        // a later insert before the selection does not steal it
        assert!(policy.on_inserted(&[3u8, 7u8]).is_none());
        assert_eq!(policy.selected(), Some(7));
    }

    #[test]
    fn removing_selected_falls_back_to_first() {
        let mut policy = SelectionPolicy::new();
        policy.attach(&['a', 'b', 'c']);
        policy.select(&['a', 'b', 'c'], 'b').unwrap();
        let change = policy.on_removed(&['a', 'c'], 'b').unwrap();
        assert_eq!(change.previous, Some('b'));
        assert_eq!(policy.selected(), Some('a'));
        policy.on_removed(&['c'], 'a');
        policy.on_removed(&[], 'c');
        assert_eq!(policy.state(), SelectionState::Empty);
    }

    #[test]
    fn removing_unselected_keeps_selection() {
        let mut policy = SelectionPolicy::new();
        policy.attach(&[1, 2, 3]);
        policy.select(&[1, 2, 3], 3).unwrap();
        assert!(policy.on_removed(&[2, 3], 1).is_none());
        assert_eq!(policy.selected(), Some(3));
    }

    #[test]
    fn selecting_non_member_is_rejected() {
        let mut policy = SelectionPolicy::new();
        policy.attach(&[1, 2]);
        assert_eq!(policy.select(&[1, 2], 9), Err(9));
        assert_eq!(policy.selected(), Some(1));
        // reselecting the current item produces no change
        assert_eq!(policy.select(&[1, 2], 1), Ok(None));
    }

    #[test]
    fn reattach_resets_state() {
        let mut policy = SelectionPolicy::new();
        policy.attach(&[1, 2]);
        policy.select(&[1, 2], 2).unwrap();
        let change = policy.attach(&[5, 6]).unwrap();
        assert_eq!(change.previous, Some(2));
        assert_eq!(policy.selected(), Some(5));
        policy.detach();
        assert!(policy.on_inserted(&[5, 6, 7]).is_none());
        assert_eq!(policy.selected(), None);
    }
}
