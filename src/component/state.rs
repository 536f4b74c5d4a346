//! Per-component selection, focus and damage flags.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cell position on the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Column (zero-based).
    pub x: u16,
    /// Row (zero-based).
    pub y: u16,
}

impl Position {
    /// Create a new position.
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Selection {
    selected: bool,
    in_focus: bool,
}

/// Shared state of one component, read by the render loop and mutated by the
/// component's update thread, the input router and the engine.
///
/// Selection and focus are changed under the component's lock, and every
/// change marks the component dirty before the lock is released. The dirty
/// flags themselves are plain atomics: the render loop only needs "probably
/// dirty", and a spurious redraw is harmless.
#[derive(Debug, Default)]
pub struct ComponentState {
    selectable: AtomicBool,
    requires_update: AtomicBool,
    requires_window_refresh: AtomicBool,
    selection: Mutex<Selection>,
    position: Mutex<Position>,
}

impl ComponentState {
    /// Create state for a component at `position`.
    ///
    /// New components start dirty so their first frame draws them.
    pub fn new(position: Position, selectable: bool) -> Self {
        Self {
            selectable: AtomicBool::new(selectable),
            requires_update: AtomicBool::new(true),
            requires_window_refresh: AtomicBool::new(false),
            selection: Mutex::new(Selection::default()),
            position: Mutex::new(position),
        }
    }

    /// Whether the component may ever take focus.
    #[inline]
    pub fn is_selectable(&self) -> bool {
        self.selectable.load(Ordering::Acquire)
    }

    /// Allow or forbid focus. Forbidding drops any focus the component holds.
    pub fn set_selectable(&self, selectable: bool) {
        let mut selection = self.selection.lock();
        self.selectable.store(selectable, Ordering::Release);
        if !selectable && selection.in_focus {
            selection.in_focus = false;
        }
        self.mark_dirty();
    }

    /// Whether the component is the engine's current selection.
    pub fn is_selected(&self) -> bool {
        self.selection.lock().selected
    }

    /// Whether the component is in focus (implies selected).
    pub fn is_in_focus(&self) -> bool {
        self.selection.lock().in_focus
    }

    /// `(selected, in_focus)` read under one lock acquisition.
    pub fn selection_flags(&self) -> (bool, bool) {
        let selection = self.selection.lock();
        (selection.selected, selection.in_focus)
    }

    /// Select or deselect. Deselecting also removes focus.
    ///
    /// Always marks the component dirty, even if the value is unchanged.
    pub fn set_selected(&self, selected: bool) {
        let mut selection = self.selection.lock();
        selection.selected = selected;
        if !selected {
            selection.in_focus = false;
        }
        self.mark_dirty();
    }

    /// Give or take focus.
    ///
    /// Taking focus is refused (returns `false`) unless the component is
    /// selectable and currently selected. Marks the component dirty whenever
    /// the request is applied.
    pub fn set_in_focus(&self, in_focus: bool) -> bool {
        let mut selection = self.selection.lock();
        if in_focus && !(selection.selected && self.is_selectable()) {
            return false;
        }
        selection.in_focus = in_focus;
        self.mark_dirty();
        true
    }

    /// Current position.
    pub fn position(&self) -> Position {
        *self.position.lock()
    }

    /// Move the component. Moving leaves stale cells behind, so this requests
    /// a full window refresh as well as a redraw.
    pub fn set_position(&self, position: Position) {
        let mut current = self.position.lock();
        *current = position;
        self.mark_dirty();
        self.request_window_refresh();
    }

    /// Mark the component as needing a redraw on the next frame.
    #[inline]
    pub fn mark_dirty(&self) {
        self.requires_update.store(true, Ordering::Release);
    }

    /// Ask for the whole window to be cleared and repainted on the next frame.
    #[inline]
    pub fn request_window_refresh(&self) {
        self.requires_window_refresh.store(true, Ordering::Release);
    }

    /// Whether a redraw is pending.
    #[inline]
    pub fn requires_update(&self) -> bool {
        self.requires_update.load(Ordering::Acquire)
    }

    /// Whether a full window refresh is pending.
    #[inline]
    pub fn requires_window_refresh(&self) -> bool {
        self.requires_window_refresh.load(Ordering::Acquire)
    }

    /// Clear the redraw flag, returning whether it was set.
    #[inline]
    pub(crate) fn take_requires_update(&self) -> bool {
        self.requires_update.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub(crate) fn clear_window_refresh(&self) {
        self.requires_window_refresh.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(selectable: bool) -> ComponentState {
        let state = ComponentState::new(Position::default(), selectable);
        state.take_requires_update();
        state
    }

    #[test]
    fn test_new_state_starts_dirty() {
        let state = ComponentState::new(Position::new(3, 4), false);
        assert!(state.requires_update());
        assert!(!state.requires_window_refresh());
        assert_eq!(state.position(), Position::new(3, 4));
    }

    #[test]
    fn test_selection_change_marks_dirty() {
        let state = clean(false);
        state.set_selected(true);
        assert!(state.is_selected());
        assert!(state.take_requires_update());

        // Re-applying the same value still repaints.
        state.set_selected(true);
        assert!(state.take_requires_update());
    }

    #[test]
    fn test_focus_requires_selection_and_selectable() {
        let state = clean(true);
        assert!(!state.set_in_focus(true));
        assert!(!state.is_in_focus());
        assert!(!state.requires_update());

        state.set_selected(true);
        assert!(state.set_in_focus(true));
        assert!(state.is_in_focus());

        let inert = clean(false);
        inert.set_selected(true);
        assert!(!inert.set_in_focus(true));
    }

    #[test]
    fn test_deselect_drops_focus() {
        let state = clean(true);
        state.set_selected(true);
        state.set_in_focus(true);
        state.set_selected(false);
        assert!(!state.is_in_focus());
        assert!(!state.is_selected());
    }

    #[test]
    fn test_unselectable_drops_focus() {
        let state = clean(true);
        state.set_selected(true);
        state.set_in_focus(true);
        state.set_selectable(false);
        assert!(state.is_selected());
        assert!(!state.is_in_focus());
    }

    #[test]
    fn test_move_requests_window_refresh() {
        let state = clean(false);
        state.set_position(Position::new(10, 2));
        assert!(state.requires_update());
        assert!(state.requires_window_refresh());
        state.clear_window_refresh();
        assert!(!state.requires_window_refresh());
    }
}
