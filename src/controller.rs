use crate::date_key::DateKey;
use crate::models::DayCell;
use crate::selection::{EnabledRange, SelectionStore};
use tracing::debug;

/// Longest calendar the selector draws, counted back from its last week.
pub const MAX_WINDOW_WEEKS: i64 = 53;

/// Raw input from the date selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorEvent {
    PointerDown(DateKey),
    PointerEnter(DateKey),
    /// Released anywhere in the document, on or off a date cell.
    PointerUp,
    Toggle(DateKey),
    /// Two-click range picking: the first pick anchors, the second closes the range.
    Pick(DateKey),
    Range(DateKey, DateKey),
}

/// Translates selector events into [`SelectionStore`] calls and owns the
/// calendar window the selector draws.
#[derive(Debug, Clone)]
pub struct SelectionController {
    store: SelectionStore,
    window_end: DateKey,
    pending_pick: Option<DateKey>,
}

impl SelectionController {
    pub fn new(enabled: EnabledRange, window_end: DateKey) -> Self {
        Self {
            store: SelectionStore::new(enabled),
            window_end,
            pending_pick: None,
        }
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SelectionStore {
        &mut self.store
    }

    pub fn pending_pick(&self) -> Option<DateKey> {
        self.pending_pick
    }

    /// Applies new bounds from a refresh. Selection and any drag in flight are kept.
    pub fn set_bounds(&mut self, enabled: EnabledRange, window_end: DateKey) {
        self.store.set_enabled(enabled);
        self.window_end = window_end;
    }

    /// Returns `true` when the active set changed and a recomputation is due.
    pub fn handle(&mut self, event: SelectorEvent) -> bool {
        let enabled = self.store.enabled();
        match event {
            SelectorEvent::PointerUp => {
                self.store.end_drag();
                false
            }
            // disabled cells have no handlers
            SelectorEvent::PointerDown(key) if !enabled.contains(key) => false,
            SelectorEvent::PointerEnter(key) if !enabled.contains(key) => false,
            SelectorEvent::PointerDown(key) => {
                self.pending_pick = None;
                self.store.begin_drag(key)
            }
            SelectorEvent::PointerEnter(key) => self.store.extend_drag(key),
            SelectorEvent::Toggle(key) => {
                self.pending_pick = None;
                self.store.toggle_single(key)
            }
            SelectorEvent::Range(start, end) => {
                self.pending_pick = None;
                self.store.set_range(start, end)
            }
            SelectorEvent::Pick(key) => self.pick(key),
        }
    }

    fn pick(&mut self, key: DateKey) -> bool {
        if !self.store.enabled().contains(key) {
            debug!(%key, "ignoring pick on disabled date");
            return false;
        }
        match self.pending_pick.take() {
            Some(start) => self.store.set_range(start, key),
            None => {
                self.pending_pick = Some(key);
                self.store.set_range(key, key)
            }
        }
    }

    /// First and last day drawn by the selector, padded to whole weeks and
    /// capped at [`MAX_WINDOW_WEEKS`] ending with the newest week.
    pub fn window(&self) -> (DateKey, DateKey) {
        let lower = self.store.enabled().lower();
        let end = lower.max(self.window_end).week_end();
        let earliest = end.offset_days(1 - 7 * MAX_WINDOW_WEEKS);
        let start = lower.min(self.window_end).week_start().max(earliest);
        (start, end)
    }

    pub fn cells(&self) -> Vec<DayCell> {
        let enabled = self.store.enabled();
        let (start, end) = self.window();
        start
            .days_through(end)
            .map(|key| DayCell {
                key,
                enabled: enabled.contains(key),
                selected: self.store.is_active(key),
            })
            .collect()
    }
}
