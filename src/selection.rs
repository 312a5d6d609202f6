use crate::date_key::DateKey;
use crate::models::{DragMode, SelectionState};
use std::collections::BTreeSet;
use tracing::debug;

/// Contiguous run of days the data source is known to cover.
///
/// `upper < lower` encodes an empty range: every day is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledRange {
    lower: DateKey,
    upper: DateKey,
}

impl EnabledRange {
    pub fn new(lower: DateKey, upper: DateKey) -> Self {
        Self { lower, upper }
    }

    pub fn empty_from(lower: DateKey) -> Self {
        match lower.checked_offset_days(-1) {
            Some(upper) => Self { lower, upper },
            // nothing precedes the first representable day
            None => Self {
                lower: lower.offset_days(1),
                upper: lower,
            },
        }
    }

    pub fn lower(&self) -> DateKey {
        self.lower
    }

    pub fn upper(&self) -> DateKey {
        self.upper
    }

    pub fn is_empty(&self) -> bool {
        self.upper < self.lower
    }

    pub fn contains(&self, key: DateKey) -> bool {
        self.lower <= key && key <= self.upper
    }

    /// Position of `key` in the enabled-date sequence.
    pub fn index_of(&self, key: DateKey) -> Option<usize> {
        self.contains(key)
            .then(|| self.lower.days_between(key) as usize)
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.lower.days_between(self.upper) as usize + 1
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    anchor: DateKey,
    mode: DragMode,
}

/// Owns the active date set and the drag gesture state machine.
///
/// Every mutating operation returns `true` when `active_dates` changed, so the
/// caller knows whether a recomputation is due. Requests that target a
/// disabled day are ignored and return `false`.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    enabled: EnabledRange,
    active: BTreeSet<DateKey>,
    drag: Option<Drag>,
}

impl SelectionStore {
    pub fn new(enabled: EnabledRange) -> Self {
        Self {
            enabled,
            active: BTreeSet::new(),
            drag: None,
        }
    }

    pub fn enabled(&self) -> EnabledRange {
        self.enabled
    }

    /// Moves the enabled bounds. The active set is left as it is.
    pub fn set_enabled(&mut self, enabled: EnabledRange) {
        self.enabled = enabled;
    }

    pub fn toggle_single(&mut self, key: DateKey) -> bool {
        if !self.enabled.contains(key) {
            debug!(%key, "ignoring toggle on disabled date");
            return false;
        }
        if !self.active.remove(&key) {
            self.active.insert(key);
        }
        true
    }

    pub fn begin_drag(&mut self, key: DateKey) -> bool {
        if let Some(stale) = self.drag {
            debug!(anchor = %stale.anchor, "drag started while another was active, closing it");
            self.end_drag();
        }
        if !self.enabled.contains(key) {
            debug!(%key, "ignoring drag start on disabled date");
            return false;
        }

        let mode = if self.active.contains(&key) {
            DragMode::Deselect
        } else {
            DragMode::Select
        };
        self.drag = Some(Drag { anchor: key, mode });
        self.apply(mode, key)
    }

    pub fn extend_drag(&mut self, key: DateKey) -> bool {
        let Some(Drag { anchor, mode }) = self.drag else {
            return false;
        };
        let (Some(from), Some(to)) = (self.enabled.index_of(anchor), self.enabled.index_of(key))
        else {
            debug!(%anchor, %key, "ignoring drag over disabled date");
            return false;
        };

        let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
        let lower = self.enabled.lower();
        let mut changed = false;
        for offset in lo..=hi {
            changed |= self.apply(mode, lower.offset_days(offset as i64));
        }
        changed
    }

    /// Returns `true` if a gesture was in progress.
    pub fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    pub fn set_range(&mut self, start: DateKey, end: DateKey) -> bool {
        if !self.enabled.contains(start) || !self.enabled.contains(end) {
            debug!(%start, %end, "ignoring range with a disabled endpoint");
            return false;
        }
        let (from, to) = if start <= end { (start, end) } else { (end, start) };
        let next: BTreeSet<DateKey> = from.days_through(to).collect();
        if next == self.active {
            return false;
        }
        self.active = next;
        true
    }

    /// Selects the most recent `days` enabled dates.
    pub fn select_latest(&mut self, days: usize) -> bool {
        if self.enabled.is_empty() || days == 0 {
            return false;
        }
        let span = days.min(self.enabled.len()) as i64;
        let upper = self.enabled.upper();
        self.set_range(upper.offset_days(1 - span), upper)
    }

    pub fn active_dates(&self) -> BTreeSet<DateKey> {
        self.active.clone()
    }

    pub fn is_active(&self, key: DateKey) -> bool {
        self.active.contains(&key)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn state(&self) -> SelectionState {
        SelectionState {
            active_dates: self.active.clone(),
            drag_anchor: self.drag.map(|drag| drag.anchor),
            drag_mode: self.drag.map_or(DragMode::Idle, |drag| drag.mode),
        }
    }

    fn apply(&mut self, mode: DragMode, key: DateKey) -> bool {
        match mode {
            DragMode::Select => self.active.insert(key),
            DragMode::Deselect => self.active.remove(&key),
            DragMode::Idle => false,
        }
    }
}
