use crate::date_key::DateKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One `(day, brand)` row as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub day: DateKey,
    pub brand: String,
    #[serde(alias = "total_count")]
    pub count: u64,
}

impl Record {
    pub fn new(day: DateKey, brand: impl Into<String>, count: u64) -> Self {
        Self {
            day,
            brand: brand.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMode {
    #[default]
    Idle,
    Select,
    Deselect,
}

/// Read-only snapshot of the selection store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SelectionState {
    pub active_dates: BTreeSet<DateKey>,
    pub drag_anchor: Option<DateKey>,
    pub drag_mode: DragMode,
}

/// One calendar cell of the date selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub key: DateKey,
    pub enabled: bool,
    pub selected: bool,
}

/// Date label -> brand -> count.
pub type Pivot = BTreeMap<String, BTreeMap<String, u64>>;

/// Renderer-ready output of one recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Aggregation {
    pub brands: Vec<String>,
    pub dates: Vec<String>,
    pub pivot: Pivot,
}

impl Aggregation {
    pub fn count(&self, date: &str, brand: &str) -> u64 {
        self.pivot
            .get(date)
            .and_then(|row| row.get(brand))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Down,
    Enter,
    Up,
}

#[derive(Debug, Deserialize)]
pub struct PointerRequest {
    pub kind: PointerKind,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateRequest {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeRequest {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub day: String,
    pub brand: String,
    pub count: u64,
}
