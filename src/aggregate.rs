use crate::date_key::DateKey;
use crate::models::{Aggregation, Pivot, Record};
use std::collections::{BTreeMap, BTreeSet};

/// Pivots `records` over the active dates.
///
/// Every active date gets a row, even one with no records, so an empty day
/// stays distinguishable from an unselected one. Brands are ranked by their
/// total over the active dates, descending, ties broken by name.
pub fn aggregate(
    records: &[Record],
    active: &BTreeSet<DateKey>,
    excluded: &BTreeSet<String>,
) -> Aggregation {
    let labels = date_labels(active);

    let mut pivot: Pivot = labels
        .values()
        .map(|label| (label.clone(), BTreeMap::new()))
        .collect();
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();

    for record in records {
        if excluded.contains(&record.brand) {
            continue;
        }
        let Some(row) = labels.get(&record.day).and_then(|label| pivot.get_mut(label)) else {
            continue;
        };
        let cell = row.entry(record.brand.clone()).or_insert(0);
        *cell = cell.saturating_add(record.count);
        let total = totals.entry(record.brand.as_str()).or_insert(0);
        *total = total.saturating_add(record.count);
    }

    let mut ranked: Vec<(&str, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    Aggregation {
        brands: ranked.into_iter().map(|(brand, _)| brand.to_string()).collect(),
        dates: labels.into_values().collect(),
        pivot,
    }
}

/// One display label per active date, in chronological order.
fn date_labels(active: &BTreeSet<DateKey>) -> BTreeMap<DateKey, String> {
    let spans_years = match (active.first(), active.last()) {
        (Some(first), Some(last)) => first.year() != last.year(),
        _ => false,
    };
    active
        .iter()
        .map(|key| {
            let label = if spans_years { key.label_with_year() } else { key.label() };
            (*key, label)
        })
        .collect()
}
