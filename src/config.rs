use crate::date_key::DateKey;
use crate::session::SessionOptions;
use crate::sync::SyncConfig;
use std::{collections::BTreeSet, env, path::PathBuf};
use tracing::warn;

const DEFAULT_LOOKBACK_DAYS: i64 = 15;
const DEFAULT_INITIAL_DAYS: usize = 7;
const DEFAULT_TABLE: &str = "daily_brand_counts";
const DEFAULT_EXCLUDED: &str = "Otros";

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub sync: SyncConfig,
    pub session: SessionOptions,
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(DateKey::today(), |name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup, `today` anchoring the defaults.
    pub fn from_lookup(today: DateKey, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parsed(&lookup, "PORT").unwrap_or(8080);
        let data_path = lookup("DASHBOARD_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/records.json"));

        let lookback: i64 = parsed(&lookup, "DASHBOARD_LOOKBACK_DAYS").unwrap_or(DEFAULT_LOOKBACK_DAYS);
        let min_date = parsed(&lookup, "DASHBOARD_MIN_DATE")
            .unwrap_or_else(|| lookback_cutoff(today, lookback));
        let default_upper = parsed(&lookup, "DASHBOARD_DEFAULT_UPPER").unwrap_or(today);
        let table = lookup("DASHBOARD_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string());

        let excluded_brands = lookup("DASHBOARD_EXCLUDED_BRANDS")
            .unwrap_or_else(|| DEFAULT_EXCLUDED.to_string())
            .split(',')
            .map(str::trim)
            .filter(|brand| !brand.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        let initial_days = parsed(&lookup, "DASHBOARD_INITIAL_DAYS").unwrap_or(DEFAULT_INITIAL_DAYS);

        Self {
            port,
            data_path,
            sync: SyncConfig {
                min_date,
                default_upper,
                table,
            },
            session: SessionOptions {
                excluded_brands,
                initial_days,
            },
        }
    }
}

/// First enabled day `lookback` days before `today`; an out-of-range lookback
/// falls back to the default.
fn lookback_cutoff(today: DateKey, lookback: i64) -> DateKey {
    let cutoff = lookback
        .checked_neg()
        .filter(|offset| *offset <= 0)
        .and_then(|offset| today.checked_offset_days(offset));
    cutoff.unwrap_or_else(|| {
        warn!(lookback, "lookback out of range, using the default");
        today.offset_days(-DEFAULT_LOOKBACK_DAYS)
    })
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(name, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}
