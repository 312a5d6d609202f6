use crate::date_key::DateKey;
use crate::errors::FetchError;
use crate::models::Record;
use crate::sync::{DataSource, InsertNotice};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::{
    fs,
    sync::{broadcast, Mutex},
};
use tracing::debug;

/// A JSON file of records standing in for the remote datastore.
///
/// Writers go through [`JsonFileSource::insert`], which commits the row and
/// then announces it on the insert stream, like an upstream realtime channel.
pub struct JsonFileSource {
    path: PathBuf,
    table: String,
    notices: broadcast::Sender<InsertNotice>,
    write_lock: Mutex<()>,
}

impl JsonFileSource {
    pub fn new(path: PathBuf, table: impl Into<String>) -> Self {
        let (notices, _) = broadcast::channel(64);
        Self {
            path,
            table: table.into(),
            notices,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn insert(&self, record: Record) -> Result<(), FetchError> {
        {
            let _guard = self.write_lock.lock().await;
            let mut records = read_records(&self.path).await?;
            records.push(record);
            persist_records(&self.path, &records).await?;
        }
        self.notify();
        Ok(())
    }

    /// Announces an insert that was committed by someone else.
    pub fn notify(&self) {
        // no subscribers yet is fine, the next load will see the row anyway
        let receivers = self.notices.send(InsertNotice).unwrap_or(0);
        debug!(receivers, "insert notice sent");
    }
}

#[async_trait]
impl DataSource for JsonFileSource {
    async fn fetch_range(&self, min_date: DateKey) -> Result<Vec<Record>, FetchError> {
        let mut records = read_records(&self.path).await?;
        records.retain(|record| record.day >= min_date);
        records.sort_by_key(|record| record.day);
        Ok(records)
    }

    fn subscribe_inserts(&self, table: &str) -> broadcast::Receiver<InsertNotice> {
        if table != self.table {
            debug!(table, source_table = %self.table, "subscription table differs from source table");
        }
        self.notices.subscribe()
    }
}

pub async fn read_records(path: &Path) -> Result<Vec<Record>, FetchError> {
    match fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}

pub async fn persist_records(path: &Path, records: &[Record]) -> Result<(), FetchError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(records)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "brand_dashboard_{name}_{}_{nanos}.json",
            std::process::id()
        ))
    }

    fn day(n: u32) -> DateKey {
        DateKey::from_ymd(2025, 11, n).unwrap()
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let source = JsonFileSource::new(temp_path("missing"), "daily_brand_counts");
        assert!(source.fetch_range(day(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_filters_by_cutoff_and_sorts() {
        let path = temp_path("filter");
        fs::write(
            &path,
            r#"[
                {"day": "2025-11-09T00:00:00", "brand": "M1", "total_count": 4},
                {"day": "2025-11-02", "brand": "K1", "count": 1},
                {"day": "2025-11-05", "brand": "K1", "count": 2}
            ]"#,
        )
        .await
        .unwrap();

        let source = JsonFileSource::new(path.clone(), "daily_brand_counts");
        let records = source.fetch_range(day(3)).await.unwrap();
        assert_eq!(
            records,
            [Record::new(day(5), "K1", 2), Record::new(day(9), "M1", 4)]
        );
        let _ = fs::remove_file(path).await;
    }

    #[tokio::test]
    async fn malformed_file_is_a_fetch_error() {
        let path = temp_path("malformed");
        fs::write(&path, "{not json").await.unwrap();
        let source = JsonFileSource::new(path.clone(), "daily_brand_counts");
        assert!(matches!(
            source.fetch_range(day(1)).await,
            Err(FetchError::Parse(_))
        ));
        let _ = fs::remove_file(path).await;
    }

    #[tokio::test]
    async fn insert_commits_then_notifies() {
        let path = temp_path("insert");
        let source = JsonFileSource::new(path.clone(), "daily_brand_counts");
        let mut inserts = source.subscribe_inserts("daily_brand_counts");

        source.insert(Record::new(day(7), "B1", 3)).await.unwrap();

        assert_eq!(inserts.recv().await.unwrap(), InsertNotice);
        let records = source.fetch_range(day(1)).await.unwrap();
        assert_eq!(records, [Record::new(day(7), "B1", 3)]);
        let _ = fs::remove_file(path).await;
    }
}
