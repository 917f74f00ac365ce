use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// 盡力讀取的 CSV 表：缺檔回傳空表，壞列略過並計數
#[derive(Debug, Clone)]
pub struct TableRead<T> {
    pub rows: Vec<T>,
    pub rows_read: usize,
    pub skipped: usize,
    pub missing: bool,
}

impl<T> TableRead<T> {
    fn missing() -> Self {
        Self {
            rows: Vec::new(),
            rows_read: 0,
            skipped: 0,
            missing: true,
        }
    }
}

fn is_not_found(err: &EtlError) -> bool {
    matches!(err, EtlError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound)
}

/// 讀檔；找不到檔案時回傳 None
pub async fn read_optional<S: Storage>(storage: &S, path: &str) -> Result<Option<Vec<u8>>> {
    match storage.read_file(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn parse_csv<T: DeserializeOwned>(path: &str, bytes: &[u8]) -> TableRead<T> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    let mut rows_read = 0;
    let mut skipped = 0;

    for result in reader.deserialize::<T>() {
        rows_read += 1;
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                tracing::debug!("Skipping malformed row in {}: {}", path, e);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("⚠️ {}: skipped {} malformed rows", path, skipped);
    }

    TableRead {
        rows,
        rows_read,
        skipped,
        missing: false,
    }
}

pub async fn read_csv<S: Storage, T: DeserializeOwned>(
    storage: &S,
    path: &str,
) -> Result<TableRead<T>> {
    match read_optional(storage, path).await? {
        Some(bytes) => Ok(parse_csv(path, &bytes)),
        None => {
            tracing::warn!("⚠️ Input not found: {} (continuing with empty table)", path);
            Ok(TableRead::missing())
        }
    }
}

pub async fn read_json<S: Storage, T: DeserializeOwned>(
    storage: &S,
    path: &str,
) -> Result<Option<T>> {
    match read_optional(storage, path).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => {
            tracing::warn!("⚠️ Artifact not found: {}", path);
            Ok(None)
        }
    }
}

pub fn to_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::processing(format!("Failed to flush CSV buffer: {}", e)))
}

pub async fn write_csv<S: Storage, T: Serialize>(storage: &S, path: &str, rows: &[T]) -> Result<()> {
    let data = to_csv(rows)?;
    storage.write_file(path, &data).await?;
    tracing::debug!("Wrote {} rows to {}", rows.len(), path);
    Ok(())
}

pub async fn write_json<S: Storage, T: Serialize>(storage: &S, path: &str, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    storage.write_file(path, &data).await?;
    tracing::debug!("Wrote {}", path);
    Ok(())
}

/// 四捨五入到小數兩位
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
