//! Local bookmark store: persisted copies of reports keyed by report
//! id, for offline reading. Records are CBOR-encoded in the `bookmarks`
//! namespace of the key-value capability. `put` is an upsert; removing
//! an absent id is a no-op; `get_all` order is whatever the store
//! yields. There is no expiry and no sync with remote deletions.

use crate::capabilities::{KvEntry, KvError, KvKey, KvNamespace, KvOperation};
use crate::model::{Report, ReportId};
use crate::{AppError, ErrorKind};

pub const SAVED_MESSAGE: &str = "Disimpan ke bookmark!";
pub const REMOVED_MESSAGE: &str = "Dihapus dari bookmark!";

fn key_for(id: &ReportId) -> Result<KvKey, AppError> {
    KvKey::new(KvNamespace::Bookmarks, id.as_str()).map_err(storage_error)
}

#[must_use]
pub fn storage_error(error: KvError) -> AppError {
    AppError::new(ErrorKind::Storage, error.to_string())
}

pub fn encode_record(report: &Report) -> Result<Vec<u8>, AppError> {
    let mut buffer = Vec::new();
    ciborium::into_writer(report, &mut buffer)
        .map_err(|e| AppError::new(ErrorKind::Storage, format!("encode bookmark: {e}")))?;
    Ok(buffer)
}

pub fn decode_record(bytes: &[u8]) -> Result<Report, AppError> {
    ciborium::from_reader(bytes)
        .map_err(|e| AppError::new(ErrorKind::Storage, format!("decode bookmark: {e}")))
}

/// Upsert: saving an already-bookmarked report overwrites its snapshot
/// with the latest fetched data.
pub fn put_op(report: &Report) -> Result<KvOperation, AppError> {
    Ok(KvOperation::Set {
        key: key_for(&report.id)?,
        value: encode_record(report)?,
    })
}

pub fn get_op(id: &ReportId) -> Result<KvOperation, AppError> {
    Ok(KvOperation::Get { key: key_for(id)? })
}

pub fn remove_op(id: &ReportId) -> Result<KvOperation, AppError> {
    Ok(KvOperation::Delete { key: key_for(id)? })
}

#[must_use]
pub fn list_op() -> KvOperation {
    KvOperation::List {
        namespace: KvNamespace::Bookmarks,
    }
}

/// Decodes listed entries, skipping any record that no longer parses
/// rather than failing the whole bookmark view.
#[must_use]
pub fn decode_entries(entries: Vec<KvEntry>) -> Vec<Report> {
    entries
        .into_iter()
        .filter_map(|entry| match decode_record(&entry.value) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(key = %entry.key, error = %e, "skipping undecodable bookmark");
                None
            }
        })
        .collect()
}
