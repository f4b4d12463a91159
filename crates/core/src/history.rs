//! Persistent dedup history.
//!
//! The history maps each seen guid to the time it was first recorded. It is
//! loaded once at run start, mutated in memory, and written back once at run
//! end. Entries expire after the retention window so the file stays bounded.
//!
//! There is no locking: two runs sharing a history file race and the last
//! writer wins. Runs are expected to be scheduled one per source at a time.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// On-disk shape of the history file.
///
/// `guids` is a `BTreeMap` so serialization is always sorted by guid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    #[serde(default, deserialize_with = "lenient_guids")]
    pub guids: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Dedup history owned by a single run.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    snapshot: HistorySnapshot,
}

impl HistoryStore {
    /// Creates an empty store that will persist to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: HistorySnapshot::default(),
        }
    }

    /// Loads history from `path`.
    ///
    /// A missing or unparsable file yields an empty history; the run then
    /// treats every fetched item as new.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let snapshot = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HistorySnapshot>(&content) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    let err = Error::history_corrupt(&path, e.to_string());
                    warn!(code = err.code(), error = %err, "Starting with empty history");
                    HistorySnapshot::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No history file yet");
                HistorySnapshot::default()
            }
            Err(e) => {
                let err = Error::history_corrupt(&path, e.to_string());
                warn!(code = err.code(), error = %err, "Starting with empty history");
                HistorySnapshot::default()
            }
        };

        debug!(path = %path.display(), entries = snapshot.guids.len(), "Loaded history");
        Self { path, snapshot }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &HistorySnapshot {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.snapshot.guids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.guids.is_empty()
    }

    /// Whether `guid` has been recorded and not yet evicted.
    pub fn is_processed(&self, guid: &str) -> bool {
        self.snapshot.guids.contains_key(guid)
    }

    /// First-seen timestamp recorded for `guid`.
    pub fn first_seen(&self, guid: &str) -> Option<&str> {
        self.snapshot.guids.get(guid).map(String::as_str)
    }

    /// Records guids as seen now. Already-recorded guids keep their time.
    pub fn mark_processed<I, S>(&mut self, guids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mark_processed_at(guids, Utc::now())
    }

    /// Records guids as seen at `now`; returns how many were new.
    pub fn mark_processed_at<I, S>(&mut self, guids: I, now: DateTime<Utc>) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stamp = format_timestamp(now);
        let mut inserted = 0;

        for guid in guids {
            self.snapshot
                .guids
                .entry(guid.into())
                .or_insert_with(|| {
                    inserted += 1;
                    stamp.clone()
                });
        }

        inserted
    }

    /// Evicts entries at least `retention_days` old; returns the count.
    pub fn cleanup(&mut self, retention_days: u32) -> usize {
        self.cleanup_at(Utc::now(), retention_days)
    }

    /// Evicts entries whose age at `now` is at least `retention_days`.
    ///
    /// Entries with unparsable timestamps are kept.
    pub fn cleanup_at(&mut self, now: DateTime<Utc>, retention_days: u32) -> usize {
        let Some(cutoff) = Duration::try_days(i64::from(retention_days))
            .and_then(|window| now.checked_sub_signed(window))
        else {
            debug!(retention_days = retention_days, "Retention window exceeds date range, nothing to evict");
            return 0;
        };
        let before = self.snapshot.guids.len();

        self.snapshot.guids.retain(|guid, stamp| match parse_timestamp(stamp) {
            Some(seen) => seen > cutoff,
            None => {
                debug!(guid = %guid, stamp = %stamp, "Keeping entry with unparsable timestamp");
                true
            }
        });

        let evicted = before - self.snapshot.guids.len();
        if evicted > 0 {
            info!(evicted = evicted, retention_days = retention_days, "History cleanup complete");
        }
        evicted
    }

    /// Writes the snapshot with `updated_at = now`.
    ///
    /// Parent directories are created as needed and the file is replaced
    /// atomically, so a failed write never truncates the previous history.
    pub fn persist(&mut self) -> Result<()> {
        self.snapshot.updated_at = Some(format_timestamp(Utc::now()));

        let body = serde_json::to_string_pretty(&self.snapshot)
            .map_err(|e| Error::persist_failed(&self.path, e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::persist_failed(&self.path, e.to_string()))?;
        }

        let tmp = temp_path(&self.path);
        fs::write(&tmp, body).map_err(|e| Error::persist_failed(&self.path, e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::persist_failed(&self.path, e.to_string())
        })?;

        info!(path = %self.path.display(), entries = self.len(), "Persisted history");
        Ok(())
    }
}

/// History file that belongs to a published feed.
///
/// `output/cnbeta.xml` keeps its history in `output/cnbeta-processed.json`.
pub fn history_path_for(feed_path: &Path) -> PathBuf {
    let raw = feed_path.to_string_lossy();
    match raw.strip_suffix(".xml") {
        Some(stem) => PathBuf::from(format!("{stem}-processed.json")),
        None => PathBuf::from(format!("{raw}-processed.json")),
    }
}

/// Reads guid timestamps one entry at a time.
///
/// A non-string timestamp keeps its guid, stored as the value's JSON text.
/// Such an entry never parses as a timestamp, so cleanup leaves it in place.
fn lenient_guids<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(guid, value)| {
            let stamp = match value {
                Value::String(stamp) => stamp,
                other => {
                    warn!(guid = %guid, value = %other, "Non-string history timestamp");
                    other.to_string()
                }
            };
            (guid, stamp)
        })
        .collect())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Formats like JavaScript's `toISOString`: `2024-01-01T00:00:00.000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses RFC 3339 timestamps, and naive ISO timestamps as UTC.
pub fn parse_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(stamp) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
