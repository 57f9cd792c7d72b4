use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::common::{Message, Record};
use crate::error::StoreError;

pub const DEFAULT_STORE_PATH: &str = "storage/data.json";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Timestamp -> message map as kept on disk. Keys share one fixed-width
/// format, so lexical order is chronological order.
pub type RecordMap = BTreeMap<String, Message>;

/// JSON file holding every persisted record.
///
/// `append` is a read-modify-write of the whole file with no locking. The
/// store is deliberately not `Clone` and `append` takes `&mut self`: the one
/// value is moved into the listener task, which is the only writer.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole store. A missing file is an empty store.
    pub fn load(&self) -> Result<RecordMap, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(RecordMap::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrites the store with `all`, pretty-printed with 4-space indents.
    ///
    /// The content is written to a sibling temp file and renamed into place.
    pub fn save(&self, all: &RecordMap) -> Result<(), StoreError> {
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let json = to_pretty_json(all).map_err(|err| write_err(err.into()))?;
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)
    }

    /// Persists `msg` under the current local time and returns the new record.
    pub fn append(&mut self, msg: Message) -> Result<Record, StoreError> {
        let mut all = self.load()?;
        let timestamp = unused_timestamp(&all, Local::now().naive_local());

        all.insert(timestamp.clone(), msg.clone());
        self.save(&all)?;

        Ok(Record {
            timestamp,
            message: msg,
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// Two appends inside the same microsecond would otherwise share a key.
fn unused_timestamp(all: &RecordMap, mut ts: NaiveDateTime) -> String {
    let mut key = format_timestamp(ts);
    while all.contains_key(&key) {
        ts += TimeDelta::microseconds(1);
        key = format_timestamp(ts);
    }
    key
}

fn to_pretty_json(all: &RecordMap) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    all.serialize(&mut serializer)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonStore {
        JsonStore::new(dir.path().join("storage").join("data.json"))
    }

    fn msg(username: &str, message: &str) -> Message {
        Message::new(Some(username.to_string()), Some(message.to_string()))
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn load_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.append(msg("a", "one")).unwrap();

        assert_eq!(store.load().unwrap(), store.load().unwrap());
    }

    #[test]
    fn load_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn load_rejects_non_record_values() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{"2024-01-01T00:00:00.000000": 5}"#).unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn append_creates_parent_dir_and_file() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let record = store.append(msg("olena", "hello")).unwrap();

        let all = store.load().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get(&record.timestamp), Some(&record.message));
        assert!(NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn sequential_appends_keep_both_records() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let first = store.append(msg("a", "first")).unwrap();
        let second = store.append(msg("b", "second")).unwrap();

        assert_ne!(first.timestamp, second.timestamp);
        let all = store.load().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&first.timestamp].message, "first");
        assert_eq!(all[&second.timestamp].message, "second");
    }

    #[test]
    fn save_of_load_leaves_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.append(msg("a", "one")).unwrap();
        store.append(msg("b", "two")).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        store.save(&store.load().unwrap()).unwrap();

        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn save_uses_four_space_indent_and_literal_unicode() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut all = RecordMap::new();
        all.insert("2024-05-01T10:00:00.000001".into(), msg("Тарас", "ñ ✓"));

        store.save(&all).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            content,
            "{\n    \"2024-05-01T10:00:00.000001\": {\n        \"username\": \"Тарас\",\n        \"message\": \"ñ ✓\"\n    }\n}"
        );
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn save_reports_write_failure() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        fs::create_dir_all(store.tmp_path()).unwrap();

        let result = store.save(&RecordMap::new());
        assert!(matches!(result, Err(StoreError::Write { .. })));

        let result = store.append(msg("a", "lost"));
        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert!(!store.path().exists());
    }

    #[test]
    fn unused_timestamp_skips_taken_keys() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(10, 0, 0, 999_999)
            .unwrap();
        let mut all = RecordMap::new();
        all.insert(format_timestamp(ts), msg("a", "x"));

        assert_eq!(unused_timestamp(&all, ts), "2024-05-01T10:00:01.000000");
    }
}
