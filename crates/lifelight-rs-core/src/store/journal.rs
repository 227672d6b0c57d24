//! Append-only JSONL journal backing a durable record store.

use super::migrations;
use crate::error::StoreError;
use crate::records::{Record, RecordKind};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Journal layout version written by this build.
pub const SCHEMA_VERSION: u32 = 2;

/// One journal line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum JournalEvent {
    SchemaVersion { version: u32 },
    Upserted { kind: RecordKind, record: Value },
    Deleted { kind: RecordKind, id: Uuid },
}

impl JournalEvent {
    pub(crate) fn upserted<T: Record>(record: &T) -> Result<Self, StoreError> {
        Ok(JournalEvent::Upserted {
            kind: T::KIND,
            record: serde_json::to_value(record)?,
        })
    }

    pub(crate) fn deleted<T: Record>(id: Uuid) -> Self {
        JournalEvent::Deleted { kind: T::KIND, id }
    }
}

/// Outcome of replaying a journal at open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    /// Live records after replay.
    pub records: usize,
    /// Version found in the journal header.
    pub from_version: u32,
    /// A torn final line was dropped.
    pub skipped_torn_tail: bool,
    /// The file must be rewritten before appending again.
    pub needs_rewrite: bool,
}

/// Latest record values per kind, with the line that produced each.
#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    records: HashMap<RecordKind, HashMap<Uuid, (usize, Value)>>,
}

impl Snapshot {
    fn apply_upsert(&mut self, line: usize, kind: RecordKind, record: Value) -> Result<(), StoreError> {
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| StoreError::Corrupt {
                line,
                message: format!("{kind} record without a valid id"),
            })?;
        self.records.entry(kind).or_default().insert(id, (line, record));
        Ok(())
    }

    fn apply_delete(&mut self, kind: RecordKind, id: Uuid) {
        let removed = self
            .records
            .get_mut(&kind)
            .and_then(|records| records.remove(&id));
        if removed.is_none() {
            debug!("journal deletes unknown record (kind={}, id={})", kind, id);
        }
    }

    fn len(&self) -> usize {
        self.records.values().map(HashMap::len).sum()
    }

    /// Decode every record of one kind.
    pub(crate) fn take<T: Record>(&mut self) -> Result<HashMap<Uuid, T>, StoreError> {
        let Some(records) = self.records.remove(&T::KIND) else {
            return Ok(HashMap::new());
        };
        records
            .into_iter()
            .map(|(id, (line, value))| {
                serde_json::from_value(value)
                    .map(|record| (id, record))
                    .map_err(|err| StoreError::Corrupt {
                        line,
                        message: format!("invalid {} record: {err}", T::KIND),
                    })
            })
            .collect()
    }
}

/// Journal file handle. Each append reopens the file so a rewrite by
/// rename is picked up by the next write.
pub(crate) struct Journal {
    path: PathBuf,
    /// Serialize appends and rewrites.
    write_lock: Mutex<()>,
}

impl Journal {
    /// Open (or create) the journal and replay it into a snapshot.
    pub(crate) fn open(path: impl AsRef<Path>) -> Result<(Self, Snapshot, ReplayReport), StoreError> {
        let path = path.as_ref().to_path_buf();
        let journal = Self {
            path,
            write_lock: Mutex::new(()),
        };
        let contents = match fs::read_to_string(&journal.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            journal.initialize()?;
            let report = ReplayReport {
                records: 0,
                from_version: SCHEMA_VERSION,
                skipped_torn_tail: false,
                needs_rewrite: false,
            };
            return Ok((journal, Snapshot::default(), report));
        }
        let (snapshot, report) = replay(&contents)?;
        info!(
            "replayed journal (path={}, records={}, version={}, torn_tail={})",
            journal.path.display(),
            report.records,
            report.from_version,
            report.skipped_torn_tail
        );
        Ok((journal, snapshot, report))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Write a fresh header-only journal.
    fn initialize(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        self.rewrite(&[])?;
        info!("initialized record journal (path={})", self.path.display());
        Ok(())
    }

    /// Append one event.
    pub(crate) fn append(&self, event: &JournalEvent) -> Result<(), StoreError> {
        let line = serde_json::to_string(event)?;
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Replace the journal with a header plus the given events.
    pub(crate) fn rewrite(&self, events: &[JournalEvent]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let temp_path = self.path.with_extension("jsonl.tmp");
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            let header = JournalEvent::SchemaVersion {
                version: SCHEMA_VERSION,
            };
            writeln!(file, "{}", serde_json::to_string(&header)?)?;
            for event in events {
                writeln!(file, "{}", serde_json::to_string(event)?)?;
            }
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        debug!(
            "rewrote journal (path={}, events={})",
            self.path.display(),
            events.len()
        );
        Ok(())
    }
}

fn replay(contents: &str) -> Result<(Snapshot, ReplayReport), StoreError> {
    let ends_with_newline = contents.ends_with('\n');
    let lines: Vec<(usize, &str)> = contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();
    let last_line = lines.last().map(|(number, _)| *number);

    let mut snapshot = Snapshot::default();
    let mut version = None;
    let mut skipped_torn_tail = false;

    for (number, line) in lines {
        let event: JournalEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) if !ends_with_newline && Some(number) == last_line => {
                warn!("ignoring torn journal tail (line={}, err={})", number, err);
                skipped_torn_tail = true;
                break;
            }
            Err(err) => {
                return Err(StoreError::Corrupt {
                    line: number,
                    message: err.to_string(),
                });
            }
        };
        let Some(from_version) = version else {
            let JournalEvent::SchemaVersion { version: found } = event else {
                return Err(StoreError::MissingSchemaHeader);
            };
            if found > SCHEMA_VERSION {
                return Err(StoreError::UnsupportedSchema(found));
            }
            version = Some(found);
            continue;
        };
        match event {
            JournalEvent::SchemaVersion { .. } => {
                return Err(StoreError::Corrupt {
                    line: number,
                    message: "unexpected schema version header".to_string(),
                });
            }
            JournalEvent::Upserted { kind, mut record } => {
                migrations::migrate(kind, &mut record, from_version);
                snapshot.apply_upsert(number, kind, record)?;
            }
            JournalEvent::Deleted { kind, id } => snapshot.apply_delete(kind, id),
        }
    }

    let from_version = version.ok_or(StoreError::MissingSchemaHeader)?;
    let report = ReplayReport {
        records: snapshot.len(),
        from_version,
        skipped_torn_tail,
        needs_rewrite: from_version < SCHEMA_VERSION || !ends_with_newline,
    };
    Ok((snapshot, report))
}

#[cfg(test)]
mod tests {
    use super::{SCHEMA_VERSION, StoreError, replay};
    use pretty_assertions::assert_eq;

    const HEADER: &str = r#"{"type":"schema_version","version":2}"#;

    #[test]
    fn later_upsert_replaces_earlier_and_delete_removes() {
        let id = "6f1c1f1e-0000-4000-8000-000000000001";
        let other = "6f1c1f1e-0000-4000-8000-000000000002";
        let contents = format!(
            "{HEADER}\n\
             {{\"type\":\"upserted\",\"kind\":\"user\",\"record\":{{\"id\":\"{id}\",\"name\":\"a\"}}}}\n\
             {{\"type\":\"upserted\",\"kind\":\"user\",\"record\":{{\"id\":\"{id}\",\"name\":\"b\"}}}}\n\
             {{\"type\":\"upserted\",\"kind\":\"user\",\"record\":{{\"id\":\"{other}\",\"name\":\"c\"}}}}\n\
             {{\"type\":\"deleted\",\"kind\":\"user\",\"id\":\"{other}\"}}\n"
        );
        let (_, report) = replay(&contents).expect("replay");
        assert_eq!(report.records, 1);
        assert_eq!(report.from_version, SCHEMA_VERSION);
        assert_eq!(report.needs_rewrite, false);
    }

    #[test]
    fn record_before_header_is_rejected() {
        let contents = "{\"type\":\"deleted\",\"kind\":\"user\",\"id\":\"6f1c1f1e-0000-4000-8000-000000000001\"}\n";
        let err = replay(contents).unwrap_err();
        assert!(matches!(err, StoreError::MissingSchemaHeader));
    }

    #[test]
    fn corrupt_middle_line_is_fatal() {
        let contents = format!("{HEADER}\nnot json\n{HEADER}\n");
        let err = replay(&contents).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn torn_final_line_is_dropped() {
        let contents = format!("{HEADER}\n{{\"type\":\"upser");
        let (_, report) = replay(&contents).expect("replay");
        assert_eq!(report.skipped_torn_tail, true);
        assert_eq!(report.needs_rewrite, true);
        assert_eq!(report.records, 0);
    }

    #[test]
    fn newer_version_is_unsupported() {
        let contents = "{\"type\":\"schema_version\",\"version\":99}\n";
        let err = replay(contents).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedSchema(99)));
    }
}
