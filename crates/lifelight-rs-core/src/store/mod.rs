//! Record store: typed in-memory collections with an optional durable
//! journal. Every mutation passes through [`RecordStore::commit`].

mod doses;
mod health;
mod insights;
mod interactions;
mod journal;
mod medications;
mod migrations;
mod reminders;
mod users;

pub use journal::{ReplayReport, SCHEMA_VERSION};

use crate::error::StoreError;
use crate::records::{
    AiInsight, DrugInteraction, HealthLog, Medication, MedicationLog, MedicationReminder, Record,
    RecordKind, User,
};
use chrono::{DateTime, NaiveDate, Utc};
use journal::{Journal, JournalEvent};
use lifelight_rs_protocol::{Clock, UserId};
use log::{debug, info};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// One entity kind's records behind its own lock.
struct Collection<T> {
    records: RwLock<HashMap<Uuid, T>>,
}

impl<T: Record> Collection<T> {
    fn new(records: HashMap<Uuid, T>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    fn get(&self, id: Uuid) -> Result<T, StoreError> {
        self.records
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(T::KIND, id))
    }

    fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.records
            .read()
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.records
            .read()
            .values()
            .find(|record| predicate(record))
            .cloned()
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }
}

/// A pending mutation handed to the write path.
enum Change<T> {
    Create(T),
    Update(T),
    Delete(Uuid),
}

/// Everything stored for one user.
#[derive(Debug, Clone, Serialize)]
pub struct UserDataExport {
    pub user: User,
    pub medications: Vec<Medication>,
    pub health_logs: Vec<HealthLog>,
    pub reminders: Vec<MedicationReminder>,
    pub medication_logs: Vec<MedicationLog>,
    pub insights: Vec<AiInsight>,
    pub exported_at: DateTime<Utc>,
}

/// Result of a maintenance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub expired_insights_removed: usize,
    pub compacted: bool,
}

/// Durable, queryable home for every entity. Reads return copies.
pub struct RecordStore {
    clock: Arc<dyn Clock>,
    journal: Option<Journal>,
    users: Collection<User>,
    medications: Collection<Medication>,
    health_logs: Collection<HealthLog>,
    reminders: Collection<MedicationReminder>,
    medication_logs: Collection<MedicationLog>,
    insights: Collection<AiInsight>,
    interactions: Collection<DrugInteraction>,
}

impl RecordStore {
    /// Create an ephemeral store with no journal.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        debug!("creating in-memory record store");
        Self {
            clock,
            journal: None,
            users: Collection::new(HashMap::new()),
            medications: Collection::new(HashMap::new()),
            health_logs: Collection::new(HashMap::new()),
            reminders: Collection::new(HashMap::new()),
            medication_logs: Collection::new(HashMap::new()),
            insights: Collection::new(HashMap::new()),
            interactions: Collection::new(HashMap::new()),
        }
    }

    /// Open a durable store, replaying (and if needed migrating) its journal.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let (journal, mut snapshot, report) = Journal::open(path)?;
        let store = Self {
            clock,
            users: Collection::new(snapshot.take()?),
            medications: Collection::new(snapshot.take()?),
            health_logs: Collection::new(snapshot.take()?),
            reminders: Collection::new(snapshot.take()?),
            medication_logs: Collection::new(snapshot.take()?),
            insights: Collection::new(snapshot.take()?),
            interactions: Collection::new(snapshot.take()?),
            journal: Some(journal),
        };
        if report.needs_rewrite {
            info!(
                "rewriting journal at current schema (from_version={}, to_version={})",
                report.from_version, SCHEMA_VERSION
            );
            store.compact()?;
        }
        Ok(store)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Today's date in the clock's local offset.
    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// True when records survive a restart.
    pub fn is_durable(&self) -> bool {
        self.journal.is_some()
    }

    /// The single write path: stamp, validate, journal, then publish.
    ///
    /// Callers hold the collection's write lock, so a failure at any step
    /// leaves the in-memory state untouched.
    fn commit<T: Record>(
        &self,
        records: &mut HashMap<Uuid, T>,
        change: Change<T>,
    ) -> Result<T, StoreError> {
        let now = self.clock.now_utc();
        match change {
            Change::Create(mut record) => {
                record.stamp_created(now);
                record.validate()?;
                self.persist(&JournalEvent::upserted(&record)?)?;
                debug!("created record (kind={}, id={})", T::KIND, record.id());
                records.insert(record.id(), record.clone());
                Ok(record)
            }
            Change::Update(mut record) => {
                record.stamp_updated(now);
                record.validate()?;
                self.persist(&JournalEvent::upserted(&record)?)?;
                debug!("updated record (kind={}, id={})", T::KIND, record.id());
                records.insert(record.id(), record.clone());
                Ok(record)
            }
            Change::Delete(id) => {
                if !records.contains_key(&id) {
                    return Err(StoreError::not_found(T::KIND, id));
                }
                self.persist(&JournalEvent::deleted::<T>(id))?;
                debug!("deleted record (kind={}, id={})", T::KIND, id);
                records
                    .remove(&id)
                    .ok_or_else(|| StoreError::not_found(T::KIND, id))
            }
        }
    }

    fn persist(&self, event: &JournalEvent) -> Result<(), StoreError> {
        match &self.journal {
            Some(journal) => journal.append(event),
            None => Ok(()),
        }
    }

    /// Insert a new record after `check` accepts it against its peers.
    fn create<T: Record>(
        &self,
        collection: &Collection<T>,
        record: T,
        check: impl FnOnce(&HashMap<Uuid, T>, &T) -> Result<(), StoreError>,
    ) -> Result<T, StoreError> {
        let mut records = collection.records.write();
        check(&records, &record)?;
        self.commit(&mut records, Change::Create(record))
    }

    /// Apply `mutate` to a copy of the record and commit it.
    fn update<T: Record>(
        &self,
        collection: &Collection<T>,
        id: Uuid,
        mutate: impl FnOnce(&mut T, &HashMap<Uuid, T>) -> Result<(), StoreError>,
    ) -> Result<T, StoreError> {
        let mut records = collection.records.write();
        let mut record = records
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(T::KIND, id))?;
        mutate(&mut record, &records)?;
        self.commit(&mut records, Change::Update(record))
    }

    fn remove<T: Record>(&self, collection: &Collection<T>, id: Uuid) -> Result<T, StoreError> {
        let mut records = collection.records.write();
        self.commit(&mut records, Change::Delete(id))
    }

    /// Delete every record matching `predicate`; returns how many went.
    fn remove_where<T: Record>(
        &self,
        collection: &Collection<T>,
        predicate: impl Fn(&T) -> bool,
    ) -> Result<usize, StoreError> {
        let mut records = collection.records.write();
        let doomed: Vec<Uuid> = records
            .values()
            .filter(|record| predicate(record))
            .map(|record| record.id())
            .collect();
        for id in &doomed {
            self.commit(&mut records, Change::Delete(*id))?;
        }
        Ok(doomed.len())
    }

    fn require_user(&self, user_id: UserId) -> Result<User, StoreError> {
        self.users.get(user_id)
    }

    /// Delete expired records of `kind`: those whose `expires_at < now`.
    pub fn purge_expired(&self, kind: RecordKind, now: DateTime<Utc>) -> Result<usize, StoreError> {
        match kind {
            RecordKind::AiInsight => self.purge_expired_insights(now),
            other => Err(StoreError::validation(format!(
                "{other} records do not expire"
            ))),
        }
    }

    /// Everything stored for one user, as a backup document.
    pub fn export_user_data(&self, user_id: UserId) -> Result<UserDataExport, StoreError> {
        let user = self.require_user(user_id)?;
        info!("exporting user data (user_id={})", user_id);
        Ok(UserDataExport {
            user,
            medications: self.list_medications(user_id),
            health_logs: self.list_health_logs(user_id, None),
            reminders: self.list_reminders(user_id),
            medication_logs: self.list_medication_logs(user_id, None),
            insights: self.list_insights(user_id, false),
            exported_at: self.clock.now_utc(),
        })
    }

    /// Purge expired insights at the clock's now and compact the journal.
    pub fn perform_maintenance(&self) -> Result<MaintenanceReport, StoreError> {
        let expired_insights_removed =
            self.purge_expired(RecordKind::AiInsight, self.clock.now_utc())?;
        let compacted = self.is_durable();
        self.compact()?;
        info!(
            "maintenance finished (expired_insights_removed={}, compacted={})",
            expired_insights_removed, compacted
        );
        Ok(MaintenanceReport {
            expired_insights_removed,
            compacted,
        })
    }

    /// Rewrite the journal as a snapshot of the current state.
    pub fn compact(&self) -> Result<(), StoreError> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        // Read locks in declaration order; writers take one collection lock
        // and then the journal lock, so this cannot deadlock.
        let users = self.users.records.read();
        let medications = self.medications.records.read();
        let health_logs = self.health_logs.records.read();
        let reminders = self.reminders.records.read();
        let medication_logs = self.medication_logs.records.read();
        let insights = self.insights.records.read();
        let interactions = self.interactions.records.read();

        let mut events = Vec::new();
        snapshot_events(&mut events, &users)?;
        snapshot_events(&mut events, &medications)?;
        snapshot_events(&mut events, &health_logs)?;
        snapshot_events(&mut events, &reminders)?;
        snapshot_events(&mut events, &medication_logs)?;
        snapshot_events(&mut events, &insights)?;
        snapshot_events(&mut events, &interactions)?;
        journal.rewrite(&events)?;
        info!(
            "compacted journal (path={}, records={})",
            journal.path().display(),
            events.len()
        );
        Ok(())
    }

    /// Total live records across every kind.
    pub fn record_count(&self) -> usize {
        self.users.len()
            + self.medications.len()
            + self.health_logs.len()
            + self.reminders.len()
            + self.medication_logs.len()
            + self.insights.len()
            + self.interactions.len()
    }
}

fn snapshot_events<T: Record>(
    events: &mut Vec<JournalEvent>,
    records: &HashMap<Uuid, T>,
) -> Result<(), StoreError> {
    let mut ordered: Vec<&T> = records.values().collect();
    ordered.sort_by_key(|record| record.id());
    for record in ordered {
        events.push(JournalEvent::upserted(record)?);
    }
    Ok(())
}

/// Keep the newest `limit` entries of an already sorted list.
fn truncate<T>(mut records: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records
}
