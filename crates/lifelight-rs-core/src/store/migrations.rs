//! Per-record journal migrations. Steps are additive: fields may be filled
//! in, never silently dropped.

use crate::records::RecordKind;
use serde_json::Value;

/// One schema step, upgrading records written at `from` to `from + 1`.
pub(crate) struct Migration {
    pub from: u32,
    pub description: &'static str,
    pub apply: fn(RecordKind, &mut Value),
}

pub(crate) const MIGRATIONS: &[Migration] = &[Migration {
    from: 1,
    description: "backfill updated_at on reminders and insights",
    apply: backfill_updated_at,
}];

/// Upgrade a record written at `from_version` to the current layout.
pub(crate) fn migrate(kind: RecordKind, record: &mut Value, from_version: u32) {
    for migration in MIGRATIONS.iter().filter(|step| step.from >= from_version) {
        (migration.apply)(kind, record);
    }
}

fn backfill_updated_at(kind: RecordKind, record: &mut Value) {
    if !matches!(kind, RecordKind::MedicationReminder | RecordKind::AiInsight) {
        return;
    }
    let Some(map) = record.as_object_mut() else {
        return;
    };
    if map.get("updated_at").is_some_and(|value| !value.is_null()) {
        return;
    }
    if let Some(created_at) = map.get("created_at").cloned() {
        map.insert("updated_at".to_string(), created_at);
    }
}
