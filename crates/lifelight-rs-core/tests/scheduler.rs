//! Reminder scheduler behavior against a manual clock.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use lifelight_rs_core::records::{
    MedicationReminder, NewHealthLog, NewMedication, NewReminder, NewUser,
};
use lifelight_rs_core::{RecordStore, ReminderScheduler, SchedulerSettings, TickReport};
use lifelight_rs_protocol::{
    DispatchError, NotificationDispatcher, NotificationEvent, ReminderTime, UserId,
};
use lifelight_rs_test_utils::{FailingDispatcher, ManualClock, RecordingDispatcher, local};
use pretty_assertions::assert_eq;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock, Weak};

struct Fixture {
    clock: Arc<ManualClock>,
    store: Arc<RecordStore>,
    user_id: UserId,
}

impl Fixture {
    /// Store with one user; 2024-01-01 is a Monday.
    fn monday(hour: u32, minute: u32) -> Self {
        let clock = Arc::new(ManualClock::at(2024, 1, 1, hour, minute));
        let store = Arc::new(RecordStore::in_memory(clock.clone()));
        let user = store
            .create_user(NewUser {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                ..NewUser::default()
            })
            .expect("user");
        Self {
            clock,
            store,
            user_id: user.id,
        }
    }

    /// Weekday 08:00 reminder for a fresh medication.
    fn weekday_reminder(&self) -> MedicationReminder {
        let medication = self
            .store
            .add_medication(NewMedication {
                user_id: self.user_id,
                name: "Lisinopril".to_string(),
                dosage: "10mg".to_string(),
                frequency: "once daily".to_string(),
                ..NewMedication::default()
            })
            .expect("medication");
        self.store
            .add_reminder(NewReminder {
                medication_id: medication.id,
                user_id: self.user_id,
                time: ReminderTime::new(8, 0).expect("time"),
                days: vec![1, 2, 3, 4, 5],
                is_active: true,
            })
            .expect("reminder")
    }

    fn scheduler(
        &self,
        dispatcher: Arc<dyn NotificationDispatcher>,
        settings: SchedulerSettings,
    ) -> ReminderScheduler {
        ReminderScheduler::new(Arc::clone(&self.store), dispatcher, settings, self.user_id)
    }
}

fn five_minute_window() -> SchedulerSettings {
    SchedulerSettings {
        tick_interval: std::time::Duration::from_secs(60),
        due_window: std::time::Duration::from_secs(300),
        health_check_in: None,
    }
}

#[test]
fn fires_once_per_occurrence_within_window() {
    let fixture = Fixture::monday(8, 2);
    let reminder = fixture.weekday_reminder();
    let recorder = Arc::new(RecordingDispatcher::new());
    let scheduler = fixture.scheduler(recorder.clone(), five_minute_window());

    let report = scheduler.tick().expect("tick");
    assert_eq!(
        report,
        TickReport {
            fired: 1,
            skipped: 0,
            dispatch_failures: 0
        }
    );
    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Medication Reminder");
    assert_eq!(events[0].body, "Time to take Lisinopril (10mg)");
    assert_eq!(events[0].tag, format!("medication-{}-2024-01-01", reminder.id));
    assert_eq!(events[0].require_interaction, true);
    assert_eq!(events[0].data.action, "/medications");
    assert_eq!(events[0].data.reminder_id, Some(reminder.id));

    let stored = fixture.store.get_reminder(reminder.id).expect("reminder");
    assert_eq!(
        stored.last_triggered,
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 2, 0).single()
    );

    fixture.clock.set(local(2024, 1, 1, 8, 4));
    let report = scheduler.tick().expect("tick");
    assert_eq!(report.fired, 0);
    assert_eq!(recorder.len(), 1);
}

#[test]
fn late_or_early_ticks_do_not_fire() {
    let fixture = Fixture::monday(7, 59);
    fixture.weekday_reminder();
    let recorder = Arc::new(RecordingDispatcher::new());
    let scheduler = fixture.scheduler(recorder.clone(), five_minute_window());

    assert_eq!(scheduler.tick().expect("tick").fired, 0);
    fixture.clock.set(local(2024, 1, 1, 8, 6));
    assert_eq!(scheduler.tick().expect("tick").fired, 0);
    assert!(recorder.is_empty());
}

#[test]
fn fires_again_on_the_next_scheduled_day() {
    let fixture = Fixture::monday(8, 1);
    let reminder = fixture.weekday_reminder();
    let recorder = Arc::new(RecordingDispatcher::new());
    let scheduler = fixture.scheduler(recorder.clone(), five_minute_window());

    scheduler.tick().expect("tick");
    fixture.clock.advance(Duration::days(1));
    scheduler.tick().expect("tick");

    let tags: Vec<String> = recorder.events().into_iter().map(|event| event.tag).collect();
    assert_eq!(
        tags,
        vec![
            format!("medication-{}-2024-01-01", reminder.id),
            format!("medication-{}-2024-01-02", reminder.id),
        ]
    );
}

#[test]
fn weekend_is_skipped_for_weekday_reminders() {
    // 2024-01-06 is a Saturday.
    let fixture = Fixture::monday(8, 1);
    fixture.weekday_reminder();
    fixture.clock.set(local(2024, 1, 6, 8, 1));
    let recorder = Arc::new(RecordingDispatcher::new());
    let scheduler = fixture.scheduler(recorder.clone(), five_minute_window());
    assert_eq!(scheduler.tick().expect("tick").fired, 0);
    assert!(recorder.is_empty());
}

#[test]
fn inactive_medication_is_skipped_without_aborting_the_scan() {
    let fixture = Fixture::monday(8, 2);
    let stale = fixture.weekday_reminder();
    let live = fixture.weekday_reminder();
    fixture
        .store
        .deactivate_medication(stale.medication_id)
        .expect("deactivate");
    let recorder = Arc::new(RecordingDispatcher::new());
    let scheduler = fixture.scheduler(recorder.clone(), five_minute_window());

    let report = scheduler.tick().expect("tick");
    assert_eq!(report.fired, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(recorder.events()[0].data.reminder_id, Some(live.id));
    assert_eq!(
        fixture.store.get_reminder(stale.id).expect("reminder").last_triggered,
        None
    );
}

#[test]
fn failed_dispatch_is_not_retried() {
    let fixture = Fixture::monday(8, 2);
    let reminder = fixture.weekday_reminder();
    let failing = Arc::new(FailingDispatcher::new());
    let scheduler = fixture.scheduler(failing.clone(), five_minute_window());

    let report = scheduler.tick().expect("tick");
    assert_eq!(report.fired, 1);
    assert_eq!(report.dispatch_failures, 1);
    assert!(
        fixture
            .store
            .get_reminder(reminder.id)
            .expect("reminder")
            .last_triggered
            .is_some()
    );

    fixture.clock.set(local(2024, 1, 1, 8, 3));
    let report = scheduler.tick().expect("tick");
    assert_eq!(report.fired, 0);
    assert_eq!(failing.attempts(), 1);
}

#[test]
fn disabled_reminder_does_not_fire() {
    let fixture = Fixture::monday(8, 2);
    let reminder = fixture.weekday_reminder();
    fixture
        .store
        .set_reminder_active(reminder.id, false)
        .expect("disable");
    let recorder = Arc::new(RecordingDispatcher::new());
    let scheduler = fixture.scheduler(recorder.clone(), five_minute_window());
    assert_eq!(scheduler.tick().expect("tick"), TickReport::default());
}

#[test]
fn health_check_in_fires_once_a_day_unless_already_logged() {
    let fixture = Fixture::monday(20, 1);
    let recorder = Arc::new(RecordingDispatcher::new());
    let settings = SchedulerSettings {
        health_check_in: ReminderTime::new(20, 0),
        ..five_minute_window()
    };
    let scheduler = fixture.scheduler(recorder.clone(), settings);

    assert_eq!(scheduler.tick().expect("tick").fired, 1);
    fixture.clock.set(local(2024, 1, 1, 20, 3));
    assert_eq!(scheduler.tick().expect("tick").fired, 0);
    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tag, "health-check-in-2024-01-01");
    assert_eq!(events[0].data.action, "/health-log");

    fixture
        .store
        .add_health_log(NewHealthLog {
            user_id: fixture.user_id,
            date: NaiveDate::from_ymd_opt(2024, 1, 2),
            health_score: 75,
            ..NewHealthLog::default()
        })
        .expect("health log");
    fixture.clock.set(local(2024, 1, 2, 20, 1));
    assert_eq!(scheduler.tick().expect("tick").fired, 0);
    assert_eq!(recorder.len(), 1);
}

#[tokio::test]
async fn spawned_loop_ticks_eagerly_and_shuts_down() {
    let fixture = Fixture::monday(8, 2);
    fixture.weekday_reminder();
    let recorder = Arc::new(RecordingDispatcher::new());
    let settings = SchedulerSettings {
        tick_interval: std::time::Duration::from_millis(10),
        ..five_minute_window()
    };
    let scheduler = Arc::new(fixture.scheduler(recorder.clone(), settings));

    let handle = Arc::clone(&scheduler).spawn();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    handle.shutdown().await;

    assert_eq!(recorder.len(), 1);
}

/// Dispatcher that ticks its own scheduler while delivering.
#[derive(Default)]
struct ReentrantDispatcher {
    scheduler: OnceLock<Weak<ReminderScheduler>>,
    nested: Mutex<Vec<Option<TickReport>>>,
}

impl NotificationDispatcher for ReentrantDispatcher {
    fn dispatch(&self, _event: &NotificationEvent) -> Result<(), DispatchError> {
        if let Some(scheduler) = self.scheduler.get().and_then(Weak::upgrade) {
            let nested = scheduler.tick();
            self.nested.lock().push(nested);
        }
        Ok(())
    }
}

#[test]
fn tick_started_during_a_tick_is_dropped() {
    let fixture = Fixture::monday(8, 2);
    fixture.weekday_reminder();
    let dispatcher = Arc::new(ReentrantDispatcher::default());
    let scheduler = Arc::new(fixture.scheduler(dispatcher.clone(), five_minute_window()));
    dispatcher
        .scheduler
        .set(Arc::downgrade(&scheduler))
        .expect("scheduler set once");

    let report = scheduler.tick().expect("outer tick");
    assert_eq!(report.fired, 1);
    assert_eq!(*dispatcher.nested.lock(), vec![None]);

    // The guard is released once the outer tick returns.
    fixture.clock.set(local(2024, 1, 1, 8, 3));
    assert_eq!(scheduler.tick().expect("later tick").fired, 0);
}

fn sydney(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(10 * 3600)
        .and_then(|offset| offset.with_ymd_and_hms(2024, 1, day, hour, minute, 0).single())
        .expect("valid UTC+10 instant")
}

#[test]
fn occurrences_follow_the_local_day_east_of_utc() {
    let fixture = Fixture::monday(8, 2);
    fixture.clock.set(sydney(1, 8, 2));
    let reminder = fixture.weekday_reminder();
    let recorder = Arc::new(RecordingDispatcher::new());
    let scheduler = fixture.scheduler(recorder.clone(), five_minute_window());

    assert_eq!(scheduler.tick().expect("tick").fired, 1);
    // 08:02 Monday in UTC+10 is still Sunday in UTC.
    assert_eq!(
        fixture.store.get_reminder(reminder.id).expect("reminder").last_triggered,
        Utc.with_ymd_and_hms(2023, 12, 31, 22, 2, 0).single()
    );

    fixture.clock.set(sydney(1, 8, 4));
    assert_eq!(scheduler.tick().expect("tick").fired, 0);

    fixture.clock.set(sydney(2, 8, 1));
    assert_eq!(scheduler.tick().expect("tick").fired, 1);

    let tags: Vec<String> = recorder.events().into_iter().map(|event| event.tag).collect();
    assert_eq!(
        tags,
        vec![
            format!("medication-{}-2024-01-01", reminder.id),
            format!("medication-{}-2024-01-02", reminder.id),
        ]
    );
}
