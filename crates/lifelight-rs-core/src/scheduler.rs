//! Reminder scheduler: turns standing reminders into at-most-once
//! notifications per scheduled day.

use crate::error::StoreError;
use crate::records::MedicationReminder;
use crate::store::RecordStore;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use lifelight_rs_config::SchedulerConfig;
use lifelight_rs_protocol::{
    MedicationId, NotificationDispatcher, NotificationEvent, ReminderId, ReminderTime, UserId,
};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Timing knobs for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub tick_interval: Duration,
    /// How long after its time an occurrence may still fire.
    pub due_window: Duration,
    pub health_check_in: Option<ReminderTime>,
}

impl From<&SchedulerConfig> for SchedulerSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            due_window: config.due_window(),
            health_check_in: config.health_check_in,
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

/// Why one reminder could not be evaluated this tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerSkip {
    #[error("medication {0} no longer exists")]
    MedicationMissing(MedicationId),
    #[error("medication {0} is inactive")]
    MedicationInactive(MedicationId),
    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for SchedulerSkip {
    fn from(err: StoreError) -> Self {
        SchedulerSkip::Store(err.to_string())
    }
}

/// Counts from one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Occurrences marked as triggered, check-ins included.
    pub fired: usize,
    pub skipped: usize,
    /// Fired occurrences the dispatcher failed to deliver.
    pub dispatch_failures: usize,
}

/// Local instant at which a reminder is due today, if it fires today.
pub fn due_instant(
    reminder: &MedicationReminder,
    now: DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let today = now.date_naive();
    if !reminder.fires_on(today) {
        return None;
    }
    at_local_time(today, reminder.time, now.offset())
}

/// True when the reminder's occurrence today should fire at `now`.
///
/// Due means `now` falls in `[due, due + window]` and the reminder was not
/// already triggered on the occurrence's calendar day.
pub fn is_due(reminder: &MedicationReminder, now: DateTime<FixedOffset>, window: Duration) -> bool {
    let Some(due) = due_instant(reminder, now) else {
        return false;
    };
    if !within_window(due, now, window) {
        return false;
    }
    match reminder.last_triggered {
        None => true,
        Some(last) => last.with_timezone(now.offset()).date_naive() != due.date_naive(),
    }
}

fn at_local_time(
    day: NaiveDate,
    time: ReminderTime,
    offset: &FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    day.and_time(time.to_naive_time())
        .and_local_timezone(*offset)
        .single()
}

fn within_window(due: DateTime<FixedOffset>, now: DateTime<FixedOffset>, window: Duration) -> bool {
    let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
    let elapsed = now - due;
    elapsed >= TimeDelta::zero() && elapsed <= window
}

/// Clears the in-flight flag when a tick ends, however it ends.
struct TickGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TickGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Periodic evaluator for one user's reminders.
pub struct ReminderScheduler {
    store: Arc<RecordStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    settings: SchedulerSettings,
    user_id: UserId,
    in_flight: AtomicBool,
    /// Day the health check-in was last handled. Process lifetime only.
    last_check_in: Mutex<Option<NaiveDate>>,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<RecordStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        settings: SchedulerSettings,
        user_id: UserId,
    ) -> Self {
        Self {
            store,
            dispatcher,
            settings,
            user_id,
            in_flight: AtomicBool::new(false),
            last_check_in: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Evaluate every active reminder once.
    ///
    /// Returns `None` without doing anything when another tick is still
    /// running; that fire is dropped, not queued.
    pub fn tick(&self) -> Option<TickReport> {
        let Some(_guard) = TickGuard::acquire(&self.in_flight) else {
            debug!("scheduler tick already in flight (user_id={})", self.user_id);
            return None;
        };
        let now = self.store.clock().now();
        let reminders = self.store.list_active_reminders(self.user_id);
        debug!(
            "scheduler tick started (user_id={}, active_reminders={}, now={})",
            self.user_id,
            reminders.len(),
            now
        );

        let mut report = TickReport::default();
        for reminder in reminders
            .iter()
            .filter(|reminder| is_due(reminder, now, self.settings.due_window))
        {
            match self.trigger(reminder, now) {
                Ok(event) => {
                    report.fired += 1;
                    self.deliver(&event, &mut report);
                }
                Err(skip) => {
                    report.skipped += 1;
                    warn!(
                        "skipping reminder (reminder_id={}, reason={})",
                        reminder.id, skip
                    );
                }
            }
        }
        self.check_in(now, &mut report);

        debug!(
            "scheduler tick finished (fired={}, skipped={}, dispatch_failures={})",
            report.fired, report.skipped, report.dispatch_failures
        );
        Some(report)
    }

    /// Mark the occurrence as triggered, then build its notification.
    ///
    /// The trigger is recorded before dispatch: a crash mid-dispatch loses
    /// the notification instead of repeating it.
    fn trigger(
        &self,
        reminder: &MedicationReminder,
        now: DateTime<FixedOffset>,
    ) -> Result<NotificationEvent, SchedulerSkip> {
        let medication = match self.store.get_medication(reminder.medication_id) {
            Ok(medication) => medication,
            Err(StoreError::NotFound { .. }) => {
                return Err(SchedulerSkip::MedicationMissing(reminder.medication_id));
            }
            Err(err) => return Err(err.into()),
        };
        if !medication.is_active {
            return Err(SchedulerSkip::MedicationInactive(medication.id));
        }
        self.store
            .mark_reminder_triggered(reminder.id, now.with_timezone(&Utc))?;
        info!(
            "reminder fired (reminder_id={}, medication={}, due={})",
            reminder.id, medication.name, reminder.time
        );
        Ok(NotificationEvent::medication_reminder(
            reminder.id,
            medication.id,
            &medication.name,
            &medication.dosage,
            now.date_naive(),
        ))
    }

    fn deliver(&self, event: &NotificationEvent, report: &mut TickReport) {
        if let Err(err) = self.dispatcher.dispatch(event) {
            report.dispatch_failures += 1;
            warn!(
                "notification dispatch failed (tag={}, err={})",
                event.tag, err
            );
        }
    }

    /// Daily health check-in, suppressed once a health log exists for today.
    fn check_in(&self, now: DateTime<FixedOffset>, report: &mut TickReport) {
        let Some(time) = self.settings.health_check_in else {
            return;
        };
        let today = now.date_naive();
        let Some(due) = at_local_time(today, time, now.offset()) else {
            return;
        };
        if !within_window(due, now, self.settings.due_window) {
            return;
        }
        {
            let mut last = self.last_check_in.lock();
            if *last == Some(today) {
                return;
            }
            *last = Some(today);
        }
        if !self
            .store
            .health_logs_between(self.user_id, today, today)
            .is_empty()
        {
            debug!("health already logged today, no check-in (day={})", today);
            return;
        }
        info!("health check-in due (user_id={}, day={})", self.user_id, today);
        report.fired += 1;
        self.deliver(&NotificationEvent::health_check_in(today), report);
    }

    /// Start the periodic loop. The first tick runs immediately.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.settings.tick_interval.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                "reminder scheduler started (user_id={}, tick_interval_ms={})",
                self.user_id,
                period.as_millis()
            );
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.tick();
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("reminder scheduler stopped (user_id={})", self.user_id);
        });
        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    /// Reminders for this user that would fire if evaluated at `now`.
    pub fn due_reminders(&self, now: DateTime<FixedOffset>) -> Vec<ReminderId> {
        self.store
            .list_active_reminders(self.user_id)
            .iter()
            .filter(|reminder| is_due(reminder, now, self.settings.due_window))
            .map(|reminder| reminder.id)
            .collect()
    }
}

/// Handle for a running scheduler loop. Dropping it also stops the loop.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!("reminder scheduler task failed (err={})", err);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::{due_instant, is_due};
    use crate::records::MedicationReminder;
    use chrono::{DateTime, TimeZone, Utc};
    use lifelight_rs_protocol::ReminderTime;
    use lifelight_rs_test_utils::local;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use uuid::Uuid;

    const WINDOW: Duration = Duration::from_secs(300);

    fn weekday_reminder(last_triggered: Option<DateTime<Utc>>) -> MedicationReminder {
        MedicationReminder {
            id: Uuid::new_v4(),
            medication_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            time: ReminderTime::new(8, 0).expect("time"),
            days: vec![1, 2, 3, 4, 5],
            is_active: true,
            last_triggered,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn due_inside_window_on_scheduled_day() {
        // 2024-01-01 is a Monday.
        let reminder = weekday_reminder(None);
        assert_eq!(is_due(&reminder, local(2024, 1, 1, 8, 0), WINDOW), true);
        assert_eq!(is_due(&reminder, local(2024, 1, 1, 8, 5), WINDOW), true);
        assert_eq!(is_due(&reminder, local(2024, 1, 1, 7, 59), WINDOW), false);
        assert_eq!(is_due(&reminder, local(2024, 1, 1, 8, 6), WINDOW), false);
    }

    #[test]
    fn not_due_on_unscheduled_day() {
        // 2024-01-07 is a Sunday.
        let reminder = weekday_reminder(None);
        assert_eq!(due_instant(&reminder, local(2024, 1, 7, 8, 2)), None);
        assert_eq!(is_due(&reminder, local(2024, 1, 7, 8, 2), WINDOW), false);
    }

    #[test]
    fn triggered_today_is_not_due_but_yesterday_is() {
        let today = Utc.with_ymd_and_hms(2024, 1, 2, 8, 1, 0).single();
        let reminder = weekday_reminder(today);
        assert_eq!(is_due(&reminder, local(2024, 1, 2, 8, 3), WINDOW), false);

        let yesterday = Utc.with_ymd_and_hms(2024, 1, 1, 8, 1, 0).single();
        let reminder = weekday_reminder(yesterday);
        assert_eq!(is_due(&reminder, local(2024, 1, 2, 8, 3), WINDOW), true);
    }
}
