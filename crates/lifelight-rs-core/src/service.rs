//! Service facade wiring the store, scheduler, analytics and notification bus.

use crate::analytics::{Analytics, BadgeProgress, newly_unlocked};
use crate::error::LifeLightError;
use crate::notifications::NotificationBus;
use crate::records::DrugInteraction;
use crate::scheduler::{ReminderScheduler, SchedulerHandle, SchedulerSettings};
use crate::store::RecordStore;
use lifelight_rs_config::LifeLightConfig;
use lifelight_rs_protocol::{
    Clock, NotificationDispatcher, NotificationEvent, SystemClock, UserId,
};
use log::{error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Explicitly constructed LifeLight core for one device.
pub struct LifeLight {
    config: LifeLightConfig,
    store: Arc<RecordStore>,
    bus: NotificationBus,
    analytics: Analytics,
    scheduler: Mutex<Option<SchedulerHandle>>,
}

impl LifeLight {
    /// Open the configured store with the system clock.
    ///
    /// A store that cannot be opened is a blocking initialization failure.
    pub fn open(config: &LifeLightConfig) -> Result<Self, LifeLightError> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        config: &LifeLightConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LifeLightError> {
        let path = config.store.resolved_path()?;
        let store = RecordStore::open(&path, clock).inspect_err(|err| {
            error!(
                "failed to open record store (path={}, err={})",
                path.display(),
                err
            );
        })?;
        if config.store.compact_on_open {
            store.compact()?;
        }
        info!(
            "record store opened (path={}, records={})",
            path.display(),
            store.record_count()
        );
        Ok(Self::assemble(config, store))
    }

    /// Build a non-durable instance, for tests and ephemeral hosts.
    pub fn in_memory(config: &LifeLightConfig, clock: Arc<dyn Clock>) -> Self {
        Self::assemble(config, RecordStore::in_memory(clock))
    }

    fn assemble(config: &LifeLightConfig, store: RecordStore) -> Self {
        let store = Arc::new(store);
        Self {
            config: config.clone(),
            bus: NotificationBus::new(config.notifications.buffer),
            analytics: Analytics::new(Arc::clone(&store), config.analytics.clone()),
            store,
            scheduler: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub fn notifications(&self) -> &NotificationBus {
        &self.bus
    }

    /// Subscribe to notifications emitted by the scheduler and alerts.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.bus.subscribe()
    }

    pub fn config(&self) -> &LifeLightConfig {
        &self.config
    }

    /// Spawn the reminder scheduler for a user on the current tokio runtime.
    ///
    /// Returns `false` when the scheduler is disabled or already running.
    pub fn start_scheduler(&self, user_id: UserId) -> Result<bool, LifeLightError> {
        if !self.config.scheduler.enabled {
            info!("reminder scheduler disabled by config");
            return Ok(false);
        }
        self.store.get_user(user_id)?;
        let mut slot = self.scheduler.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            warn!("reminder scheduler already running (user_id={})", user_id);
            return Ok(false);
        }
        let dispatcher: Arc<dyn NotificationDispatcher> = Arc::new(self.bus.clone());
        let scheduler = ReminderScheduler::new(
            Arc::clone(&self.store),
            dispatcher,
            SchedulerSettings::from(&self.config.scheduler),
            user_id,
        );
        *slot = Some(Arc::new(scheduler).spawn());
        Ok(true)
    }

    /// Stop the scheduler, if running, and wait for it to exit.
    pub async fn shutdown(&self) {
        let handle = self.scheduler.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }

    /// Check the user's active medications against known interactions and
    /// publish one alert per interaction found.
    pub fn alert_interactions(&self, user_id: UserId) -> Vec<DrugInteraction> {
        let names: Vec<String> = self
            .store
            .list_active_medications(user_id)
            .into_iter()
            .flat_map(|medication| std::iter::once(medication.name).chain(medication.generic_name))
            .collect();
        let interactions = self.store.check_drug_interactions(&names);
        for interaction in &interactions {
            let event =
                NotificationEvent::interaction_warning(&interaction.medication1, &interaction.medication2);
            if let Err(err) = self.bus.dispatch(&event) {
                warn!(
                    "notification dispatch failed (tag={}, err={})",
                    event.tag, err
                );
            }
        }
        interactions
    }

    /// Recompute badges, publish an alert for each fresh unlock since
    /// `previous`, and return the current progress.
    pub fn announce_badges(&self, user_id: UserId, previous: &[BadgeProgress]) -> Vec<BadgeProgress> {
        let current = self.analytics.badge_progress(user_id);
        for badge in newly_unlocked(previous, &current) {
            info!("badge unlocked (user_id={}, badge={})", user_id, badge.id);
            let event = NotificationEvent::achievement_unlocked(badge.id, badge.name);
            if let Err(err) = self.bus.dispatch(&event) {
                warn!(
                    "notification dispatch failed (tag={}, err={})",
                    event.tag, err
                );
            }
        }
        current
    }
}
