//! Core services for LifeLight.
//!
//! This crate owns the record store, the reminder scheduler, adherence
//! analytics, and the `LifeLight` facade used by host applications.

pub mod analytics;
pub mod error;
pub mod notifications;
pub mod records;
pub mod scheduler;
mod service;
pub mod store;

pub use analytics::{Analytics, BadgeProgress, UserStats};
pub use error::{LifeLightError, StoreError};
pub use notifications::NotificationBus;
pub use scheduler::{ReminderScheduler, SchedulerHandle, SchedulerSettings, SchedulerSkip, TickReport};
pub use service::LifeLight;
pub use store::{MaintenanceReport, RecordStore, UserDataExport};
