//! Shared vocabulary for LifeLight: identifiers, the clock seam, and the
//! notification events handed to the host platform.

mod clock;
mod notification;
mod time;

pub use clock::{Clock, SystemClock};
pub use notification::{
    DispatchError, NotificationData, NotificationDispatcher, NotificationEvent,
};
pub use time::{ParseReminderTimeError, ReminderTime};

use uuid::Uuid;

/// Unique identifier for a user profile.
pub type UserId = Uuid;
/// Unique identifier for a medication.
pub type MedicationId = Uuid;
/// Unique identifier for a medication reminder.
pub type ReminderId = Uuid;
/// Unique identifier for a health log entry.
pub type HealthLogId = Uuid;
/// Unique identifier for a dose-taken log entry.
pub type MedicationLogId = Uuid;
/// Unique identifier for a stored insight.
pub type InsightId = Uuid;
/// Unique identifier for a known drug interaction.
pub type InteractionId = Uuid;
