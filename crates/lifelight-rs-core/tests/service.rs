//! `LifeLight` facade wiring: scheduler lifecycle and published alerts.

use lifelight_rs_config::{LifeLightConfig, SchedulerConfig};
use lifelight_rs_core::records::{
    InteractionSeverity, NewDrugInteraction, NewMedication, NewReminder, NewUser,
};
use lifelight_rs_core::{LifeLight, LifeLightError, StoreError};
use lifelight_rs_protocol::{ReminderTime, UserId};
use lifelight_rs_test_utils::ManualClock;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

fn launch(config: &LifeLightConfig) -> (LifeLight, UserId) {
    let clock = Arc::new(ManualClock::at(2024, 1, 1, 8, 2));
    let app = LifeLight::in_memory(config, clock);
    let user = app
        .store()
        .create_user(NewUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            ..NewUser::default()
        })
        .expect("user");
    (app, user.id)
}

fn medication(app: &LifeLight, user_id: UserId, name: &str) -> Uuid {
    app.store()
        .add_medication(NewMedication {
            user_id,
            name: name.to_string(),
            dosage: "75mg".to_string(),
            frequency: "daily".to_string(),
            ..NewMedication::default()
        })
        .expect("medication")
        .id
}

#[tokio::test]
async fn scheduler_publishes_due_reminders_to_subscribers() {
    let (app, user_id) = launch(&LifeLightConfig::default());
    let medication_id = medication(&app, user_id, "Aspirin");
    let time = ReminderTime::new(8, 0).expect("time");
    app.store()
        .add_reminder(NewReminder::daily(user_id, medication_id, time))
        .expect("reminder");
    let mut events = app.subscribe();

    assert_eq!(app.start_scheduler(user_id).expect("start"), true);
    assert_eq!(app.start_scheduler(user_id).expect("start"), false);

    let event = timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("reminder within timeout")
        .expect("event");
    assert_eq!(event.body, "Time to take Aspirin (75mg)");
    assert_eq!(event.data.medication_id, Some(medication_id));
    app.shutdown().await;
}

#[tokio::test]
async fn scheduler_start_honors_config_and_known_users() {
    let disabled = LifeLightConfig::builder()
        .scheduler(SchedulerConfig {
            enabled: false,
            ..SchedulerConfig::default()
        })
        .build();
    let (app, user_id) = launch(&disabled);
    assert_eq!(app.start_scheduler(user_id).expect("start"), false);

    let (app, _) = launch(&LifeLightConfig::default());
    let err = app.start_scheduler(Uuid::new_v4()).unwrap_err();
    assert!(matches!(
        err,
        LifeLightError::Store(StoreError::NotFound { .. })
    ));
    app.shutdown().await;
}

#[tokio::test]
async fn interaction_alerts_cover_generic_names() {
    let (app, user_id) = launch(&LifeLightConfig::default());
    app.store()
        .add_drug_interaction(NewDrugInteraction {
            medication1: "Warfarin".to_string(),
            medication2: "acetylsalicylic acid".to_string(),
            severity: InteractionSeverity::Severe,
            description: "Raises bleeding risk".to_string(),
            recommendation: None,
            source: None,
        })
        .expect("interaction");
    medication(&app, user_id, "Warfarin");
    app.store()
        .add_medication(NewMedication {
            user_id,
            name: "Aspirin".to_string(),
            generic_name: Some("Acetylsalicylic Acid".to_string()),
            dosage: "81mg".to_string(),
            frequency: "daily".to_string(),
            ..NewMedication::default()
        })
        .expect("medication");
    let mut events = app.subscribe();

    let found = app.alert_interactions(user_id);
    assert_eq!(found.len(), 1);
    let event = events.recv().await.expect("alert");
    assert_eq!(event.tag, "interaction-acetylsalicylic acid-warfarin");
    assert_eq!(event.data.action, "/ai-insights");
}

#[tokio::test]
async fn badge_announcements_only_cover_fresh_unlocks() {
    let (app, user_id) = launch(&LifeLightConfig::default());
    let before = app.analytics().badge_progress(user_id);
    medication(&app, user_id, "Metformin");
    let mut events = app.subscribe();

    let current = app.announce_badges(user_id, &before);
    let event = events.recv().await.expect("badge");
    assert_eq!(event.tag, "achievement-first-medication");

    app.announce_badges(user_id, &current);
    assert!(events.try_recv().is_err());
}
