//! Public surface for LifeLight hosts.
//!
//! Re-exports the core building blocks and the helpers the `lifelight`
//! binary uses to load config and pick the profile to act on.

/// Re-export for convenience.
pub use lifelight_rs_config as config;
pub use lifelight_rs_core as core;
/// Re-export for convenience.
pub use lifelight_rs_protocol as protocol;

use anyhow::{Context, bail};
use lifelight_rs_config::{LayeredConfigOptions, LifeLightConfig};
use lifelight_rs_core::RecordStore;
use lifelight_rs_protocol::UserId;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Install the `env_logger` backend, honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}

/// Default layer locations for `cwd`, with `overrides` applied last.
pub fn config_options(cwd: &Path, overrides: &[PathBuf]) -> LayeredConfigOptions {
    overrides
        .iter()
        .fold(LayeredConfigOptions::new(cwd), |options, path| {
            options.with_runtime_path(path)
        })
}

/// Load the layered config, with an optional journal path taking
/// precedence over every layer.
pub fn load_config(
    options: LayeredConfigOptions,
    store_path: Option<&Path>,
) -> anyhow::Result<LifeLightConfig> {
    let layered = LifeLightConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    let mut config = layered.config;
    if let Some(path) = store_path {
        info!("store path overridden (path={})", path.display());
        config.store.path = Some(path.to_string_lossy().into_owned());
    }
    Ok(config)
}

/// Pick the user a command acts on; without an explicit id the store must
/// hold exactly one profile.
pub fn resolve_user(store: &RecordStore, requested: Option<UserId>) -> anyhow::Result<UserId> {
    if let Some(user_id) = requested {
        store
            .get_user(user_id)
            .with_context(|| format!("unknown user {user_id}"))?;
        return Ok(user_id);
    }
    let users = store.list_users();
    match users.as_slice() {
        [only] => Ok(only.id),
        [] => bail!("the store holds no users"),
        _ => bail!(
            "the store holds {} users; pick one with --user",
            users.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{LayeredConfigOptions, config_options, load_config, resolve_user};
    use lifelight_rs_core::RecordStore;
    use lifelight_rs_core::records::NewUser;
    use lifelight_rs_test_utils::ManualClock;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn user(store: &RecordStore, email: &str) -> Uuid {
        store
            .create_user(NewUser {
                name: "Ada".to_string(),
                email: email.to_string(),
                ..NewUser::default()
            })
            .expect("user")
            .id
    }

    #[test]
    fn user_is_inferred_only_when_unambiguous() {
        let store = RecordStore::in_memory(Arc::new(ManualClock::at(2024, 1, 1, 9, 0)));
        assert!(resolve_user(&store, None).is_err());

        let first = user(&store, "ada@example.com");
        assert_eq!(resolve_user(&store, None).expect("single user"), first);

        let second = user(&store, "grace@example.com");
        assert!(resolve_user(&store, None).is_err());
        assert_eq!(resolve_user(&store, Some(second)).expect("explicit"), second);
        assert!(resolve_user(&store, Some(Uuid::new_v4())).is_err());
    }

    #[test]
    fn store_flag_wins_over_config_layers() {
        let temp = tempdir().expect("tempdir");
        let runtime = temp.path().join("runtime.json5");
        fs::write(
            &runtime,
            "{ store: { path: \"from-layer.jsonl\" }, scheduler: { tick_interval_secs: 5 } }",
        )
        .expect("write");

        let options = LayeredConfigOptions {
            system_config_path: None,
            user_config_path: None,
            ..config_options(temp.path(), &[runtime])
        };

        let layered = load_config(options.clone(), None).expect("config");
        assert_eq!(layered.store.path.as_deref(), Some("from-layer.jsonl"));
        assert_eq!(layered.scheduler.tick_interval_secs, 5);

        let flag = Path::new("from-flag.jsonl");
        let overridden = load_config(options, Some(flag)).expect("config");
        assert_eq!(overridden.store.path.as_deref(), Some("from-flag.jsonl"));
    }
}
