//! Hot reload of the logging policy.
//!
//! Only `[logging]` is reloadable. A changed file is loaded and validated in
//! full; an invalid file leaves the running policy untouched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::load_config;
use crate::policy::PolicyHandle;

/// What a reload attempt did to the running policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A different policy was swapped in.
    Applied,
    /// The file loaded but its policy matches the running one.
    Unchanged,
    /// The file failed to load or validate.
    Rejected,
}

/// Load `path` and swap its logging policy into `policy` if it changed.
pub fn reload_policy(path: &Path, policy: &PolicyHandle) -> ReloadOutcome {
    let config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to reload config, keeping current logging policy"
            );
            return ReloadOutcome::Rejected;
        }
    };

    if *policy.load() == config.logging {
        tracing::debug!(path = %path.display(), "Logging policy unchanged");
        return ReloadOutcome::Unchanged;
    }

    tracing::info!(
        log_request_body = config.logging.log_request_body,
        log_response_body = config.logging.log_response_body,
        body_size_limit = config.logging.body_size_limit,
        "Logging policy reloaded"
    );
    policy.replace(config.logging);
    ReloadOutcome::Applied
}

/// Watches a configuration file and keeps a [`PolicyHandle`] in sync with it.
pub struct PolicyWatcher {
    path: PathBuf,
    policy: PolicyHandle,
}

impl PolicyWatcher {
    pub fn new(path: &Path, policy: PolicyHandle) -> Self {
        Self {
            path: path.to_path_buf(),
            policy,
        }
    }

    /// Start watching in a background thread.
    ///
    /// Reloads stop when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, policy } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    reload_policy(&path, &policy);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %watched.display(), "Config watcher started");
        Ok(watcher)
    }
}
