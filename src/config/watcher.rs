//! Hot reload of the configuration file.
//!
//! Editors fire several modify events per save; a reload is forwarded only
//! when the parsed config differs from the last one sent. Invalid files are
//! logged and skipped so the running settings stay in place.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::ServerConfig;

/// Watches one config file and streams each distinct valid version.
pub struct ConfigWatcher {
    path: PathBuf,
    last_sent: Arc<Mutex<Option<ServerConfig>>>,
    update_tx: mpsc::UnboundedSender<ServerConfig>,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ServerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            last_sent: Arc::new(Mutex::new(None)),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Seed the comparison baseline with the config already in use.
    pub fn with_current(self, config: ServerConfig) -> Self {
        if let Ok(mut last) = self.last_sent.lock() {
            *last = Some(config);
        }
        self
    }

    /// Start watching. Dropping the returned handle stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let reloader = Reloader {
            path: self.path.clone(),
            last_sent: self.last_sent.clone(),
            update_tx: self.update_tx.clone(),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_content_change(&event.kind) => {
                    tracing::debug!(path = ?reloader.path, kind = ?event.kind, "Config file event");
                    reloader.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    kind.is_modify() || kind.is_create()
}

struct Reloader {
    path: PathBuf,
    last_sent: Arc<Mutex<Option<ServerConfig>>>,
    update_tx: mpsc::UnboundedSender<ServerConfig>,
}

/// What one reload attempt did.
#[derive(Debug, PartialEq)]
enum ReloadOutcome {
    Sent,
    Unchanged,
    Rejected,
}

impl Reloader {
    fn reload(&self) -> ReloadOutcome {
        match load_config(&self.path) {
            Ok(config) => self.offer(config),
            Err(e) => {
                log_rejected(&self.path, &e);
                ReloadOutcome::Rejected
            }
        }
    }

    fn offer(&self, config: ServerConfig) -> ReloadOutcome {
        let Ok(mut last) = self.last_sent.lock() else {
            return ReloadOutcome::Rejected;
        };
        if last.as_ref() == Some(&config) {
            return ReloadOutcome::Unchanged;
        }
        tracing::info!(path = ?self.path, "Config file changed, applying");
        if self.update_tx.send(config.clone()).is_err() {
            tracing::warn!("Config update receiver dropped");
            return ReloadOutcome::Rejected;
        }
        *last = Some(config);
        ReloadOutcome::Sent
    }
}

fn log_rejected(path: &Path, e: &ConfigError) {
    tracing::error!(
        path = ?path,
        error = %e,
        "Failed to reload config, keeping current configuration"
    );
}
