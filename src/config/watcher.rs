//! Hot reload of the configuration file.
//!
//! The parent directory is watched rather than the file itself: editors and
//! config-management tools replace files by rename, which drops a watch
//! placed on the old inode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{apply_env_overrides, load_config, ConfigError};
use crate::config::schema::AppConfig;

pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<AppConfig>,
}

/// Re-read `path` with environment overrides applied.
pub fn reload(path: &Path) -> Result<AppConfig, ConfigError> {
    load_config(path).and_then(|c| apply_env_overrides(c, |key| std::env::var(key).ok()))
}

fn touches(event: &Event, path: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == path.file_name())
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver of validated configurations.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                updates,
            },
            rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, updates } = self;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let target = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, &target) => match reload(&target) {
                    Ok(config) => {
                        tracing::info!(path = ?target, "Configuration file changed");
                        let _ = updates.send(config);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected configuration change; keeping current settings")
                    }
                },
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Configuration watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Watching configuration file");
        Ok(watcher)
    }
}
