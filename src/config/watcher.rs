//! Config file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by rename-over keep triggering reloads. Only events naming the
//! config file count.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;

/// Load `path` and queue it for the server.
///
/// An invalid file is logged and skipped; the running policy stays. Returns
/// `false` once nobody is listening for updates.
pub fn reload(path: &Path, updates: &mpsc::UnboundedSender<GatewayConfig>) -> bool {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(path = ?path, routes = config.routes.len(), "Config reloaded");
            updates.send(config).is_ok()
        }
        Err(e) => {
            tracing::error!(path = ?path, error = %e, "Reload failed, keeping current policy");
            !updates.is_closed()
        }
    }
}

/// Whether a watch event concerns the config file.
fn touches(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|p| p.file_name() == file_name)
}

/// Watches one config file and feeds validated configs into a channel.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of the update channel.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Another sender into the same channel (SIGHUP reloads use it).
    pub fn sender(&self) -> mpsc::UnboundedSender<GatewayConfig> {
        self.update_tx.clone()
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path.file_name().map(|n| n.to_os_string());
        let config_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, file_name.as_deref()) => {
                    reload(&config_path, &update_tx);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    #[test]
    fn test_only_config_file_events_count() {
        let name = std::ffi::OsStr::new("gateway.toml");

        let modified = Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/etc/gw/gateway.toml".into());
        assert!(touches(&modified, Some(name)));

        let created = Event::new(EventKind::Create(CreateKind::File)).add_path("/etc/gw/gateway.toml".into());
        assert!(touches(&created, Some(name)));

        let sibling = Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/etc/gw/other.toml".into());
        assert!(!touches(&sibling, Some(name)));

        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path("/etc/gw/gateway.toml".into());
        assert!(!touches(&removed, Some(name)));
    }

    #[test]
    fn test_reload_skips_invalid_file() {
        let path = std::env::temp_dir().join("edge_gateway_watcher_invalid.toml");
        std::fs::write(&path, "[auth]\nsecret = \"\"\n").unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        assert!(reload(&path, &tx));
        assert!(rx.try_recv().is_err());

        std::fs::write(&path, "[listener]\nbind_address = \"127.0.0.1:7000\"\n").unwrap();
        assert!(reload(&path, &tx));
        assert_eq!(rx.try_recv().unwrap().listener.bind_address, "127.0.0.1:7000");

        drop(rx);
        assert!(!reload(&path, &tx));
        std::fs::remove_file(&path).unwrap_or_default();
    }
}
