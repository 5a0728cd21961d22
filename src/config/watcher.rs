//! File watching for hot config reloading.
//!
//! The watcher monitors the configuration directory (editors often replace files rather
//! than write them in place) and sends [`Event::Reload`] when `autolight.toml` changes.

use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use super::loading::CONFIG_FILE_NAME;
use crate::common::utils::private_path;
use crate::io::events::Event;

/// Debounce duration for file change events, in milliseconds.
const DEBOUNCE_MS: u64 = 500;

/// Whether a filesystem event path refers to the watched configuration file.
///
/// Matches the file itself and editor temp files derived from its name.
pub fn affects_config(event_path: &Path, config_path: &Path) -> bool {
    if event_path == config_path {
        return true;
    }
    if event_path.parent() != config_path.parent() {
        return false;
    }
    event_path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.starts_with(CONFIG_FILE_NAME) || name.ends_with(CONFIG_FILE_NAME)
        })
}

/// Start watching `config_path` and send reloads over `sender`.
pub fn start_config_watcher(
    config_path: PathBuf,
    sender: Sender<Event>,
    debug_enabled: bool,
) -> Result<()> {
    let Some(config_dir) = config_path.parent().map(Path::to_path_buf) else {
        return Ok(());
    };
    if !config_dir.is_dir() {
        if debug_enabled {
            log_pipe!();
            log_debug!("No configuration directory to watch for hot reload");
        }
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res
                && matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                )
            {
                let _ = tx.send(event);
            }
        },
        NotifyConfig::default(),
    )
    .context("Failed to create file watcher")?;

    watcher
        .watch(&config_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch directory: {}", config_dir.display()))?;

    if debug_enabled {
        log_pipe!();
        log_debug!("Watching for configuration changes:");
        log_indented!("{}", private_path(&config_path));
    }

    thread::spawn(move || {
        // The watcher stops when dropped
        let _watcher = watcher;
        let mut last_reload: Option<Instant> = None;

        for event in rx {
            if !event
                .paths
                .iter()
                .any(|path| affects_config(path, &config_path))
            {
                continue;
            }

            if last_reload.is_some_and(|at| at.elapsed() < Duration::from_millis(DEBOUNCE_MS)) {
                continue;
            }

            if debug_enabled {
                log_pipe!();
                log_info!("Configuration file change detected");
            }
            if sender.send(Event::Reload).is_err() {
                break;
            }
            last_reload = Some(Instant::now());
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affects_config_matches_file_and_temp_files() {
        let config = Path::new("/home/user/.config/autolight/autolight.toml");
        assert!(affects_config(config, config));
        assert!(affects_config(
            Path::new("/home/user/.config/autolight/autolight.toml~"),
            config
        ));
        assert!(affects_config(
            Path::new("/home/user/.config/autolight/.autolight.toml"),
            config
        ));
        assert!(!affects_config(
            Path::new("/home/user/.config/autolight/notes.txt"),
            config
        ));
        assert!(!affects_config(
            Path::new("/tmp/autolight.toml"),
            config
        ));
    }
}
