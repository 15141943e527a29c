//! Persisted per-community settings.
//!
//! Stored as a JSON array of `{ community_id, autoplay_mode }` records. Loaded at
//! startup, written whenever a community changes its autoplay mode and again at
//! shutdown.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;

use jukebox_types::CommunitySettings;

use crate::events::{EventBus, HubEvent};
use crate::session_manager::PlaybackSessionManager;

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records. A missing file yields no records.
    pub fn load(&self) -> Result<Vec<CommunitySettings>> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no settings file; starting with defaults");
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read settings {:?}", self.path))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<CommunitySettings> = serde_json::from_str(&raw)
            .with_context(|| format!("parse settings {:?}", self.path))?;
        tracing::info!(path = %self.path.display(), count = records.len(), "loaded community settings");
        Ok(records)
    }

    /// Replace the file contents with `records`.
    pub fn save(&self, records: &[CommunitySettings]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings dir {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(records).context("serialize settings")?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("write settings {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace settings {:?}", self.path))?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "saved community settings");
        Ok(())
    }

    /// Snapshot the manager's settings and write them.
    pub async fn save_snapshot(&self, sessions: &PlaybackSessionManager) -> Result<()> {
        let records = sessions.settings_snapshot().await;
        self.save(&records)
    }
}

/// Save settings after every autoplay change until the bus closes.
pub fn spawn_settings_persister(
    store: Arc<SettingsStore>,
    sessions: Arc<PlaybackSessionManager>,
    events: &EventBus,
) -> tokio::task::JoinHandle<()> {
    let mut receiver = events.subscribe();
    tokio::spawn(async move {
        loop {
            let changed = match receiver.recv().await {
                Ok(HubEvent::AutoplayChanged { community, mode }) => {
                    tracing::debug!(community = %community, mode = %mode, "persisting autoplay change");
                    true
                }
                Ok(_) => false,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "settings persister lagged; saving snapshot");
                    true
                }
                Err(RecvError::Closed) => break,
            };
            if changed {
                if let Err(err) = store.save_snapshot(&sessions).await {
                    tracing::warn!(error = %err, "failed to save community settings");
                }
            }
        }
    })
}
