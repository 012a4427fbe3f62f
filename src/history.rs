use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const MAX_ENTRIES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub episode_id: String,
    pub title: String,
    pub watched_at: i64,
}

/// Recently opened episodes, newest first, persisted as JSON.
#[derive(Debug, Clone)]
pub struct WatchHistory {
    state_file: Option<PathBuf>,
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
}

impl WatchHistory {
    pub fn new(state_file: PathBuf) -> Self {
        let entries = match fs::read_to_string(&state_file) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!("ignoring unreadable history file: {err}");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        Self {
            state_file: Some(state_file),
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            state_file: None,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Moves `episode_id` to the front, replacing an older entry for it.
    pub fn record(&self, episode_id: &str, title: &str) -> anyhow::Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|e| e.episode_id != episode_id);
            entries.insert(
                0,
                HistoryEntry {
                    episode_id: episode_id.to_string(),
                    title: title.to_string(),
                    watched_at: Utc::now().timestamp(),
                },
            );
            entries.truncate(MAX_ENTRIES);
        }
        self.save_to_disk()
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        self.save_to_disk()
    }

    fn save_to_disk(&self) -> anyhow::Result<()> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create config dir")?;
        }
        let json = serde_json::to_string_pretty(&self.entries()).context("serialize history")?;
        fs::write(path, json).context("write history")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first_without_duplicates() {
        let history = WatchHistory::in_memory();
        history.record("ep-1", "Episode 1").unwrap();
        history.record("ep-2", "Episode 2").unwrap();
        history.record("ep-1", "Episode 1").unwrap();

        let ids: Vec<_> = history.entries().into_iter().map(|e| e.episode_id).collect();
        assert_eq!(ids, vec!["ep-1", "ep-2"]);
    }

    #[test]
    fn capped_at_max_entries() {
        let history = WatchHistory::in_memory();
        for i in 0..(MAX_ENTRIES + 5) {
            history.record(&format!("ep-{i}"), "x").unwrap();
        }
        let entries = history.entries();
        assert_eq!(entries.len(), MAX_ENTRIES);
        assert_eq!(entries[0].episode_id, format!("ep-{}", MAX_ENTRIES + 4));
    }

    #[test]
    fn persists_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let history = WatchHistory::new(path.clone());
        history.record("ep-9", "Finale").unwrap();
        assert_eq!(WatchHistory::new(path.clone()).entries()[0].title, "Finale");

        history.clear().unwrap();
        assert!(WatchHistory::new(path).entries().is_empty());
    }
}
