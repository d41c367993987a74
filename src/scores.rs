//! Best result per level
//!
//! Persisted as a JSON file keyed by level name.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::sim::LevelScoreData;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ScoreBook {
    pub entries: BTreeMap<String, LevelScoreData>,
}

impl ScoreBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score would beat the stored best for `level`
    pub fn qualifies(&self, level: &str, score: &LevelScoreData) -> bool {
        self.entries
            .get(level)
            .map(|best| score.score > best.score)
            .unwrap_or(true)
    }

    /// Store `score` if it is a new best. Returns whether it was.
    pub fn record(&mut self, level: &str, score: &LevelScoreData) -> bool {
        if !self.qualifies(level, score) {
            return false;
        }
        log::info!("New best for '{}': {}", level, score.score);
        self.entries.insert(level.to_string(), score.clone());
        true
    }

    pub fn best(&self, level: &str) -> Option<&LevelScoreData> {
        self.entries.get(level)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load from `path`. A missing or unreadable file starts a fresh book.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Ok(json) = std::fs::read_to_string(path) {
            match serde_json::from_str::<ScoreBook>(&json) {
                Ok(book) => {
                    log::info!("Loaded {} level scores", book.entries.len());
                    return book;
                }
                Err(e) => log::warn!("Ignoring corrupt score file {}: {}", path.display(), e),
            }
        }

        log::info!("No scores found, starting fresh");
        Self::new()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScoreError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ScoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Scores saved ({} levels)", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(value: u32) -> LevelScoreData {
        LevelScoreData {
            treasures_collected: 0,
            treasures_in_level: 0,
            balls_left: 0,
            time_spent: 10,
            par_time: 60,
            score: value,
        }
    }

    #[test]
    fn test_record_keeps_best() {
        let mut book = ScoreBook::new();
        assert!(book.record("one", &score(442)));
        assert!(!book.record("one", &score(300)));
        assert!(!book.record("one", &score(442)));
        assert!(book.record("one", &score(942)));
        assert!(book.record("two", &score(42)));
        assert_eq!(book.best("one").map(|s| s.score), Some(942));
        assert_eq!(book.best("three"), None);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("bounce-scores-{}.json", std::process::id()));
        let mut book = ScoreBook::new();
        book.record("level", &score(500));
        book.save(&path).unwrap();
        let loaded = ScoreBook::load(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, book);
    }

    #[test]
    fn test_load_missing_or_corrupt() {
        let dir = std::env::temp_dir();
        assert!(ScoreBook::load(dir.join("bounce-scores-does-not-exist.json")).is_empty());

        let path = dir.join(format!("bounce-scores-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ nope").unwrap();
        let loaded = ScoreBook::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(loaded.is_empty());
    }
}
