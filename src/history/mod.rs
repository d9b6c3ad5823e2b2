use std::collections::VecDeque;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoachError;
use crate::pipelines::judge::Verdict;
use crate::pipelines::markers::preview;

pub mod export;

/// Most-recent attempts kept; anything older is evicted.
pub const HISTORY_CAPACITY: usize = 50;

/// How an attempt ended. Image uploads are logged without a verdict,
/// since nothing grades them here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptStatus {
    Correct,
    CorrectWithGuidance,
    Incorrect,
    IncorrectWithGuidance,
    ImageUploaded,
}

impl AttemptStatus {
    pub fn from_verdict(verdict: Verdict, used_guidance: bool) -> Self {
        match (verdict, used_guidance) {
            (Verdict::Correct, false) => AttemptStatus::Correct,
            (Verdict::Correct, true) => AttemptStatus::CorrectWithGuidance,
            (Verdict::Incorrect, false) => AttemptStatus::Incorrect,
            (Verdict::Incorrect, true) => AttemptStatus::IncorrectWithGuidance,
        }
    }

    pub fn used_guidance(self) -> bool {
        matches!(
            self,
            AttemptStatus::CorrectWithGuidance | AttemptStatus::IncorrectWithGuidance
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Correct => "correct",
            AttemptStatus::CorrectWithGuidance => "correct-with-guidance",
            AttemptStatus::Incorrect => "incorrect",
            AttemptStatus::IncorrectWithGuidance => "incorrect-with-guidance",
            AttemptStatus::ImageUploaded => "image-uploaded",
        }
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unix seconds, UTC. Formatted for display only at export time.
    pub timestamp: i64,
    pub problem_id: String,
    /// Question text cut to its first 100 characters.
    pub question: String,
    pub status: AttemptStatus,
    /// Typed answer cut to its first 100 characters; empty for image
    /// uploads.
    pub typed_answer: String,
}

impl HistoryEntry {
    pub fn new(problem_id: &str, question: &str, status: AttemptStatus, typed_answer: &str) -> Self {
        HistoryEntry {
            timestamp: chrono::Utc::now().timestamp(),
            problem_id: problem_id.to_string(),
            question: preview(question, 100),
            status,
            typed_answer: preview(typed_answer, 100),
        }
    }
}

/// Ring of the most recent attempts, newest first.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        HistoryLog {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Rebuild a log from persisted entries (newest first), dropping
    /// anything past capacity.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        let mut log = HistoryLog::new();
        for entry in entries.into_iter().take(HISTORY_CAPACITY) {
            log.entries.push_back(entry);
        }
        log
    }

    /// Prepend a new entry, evicting the oldest once past capacity.
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        if self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_back();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest-first copy of every entry.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// The `n` most recent entries.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.entries.iter().take(n).cloned().collect()
    }
}

pub fn history_path() -> PathBuf {
    // Use platform-specific app data directory
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support/com.bagrut.coach");
            dir.push("data");
            dir.push("history.json");
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push("com.bagrut.coach");
            dir.push("data");
            dir.push("history.json");
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share/com.bagrut.coach");
            dir.push("data");
            dir.push("history.json");
            return dir;
        }
    }

    // Fallback
    PathBuf::from("data/history.json")
}

/// Save the history log asynchronously. The on-disk format is a plain
/// JSON array, newest entry first.
pub async fn save_log(log: &HistoryLog) -> Result<(), CoachError> {
    let path = history_path();
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let json = serde_json::to_string_pretty(&log.snapshot())?;
    tokio::fs::write(&path, json).await?;
    Ok(())
}

/// Load the history log asynchronously, returning an empty one when the
/// file is missing or unreadable.
pub async fn load_log() -> HistoryLog {
    let path = history_path();
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => match serde_json::from_str::<Vec<HistoryEntry>>(&text) {
            Ok(entries) => HistoryLog::from_entries(entries),
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Failed to parse history file");
                HistoryLog::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => HistoryLog::new(),
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Failed to read history file");
            HistoryLog::new()
        }
    }
}
