use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;

use crate::cache::CachedVerdict;
use crate::config::settings::get_settings;
use crate::error::CoachError;
use crate::history::{HistoryEntry, HistoryLog};
use crate::metrics::Metrics;
use crate::pipelines::chat::ChatMessage;
use crate::pipelines::gemini::{GeminiClient, TextGenerator};
use crate::pipelines::judge::VerdictVocabulary;
use crate::problems::problem::Problem;
use crate::state::session::GuidanceSession;

/// One loaded problem and everything scoped to it: the optional guidance
/// session and whether guidance was ever used. Replaced wholesale on
/// every load; a new load never partially mutates the old episode.
#[derive(Debug, Clone)]
pub struct Episode {
    /// Identity of this episode. Calls in flight carry the id they were
    /// started under, and their results are dropped when it no longer
    /// matches.
    pub id: u64,
    pub problem: Problem,
    pub guidance: Option<GuidanceSession>,
    pub guidance_used: bool,
}

/// Application-wide state container.
/// All mutable state is centralized here and passed explicitly to functions.
/// This eliminates global mutable state and lock-ordering hazards.
#[derive(Clone)]
pub struct AppState {
    /// The active episode, when a problem is loaded
    pub episode: Arc<RwLock<Option<Episode>>>,
    /// Monotonic source of episode identities
    pub episode_seq: Arc<AtomicU64>,
    /// Attempt history ring buffer
    pub history: Arc<RwLock<HistoryLog>>,
    /// Chat transcript with the assistant
    pub chat: Arc<RwLock<Vec<ChatMessage>>>,
    /// Verdict cache (LRU with bounded size)
    pub verdict_cache: Arc<RwLock<LruCache<u64, CachedVerdict>>>,
    /// The model gateway; swapped for a scripted one in tests
    pub generator: Arc<dyn TextGenerator>,
    /// Words the grading prompt and parser agree on
    pub verdict_vocabulary: Arc<VerdictVocabulary>,
    pub metrics: Metrics,
}

impl AppState {
    /// Create a new AppState backed by the configured Gemini client
    pub fn new() -> Self {
        Self::with_generator(Arc::new(GeminiClient::from_settings(get_settings())))
    }

    /// Create a new AppState with a caller-supplied generator
    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        AppState {
            episode: Arc::new(RwLock::new(None)),
            episode_seq: Arc::new(AtomicU64::new(0)),
            history: Arc::new(RwLock::new(HistoryLog::new())),
            chat: Arc::new(RwLock::new(Vec::new())),
            verdict_cache: Arc::new(RwLock::new(
                LruCache::new(NonZeroUsize::new(200).expect("200 > 0")),
            )),
            generator,
            verdict_vocabulary: Arc::new(VerdictVocabulary::default()),
            metrics: Metrics::new(),
        }
    }

    /// Replace the grading vocabulary
    pub fn with_vocabulary(mut self, vocabulary: VerdictVocabulary) -> Self {
        self.verdict_vocabulary = Arc::new(vocabulary);
        self
    }

    /// Start a fresh episode around a problem, abandoning any guidance
    /// session the previous episode still had. Returns the new episode id.
    pub fn begin_episode(&self, problem: Problem) -> u64 {
        let mut episode = self.episode.write();
        let id = self.episode_seq.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(old) = episode.as_mut() {
            if let Some(session) = old.guidance.as_mut() {
                session.abandon();
            }
        }
        tracing::info!(episode_id = id, problem_id = %problem.id, "Episode started");
        *episode = Some(Episode {
            id,
            problem,
            guidance: None,
            guidance_used: false,
        });
        self.metrics.record_episode_started();
        id
    }

    /// Like [`begin_episode`], but only if `expected_id` is still the live
    /// episode. Used when the replacement problem was produced by a model
    /// call that raced against navigation.
    ///
    /// [`begin_episode`]: AppState::begin_episode
    pub fn begin_episode_after(&self, expected_id: u64, problem: Problem) -> Result<u64, CoachError> {
        let mut episode = self.episode.write();
        match episode.as_mut() {
            Some(old) if old.id == expected_id => {
                if let Some(session) = old.guidance.as_mut() {
                    session.abandon();
                }
                let id = self.episode_seq.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::info!(episode_id = id, problem_id = %problem.id, "Episode started");
                *episode = Some(Episode {
                    id,
                    problem,
                    guidance: None,
                    guidance_used: false,
                });
                self.metrics.record_episode_started();
                Ok(id)
            }
            _ => Err(CoachError::Stale),
        }
    }

    pub fn current_episode_id(&self) -> Option<u64> {
        self.episode.read().as_ref().map(|episode| episode.id)
    }

    /// The loaded problem together with the episode id it belongs to
    pub fn current_problem(&self) -> Option<(u64, Problem)> {
        self.episode
            .read()
            .as_ref()
            .map(|episode| (episode.id, episode.problem.clone()))
    }

    /// Run a mutation against the active episode, but only if it is still
    /// the episode the caller started from. Anything else means the result
    /// arrived late for a discarded episode and must not touch state.
    ///
    /// Mutations `f` applied before it returns an error do persist; the
    /// freshness check happens once, on entry.
    pub fn with_episode_mut<T, F>(&self, expected_id: u64, f: F) -> Result<T, CoachError>
    where
        F: FnOnce(&mut Episode) -> Result<T, CoachError>,
    {
        let mut guard = self.episode.write();
        match guard.as_mut() {
            Some(episode) if episode.id == expected_id => f(episode),
            _ => Err(CoachError::Stale),
        }
    }

    /// Snapshot of the active guidance session, if any
    pub fn guidance_snapshot(&self) -> Option<GuidanceSession> {
        self.episode
            .read()
            .as_ref()
            .and_then(|episode| episode.guidance.clone())
    }

    pub fn append_history(&self, entry: HistoryEntry) {
        self.history.write().append(entry);
    }

    pub fn history_snapshot(&self) -> Vec<HistoryEntry> {
        self.history.read().snapshot()
    }

    pub fn chat_snapshot(&self) -> Vec<ChatMessage> {
        self.chat.read().clone()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
