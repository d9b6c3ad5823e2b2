use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::pipelines::markers::preview;
use crate::state::app::AppState;

/// A raw model reply held in the verdict cache. The judge re-parses the
/// reply on every hit, so only the text and its age are stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CachedVerdict {
    pub raw: String,
    pub cached_at: i64,
}

/// Generate a hash key from model name and prompt
fn verdict_key(model: &str, prompt: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    prompt.hash(&mut hasher);
    hasher.finish()
}

/// Check the verdict cache and return the raw reply if present
pub fn get_cached_verdict(state: &AppState, model: &str, prompt: &str) -> Option<String> {
    let key = verdict_key(model, prompt);
    let cache = state.verdict_cache.read();

    if let Some(cached) = cache.peek(&key) {
        let age_secs = chrono::Utc::now().timestamp() - cached.cached_at;
        tracing::debug!(
            model = model,
            prompt_preview = %preview(prompt, 50),
            age_secs = age_secs,
            "Verdict cache hit"
        );
        state.metrics.record_cache_hit();
        return Some(cached.raw.clone());
    }

    tracing::debug!(
        model = model,
        prompt_preview = %preview(prompt, 50),
        "Verdict cache miss"
    );
    state.metrics.record_cache_miss();
    None
}

/// Store a raw model reply in the verdict cache
pub fn store_verdict(state: &AppState, model: &str, prompt: &str, raw: &str) {
    let key = verdict_key(model, prompt);
    let cached = CachedVerdict {
        raw: raw.to_string(),
        cached_at: chrono::Utc::now().timestamp(),
    };

    let mut cache = state.verdict_cache.write();
    cache.put(key, cached);
}
