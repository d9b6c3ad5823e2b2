//! Shell-facing operations.
//!
//! Each function here is one user action: loading a problem, checking an
//! answer, walking the step-by-step guidance, and so on. The shell owns
//! the rendering; this layer owns sequencing, episode freshness checks,
//! and history bookkeeping. Every fallible operation returns a typed
//! [`CoachError`] so the presentation layer is the only place a failure
//! is turned into a user-visible message.

use serde::Serialize;

use crate::error::CoachError;
use crate::history::{self, export, AttemptStatus, HistoryEntry, HistoryLog};
use crate::pipelines::advice;
use crate::pipelines::chat::{self, ChatMessage};
use crate::pipelines::guidance;
use crate::pipelines::judge::{self, Verdict};
use crate::pipelines::markers::{classify_step_response, preview, StepSignal};
use crate::pipelines::modify::{fetch_modified_problem, ModificationKind};
use crate::problems::bank::{bank, year_display_name};
use crate::problems::problem::Problem;
use crate::state::app::AppState;
use crate::state::session::{GuidanceSession, StepTransition};

/// A problem handed to the shell together with the episode that now owns it.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedProblem {
    pub episode_id: u64,
    pub problem: Problem,
}

/// Outcome of a typed-answer check.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnswerFeedback {
    pub verdict: Verdict,
    pub status: AttemptStatus,
}

/// A selectable year entry, with the decorated Hebrew display label.
#[derive(Debug, Clone, Serialize)]
pub struct YearOption {
    pub key: String,
    pub label: String,
}

pub fn list_modules() -> Vec<String> {
    bank().module_keys()
}

pub fn list_years(module: &str) -> Vec<YearOption> {
    bank()
        .year_keys(module)
        .into_iter()
        .map(|key| {
            let label = year_display_name(&key);
            YearOption { key, label }
        })
        .collect()
}

pub fn question_count(module: &str, year: &str) -> usize {
    bank().question_count(module, year)
}

/// Look up a problem and start a fresh episode around it. Any guidance
/// session from the previous episode is abandoned in the same breath.
pub fn load_problem(
    state: &AppState,
    module: &str,
    year: &str,
    one_based_index: usize,
) -> Result<LoadedProblem, CoachError> {
    let problem = bank().get(module, year, one_based_index)?.clone();
    let episode_id = state.begin_episode(problem.clone());
    Ok(LoadedProblem { episode_id, problem })
}

/// Ask the model for a simplified or harder variant of the loaded problem
/// and swap it in as a new episode. If the student navigated away while
/// the model was thinking, the variant is discarded.
pub async fn modify_problem(
    state: &AppState,
    kind: ModificationKind,
) -> Result<LoadedProblem, CoachError> {
    let (episode_id, problem) = state
        .current_problem()
        .ok_or_else(|| CoachError::validation("no problem is loaded"))?;

    let modified = fetch_modified_problem(state, &problem, kind).await?;

    let new_episode_id = state.begin_episode_after(episode_id, modified.clone())?;
    Ok(LoadedProblem {
        episode_id: new_episode_id,
        problem: modified,
    })
}

/// Judge a typed answer against the loaded problem and record the attempt.
///
/// The history entry carries the guidance flag of the episode, so an
/// answer checked after a step-by-step walkthrough is recorded as a
/// guided attempt. A verdict that arrives after the episode changed is
/// dropped without touching history.
pub async fn check_answer(state: &AppState, submission: &str) -> Result<AnswerFeedback, CoachError> {
    let trimmed = submission.trim();
    if trimmed.is_empty() {
        return Err(CoachError::validation("empty answer submission"));
    }
    let (episode_id, problem) = state
        .current_problem()
        .ok_or_else(|| CoachError::validation("no problem is loaded"))?;

    let verdict = judge::evaluate(state, &problem, trimmed).await?;

    let status = state.with_episode_mut(episode_id, |episode| {
        Ok(AttemptStatus::from_verdict(verdict, episode.guidance_used))
    })?;

    state.append_history(HistoryEntry::new(&problem.id, &problem.question, status, trimmed));
    persist_history(state).await;

    Ok(AnswerFeedback { verdict, status })
}

/// Record that the student answered by uploading an image instead of text.
/// The image itself never reaches this layer; only the fact is logged.
pub async fn record_image_upload(state: &AppState) -> Result<(), CoachError> {
    let (_, problem) = state
        .current_problem()
        .ok_or_else(|| CoachError::validation("no problem is loaded"))?;

    state.append_history(HistoryEntry::new(
        &problem.id,
        &problem.question,
        AttemptStatus::ImageUploaded,
        "הועלתה תמונה דרך כפתור הבדיקה",
    ));
    persist_history(state).await;
    Ok(())
}

/// Start step-by-step guidance for the loaded problem. The first step is
/// the model's entire reply; the session is installed only once that
/// reply has arrived and passed the non-empty check.
pub async fn begin_guidance(state: &AppState) -> Result<GuidanceSession, CoachError> {
    let (episode_id, problem) = state
        .current_problem()
        .ok_or_else(|| CoachError::validation("no problem is loaded"))?;
    if state
        .guidance_snapshot()
        .map(|session| session.is_active())
        .unwrap_or(false)
    {
        return Err(CoachError::validation("a guidance session is already running"));
    }

    let first_step = guidance::fetch_first_step(state, &problem).await?;

    let session = state.with_episode_mut(episode_id, |episode| {
        let mut session = GuidanceSession::new(episode.problem.id.clone());
        session.begin(first_step)?;
        episode.guidance = Some(session.clone());
        episode.guidance_used = true;
        Ok(session)
    })?;
    state.metrics.record_state_transition();
    Ok(session)
}

/// Feed a student sub-answer through the step evaluator and apply the
/// transition it signals.
///
/// The exchange is appended to the session log before the reply is
/// classified, so a reply with no recognizable marker keeps the exchange
/// but changes no other session field. A transport failure appends
/// nothing at all.
pub async fn submit_step_answer(
    state: &AppState,
    answer: &str,
) -> Result<StepTransition, CoachError> {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return Err(CoachError::validation("empty step answer"));
    }
    let (episode_id, problem) = state
        .current_problem()
        .ok_or_else(|| CoachError::validation("no problem is loaded"))?;
    let session = state
        .guidance_snapshot()
        .ok_or_else(|| CoachError::validation("no guidance session is running"))?;
    if !session.is_active() {
        return Err(CoachError::validation(
            "guidance session is not awaiting a step answer",
        ));
    }

    let reply = guidance::evaluate_step(state, &problem, &session, trimmed).await?;
    let signal = classify_step_response(&reply);

    let transition = state.with_episode_mut(episode_id, |episode| {
        let session = episode
            .guidance
            .as_mut()
            .ok_or_else(|| CoachError::validation("no guidance session is running"))?;
        session.record_exchange(trimmed);
        match signal {
            StepSignal::Complete => session.complete(),
            StepSignal::Advance(step_prompt) => session.advance(step_prompt),
            StepSignal::Retry(step_prompt) => session.retry(step_prompt),
            StepSignal::Unparseable => Err(CoachError::Unparseable {
                preview: preview(&reply, 200),
            }),
        }
    })?;
    state.metrics.record_state_transition();

    if matches!(transition, StepTransition::Complete) {
        state.append_history(HistoryEntry::new(
            &problem.id,
            &problem.question,
            AttemptStatus::CorrectWithGuidance,
            trimmed,
        ));
        persist_history(state).await;
    }

    Ok(transition)
}

/// Abandon the active guidance session, if any. Terminal sessions are
/// left as they are.
pub fn abandon_guidance(state: &AppState) -> Option<GuidanceSession> {
    let mut episode = state.episode.write();
    let session = episode.as_mut()?.guidance.as_mut()?;
    session.abandon();
    Some(session.clone())
}

pub fn guidance_state(state: &AppState) -> Option<GuidanceSession> {
    state.guidance_snapshot()
}

pub async fn request_hint(state: &AppState) -> Result<String, CoachError> {
    let (_, problem) = state
        .current_problem()
        .ok_or_else(|| CoachError::validation("no problem is loaded"))?;
    advice::fetch_hint(state, &problem).await
}

/// Maybe produce an unprompted tip for the freshly loaded problem.
/// Returns `None` both when the dice say skip and when the model call
/// fails; a tip is never worth surfacing an error for.
pub async fn proactive_tip(state: &AppState) -> Option<String> {
    let (_, problem) = state.current_problem()?;
    advice::maybe_fetch_tip(state, &problem).await
}

pub async fn send_chat_message(state: &AppState, message: &str) -> Result<String, CoachError> {
    chat::send_message(state, message).await
}

pub fn chat_transcript(state: &AppState) -> Vec<ChatMessage> {
    state.chat_snapshot()
}

pub async fn practice_recommendations(state: &AppState) -> Result<String, CoachError> {
    advice::fetch_recommendations(state).await
}

pub fn history_entries(state: &AppState) -> Vec<HistoryEntry> {
    state.history_snapshot()
}

pub fn export_history_csv(state: &AppState) -> Result<String, CoachError> {
    let entries = state.history_snapshot();
    if entries.is_empty() {
        return Err(CoachError::validation("no history to export"));
    }
    Ok(export::to_csv(&entries))
}

pub fn export_history_json(state: &AppState) -> Result<String, CoachError> {
    let entries = state.history_snapshot();
    if entries.is_empty() {
        return Err(CoachError::validation("no history to export"));
    }
    export::to_pretty_json(&entries)
}

/// Replace the in-memory log with whatever the disk copy holds.
pub async fn restore_history(state: &AppState) -> usize {
    let log = history::load_log().await;
    let restored = log.len();
    *state.history.write() = log;
    restored
}

async fn persist_history(state: &AppState) {
    let log: HistoryLog = state.history.read().clone();
    if let Err(e) = history::save_log(&log).await {
        tracing::warn!(error = %e, "Failed to save history");
    }
}
