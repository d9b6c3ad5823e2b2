use serde::Serialize;

use crate::cache::{get_cached_verdict, store_verdict};
use crate::error::CoachError;
use crate::pipelines::gemini::{generate_tracked, GenerateRequest};
use crate::problems::problem::Problem;
use crate::state::app::AppState;

/// Outcome of grading one typed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Incorrect,
}

/// The two words the model is told to answer with. Held as data so the
/// grading language is configuration, not something baked into the
/// parser.
#[derive(Debug, Clone)]
pub struct VerdictVocabulary {
    pub correct: String,
    pub incorrect: String,
}

impl Default for VerdictVocabulary {
    fn default() -> Self {
        VerdictVocabulary {
            correct: "נכון".to_string(),
            incorrect: "שגוי".to_string(),
        }
    }
}

/// Build the grading prompt. The reference answer line is included only
/// when the bank has one.
pub fn build_verdict_prompt(problem: &Problem, submission: &str, vocabulary: &VerdictVocabulary) -> String {
    let known_answer = problem
        .answer
        .as_deref()
        .map(|answer| format!("התשובה הנכונה הידועה היא: \"{}\".\n", answer))
        .unwrap_or_default();

    format!(
        "אתה מורה למתמטיקה מומחה לתלמידי בגרות 3 יחידות בישראל.\n\
        השאלה היא: \"{question}\"\n\
        התשובה שהתלמיד הגיש היא: \"{submission}\".\n\
        {known_answer}\n\
        אנא קבע **בלבד** אם התשובה שהוגשה נכונה או שגויה.\n\
        התשובה שלך צריכה להיות אחת משתי מילים בלבד בעברית: \"{correct}\" או \"{incorrect}\".",
        question = problem.question,
        submission = submission,
        known_answer = known_answer,
        correct = vocabulary.correct,
        incorrect = vocabulary.incorrect,
    )
}

/// A reply grades as Correct only when, trimmed and lowercased, it is
/// exactly the correct token. Everything else, including hedged or
/// explained replies, grades as Incorrect.
pub fn parse_verdict(raw: &str, vocabulary: &VerdictVocabulary) -> Verdict {
    if raw.trim().to_lowercase() == vocabulary.correct.trim().to_lowercase() {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}

/// Grade a typed answer against a problem. Identical submissions for the
/// same problem are answered from the verdict cache without a model call.
/// A gateway failure propagates; it is never mapped to a verdict.
pub async fn evaluate(state: &AppState, problem: &Problem, submission: &str) -> Result<Verdict, CoachError> {
    let vocabulary = state.verdict_vocabulary.as_ref();
    let prompt = build_verdict_prompt(problem, submission, vocabulary);
    let model = state.generator.model_name().to_string();

    if let Some(raw) = get_cached_verdict(state, &model, &prompt) {
        return Ok(parse_verdict(&raw, vocabulary));
    }

    let raw = generate_tracked(state, GenerateRequest::prompt(prompt.clone())).await?;
    store_verdict(state, &model, &prompt, &raw);
    Ok(parse_verdict(&raw, vocabulary))
}
