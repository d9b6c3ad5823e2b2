//! Prompts and gateway calls for the step-by-step guidance flow. The
//! session state machine itself lives in `state::session`; this module
//! only produces raw model replies for the caller to classify.

use crate::error::CoachError;
use crate::pipelines::gemini::{generate_tracked, GenerateRequest};
use crate::pipelines::markers::{
    ALL_STEPS_CORRECT_MARKER, END_STEP_MARKER, NEXT_STEP_MARKER, RETRY_STEP_MARKER,
};
use crate::problems::problem::Problem;
use crate::state::app::AppState;
use crate::state::session::{GuidanceSession, StepExchange};

/// Ask the model to break the problem into ordered sub-steps and return
/// only the first. The whole reply is the first step prompt; no markers
/// are involved at this stage.
pub fn build_first_step_prompt(problem: &Problem) -> String {
    let known_answer = problem
        .answer
        .as_deref()
        .map(|answer| format!(" התשובה הנכונה היא: \"{}\".", answer))
        .unwrap_or_default();

    format!(
        "התלמיד התקשה בשאלה: \"{question}\".{known_answer}\n\
        אנא פרק את השאלה לשלבים קטנים וסדורים לפתרונה, והחזר אך ורק את השלב הראשון בהנחיה מפורטת.\n\
        אל תוסיף דבר מעבר לשלב הראשון.",
        question = problem.question,
        known_answer = known_answer,
    )
}

fn transcript_block(exchanges: &[StepExchange]) -> String {
    if exchanges.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = exchanges
        .iter()
        .enumerate()
        .map(|(i, exchange)| {
            format!(
                "{}. שלב: \"{}\" | תשובת התלמיד: \"{}\"",
                i + 1,
                exchange.step_prompt,
                exchange.answer
            )
        })
        .collect();
    format!("שלבים קודמים:\n{}\n", lines.join("\n"))
}

/// Build the step-evaluation prompt: problem text, 1-based step number,
/// the step awaiting an answer, the student's answer, and a compact
/// transcript of the attempts so far.
pub fn build_step_eval_prompt(
    problem: &Problem,
    step_number: usize,
    step_prompt: &str,
    answer: &str,
    exchanges: &[StepExchange],
) -> String {
    format!(
        "התלמיד נמצא בהנחיה צעד אחר צעד. השאלה המקורית: \"{question}\".\n\
        מספר השלב הנוכחי: {step_number}.\n\
        השלב הנוכחי שהוצג לתלמיד: \"{step_prompt}\".\n\
        תשובת התלמיד לשלב זה: \"{answer}\".\n\
        {transcript}אנא הערך את תשובת התלמיד לשלב זה.\n\
        - אם התשובה לשלב הנוכחי נכונה ויש עוד שלבים, ספק את השלב הבא עטוף ב-{next} וסיים עם {end}.\n\
        - אם התשובה לשלב הנוכחי נכונה וזהו השלב האחרון, השב עם {complete}.\n\
        - אם התשובה לשלב הנוכחי אינה נכונה, ספק את אותו השלב שוב (אולי עם רמז נוסף או הסבר למה התשובה לא נכונה) עטוף ב-{retry} וסיים עם {end}.",
        question = problem.question,
        step_number = step_number,
        step_prompt = step_prompt,
        answer = answer,
        transcript = transcript_block(exchanges),
        next = NEXT_STEP_MARKER,
        end = END_STEP_MARKER,
        complete = ALL_STEPS_CORRECT_MARKER,
        retry = RETRY_STEP_MARKER,
    )
}

/// Fetch the first sub-step for a problem. The returned text is used as
/// the step prompt verbatim.
pub async fn fetch_first_step(state: &AppState, problem: &Problem) -> Result<String, CoachError> {
    let prompt = build_first_step_prompt(problem);
    generate_tracked(state, GenerateRequest::prompt(prompt)).await
}

/// Evaluate one step answer and return the raw model reply. The caller
/// classifies the reply and applies the resulting transition.
pub async fn evaluate_step(
    state: &AppState,
    problem: &Problem,
    session: &GuidanceSession,
    answer: &str,
) -> Result<String, CoachError> {
    let prompt = build_step_eval_prompt(
        problem,
        session.step_index + 1,
        &session.current_step_prompt,
        answer,
        &session.exchanges,
    );
    generate_tracked(state, GenerateRequest::prompt(prompt)).await
}
