//! One-shot advisory calls: hints, proactive tips and practice
//! recommendations. None of these touch session state.

use crate::error::CoachError;
use crate::pipelines::gemini::{generate_tracked, GenerateRequest};
use crate::problems::problem::Problem;
use crate::state::app::AppState;

pub fn build_hint_prompt(problem: &Problem) -> String {
    format!(
        "אתה מורה למתמטיקה. השאלה היא: \"{question}\".\n\
        ספק רמז קצר וממוקד בעברית שיעזור לתלמיד להתחיל לפתור את השאלה או להתגבר על קושי נפוץ.\n\
        השתמש ב-LaTeX לביטויים מתמטיים.",
        question = problem.question,
    )
}

/// Fetch a short hint for the loaded problem.
pub async fn fetch_hint(state: &AppState, problem: &Problem) -> Result<String, CoachError> {
    let prompt = build_hint_prompt(problem);
    generate_tracked(state, GenerateRequest::prompt(prompt)).await
}

pub fn build_tip_prompt(problem: &Problem) -> String {
    format!(
        "התלמיד טוען כעת את השאלה הבאה במתמטיקה: \"{question}\".\n\
        ספק טיפ פרואקטיבי קצר מאוד (משפט אחד או שניים) בעברית שיכול לעזור לתלמיד לגשת לשאלה זו או להזכיר לו משהו חשוב.\n\
        לדוגמה: \"זכור לבדוק את תחום ההגדרה!\" או \"שים לב ליחידות המידה.\" או \"נסה לסרטט את הבעיה.\"\n\
        אל תפתור את השאלה, רק תן טיפ קצרצר.",
        question = problem.question,
    )
}

/// Maybe fetch a proactive tip for a freshly loaded problem. Tips show
/// roughly 30% of the time; a gateway failure here is swallowed and the
/// tip is simply skipped.
pub async fn maybe_fetch_tip(state: &AppState, problem: &Problem) -> Option<String> {
    if rand::random::<f64>() < 0.7 {
        return None;
    }

    let prompt = build_tip_prompt(problem);
    match generate_tracked(state, GenerateRequest::prompt(prompt)).await {
        Ok(tip) => Some(tip),
        Err(e) => {
            tracing::debug!(error = %e, "Proactive tip dropped after gateway failure");
            None
        }
    }
}

/// Ask for 2-3 practice recommendations based on the most recent history
/// entries. Requires at least one entry.
pub async fn fetch_recommendations(state: &AppState) -> Result<String, CoachError> {
    let recent = {
        let history = state.history.read();
        history.recent(10)
    };
    if recent.is_empty() {
        return Err(CoachError::validation("no history to base recommendations on"));
    }

    let performance: Vec<String> = recent
        .iter()
        .map(|entry| format!("שאלה: {}, סטטוס: {}", entry.question, entry.status))
        .collect();

    let prompt = format!(
        "בהתבסס על הביצועים האחרונים של התלמיד:\n\
        {performance}\n\
        אנא ספק 2-3 המלצות קצרות וברורות בעברית על אילו נושאים או סוגי שאלות התלמיד צריך להתמקד.\n\
        הצג כל המלצה כפריט ברשימה (השתמש בתגי `<li>`).",
        performance = performance.join("\n"),
    );
    generate_tracked(state, GenerateRequest::prompt(prompt)).await
}
