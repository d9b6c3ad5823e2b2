use serde::{Deserialize, Serialize};

use crate::error::CoachError;
use crate::pipelines::gemini::{generate_tracked, GenerateRequest};
use crate::problems::problem::Problem;
use crate::state::app::AppState;

/// Direction of a problem modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModificationKind {
    Simplify,
    MakeHarder,
}

impl ModificationKind {
    /// The Hebrew action phrase used inside the prompt.
    pub fn action_he(self) -> &'static str {
        match self {
            ModificationKind::Simplify => "פשוטה יותר",
            ModificationKind::MakeHarder => "קשה יותר",
        }
    }

    /// Suffix appended to the source problem's id on the derived copy.
    pub fn id_suffix(self) -> &'static str {
        match self {
            ModificationKind::Simplify => "simplify",
            ModificationKind::MakeHarder => "makeHarder",
        }
    }

    /// Difficulty label the derived copy carries.
    pub fn difficulty_label(self) -> &'static str {
        match self {
            ModificationKind::Simplify => "מפושטת",
            ModificationKind::MakeHarder => "מורכבת",
        }
    }
}

pub fn build_modification_prompt(problem: &Problem, kind: ModificationKind) -> String {
    format!(
        "נתונה בעיית המתמטיקה הבאה מתוכנית הבגרות הישראלית (3 יחידות): \"{question}\"\n\
        אנא צור גרסה {action} של בעיה זו. הגרסה החדשה צריכה ללמד את אותו רעיון מרכזי אבל עם מספרים קלים יותר/פחות שלבים (לגרסה פשוטה) או מספרים מורכבים יותר/שלבים נוספים/הקשר מאתגר יותר (לגרסה קשה).\n\
        ספק רק את השאלה החדשה, בעברית. השתמש ב-LaTeX לביטויים מתמטיים.",
        question = problem.question,
        action = kind.action_he(),
    )
}

/// Produce a simplified or hardened copy of a problem. One gateway call;
/// the reply text becomes the derived copy's question verbatim.
pub async fn fetch_modified_problem(
    state: &AppState,
    problem: &Problem,
    kind: ModificationKind,
) -> Result<Problem, CoachError> {
    let prompt = build_modification_prompt(problem, kind);
    let new_question = generate_tracked(state, GenerateRequest::prompt(prompt)).await?;
    Ok(problem.derive_modified(kind, new_question))
}
