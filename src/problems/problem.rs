use serde::{Deserialize, Serialize};

use crate::pipelines::modify::ModificationKind;

fn default_topic() -> String {
    "מתמטיקה".to_string()
}

/// One exam problem as stored in the embedded bank. Question and answer
/// text is Hebrew with inline LaTeX. Immutable once loaded; a modified
/// variant is always a derived copy, never an in-place edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Problem {
    pub id: String,
    pub question: String,
    /// Reference answer, when the bank has one. Absent for problems that
    /// are graded from worked solutions only.
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// True when the problem appears in the current exam focus list.
    #[serde(default)]
    pub mikud: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    /// Set on derived copies; points at the problem they were derived from.
    #[serde(default)]
    pub origin_id: Option<String>,
}

impl Problem {
    /// Derive a copy with replacement question text, keeping every other
    /// field. The copy gets a synthetic id and a difficulty label naming
    /// the modification, and records which problem it came from.
    pub fn derive_modified(&self, kind: ModificationKind, new_question: String) -> Problem {
        Problem {
            question: new_question,
            difficulty: Some(kind.difficulty_label().to_string()),
            origin_id: Some(self.id.clone()),
            id: format!("{}-{}", self.id, kind.id_suffix()),
            ..self.clone()
        }
    }
}
