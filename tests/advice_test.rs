use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use bagrut_coach::error::CoachError;
use bagrut_coach::history::{AttemptStatus, HistoryEntry};
use bagrut_coach::pipelines::advice::{build_hint_prompt, build_tip_prompt};
use bagrut_coach::pipelines::gemini::{GenerateRequest, TextGenerator};
use bagrut_coach::problems::problem::Problem;
use bagrut_coach::routes;
use bagrut_coach::state::app::AppState;

struct RecordingGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(RecordingGenerator {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<String, CoachError> {
        self.prompts
            .lock()
            .unwrap()
            .push(request.turns[0].text.clone());
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct AlwaysFail;

#[async_trait]
impl TextGenerator for AlwaysFail {
    async fn generate(&self, _request: GenerateRequest) -> Result<String, CoachError> {
        Err(CoachError::transport(None, "scripted outage"))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

fn sample_problem() -> Problem {
    Problem {
        id: "801-2025-1".to_string(),
        question: "פתרו את המשוואה \\(2x + 6 = 14\\).".to_string(),
        answer: Some("x = 4".to_string()),
        topic: "אלגברה".to_string(),
        difficulty: Some("קל".to_string()),
        mikud: false,
        image_url: None,
        pdf_url: None,
        origin_id: None,
    }
}

#[test]
fn test_hint_prompt_contains_question() {
    let prompt = build_hint_prompt(&sample_problem());
    assert!(prompt.contains("פתרו את המשוואה"));
    assert!(prompt.contains("רמז"));
}

#[test]
fn test_tip_prompt_asks_for_a_tip_only() {
    let prompt = build_tip_prompt(&sample_problem());
    assert!(prompt.contains("פתרו את המשוואה"));
    assert!(prompt.contains("אל תפתור את השאלה"));
}

#[tokio::test]
async fn test_request_hint_for_loaded_problem() {
    let generator = RecordingGenerator::new("נסה לבודד את x.");
    let state = AppState::with_generator(generator.clone());
    state.begin_episode(sample_problem());

    let hint = routes::request_hint(&state).await.unwrap();
    assert_eq!(hint, "נסה לבודד את x.");
    assert!(generator.last_prompt().contains("פתרו את המשוואה"));
}

#[tokio::test]
async fn test_request_hint_without_problem() {
    let state = AppState::with_generator(RecordingGenerator::new("רמז"));
    let result = routes::request_hint(&state).await;
    assert!(matches!(result, Err(CoachError::Validation(_))));
}

#[tokio::test]
async fn test_tip_failure_is_swallowed() {
    let state = AppState::with_generator(Arc::new(AlwaysFail));
    state.begin_episode(sample_problem());

    // Whether the dice skip the tip or the call fails, no error surfaces
    for _ in 0..10 {
        assert_eq!(routes::proactive_tip(&state).await, None);
    }
}

#[tokio::test]
async fn test_tip_without_problem_is_none() {
    let state = AppState::with_generator(RecordingGenerator::new("טיפ"));
    assert_eq!(routes::proactive_tip(&state).await, None);
}

#[tokio::test]
async fn test_recommendations_require_history() {
    let state = AppState::with_generator(RecordingGenerator::new("המלצות"));
    let result = routes::practice_recommendations(&state).await;
    assert!(matches!(result, Err(CoachError::Validation(_))));
}

#[tokio::test]
async fn test_recommendations_prompt_carries_recent_performance() {
    let generator = RecordingGenerator::new("<li>תרגל משוואות ריבועיות</li>");
    let state = AppState::with_generator(generator.clone());
    for i in 0..12 {
        let status = if i % 2 == 0 {
            AttemptStatus::Correct
        } else {
            AttemptStatus::IncorrectWithGuidance
        };
        state.append_history(HistoryEntry::new(
            &format!("801-2025-{}", i),
            &format!("שאלה מספר {}", i),
            status,
            "תשובה",
        ));
    }

    let reply = routes::practice_recommendations(&state).await.unwrap();
    assert_eq!(reply, "<li>תרגל משוואות ריבועיות</li>");

    let prompt = generator.last_prompt();
    assert!(prompt.contains("סטטוס: correct"));
    assert!(prompt.contains("סטטוס: incorrect-with-guidance"));
    // Only the ten most recent entries are summarized
    assert!(prompt.contains("שאלה מספר 11"));
    assert!(prompt.contains("שאלה מספר 2"));
    assert!(!prompt.contains("שאלה מספר 1,"));
    assert!(prompt.contains("<li>"));
}
