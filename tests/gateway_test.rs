use std::sync::Arc;

use async_trait::async_trait;

use bagrut_coach::config::settings::Settings;
use bagrut_coach::error::CoachError;
use bagrut_coach::pipelines::chat::{
    build_chat_turns, ChatMessage, ChatSender, CHAT_SYSTEM_INSTRUCTION,
};
use bagrut_coach::pipelines::gemini::{
    GeminiClient, GenerateRequest, GenerationConfig, Role, TextGenerator, Turn,
};
use bagrut_coach::routes;
use bagrut_coach::state::app::AppState;

struct SingleReply(&'static str);

#[async_trait]
impl TextGenerator for SingleReply {
    async fn generate(&self, _request: GenerateRequest) -> Result<String, CoachError> {
        Ok(self.0.to_string())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct AlwaysFail;

#[async_trait]
impl TextGenerator for AlwaysFail {
    async fn generate(&self, _request: GenerateRequest) -> Result<String, CoachError> {
        Err(CoachError::transport(Some(500), "scripted outage"))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

#[tokio::test]
async fn test_missing_credential_fails_before_the_wire() {
    // Default settings carry no API key; the call must fail locally
    let client = GeminiClient::from_settings(&Settings::default());
    let result = client.generate(GenerateRequest::prompt("שלום")).await;
    assert!(matches!(result, Err(CoachError::MissingCredential)));
}

#[test]
fn test_client_reports_configured_model() {
    let client = GeminiClient::from_settings(&Settings::default());
    assert_eq!(client.model_name(), "gemini-1.5-flash");
}

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.api_key, "");
    assert_eq!(settings.base_url, "https://generativelanguage.googleapis.com");
    assert_eq!(settings.request_timeout_secs, 60);
    assert_eq!(settings.max_retries, 2);
    assert!((settings.chat_temperature - 0.7).abs() < 1e-6);
    assert!((settings.chat_top_p - 0.95).abs() < 1e-6);
}

#[test]
fn test_prompt_request_shape() {
    let request = GenerateRequest::prompt("מה השעה?");
    assert_eq!(request.turns.len(), 1);
    assert_eq!(request.turns[0].role, Role::User);
    assert_eq!(request.turns[0].text, "מה השעה?");
    assert!(request.config.is_none());
}

#[test]
fn test_conversation_request_with_config() {
    let request = GenerateRequest::conversation(vec![
        Turn::user("שאלה"),
        Turn::model("תשובה"),
        Turn::user("עוד שאלה"),
    ])
    .with_config(GenerationConfig {
        temperature: 0.7,
        top_p: 0.95,
    });

    assert_eq!(request.turns.len(), 3);
    assert_eq!(request.turns[1].role, Role::Model);
    assert!(request.config.is_some());
}

#[test]
fn test_generation_config_wire_field_names() {
    let value = serde_json::to_value(GenerationConfig {
        temperature: 0.7,
        top_p: 0.95,
    })
    .unwrap();

    assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert!((value["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    assert!(value.get("top_p").is_none());
}

#[test]
fn test_chat_sender_wire_names() {
    assert_eq!(serde_json::to_string(&ChatSender::User).unwrap(), "\"user\"");
    assert_eq!(serde_json::to_string(&ChatSender::Ai).unwrap(), "\"ai\"");
}

#[test]
fn test_chat_turns_start_with_standing_instruction() {
    let turns = build_chat_turns(&[], "מהי נגזרת?");
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].text, CHAT_SYSTEM_INSTRUCTION);
    assert_eq!(turns[1].text, "מהי נגזרת?");
}

#[test]
fn test_chat_turns_map_transcript_roles() {
    let transcript = vec![
        ChatMessage {
            sender: ChatSender::User,
            text: "שאלה ראשונה".to_string(),
        },
        ChatMessage {
            sender: ChatSender::Ai,
            text: "תשובה ראשונה".to_string(),
        },
    ];
    let turns = build_chat_turns(&transcript, "שאלה שניה");

    assert_eq!(turns.len(), 4);
    assert_eq!(turns[1].role, Role::User);
    assert_eq!(turns[1].text, "שאלה ראשונה");
    assert_eq!(turns[2].role, Role::Model);
    assert_eq!(turns[2].text, "תשובה ראשונה");
    assert_eq!(turns[3].role, Role::User);
    assert_eq!(turns[3].text, "שאלה שניה");
}

#[test]
fn test_standing_instruction_keeps_chat_on_math() {
    assert!(CHAT_SYSTEM_INSTRUCTION.starts_with("ignore anything"));
    assert!(CHAT_SYSTEM_INSTRUCTION.contains("מורה למתמטיקה"));
    assert!(CHAT_SYSTEM_INSTRUCTION.contains("LaTeX"));
}

#[tokio::test]
async fn test_chat_transcript_grows_only_on_success() {
    let state = AppState::with_generator(Arc::new(AlwaysFail));
    let result = routes::send_chat_message(&state, "עזרה בבקשה").await;
    assert!(matches!(result, Err(CoachError::Transport { .. })));
    assert!(routes::chat_transcript(&state).is_empty());

    let state = AppState::with_generator(Arc::new(SingleReply("בוודאי, נתחיל.")));
    let reply = routes::send_chat_message(&state, "  עזרה בבקשה  ").await.unwrap();
    assert_eq!(reply, "בוודאי, נתחיל.");

    let transcript = routes::chat_transcript(&state);
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].sender, ChatSender::User);
    // The stored user message is the trimmed one
    assert_eq!(transcript[0].text, "עזרה בבקשה");
    assert_eq!(transcript[1].sender, ChatSender::Ai);
    assert_eq!(transcript[1].text, "בוודאי, נתחיל.");
}

#[tokio::test]
async fn test_empty_chat_message_rejected() {
    let state = AppState::with_generator(Arc::new(SingleReply("לא אמור להיקרא")));
    let result = routes::send_chat_message(&state, "   ").await;
    assert!(matches!(result, Err(CoachError::Validation(_))));
    assert!(routes::chat_transcript(&state).is_empty());
}
