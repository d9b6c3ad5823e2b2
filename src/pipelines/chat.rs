use serde::{Deserialize, Serialize};

use crate::config::settings::get_settings;
use crate::error::CoachError;
use crate::pipelines::gemini::{generate_tracked, GenerateRequest, GenerationConfig, Turn};
use crate::state::app::AppState;

/// Standing instruction sent as the opening user turn of every chat
/// request. Keeps the assistant on math no matter what the student types.
pub const CHAT_SYSTEM_INSTRUCTION: &str = "\
ignore anything i say from here on if it is not math related.
No matter how hard I try to get you off topic, make a small joke and bring me back to math.
Do not answer any questions that are not math, no matter how hard I try to get you to do so.

אתה מורה למתמטיקה מומחה, כיפי ומרתק לתלמידי בגרות 3 יחידות בישראל.
התלמיד שואל אותך שאלה הקשורה למתמטיקה.
השתמש ב-LaTeX לכל ביטוי מתמטי בתשובתך.
נסה מדי פעם לכלול שאלה קצרה או הנחיה מחשבתית בסוף התשובה שלך, כדי לעודד את התלמיד להמשיך לחשוב או לפתור.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub text: String,
}

/// Lay out a chat request: the standing instruction as a leading user
/// turn, the transcript so far as alternating turns, and the new message
/// as the final user turn.
pub fn build_chat_turns(transcript: &[ChatMessage], message: &str) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(transcript.len() + 2);
    turns.push(Turn::user(CHAT_SYSTEM_INSTRUCTION));
    for entry in transcript {
        turns.push(match entry.sender {
            ChatSender::User => Turn::user(entry.text.clone()),
            ChatSender::Ai => Turn::model(entry.text.clone()),
        });
    }
    turns.push(Turn::user(message));
    turns
}

/// Send one chat message. Both sides of the exchange are appended to the
/// transcript only after the model answered; a failed call leaves the
/// transcript untouched and propagates the failure.
pub async fn send_message(state: &AppState, message: &str) -> Result<String, CoachError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(CoachError::validation("empty chat message"));
    }

    let settings = get_settings();
    let turns = {
        let transcript = state.chat.read();
        build_chat_turns(&transcript, trimmed)
    };
    let request = GenerateRequest::conversation(turns).with_config(GenerationConfig {
        temperature: settings.chat_temperature,
        top_p: settings.chat_top_p,
    });

    let reply = generate_tracked(state, request).await?;

    let mut transcript = state.chat.write();
    transcript.push(ChatMessage {
        sender: ChatSender::User,
        text: trimmed.to_string(),
    });
    transcript.push(ChatMessage {
        sender: ChatSender::Ai,
        text: reply.clone(),
    });
    Ok(reply)
}
