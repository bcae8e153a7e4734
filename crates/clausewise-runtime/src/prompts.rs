//! Prompts for the narrative and translation calls.
//!
//! The system prompt is shared. The user prompt carries the contract text,
//! fenced in triple quotes so clause text cannot be read as instructions.

use crate::providers::ChatMessage;

/// System prompt shared by every call.
pub const SYSTEM_PROMPT: &str = "You are a helpful legal assistant.";

/// Instructions for the contract narrative.
pub const NARRATIVE_INSTRUCTIONS: &str = r#"You are a legal assistant for Indian SMEs.
Analyze the following contract text:
1. Provide a concise Summary (3-5 lines).
2. List potential Risks/Red flags.
3. Give practical Suggestions.

Respond strictly in JSON format with exactly these string fields:
{"summary": "...", "risks": "...", "suggestions": "..."}"#;

/// Instructions for translation to English.
pub const TRANSLATION_INSTRUCTIONS: &str = "Translate this to English. \
Keep clause numbering (\"1.\", \"2.\", ...) at the start of lines exactly as in the source. \
Reply with the translated text only.";

/// Build the narrative prompt for a contract.
pub fn narrative_messages(contract_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "{}\n\nContract Text:\n\"\"\"{}\"\"\"\n",
            NARRATIVE_INSTRUCTIONS, contract_text
        )),
    ]
}

/// Build the translation prompt for a contract.
pub fn translation_messages(contract_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("{}\n\n{}", TRANSLATION_INSTRUCTIONS, contract_text)),
    ]
}
