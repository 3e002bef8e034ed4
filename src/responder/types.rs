//! Wire types for the remote responder

use serde::{Deserialize, Serialize};

/// Instruction sent with every question
pub const ANSWER_INSTRUCTION: &str = "Answer the input.";

/// Request body: `{ "instruction": ..., "input_text": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponderRequest {
    pub instruction: String,
    pub input_text: String,
}

impl ResponderRequest {
    /// A question using the fixed answer instruction
    pub fn answer(input_text: impl Into<String>) -> Self {
        Self {
            instruction: ANSWER_INSTRUCTION.to_string(),
            input_text: input_text.into(),
        }
    }
}

/// Response body: `{ "response": ... }`, where `response` is the raw payload
/// still wrapped in the responder's prompt template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponderReply {
    pub response: String,
}
