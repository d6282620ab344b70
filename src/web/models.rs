use serde::{Deserialize, Serialize};

use crate::prompt::{Mode, Tone};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_input: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub content: String,
}

/// One prior turn supplied by the caller. Never persisted by the gateway;
/// the optional tags only annotate the composed prompt text.
#[derive(Debug, Deserialize)]
pub struct HistoryTurn {
    pub role: Option<Role>,
    pub content: String,
    pub mode: Option<Mode>,
    pub tone: Option<Tone>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "system")]
    System,
}

/// The upstream chat message shape.
#[derive(Debug, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}
