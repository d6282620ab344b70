use serde::{Deserialize, Serialize};

use crate::web::models::{HistoryTurn, Message, Role};

// History beyond this many turns is dropped before composition to keep the
// prompt inside the upstream context window.
pub const MAX_HISTORY_TURNS: usize = 6;

const ROLE_STATEMENT: &str = "You are an assistant for emergency-response personnel, \
answering on behalf of their training program.";

/// Interaction style requested by the client. Unknown values are rejected at
/// deserialization, so composition can never see an unmapped mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    #[serde(rename = "informational")]
    Informational,
    #[serde(rename = "quiz")]
    Quiz,
    #[serde(rename = "simulation")]
    Simulation,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Informational => "informational",
            Mode::Quiz => "quiz",
            Mode::Simulation => "simulation",
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            Mode::Informational => {
                "Answer the question directly with accurate, procedure-grounded information."
            }
            Mode::Quiz => {
                "Quiz the user: pose one scenario-based question at a time, \
then assess their answer before moving on."
            }
            Mode::Simulation => {
                "Run a simulation: play the role of dispatch and bystanders in an \
unfolding incident, revealing information as the user acts."
            }
        }
    }
}

/// Register requested by the client. Selects a directive fragment and the
/// upstream sampling temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tone {
    #[serde(rename = "field")]
    Field,
    #[default]
    #[serde(rename = "training")]
    Training,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Field => "field",
            Tone::Training => "training",
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            Tone::Field => {
                "Keep the register operational: short sentences, imperative voice, \
no filler, as if radioed to a responder on scene."
            }
            Tone::Training => {
                "Keep the register instructional: explain the reasoning behind each \
step so a trainee can learn from it."
            }
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            Tone::Field => 0.2,
            Tone::Training => 0.7,
        }
    }
}

/// Builds the ordered upstream message sequence: system directive first, the
/// most recent history turns oldest to newest, then the new user turn last.
/// The ordering is load-bearing for response quality and must not change.
pub fn compose(user_input: &str, mode: Mode, tone: Tone, history: &[HistoryTurn]) -> Vec<Message> {
    let system = format!(
        "{} {} {}",
        ROLE_STATEMENT,
        tone.directive(),
        mode.directive()
    );

    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    let retained = &history[start..];

    let mut messages = Vec::with_capacity(retained.len() + 2);
    messages.push(Message {
        role: Role::System,
        content: system,
    });
    for turn in retained {
        messages.push(Message {
            role: turn.role.unwrap_or(Role::User),
            content: annotate(turn),
        });
    }
    messages.push(Message {
        role: Role::User,
        content: user_input.to_string(),
    });
    messages
}

// Appends a bracketed note of the turn's own mode/tone tags so the upstream
// model can see how the conversation's register evolved.
fn annotate(turn: &HistoryTurn) -> String {
    let mut tags = Vec::new();
    if let Some(mode) = turn.mode {
        tags.push(format!("mode: {}", mode.as_str()));
    }
    if let Some(tone) = turn.tone {
        tags.push(format!("tone: {}", tone.as_str()));
    }
    if tags.is_empty() {
        turn.content.clone()
    } else {
        format!("{} [{}]", turn.content, tags.join(", "))
    }
}
