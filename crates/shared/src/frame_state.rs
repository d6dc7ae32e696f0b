//! Frame lifecycle state and the reducer that advances it.
//!
//! The state is owned by the frame host: it is serialized into the frame
//! document, echoed back on the next button press, and reduced here with no
//! I/O. Side effects for a stage belong to the page handler.

use serde::{Deserialize, Serialize};

use crate::domain::CastId;

/// Button index of `Create` on the view frame.
pub const CREATE_BUTTON_INDEX: u8 = 2;

pub const MISSING_PROMPT_MESSAGE: &str = "You need to specify a prompt to continue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Start,
    View,
    Generate,
    Created,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameState {
    pub stage: Stage,
    #[serde(default)]
    pub total_button_presses: u64,
    #[serde(default)]
    pub input_text: String,
    #[serde(rename = "currentCastId")]
    pub current_cast_id: CastId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameState {
    pub fn initial(cast_id: CastId) -> Self {
        Self {
            stage: Stage::Start,
            total_button_presses: 0,
            input_text: String::new(),
            current_cast_id: cast_id,
            error: None,
        }
    }
}

/// A button press as reported by the frame host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameAction {
    pub button_index: u8,
    pub input_text: Option<String>,
}

impl FrameAction {
    pub fn new(button_index: u8, input_text: Option<&str>) -> Self {
        Self {
            button_index,
            input_text: input_text.map(str::to_string),
        }
    }

    pub fn kind(&self) -> ActionKind<'_> {
        if self.button_index == CREATE_BUTTON_INDEX {
            ActionKind::Create {
                prompt: self.input_text.as_deref().filter(|text| !text.is_empty()),
            }
        } else {
            ActionKind::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind<'a> {
    Create { prompt: Option<&'a str> },
    Other,
}

struct Transition {
    stage: Stage,
    input_text: String,
    error: Option<String>,
}

impl Transition {
    fn to(stage: Stage) -> Self {
        Self {
            stage,
            input_text: String::new(),
            error: None,
        }
    }
}

pub fn reduce(state: &FrameState, action: &FrameAction) -> FrameState {
    let transition = match state.stage {
        Stage::Start => from_start(),
        Stage::View => from_view(action.kind()),
        Stage::Generate => from_generate(),
        Stage::Created => from_created(),
        Stage::Error => from_error(),
        Stage::Unknown => fallback(),
    };

    FrameState {
        stage: transition.stage,
        total_button_presses: state.total_button_presses.saturating_add(1),
        input_text: transition.input_text,
        current_cast_id: state.current_cast_id,
        error: transition.error,
    }
}

fn from_start() -> Transition {
    Transition::to(Stage::View)
}

fn from_view(kind: ActionKind<'_>) -> Transition {
    match kind {
        ActionKind::Create { prompt: None } => Transition {
            error: Some(MISSING_PROMPT_MESSAGE.to_string()),
            ..Transition::to(Stage::Error)
        },
        ActionKind::Create {
            prompt: Some(prompt),
        } => Transition {
            input_text: prompt.to_string(),
            ..Transition::to(Stage::Generate)
        },
        ActionKind::Other => fallback(),
    }
}

fn from_generate() -> Transition {
    Transition::to(Stage::Created)
}

fn from_created() -> Transition {
    Transition::to(Stage::Created)
}

fn from_error() -> Transition {
    Transition::to(Stage::View)
}

fn fallback() -> Transition {
    Transition::to(Stage::View)
}

#[cfg(test)]
#[path = "tests/frame_state_tests.rs"]
mod tests;
