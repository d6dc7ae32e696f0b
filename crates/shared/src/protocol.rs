use serde::{Deserialize, Serialize};

use crate::frame_state::{FrameAction, FrameState};

/// Body the frame host posts when a viewer presses a button.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameActionPayload {
    pub untrusted_data: UntrustedData,
    #[serde(default)]
    pub trusted_data: Option<TrustedData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UntrustedData {
    #[serde(default)]
    pub fid: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub network: Option<u32>,
    pub button_index: u8,
    #[serde(default)]
    pub input_text: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub cast_id: Option<FrameCastRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameCastRef {
    pub fid: u64,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedData {
    pub message_bytes: String,
}

impl FrameActionPayload {
    pub fn action(&self) -> FrameAction {
        FrameAction {
            button_index: self.untrusted_data.button_index,
            input_text: self.untrusted_data.input_text.clone(),
        }
    }

    /// The state echoed back by the host. `None` when absent or blank.
    pub fn previous_state(&self) -> Option<Result<FrameState, serde_json::Error>> {
        self.untrusted_data
            .state
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(serde_json::from_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ButtonAction {
    Post,
    Link { target: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameButton {
    pub label: String,
    #[serde(flatten)]
    pub action: ButtonAction,
}

impl FrameButton {
    pub fn post(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Post,
        }
    }

    pub fn link(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Link {
                target: target.into(),
            },
        }
    }
}
