use chrono::{DateTime, Utc};
use shared::{domain::Cast, frame_state::FrameState, protocol::FrameButton};
use url::Url;

/// Which card a cast image is presented as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Start,
    Root,
    Derivative,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameImage {
    Cast { url: Url, kind: CardKind },
    Generating,
    Error { message: String },
}

/// Analytics shown next to the entry frame on first paint.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub cast: Cast,
    pub image_url: Option<Url>,
    pub owner_profile_url: Url,
}

impl Dashboard {
    pub fn created_on(&self) -> String {
        human_date(self.cast.created_at)
    }
}

/// Everything the server needs to render one frame document.
#[derive(Debug, Clone)]
pub struct FramePage {
    pub pathname: String,
    pub state: FrameState,
    pub image: FrameImage,
    pub input_placeholder: Option<String>,
    pub buttons: Vec<FrameButton>,
    pub dashboard: Option<Dashboard>,
}

impl FramePage {
    pub(crate) fn new(pathname: String, state: FrameState, image: FrameImage) -> Self {
        Self {
            pathname,
            state,
            image,
            input_placeholder: None,
            buttons: Vec::new(),
            dashboard: None,
        }
    }

    pub(crate) fn button(mut self, button: FrameButton) -> Self {
        self.buttons.push(button);
        self
    }
}

/// `March 1, 2024`
pub fn human_date(value: DateTime<Utc>) -> String {
    value.format("%B %-d, %Y").to_string()
}
