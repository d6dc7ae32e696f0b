use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CastId);

/// A cast record together with the read-side panels the dashboard shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cast {
    pub id: CastId,
    pub name: String,
    pub farcaster_id: String,
    pub image_path: Option<String>,
    pub parent_id: Option<CastId>,
    pub layer_1_cast_id: Option<CastId>,
    pub branch_num: u32,
    pub num_derivatives: u64,
    pub num_total_derivatives: u64,
    pub prompt_input: Option<String>,
    /// Effective lock: the cast's own flag or the flag of its layer 1 root.
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub latest_prompts: Vec<PromptEntry>,
    pub version_history: Vec<CastVersion>,
}

impl Cast {
    pub fn is_root(&self) -> bool {
        self.branch_num == 0
    }

    pub fn latest_prompt(&self) -> Option<&str> {
        self.latest_prompts
            .first()
            .map(|entry| entry.prompt_input.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEntry {
    pub cast_id: CastId,
    pub prompt_input: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastVersion {
    pub cast_id: CastId,
    pub name: String,
    pub image_path: Option<String>,
    pub branch_num: u32,
    pub created_at: DateTime<Utc>,
}

/// Field values for a cast about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCast {
    pub name: String,
    pub farcaster_id: String,
    pub image_path: Option<String>,
    pub parent_id: Option<CastId>,
    pub branch_num: u32,
    pub prompt_input: Option<String>,
    pub layer_1_cast_id: Option<CastId>,
}

impl NewCast {
    pub fn root(
        name: impl Into<String>,
        farcaster_id: impl Into<String>,
        image_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            farcaster_id: farcaster_id.into(),
            image_path: Some(image_path.into()),
            parent_id: None,
            branch_num: 0,
            prompt_input: None,
            layer_1_cast_id: None,
        }
    }
}
