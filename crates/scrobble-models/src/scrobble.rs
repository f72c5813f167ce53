use serde::{Deserialize, Serialize};
use std::fmt;
use crate::media::MediaItem;

/// Trakt scrobble endpoint to call (`/scrobble/start`, `/scrobble/stop`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrobbleAction {
    Start,
    Stop,
}

impl ScrobbleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrobbleAction::Start => "start",
            ScrobbleAction::Stop => "stop",
        }
    }
}

impl fmt::Display for ScrobbleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for a scrobble call: `{"episode": {...}, "progress": 90}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrobbleBody {
    #[serde(flatten)]
    pub item: MediaItem,
    pub progress: u8,
}
