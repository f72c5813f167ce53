use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened on the media server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Play,
    Pause,
    Resume,
    Stop,
    /// Playback passed the server's "watched" threshold
    Scrobble,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Play => "media.play",
            EventKind::Pause => "media.pause",
            EventKind::Resume => "media.resume",
            EventKind::Stop => "media.stop",
            EventKind::Scrobble => "media.scrobble",
            EventKind::Other(raw) => raw,
        }
    }
}

impl From<&str> for EventKind {
    fn from(raw: &str) -> Self {
        match raw {
            "media.play" => EventKind::Play,
            "media.pause" => EventKind::Pause,
            "media.resume" => EventKind::Resume,
            "media.stop" => EventKind::Stop,
            "media.scrobble" => EventKind::Scrobble,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of the library section the played item lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LibrarySection {
    Show,
    Movie,
    Other(String),
}

impl From<&str> for LibrarySection {
    fn from(raw: &str) -> Self {
        match raw {
            "show" => LibrarySection::Show,
            "movie" => LibrarySection::Movie,
            other => LibrarySection::Other(other.to_string()),
        }
    }
}

impl fmt::Display for LibrarySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibrarySection::Show => f.write_str("show"),
            LibrarySection::Movie => f.write_str("movie"),
            LibrarySection::Other(raw) => f.write_str(raw),
        }
    }
}

/// A `(provider, provider_id)` pair attached by a metadata agent, e.g. `tvdb://10592760`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalGuid {
    pub provider: String,
    pub id: String,
}

impl ExternalGuid {
    pub fn new(provider: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
        }
    }

    /// Split a `scheme://value` guid. Returns `None` when there is no scheme
    /// separator or either side is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (provider, id) = raw.split_once("://")?;
        if provider.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(provider, id))
    }
}

impl fmt::Display for ExternalGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.provider, self.id)
    }
}

/// A structured playback notification from the media server.
///
/// `external_guids` keeps the order the server reported them in; that order is
/// the priority in which they are tried during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    pub kind: EventKind,
    pub account_title: String,
    pub library_section_type: LibrarySection,
    pub external_guids: Vec<ExternalGuid>,
    /// Show title for episodes
    pub grandparent_title: Option<String>,
    pub title: Option<String>,
    pub year: Option<u32>,
    /// Season index for episodes
    pub season: Option<u32>,
    /// Episode index within the season
    pub episode: Option<u32>,
    pub raw_guid: Option<String>,
}

impl PlaybackEvent {
    pub fn new(kind: EventKind, account_title: impl Into<String>, library_section_type: LibrarySection) -> Self {
        Self {
            kind,
            account_title: account_title.into(),
            library_section_type,
            external_guids: Vec::new(),
            grandparent_title: None,
            title: None,
            year: None,
            season: None,
            episode: None,
            raw_guid: None,
        }
    }

    /// Case-insensitive comparison of the event's account against a stored username
    pub fn is_for_account(&self, username: &str) -> bool {
        self.account_title.to_lowercase() == username.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_parsing() {
        assert_eq!(EventKind::from("media.play"), EventKind::Play);
        assert_eq!(EventKind::from("media.scrobble"), EventKind::Scrobble);
        assert_eq!(
            EventKind::from("library.new"),
            EventKind::Other("library.new".to_string())
        );
        assert_eq!(EventKind::from("media.rate").as_str(), "media.rate");
    }

    #[test]
    fn test_external_guid_parse() {
        assert_eq!(
            ExternalGuid::parse("tvdb://10592760"),
            Some(ExternalGuid::new("tvdb", "10592760"))
        );
        assert_eq!(
            ExternalGuid::parse("imdb://tt15241840").map(|guid| guid.to_string()),
            Some("imdb://tt15241840".to_string())
        );
        assert_eq!(ExternalGuid::parse("10592760"), None);
        assert_eq!(ExternalGuid::parse("tvdb://"), None);
    }

    #[test]
    fn test_account_match_ignores_case() {
        let event = PlaybackEvent::new(EventKind::Play, "ALICE", LibrarySection::Movie);
        assert!(event.is_for_account("alice"));
        assert!(event.is_for_account("Alice"));
        assert!(!event.is_for_account("bob"));
    }
}
