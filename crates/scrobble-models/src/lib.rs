pub mod event;
pub mod identity;
pub mod media;
pub mod media_ids;
pub mod scrobble;

pub use event::{EventKind, ExternalGuid, LibrarySection, PlaybackEvent};
pub use identity::{CredentialState, Identity};
pub use media::{Episode, MediaItem, Movie, Season, Show};
pub use media_ids::TraktIds;
pub use scrobble::{ScrobbleAction, ScrobbleBody};
