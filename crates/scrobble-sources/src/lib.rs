pub mod traits;
pub mod trakt;
pub mod plex;
pub mod error;

pub use traits::TrackingService;
pub use error::SourceError;
pub use trakt::{authorize_url, redirect_uri, SearchHit, SearchKind, TokenGrant, TraktClient};
pub use plex::{parse_webhook, WebhookError};
