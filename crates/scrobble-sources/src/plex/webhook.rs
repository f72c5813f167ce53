use scrobble_models::{EventKind, ExternalGuid, LibrarySection, PlaybackEvent};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook body contains no JSON object")]
    MissingPayload,

    #[error("webhook payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    event: String,
    #[serde(rename = "Account", default)]
    account: Option<Account>,
    #[serde(rename = "Metadata", default)]
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Account {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    #[serde(default)]
    library_section_type: String,
    #[serde(default)]
    guid: Option<String>,
    #[serde(rename = "Guid", default)]
    external_guids: Vec<GuidEntry>,
    #[serde(default)]
    grandparent_title: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    parent_index: Option<u32>,
    #[serde(default)]
    index: Option<u32>,
}

/// Plex sends `{"id": "tvdb://..."}` objects; some agents send bare strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GuidEntry {
    Object { id: String },
    Plain(String),
}

impl GuidEntry {
    fn raw(&self) -> &str {
        match self {
            GuidEntry::Object { id } => id,
            GuidEntry::Plain(id) => id,
        }
    }
}

/// Parse a webhook payload into a playback event.
///
/// `body` is the `payload` form field, or a bare JSON body. Only the first JSON
/// object is read: anything after it, such as a stray multipart tail, is ignored.
pub fn parse_webhook(body: &[u8]) -> Result<PlaybackEvent, WebhookError> {
    let start = body
        .iter()
        .position(|b| *b == b'{')
        .ok_or(WebhookError::MissingPayload)?;
    let payload: WebhookPayload = serde_json::Deserializer::from_slice(&body[start..])
        .into_iter::<WebhookPayload>()
        .next()
        .ok_or(WebhookError::MissingPayload)??;
    let metadata = payload.metadata.unwrap_or_default();

    let mut external_guids = Vec::with_capacity(metadata.external_guids.len());
    for entry in &metadata.external_guids {
        match ExternalGuid::parse(entry.raw()) {
            Some(guid) => external_guids.push(guid),
            None => debug!("Ignoring external guid without scheme: {}", entry.raw()),
        }
    }

    Ok(PlaybackEvent {
        kind: EventKind::from(payload.event.as_str()),
        account_title: payload.account.map(|account| account.title).unwrap_or_default(),
        library_section_type: LibrarySection::from(metadata.library_section_type.as_str()),
        external_guids,
        grandparent_title: metadata.grandparent_title,
        title: metadata.title,
        year: metadata.year,
        season: metadata.parent_index,
        episode: metadata.index,
        raw_guid: metadata.guid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPISODE_PAYLOAD: &str = r#"{
        "event": "media.scrobble",
        "user": true,
        "owner": true,
        "Account": {"id": 1, "title": "Halkeye"},
        "Server": {"title": "nas"},
        "Metadata": {
            "librarySectionType": "show",
            "guid": "plex://episode/669013e833d03eeac35f5d09",
            "type": "episode",
            "title": "Who Is Alive?",
            "grandparentTitle": "Severance",
            "parentIndex": 2,
            "index": 3,
            "year": 2025,
            "Guid": [
                {"id": "tvdb://10592760"},
                {"id": "tmdb://5469117"},
                {"id": "imdb://tt15241840"}
            ]
        }
    }"#;

    #[test]
    fn test_parse_episode_payload() {
        let event = parse_webhook(EPISODE_PAYLOAD.as_bytes()).unwrap();

        assert_eq!(event.kind, EventKind::Scrobble);
        assert_eq!(event.account_title, "Halkeye");
        assert_eq!(event.library_section_type, LibrarySection::Show);
        assert_eq!(event.grandparent_title.as_deref(), Some("Severance"));
        assert_eq!(event.season, Some(2));
        assert_eq!(event.episode, Some(3));
        assert_eq!(event.year, Some(2025));
        assert_eq!(
            event.raw_guid.as_deref(),
            Some("plex://episode/669013e833d03eeac35f5d09")
        );
        assert_eq!(
            event.external_guids,
            vec![
                ExternalGuid::new("tvdb", "10592760"),
                ExternalGuid::new("tmdb", "5469117"),
                ExternalGuid::new("imdb", "tt15241840"),
            ]
        );
    }

    #[test]
    fn test_trailing_bytes_after_payload_are_ignored() {
        let mut body = format!(
            "--boundary\r\nContent-Disposition: form-data; name=\"payload\"\r\nContent-Type: application/json\r\n\r\n{}\r\n--boundary\r\nContent-Disposition: form-data; name=\"thumb\"; filename=\"thumb.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n",
            EPISODE_PAYLOAD
        )
        .into_bytes();
        body.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x7D, 0x9A, 0xFF, 0xD9]);
        body.extend_from_slice(b"\r\n--boundary--\r\n");

        let event = parse_webhook(&body).unwrap();
        assert_eq!(event.kind, EventKind::Scrobble);
        assert_eq!(event.external_guids.len(), 3);
    }

    #[test]
    fn test_legacy_agent_guids() {
        let body = r#"{"event":"media.play","Account":{"title":"bob"},"Metadata":{"librarySectionType":"movie","title":"Apollo 13","year":1995,"Guid":["tmdb://568","com.plexapp.agents.none"]}}"#;

        let event = parse_webhook(body.as_bytes()).unwrap();
        assert_eq!(event.kind, EventKind::Play);
        assert_eq!(event.library_section_type, LibrarySection::Movie);
        assert_eq!(event.external_guids, vec![ExternalGuid::new("tmdb", "568")]);
        assert_eq!(event.season, None);
    }

    #[test]
    fn test_event_without_metadata() {
        let event = parse_webhook(br#"{"event":"admin.database.backup"}"#).unwrap();
        assert_eq!(
            event.kind,
            EventKind::Other("admin.database.backup".to_string())
        );
        assert_eq!(event.library_section_type, LibrarySection::Other(String::new()));
        assert!(event.account_title.is_empty());
    }

    #[test]
    fn test_body_without_json() {
        assert!(matches!(
            parse_webhook(b"not a webhook"),
            Err(WebhookError::MissingPayload)
        ));
        assert!(matches!(
            parse_webhook(b"}"),
            Err(WebhookError::MissingPayload)
        ));
        assert!(matches!(
            parse_webhook(b"} {"),
            Err(WebhookError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_webhook(b"{oops}"),
            Err(WebhookError::InvalidJson(_))
        ));
    }
}
