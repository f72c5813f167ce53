use serde::{Deserialize, Serialize};

/// Identifiers of a catalog item across metadata providers, as reported by Trakt.
///
/// Every field is optional: Trakt answers `null` (or omits the key) when a
/// provider has no mapping for the item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TraktIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trakt: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvrage: Option<u64>,
}

impl TraktIds {
    /// Check if all ID fields are empty
    pub fn is_empty(&self) -> bool {
        self.trakt.is_none()
            && self.slug.is_none()
            && self.tvdb.is_none()
            && self.imdb.is_none()
            && self.tmdb.is_none()
            && self.tvrage.is_none()
    }

    /// Look up the identifier for a provider name as it appears in a Plex guid
    /// scheme (`tvdb`, `tmdb`, `imdb`, ...).
    pub fn get(&self, provider: &str) -> Option<String> {
        match provider.to_lowercase().as_str() {
            "trakt" => self.trakt.map(|id| id.to_string()),
            "slug" => self.slug.clone(),
            "tvdb" => self.tvdb.map(|id| id.to_string()),
            "imdb" => self.imdb.clone(),
            "tmdb" => self.tmdb.map(|id| id.to_string()),
            "tvrage" => self.tvrage.map(|id| id.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_ids_deserialize_as_absent() {
        let ids: TraktIds = serde_json::from_str(
            r#"{"trakt":11722092,"tvdb":null,"imdb":null,"tmdb":5322130,"tvrage":null}"#,
        )
        .unwrap();

        assert_eq!(ids.trakt, Some(11722092));
        assert_eq!(ids.tvdb, None);
        assert_eq!(ids.imdb, None);
        assert_eq!(ids.tmdb, Some(5322130));
        assert!(!ids.is_empty());
        assert!(TraktIds::default().is_empty());
    }

    #[test]
    fn test_get_by_provider_name() {
        let ids = TraktIds {
            trakt: Some(448),
            imdb: Some("tt0112384".to_string()),
            tmdb: Some(568),
            ..TraktIds::default()
        };

        assert_eq!(ids.get("TMDB"), Some("568".to_string()));
        assert_eq!(ids.get("imdb"), Some("tt0112384".to_string()));
        assert_eq!(ids.get("tvdb"), None);
        assert_eq!(ids.get("plex"), None);
    }
}
