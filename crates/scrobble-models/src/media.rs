use serde::{Deserialize, Serialize};
use std::fmt;
use crate::media_ids::TraktIds;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Episode {
    pub season: u32,
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub ids: TraktIds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: TraktIds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Show {
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: TraktIds,
}

/// A season as listed by `/shows/{id}/seasons?extended=episodes`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Season {
    pub number: u32,
    #[serde(default)]
    pub ids: TraktIds,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl Season {
    pub fn episode(&self, number: u32) -> Option<&Episode> {
        self.episodes.iter().find(|episode| episode.number == number)
    }
}

/// Canonical catalog item a playback event was resolved to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaItem {
    Episode(Episode),
    Movie(Movie),
}

impl MediaItem {
    pub fn ids(&self) -> &TraktIds {
        match self {
            MediaItem::Episode(episode) => &episode.ids,
            MediaItem::Movie(movie) => &movie.ids,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MediaItem::Episode(_) => "episode",
            MediaItem::Movie(_) => "movie",
        }
    }
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaItem::Episode(episode) => write!(
                f,
                "S{:02}E{:02} - {}",
                episode.season,
                episode.number,
                episode.title.as_deref().unwrap_or("(untitled)")
            ),
            MediaItem::Movie(movie) => match movie.year {
                Some(year) => write!(f, "{} ({})", movie.title, year),
                None => write!(f, "{}", movie.title),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_episode_lookup() {
        let season: Season = serde_json::from_str(
            r#"{"number":1,"ids":{"trakt":374539,"tvdb":null,"tmdb":362030,"tvrage":null},"episodes":[
                {"season":1,"number":4,"title":"Episode 4","ids":{"trakt":11722090,"tmdb":5322129}},
                {"season":1,"number":5,"title":"Episode 5","ids":{"trakt":11722092,"tmdb":5322130}}
            ]}"#,
        )
        .unwrap();

        let episode = season.episode(5).unwrap();
        assert_eq!(episode.title.as_deref(), Some("Episode 5"));
        assert_eq!(episode.ids.trakt, Some(11722092));
        assert!(season.episode(7).is_none());
    }

    #[test]
    fn test_season_without_episodes() {
        let season: Season =
            serde_json::from_str(r#"{"number":3,"ids":{"trakt":453841,"tvdb":null}}"#).unwrap();
        assert!(season.episodes.is_empty());
    }

    #[test]
    fn test_display() {
        let episode = MediaItem::Episode(Episode {
            season: 2,
            number: 3,
            title: Some("Who Is Alive?".to_string()),
            ids: TraktIds::default(),
        });
        let movie = MediaItem::Movie(Movie {
            title: "Apollo 13".to_string(),
            year: Some(1995),
            ids: TraktIds::default(),
        });

        assert_eq!(episode.to_string(), "S02E03 - Who Is Alive?");
        assert_eq!(movie.to_string(), "Apollo 13 (1995)");
        assert_eq!(episode.kind(), "episode");
    }
}
