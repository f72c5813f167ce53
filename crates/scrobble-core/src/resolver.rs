use scrobble_models::{Episode, LibrarySection, MediaItem, Movie, PlaybackEvent};
use scrobble_sources::{SearchKind, TrackingService};
use tracing::{debug, warn};
use crate::error::ResolveError;

/// Maps a playback event to the tracking service's canonical item.
///
/// External GUIDs are tried first, in the order the media server listed them.
/// When none of them match, a title search with an exact year match is the
/// fallback. A failing catalog query only skips that strategy.
pub struct MediaResolver<'a> {
    tracker: &'a dyn TrackingService,
}

fn describe(event: &PlaybackEvent) -> String {
    let title = match event.library_section_type {
        LibrarySection::Show => event.grandparent_title.as_deref(),
        _ => event.title.as_deref(),
    }
    .unwrap_or("untitled");

    let mut description = title.to_string();
    if let (Some(season), Some(episode)) = (event.season, event.episode) {
        description.push_str(&format!(" S{:02}E{:02}", season, episode));
    }
    if let Some(year) = event.year {
        description.push_str(&format!(" ({})", year));
    }
    description
}

/// A hit must agree with whatever the event already knows about position
fn episode_matches(episode: &Episode, event: &PlaybackEvent) -> bool {
    event.season.map_or(true, |season| season == episode.season)
        && event.episode.map_or(true, |number| number == episode.number)
}

fn movie_matches(movie: &Movie, event: &PlaybackEvent) -> bool {
    match (event.year, movie.year) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => true,
    }
}

impl<'a> MediaResolver<'a> {
    pub fn new(tracker: &'a dyn TrackingService) -> Self {
        Self { tracker }
    }

    pub async fn resolve(&self, event: &PlaybackEvent) -> Result<MediaItem, ResolveError> {
        match &event.library_section_type {
            LibrarySection::Show => self.resolve_episode(event).await.map(MediaItem::Episode),
            LibrarySection::Movie => self.resolve_movie(event).await.map(MediaItem::Movie),
            LibrarySection::Other(section) => Err(ResolveError::Unsupported(section.clone())),
        }
    }

    pub async fn resolve_episode(&self, event: &PlaybackEvent) -> Result<Episode, ResolveError> {
        if let Some(episode) = self.episode_by_guid(event).await {
            return Ok(episode);
        }
        if let Some(episode) = self.episode_by_title(event).await {
            return Ok(episode);
        }
        Err(ResolveError::NotFound(describe(event)))
    }

    pub async fn resolve_movie(&self, event: &PlaybackEvent) -> Result<Movie, ResolveError> {
        if let Some(movie) = self.movie_by_guid(event).await {
            return Ok(movie);
        }
        if let Some(movie) = self.movie_by_title(event).await {
            return Ok(movie);
        }
        Err(ResolveError::NotFound(describe(event)))
    }

    async fn episode_by_guid(&self, event: &PlaybackEvent) -> Option<Episode> {
        for guid in &event.external_guids {
            let hits = match self
                .tracker
                .search_by_id(&guid.provider, &guid.id, SearchKind::Episode)
                .await
            {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("Episode lookup by {} failed: {}", guid, e);
                    continue;
                }
            };

            let Some(episode) = hits.into_iter().next().and_then(|hit| hit.episode) else {
                debug!("No episode for {}", guid);
                continue;
            };

            if episode_matches(&episode, event) {
                debug!("Resolved episode via {}", guid);
                return Some(episode);
            }
            warn!(
                "Ignoring {} match S{:02}E{:02}, event is S{:?}E{:?}",
                guid, episode.season, episode.number, event.season, event.episode
            );
        }
        None
    }

    async fn episode_by_title(&self, event: &PlaybackEvent) -> Option<Episode> {
        let show_title = event.grandparent_title.as_deref()?;
        let year = event.year?;
        let (season_number, episode_number) = (event.season?, event.episode?);

        let hits = self
            .tracker
            .search_by_text(SearchKind::Show, show_title)
            .await
            .map_err(|e| warn!("Show search for '{}' failed: {}", show_title, e))
            .ok()?;

        let Some(show) = hits
            .into_iter()
            .filter_map(|hit| hit.show)
            .find(|show| show.year == Some(year))
        else {
            debug!("No show '{}' from {}", show_title, year);
            return None;
        };
        let show_id = show.ids.trakt?;

        let seasons = self
            .tracker
            .show_seasons(show_id)
            .await
            .map_err(|e| warn!("Season listing for show {} failed: {}", show_id, e))
            .ok()?;

        let episode = seasons
            .iter()
            .find(|season| season.number == season_number)
            .and_then(|season| season.episode(episode_number))
            .cloned();
        if episode.is_none() {
            debug!(
                "Show {} has no S{:02}E{:02}",
                show_id, season_number, episode_number
            );
        }
        episode
    }

    async fn movie_by_guid(&self, event: &PlaybackEvent) -> Option<Movie> {
        for guid in &event.external_guids {
            let hits = match self
                .tracker
                .search_by_id(&guid.provider, &guid.id, SearchKind::Movie)
                .await
            {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("Movie lookup by {} failed: {}", guid, e);
                    continue;
                }
            };

            let Some(movie) = hits.into_iter().next().and_then(|hit| hit.movie) else {
                debug!("No movie for {}", guid);
                continue;
            };

            if movie_matches(&movie, event) {
                debug!("Resolved movie via {}", guid);
                return Some(movie);
            }
            warn!(
                "Ignoring {} match '{}' ({:?}), event year is {:?}",
                guid, movie.title, movie.year, event.year
            );
        }
        None
    }

    async fn movie_by_title(&self, event: &PlaybackEvent) -> Option<Movie> {
        let title = event.title.as_deref()?;
        let year = event.year?;

        let hits = self
            .tracker
            .search_by_text(SearchKind::Movie, title)
            .await
            .map_err(|e| warn!("Movie search for '{}' failed: {}", title, e))
            .ok()?;

        hits.into_iter()
            .filter_map(|hit| hit.movie)
            .find(|movie| movie.year == Some(year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use scrobble_models::{EventKind, ExternalGuid};
    use scrobble_sources::trakt::api::{search_by_id_path, show_seasons_path};

    fn show_event(title: &str, year: u32, season: u32, episode: u32) -> PlaybackEvent {
        let mut event = PlaybackEvent::new(EventKind::Scrobble, "halkeye", LibrarySection::Show);
        event.grandparent_title = Some(title.to_string());
        event.year = Some(year);
        event.season = Some(season);
        event.episode = Some(episode);
        event
    }

    fn movie_event(title: &str, year: u32) -> PlaybackEvent {
        let mut event = PlaybackEvent::new(EventKind::Play, "halkeye", LibrarySection::Movie);
        event.title = Some(title.to_string());
        event.year = Some(year);
        event
    }

    fn severance_tracker() -> StubTracker {
        StubTracker::new()
            .with_text_hits(SearchKind::Show, "Severance", SEVERANCE_SHOW_SEARCH)
            .with_seasons(154997, SEVERANCE_SEASONS)
    }

    #[tokio::test]
    async fn test_episode_by_title_and_year() {
        let tracker = severance_tracker();
        let resolver = MediaResolver::new(&tracker);

        let episode = resolver
            .resolve_episode(&show_event("Severance", 2022, 2, 3))
            .await
            .unwrap();

        assert_eq!(episode.season, 2);
        assert_eq!(episode.number, 3);
        assert_eq!(episode.ids.trakt, Some(12103029));
        assert_eq!(episode.ids.tvdb, Some(10592760));
        assert_eq!(episode.ids.imdb.as_deref(), Some("tt15241840"));
        assert_eq!(episode.ids.tmdb, Some(5469117));
    }

    #[tokio::test]
    async fn test_episode_wrong_year_is_not_found() {
        let tracker = severance_tracker();
        let resolver = MediaResolver::new(&tracker);

        let result = resolver
            .resolve_episode(&show_event("Severance", 1999, 2, 3))
            .await;
        assert!(matches!(result, Err(ResolveError::NotFound(_))));
        assert!(!tracker.requests().contains(&show_seasons_path(154997)));
    }

    #[tokio::test]
    async fn test_episode_missing_from_season_is_not_found() {
        let tracker = severance_tracker();
        let resolver = MediaResolver::new(&tracker);

        let result = resolver
            .resolve_episode(&show_event("Severance", 2022, 2, 9))
            .await;
        assert!(matches!(result, Err(ResolveError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_ascii_title() {
        let tracker = StubTracker::new()
            .with_text_hits(SearchKind::Show, "37 secondes", THIRTY_SEVEN_SHOW_SEARCH)
            .with_seasons(232082, THIRTY_SEVEN_SEASONS);
        let resolver = MediaResolver::new(&tracker);

        let episode = resolver
            .resolve_episode(&show_event("37 secondes", 2025, 1, 5))
            .await
            .unwrap();
        assert_eq!(episode.ids.trakt, Some(11722092));
        assert_eq!(episode.ids.tmdb, Some(5322130));
    }

    #[tokio::test]
    async fn test_episode_guid_wins_over_title() {
        let tracker = StubTracker::new().with_id_hits(
            "tvdb",
            "10592760",
            SearchKind::Episode,
            SEVERANCE_EPISODE_HIT,
        );
        let resolver = MediaResolver::new(&tracker);

        // Localized title that a text search would never match
        let mut event = show_event("Separación", 2022, 2, 3);
        event.external_guids = vec![
            ExternalGuid::new("tvdb", "10592760"),
            ExternalGuid::new("tmdb", "5469117"),
        ];

        let episode = resolver.resolve_episode(&event).await.unwrap();
        assert_eq!(episode.ids.trakt, Some(12103029));
        assert_eq!(
            tracker.requests(),
            vec![search_by_id_path("tvdb", "10592760", SearchKind::Episode)]
        );
    }

    #[tokio::test]
    async fn test_guids_tried_in_order_past_failures() {
        let tracker = StubTracker::new()
            .failing(search_by_id_path("tvdb", "10592760", SearchKind::Episode))
            .with_id_hits("imdb", "tt15241840", SearchKind::Episode, SEVERANCE_EPISODE_HIT);
        let resolver = MediaResolver::new(&tracker);

        let mut event = show_event("Severance", 2022, 2, 3);
        event.external_guids = vec![
            ExternalGuid::new("tvdb", "10592760"),
            ExternalGuid::new("tmdb", "5469117"),
            ExternalGuid::new("imdb", "tt15241840"),
        ];

        let episode = resolver.resolve_episode(&event).await.unwrap();
        assert_eq!(episode.ids.trakt, Some(12103029));
        assert_eq!(tracker.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_guid_hit_for_other_episode_is_discarded() {
        let tracker = severance_tracker().with_id_hits(
            "tvdb",
            "10592760",
            SearchKind::Episode,
            SEVERANCE_EPISODE_HIT,
        );
        let resolver = MediaResolver::new(&tracker);

        let mut event = show_event("Severance", 2022, 1, 1);
        event.external_guids = vec![ExternalGuid::new("tvdb", "10592760")];

        let episode = resolver.resolve_episode(&event).await.unwrap();
        assert_eq!((episode.season, episode.number), (1, 1));
        assert_eq!(episode.ids.trakt, Some(5104211));
    }

    #[tokio::test]
    async fn test_movie_by_guid() {
        let tracker = StubTracker::new().with_id_hits("tmdb", "568", SearchKind::Movie, APOLLO_13_HIT);
        let resolver = MediaResolver::new(&tracker);

        let mut event = movie_event("Apollo 13", 1995);
        event.external_guids = vec![
            ExternalGuid::new("imdb", "tt0112384"),
            ExternalGuid::new("tmdb", "568"),
        ];

        let movie = resolver.resolve_movie(&event).await.unwrap();
        assert_eq!(movie.ids.trakt, Some(448));
        assert_eq!(movie.year, Some(1995));
        assert_eq!(tracker.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_movie_by_title_requires_exact_year() {
        let tracker = StubTracker::new().with_text_hits(SearchKind::Movie, "Apollo 13", APOLLO_13_HIT);
        let resolver = MediaResolver::new(&tracker);

        let movie = resolver
            .resolve_movie(&movie_event("Apollo 13", 1995))
            .await
            .unwrap();
        assert_eq!(movie.ids.trakt, Some(448));

        let result = resolver.resolve_movie(&movie_event("Apollo 13", 1994)).await;
        assert!(matches!(result, Err(ResolveError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_event_without_year_has_no_fallback() {
        let tracker = severance_tracker();
        let resolver = MediaResolver::new(&tracker);

        let mut event = show_event("Severance", 2022, 2, 3);
        event.year = None;

        assert!(matches!(
            resolver.resolve_episode(&event).await,
            Err(ResolveError::NotFound(_))
        ));
        assert!(tracker.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_section() {
        let tracker = StubTracker::new();
        let resolver = MediaResolver::new(&tracker);
        let event = PlaybackEvent::new(
            EventKind::Play,
            "halkeye",
            LibrarySection::Other("artist".to_string()),
        );

        assert!(matches!(
            resolver.resolve(&event).await,
            Err(ResolveError::Unsupported(section)) if section == "artist"
        ));
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&show_event("Severance", 2022, 2, 3)), "Severance S02E03 (2022)");
        assert_eq!(describe(&movie_event("Apollo 13", 1995)), "Apollo 13 (1995)");
    }
}
