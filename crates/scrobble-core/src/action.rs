use scrobble_models::{EventKind, ScrobbleAction};

/// Percentage sent with a `media.scrobble`, the point Plex considers an item watched
pub const WATCHED_PROGRESS: u8 = 90;

/// What a playback event asks the tracking service to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrobbleIntent {
    pub action: ScrobbleAction,
    pub progress: u8,
}

/// Map an event kind to its tracking call; `None` means the event is ignored
pub fn action_for(kind: &EventKind) -> Option<ScrobbleIntent> {
    let (action, progress) = match kind {
        EventKind::Play | EventKind::Resume => (ScrobbleAction::Start, 0),
        EventKind::Pause | EventKind::Stop => (ScrobbleAction::Stop, 0),
        EventKind::Scrobble => (ScrobbleAction::Stop, WATCHED_PROGRESS),
        EventKind::Other(_) => return None,
    };
    Some(ScrobbleIntent { action, progress })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_table() {
        let cases = [
            ("media.play", Some((ScrobbleAction::Start, 0))),
            ("media.pause", Some((ScrobbleAction::Stop, 0))),
            ("media.resume", Some((ScrobbleAction::Start, 0))),
            ("media.stop", Some((ScrobbleAction::Stop, 0))),
            ("media.scrobble", Some((ScrobbleAction::Stop, 90))),
            ("media.rate", None),
            ("library.new", None),
        ];

        for (event, expected) in cases {
            let intent = action_for(&EventKind::from(event));
            assert_eq!(
                intent.map(|i| (i.action, i.progress)),
                expected,
                "event {}",
                event
            );
        }
    }
}
