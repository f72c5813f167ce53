use thiserror::Error;

/// Failure talking to a remote service
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SourceError {
    /// The service answered and refused the request (4xx), as opposed to a
    /// transport failure or a server-side error.
    pub fn is_rejection(&self) -> bool {
        matches!(self, SourceError::Status { status, .. } if (400..500).contains(status))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16) -> SourceError {
        SourceError::Status {
            endpoint: "/oauth/token".to_string(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_rejection_is_client_error_status() {
        assert!(status_error(401).is_rejection());
        assert!(status_error(400).is_rejection());
        assert!(!status_error(503).is_rejection());
        assert_eq!(status_error(401).status(), Some(401));
    }

    #[test]
    fn test_decode_error_is_not_rejection() {
        let source = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = SourceError::Decode {
            endpoint: "/search/show".to_string(),
            source,
        };
        assert!(!err.is_rejection());
        assert_eq!(err.status(), None);
    }
}
