use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilemoonError>;

#[derive(Debug, Error)]
pub enum FilemoonError {
    /// The upload request never got an answer.
    #[error("Remote upload request failed: {0}")]
    Network(String),

    /// Refused, either by HTTP status or by the `status` in the body.
    #[error("Remote upload refused (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unreadable remote upload response: {0}")]
    Parse(String),

    #[error("Remote upload needs FILEMOON_API_KEY, which is not set")]
    MissingKey,
}

impl From<reqwest::Error> for FilemoonError {
    fn from(err: reqwest::Error) -> Self {
        FilemoonError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for FilemoonError {
    fn from(err: serde_json::Error) -> Self {
        FilemoonError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_remote_upload() {
        let refused = FilemoonError::Api {
            status: 403,
            message: "Wrong key".into(),
        };
        assert_eq!(
            refused.to_string(),
            "Remote upload refused (status 403): Wrong key"
        );
        assert!(FilemoonError::MissingKey
            .to_string()
            .contains("FILEMOON_API_KEY"));
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let err: FilemoonError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, FilemoonError::Parse(_)));
    }
}
