use serde::Deserialize;
use serde_json::Value;

use crate::error::{FilemoonError, Result};

/// Form body for `POST /remote/add`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RemoteUploadInput<'a> {
    pub key: &'a str,
    pub url: &'a str,
}

/// Wrapper for remote-upload responses.
///
/// `result` is kept untyped: depending on the request it is an object with
/// `filecode`, an object with `url`, or a bare string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteUploadResponse {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
}

/// What a remote upload produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// Embed URL of the mirrored copy.
    Mirrored(String),
    /// The API accepted the call but gave back nothing usable.
    Unmirrored,
}

impl MirrorOutcome {
    pub fn embed_url(&self) -> Option<&str> {
        match self {
            MirrorOutcome::Mirrored(url) => Some(url),
            MirrorOutcome::Unmirrored => None,
        }
    }
}

impl RemoteUploadResponse {
    /// Status code carried in the body, as a number or a numeric string.
    pub fn api_status(&self) -> Option<u16> {
        match self.status.as_ref()? {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Turn a body-level failure (HTTP 2xx with a non-200 `status`) into an
    /// `Api` error. A body without a status is accepted.
    pub fn check(self) -> Result<Self> {
        match self.api_status() {
            Some(status) if status != 200 => Err(FilemoonError::Api {
                status,
                message: self.msg.unwrap_or_default(),
            }),
            _ => Ok(self),
        }
    }

    /// Map the response onto an embed URL.
    ///
    /// Preference: `result.filecode` (turned into `{embed_base}/{code}`),
    /// then `result.url`, then `result` itself when it is a string.
    pub fn into_outcome(self, embed_base: &str) -> MirrorOutcome {
        let Some(result) = self.result else {
            return MirrorOutcome::Unmirrored;
        };

        if let Some(code) = non_empty_str(result.get("filecode")) {
            return MirrorOutcome::Mirrored(format!(
                "{}/{}",
                embed_base.trim_end_matches('/'),
                code
            ));
        }
        if let Some(url) = non_empty_str(result.get("url")) {
            return MirrorOutcome::Mirrored(url.to_string());
        }
        match non_empty_str(Some(&result)) {
            Some(url) => MirrorOutcome::Mirrored(url.to_string()),
            None => MirrorOutcome::Unmirrored,
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMBED: &str = "https://filemoon.sx/e";

    fn outcome(json: &str) -> MirrorOutcome {
        serde_json::from_str::<RemoteUploadResponse>(json)
            .unwrap()
            .into_outcome(EMBED)
    }

    #[test]
    fn filecode_becomes_embed_url() {
        assert_eq!(
            outcome(r#"{"status":200,"msg":"OK","result":{"filecode":"abc123"}}"#),
            MirrorOutcome::Mirrored("https://filemoon.sx/e/abc123".into())
        );
    }

    #[test]
    fn url_field_is_used_without_filecode() {
        assert_eq!(
            outcome(r#"{"result":{"url":"https://filemoon.sx/e/zzz"}}"#),
            MirrorOutcome::Mirrored("https://filemoon.sx/e/zzz".into())
        );
    }

    #[test]
    fn bare_string_result_is_used() {
        assert_eq!(
            outcome(r#"{"result":"https://cdn.example/v"}"#),
            MirrorOutcome::Mirrored("https://cdn.example/v".into())
        );
    }

    fn response(json: &str) -> RemoteUploadResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn body_status_is_read_as_number_or_string() {
        assert_eq!(response(r#"{"status":200}"#).api_status(), Some(200));
        assert_eq!(response(r#"{"status":"403"}"#).api_status(), Some(403));
        assert_eq!(response(r#"{"status":true}"#).api_status(), None);
        assert_eq!(response(r#"{}"#).api_status(), None);
    }

    #[test]
    fn non_200_body_status_is_an_api_error() {
        let err = response(r#"{"status":403,"msg":"Wrong key"}"#)
            .check()
            .unwrap_err();
        match err {
            FilemoonError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Wrong key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert!(response(r#"{"status":200,"result":{"filecode":"a"}}"#).check().is_ok());
        assert!(response(r#"{"result":"x"}"#).check().is_ok());
    }

    #[test]
    fn missing_or_odd_shapes_are_unmirrored() {
        assert_eq!(outcome(r#"{}"#), MirrorOutcome::Unmirrored);
        assert_eq!(outcome(r#"{"result":null}"#), MirrorOutcome::Unmirrored);
        assert_eq!(outcome(r#"{"result":{"filecode":""}}"#), MirrorOutcome::Unmirrored);
        assert_eq!(outcome(r#"{"result":{"filecode":42}}"#), MirrorOutcome::Unmirrored);
        assert_eq!(outcome(r#"{"result":[1,2]}"#), MirrorOutcome::Unmirrored);
        assert_eq!(outcome(r#"{"status":403,"msg":"Wrong key"}"#), MirrorOutcome::Unmirrored);
    }
}
