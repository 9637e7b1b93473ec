//! Request parameter normalization
//!
//! Both routes reduce their input to one flat [`RequestParams`] record before
//! the dispatcher sees it:
//!
//! - `GET /api`: query string only.
//! - `POST /api` with `application/json`: JSON object body only.
//! - `POST /api` with `text/plain`: query string, with `content` taken from
//!   the raw body.
//! - any other `POST`: query string overlaid by url-encoded form fields.

use serde_json::Value;

use crate::error::{Error, Result};

/// Which part of the request carried the parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transport {
    /// Query string of a `GET`
    #[default]
    Query,
    /// Body of a `POST`
    Body,
}

/// The flat, per-request parameter record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub token: Option<String>,
    pub action: Option<String>,
    pub path: Option<String>,
    pub content: Option<String>,
    pub command: Option<String>,
    pub transport: Transport,
}

/// Body encodings recognized on `POST`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Text,
    Form,
    Other,
}

impl BodyKind {
    fn from_content_type(content_type: Option<&str>) -> Self {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match mime.as_str() {
            "application/json" => BodyKind::Json,
            "text/plain" => BodyKind::Text,
            "application/x-www-form-urlencoded" => BodyKind::Form,
            _ => BodyKind::Other,
        }
    }
}

impl RequestParams {
    /// Parameters of a `GET` request
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = RequestParams::default();
        params.merge_form(query.unwrap_or_default().as_bytes(), false);
        params
    }

    /// Parameters of a `POST` request, chosen by content type
    pub fn from_body(content_type: Option<&str>, query: Option<&str>, body: &[u8]) -> Result<Self> {
        let mut params = match BodyKind::from_content_type(content_type) {
            BodyKind::Json => Self::from_json(body)?,
            BodyKind::Text => {
                let text = std::str::from_utf8(body).map_err(|_| {
                    Error::InvalidInput("Request body is not valid UTF-8".to_string())
                })?;
                let mut params = Self::from_query(query);
                params.content = Some(text.to_string());
                params
            }
            BodyKind::Form => {
                let mut params = Self::from_query(query);
                params.merge_form(body, true);
                params
            }
            BodyKind::Other => Self::from_query(query),
        };

        params.transport = Transport::Body;
        Ok(params)
    }

    fn from_json(body: &[u8]) -> Result<Self> {
        let mut params = RequestParams::default();
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(params);
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::InvalidInput(format!("Invalid JSON body: {}", e)))?;

        if let Value::Object(map) = value {
            params.token = map.get("token").and_then(string_field);
            params.path = map.get("path").and_then(string_field);
            params.content = map.get("content").and_then(string_field);
            params.command = map.get("command").and_then(string_field);
            // A non-string action is still an action, just not a valid one
            params.action = map.get("action").and_then(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            });
        }

        Ok(params)
    }

    /// Merge url-encoded pairs; `overwrite` lets later sources win
    fn merge_form(&mut self, encoded: &[u8], overwrite: bool) {
        for (key, value) in url::form_urlencoded::parse(encoded) {
            let slot = match &*key {
                "token" => &mut self.token,
                "action" => &mut self.action,
                "path" => &mut self.path,
                "content" => &mut self.content,
                "command" => &mut self.command,
                _ => continue,
            };
            if overwrite || slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
    }
}

fn string_field(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query() {
        let params = RequestParams::from_query(Some(
            "token=s3cret&action=read_file&path=a%2Fb.txt&extra=1",
        ));
        assert_eq!(params.token.as_deref(), Some("s3cret"));
        assert_eq!(params.action.as_deref(), Some("read_file"));
        assert_eq!(params.path.as_deref(), Some("a/b.txt"));
        assert!(params.content.is_none());
        assert_eq!(params.transport, Transport::Query);
    }

    #[test]
    fn test_from_query_decodes_plus_and_keeps_first() {
        let params = RequestParams::from_query(Some("command=echo+hi&command=rm"));
        assert_eq!(params.command.as_deref(), Some("echo hi"));
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(RequestParams::from_query(None), RequestParams::default());
    }

    #[test]
    fn test_json_body_ignores_query() {
        let body = br#"{"token":"t","action":"write_file","path":"x.txt","content":"hello"}"#;
        let params = RequestParams::from_body(
            Some("application/json; charset=utf-8"),
            Some("token=other&path=y.txt"),
            body,
        )
        .unwrap();

        assert_eq!(params.token.as_deref(), Some("t"));
        assert_eq!(params.path.as_deref(), Some("x.txt"));
        assert_eq!(params.content.as_deref(), Some("hello"));
        assert_eq!(params.transport, Transport::Body);
    }

    #[test]
    fn test_json_non_string_fields() {
        let body = br#"{"token":"t","action":42,"path":["a"],"content":null}"#;
        let params = RequestParams::from_body(Some("application/json"), None, body).unwrap();

        assert_eq!(params.action.as_deref(), Some("42"));
        assert!(params.path.is_none());
        assert!(params.content.is_none());
    }

    #[test]
    fn test_malformed_json_is_error() {
        let result = RequestParams::from_body(Some("application/json"), None, b"{oops");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_empty_json_body() {
        let params = RequestParams::from_body(Some("application/json"), None, b"").unwrap();
        assert!(params.token.is_none());
    }

    #[test]
    fn test_text_body_becomes_content() {
        let params = RequestParams::from_body(
            Some("text/plain"),
            Some("token=t&action=write_file&path=notes.txt&content=ignored"),
            b"raw text body",
        )
        .unwrap();

        assert_eq!(params.action.as_deref(), Some("write_file"));
        assert_eq!(params.content.as_deref(), Some("raw text body"));
    }

    #[test]
    fn test_text_body_must_be_utf8() {
        let result = RequestParams::from_body(Some("text/plain"), None, &[0xff, 0xfe]);
        assert!(result.is_err());
    }

    #[test]
    fn test_form_body_overrides_query() {
        let params = RequestParams::from_body(
            Some("application/x-www-form-urlencoded"),
            Some("token=t&path=from-query.txt"),
            b"path=from-body.txt&content=a%20b",
        )
        .unwrap();

        assert_eq!(params.token.as_deref(), Some("t"));
        assert_eq!(params.path.as_deref(), Some("from-body.txt"));
        assert_eq!(params.content.as_deref(), Some("a b"));
    }

    #[test]
    fn test_unknown_content_type_uses_query() {
        let params = RequestParams::from_body(
            Some("application/octet-stream"),
            Some("token=t&action=list_dir"),
            b"path=ignored",
        )
        .unwrap();

        assert_eq!(params.action.as_deref(), Some("list_dir"));
        assert!(params.path.is_none());
        assert_eq!(params.transport, Transport::Body);
    }
}
