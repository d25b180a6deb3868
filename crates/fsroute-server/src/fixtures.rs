// File: src/fixtures.rs
// Purpose: Turns route files into canned HTTP responses

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use fsroute::{HandlerExport, HandlerSource, RouteFile};
use serde::Deserialize;
use tower_http::services::ServeDir;

const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

pub type FixtureExport = HandlerExport<Fixture, ServeDir>;

/// A fixed response served for one route
#[derive(Debug, Clone)]
pub struct Fixture {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Bytes,
}

impl Fixture {
    fn ok(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: HeaderValue::from_static(content_type),
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

impl IntoResponse for Fixture {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, self.content_type);
        for (name, value) in self.headers {
            headers.insert(name, value);
        }
        response
    }
}

/// Response described by a `.toml` route file
///
/// ```toml
/// status = 201
/// headers = { x-request-id = "fixture" }
/// json = { id = 7, name = "Ada" }
/// ```
///
/// A manifest with `serve_dir` is a router: the directory (relative to the
/// manifest) is mounted at the route's pattern for every method.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResponseManifest {
    status: Option<u16>,
    content_type: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    body: Option<String>,
    json: Option<toml::Value>,
    serve_dir: Option<String>,
}

impl ResponseManifest {
    fn is_response_empty(&self) -> bool {
        self.status.is_none()
            && self.content_type.is_none()
            && self.headers.is_empty()
            && self.body.is_none()
            && self.json.is_none()
    }

    fn into_export(self, base_dir: &Path) -> Result<FixtureExport> {
        if let Some(serve_dir) = &self.serve_dir {
            if !self.is_response_empty() {
                bail!("`serve_dir` cannot be combined with response fields");
            }
            let dir = base_dir.join(serve_dir);
            if !dir.is_dir() {
                bail!("`serve_dir` is not a directory: {:?}", dir);
            }
            return Ok(HandlerExport::Router(ServeDir::new(dir)));
        }

        if self.is_response_empty() {
            return Ok(HandlerExport::Missing);
        }

        let (default_type, body) = match (self.body, self.json) {
            (Some(_), Some(_)) => bail!("`body` and `json` are mutually exclusive"),
            (Some(body), None) => (TEXT, Bytes::from(body)),
            (None, Some(json)) => {
                let json = serde_json::to_value(json).context("Failed to convert `json` table")?;
                (JSON, Bytes::from(serde_json::to_vec(&json)?))
            }
            (None, None) => (TEXT, Bytes::new()),
        };

        let status = StatusCode::from_u16(self.status.unwrap_or(200))
            .with_context(|| format!("Invalid status code: {:?}", self.status))?;

        let content_type = match self.content_type {
            Some(value) => HeaderValue::from_str(&value)
                .with_context(|| format!("Invalid content type: {}", value))?,
            None => HeaderValue::from_static(default_type),
        };

        let headers = self
            .headers
            .into_iter()
            .map(|(name, value)| {
                let header = HeaderName::from_bytes(name.as_bytes())
                    .with_context(|| format!("Invalid header name: {}", name))?;
                let value = HeaderValue::from_str(&value)
                    .with_context(|| format!("Invalid value for header {}", name))?;
                Ok((header, value))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(HandlerExport::Handler(Fixture {
            status,
            content_type,
            headers,
            body,
        }))
    }
}

/// Reads route files from disk as response fixtures
///
/// - `.json` is served as `application/json` (must parse)
/// - `.html` and `.txt` are served as-is
/// - `.toml` is a [`ResponseManifest`]
///
/// A blank file exports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureSource;

impl FixtureSource {
    pub const EXTENSIONS: [&'static str; 4] = ["json", "txt", "html", "toml"];

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HandlerSource for FixtureSource {
    type Handler = Fixture;
    type Router = ServeDir;

    async fn load(&self, file: &RouteFile) -> Result<FixtureExport> {
        let content = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("Failed to read fixture: {:?}", file.path))?;

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(HandlerExport::Missing);
        }

        let extension = file.extension().map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => {
                serde_json::from_slice::<serde_json::Value>(&content)
                    .with_context(|| format!("Invalid JSON in {:?}", file.path))?;
                Ok(HandlerExport::Handler(Fixture::ok(JSON, content)))
            }
            Some("html") => Ok(HandlerExport::Handler(Fixture::ok(HTML, content))),
            Some("toml") => {
                let text = String::from_utf8(content)
                    .with_context(|| format!("Manifest is not UTF-8: {:?}", file.path))?;
                let manifest: ResponseManifest = toml::from_str(&text)
                    .with_context(|| format!("Failed to parse manifest: {:?}", file.path))?;
                let base_dir = file.path.parent().unwrap_or_else(|| Path::new("."));
                manifest.into_export(base_dir)
            }
            _ => Ok(HandlerExport::Handler(Fixture::ok(TEXT, content))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    async fn load(root: &Path, relative: &str, content: &str) -> Result<FixtureExport> {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        FixtureSource::new().load(&RouteFile::new(root, path)).await
    }

    fn handler(export: FixtureExport) -> Fixture {
        match export {
            HandlerExport::Handler(fixture) => fixture,
            other => panic!("expected a handler, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_json_fixture() {
        let temp_dir = TempDir::new().unwrap();
        let fixture = handler(load(temp_dir.path(), "users/GET.[id].json", r#"{"id": 1}"#).await.unwrap());

        assert_eq!(fixture.status, StatusCode::OK);
        assert_eq!(fixture.content_type, JSON);
        assert_eq!(fixture.body, Bytes::from_static(br#"{"id": 1}"#));
    }

    #[tokio::test]
    async fn test_invalid_json_fails_to_load() {
        let temp_dir = TempDir::new().unwrap();
        let err = load(temp_dir.path(), "GET.index.json", "{ nope").await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn test_blank_file_is_missing() {
        let temp_dir = TempDir::new().unwrap();
        let export = load(temp_dir.path(), "GET.index.txt", "  \n").await.unwrap();
        assert!(export.is_missing());
    }

    #[tokio::test]
    async fn test_html_and_text_content_types() {
        let temp_dir = TempDir::new().unwrap();
        let html = handler(load(temp_dir.path(), "GET.page.html", "<h1>hi</h1>").await.unwrap());
        let text = handler(load(temp_dir.path(), "GET.note.txt", "hi").await.unwrap());
        assert_eq!(html.content_type, HTML);
        assert_eq!(text.content_type, TEXT);
    }

    #[tokio::test]
    async fn test_manifest_with_json_and_headers() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = r#"
            status = 201
            json = { id = 7 }

            [headers]
            x-request-id = "fixture"
        "#;
        let fixture = handler(load(temp_dir.path(), "POST.index.toml", manifest).await.unwrap());

        assert_eq!(fixture.status, StatusCode::CREATED);
        assert_eq!(fixture.content_type, JSON);
        assert_eq!(fixture.body, Bytes::from_static(br#"{"id":7}"#));
        assert_eq!(fixture.headers.len(), 1);
        assert_eq!(fixture.headers[0].0.as_str(), "x-request-id");
    }

    #[tokio::test]
    async fn test_manifest_rejects_body_and_json() {
        let temp_dir = TempDir::new().unwrap();
        let err = load(temp_dir.path(), "GET.index.toml", "body = \"a\"\njson = { a = 1 }")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[tokio::test]
    async fn test_manifest_rejects_unknown_fields() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load(temp_dir.path(), "GET.index.toml", "stauts = 200").await.is_err());
    }

    #[tokio::test]
    async fn test_comment_only_manifest_is_missing() {
        let temp_dir = TempDir::new().unwrap();
        let export = load(temp_dir.path(), "GET.index.toml", "# nothing yet").await.unwrap();
        assert!(export.is_missing());
    }

    #[tokio::test]
    async fn test_serve_dir_manifest_is_a_router() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("static/public")).unwrap();

        let export = load(temp_dir.path(), "static/GET.index.toml", "serve_dir = \"public\"")
            .await
            .unwrap();
        assert!(matches!(export, HandlerExport::Router(_)));

        let err = load(temp_dir.path(), "other/GET.index.toml", "serve_dir = \"nowhere\"")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
