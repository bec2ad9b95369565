//! Loading of input sources from local files or HTTP(S) URLs.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, bail};
use tracing::debug;

/// GETs `url` and returns the response body, failing on non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("GET {url} returned status {status}");
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Returns `true` if `source` should be fetched over HTTP.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Loads a source from a local path or fetches it over HTTP.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if is_remote(source) {
        fetch_bytes(client, source).await?
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("Failed to read {source}"))?
    };
    debug!(bytes = bytes.len(), "Source loaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::{Request, Response};
    use std::env;
    use std::fs;

    struct StubClient {
        status: u16,
        body: &'static str,
    }

    #[async_trait]
    impl HttpClient for StubClient {
        async fn execute(&self, _req: Request) -> reqwest::Result<Response> {
            let resp = http::Response::builder()
                .status(self.status)
                .body(self.body)
                .unwrap();
            Ok(resp.into())
        }
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/baselines.csv"));
        assert!(is_remote("http://localhost:8080/periods.csv"));
        assert!(!is_remote("data/baselines.csv"));
        assert!(!is_remote("httpdata/baselines.csv"));
    }

    #[tokio::test]
    async fn test_load_local_source() {
        let path = format!("{}/bt_baseline_test_source.csv", env::temp_dir().display());
        fs::write(&path, "segment_id,corridor_id\n1,1\n").unwrap();

        let client = BasicClient::new().unwrap();
        let bytes = load_source(&client, &path).await.unwrap();
        assert_eq!(bytes, b"segment_id,corridor_id\n1,1\n");

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_missing_source_errors() {
        let client = BasicClient::new().unwrap();
        let err = load_source(&client, "/nonexistent/bt_baseline/none.csv")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[tokio::test]
    async fn test_fetch_error_status_fails() {
        let client = StubClient {
            status: 404,
            body: "not found",
        };
        let err = fetch_bytes(&client, "https://example.org/periods.csv")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_remote_source_returns_body() {
        let client = StubClient {
            status: 200,
            body: "segment_id,corridor_id\n1,1\n",
        };
        let bytes = load_source(&client, "https://example.org/bt_corridor_segments.csv")
            .await
            .unwrap();
        assert_eq!(bytes, b"segment_id,corridor_id\n1,1\n");
    }
}
