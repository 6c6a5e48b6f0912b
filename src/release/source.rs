use async_trait::async_trait;
use log::debug;

use super::types::Release;
use crate::error::SyncError;
use crate::http::HttpClient;

/// Something that can answer "what is the latest release at this endpoint".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest_release(&self, endpoint: &str) -> Result<Release, SyncError>;
}

/// Release source backed by the GitHub REST API (or anything serving the
/// same `releases/latest` document).
pub struct GitHubReleases {
    http: HttpClient,
}

impl GitHubReleases {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    #[tracing::instrument(skip(self))]
    async fn latest_release(&self, endpoint: &str) -> Result<Release, SyncError> {
        debug!("Fetching latest release from {}...", endpoint);

        let body = self
            .http
            .get_text(endpoint)
            .await
            .map_err(SyncError::network)?;

        let release: Release = serde_json::from_str(&body)
            .map_err(|e| SyncError::MalformedResponse(e.to_string()))?;

        debug!(
            "Release {} lists {} asset(s)",
            release.label(),
            release.assets.len()
        );
        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    fn source() -> GitHubReleases {
        GitHubReleases::new(HttpClient::new(Client::new()))
    }

    #[tokio::test]
    async fn test_latest_release_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/MaaXYZ/MaaFramework/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"tag_name": "v1", "assets": [
                    {"name": "MAA-win-x86_64-v1.zip", "browser_download_url": "https://x/a.zip", "size": 3}
                ]}"#,
            )
            .create_async()
            .await;

        let endpoint = format!("{}/repos/MaaXYZ/MaaFramework/releases/latest", server.url());
        let release = source().latest_release(&endpoint).await.unwrap();

        mock.assert_async().await;
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].name, "MAA-win-x86_64-v1.zip");
    }

    #[tokio::test]
    async fn test_latest_release_http_error_is_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/latest")
            .with_status(403)
            .create_async()
            .await;

        let err = source()
            .latest_release(&format!("{}/latest", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Network(_)));
        assert!(err.to_string().contains("forbidden"));
    }

    #[tokio::test]
    async fn test_latest_release_unreachable_is_network_error() {
        // Port 9 (discard) is not expected to be listening locally.
        let err = source()
            .latest_release("http://127.0.0.1:9/latest")
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Network(_)));
    }

    #[tokio::test]
    async fn test_latest_release_missing_assets_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/latest")
            .with_status(200)
            .with_body(r#"{"tag_name": "v1"}"#)
            .create_async()
            .await;

        let err = source()
            .latest_release(&format!("{}/latest", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_latest_release_invalid_json_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/latest")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let err = source()
            .latest_release(&format!("{}/latest", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::MalformedResponse(_)));
    }
}
