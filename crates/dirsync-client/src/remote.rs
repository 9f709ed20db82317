//! Server operations as seen by the client

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use dirsync_core::{DeleteRequest, NormalizedPath, SyncItem};

use crate::{Error, Result};

/// How the server answered a mutating request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    /// 200: the change was applied
    Accepted,
    /// 400: the payload was structurally invalid
    Invalid(String),
    /// 422: the bytes did not match the declared hash, or a dedup source was
    /// missing
    Corrupt(String),
}

/// The four operations of the sync protocol.
#[async_trait]
pub trait SyncRemote: Send + Sync {
    /// Whether the server already holds content with this hash.
    async fn exists(&self, hash: &str) -> Result<bool>;

    async fn create(&self, path: &NormalizedPath, item: &SyncItem) -> Result<RemoteStatus>;

    async fn update(&self, path: &NormalizedPath, item: &SyncItem) -> Result<RemoteStatus>;

    async fn delete(&self, path: &NormalizedPath, request: DeleteRequest) -> Result<RemoteStatus>;
}

/// [`SyncRemote`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base: String,
}

impl HttpRemote {
    /// `server_url` is the server root, e.g. `http://127.0.0.1:5000`.
    pub fn new(server_url: &str) -> Self {
        Self {
            client: Client::new(),
            base: format!("{}/sync", server_url.trim_end_matches('/')),
        }
    }

    /// URL for a sync path, escaping each segment.
    pub fn item_url(&self, path: &NormalizedPath) -> String {
        let escaped: Vec<_> = path.segments().map(urlencoding::encode).collect();
        format!("{}/{}", self.base, escaped.join("/"))
    }

    fn exists_url(&self, hash: &str) -> String {
        format!("{}/exists/{}", self.base, urlencoding::encode(hash))
    }

    async fn classify(
        operation: &'static str,
        path: &NormalizedPath,
        response: Response,
    ) -> Result<RemoteStatus> {
        let status = response.status();
        match status {
            StatusCode::OK => Ok(RemoteStatus::Accepted),
            StatusCode::BAD_REQUEST => Ok(RemoteStatus::Invalid(error_message(response).await)),
            StatusCode::UNPROCESSABLE_ENTITY => {
                Ok(RemoteStatus::Corrupt(error_message(response).await))
            }
            other => Err(Error::ProtocolViolation {
                operation,
                target: path.as_str().to_string(),
                status: other.as_u16(),
            }),
        }
    }
}

/// Pull `error.message` out of an error body, falling back to the raw text.
async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(text)
}

#[async_trait]
impl SyncRemote for HttpRemote {
    async fn exists(&self, hash: &str) -> Result<bool> {
        let response = self.client.get(self.exists_url(hash)).send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NO_CONTENT => Ok(false),
            other => Err(Error::ProtocolViolation {
                operation: "exists",
                target: hash.to_string(),
                status: other.as_u16(),
            }),
        }
    }

    async fn create(&self, path: &NormalizedPath, item: &SyncItem) -> Result<RemoteStatus> {
        let response = self.client.post(self.item_url(path)).json(item).send().await?;
        Self::classify("create", path, response).await
    }

    async fn update(&self, path: &NormalizedPath, item: &SyncItem) -> Result<RemoteStatus> {
        let response = self.client.put(self.item_url(path)).json(item).send().await?;
        Self::classify("update", path, response).await
    }

    async fn delete(&self, path: &NormalizedPath, request: DeleteRequest) -> Result<RemoteStatus> {
        let response = self
            .client
            .delete(self.item_url(path))
            .json(&request)
            .send()
            .await?;
        Self::classify("delete", path, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://host:5000", "a.txt", "http://host:5000/sync/a.txt")]
    #[case("http://host:5000/", "docs/a.txt", "http://host:5000/sync/docs/a.txt")]
    #[case("http://host", "my docs/a#1.txt", "http://host/sync/my%20docs/a%231.txt")]
    #[case("http://host", "100%/?.txt", "http://host/sync/100%25/%3F.txt")]
    fn item_urls_escape_each_segment(
        #[case] base: &str,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        let remote = HttpRemote::new(base);
        assert_eq!(remote.item_url(&NormalizedPath::new(path)), expected);
    }

    #[test]
    fn exists_url_targets_hash() {
        let remote = HttpRemote::new("http://host");
        assert_eq!(remote.exists_url("abc"), "http://host/sync/exists/abc");
    }
}
