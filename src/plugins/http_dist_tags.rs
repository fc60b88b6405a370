//! Dist-tag lookups against the registry's HTTP metadata endpoint
//!
//! Avoids spawning `npm info` for every verification query.

use crate::core::error::PublishError;
use crate::core::traits::DistTags;
use std::time::Duration;

/// Client for `GET <registry>/-/package/<name>/dist-tags`
#[derive(Debug, Clone)]
pub struct HttpDistTagClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDistTagClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, PublishError> {
        Self::with_builder(reqwest::Client::builder(), base_url, timeout)
    }

    fn with_builder(
        builder: reqwest::ClientBuilder,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, PublishError> {
        let mut builder = builder.user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PublishError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint URL for `package`; the scope separator is percent-encoded
    pub fn dist_tags_url(&self, package: &str) -> String {
        format!(
            "{}/-/package/{}/dist-tags",
            self.base_url,
            package.replace('/', "%2f")
        )
    }

    pub async fn fetch(&self, package: &str) -> Result<DistTags, PublishError> {
        let url = self.dist_tags_url(package);
        let query_error = |message: String| PublishError::RegistryQuery {
            package: package.to_string(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| query_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(query_error(format!("GET {} returned HTTP {}", url, response.status())));
        }

        response
            .json::<DistTags>()
            .await
            .map_err(|e| query_error(format!("invalid dist-tags response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response; the handle yields the request head
    async fn serve_once(status: &str, body: &str) -> (SocketAddr, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (addr, handle)
    }

    fn local_client(addr: SocketAddr) -> HttpDistTagClient {
        let builder = reqwest::Client::builder().no_proxy();
        HttpDistTagClient::with_builder(builder, format!("http://{}", addr), None).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_parses_dist_tags() {
        let (addr, server) =
            serve_once("200 OK", r#"{"latest":"18.2.0","next":"18.3.0-rc.0"}"#).await;
        let client = local_client(addr);

        let tags = client.fetch("@scope/pkg").await.unwrap();
        assert_eq!(tags.get("latest"), Some("18.2.0"));
        assert_eq!(tags.get("next"), Some("18.3.0-rc.0"));

        let request = server.await.unwrap();
        assert!(
            request
                .to_ascii_lowercase()
                .starts_with("get /-/package/@scope%2fpkg/dist-tags http/1.1"),
            "{request}"
        );
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_query_error() {
        let (addr, server) = serve_once("404 Not Found", r#"{"error":"Not found"}"#).await;
        let client = local_client(addr);

        let err = client.fetch("react").await.unwrap_err();
        match err {
            PublishError::RegistryQuery { package, message } => {
                assert_eq!(package, "react");
                assert!(message.contains("404"), "{message}");
            }
            other => panic!("expected registry query error, got {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_invalid_body_is_query_error() {
        let (addr, server) = serve_once("200 OK", "<html>maintenance</html>").await;
        let client = local_client(addr);

        let err = client.fetch("react").await.unwrap_err();
        match err {
            PublishError::RegistryQuery { message, .. } => {
                assert!(message.contains("invalid dist-tags response"), "{message}");
            }
            other => panic!("expected registry query error, got {other}"),
        }
        server.await.unwrap();
    }

    #[test]
    fn test_url_for_plain_package() {
        let client = HttpDistTagClient::new("https://registry.npmjs.org/", None).unwrap();
        assert_eq!(
            client.dist_tags_url("react"),
            "https://registry.npmjs.org/-/package/react/dist-tags"
        );
    }

    #[test]
    fn test_url_for_scoped_package() {
        let client = HttpDistTagClient::new("https://npm.example.com", None).unwrap();
        assert_eq!(
            client.dist_tags_url("@scope/pkg"),
            "https://npm.example.com/-/package/@scope%2fpkg/dist-tags"
        );
    }
}
