use async_trait::async_trait;
use bsky_msg::{GetPostThreadResponse, ResolveHandleResponse, ThreadNode};
use bsky_ref::{AtUri, Did, Handle};
use log::trace;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use crate::{Config, Error, HandleResolver, ThreadFetcher};

const USER_AGENT: &str = concat!("bsky-thread/", env!("CARGO_PKG_VERSION"));

/// Unauthenticated client for the public AppView queries.
#[derive(Clone, Debug)]
pub struct XrpcClient {
    http: Client,
    config: Config,
}

#[derive(Debug, Default, Deserialize)]
struct XrpcErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl XrpcClient {
    pub fn new(config: Config) -> Result<Self, Error> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn endpoint(&self, nsid: &str) -> Result<Url, Error> {
        Ok(self.config.service.join(&format!("xrpc/{}", nsid))?)
    }

    async fn query<T: DeserializeOwned>(
        &self,
        nsid: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.endpoint(nsid)?;
        trace!("GET {} {:?}", url, params);

        let response = self.http.get(url).query(params).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.bytes().await?;
        Err(xrpc_error(status, &body))
    }
}

fn xrpc_error(status: StatusCode, body: &[u8]) -> Error {
    let body: XrpcErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let message = body
        .message
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

    if status == StatusCode::NOT_FOUND || body.error.as_deref() == Some("NotFound") {
        return Error::NotFound(message);
    }

    Error::Xrpc {
        status: status.as_u16(),
        error: body.error.unwrap_or_else(|| "Unknown".to_string()),
        message,
    }
}

#[async_trait]
impl HandleResolver for XrpcClient {
    async fn resolve_handle(&self, handle: &Handle) -> Result<Did, Error> {
        let result: Result<ResolveHandleResponse, Error> = self
            .query(
                "com.atproto.identity.resolveHandle",
                &[("handle", handle.to_string())],
            )
            .await;

        match result {
            Ok(response) => Ok(response.did),
            // an unresolvable handle comes back as a plain InvalidRequest
            Err(Error::Xrpc { status: 400, message, .. }) => Err(Error::NotFound(message)),
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl ThreadFetcher for XrpcClient {
    async fn get_post_thread(&self, uri: &AtUri) -> Result<ThreadNode, Error> {
        let response: GetPostThreadResponse = self
            .query(
                "app.bsky.feed.getPostThread",
                &[
                    ("uri", uri.to_string()),
                    ("depth", self.config.depth.to_string()),
                    ("parentHeight", self.config.parent_height.to_string()),
                ],
            )
            .await?;

        Ok(response.thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let client = XrpcClient::new(Config::default()).unwrap();
        assert_eq!(
            client
                .endpoint("app.bsky.feed.getPostThread")
                .unwrap()
                .as_str(),
            "https://public.api.bsky.app/xrpc/app.bsky.feed.getPostThread"
        );

        let config = Config::default()
            .with_service("http://localhost:2584")
            .unwrap();
        let client = XrpcClient::new(config).unwrap();
        assert_eq!(
            client
                .endpoint("com.atproto.identity.resolveHandle")
                .unwrap()
                .as_str(),
            "http://localhost:2584/xrpc/com.atproto.identity.resolveHandle"
        );
    }

    #[test]
    fn test_not_found_error() {
        let error = xrpc_error(
            StatusCode::BAD_REQUEST,
            br#"{"error":"NotFound","message":"Post not found: at://did:plc:abc/app.bsky.feed.post/xyz"}"#,
        );
        assert!(matches!(
            error,
            Error::NotFound(message) if message.starts_with("Post not found")
        ));

        let error = xrpc_error(StatusCode::NOT_FOUND, b"<html>nope</html>");
        assert!(matches!(error, Error::NotFound(message) if message == "Not Found"));
    }

    #[test]
    fn test_other_errors() {
        let error = xrpc_error(
            StatusCode::BAD_REQUEST,
            br#"{"error":"InvalidRequest","message":"Unable to resolve handle"}"#,
        );
        match error {
            Error::Xrpc {
                status,
                error,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(error, "InvalidRequest");
                assert_eq!(message, "Unable to resolve handle");
            }
            other => panic!("unexpected {:?}", other),
        }

        let error = xrpc_error(StatusCode::BAD_GATEWAY, b"");
        assert_eq!(error.to_string(), "Unknown (502): Bad Gateway");
    }
}
