use async_trait::async_trait;
use bsky_msg::{PostView, ThreadNode};
use bsky_ref::{ActorRef, AtUri, Did, Handle, RefError};
use bsky_thread::{flatten, FlatThread};
use log::{debug, info};
use thiserror::Error as ThisError;

mod config;
pub mod page;
pub mod scroll;
mod xrpc;

pub use config::{Config, DEFAULT_DEPTH, DEFAULT_PARENT_HEIGHT, DEFAULT_SERVICE};
pub use page::{PageStatus, PostPage};
pub use scroll::{schedule_scroll, ScrollTarget, ViewLifetime};
pub use xrpc::XrpcClient;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Request failed, cause: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{error} ({status}): {message}")]
    Xrpc {
        status: u16,
        error: String,
        message: String,
    },
    #[error("Invalid reference, cause: {0}")]
    Ref(#[from] RefError),
    #[error("Invalid service url, cause: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Thread(#[from] bsky_thread::Error),
}

#[async_trait]
pub trait HandleResolver: Send + Sync {
    async fn resolve_handle(&self, handle: &Handle) -> Result<Did, Error>;
}

#[async_trait]
pub trait ThreadFetcher: Send + Sync {
    async fn get_post_thread(&self, uri: &AtUri) -> Result<ThreadNode, Error>;
}

/// Resolves `actor` (unless it is already a DID), fetches the thread around
/// post `rkey`, and flattens it.
///
/// Nothing is cached, every call goes back to the network.
pub async fn load_thread<R, F>(
    resolver: &R,
    fetcher: &F,
    actor: &ActorRef,
    rkey: &str,
) -> Result<FlatThread<PostView>, Error>
where
    R: HandleResolver + ?Sized,
    F: ThreadFetcher + ?Sized,
{
    let did = match actor {
        ActorRef::Did(did) => did.clone(),
        ActorRef::Handle(handle) => {
            debug!("Resolving handle {}", handle);
            resolver.resolve_handle(handle).await?
        }
    };
    let uri = AtUri::post(&did, rkey)?;

    info!("Loading thread {}", uri);
    let thread = fetcher.get_post_thread(&uri).await?;
    let flat = flatten(&thread)?;

    Ok(flat.into_owned())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use bsky_msg::{NotFoundPost, ProfileViewBasic, ThreadViewPost};
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    pub const DID: &str = "did:plc:ewvi7nxzyoun6zhxrhs64oiz";
    pub const HANDLE: &str = "alice.test";

    pub fn node(
        rkey: &str,
        parent: Option<ThreadNode>,
        replies: Vec<ThreadNode>,
    ) -> ThreadNode {
        ThreadNode::Post(ThreadViewPost {
            post: PostView {
                uri: format!("at://{}/app.bsky.feed.post/{}", DID, rkey),
                cid: format!("bafy{}", rkey),
                author: ProfileViewBasic {
                    did: DID.to_string(),
                    handle: HANDLE.to_string(),
                    display_name: Some("Alice".to_string()),
                    avatar: None,
                },
                record: json!({ "$type": "app.bsky.feed.post", "text": rkey }),
                embed: None,
                reply_count: Some(replies.len() as u64),
                repost_count: None,
                like_count: None,
                quote_count: None,
                indexed_at: "2023-04-12T04:53:57.057Z".to_string(),
            },
            parent: parent.map(Box::new),
            replies: Some(replies),
        })
    }

    pub fn not_found(rkey: &str) -> ThreadNode {
        ThreadNode::NotFound(NotFoundPost {
            uri: format!("at://{}/app.bsky.feed.post/{}", DID, rkey),
            not_found: true,
        })
    }

    /// In-memory stand-in for the AppView.
    pub struct FakeAppView {
        pub thread: Mutex<ThreadNode>,
        pub resolves: AtomicUsize,
        pub fetched: Mutex<Vec<String>>,
    }

    impl FakeAppView {
        pub fn new(thread: ThreadNode) -> Self {
            Self {
                thread: Mutex::new(thread),
                resolves: AtomicUsize::new(0),
                fetched: Mutex::new(Vec::new()),
            }
        }

        pub fn resolves(&self) -> usize {
            self.resolves.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HandleResolver for FakeAppView {
        async fn resolve_handle(&self, handle: &Handle) -> Result<Did, Error> {
            self.resolves.fetch_add(1, Ordering::SeqCst);
            if handle.as_str() == HANDLE {
                Ok(Did::from_string(DID.to_string())?)
            } else {
                Err(Error::NotFound(format!("Unable to resolve handle {}", handle)))
            }
        }
    }

    #[async_trait]
    impl ThreadFetcher for FakeAppView {
        async fn get_post_thread(&self, uri: &AtUri) -> Result<ThreadNode, Error> {
            self.fetched.lock().unwrap().push(uri.to_string());
            Ok(self.thread.lock().unwrap().clone())
        }
    }
}
