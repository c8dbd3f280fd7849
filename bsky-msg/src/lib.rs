// https://github.com/bluesky-social/atproto/blob/main/lexicons/app/bsky/feed/defs.json

use bsky_ref::{AtUri, Did, Handle, RefError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError};
use thiserror::Error as ThisError;

pub const POST_RECORD_TYPE: &str = "app.bsky.feed.post";

#[derive(Debug, ThisError)]
pub enum ValidationError {
    #[error("Invalid post uri, cause: {0}")]
    Uri(#[source] RefError),
    #[error("Uri does not point at a post: {uri}")]
    NotAPost { uri: String },
    #[error("Post has an empty cid: {uri}")]
    EmptyCid { uri: String },
    #[error("Invalid author did, cause: {0}")]
    AuthorDid(#[source] RefError),
    #[error("Invalid author handle, cause: {0}")]
    AuthorHandle(#[source] RefError),
    #[error("Invalid post record, cause: {0}")]
    Record(#[source] serde_json::Error),
    #[error("Record is {found}, expected app.bsky.feed.post")]
    RecordType { found: String },
}

/// Response body of `com.atproto.identity.resolveHandle`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResolveHandleResponse {
    pub did: Did,
}

/// Response body of `app.bsky.feed.getPostThread`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GetPostThreadResponse {
    pub thread: ThreadNode,
}

/// One slot in a thread. Anything that isn't a full `threadViewPost` is a
/// placeholder that stands in for a post we can't see.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "$type")]
pub enum ThreadNode {
    #[serde(rename = "app.bsky.feed.defs#threadViewPost")]
    Post(ThreadViewPost),
    #[serde(rename = "app.bsky.feed.defs#notFoundPost")]
    NotFound(NotFoundPost),
    #[serde(rename = "app.bsky.feed.defs#blockedPost")]
    Blocked(BlockedPost),
    #[serde(other)]
    Unknown,
}

impl ThreadNode {
    pub fn as_thread_view_post(&self) -> Option<&ThreadViewPost> {
        match self {
            ThreadNode::Post(view) => Some(view),
            _ => None,
        }
    }

    pub fn is_thread_view_post(&self) -> bool {
        self.as_thread_view_post().is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ThreadViewPost {
    pub post: PostView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<ThreadNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<ThreadNode>>,
}

impl ThreadViewPost {
    pub fn parent(&self) -> Option<&ThreadNode> {
        self.parent.as_deref()
    }

    pub fn replies(&self) -> &[ThreadNode] {
        self.replies.as_deref().unwrap_or_default()
    }

    pub fn first_reply(&self) -> Option<&ThreadNode> {
        self.replies().first()
    }

    pub fn has_replies(&self) -> bool {
        !self.replies().is_empty()
    }

    /// Checks this node's own post, not its parent or replies.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.post.validate()
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: ProfileViewBasic,
    pub record: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Value>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub reply_count: Option<u64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub repost_count: Option<u64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub quote_count: Option<u64>,
    pub indexed_at: String,
}

impl PostView {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let uri = AtUri::from_string(self.uri.clone()).map_err(ValidationError::Uri)?;
        if !uri.is_post() {
            return Err(ValidationError::NotAPost {
                uri: self.uri.clone(),
            });
        }
        if self.cid.is_empty() {
            return Err(ValidationError::EmptyCid {
                uri: self.uri.clone(),
            });
        }
        self.author.validate()?;
        self.post_record()?;

        Ok(())
    }

    pub fn post_record(&self) -> Result<PostRecord, ValidationError> {
        let record: PostRecord =
            serde_json::from_value(self.record.clone()).map_err(ValidationError::Record)?;
        if record.record_type != POST_RECORD_TYPE {
            return Err(ValidationError::RecordType {
                found: record.record_type,
            });
        }
        Ok(record)
    }

    pub fn text(&self) -> Option<&str> {
        self.record.get("text").and_then(Value::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileViewBasic {
    pub did: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileViewBasic {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Did::from_string(self.did.clone()).map_err(ValidationError::AuthorDid)?;
        Handle::from_string(self.handle.clone()).map_err(ValidationError::AuthorHandle)?;
        Ok(())
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub text: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub langs: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundPost {
    pub uri: String,
    #[serde(default)]
    pub not_found: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BlockedPost {
    pub uri: String,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<BlockedAuthor>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BlockedAuthor {
    pub did: String,
}
