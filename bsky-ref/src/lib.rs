// https://atproto.com/specs/did
// https://atproto.com/specs/handle
// https://atproto.com/specs/at-uri-scheme

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};
use thiserror::Error as ThisError;
use urlencoding::encode;

pub const POST_COLLECTION: &str = "app.bsky.feed.post";

const MAX_HANDLE_LENGTH: usize = 253;
const MAX_DID_LENGTH: usize = 2048;

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefError {
    #[error("Does not match as {ref_type}: {input}")]
    BadFormat {
        ref_type: &'static str,
        input: String,
    },
    #[error("{ref_type} is too long: {length} > {max}")]
    TooLong {
        ref_type: &'static str,
        length: usize,
        max: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    // From string that starts with did:
    pub fn from_string(string: String) -> Result<Self, RefError> {
        if string.len() > MAX_DID_LENGTH {
            return Err(RefError::TooLong {
                ref_type: "Did",
                length: string.len(),
                max: MAX_DID_LENGTH,
            });
        }
        if !Self::is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Did",
                input: string,
            })
        } else {
            Ok(Self(string))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn method(&self) -> &str {
        let caps = Self::single_regex().captures(self.0.as_str());
        caps.and_then(|caps| caps.name("method"))
            .map(|method| method.as_str())
            .unwrap_or_default()
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(r"^did:(?P<method>[a-z]+):[a-zA-Z0-9._:%-]*[a-zA-Z0-9._-]$").unwrap();
        }
        &RE
    }

    pub fn is_match(string: &str) -> bool {
        let regex = Self::single_regex();
        regex.is_match(string)
    }

    pub fn to_page_url(&self) -> String {
        format!("/profile/{}", encode(self.0.as_str()))
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for Did {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Did::from_string(value)
    }
}

impl From<Did> for String {
    fn from(value: Did) -> String {
        value.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    // Handles are case-insensitive, normalized to lowercase
    pub fn from_string(string: String) -> Result<Self, RefError> {
        if string.len() > MAX_HANDLE_LENGTH {
            return Err(RefError::TooLong {
                ref_type: "Handle",
                length: string.len(),
                max: MAX_HANDLE_LENGTH,
            });
        }
        if !Self::is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Handle",
                input: string,
            })
        } else {
            Ok(Self(string.to_ascii_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = Regex::new(
                r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$"
            )
            .unwrap();
        }
        &RE
    }

    pub fn is_match(string: &str) -> bool {
        let regex = Self::single_regex();
        regex.is_match(string)
    }

    pub fn to_page_url(&self) -> String {
        format!("/profile/{}", encode(self.0.as_str()))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for Handle {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Handle::from_string(value)
    }
}

impl From<Handle> for String {
    fn from(value: Handle) -> String {
        value.0
    }
}

/// Who a profile route points at: either already a DID, or a handle still
/// waiting to be resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActorRef {
    Did(Did),
    Handle(Handle),
}

impl ActorRef {
    pub fn from_string(value: String) -> Result<Self, RefError> {
        if value.starts_with("did:") {
            Ok(ActorRef::Did(value.try_into()?))
        } else if Handle::is_match(value.as_str()) {
            Ok(ActorRef::Handle(value.try_into()?))
        } else {
            Err(RefError::BadFormat {
                ref_type: "Actor",
                input: value,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActorRef::Did(did) => did.as_str(),
            ActorRef::Handle(handle) => handle.as_str(),
        }
    }

    pub fn to_page_url(&self) -> String {
        match self {
            ActorRef::Did(did) => did.to_page_url(),
            ActorRef::Handle(handle) => handle.to_page_url(),
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ActorRef {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ActorRef::from_string(value)
    }
}

impl From<ActorRef> for String {
    fn from(value: ActorRef) -> String {
        match value {
            ActorRef::Did(did) => did.into(),
            ActorRef::Handle(handle) => handle.into(),
        }
    }
}

/// `at://{authority}/{collection}/{rkey}`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct AtUri {
    authority: ActorRef,
    collection: String,
    rkey: String,
}

impl AtUri {
    pub fn from_string(string: String) -> Result<Self, RefError> {
        let caps = match Self::single_regex().captures(string.as_str()) {
            Some(caps) => caps,
            None => {
                return Err(RefError::BadFormat {
                    ref_type: "AtUri",
                    input: string,
                })
            }
        };
        let authority = ActorRef::from_string(caps["authority"].to_string())?;
        let collection = caps["collection"].to_string();
        let rkey = caps["rkey"].to_string();
        if rkey == "." || rkey == ".." {
            return Err(RefError::BadFormat {
                ref_type: "AtUri",
                input: string,
            });
        }

        Ok(Self {
            authority,
            collection,
            rkey,
        })
    }

    /// Uri of a post record in a repo.
    pub fn post(did: &Did, rkey: &str) -> Result<Self, RefError> {
        Self::from_string(format!("at://{}/{}/{}", did, POST_COLLECTION, rkey))
    }

    pub fn authority(&self) -> &ActorRef {
        &self.authority
    }

    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }

    pub fn rkey(&self) -> &str {
        self.rkey.as_str()
    }

    pub fn is_post(&self) -> bool {
        self.collection == POST_COLLECTION
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = Regex::new(
                r"^at://(?P<authority>[^/?#]+)/(?P<collection>[a-zA-Z0-9.-]+)/(?P<rkey>[a-zA-Z0-9._~:-]{1,512})$"
            )
            .unwrap();
        }
        &RE
    }

    pub fn is_match(string: &str) -> bool {
        let regex = Self::single_regex();
        regex.is_match(string)
    }

    pub fn to_page_url(&self) -> String {
        format!(
            "{}/post/{}",
            self.authority.to_page_url(),
            encode(self.rkey.as_str())
        )
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at://{}/{}/{}", self.authority, self.collection, self.rkey)
    }
}

impl TryFrom<String> for AtUri {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AtUri::from_string(value)
    }
}

impl From<AtUri> for String {
    fn from(value: AtUri) -> String {
        value.to_string()
    }
}
