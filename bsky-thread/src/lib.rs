//! Flattens a post thread (ancestors above a focal post, a reply tree below
//! it) into the single list a scrolling view renders.
//!
//! Every top-level reply is kept, but beneath each one only the first reply
//! at each level is followed. Other branches are dropped so the output stays
//! one line of conversation per top-level reply.

use bsky_msg::{PostView, ThreadNode, ThreadViewPost};
use log::{debug, trace};
use serde::Serialize;
use thiserror::Error as ThisError;

mod lexicon;
pub use lexicon::{AppBskyLexicon, Lexicon};

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Post not found")]
    NotFound,
    #[error("Thread node failed validation: {uri}")]
    Integrity { uri: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ancestor,
    Focal,
    Reply,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatEntry<P> {
    pub post: P,
    pub role: Role,
    /// Only ever set on the focal entry, when the raw node has a parent link.
    pub has_parent: bool,
    pub has_reply: bool,
}

impl<P> FlatEntry<P> {
    fn ancestor(post: P) -> Self {
        // an ancestor always has the reply leading back down to the focal post
        Self {
            post,
            role: Role::Ancestor,
            has_parent: false,
            has_reply: true,
        }
    }

    fn reply(post: P, has_reply: bool) -> Self {
        Self {
            post,
            role: Role::Reply,
            has_parent: false,
            has_reply,
        }
    }

    pub fn is_focal(&self) -> bool {
        self.role == Role::Focal
    }

    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> FlatEntry<Q> {
        FlatEntry {
            post: f(self.post),
            role: self.role,
            has_parent: self.has_parent,
            has_reply: self.has_reply,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatThread<P> {
    pub entries: Vec<FlatEntry<P>>,
    /// Position of the focal entry, which is also the number of ancestors.
    pub anchor_index: usize,
}

impl<P> FlatThread<P> {
    pub fn focal(&self) -> Option<&FlatEntry<P>> {
        self.entries.get(self.anchor_index)
    }

    pub fn ancestors(&self) -> &[FlatEntry<P>] {
        &self.entries[..self.anchor_index.min(self.entries.len())]
    }

    /// Whether the row at `index` continues the conversation from the row
    /// above it.
    pub fn is_continuation(&self, index: usize) -> bool {
        index
            .checked_sub(1)
            .and_then(|above| self.entries.get(above))
            .map_or(false, |entry| entry.has_reply)
    }
}

impl<'a, P: Clone> FlatThread<&'a P> {
    pub fn into_owned(self) -> FlatThread<P> {
        FlatThread {
            entries: self
                .entries
                .into_iter()
                .map(|entry| entry.map(Clone::clone))
                .collect(),
            anchor_index: self.anchor_index,
        }
    }
}

pub fn flatten(thread: &ThreadNode) -> Result<FlatThread<&PostView>, Error> {
    flatten_with(&AppBskyLexicon, thread)
}

pub fn flatten_with<'a, L>(
    lexicon: &L,
    thread: &'a ThreadNode,
) -> Result<FlatThread<&'a PostView>, Error>
where
    L: Lexicon + ?Sized,
{
    let focal = lexicon.thread_view_post(thread).ok_or(Error::NotFound)?;
    check(lexicon, focal)?;

    let mut entries = ancestors(lexicon, focal)?;
    let anchor_index = entries.len();

    entries.push(FlatEntry {
        post: &focal.post,
        role: Role::Focal,
        has_parent: focal.parent.is_some(),
        has_reply: false,
    });

    append_replies(lexicon, focal, &mut entries)?;

    trace!(
        "Flattened {} into {} entries, anchor at {}",
        focal.post.uri,
        entries.len(),
        anchor_index
    );

    Ok(FlatThread {
        entries,
        anchor_index,
    })
}

fn check<L>(lexicon: &L, view: &ThreadViewPost) -> Result<(), Error>
where
    L: Lexicon + ?Sized,
{
    if lexicon.validate(view) {
        Ok(())
    } else {
        Err(Error::Integrity {
            uri: view.post.uri.clone(),
        })
    }
}

// Oldest first.
fn ancestors<'a, L>(
    lexicon: &L,
    focal: &'a ThreadViewPost,
) -> Result<Vec<FlatEntry<&'a PostView>>, Error>
where
    L: Lexicon + ?Sized,
{
    let mut ancestors = Vec::new();
    let mut current = focal;

    while let Some(parent) = current.parent() {
        let parent = match lexicon.thread_view_post(parent) {
            Some(parent) => parent,
            None => {
                debug!("Ancestors end at a placeholder above {}", current.post.uri);
                break;
            }
        };
        check(lexicon, parent)?;

        ancestors.push(FlatEntry::ancestor(&parent.post));
        current = parent;
    }

    ancestors.reverse();
    Ok(ancestors)
}

fn append_replies<'a, L>(
    lexicon: &L,
    focal: &'a ThreadViewPost,
    entries: &mut Vec<FlatEntry<&'a PostView>>,
) -> Result<(), Error>
where
    L: Lexicon + ?Sized,
{
    for reply in focal.replies() {
        let reply = match lexicon.thread_view_post(reply) {
            Some(reply) => reply,
            None => {
                debug!("Skipping placeholder reply to {}", focal.post.uri);
                continue;
            }
        };
        check(lexicon, reply)?;
        entries.push(FlatEntry::reply(&reply.post, reply.has_replies()));

        let mut next = reply.first_reply();
        while let Some(child) = next {
            let child = match lexicon.thread_view_post(child) {
                Some(child) => child,
                None => {
                    debug!("Reply chain under {} ends at a placeholder", reply.post.uri);
                    break;
                }
            };
            check(lexicon, child)?;
            entries.push(FlatEntry::reply(&child.post, child.has_replies()));

            next = child.first_reply();
        }
    }

    Ok(())
}
