use bsky_msg::{ThreadNode, ThreadViewPost};
use log::warn;

/// The two checks run on every node the flattener visits: a cheap shape check
/// that narrows a node to a full post, and a deeper structural validation of
/// that post.
pub trait Lexicon {
    /// `None` for placeholders (not found, blocked, unknown).
    fn thread_view_post<'a>(&self, node: &'a ThreadNode) -> Option<&'a ThreadViewPost>;

    fn validate(&self, view: &ThreadViewPost) -> bool;
}

/// Checks against the `app.bsky.feed.defs` lexicon.
#[derive(Clone, Copy, Debug, Default)]
pub struct AppBskyLexicon;

impl Lexicon for AppBskyLexicon {
    fn thread_view_post<'a>(&self, node: &'a ThreadNode) -> Option<&'a ThreadViewPost> {
        node.as_thread_view_post()
    }

    fn validate(&self, view: &ThreadViewPost) -> bool {
        match view.validate() {
            Ok(()) => true,
            Err(error) => {
                warn!("Thread view post {} is invalid: {}", view.post.uri, error);
                false
            }
        }
    }
}
