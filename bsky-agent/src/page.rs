use bsky_msg::PostView;
use bsky_ref::ActorRef;
use bsky_thread::FlatThread;
use log::{info, warn};
use std::{
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::task::JoinHandle;

use crate::{
    load_thread,
    scroll::{schedule_scroll, ScrollTarget, ViewLifetime},
    HandleResolver, ThreadFetcher,
};

pub const TITLE: &str = "Post";

const FALLBACK_MESSAGE: &str = "An error occurred";

#[derive(Clone, Debug, PartialEq)]
pub enum PageStatus {
    Loading,
    Error(String),
    Success(FlatThread<PostView>),
}

/// State behind the screen for a single post: `/profile/{actor}/post/{rkey}`.
///
/// Each `load` refetches and reflattens from scratch. The focal post is
/// scrolled into view once, after the first successful load.
pub struct PostPage<C: ?Sized, T: ?Sized> {
    client: Arc<C>,
    actor: ActorRef,
    rkey: String,
    target: Weak<T>,
    lifetime: ViewLifetime,
    scroll_delay: Duration,
    status: PageStatus,
    has_scrolled: bool,
}

impl<C, T> PostPage<C, T>
where
    C: HandleResolver + ThreadFetcher + ?Sized,
    T: ScrollTarget + ?Sized + 'static,
{
    pub fn new(
        client: Arc<C>,
        actor: ActorRef,
        rkey: String,
        target: Weak<T>,
        scroll_delay: Duration,
    ) -> Self {
        Self {
            client,
            actor,
            rkey,
            target,
            lifetime: ViewLifetime::new(),
            scroll_delay,
            status: PageStatus::Loading,
            has_scrolled: false,
        }
    }

    pub fn title(&self) -> &'static str {
        TITLE
    }

    pub fn status(&self) -> &PageStatus {
        &self.status
    }

    pub fn thread(&self) -> Option<&FlatThread<PostView>> {
        match &self.status {
            PageStatus::Success(thread) => Some(thread),
            _ => None,
        }
    }

    /// Returns the pending scroll, if this load scheduled one.
    pub async fn load(&mut self) -> Option<JoinHandle<bool>> {
        let result = load_thread(
            self.client.as_ref(),
            self.client.as_ref(),
            &self.actor,
            &self.rkey,
        )
        .await;

        self.status = match result {
            Ok(thread) => {
                info!(
                    "Loaded {} entries for {}/{}",
                    thread.entries.len(),
                    self.actor,
                    self.rkey
                );
                PageStatus::Success(thread)
            }
            Err(error) => {
                warn!("Failed to load {}/{}: {}", self.actor, self.rkey, error);
                let message = error.to_string();
                if message.is_empty() {
                    PageStatus::Error(FALLBACK_MESSAGE.to_string())
                } else {
                    PageStatus::Error(message)
                }
            }
        };

        let anchor_index = self.thread()?.anchor_index;
        if self.has_scrolled {
            return None;
        }
        self.has_scrolled = true;

        Some(schedule_scroll(
            &self.lifetime,
            self.target.clone(),
            anchor_index,
            self.scroll_delay,
        ))
    }

    /// Pull-to-refresh. Replaces the previous result, never merges with it.
    pub async fn refresh(&mut self) -> Option<JoinHandle<bool>> {
        self.load().await
    }

    /// Tears the page down, cancelling any scroll that hasn't fired yet.
    pub fn close(&self) {
        self.lifetime.close();
    }
}
