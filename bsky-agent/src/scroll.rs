//! One-shot "scroll the focal post into view" after a thread first loads.
//!
//! The scroll runs on a timer, so it can outlive the view it was meant for.
//! It is tied to a [`ViewLifetime`] and holds only a weak reference to its
//! target; if either is gone when the timer fires, nothing happens.

use log::debug;
use std::{sync::Weak, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::sleep};

pub trait ScrollTarget: Send + Sync {
    fn scroll_to_index(&self, index: usize, animated: bool);
}

/// Owned by a view. Closing or dropping it cancels the scrolls scheduled
/// against it.
#[derive(Debug)]
pub struct ViewLifetime {
    closed_tx: watch::Sender<bool>,
}

impl ViewLifetime {
    pub fn new() -> Self {
        let (closed_tx, _closed_rx) = watch::channel(false);
        Self { closed_tx }
    }

    pub fn close(&self) {
        self.closed_tx.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed_tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.closed_tx.subscribe()
    }
}

impl Default for ViewLifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewLifetime {
    fn drop(&mut self) {
        self.closed_tx.send_replace(true);
    }
}

async fn closed(mut closed_rx: watch::Receiver<bool>) {
    loop {
        if *closed_rx.borrow() {
            return;
        }
        // sender dropped
        if closed_rx.changed().await.is_err() {
            return;
        }
    }
}

/// Scrolls `target` to `index` after `delay`. Resolves to whether the scroll
/// actually happened.
pub fn schedule_scroll<T>(
    lifetime: &ViewLifetime,
    target: Weak<T>,
    index: usize,
    delay: Duration,
) -> JoinHandle<bool>
where
    T: ScrollTarget + ?Sized + 'static,
{
    let closed_rx = lifetime.subscribe();

    tokio::spawn(async move {
        tokio::select! {
            _ = closed(closed_rx.clone()) => {
                debug!("View closed before scrolling to {}", index);
                return false;
            }
            _ = sleep(delay) => {}
        }

        if *closed_rx.borrow() {
            return false;
        }
        match target.upgrade() {
            Some(target) => {
                target.scroll_to_index(index, true);
                true
            }
            None => {
                debug!("Scroll target gone before scrolling to {}", index);
                false
            }
        }
    })
}
