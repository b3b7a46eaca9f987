// ── Reactive alert streams ──
//
// Subscription types for consuming alert changes from the AlertStore.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Alert;

pub use filter::AlertFilter;

/// A subscription to the alert feed.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via [`changed`](Self::changed) or by converting to a
/// `Stream`. Snapshots arrive in commit order; each committed mutation
/// is observed at most once.
pub struct AlertStream {
    current: Arc<Vec<Arc<Alert>>>,
    receiver: watch::Receiver<Arc<Vec<Arc<Alert>>>>,
}

impl AlertStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Arc<Alert>>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time.
    pub fn current(&self) -> &Arc<Vec<Arc<Alert>>> {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<Vec<Arc<Alert>>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<Alert>>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> AlertWatchStream {
        AlertWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields a new snapshot each time the alert collection is mutated.
pub struct AlertWatchStream {
    inner: WatchStream<Arc<Vec<Arc<Alert>>>>,
}

impl Stream for AlertWatchStream {
    type Item = Arc<Vec<Arc<Alert>>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream is Unpin when the inner type is Unpin, and
        // Arc<Vec<Arc<Alert>>> always is.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
