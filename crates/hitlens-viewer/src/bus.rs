//! Publish/subscribe channel for citation activations.
//!
//! Owned by the case-review context and handed to both sides: analysis panels
//! publish through it, record viewers subscribe to it. Neither side knows
//! about the other.
//!
//! Every subscriber has its own unbounded queue, so a slow viewer never loses
//! an activation and sees them in publish order.

use std::sync::{Arc, Mutex, PoisonError};

use hitlens_core::{CitationEvent, CitationSink};
use tokio::sync::mpsc;
use tracing::debug;

/// Cloneable handle to a citation channel.
///
/// Subscriptions end once every handle has been dropped.
#[derive(Debug, Clone, Default)]
pub struct CitationBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<CitationEvent>>>>,
}

impl CitationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to every live subscriber.
    ///
    /// Returns the number of subscribers reached; zero is not an error.
    /// Subscribers whose receiving end was dropped are forgotten here.
    pub fn publish(&self, event: CitationEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event).is_ok());
        if subscribers.is_empty() {
            debug!(?event, "citation published with no subscribers");
        }
        subscribers.len()
    }

    pub fn subscribe(&self) -> CitationSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        CitationSubscription { rx }
    }
}

impl CitationSink for CitationBus {
    fn emit(&self, event: CitationEvent) {
        self.publish(event);
    }
}

/// Receiving end of a [`CitationBus`]. Sees every event published after it
/// was created, in publish order.
#[derive(Debug)]
pub struct CitationSubscription {
    rx: mpsc::UnboundedReceiver<CitationEvent>,
}

impl CitationSubscription {
    /// Wait for the next event. `None` once every bus handle is dropped and
    /// the queue is drained.
    pub async fn recv(&mut self) -> Option<CitationEvent> {
        self.rx.recv().await
    }

    /// Next already-published event, without waiting.
    pub fn try_recv(&mut self) -> Option<CitationEvent> {
        self.rx.try_recv().ok()
    }
}
