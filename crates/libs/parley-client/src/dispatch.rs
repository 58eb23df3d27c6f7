//! Push-event fan-out.
//!
//! Every document the read loop does not hand to a pending request is decoded
//! against the push-event category and published to all subscribers in the
//! order it was read. Delivery goes through a bounded broadcast channel: a
//! subscriber that falls more than `event_capacity` notifications behind loses
//! the oldest ones and is told how many it missed. Publishing never waits on
//! subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use parley_schema::{Decode, DecodeError, EngineError, Envelope, JsonValue};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// What a subscriber receives.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification<U> {
    Event(U),
    /// An engine error that answered no pending request.
    EngineError(EngineError),
    /// A push document that could not be decoded.
    Undecodable { discriminant: Option<String>, error: DecodeError },
    /// The subscriber fell behind and this many notifications were lost.
    Dropped(u64),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub published: u64,
    pub undecodable: u64,
}

pub struct Dispatcher<U> {
    sender: Mutex<Option<broadcast::Sender<Notification<U>>>>,
    published: AtomicU64,
    undecodable: AtomicU64,
}

impl<U: Decode + Clone + Send + 'static> Dispatcher<U> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
            published: AtomicU64::new(0),
            undecodable: AtomicU64::new(0),
        }
    }

    /// Attaches a subscriber. It sees notifications published from now on.
    pub fn subscribe(&self) -> Subscription<U> {
        let receiver = match self.lock_sender().as_ref() {
            Some(sender) => sender.subscribe(),
            None => broadcast::channel(1).1,
        };
        Subscription { receiver, dropped: 0 }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_sender().as_ref().map_or(0, broadcast::Sender::receiver_count)
    }

    /// Decodes one unclaimed document and publishes the result.
    pub fn dispatch(&self, document: &JsonValue) {
        let envelope = Envelope::inspect(document);
        let decoded = if envelope.is_error() {
            EngineError::decode(document).map(Notification::EngineError)
        } else {
            U::decode(document).map(Notification::Event)
        };
        let notification = match decoded {
            Ok(notification) => notification,
            Err(error) => {
                log::warn!("dispatch: undecodable push {:?}: {error}", envelope.discriminant);
                Notification::Undecodable {
                    discriminant: envelope.discriminant.map(str::to_owned),
                    error,
                }
            }
        };
        self.publish(notification);
    }

    /// Publishes a frame that was not even valid JSON.
    pub fn malformed(&self, error: DecodeError) {
        log::warn!("dispatch: malformed frame: {error}");
        self.publish(Notification::Undecodable { discriminant: None, error });
    }

    fn publish(&self, notification: Notification<U>) {
        if matches!(notification, Notification::Undecodable { .. }) {
            self.undecodable.fetch_add(1, Ordering::Relaxed);
        }
        self.published.fetch_add(1, Ordering::Relaxed);
        let guard = self.lock_sender();
        let Some(sender) = guard.as_ref() else {
            log::debug!("dispatch: closed, dropping notification");
            return;
        };
        if sender.send(notification).is_err() {
            log::trace!("dispatch: no subscribers");
        }
    }

    /// Ends every subscription once its buffered notifications are read.
    pub fn close(&self) {
        if self.lock_sender().take().is_some() {
            log::debug!("dispatch: closed");
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            published: self.published.load(Ordering::Relaxed),
            undecodable: self.undecodable.load(Ordering::Relaxed),
        }
    }

    fn lock_sender(&self) -> MutexGuard<'_, Option<broadcast::Sender<Notification<U>>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One subscriber's view of the notification stream.
pub struct Subscription<U> {
    receiver: broadcast::Receiver<Notification<U>>,
    dropped: u64,
}

impl<U: Clone> Subscription<U> {
    /// Waits for the next notification. `None` once the client has shut down
    /// and everything buffered has been read.
    pub async fn recv(&mut self) -> Option<Notification<U>> {
        match self.receiver.recv().await {
            Ok(notification) => Some(notification),
            Err(RecvError::Lagged(missed)) => Some(self.lagged(missed)),
            Err(RecvError::Closed) => None,
        }
    }

    /// Returns the next buffered notification without waiting.
    pub fn try_recv(&mut self) -> Option<Notification<U>> {
        match self.receiver.try_recv() {
            Ok(notification) => Some(notification),
            Err(TryRecvError::Lagged(missed)) => Some(self.lagged(missed)),
            Err(TryRecvError::Empty | TryRecvError::Closed) => None,
        }
    }

    /// Total notifications this subscriber has missed.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn lagged(&mut self, missed: u64) -> Notification<U> {
        self.dropped += missed;
        log::warn!("dispatch: subscriber lagged, {missed} notifications dropped");
        Notification::Dropped(missed)
    }
}
