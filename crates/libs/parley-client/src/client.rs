use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use parley_schema::{
    CorrelationToken, Decode, DecodeError, DecodeErrorKind, EngineError, Envelope, JsonValue,
    Request, Update,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::config::{ClientConfig, ConfigError};
use crate::dispatch::{DispatchStats, Dispatcher, Subscription};
use crate::error::{ClientError, TransportError};
use crate::pending::{Claim, Completion, PendingTable};
use crate::token::TokenGenerator;
use crate::transport::{split_lines, FrameReader, FrameWriter};

/// Correlation client over one duplex channel to the engine.
///
/// Any number of tasks may `call` concurrently through clones of the same
/// client. One background task owns the read side of the channel: it matches
/// replies to pending calls by correlation token and hands everything else to
/// the [`Dispatcher`]. `U` is the push-event category.
///
/// Writes go through a single writer task, so a caller that gives up on a
/// `call` never leaves half a frame on the channel.
///
/// Dropping the last clone stops the read loop, as does [`Client::close`].
pub struct Client<U = Update> {
    shared: Arc<Shared<U>>,
    _stop_on_drop: Arc<DropGuard>,
}

impl<U> Clone for Client<U> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), _stop_on_drop: Arc::clone(&self._stop_on_drop) }
    }
}

struct Shared<U> {
    config: ClientConfig,
    tokens: TokenGenerator,
    pending: Mutex<PendingTable>,
    outbound: mpsc::Sender<Outbound>,
    dispatcher: Dispatcher<U>,
    cancel: CancellationToken,
    done: CancellationToken,
}

/// Frames queued for the writer task but not yet written.
const OUTBOUND_QUEUE: usize = 64;

struct Outbound {
    frame: String,
    written: oneshot::Sender<Result<(), TransportError>>,
}

impl<U: Decode + Clone + Send + 'static> Client<U> {
    /// Starts the read loop and the writer task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<R, W>(reader: R, writer: W, config: ClientConfig) -> Result<Self, ConfigError>
    where
        R: FrameReader + 'static,
        W: FrameWriter + 'static,
    {
        config.validate()?;
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        let (outbound, queued) = mpsc::channel(OUTBOUND_QUEUE);
        let shared = Arc::new(Shared {
            tokens: TokenGenerator::new(config.token_prefix.as_str()),
            pending: Mutex::new(PendingTable::new(config.abandoned_token_retention)),
            outbound,
            dispatcher: Dispatcher::new(config.event_capacity),
            cancel: cancel.clone(),
            done: done.clone(),
            config,
        });

        log::debug!("client: starting read loop");
        tokio::spawn(write_loop(Box::new(writer), queued, done));
        tokio::spawn(read_loop(Box::new(reader), Arc::clone(&shared)));

        Ok(Self { shared, _stop_on_drop: Arc::new(cancel.drop_guard()) })
    }

    /// Runs the client over a byte stream carrying newline-delimited JSON.
    pub fn over_stream<S>(stream: S, config: ClientConfig) -> Result<Self, ConfigError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = split_lines(stream, config.max_frame_bytes);
        Self::spawn(reader, writer, config)
    }

    /// Sends `request` and waits up to `timeout` for its reply, decoded as `R`.
    ///
    /// `timeout` covers both writing the request and waiting for the reply.
    /// An `error` reply becomes [`ClientError::Engine`]. On timeout, or if the
    /// returned future is dropped first, the request is abandoned and a late
    /// reply is discarded. Nothing is retried.
    pub async fn call<R>(&self, request: Request, timeout: Duration) -> Result<R, ClientError>
    where
        R: Decode + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let completion: Completion = Box::new(move |outcome: Result<JsonValue, ClientError>| {
            let result =
                outcome.and_then(|document| R::decode(&document).map_err(ClientError::from));
            let _ = tx.send(result);
        });

        let token = self.shared.lock_pending().register(&self.shared.tokens, completion)?;
        let guard = PendingGuard { shared: &self.shared, token: Some(token.clone()) };

        let discriminant = request.discriminant().to_owned();
        let document = request.into_document(Some(&token));
        log::trace!("client: >> {discriminant} [{token}]");

        let shared = &self.shared;
        let exchange = async move {
            shared.write(&document).await?;
            let reply = rx.await;
            guard.disarm();
            reply.unwrap_or(Err(ClientError::ChannelClosed))
        };
        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                log::debug!("client: {discriminant} [{token}] timed out after {timeout:?}");
                Err(ClientError::Timeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// [`Client::call`] with the configured default timeout.
    pub async fn request<R>(&self, request: Request) -> Result<R, ClientError>
    where
        R: Decode + Send + 'static,
    {
        self.call(request, self.shared.config.default_timeout()).await
    }

    /// Writes `request` without a correlation token. Any reply the engine
    /// produces arrives as a push notification.
    pub async fn send(&self, request: Request) -> Result<(), ClientError> {
        if self.is_closed() {
            return Err(ClientError::ChannelClosed);
        }
        log::trace!("client: >> {} [untokened]", request.discriminant());
        self.shared.write(&request.into_document(None)).await
    }

    pub fn subscribe(&self) -> Subscription<U> {
        self.shared.dispatcher.subscribe()
    }

    pub fn unsubscribe(&self, subscription: Subscription<U>) {
        drop(subscription);
        log::debug!(
            "client: subscription detached, {} remaining",
            self.shared.dispatcher.subscriber_count()
        );
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.shared.dispatcher.stats()
    }

    pub fn pending_count(&self) -> usize {
        self.shared.lock_pending().len()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    pub fn is_closed(&self) -> bool {
        self.shared.done.is_cancelled()
    }

    /// Resolves once the read loop has exited and every pending call has
    /// been completed.
    pub async fn closed(&self) {
        self.shared.done.cancelled().await;
    }

    /// Stops the read loop and waits for it to drain.
    pub async fn close(&self) {
        self.shared.cancel.cancel();
        self.closed().await;
    }
}

impl<U> Shared<U> {
    fn lock_pending(&self) -> MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<U: Decode + Clone + Send + 'static> Shared<U> {
    /// Queues one frame and waits until it is on the wire. Dropping the
    /// returned future never cuts a frame short.
    async fn write(&self, document: &JsonValue) -> Result<(), ClientError> {
        let frame = serde_json::to_string(document).map_err(ClientError::transport)?;
        let (written, ack) = oneshot::channel();
        self.outbound
            .send(Outbound { frame, written })
            .await
            .map_err(|_| ClientError::ChannelClosed)?;
        match ack.await {
            Ok(result) => result.map_err(ClientError::from),
            Err(_) => Err(ClientError::ChannelClosed),
        }
    }

    /// Routes one inbound frame to a pending call or to the dispatcher.
    fn route(&self, frame: &str) {
        let document: JsonValue = match serde_json::from_str(frame) {
            Ok(document) => document,
            Err(err) => {
                self.dispatcher.malformed(DecodeError::from(err));
                return;
            }
        };

        let Envelope { discriminant, token } = Envelope::inspect(&document);
        if let Some(token) = token {
            let is_error = discriminant == Some(parley_schema::ERROR_TYPE);
            let claim = self.lock_pending().claim(&token);
            match claim {
                Claim::Reply(completion) => {
                    log::trace!("client: << {discriminant:?} [{token}]");
                    let outcome =
                        if is_error { Err(engine_error(&document)) } else { Ok(document) };
                    completion(outcome);
                    return;
                }
                Claim::Abandoned => {
                    log::debug!("client: discarding late reply {discriminant:?} [{token}]");
                    return;
                }
                Claim::Unknown => {
                    log::debug!("client: no pending request for [{token}], dispatching as push");
                }
            }
        }
        self.dispatcher.dispatch(&document);
    }

    fn shutdown(&self) {
        let completions = self.lock_pending().drain();
        if !completions.is_empty() {
            log::debug!("client: failing {} pending requests, channel closed", completions.len());
        }
        for completion in completions {
            completion(Err(ClientError::ChannelClosed));
        }
        self.dispatcher.close();
        self.done.cancel();
    }
}

fn engine_error(document: &JsonValue) -> ClientError {
    match EngineError::decode(document) {
        Ok(err) => ClientError::from(err),
        Err(err) => ClientError::Decode(err),
    }
}

async fn read_loop<U: Decode + Clone + Send + 'static>(
    mut reader: Box<dyn FrameReader>,
    shared: Arc<Shared<U>>,
) {
    let cancel = shared.cancel.clone();
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => {
                log::debug!("client: read loop cancelled");
                break;
            }
            frame = reader.read_frame() => frame,
        };
        match frame {
            Ok(Some(frame)) => shared.route(&frame),
            Ok(None) => {
                log::debug!("client: channel closed by engine");
                break;
            }
            Err(err) if err.is_frame_error() => {
                let kind = DecodeErrorKind::Malformed { message: err.to_string() };
                shared.dispatcher.malformed(DecodeError::new(kind));
            }
            Err(err) => {
                log::warn!("client: read failed: {err}");
                break;
            }
        }
    }
    shared.shutdown();
}

async fn write_loop(
    mut writer: Box<dyn FrameWriter>,
    mut queued: mpsc::Receiver<Outbound>,
    done: CancellationToken,
) {
    loop {
        let Outbound { frame, written } = tokio::select! {
            _ = done.cancelled() => break,
            next = queued.recv() => match next {
                Some(outbound) => outbound,
                None => break,
            },
        };
        let result = tokio::select! {
            _ = done.cancelled() => break,
            result = writer.write_frame(&frame) => result,
        };
        if let Err(err) = &result {
            log::warn!("client: write failed: {err}");
        }
        let _ = written.send(result);
    }
    log::debug!("client: writer stopped");
}

/// Abandons the pending entry unless disarmed, covering both timeouts and
/// callers that drop the `call` future.
struct PendingGuard<'a, U> {
    shared: &'a Shared<U>,
    token: Option<CorrelationToken>,
}

impl<U> PendingGuard<'_, U> {
    fn disarm(mut self) {
        self.token = None;
    }
}

impl<U> Drop for PendingGuard<'_, U> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            if self.shared.lock_pending().abandon(&token) {
                log::debug!("client: abandoned [{token}]");
            }
        }
    }
}
