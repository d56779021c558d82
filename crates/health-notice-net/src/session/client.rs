//! The reconnecting notice session.

use std::fmt;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use super::config::SessionConfig;
use super::dispatch::{FrameAction, dispatch_frame};
use super::state::{SessionEvent, SessionState};
use crate::error::{Result, SessionError};
use crate::identity::ClientIdentity;
use crate::logging::targets;
use crate::protocol::{self, Handshake, Message};
use crate::sink::{NoticeDispatcher, NotificationSink};

/// Type alias for a connected WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;

const KEEP_ALIVE_PAYLOAD: &[u8] = b"keepalive";
const EVENT_CAPACITY: usize = 64;

/// State shared between the session handle and its task.
struct SessionInner {
    state: SessionState,
    reconnect_attempt: u32,
    client_id: Option<ClientIdentity>,
}

/// A spawned session task and its own shutdown flag.
///
/// Each task gets a fresh channel, so restarting never clears the flag a
/// closing task is still waiting on.
struct RunningTask {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl RunningTask {
    /// Alive and not asked to stop.
    fn is_active(&self) -> bool {
        !self.handle.is_finished() && !*self.shutdown.borrow()
    }
}

/// Command sent to the session task.
enum Command {
    SendText(String),
    SendPing(Vec<u8>),
}

/// How a connection epoch ended.
enum EpochEnd {
    /// Explicit close; do not reconnect.
    Closed,
    /// Remote close or transport failure; reconnect if allowed.
    Lost,
}

/// A reconnecting WebSocket session speaking the health-notice protocol.
///
/// On every successful connect the session mints a fresh [`ClientIdentity`]
/// and sends a handshake before anything else. While open it echoes server
/// heartbeats inline, in receipt order, and forwards `showNotice` frames to a
/// [`NotificationSink`] through a bounded queue so slow rendering never stalls
/// the read loop. When the connection drops it reconnects with exponential
/// backoff until [`close`](Self::close) is called.
///
/// All socket I/O happens on one background task. `send_*` and
/// [`do_ping`](Self::do_ping) only queue commands for it, so concurrent
/// callers never interleave writes.
///
/// # Example
///
/// ```ignore
/// let config = SessionConfig::new("ws://socket.art2cat.com/ws/health")
///     .keep_alive(Duration::from_secs(30));
///
/// let session = NoticeSession::new(config, TracingSink);
/// let mut events = session.subscribe();
/// session.connect()?;
///
/// while let Ok(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// ```
pub struct NoticeSession {
    config: SessionConfig,
    sink: Arc<dyn NotificationSink>,
    inner: Arc<Mutex<SessionInner>>,
    command_tx: Arc<Mutex<Option<mpsc::UnboundedSender<Command>>>>,
    events: broadcast::Sender<SessionEvent>,
    task: Mutex<Option<RunningTask>>,
}

impl NoticeSession {
    /// Create a session that delivers notices to `sink`.
    pub fn new(config: SessionConfig, sink: impl NotificationSink) -> Self {
        Self::with_shared_sink(config, Arc::new(sink))
    }

    /// Create a session with a sink that is shared elsewhere.
    pub fn with_shared_sink(config: SessionConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            sink,
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::Disconnected,
                reconnect_attempt: 0,
                client_id: None,
            })),
            command_tx: Arc::new(Mutex::new(None)),
            events,
            task: Mutex::new(None),
        }
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Check if a connection is open.
    pub fn is_open(&self) -> bool {
        self.inner.lock().state == SessionState::Open
    }

    /// Whether the background task is alive (connected, connecting, or backing off).
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Identity of the current connection, if one is open.
    pub fn client_id(&self) -> Option<ClientIdentity> {
        self.inner.lock().client_id
    }

    /// Number of reconnection attempts since the last successful connect.
    pub fn reconnect_attempt(&self) -> u32 {
        self.inner.lock().reconnect_attempt
    }

    /// Get the URL this session connects to.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Start the session task.
    ///
    /// Returns immediately; connecting, handshaking and reconnecting all happen
    /// in the background. If the session is already running this is a no-op.
    /// After [`close`](Self::close) it starts a new task, which waits for the
    /// closing one to finish before dialing. Must be called from within a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL or a configured header is invalid.
    pub fn connect(&self) -> Result<()> {
        build_request(&self.config)?;
        if self.config.url.starts_with("wss://") {
            // Several crates may try to install a provider; losing that race is fine.
            let _ = rustls::crypto::ring::default_provider().install_default();
        }

        let mut slot = self.task.lock();
        if slot.as_ref().is_some_and(RunningTask::is_active) {
            return Ok(());
        }

        let previous = slot.take().map(|running| running.handle);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = SessionTask {
            config: self.config.clone(),
            sink: self.sink.clone(),
            inner: self.inner.clone(),
            command_tx: self.command_tx.clone(),
            events: self.events.clone(),
        };
        let handle = tokio::spawn(async move {
            // The closing task still owns the shared state until it exits.
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    error!(target: targets::SESSION, error = %e, "previous session task failed");
                }
            }
            task.run(shutdown_rx).await;
        });
        *slot = Some(RunningTask { handle, shutdown });
        Ok(())
    }

    /// Close the connection and stop reconnecting.
    ///
    /// Cancels a pending read, backoff wait or connect attempt. A close frame
    /// is sent if a connection is open. Notices already queued for the sink
    /// are still delivered.
    pub fn close(&self) {
        if let Some(running) = self.task.lock().as_ref() {
            running.shutdown.send_replace(true);
        }
    }

    /// [`close`](Self::close) and wait for the session task to finish.
    pub async fn shutdown(&self) {
        self.close();
        let running = self.task.lock().take();
        if let Some(running) = running {
            if let Err(e) = running.handle.await {
                error!(target: targets::SESSION, error = %e, "session task failed");
            }
        }
    }

    /// Queue a protocol message for sending.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] if no connection is open, or
    /// [`SessionError::Encode`] if the message cannot be serialized.
    pub fn send_message(&self, message: &Message) -> Result<()> {
        let text = protocol::encode_text(message)?;
        self.send_command(Command::SendText(text))
    }

    /// Queue a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] if no connection is open.
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(Command::SendText(text.into()))
    }

    /// Send a ping frame. The pong is reported as [`SessionEvent::Pong`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] if no connection is open.
    pub fn do_ping(&self, payload: impl Into<Vec<u8>>) -> Result<()> {
        self.send_command(Command::SendPing(payload.into()))
    }

    fn send_command(&self, command: Command) -> Result<()> {
        let tx = self.command_tx.lock();
        match tx.as_ref() {
            Some(tx) => tx.send(command).map_err(|_| SessionError::NotConnected),
            None => Err(SessionError::NotConnected),
        }
    }
}

impl fmt::Debug for NoticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoticeSession")
            .field("url", &self.config.url)
            .field("state", &self.state())
            .field("client_id", &self.client_id())
            .finish()
    }
}

/// Everything the background task needs, detached from the handle.
struct SessionTask {
    config: SessionConfig,
    sink: Arc<dyn NotificationSink>,
    inner: Arc<Mutex<SessionInner>>,
    command_tx: Arc<Mutex<Option<mpsc::UnboundedSender<Command>>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionTask {
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let dispatcher =
            NoticeDispatcher::spawn(self.sink.clone(), self.config.notice_queue_capacity);
        let mut attempt: u32 = 0;

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            self.set_state(SessionState::Connecting);
            match self.open_transport(&mut shutdown_rx).await {
                Ok(Some(ws)) => {
                    attempt = 0;
                    if let EpochEnd::Closed = self.run_open(ws, &dispatcher, &mut shutdown_rx).await
                    {
                        break;
                    }
                }
                Ok(None) => break,
                // Retrying cannot fix a bad request.
                Err(e @ (SessionError::InvalidUrl(_) | SessionError::InvalidHeader(_))) => {
                    self.record_error(e);
                    break;
                }
                Err(e) => self.record_error(e),
            }

            let Some(policy) = self.config.reconnect.as_ref() else {
                debug!(target: targets::SESSION, "reconnect disabled, stopping session");
                break;
            };
            if let Some(max) = policy.max_attempts {
                if attempt >= max {
                    self.record_error(SessionError::ReconnectExhausted(max));
                    break;
                }
            }

            let delay = policy.delay_for_attempt(attempt);
            attempt += 1;
            self.inner.lock().reconnect_attempt = attempt;
            self.set_state(SessionState::ReconnectPending);
            info!(
                target: targets::SESSION,
                attempt,
                ?delay,
                url = %self.config.url,
                "scheduling reconnect"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_signal(&mut shutdown_rx) => {
                    debug!(target: targets::SESSION, "shutdown during reconnect backoff");
                    break;
                }
            }
        }

        self.inner.lock().client_id = None;
        self.set_state(SessionState::Disconnected);
        info!(target: targets::SESSION, url = %self.config.url, "session stopped");
    }

    /// Dial the endpoint. `Ok(None)` means shutdown was requested meanwhile.
    async fn open_transport(
        &self,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<Option<WsStream>> {
        let request = build_request(&self.config)?;
        debug!(target: targets::SESSION, url = %self.config.url, "connecting");

        let dial = tokio::time::timeout(
            self.config.connect_timeout,
            tokio_tungstenite::connect_async(request),
        );
        tokio::select! {
            result = dial => {
                let (ws, _response) = result.map_err(|_| SessionError::Timeout)??;
                Ok(Some(ws))
            }
            _ = shutdown_signal(shutdown_rx) => Ok(None),
        }
    }

    /// Drive one open connection until it is closed or lost.
    async fn run_open(
        &self,
        ws: WsStream,
        dispatcher: &NoticeDispatcher,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> EpochEnd {
        let (mut write, mut read) = ws.split();

        let identity = ClientIdentity::new();
        {
            let mut inner = self.inner.lock();
            inner.client_id = Some(identity);
            inner.reconnect_attempt = 0;
        }
        self.set_state(SessionState::Open);

        // The handshake goes out before the command channel exists, so
        // nothing else can be written ahead of it.
        let handshake = Message::Handshake(Handshake::new(&identity));
        match protocol::encode_text(&handshake) {
            Ok(text) => {
                if let Err(e) = write_text(&mut write, text).await {
                    self.record_error(e);
                    return self.end_epoch(EpochEnd::Lost);
                }
            }
            Err(e) => {
                self.record_error(e.into());
                return self.end_epoch(EpochEnd::Lost);
            }
        }
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
        *self.command_tx.lock() = Some(tx);

        info!(
            target: targets::SESSION,
            url = %self.config.url,
            client_id = %identity,
            "connected, handshake sent"
        );
        let _ = self.events.send(SessionEvent::HandshakeSent {
            client_id: identity.to_string(),
        });

        // A zero period would make `interval_at` panic.
        let keep_alive_period = self.config.keep_alive.filter(|period| !period.is_zero());
        let mut keep_alive = keep_alive_period.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        let mut last_ping: Option<Instant> = None;

        let end = loop {
            tokio::select! {
                _ = shutdown_signal(shutdown_rx) => {
                    self.set_state(SessionState::Closing);
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: String::new().into(),
                    };
                    if let Err(e) = write.send(WsMessage::Close(Some(frame))).await {
                        debug!(target: targets::SESSION, error = %e, "close frame not sent");
                    }
                    break EpochEnd::Closed;
                }

                cmd = rx.recv() => {
                    let Some(cmd) = cmd else {
                        break EpochEnd::Lost;
                    };
                    let frame = match cmd {
                        Command::SendText(text) => {
                            trace!(target: targets::SESSION, frame = %text, "sending frame");
                            WsMessage::Text(text.into())
                        }
                        Command::SendPing(payload) => {
                            last_ping = Some(Instant::now());
                            trace!(target: targets::SESSION, "sending ping");
                            WsMessage::Ping(payload.into())
                        }
                    };
                    if let Err(e) = write.send(frame).await {
                        self.record_error(e.into());
                        break EpochEnd::Lost;
                    }
                }

                _ = next_tick(&mut keep_alive) => {
                    last_ping = Some(Instant::now());
                    trace!(target: targets::SESSION, "sending keep-alive ping");
                    if let Err(e) = write.send(WsMessage::Ping(KEEP_ALIVE_PAYLOAD.into())).await {
                        self.record_error(e.into());
                        break EpochEnd::Lost;
                    }
                }

                frame = read.next() => {
                    let result = match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            self.on_frame(text.as_bytes(), &identity, &mut write, dispatcher).await
                        }
                        Some(Ok(WsMessage::Binary(data))) => {
                            self.on_frame(&data, &identity, &mut write, dispatcher).await
                        }
                        Some(Ok(WsMessage::Ping(_))) => {
                            // Pong is sent automatically by tungstenite
                            Ok(())
                        }
                        Some(Ok(WsMessage::Pong(payload))) => {
                            let elapsed = last_ping.take().map(|sent| sent.elapsed());
                            info!(
                                target: targets::SESSION,
                                ?elapsed,
                                payload = %String::from_utf8_lossy(&payload),
                                "pong received"
                            );
                            let _ = self.events.send(SessionEvent::Pong {
                                elapsed,
                                payload: payload.to_vec(),
                            });
                            Ok(())
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            info!(target: targets::SESSION, ?frame, "server closed connection");
                            break EpochEnd::Lost;
                        }
                        Some(Ok(WsMessage::Frame(_))) => Ok(()),
                        Some(Err(e)) => Err(e.into()),
                        None => {
                            info!(target: targets::SESSION, "stream ended");
                            break EpochEnd::Lost;
                        }
                    };
                    if let Err(e) = result {
                        self.record_error(e);
                        break EpochEnd::Lost;
                    }
                }
            }
        };

        self.end_epoch(end)
    }

    /// Handle one inbound data frame. Only write failures are returned.
    async fn on_frame(
        &self,
        payload: &[u8],
        identity: &ClientIdentity,
        write: &mut WsWriter,
        dispatcher: &NoticeDispatcher,
    ) -> Result<()> {
        trace!(
            target: targets::SESSION,
            frame = %String::from_utf8_lossy(payload),
            "received frame"
        );

        match dispatch_frame(payload, identity) {
            FrameAction::Reply(reply) => match protocol::encode_text(&reply) {
                Ok(text) => write_text(write, text).await?,
                Err(e) => warn!(target: targets::CODEC, error = %e, "could not encode reply"),
            },
            FrameAction::Notify(notice) => {
                debug!(target: targets::DISPATCH, title = %notice.title, "queueing notice");
                if let Err(e) = dispatcher.try_dispatch(notice) {
                    warn!(target: targets::DISPATCH, error = %e, "notice not queued");
                }
            }
            FrameAction::Ignore(kind) => {
                debug!(
                    target: targets::SESSION,
                    kind = kind.as_deref().unwrap_or("<missing>"),
                    "ignoring frame"
                );
            }
            FrameAction::Drop(e) => {
                warn!(target: targets::CODEC, error = %e, "dropping frame");
            }
        }
        Ok(())
    }

    fn end_epoch(&self, end: EpochEnd) -> EpochEnd {
        *self.command_tx.lock() = None;
        self.inner.lock().client_id = None;
        self.set_state(SessionState::Disconnected);
        end
    }

    fn set_state(&self, state: SessionState) {
        let changed = {
            let mut inner = self.inner.lock();
            let previous = inner.state;
            inner.state = state;
            previous != state
        };
        if changed {
            debug!(target: targets::SESSION, %state, "state changed");
            let _ = self.events.send(SessionEvent::StateChanged(state));
        }
    }

    fn record_error(&self, error: SessionError) {
        warn!(target: targets::SESSION, url = %self.config.url, %error, "session error");
        let _ = self.events.send(SessionEvent::Error(error));
    }
}

async fn write_text(write: &mut WsWriter, text: String) -> Result<()> {
    trace!(target: targets::SESSION, frame = %text, "sending frame");
    write.send(WsMessage::Text(text.into())).await?;
    Ok(())
}

/// Resolves once shutdown is requested or the session handle is dropped.
async fn shutdown_signal(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Build the upgrade request with custom headers.
fn build_request(config: &SessionConfig) -> Result<Request> {
    let mut request = config.url.as_str().into_client_request()?;

    let headers = request.headers_mut();
    for (name, value) in &config.headers {
        let header_name = http::header::HeaderName::try_from(name.as_str())?;
        let header_value = http::header::HeaderValue::try_from(value.as_str())?;
        headers.insert(header_name, header_value);
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_applies_headers() {
        let config = SessionConfig::new("ws://localhost:9000/ws/health")
            .header("Authorization", "Bearer token");
        let request = build_request(&config).unwrap();
        assert_eq!(request.uri().path(), "/ws/health");
        assert_eq!(
            request.headers().get("Authorization").unwrap(),
            "Bearer token"
        );
    }

    #[test]
    fn test_build_request_rejects_bad_input() {
        let bad_url = SessionConfig::new("not a url");
        assert!(build_request(&bad_url).is_err());

        let bad_header = SessionConfig::new("ws://localhost:9000").header("bad header", "x");
        assert!(matches!(
            build_request(&bad_header),
            Err(SessionError::InvalidHeader(_))
        ));
    }
}
