//! End-to-end tests of the facade against a loopback server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use health_notice::{NoticeSession, NotificationSink, SessionState, SinkError, config_for};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

struct ChannelSink(mpsc::UnboundedSender<(String, String)>);

impl NotificationSink for ChannelSink {
    fn notify(&self, title: &str, message: &str) -> Result<(), SinkError> {
        self.0
            .send((title.to_string(), message.to_string()))
            .map_err(|e| SinkError::new(e.to_string()))
    }
}

async fn next_json(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        match timeout(WAIT, ws.next()).await.unwrap() {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_client_handles_full_exchange() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/health", listener.local_addr().unwrap());

    let (tx, mut notices) = mpsc::unbounded_channel();
    let sink: Arc<dyn NotificationSink> = Arc::new(ChannelSink(tx));
    let session = NoticeSession::with_shared_sink(config_for(Some(url)), sink);
    session.connect().unwrap();

    let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

    let handshake = next_json(&mut ws).await;
    assert_eq!(handshake["type"], "handshake");

    ws.send(Message::Text(r#"{"type":"heartbeat"}"#.to_string().into()))
        .await
        .unwrap();
    ws.send(Message::Text(
        r#"{"type":"showNotice","title":"Service","message":"restarted"}"#
            .to_string()
            .into(),
    ))
    .await
    .unwrap();

    let echo = next_json(&mut ws).await;
    assert_eq!(echo["type"], "heartbeat");
    assert_eq!(echo["clientId"], handshake["clientId"]);

    let notice = timeout(WAIT, notices.recv()).await.unwrap().unwrap();
    assert_eq!(notice, ("Service".to_string(), "restarted".to_string()));
    assert_eq!(session.state(), SessionState::Open);

    session.shutdown().await;
    assert_eq!(session.state(), SessionState::Disconnected);
}
