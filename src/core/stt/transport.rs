//! Upstream WebSocket plumbing shared by the provider sessions.
//!
//! A provider session opens the socket itself (so that it can write its start
//! request before `connect()` resolves) and then hands the stream to an
//! [`UpstreamLink`], which owns the split sink/stream inside one spawned task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::client::{Request, generate_key};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info};

use super::base::{CloseInfo, STTError, STTEvent, STTEventSender};

pub type UpstreamStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build a WebSocket upgrade request carrying provider specific headers.
pub fn build_request(ws_url: &str, headers: &[(&str, &str)]) -> Result<Request, STTError> {
    let parsed = url::Url::parse(ws_url)
        .map_err(|e| STTError::ConfigurationError(format!("Invalid WebSocket URL {ws_url}: {e}")))?;

    let host = match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => {
            return Err(STTError::ConfigurationError(format!(
                "WebSocket URL has no host: {ws_url}"
            )));
        }
    };

    let mut builder = Request::builder()
        .method("GET")
        .uri(ws_url)
        .header("Host", host)
        .header("Upgrade", "websocket")
        .header("Connection", "upgrade")
        .header("Sec-WebSocket-Key", generate_key())
        .header("Sec-WebSocket-Version", "13");

    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    builder
        .body(())
        .map_err(|e| STTError::ConfigurationError(format!("Failed to create WebSocket request: {e}")))
}

/// Open the upstream socket. No timeout beyond what the transport enforces.
pub async fn open_upstream(request: Request) -> Result<UpstreamStream, STTError> {
    let (stream, response) = connect_async(request)
        .await
        .map_err(|e| STTError::TransportError(format!("Failed to open upstream connection: {e}")))?;

    debug!("Upstream handshake completed with status {}", response.status());
    Ok(stream)
}

/// Running upstream connection: one task pumping outgoing and incoming frames.
///
/// Every inbound message is handed to the session's message handler in
/// arrival order. When the task exits for any reason it flips the open flag
/// and emits exactly one [`STTEvent::Close`].
pub struct UpstreamLink {
    outgoing_tx: mpsc::UnboundedSender<Message>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    open: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl UpstreamLink {
    pub fn spawn<F>(
        provider: &'static str,
        stream: UpstreamStream,
        events: STTEventSender,
        mut on_message: F,
    ) -> Self
    where
        F: FnMut(Message, &STTEventSender) + Send + 'static,
    {
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let open = Arc::new(AtomicBool::new(true));
        let open_flag = open.clone();

        let handle = tokio::spawn(async move {
            let (mut ws_sink, mut ws_stream) = stream.split();
            let mut close_info = CloseInfo::default();

            loop {
                tokio::select! {
                    biased;

                    Some(message) = outgoing_rx.recv() => {
                        if let Err(e) = ws_sink.send(message).await {
                            let stt_error = STTError::TransportError(format!(
                                "Failed to send to {provider}: {e}"
                            ));
                            error!("{}", stt_error);
                            let _ = events.send(STTEvent::Error(stt_error));
                            break;
                        }
                    }

                    message = ws_stream.next() => {
                        match message {
                            Some(Ok(Message::Close(frame))) => {
                                if let Some(frame) = frame {
                                    close_info.code = Some(u16::from(frame.code));
                                    close_info.reason = frame.reason.as_str().to_string();
                                }
                                info!("{} upstream closed: {:?}", provider, close_info);
                                break;
                            }
                            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                                debug!("Keepalive from {}", provider);
                            }
                            Some(Ok(msg)) => on_message(msg, &events),
                            Some(Err(e)) => {
                                let stt_error = STTError::TransportError(format!(
                                    "{provider} WebSocket error: {e}"
                                ));
                                error!("{}", stt_error);
                                let _ = events.send(STTEvent::Error(stt_error));
                                break;
                            }
                            None => {
                                info!("{} upstream stream ended", provider);
                                break;
                            }
                        }
                    }

                    _ = &mut shutdown_rx => {
                        debug!("Closing {} upstream", provider);
                        let _ = ws_sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            open_flag.store(false, Ordering::SeqCst);
            let _ = events.send(STTEvent::Close(close_info));
        });

        Self {
            outgoing_tx,
            shutdown_tx: Some(shutdown_tx),
            open,
            handle: Some(handle),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && self.shutdown_tx.is_some()
    }

    /// Queue a frame for the upstream. Never blocks.
    pub fn send(&self, message: Message) -> Result<(), STTError> {
        self.outgoing_tx
            .send(message)
            .map_err(|_| STTError::TransportError("Upstream connection is closed".to_string()))
    }

    /// Ask the pump task to send a close frame and stop. Idempotent.
    pub fn close(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }

    /// Wait for the pump task to finish.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for UpstreamLink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_sets_host_and_custom_headers() {
        let request = build_request(
            "wss://openspeech.bytedance.com/api/v3/sauc/bigmodel_async",
            &[("X-Api-App-Key", "app"), ("X-Api-Connect-Id", "abc")],
        )
        .unwrap();

        let headers = request.headers();
        assert_eq!(headers["Host"], "openspeech.bytedance.com");
        assert_eq!(headers["Upgrade"], "websocket");
        assert_eq!(headers["Sec-WebSocket-Version"], "13");
        assert_eq!(headers["X-Api-App-Key"], "app");
        assert_eq!(headers["X-Api-Connect-Id"], "abc");
        assert!(headers.contains_key("Sec-WebSocket-Key"));
    }

    #[test]
    fn test_build_request_keeps_explicit_port_in_host() {
        let request = build_request("ws://127.0.0.1:9001/ws/v1?appkey=k", &[]).unwrap();
        assert_eq!(request.headers()["Host"], "127.0.0.1:9001");
        assert_eq!(request.uri().query(), Some("appkey=k"));
    }

    #[test]
    fn test_build_request_rejects_invalid_url() {
        let err = build_request("not a url", &[]).unwrap_err();
        assert!(matches!(err, STTError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_open_upstream_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let request = build_request(&format!("ws://127.0.0.1:{port}/"), &[]).unwrap();
        let err = open_upstream(request).await.unwrap_err();
        assert!(matches!(err, STTError::TransportError(_)));
    }
}
