use std::sync::{Arc, Mutex};

use axum::extract::ws::Message;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::core::stt::{BaseSTT, CloseInfo, STTError, STTEvent, STTResult, Utterance};

use super::bridge::{CONNECTED_MESSAGE, SessionBridge};
use super::messages::{ClientInput, MessageRoute, OutgoingMessage};
use super::state::BridgeState;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Connect,
    Audio { len: usize, is_last: bool },
    Close,
}

/// Provider session double recording every call made by the bridge
struct MockSTT {
    calls: Arc<Mutex<Vec<Call>>>,
    connect_error: Option<STTError>,
    audio_error: Option<STTError>,
    connected: bool,
}

impl MockSTT {
    fn new(calls: Arc<Mutex<Vec<Call>>>) -> Self {
        Self {
            calls,
            connect_error: None,
            audio_error: None,
            connected: false,
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl BaseSTT for MockSTT {
    async fn connect(&mut self) -> Result<(), STTError> {
        self.record(Call::Connect);
        match self.connect_error.clone() {
            Some(e) => Err(e),
            None => {
                self.connected = true;
                Ok(())
            }
        }
    }

    fn send_audio(&mut self, audio_data: Bytes, is_last: bool) -> Result<(), STTError> {
        self.record(Call::Audio {
            len: audio_data.len(),
            is_last,
        });
        match self.audio_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn close(&mut self) {
        self.record(Call::Close);
        self.connected = false;
    }

    fn is_ready(&self) -> bool {
        self.connected
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn get_provider_info(&self) -> &'static str {
        "Mock Provider"
    }

    fn task_id(&self) -> Option<&str> {
        None
    }
}

struct Harness {
    bridge: SessionBridge,
    calls: Arc<Mutex<Vec<Call>>>,
    outgoing: mpsc::Receiver<MessageRoute>,
}

impl Harness {
    fn with(configure: impl FnOnce(&mut MockSTT)) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut stt = MockSTT::new(calls.clone());
        configure(&mut stt);
        let (tx, rx) = mpsc::channel(32);
        Self {
            bridge: SessionBridge::new(Box::new(stt), tx),
            calls,
            outgoing: rx,
        }
    }

    fn new() -> Self {
        Self::with(|_| {})
    }

    async fn active() -> Self {
        let mut harness = Self::new();
        harness.bridge.start().await.unwrap();
        assert_eq!(
            harness.next_route(),
            Some(MessageRoute::Outgoing(OutgoingMessage::Connected {
                message: CONNECTED_MESSAGE.to_string()
            }))
        );
        harness
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn audio_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Audio { .. }))
            .collect()
    }

    fn next_route(&mut self) -> Option<MessageRoute> {
        self.outgoing.try_recv().ok()
    }
}

mod classify_tests {
    use super::*;

    #[test]
    fn test_end_message_is_end_of_stream() {
        let input = ClientInput::classify(Bytes::from_static(br#"{"type":"end"}"#));
        assert_eq!(input, ClientInput::EndOfStream);

        let spaced = ClientInput::classify(Bytes::from_static(br#"{ "type" : "end" }"#));
        assert_eq!(spaced, ClientInput::EndOfStream);
    }

    #[test]
    fn test_other_json_is_audio() {
        let data = Bytes::from_static(br#"{"type":"start"}"#);
        assert_eq!(ClientInput::classify(data.clone()), ClientInput::Audio(data));

        let untyped = Bytes::from_static(br#"{"foo":1}"#);
        assert_eq!(
            ClientInput::classify(untyped.clone()),
            ClientInput::Audio(untyped)
        );
    }

    #[test]
    fn test_brace_prefixed_pcm_is_audio() {
        let data = Bytes::from(vec![0x7B, 0x00, 0xFF, 0x10, 0x22, 0x7D]);
        assert_eq!(ClientInput::classify(data.clone()), ClientInput::Audio(data));
    }

    #[test]
    fn test_end_marker_must_start_with_brace() {
        let data = Bytes::from_static(br#" {"type":"end"}"#);
        assert_eq!(ClientInput::classify(data.clone()), ClientInput::Audio(data));
    }

    #[test]
    fn test_empty_frame_is_audio() {
        assert_eq!(
            ClientInput::classify(Bytes::new()),
            ClientInput::Audio(Bytes::new())
        );
    }
}

mod message_tests {
    use super::*;

    #[test]
    fn test_outgoing_message_shapes() {
        let connected = OutgoingMessage::Connected {
            message: "ready".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&connected).unwrap(),
            serde_json::json!({"type": "connected", "message": "ready"})
        );

        let error = OutgoingMessage::Error {
            error: "boom".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({"type": "error", "error": "boom"})
        );

        let result = OutgoingMessage::Result {
            data: STTResult::new(
                "你好",
                vec![Utterance {
                    text: "你好".to_string(),
                    start_time_ms: 0,
                    end_time_ms: 640,
                    is_definite: true,
                }],
                true,
            ),
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({
                "type": "result",
                "data": {
                    "text": "你好",
                    "utterances": [
                        {"text": "你好", "start_time": 0, "end_time": 640, "definite": true}
                    ],
                    "isFinal": true
                }
            })
        );
    }
}

mod bridge_tests {
    use super::*;

    #[tokio::test]
    async fn test_start_sends_connected() {
        let mut harness = Harness::new();
        assert_eq!(harness.bridge.state(), BridgeState::Init);

        harness.bridge.start().await.unwrap();

        assert_eq!(harness.bridge.state(), BridgeState::Active);
        assert_eq!(harness.calls(), vec![Call::Connect]);
        match harness.next_route() {
            Some(MessageRoute::Outgoing(OutgoingMessage::Connected { message })) => {
                assert_eq!(message, CONNECTED_MESSAGE);
            }
            other => panic!("expected connected message, got {other:?}"),
        }
        assert!(harness.next_route().is_none());
    }

    #[tokio::test]
    async fn test_connect_failure_reports_error_and_closes() {
        let mut harness = Harness::with(|stt| {
            stt.connect_error = Some(STTError::AuthError("token rejected".to_string()));
        });

        let result = harness.bridge.start().await;

        assert!(result.is_err());
        assert_eq!(harness.bridge.state(), BridgeState::Closed);
        match harness.next_route() {
            Some(MessageRoute::Outgoing(OutgoingMessage::Error { error })) => {
                assert!(error.starts_with("Failed to connect to speech recognition service: "));
                assert!(error.contains("token rejected"));
            }
            other => panic!("expected error message, got {other:?}"),
        }
        assert_eq!(harness.next_route(), Some(MessageRoute::Close));

        // No audio is forwarded after a failed connect
        let keep_going = harness
            .bridge
            .handle_client_message(Message::Binary(Bytes::from(vec![0u8; 320])))
            .await;
        assert!(!keep_going);
        assert!(harness.audio_calls().is_empty());
    }

    #[tokio::test]
    async fn test_pcm_forwarded_once() {
        let mut harness = Harness::active().await;

        let keep_going = harness
            .bridge
            .handle_client_message(Message::Binary(Bytes::from(vec![1u8; 3200])))
            .await;

        assert!(keep_going);
        assert_eq!(
            harness.audio_calls(),
            vec![Call::Audio {
                len: 3200,
                is_last: false
            }]
        );
    }

    #[tokio::test]
    async fn test_end_message_sends_single_last_packet() {
        let mut harness = Harness::active().await;

        harness
            .bridge
            .handle_client_message(Message::Text(r#"{"type":"end"}"#.into()))
            .await;

        assert_eq!(
            harness.audio_calls(),
            vec![Call::Audio {
                len: 0,
                is_last: true
            }]
        );
        // The provider may still deliver results after the end marker
        assert_eq!(harness.bridge.state(), BridgeState::Active);
    }

    #[tokio::test]
    async fn test_end_marker_as_binary_frame() {
        let mut harness = Harness::active().await;

        harness
            .bridge
            .handle_client_message(Message::Binary(Bytes::from_static(br#"{"type":"end"}"#)))
            .await;

        assert_eq!(
            harness.audio_calls(),
            vec![Call::Audio {
                len: 0,
                is_last: true
            }]
        );
    }

    #[tokio::test]
    async fn test_malformed_json_forwarded_as_audio() {
        let mut harness = Harness::active().await;

        harness
            .bridge
            .handle_client_message(Message::Binary(Bytes::from(vec![0x7B, 0x01, 0x02, 0x03])))
            .await;
        harness
            .bridge
            .handle_client_message(Message::Text("{not json".into()))
            .await;

        assert_eq!(
            harness.audio_calls(),
            vec![
                Call::Audio {
                    len: 4,
                    is_last: false
                },
                Call::Audio {
                    len: 9,
                    is_last: false
                }
            ]
        );
    }

    #[tokio::test]
    async fn test_send_audio_failure_is_reported_and_streaming_continues() {
        let mut harness = Harness::with(|stt| {
            stt.audio_error = Some(STTError::AudioProcessingError("gzip failed".to_string()));
        });
        harness.bridge.start().await.unwrap();
        let _connected = harness.next_route();

        let keep_going = harness
            .bridge
            .handle_client_message(Message::Binary(Bytes::from(vec![0u8; 640])))
            .await;

        assert!(keep_going);
        assert_eq!(harness.bridge.state(), BridgeState::Active);
        match harness.next_route() {
            Some(MessageRoute::Outgoing(OutgoingMessage::Error { error })) => {
                assert!(error.starts_with("Failed to process message: "));
                assert!(error.contains("gzip failed"));
            }
            other => panic!("expected error message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_provider_result_relayed_verbatim() {
        let mut harness = Harness::active().await;
        let result = STTResult::interim("今天天气");

        harness
            .bridge
            .handle_provider_event(STTEvent::Result(result.clone()))
            .await;

        assert_eq!(
            harness.next_route(),
            Some(MessageRoute::Outgoing(OutgoingMessage::Result { data: result }))
        );
    }

    #[tokio::test]
    async fn test_provider_error_relayed_without_closing() {
        let mut harness = Harness::active().await;

        harness
            .bridge
            .handle_provider_event(STTEvent::Error(STTError::ProtocolError(
                "Truncated header".to_string(),
            )))
            .await;

        match harness.next_route() {
            Some(MessageRoute::Outgoing(OutgoingMessage::Error { error })) => {
                assert_eq!(error, "Protocol error: Truncated header");
            }
            other => panic!("expected error message, got {other:?}"),
        }
        assert_eq!(harness.bridge.state(), BridgeState::Active);
        assert!(!harness.calls().contains(&Call::Close));
    }

    #[tokio::test]
    async fn test_provider_close_is_only_logged() {
        let mut harness = Harness::active().await;

        harness
            .bridge
            .handle_provider_event(STTEvent::Close(CloseInfo {
                code: Some(1000),
                reason: "finished".to_string(),
            }))
            .await;

        assert!(harness.next_route().is_none());
        assert_eq!(harness.bridge.state(), BridgeState::Active);
        assert!(!harness.calls().contains(&Call::Close));
    }

    #[tokio::test]
    async fn test_results_after_end_relayed_in_order() {
        let mut harness = Harness::active().await;

        harness
            .bridge
            .handle_client_message(Message::Binary(Bytes::from(vec![0u8; 3200])))
            .await;
        harness
            .bridge
            .handle_client_message(Message::Text(r#"{"type":"end"}"#.into()))
            .await;

        let interim = STTResult::interim("你");
        let last = STTResult::final_text("你好");
        harness
            .bridge
            .handle_provider_event(STTEvent::Result(interim.clone()))
            .await;
        harness
            .bridge
            .handle_provider_event(STTEvent::Result(last.clone()))
            .await;
        harness
            .bridge
            .handle_provider_event(STTEvent::Close(CloseInfo::default()))
            .await;

        assert_eq!(
            harness.audio_calls(),
            vec![
                Call::Audio {
                    len: 3200,
                    is_last: false
                },
                Call::Audio {
                    len: 0,
                    is_last: true
                }
            ]
        );
        assert_eq!(
            harness.next_route(),
            Some(MessageRoute::Outgoing(OutgoingMessage::Result { data: interim }))
        );
        assert_eq!(
            harness.next_route(),
            Some(MessageRoute::Outgoing(OutgoingMessage::Result { data: last }))
        );
        assert!(harness.next_route().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_closes_provider_once() {
        let mut harness = Harness::active().await;

        harness.bridge.shutdown();
        harness.bridge.shutdown();

        assert_eq!(harness.bridge.state(), BridgeState::Closed);
        let closes = harness
            .calls()
            .into_iter()
            .filter(|c| *c == Call::Close)
            .count();
        assert_eq!(closes, 1);
    }

    #[tokio::test]
    async fn test_no_relaying_after_shutdown() {
        let mut harness = Harness::active().await;
        harness.bridge.shutdown();

        harness
            .bridge
            .handle_provider_event(STTEvent::Result(STTResult::final_text("late")))
            .await;
        let keep_going = harness
            .bridge
            .handle_client_message(Message::Binary(Bytes::from(vec![0u8; 320])))
            .await;

        assert!(!keep_going);
        assert!(harness.next_route().is_none());
        assert!(harness.audio_calls().is_empty());
    }

    #[tokio::test]
    async fn test_client_close_frame_stops_loop() {
        let mut harness = Harness::active().await;
        let keep_going = harness.bridge.handle_client_message(Message::Close(None)).await;
        assert!(!keep_going);
    }

    #[tokio::test]
    async fn test_messages_before_start_are_dropped() {
        let mut harness = Harness::new();

        let keep_going = harness
            .bridge
            .handle_client_message(Message::Binary(Bytes::from(vec![0u8; 320])))
            .await;
        harness
            .bridge
            .handle_provider_event(STTEvent::Result(STTResult::interim("early")))
            .await;

        assert!(keep_going);
        assert!(harness.calls().is_empty());
        assert!(harness.next_route().is_none());
    }
}
