//! Streaming broadcast engine.
//!
//! Turns one inbound chat event into history updates and group-wide
//! broadcasts. Non-triggered messages are appended to history and relayed
//! as-is. A message carrying the trigger marker additionally drives a
//! streaming completion: the provider's content deltas accumulate in a
//! [`StreamingSession`], and the whole buffer is re-broadcast to the group
//! every time the unflushed tail passes the threshold, ending in one
//! unconditional final frame and exactly one assistant transcript entry.
//!
//! Every inbound chat event is handled as an independent task; nothing
//! here serializes completions per group, and two concurrent sessions in
//! the same group interleave freely, disambiguated by correlation id.

pub mod session;

use futures_util::StreamExt;

use groupstream_types::chat::{ChatMessage, ChatRole, ConnectionId, ServerEvent};
use groupstream_types::error::ChatError;
use groupstream_types::llm::{CompletionRequest, Message, MessageRole, StopReason, StreamEvent};

use crate::group::{GroupHistoryStore, GroupRegistry};
use crate::llm::SharedProvider;
use crate::transport::GroupTransport;

pub use session::StreamingSession;

/// Substring that marks a message as addressed to the assistant.
pub const TRIGGER_MARKER: &str = "@gpt";

/// Author name carried on all assistant broadcasts and transcript entries.
pub const ASSISTANT_AUTHOR: &str = "AI Assistant";

/// The relay engine: membership, history, and streamed replies.
pub struct ChatHub<T> {
    registry: GroupRegistry,
    history: GroupHistoryStore,
    provider: SharedProvider,
    transport: T,
    max_completion_tokens: u32,
}

impl<T: GroupTransport> ChatHub<T> {
    pub fn new(provider: SharedProvider, transport: T, max_completion_tokens: u32) -> Self {
        Self {
            registry: GroupRegistry::new(),
            history: GroupHistoryStore::new(),
            provider,
            transport,
            max_completion_tokens,
        }
    }

    /// Join a connection to a group, replacing any prior membership.
    pub async fn join_group(&self, connection: ConnectionId, group: &str) {
        if let Err(err) = self.transport.add_to_group(connection, group).await {
            tracing::warn!(%connection, %group, error = %err, "transport group add failed");
        }
        self.registry.join(connection, group);
        tracing::debug!(%connection, %group, "connection joined group");
    }

    /// Tear down all state for a disconnected connection.
    ///
    /// An in-flight completion triggered by this connection is not
    /// cancelled; it runs to termination and broadcasts to whoever
    /// remains in the group.
    pub async fn disconnect(&self, connection: ConnectionId) {
        self.registry.leave(connection);
        self.transport.remove_connection(connection).await;
        tracing::debug!(%connection, "connection removed");
    }

    /// Handle one inbound chat message from a connection.
    pub async fn chat(
        &self,
        connection: ConnectionId,
        author: &str,
        text: &str,
    ) -> Result<(), ChatError> {
        let group = self
            .registry
            .resolve(connection)
            .ok_or(ChatError::NotInGroup)?;

        if text.contains(TRIGGER_MARKER) {
            self.stream_reply(connection, &group, author, text).await
        } else {
            self.history.append_user(&group, author, text);
            self.relay_to_others(&group, connection, author, text).await;
            Ok(())
        }
    }

    /// Drive one triggered message through the completion provider.
    async fn stream_reply(
        &self,
        connection: ConnectionId,
        group: &str,
        author: &str,
        text: &str,
    ) -> Result<(), ChatError> {
        let mut session = StreamingSession::new();

        // The marker is stripped before the residue seeds the context,
        // but the relay below carries the original message untouched.
        let stripped = text.replace(TRIGGER_MARKER, "");
        let context = self.history.append_user(group, author, stripped.trim());

        self.relay_to_others(group, connection, author, text).await;

        let request = CompletionRequest {
            model: self.provider.model().to_string(),
            messages: context.iter().map(to_llm_message).collect(),
            max_tokens: self.max_completion_tokens,
            temperature: None,
        };

        tracing::debug!(
            %group,
            correlation_id = %session.id,
            context_len = context.len(),
            "starting streamed completion"
        );

        let mut stream = self.provider.stream(request);
        while let Some(event) = stream.next().await {
            // A mid-stream failure leaves any partial broadcast visible as
            // a stalled update and appends no assistant message.
            match event? {
                StreamEvent::TextDelta { text } => {
                    session.push(&text);
                    if session.should_flush() {
                        self.broadcast_update(group, &session).await;
                        session.mark_flushed();
                    }
                }
                StreamEvent::MessageDelta { stop_reason } => {
                    if stop_reason != StopReason::EndTurn {
                        tracing::debug!(%group, %stop_reason, "completion stopped early");
                    }
                }
                StreamEvent::Usage(usage) => {
                    tracing::debug!(
                        %group,
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "completion usage"
                    );
                }
                StreamEvent::Connected | StreamEvent::Done => {}
            }
        }

        self.history
            .append_assistant(group, ASSISTANT_AUTHOR, session.content());

        // Always send a final frame, even if the threshold already flushed
        // at this exact length (or never fired at all): the last frame a
        // client sees must be the complete reply.
        self.broadcast_update(group, &session).await;

        Ok(())
    }

    async fn relay_to_others(
        &self,
        group: &str,
        sender: ConnectionId,
        author: &str,
        text: &str,
    ) {
        let event = ServerEvent::NewMessage {
            author: author.to_string(),
            text: text.to_string(),
        };
        if let Err(err) = self.transport.send_to_others(group, sender, &event).await {
            tracing::warn!(%group, error = %err, "relay delivery failed");
        }
    }

    async fn broadcast_update(&self, group: &str, session: &StreamingSession) {
        let event = ServerEvent::MessageUpdate {
            author: ASSISTANT_AUTHOR.to_string(),
            id: session.id,
            text: session.content().to_string(),
        };
        if let Err(err) = self.transport.send_to_group(group, &event).await {
            tracing::warn!(%group, error = %err, "assistant update delivery failed");
        }
    }
}

fn to_llm_message(msg: &ChatMessage) -> Message {
    Message {
        role: match msg.role {
            ChatRole::User => MessageRole::User,
            ChatRole::Assistant => MessageRole::Assistant,
        },
        content: msg.content.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    use futures_util::Stream;

    use groupstream_types::error::TransportError;
    use groupstream_types::llm::LlmError;

    use crate::llm::LlmProvider;

    #[derive(Debug, Clone, PartialEq)]
    enum Audience {
        Group,
        Others(ConnectionId),
    }

    #[derive(Debug, Clone)]
    struct SentFrame {
        group: String,
        audience: Audience,
        event: ServerEvent,
    }

    /// Captures every fan-out the engine performs.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<SentFrame>>,
    }

    impl RecordingTransport {
        fn frames(&self) -> Vec<SentFrame> {
            self.sent.lock().unwrap().clone()
        }

        fn updates(&self) -> Vec<(uuid::Uuid, String)> {
            self.frames()
                .into_iter()
                .filter_map(|frame| match frame.event {
                    ServerEvent::MessageUpdate { id, text, .. } => Some((id, text)),
                    _ => None,
                })
                .collect()
        }
    }

    impl GroupTransport for RecordingTransport {
        async fn add_to_group(
            &self,
            _connection: ConnectionId,
            _group: &str,
        ) -> Result<(), TransportError> {
            Ok(())
        }

        async fn remove_connection(&self, _connection: ConnectionId) {}

        async fn send_to_group(
            &self,
            group: &str,
            event: &ServerEvent,
        ) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(SentFrame {
                group: group.to_string(),
                audience: Audience::Group,
                event: event.clone(),
            });
            Ok(())
        }

        async fn send_to_others(
            &self,
            group: &str,
            sender: ConnectionId,
            event: &ServerEvent,
        ) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(SentFrame {
                group: group.to_string(),
                audience: Audience::Others(sender),
                event: event.clone(),
            });
            Ok(())
        }
    }

    /// Replays a fixed sequence of content deltas, optionally failing
    /// after a number of chunks.
    struct ScriptedProvider {
        chunks: Vec<String>,
        fail_after: Option<usize>,
    }

    impl ScriptedProvider {
        fn new(chunks: &[&str]) -> Self {
            Self {
                chunks: chunks.iter().map(|s| s.to_string()).collect(),
                fail_after: None,
            }
        }

        fn failing_after(chunks: &[&str], fail_after: usize) -> Self {
            Self {
                chunks: chunks.iter().map(|s| s.to_string()).collect(),
                fail_after: Some(fail_after),
            }
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "test-model"
        }

        fn stream(
            &self,
            _request: CompletionRequest,
        ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
            let mut events: Vec<Result<StreamEvent, LlmError>> = vec![Ok(StreamEvent::Connected)];
            for (i, chunk) in self.chunks.iter().enumerate() {
                if self.fail_after == Some(i) {
                    events.push(Err(LlmError::Stream("connection reset".to_string())));
                    return Box::pin(futures_util::stream::iter(events));
                }
                events.push(Ok(StreamEvent::TextDelta {
                    text: chunk.clone(),
                }));
            }
            events.push(Ok(StreamEvent::MessageDelta {
                stop_reason: StopReason::EndTurn,
            }));
            events.push(Ok(StreamEvent::Done));
            Box::pin(futures_util::stream::iter(events))
        }
    }

    fn hub_with(provider: ScriptedProvider) -> (ChatHub<Arc<RecordingTransport>>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let hub = ChatHub::new(Arc::new(provider), transport.clone(), 1024);
        (hub, transport)
    }

    async fn joined(hub: &ChatHub<Arc<RecordingTransport>>, group: &str) -> ConnectionId {
        let conn = ConnectionId::new();
        hub.join_group(conn, group).await;
        conn
    }

    #[tokio::test]
    async fn plain_message_is_relayed_and_recorded() {
        let (hub, transport) = hub_with(ScriptedProvider::new(&[]));
        let alice = joined(&hub, "room1").await;

        hub.chat(alice, "Alice", "hello").await.unwrap();

        let transcript = hub.history.transcript("room1").unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, ChatRole::User);
        assert_eq!(transcript[0].author, "Alice");
        assert_eq!(transcript[0].content, "hello");

        let frames = transport.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].group, "room1");
        assert_eq!(frames[0].audience, Audience::Others(alice));
        assert!(matches!(
            &frames[0].event,
            ServerEvent::NewMessage { author, text } if author == "Alice" && text == "hello"
        ));

        // No streaming session for a non-triggered message.
        assert!(transport.updates().is_empty());
    }

    #[tokio::test]
    async fn chat_before_join_fails_without_side_effects() {
        let (hub, transport) = hub_with(ScriptedProvider::new(&["never"]));
        let stranger = ConnectionId::new();

        let result = hub.chat(stranger, "Eve", "@gpt hi").await;
        assert!(matches!(result, Err(ChatError::NotInGroup)));
        assert!(transport.frames().is_empty());
    }

    #[tokio::test]
    async fn triggered_message_streams_and_finalizes() {
        let (hub, transport) =
            hub_with(ScriptedProvider::new(&["4", " is", " the answer to that one"]));
        let bob = joined(&hub, "room1").await;

        hub.chat(bob, "Bob", "@gpt what is 2+2").await.unwrap();

        // Marker stripped from the history entry, original text relayed.
        let transcript = hub.history.transcript("room1").unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].content, "what is 2+2");
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        assert_eq!(transcript[1].author, ASSISTANT_AUTHOR);
        assert_eq!(transcript[1].content, "4 is the answer to that one");

        let relay = &transport.frames()[0];
        assert_eq!(relay.audience, Audience::Others(bob));
        assert!(matches!(
            &relay.event,
            ServerEvent::NewMessage { text, .. } if text == "@gpt what is 2+2"
        ));

        // One incremental flush past 20 chars, plus the unconditional final.
        let updates = transport.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].1, "4 is the answer to that one");
        assert_eq!(updates[1].1, "4 is the answer to that one");
        assert_eq!(updates[0].0, updates[1].0);
    }

    #[tokio::test]
    async fn short_reply_gets_exactly_one_final_update() {
        let (hub, transport) = hub_with(ScriptedProvider::new(&["ok"]));
        let bob = joined(&hub, "room1").await;

        hub.chat(bob, "Bob", "@gpt ping").await.unwrap();

        let updates = transport.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, "ok");
    }

    #[tokio::test]
    async fn empty_completion_still_finalizes_and_appends() {
        let (hub, transport) = hub_with(ScriptedProvider::new(&[]));
        let bob = joined(&hub, "room1").await;

        hub.chat(bob, "Bob", "@gpt anyone there").await.unwrap();

        let updates = transport.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, "");

        let transcript = hub.history.transcript("room1").unwrap();
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        assert_eq!(transcript[1].content, "");
    }

    #[tokio::test]
    async fn update_lengths_grow_monotonically_to_total() {
        let chunks = ["alpha ", "bravo ", "charlie ", "delta ", "echo ", "foxtrot"];
        let (hub, transport) = hub_with(ScriptedProvider::new(&chunks));
        let bob = joined(&hub, "room1").await;

        hub.chat(bob, "Bob", "@gpt spell it out").await.unwrap();

        let total: String = chunks.concat();
        let updates = transport.updates();
        assert!(updates.len() >= 2, "expected incremental flushes");

        let mut last_len = 0;
        for (_, text) in &updates {
            assert!(text.len() >= last_len, "broadcast lengths regressed");
            assert!(total.starts_with(text.as_str()));
            last_len = text.len();
        }
        assert_eq!(updates.last().unwrap().1, total);
    }

    #[tokio::test]
    async fn provider_failure_appends_no_assistant_message() {
        let (hub, transport) = hub_with(ScriptedProvider::failing_after(
            &["a partial reply well past the threshold", "never sent"],
            1,
        ));
        let bob = joined(&hub, "room1").await;

        let result = hub.chat(bob, "Bob", "@gpt doomed").await;
        assert!(matches!(result, Err(ChatError::Provider(_))));

        // Only the user message made it into history.
        let transcript = hub.history.transcript("room1").unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, ChatRole::User);

        // The partial flush stays visible as a stalled update.
        let updates = transport.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, "a partial reply well past the threshold");
    }

    #[tokio::test]
    async fn rejoin_moves_connection_between_groups() {
        let (hub, transport) = hub_with(ScriptedProvider::new(&[]));
        let alice = joined(&hub, "room1").await;
        hub.join_group(alice, "room2").await;

        hub.chat(alice, "Alice", "hi").await.unwrap();

        assert!(hub.history.transcript("room1").is_none());
        assert_eq!(hub.history.transcript("room2").unwrap().len(), 1);
        assert_eq!(transport.frames()[0].group, "room2");
    }

    #[tokio::test]
    async fn disconnect_removes_membership() {
        let (hub, _transport) = hub_with(ScriptedProvider::new(&[]));
        let alice = joined(&hub, "room1").await;

        hub.disconnect(alice).await;

        let result = hub.chat(alice, "Alice", "still here?").await;
        assert!(matches!(result, Err(ChatError::NotInGroup)));
    }

    #[tokio::test]
    async fn concurrent_sessions_carry_distinct_correlation_ids() {
        let (hub, transport) = hub_with(ScriptedProvider::new(&["fine"]));
        let bob = joined(&hub, "room1").await;

        hub.chat(bob, "Bob", "@gpt first").await.unwrap();
        hub.chat(bob, "Bob", "@gpt second").await.unwrap();

        let updates = transport.updates();
        assert_eq!(updates.len(), 2);
        assert_ne!(updates[0].0, updates[1].0);
    }
}
