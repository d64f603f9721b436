//! Assistant session use case.
//!
//! An `AssistantSession` owns one conversation with one persona: the
//! transcript, the single in-flight generation request, and the speech
//! state machine. All operations take `&self`, so a session can be shared
//! behind an `Arc` between an input loop and background tasks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use carebot_core::generation::{ErrorKind, ResponseClient};
use carebot_core::persona::PersonaConfig;
use carebot_core::session::{Message, RequestState, Transcript};
use carebot_core::speech::{
    SpeechCapabilities, SpeechEffect, SpeechEventSink, SpeechInput, SpeechIo, SpeechState,
    Utterance, transition,
};
use carebot_core::user::UserService;
use carebot_interaction::render_prompt;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Why a submission was turned away without touching the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyInput,
    RequestPending,
}

/// Why a turn ended with the persona's fallback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnFailure {
    /// The prompt template could not be rendered.
    Prompt,
    /// The generation call failed.
    Response(ErrorKind),
}

/// Result of [`AssistantSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    /// The backend replied; the bot message was appended.
    Answered(Message),
    /// The backend failed; the fallback message was appended.
    FellBack { message: Message, failure: TurnFailure },
    /// The session was reset while the request was in flight; nothing was
    /// appended.
    Discarded,
}

impl SubmitOutcome {
    /// The bot message appended by this call, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            SubmitOutcome::Answered(message) | SubmitOutcome::FellBack { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }
}

struct SessionState {
    transcript: Transcript,
    request_state: RequestState,
    /// Bumped by `reset`; responses tagged with an older value are dropped.
    generation: u64,
    last_error: Option<TurnFailure>,
}

pub struct AssistantSession {
    id: String,
    persona: Arc<PersonaConfig>,
    user_service: Arc<dyn UserService>,
    client: Arc<dyn ResponseClient>,
    speech: Arc<dyn SpeechIo>,
    capabilities: SpeechCapabilities,
    state: RwLock<SessionState>,
    speech_state: Arc<Mutex<SpeechState>>,
    // Held while speech effects run so they reach the adapter in the order
    // their transitions were computed.
    speech_effects: Mutex<()>,
    next_utterance_id: AtomicU64,
    next_capture_id: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl AssistantSession {
    /// Creates a session whose transcript holds only the persona greeting.
    pub fn new(
        persona: Arc<PersonaConfig>,
        user_service: Arc<dyn UserService>,
        client: Arc<dyn ResponseClient>,
        speech: Arc<dyn SpeechIo>,
    ) -> Self {
        let capabilities = speech.capabilities();
        let id = Uuid::new_v4().to_string();
        tracing::info!(session_id = %id, persona = %persona.id, "Session created");

        Self {
            id,
            state: RwLock::new(SessionState {
                transcript: Transcript::seeded(persona.greeting.clone()),
                request_state: RequestState::Idle,
                generation: 0,
                last_error: None,
            }),
            persona,
            user_service,
            client,
            speech,
            capabilities,
            speech_state: Arc::new(Mutex::new(SpeechState::Idle)),
            speech_effects: Mutex::new(()),
            next_utterance_id: AtomicU64::new(1),
            next_capture_id: AtomicU64::new(1),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn persona(&self) -> &PersonaConfig {
        &self.persona
    }

    pub fn speech_capabilities(&self) -> SpeechCapabilities {
        self.capabilities
    }

    // ============================================================================
    // Conversation
    // ============================================================================

    /// Sends one user turn and appends the reply.
    ///
    /// Blank input and input arriving while another request is pending are
    /// rejected without side effects. Otherwise the trimmed user message is
    /// appended before the backend is called, and exactly one bot message
    /// follows: the reply on success, the persona's fallback on failure.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let utterance = text.trim();
        if utterance.is_empty() {
            return SubmitOutcome::Rejected(RejectReason::EmptyInput);
        }

        let generation = {
            let mut state = self.state.write().await;
            if state.request_state.is_pending() {
                tracing::debug!(session_id = %self.id, "Submit rejected: request already pending");
                return SubmitOutcome::Rejected(RejectReason::RequestPending);
            }
            state.transcript.push(Message::user(utterance));
            state.request_state = RequestState::Pending;
            state.generation
        };

        let result = self.request_reply(utterance).await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(session_id = %self.id, "Discarding response that arrived after reset");
            return SubmitOutcome::Discarded;
        }

        let outcome = match result {
            Ok(text) => SubmitOutcome::Answered(Message::bot(text)),
            Err(failure) => {
                state.last_error = Some(failure);
                SubmitOutcome::FellBack {
                    message: Message::bot(self.persona.fallback_message.clone()),
                    failure,
                }
            }
        };
        if let Some(message) = outcome.message() {
            state.transcript.push(message.clone());
        }
        state.request_state = RequestState::Idle;
        outcome
    }

    async fn request_reply(&self, utterance: &str) -> Result<String, TurnFailure> {
        let user_name = self.user_service.get_user_name();
        let prompt = render_prompt(&self.persona, utterance, user_name.as_deref()).map_err(|err| {
            tracing::warn!(session_id = %self.id, error = %err, "Prompt rendering failed");
            TurnFailure::Prompt
        })?;

        self.client
            .send(&prompt, &self.persona.generation_params())
            .await
            .map_err(|err| {
                tracing::warn!(
                    session_id = %self.id,
                    kind = %err.kind(),
                    diagnostic = err.diagnostic(),
                    "Generation failed, using fallback message"
                );
                TurnFailure::Response(err.kind())
            })
    }

    /// Starts a new conversation: the transcript becomes the greeting alone
    /// and any in-flight response will be discarded.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.transcript.reset(self.persona.greeting.clone());
        state.request_state = RequestState::Idle;
        state.generation += 1;
        state.last_error = None;
        tracing::info!(session_id = %self.id, generation = state.generation, "Session reset");
    }

    /// Snapshot of the transcript.
    pub async fn transcript(&self) -> Transcript {
        self.state.read().await.transcript.clone()
    }

    pub async fn request_state(&self) -> RequestState {
        self.state.read().await.request_state
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.request_state.is_pending()
    }

    /// Failure of the most recent failed turn since the last reset.
    pub async fn last_error(&self) -> Option<TurnFailure> {
        self.state.read().await.last_error
    }

    // ============================================================================
    // Speech
    // ============================================================================

    pub fn speech_state(&self) -> SpeechState {
        lock(&self.speech_state).clone()
    }

    pub fn is_speaking(&self) -> bool {
        lock(&self.speech_state).is_speaking()
    }

    pub fn is_listening(&self) -> bool {
        lock(&self.speech_state).is_listening()
    }

    /// Reads `text` aloud, or stops if `text` is what is being read.
    ///
    /// Anything else active (listening, another message) is stopped first,
    /// so at most one playback exists at a time.
    pub fn toggle_speech(&self, text: &str) {
        if !self.capabilities.can_speak {
            tracing::debug!(session_id = %self.id, "Playback unavailable; toggle ignored");
            return;
        }

        self.drive_speech(|current| {
            if current.speaking_text() == Some(text) {
                SpeechInput::StopPlayback
            } else {
                SpeechInput::BeginPlayback {
                    utterance_id: self.next_utterance_id.fetch_add(1, Ordering::Relaxed),
                    text: text.to_string(),
                }
            }
        });
    }

    /// Captures one dictated utterance.
    ///
    /// Returns `None` when capture is unavailable, denied, heard nothing, or
    /// another capture is already running.
    pub async fn dictate(&self) -> Option<String> {
        if !self.capabilities.can_listen {
            tracing::debug!(session_id = %self.id, "Speech recognition unavailable");
            return None;
        }

        let capture_id = self.next_capture_id.fetch_add(1, Ordering::Relaxed);
        let mut already_listening = false;
        self.drive_speech(|current| {
            already_listening = current.is_listening();
            SpeechInput::BeginListening { capture_id }
        });
        if already_listening {
            return None;
        }

        let result = self.speech.listen_once().await;
        // No-op if a later capture has taken over in the meantime.
        self.drive_speech(|_| SpeechInput::EndListening { capture_id });

        match result {
            Ok(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(err) => {
                tracing::info!(session_id = %self.id, error = %err, "Dictation ended without text");
                None
            }
        }
    }

    /// Aborts an active capture; the pending [`dictate`](Self::dictate)
    /// returns `None`.
    pub fn stop_listening(&self) {
        if self.is_listening() {
            self.speech.stop_listening();
        }
    }

    /// Applies the input chosen by `choose` for the current state and runs
    /// the resulting effects against the adapter.
    fn drive_speech(&self, choose: impl FnOnce(&SpeechState) -> SpeechInput) {
        let _order = lock(&self.speech_effects);
        let effects = {
            let mut state = lock(&self.speech_state);
            let (next, effects) = transition(&state, choose(&state));
            *state = next;
            effects
        };

        for effect in effects {
            match effect {
                SpeechEffect::StopListening => self.speech.stop_listening(),
                SpeechEffect::CancelPlayback => self.speech.cancel(),
                SpeechEffect::StartPlayback { utterance_id, text } => {
                    tracing::debug!(session_id = %self.id, utterance_id, "Starting playback");
                    self.speech.speak(
                        Utterance {
                            id: utterance_id,
                            text,
                            voice: self.persona.voice.clone(),
                        },
                        self.playback_sink(),
                    );
                }
            }
        }
    }

    /// Sink feeding playback events back into the state machine. Playback
    /// events never produce effects, so it only touches the state.
    fn playback_sink(&self) -> SpeechEventSink {
        let speech_state = self.speech_state.clone();
        Arc::new(move |event| {
            let mut state = lock(&speech_state);
            let (next, _) = transition(&state, SpeechInput::Playback(event));
            *state = next;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use carebot_core::generation::{GenerationParams, ResponseError};
    use carebot_core::speech::{NoSpeech, SpeechError, SpeechEvent};
    use carebot_core::user::{DefaultUserService, StaticUserService};
    use carebot_interaction::{DADI_PERSONA, GeminiApiClient, TRIAGE_PERSONA};
    use serde_json::json;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // ============================================================================
    // Test doubles
    // ============================================================================

    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, ResponseError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn replying(replies: Vec<Result<String, ResponseError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl ResponseClient for ScriptedClient {
        async fn send(&self, prompt: &str, _params: &GenerationParams) -> Result<String, ResponseError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ResponseError::network("no scripted reply")))
        }
    }

    /// Holds the first request open until the test releases it.
    struct GatedClient {
        started: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<Option<oneshot::Receiver<Result<String, ResponseError>>>>,
    }

    impl GatedClient {
        fn new() -> (
            Self,
            oneshot::Receiver<()>,
            oneshot::Sender<Result<String, ResponseError>>,
        ) {
            let (started_tx, started_rx) = oneshot::channel();
            let (release_tx, release_rx) = oneshot::channel();
            let client = Self {
                started: Mutex::new(Some(started_tx)),
                release: Mutex::new(Some(release_rx)),
            };
            (client, started_rx, release_tx)
        }
    }

    #[async_trait]
    impl ResponseClient for GatedClient {
        async fn send(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, ResponseError> {
            if let Some(started) = self.started.lock().unwrap().take() {
                let _ = started.send(());
            }
            let release = self.release.lock().unwrap().take();
            match release {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ResponseError::network("gate dropped"))),
                None => Ok("ungated".to_string()),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum SpeechCall {
        Speak(u64, String),
        Cancel,
        StopListening,
    }

    #[derive(Default)]
    struct RecordingSpeech {
        calls: Mutex<Vec<SpeechCall>>,
        playing: Mutex<Option<u64>>,
        overlaps: AtomicU64,
        sink: Mutex<Option<SpeechEventSink>>,
        listen_result: Mutex<Option<Result<String, SpeechError>>>,
        listen_gates: Mutex<VecDeque<oneshot::Receiver<Result<String, SpeechError>>>>,
    }

    impl RecordingSpeech {
        fn with_listen_result(result: Result<String, SpeechError>) -> Self {
            Self {
                listen_result: Mutex::new(Some(result)),
                ..Self::default()
            }
        }

        /// Each call to `listen_once` waits on the next gate, in order.
        fn with_listen_gates(count: usize) -> (Self, Vec<oneshot::Sender<Result<String, SpeechError>>>) {
            let (senders, receivers): (Vec<_>, VecDeque<_>) =
                (0..count).map(|_| oneshot::channel()).unzip();
            let speech = Self {
                listen_gates: Mutex::new(receivers),
                ..Self::default()
            };
            (speech, senders)
        }

        fn calls(&self) -> Vec<SpeechCall> {
            self.calls.lock().unwrap().clone()
        }

        fn emit(&self, event: SpeechEvent) {
            let sink = self.sink.lock().unwrap().clone().expect("no playback started");
            sink(event);
        }
    }

    #[async_trait]
    impl SpeechIo for RecordingSpeech {
        fn capabilities(&self) -> SpeechCapabilities {
            SpeechCapabilities {
                can_listen: true,
                can_speak: true,
            }
        }

        async fn listen_once(&self) -> Result<String, SpeechError> {
            if let Some(result) = self.listen_result.lock().unwrap().take() {
                return result;
            }
            let gate = self.listen_gates.lock().unwrap().pop_front();
            match gate {
                Some(rx) => rx.await.unwrap_or(Err(SpeechError::NoSpeechDetected)),
                None => Err(SpeechError::NoSpeechDetected),
            }
        }

        fn stop_listening(&self) {
            self.calls.lock().unwrap().push(SpeechCall::StopListening);
        }

        fn speak(&self, utterance: Utterance, sink: SpeechEventSink) {
            let mut playing = self.playing.lock().unwrap();
            if playing.is_some() {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            *playing = Some(utterance.id);
            self.calls
                .lock()
                .unwrap()
                .push(SpeechCall::Speak(utterance.id, utterance.text));
            *self.sink.lock().unwrap() = Some(sink);
        }

        fn cancel(&self) {
            *self.playing.lock().unwrap() = None;
            self.calls.lock().unwrap().push(SpeechCall::Cancel);
        }
    }

    fn session_with(client: Arc<dyn ResponseClient>) -> AssistantSession {
        AssistantSession::new(
            Arc::new(DADI_PERSONA.clone()),
            Arc::new(DefaultUserService),
            client,
            Arc::new(NoSpeech),
        )
    }

    fn speaking_session(speech: Arc<RecordingSpeech>) -> AssistantSession {
        AssistantSession::new(
            Arc::new(TRIAGE_PERSONA.clone()),
            Arc::new(DefaultUserService),
            Arc::new(ScriptedClient::default()),
            speech,
        )
    }

    fn texts(transcript: &Transcript) -> Vec<String> {
        transcript.iter().map(|m| m.text().to_string()).collect()
    }

    async fn gemini_session(server: &MockServer) -> AssistantSession {
        session_with(Arc::new(GeminiApiClient::new(server.uri(), "gemini-test")))
    }

    // ============================================================================
    // Conversation
    // ============================================================================

    #[tokio::test]
    async fn test_new_session_holds_only_greeting() {
        let session = session_with(Arc::new(ScriptedClient::default()));
        let transcript = session.transcript().await;

        assert_eq!(texts(&transcript), vec![DADI_PERSONA.greeting.clone()]);
        assert!(transcript.messages()[0].is_bot());
        assert_eq!(session.request_state().await, RequestState::Idle);
    }

    #[tokio::test]
    async fn test_dadi_end_to_end_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Beta, rest and drink water." }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = gemini_session(&server).await;
        let outcome = session.submit("I have a mild headache").await;

        assert!(matches!(outcome, SubmitOutcome::Answered(_)));
        let transcript = session.transcript().await;
        assert_eq!(
            texts(&transcript),
            vec![
                DADI_PERSONA.greeting.clone(),
                "I have a mild headache".to_string(),
                "Beta, rest and drink water.".to_string(),
            ]
        );
        assert!(transcript.messages()[1].is_user());
        assert!(transcript.messages()[2].is_bot());
        assert_eq!(session.request_state().await, RequestState::Idle);
    }

    #[tokio::test]
    async fn test_http_500_appends_fallback_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let session = gemini_session(&server).await;
        let outcome = session.submit("help").await;

        assert_eq!(
            outcome.message().map(|m| m.text()),
            Some(DADI_PERSONA.fallback_message.as_str())
        );
        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 3);
        let bots: Vec<_> = transcript.iter().skip(1).filter(|m| m.is_bot()).collect();
        assert_eq!(bots.len(), 1);
        assert_eq!(bots[0].text(), DADI_PERSONA.fallback_message);
        assert!(!transcript.iter().any(|m| m.text().contains("internal")));
        assert_eq!(session.request_state().await, RequestState::Idle);
        assert_eq!(
            session.last_error().await,
            Some(TurnFailure::Response(ErrorKind::HttpStatus(500)))
        );
    }

    #[tokio::test]
    async fn test_empty_candidates_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let session = gemini_session(&server).await;
        let outcome = session.submit("help").await;

        assert!(matches!(
            outcome,
            SubmitOutcome::FellBack {
                failure: TurnFailure::Response(ErrorKind::MalformedPayload),
                ..
            }
        ));
        assert_eq!(
            session.transcript().await.last().map(|m| m.text().to_string()),
            Some(DADI_PERSONA.fallback_message.clone())
        );
        assert_eq!(session.request_state().await, RequestState::Idle);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let client = Arc::new(ScriptedClient::default());
        let session = session_with(client.clone());

        for input in ["", "   ", "\n\t"] {
            assert_eq!(
                session.submit(input).await,
                SubmitOutcome::Rejected(RejectReason::EmptyInput)
            );
        }
        assert_eq!(session.transcript().await.len(), 1);
        assert!(client.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_message_is_trimmed_and_prompt_personalized() {
        let client = Arc::new(ScriptedClient::replying(vec![Ok("Hello Asha".into())]));
        let session = AssistantSession::new(
            Arc::new(DADI_PERSONA.clone()),
            Arc::new(StaticUserService::new("Asha")),
            client.clone(),
            Arc::new(NoSpeech),
        );

        session.submit("  my knee hurts  ").await;

        let transcript = session.transcript().await;
        assert_eq!(transcript.messages()[1].text(), "my knee hurts");
        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Asha"));
        assert!(prompts[0].contains("User Message: my knee hurts"));
    }

    #[tokio::test]
    async fn test_submit_while_pending_is_rejected() {
        let (client, started, release) = GatedClient::new();
        let session = Arc::new(session_with(Arc::new(client)));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit("first").await }
        });
        started.await.unwrap();

        // The user message is already visible while the request is in flight.
        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().unwrap().text(), "first");
        assert!(session.is_loading().await);

        assert_eq!(
            session.submit("second").await,
            SubmitOutcome::Rejected(RejectReason::RequestPending)
        );
        assert_eq!(session.transcript().await.len(), 2);

        release.send(Ok("answer".into())).unwrap();
        let outcome = first.await.unwrap();
        assert_eq!(outcome.message().map(|m| m.text()), Some("answer"));
        assert_eq!(
            texts(&session.transcript().await)[1..].to_vec(),
            vec!["first".to_string(), "answer".to_string()]
        );
        assert!(!session.is_loading().await);
    }

    #[tokio::test]
    async fn test_reset_restores_greeting() {
        let client = Arc::new(ScriptedClient::replying(vec![
            Ok("one".into()),
            Err(ResponseError::network("down")),
        ]));
        let session = session_with(client);
        session.submit("a").await;
        session.submit("b").await;
        assert_eq!(session.transcript().await.len(), 5);
        assert!(session.last_error().await.is_some());

        session.reset().await;

        assert_eq!(
            texts(&session.transcript().await),
            vec![DADI_PERSONA.greeting.clone()]
        );
        assert_eq!(session.request_state().await, RequestState::Idle);
        assert_eq!(session.last_error().await, None);
    }

    #[tokio::test]
    async fn test_response_after_reset_is_discarded() {
        let (client, started, release) = GatedClient::new();
        let session = Arc::new(session_with(Arc::new(client)));

        let in_flight = tokio::spawn({
            let session = session.clone();
            async move { session.submit("before reset").await }
        });
        started.await.unwrap();

        session.reset().await;
        assert!(!session.is_loading().await);

        release.send(Ok("late answer".into())).unwrap();
        assert_eq!(in_flight.await.unwrap(), SubmitOutcome::Discarded);
        assert_eq!(
            texts(&session.transcript().await),
            vec![DADI_PERSONA.greeting.clone()]
        );
        assert_eq!(session.request_state().await, RequestState::Idle);
    }

    #[tokio::test]
    async fn test_session_accepts_input_after_failure() {
        let client = Arc::new(ScriptedClient::replying(vec![
            Err(ResponseError::malformed("empty")),
            Ok("recovered".into()),
        ]));
        let session = session_with(client);

        assert!(matches!(
            session.submit("first").await,
            SubmitOutcome::FellBack { .. }
        ));
        assert!(matches!(
            session.submit("second").await,
            SubmitOutcome::Answered(_)
        ));
        assert_eq!(
            session.transcript().await.last().map(|m| m.text().to_string()),
            Some("recovered".to_string())
        );
    }

    // ============================================================================
    // Speech
    // ============================================================================

    #[tokio::test]
    async fn test_toggle_other_text_restarts_without_overlap() {
        let speech = Arc::new(RecordingSpeech::default());
        let session = speaking_session(speech.clone());

        session.toggle_speech("first reply");
        session.toggle_speech("second reply");

        assert_eq!(
            speech.calls(),
            vec![
                SpeechCall::Speak(1, "first reply".into()),
                SpeechCall::Cancel,
                SpeechCall::Speak(2, "second reply".into()),
            ]
        );
        assert_eq!(speech.overlaps.load(Ordering::SeqCst), 0);
        assert_eq!(session.speech_state().speaking_text(), Some("second reply"));
    }

    #[tokio::test]
    async fn test_toggle_same_text_stops() {
        let speech = Arc::new(RecordingSpeech::default());
        let session = speaking_session(speech.clone());

        session.toggle_speech("reply");
        assert!(session.is_speaking());
        session.toggle_speech("reply");

        assert!(!session.is_speaking());
        assert_eq!(
            speech.calls(),
            vec![SpeechCall::Speak(1, "reply".into()), SpeechCall::Cancel]
        );
    }

    #[tokio::test]
    async fn test_stale_playback_event_is_ignored() {
        let speech = Arc::new(RecordingSpeech::default());
        let session = speaking_session(speech.clone());

        session.toggle_speech("old");
        session.toggle_speech("new");
        speech.emit(SpeechEvent::Ended(1));
        assert_eq!(session.speech_state().speaking_text(), Some("new"));

        speech.emit(SpeechEvent::Ended(2));
        assert_eq!(session.speech_state(), SpeechState::Idle);
    }

    #[tokio::test]
    async fn test_playback_failure_returns_to_idle() {
        let speech = Arc::new(RecordingSpeech::default());
        let session = speaking_session(speech.clone());

        session.toggle_speech("reply");
        speech.emit(SpeechEvent::Failed(1));

        assert_eq!(session.speech_state(), SpeechState::Idle);
    }

    #[tokio::test]
    async fn test_toggle_without_speech_support_is_inert() {
        let session = session_with(Arc::new(ScriptedClient::default()));

        session.toggle_speech("reply");

        assert_eq!(session.speech_state(), SpeechState::Idle);
        assert_eq!(session.dictate().await, None);
    }

    #[tokio::test]
    async fn test_dictate_returns_text_and_settles_idle() {
        let speech = Arc::new(RecordingSpeech::with_listen_result(Ok(
            "  chest pain since morning ".into(),
        )));
        let session = speaking_session(speech);

        assert_eq!(
            session.dictate().await.as_deref(),
            Some("chest pain since morning")
        );
        assert!(!session.is_listening());
    }

    #[tokio::test]
    async fn test_dictate_denied_is_none() {
        let speech = Arc::new(RecordingSpeech::with_listen_result(Err(SpeechError::Denied)));
        let session = speaking_session(speech);

        assert_eq!(session.dictate().await, None);
        assert_eq!(session.speech_state(), SpeechState::Idle);
    }

    #[tokio::test]
    async fn test_dictate_cancels_playback() {
        let speech = Arc::new(RecordingSpeech::with_listen_result(Ok("hello".into())));
        let session = speaking_session(speech.clone());

        session.toggle_speech("reply");
        session.dictate().await;

        assert_eq!(
            speech.calls(),
            vec![SpeechCall::Speak(1, "reply".into()), SpeechCall::Cancel]
        );
        assert_eq!(session.speech_state(), SpeechState::Idle);
    }

    #[tokio::test]
    async fn test_playback_while_listening_stops_capture() {
        let speech = Arc::new(RecordingSpeech::default());
        let session = speaking_session(speech.clone());
        session.drive_speech(|_| SpeechInput::BeginListening { capture_id: 1 });

        session.stop_listening();
        session.toggle_speech("reply");

        assert_eq!(
            speech.calls(),
            vec![
                SpeechCall::StopListening,
                SpeechCall::StopListening,
                SpeechCall::Speak(1, "reply".into()),
            ]
        );
        assert!(session.is_speaking());
    }

    #[tokio::test]
    async fn test_superseded_capture_does_not_end_newer_one() {
        let (speech, mut gates) = RecordingSpeech::with_listen_gates(2);
        let session = Arc::new(speaking_session(Arc::new(speech)));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.dictate().await }
        });
        while !session.is_listening() {
            tokio::task::yield_now().await;
        }

        // Playback interrupts the first capture, then a second capture starts.
        session.toggle_speech("hello");
        assert!(session.is_speaking());
        let second = tokio::spawn({
            let session = session.clone();
            async move { session.dictate().await }
        });
        while !session.is_listening() {
            tokio::task::yield_now().await;
        }

        let second_gate = gates.pop().unwrap();
        let first_gate = gates.pop().unwrap();
        first_gate.send(Err(SpeechError::NoSpeechDetected)).unwrap();
        assert_eq!(first.await.unwrap(), None);

        assert!(session.is_listening());
        assert_eq!(session.dictate().await, None);

        second_gate.send(Ok("second".into())).unwrap();
        assert_eq!(second.await.unwrap().as_deref(), Some("second"));
        assert_eq!(session.speech_state(), SpeechState::Idle);
    }
}
