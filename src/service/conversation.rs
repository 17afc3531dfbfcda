use tracing::{error, info, warn};

use crate::clients::{CompletionClient, IngestionClient};
use crate::errors::ChatError;
use crate::export::encode_transcript;
use crate::models::{Document, IngestionOutcome, Message, Transcript};
use crate::protocol::CompletionRequest;

/// Identifies one dispatched completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl std::fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request that has been recorded in the transcript and must now be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCompletion {
    pub ticket: RequestTicket,
    pub request: CompletionRequest,
}

/// Result of handing user input to the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank input; nothing changed.
    Ignored,
    /// Another completion is still outstanding; nothing changed.
    Busy,
    /// User message appended and typing started; send `request` and call `resolve`.
    Dispatched(PendingCompletion),
}

/// How a send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Ignored,
    Rejected(ChatError),
    Replied,
    /// The transcript is left as it was; the error is only logged and reported here.
    Failed(ChatError),
    /// Answer for a ticket that is not in flight; dropped.
    Discarded,
}

/// Conversation state: the transcript plus the single in-flight request, if any.
///
/// All mutation goes through [`submit`](Self::submit) and
/// [`resolve`](Self::resolve), so the same logic serves the browser (where the
/// network call runs in a spawned task between the two) and
/// [`ConversationController`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversation {
    transcript: Transcript,
    in_flight: Option<RequestTicket>,
    next_ticket: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// True exactly while a completion request is outstanding.
    pub fn is_typing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<RequestTicket> {
        self.in_flight
    }

    pub fn submit(&mut self, text: &str) -> Submission {
        let text = text.trim();
        if text.is_empty() {
            return Submission::Ignored;
        }
        if let Some(ticket) = self.in_flight {
            warn!(%ticket, "send rejected: a completion request is already in flight");
            return Submission::Busy;
        }

        self.transcript.append(Message::user(text));

        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);

        Submission::Dispatched(PendingCompletion {
            ticket,
            request: CompletionRequest::from_transcript(&self.transcript),
        })
    }

    /// Applies the completion result for `ticket` and stops typing.
    pub fn resolve(&mut self, ticket: RequestTicket, result: Result<String, ChatError>) -> SendOutcome {
        if self.in_flight != Some(ticket) {
            warn!(%ticket, "discarding completion for a request that is not in flight");
            return SendOutcome::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(reply) => {
                self.transcript.append(Message::bot(reply));
                SendOutcome::Replied
            }
            Err(e) => {
                error!(%ticket, "Completion request failed: {e}");
                SendOutcome::Failed(e)
            }
        }
    }

    /// Abandons the request for `ticket` without touching the transcript.
    /// A reply that still arrives for it is discarded.
    pub fn cancel(&mut self, ticket: RequestTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        warn!(%ticket, "completion request abandoned before a reply arrived");
        self.in_flight = None;
        true
    }
}

/// Holds the in-flight ticket across an await; cancels it if dropped unresolved.
struct InFlightGuard<'a> {
    conversation: &'a mut Conversation,
    ticket: Option<RequestTicket>,
}

impl InFlightGuard<'_> {
    fn finish(mut self, result: Result<String, ChatError>) -> SendOutcome {
        match self.ticket.take() {
            Some(ticket) => self.conversation.resolve(ticket, result),
            None => SendOutcome::Discarded,
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.conversation.cancel(ticket);
        }
    }
}

/// Uploads `document` and reports the outcome; failures are logged, never raised.
pub async fn upload_document<I: IngestionClient>(client: &I, document: &Document) -> IngestionOutcome {
    let result = client.upload(document).await;
    match &result {
        Ok(()) => info!(file_name = %document.file_name, "Document uploaded"),
        Err(e) => error!(file_name = %document.file_name, "Document upload failed: {e}"),
    }
    IngestionOutcome::from(&result)
}

/// Owns the conversation and the service clients; drives whole round trips.
pub struct ConversationController<C, I> {
    conversation: Conversation,
    completion: C,
    ingestion: I,
}

impl<C: CompletionClient, I: IngestionClient> ConversationController<C, I> {
    pub fn new(completion: C, ingestion: I) -> Self {
        Self { conversation: Conversation::new(), completion, ingestion }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn transcript(&self) -> &Transcript {
        self.conversation.transcript()
    }

    pub fn completion_client(&self) -> &C {
        &self.completion
    }

    pub fn ingestion_client(&self) -> &I {
        &self.ingestion
    }

    /// Appends the trimmed user text, asks for a reply and appends it.
    ///
    /// Dropping the returned future mid-request (a timeout, a cancelled task)
    /// stops typing and keeps the user message; no bot message is added.
    pub async fn send_user_message(&mut self, text: &str) -> SendOutcome {
        let pending = match self.conversation.submit(text) {
            Submission::Ignored => return SendOutcome::Ignored,
            Submission::Busy => return SendOutcome::Rejected(ChatError::RequestInFlight),
            Submission::Dispatched(pending) => pending,
        };

        let guard = InFlightGuard {
            conversation: &mut self.conversation,
            ticket: Some(pending.ticket),
        };
        let result = self.completion.complete(&pending.request).await;
        guard.finish(result)
    }

    pub async fn upload_document(&self, document: &Document) -> IngestionOutcome {
        upload_document(&self.ingestion, document).await
    }

    pub fn export_spreadsheet(&self) -> Result<Vec<u8>, ChatError> {
        encode_transcript(self.conversation.transcript())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::clients::mock::{RecordingIngestionClient, ScriptedCompletionClient};
    use crate::models::{Sender, WELCOME_MESSAGE};
    use crate::protocol::{Role, MAX_REPLY_TOKENS};

    fn dispatched(submission: Submission) -> PendingCompletion {
        match submission {
            Submission::Dispatched(pending) => pending,
            other => panic!("expected a dispatched request, got {other:?}"),
        }
    }

    fn controller(
        completion: ScriptedCompletionClient,
    ) -> ConversationController<ScriptedCompletionClient, RecordingIngestionClient> {
        ConversationController::new(completion, RecordingIngestionClient::accepting())
    }

    // ── State machine ────────────────────────────────────────────────────────

    #[test]
    fn submit_appends_trimmed_user_message_before_dispatch() {
        let mut conv = Conversation::new();
        let pending = dispatched(conv.submit("  hello there \n"));

        assert_eq!(conv.transcript().len(), 2);
        let last = conv.transcript().last().unwrap();
        assert_eq!(last.sender(), Sender::User);
        assert_eq!(last.text(), "hello there");

        // The request already contains the user message.
        let turns = &pending.request.messages;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::Assistant);
        assert_eq!(turns[0].content, WELCOME_MESSAGE);
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[1].content, "hello there");
        assert_eq!(pending.request.max_tokens, MAX_REPLY_TOKENS);
    }

    #[test]
    fn whitespace_only_input_is_ignored() {
        let mut conv = Conversation::new();
        for blank in ["", "   ", "\t\n "] {
            assert_eq!(conv.submit(blank), Submission::Ignored);
        }
        assert_eq!(conv.transcript().len(), 1);
        assert!(!conv.is_typing());
    }

    #[test]
    fn typing_is_set_only_between_dispatch_and_resolution() {
        let mut conv = Conversation::new();
        assert!(!conv.is_typing());

        let pending = dispatched(conv.submit("hi"));
        assert!(conv.is_typing());
        assert_eq!(conv.in_flight(), Some(pending.ticket));

        conv.resolve(pending.ticket, Ok("Hi".into()));
        assert!(!conv.is_typing());

        let pending = dispatched(conv.submit("again"));
        assert!(conv.is_typing());
        conv.resolve(pending.ticket, Err(ChatError::network("connection reset")));
        assert!(!conv.is_typing());
    }

    #[test]
    fn successful_resolution_appends_exactly_one_bot_message() {
        let mut conv = Conversation::new();
        let pending = dispatched(conv.submit("hi"));

        assert_eq!(conv.resolve(pending.ticket, Ok("Hi".into())), SendOutcome::Replied);
        assert_eq!(conv.transcript().len(), 3);
        let last = conv.transcript().last().unwrap();
        assert_eq!(last.sender(), Sender::Bot);
        assert_eq!(last.text(), "Hi");
    }

    #[test]
    fn failed_resolution_leaves_transcript_alone() {
        let mut conv = Conversation::new();
        let pending = dispatched(conv.submit("hi"));
        let before = conv.transcript().clone();

        let err = ChatError::malformed("response has no choices");
        assert_eq!(conv.resolve(pending.ticket, Err(err.clone())), SendOutcome::Failed(err));
        assert_eq!(conv.transcript(), &before);
    }

    #[test]
    fn overlapping_submission_is_rejected_without_mutation() {
        let mut conv = Conversation::new();
        let first = dispatched(conv.submit("first"));
        let snapshot = conv.clone();

        assert_eq!(conv.submit("second"), Submission::Busy);
        assert_eq!(conv, snapshot);

        // Once the first reply lands, the next send goes through in order.
        conv.resolve(first.ticket, Ok("reply to first".into()));
        let second = dispatched(conv.submit("second"));
        conv.resolve(second.ticket, Ok("reply to second".into()));

        let texts: Vec<&str> = conv.transcript().messages().iter().map(Message::text).collect();
        assert_eq!(
            texts,
            [WELCOME_MESSAGE, "first", "reply to first", "second", "reply to second"]
        );
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut conv = Conversation::new();
        let first = dispatched(conv.submit("first"));
        conv.resolve(first.ticket, Ok("one".into()));
        let second = dispatched(conv.submit("second"));
        let snapshot = conv.clone();

        // A late duplicate answer for the first request must not land or stop typing.
        assert_eq!(conv.resolve(first.ticket, Ok("late".into())), SendOutcome::Discarded);
        assert_eq!(conv, snapshot);
        assert!(conv.is_typing());
        assert_ne!(first.ticket, second.ticket);
    }

    #[test]
    fn cancel_stops_typing_and_keeps_the_user_message() {
        let mut conv = Conversation::new();
        let pending = dispatched(conv.submit("hi"));
        let other = RequestTicket(pending.ticket.0 + 1);

        assert!(!conv.cancel(other));
        assert!(conv.is_typing());

        assert!(conv.cancel(pending.ticket));
        assert!(!conv.is_typing());
        assert_eq!(conv.transcript().len(), 2);
        assert_eq!(conv.transcript().last().map(Message::sender), Some(Sender::User));

        // The abandoned request can no longer land.
        assert_eq!(conv.resolve(pending.ticket, Ok("late".into())), SendOutcome::Discarded);
        assert_eq!(conv.transcript().len(), 2);
    }

    // ── Controller ───────────────────────────────────────────────────────────

    /// Never answers its first request; answers every later one.
    #[derive(Default)]
    struct StallsOnce {
        calls: AtomicUsize,
    }

    impl CompletionClient for StallsOnce {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, ChatError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            Ok("answered".into())
        }
    }

    #[tokio::test]
    async fn send_user_message_round_trip() {
        let mut ctl = controller(ScriptedCompletionClient::new().reply("Hi"));

        assert_eq!(ctl.send_user_message("hello").await, SendOutcome::Replied);
        assert!(!ctl.conversation().is_typing());

        let texts: Vec<&str> = ctl.transcript().messages().iter().map(Message::text).collect();
        assert_eq!(texts, [WELCOME_MESSAGE, "hello", "Hi"]);

        let requests = ctl.completion_client().recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages.last().map(|t| t.content.as_str()), Some("hello"));
    }

    #[tokio::test]
    async fn blank_send_makes_no_network_call() {
        let mut ctl = controller(ScriptedCompletionClient::new().reply("unused"));

        assert_eq!(ctl.send_user_message("   ").await, SendOutcome::Ignored);
        assert_eq!(ctl.transcript().len(), 1);
        assert_eq!(ctl.completion_client().call_count(), 0);
    }

    #[tokio::test]
    async fn malformed_reply_is_reported_not_appended() {
        let mut ctl =
            controller(ScriptedCompletionClient::new().fail(ChatError::malformed("no choices")));

        let outcome = ctl.send_user_message("hello").await;
        assert!(matches!(outcome, SendOutcome::Failed(ref e) if e.is_malformed()));
        assert_eq!(ctl.transcript().len(), 2);
        assert_eq!(ctl.transcript().last().map(Message::sender), Some(Sender::User));
        assert!(!ctl.conversation().is_typing());
    }

    #[tokio::test]
    async fn conversation_stays_usable_after_failure() {
        let mut ctl = controller(
            ScriptedCompletionClient::new()
                .fail(ChatError::network("connection refused"))
                .reply("back online"),
        );

        ctl.send_user_message("one").await;
        assert_eq!(ctl.send_user_message("two").await, SendOutcome::Replied);

        let requests = ctl.completion_client().recorded_requests();
        // The unanswered user turn is still part of the history sent next time.
        let contents: Vec<&str> = requests[1].messages.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, [WELCOME_MESSAGE, "one", "two"]);
    }

    #[tokio::test]
    async fn upload_reports_outcome() {
        let ctl = controller(ScriptedCompletionClient::new());
        let doc = Document::new("notes.txt", b"hello".to_vec());

        assert_eq!(ctl.upload_document(&doc).await, IngestionOutcome::Success);
        assert_eq!(ctl.ingestion_client().recorded_uploads(), vec![doc.clone()]);

        let failing = RecordingIngestionClient::failing(ChatError::UnexpectedStatus {
            status: 500,
            body: String::new(),
        });
        assert_eq!(upload_document(&failing, &doc).await, IngestionOutcome::Failure);
        assert_eq!(ctl.transcript().len(), 1);
    }

    #[tokio::test]
    async fn export_reflects_current_transcript() {
        let mut ctl = controller(ScriptedCompletionClient::new().reply("hello"));
        ctl.send_user_message("hi").await;

        let bytes = ctl.export_spreadsheet().unwrap();
        assert!(bytes.starts_with(b"PK"), "xlsx is a zip container");
        assert_eq!(ctl.transcript().len(), 3);
    }

    #[tokio::test]
    async fn dropped_send_does_not_leave_typing_stuck() {
        let mut ctl =
            ConversationController::new(StallsOnce::default(), RecordingIngestionClient::accepting());

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), ctl.send_user_message("first")).await;
        assert!(timed_out.is_err());
        assert!(!ctl.conversation().is_typing());
        assert_eq!(ctl.conversation().in_flight(), None);

        assert_eq!(ctl.send_user_message("second").await, SendOutcome::Replied);
        let texts: Vec<&str> = ctl.transcript().messages().iter().map(Message::text).collect();
        assert_eq!(texts, [WELCOME_MESSAGE, "first", "second", "answered"]);
    }
}
