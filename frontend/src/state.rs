use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use web_sys::File;

use cdac_chatbot::export::{EXPORT_FILE_NAME, XLSX_CONTENT_TYPE, encode_transcript};
use cdac_chatbot::models::ALERT_AUTO_HIDE;
use cdac_chatbot::service::conversation::upload_document;
use cdac_chatbot::{
    AlertNotice, ChatConfig, CompletionClient, Conversation, IngestionOutcome, SendOutcome, Submission,
};

use crate::api::{self, CompletionApi, IngestionApi};
use crate::download;

/// Shared application state, provided via Leptos context.
#[derive(Clone, Copy)]
pub struct AppState {
    // --- Read signals (for components to subscribe to) ---
    pub conversation: ReadSignal<Conversation>,
    pub dark_theme: ReadSignal<bool>,
    pub alert: ReadSignal<AlertNotice>,
    pub error: ReadSignal<Option<String>>,

    // --- Write signals (for mutating state) ---
    pub set_conversation: WriteSignal<Conversation>,
    pub set_dark_theme: WriteSignal<bool>,
    pub set_alert: WriteSignal<AlertNotice>,
    pub set_error: WriteSignal<Option<String>>,

    /// Service URLs and the request deadline, fixed at build time.
    config: StoredValue<ChatConfig>,

    /// Bumped per notice so an older timer never hides a newer notice.
    alert_seq: StoredValue<u64>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (conversation, set_conversation) = signal(Conversation::new());
        let (dark_theme, set_dark_theme) = signal(true);
        let (alert, set_alert) = signal(AlertNotice::default());
        let (error, set_error) = signal(None::<String>);

        let state = Self {
            conversation,
            dark_theme,
            alert,
            error,
            set_conversation,
            set_dark_theme,
            set_alert,
            set_error,
            config: StoredValue::new(api::load_config()),
            alert_seq: StoredValue::new(0),
        };

        provide_context(state);
        state
    }

    pub fn is_typing(&self) -> bool {
        self.conversation.with(Conversation::is_typing)
    }

    /// Records the user message and starts the completion round trip.
    /// Returns `true` when a request was dispatched.
    pub fn send_message(&self, text: &str) -> bool {
        let Some(submission) = self.set_conversation.try_update(|c| c.submit(text)) else {
            return false;
        };

        let pending = match submission {
            Submission::Dispatched(pending) => pending,
            Submission::Busy => {
                log::warn!("Send ignored: waiting for the previous reply");
                return false;
            }
            Submission::Ignored => return false,
        };

        self.set_error.set(None);
        let client = self.config.with_value(CompletionApi::from_config);
        let state = *self;
        spawn_local(async move {
            let result = client.complete(&pending.request).await;
            let outcome = state
                .set_conversation
                .try_update(|c| c.resolve(pending.ticket, result));
            if let Some(SendOutcome::Failed(e)) = outcome {
                state.set_error.set(Some(e.to_string()));
            }
        });
        true
    }

    /// Uploads the picked file and shows the outcome notice.
    pub fn upload_file(&self, file: File) {
        let client = self.config.with_value(IngestionApi::from_config);
        let state = *self;
        spawn_local(async move {
            let outcome = match api::read_file(&file).await {
                Ok(document) => upload_document(&client, &document).await,
                Err(e) => {
                    log::error!("Failed to read {}: {e}", file.name());
                    IngestionOutcome::Failure
                }
            };
            state.show_alert(AlertNotice::for_outcome(outcome));
        });
    }

    /// Saves the transcript as `ChatOutput.xlsx`.
    pub fn download_transcript(&self) {
        let encoded = self.conversation.with_untracked(|c| encode_transcript(c.transcript()));
        let result = match encoded {
            Ok(bytes) => download::save_bytes(EXPORT_FILE_NAME, XLSX_CONTENT_TYPE, &bytes)
                .map_err(|e| format!("Download failed: {e:?}")),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            log::error!("{e}");
            self.set_error.set(Some(e));
        }
    }

    pub fn toggle_theme(&self) {
        self.set_dark_theme.update(|dark| *dark = !*dark);
    }

    fn show_alert(&self, notice: AlertNotice) {
        let seq = self.alert_seq.get_value() + 1;
        self.alert_seq.set_value(seq);
        self.set_alert.set(notice);

        let state = *self;
        Timeout::new(ALERT_AUTO_HIDE.as_millis() as u32, move || {
            if state.alert_seq.get_value() == seq {
                state.set_alert.update(AlertNotice::dismiss);
            }
        })
        .forget();
    }

    pub fn dismiss_alert(&self) {
        self.set_alert.update(AlertNotice::dismiss);
    }
}
