use leptos::ev;
use leptos::prelude::*;

use cdac_chatbot::{Message, Sender};

use crate::state::AppState;

/// Message history, typing indicator and the input/actions row.
#[component]
pub fn ChatArea() -> impl IntoView {
    let state = expect_context::<AppState>();
    let messages_ref = NodeRef::<leptos::html::Div>::new();

    // Keep the newest message in view.
    Effect::new(move || {
        state
            .conversation
            .with(|c| (c.transcript().len(), c.is_typing()));
        if let Some(el) = messages_ref.get() {
            el.set_scroll_top(el.scroll_height());
        }
    });

    view! {
        <main class="chat-area">
            // Error banner
            {move || {
                state.error.get().map(|err| {
                    view! {
                        <div class="error-banner">{err}</div>
                    }
                })
            }}

            <div class="messages-container" node_ref=messages_ref>
                <For
                    each=move || {
                        state.conversation.with(|c| {
                            c.transcript().messages().iter().cloned().enumerate().collect::<Vec<_>>()
                        })
                    }
                    key=|(idx, _)| *idx
                    let:entry
                >
                    <MessageBubble message=entry.1 />
                </For>
                {move || {
                    state.is_typing().then(|| {
                        view! {
                            <div class="typing-indicator">
                                "Bot typing"<span class="typing-dots">"..."</span>
                            </div>
                        }
                    })
                }}
            </div>

            <ChatInput />
        </main>
    }
}

/// A single chat message bubble.
#[component]
fn MessageBubble(message: Message) -> impl IntoView {
    let css_class = match message.sender() {
        Sender::User => "message user",
        Sender::Bot => "message bot",
    };

    view! {
        <div class=css_class>
            <div class="bubble">{message.text().to_string()}</div>
        </div>
    }
}

/// Text input plus Send, Upload and Download actions.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());
    let input_ref = NodeRef::<leptos::html::Input>::new();
    let file_ref = NodeRef::<leptos::html::Input>::new();

    let is_sending = move || state.is_typing();

    let focus_input = move || {
        if let Some(el) = input_ref.get() {
            let _ = el.focus();
        }
    };

    Effect::new(move || focus_input());

    // The input is disabled while the reply is pending, so focus comes back
    // only once typing ends.
    Effect::new(move |was_typing: Option<bool>| {
        let typing = is_sending();
        if should_refocus(was_typing, typing) {
            focus_input();
        }
        typing
    });

    let send = move || {
        if state.send_message(&input.get_untracked()) {
            set_input.set(String::new());
        }
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" {
            ev.prevent_default();
            send();
        }
    };

    let on_upload_click = move |_| {
        if let Some(picker) = file_ref.get() {
            picker.click();
        }
    };

    let on_file_change = move |_: ev::Event| {
        let Some(picker) = file_ref.get() else {
            return;
        };
        if let Some(file) = picker.files().and_then(|files| files.get(0)) {
            state.upload_file(file);
        }
        // Allow picking the same file again.
        picker.set_value("");
    };

    view! {
        <div class="input-area">
            <input
                class="chat-input"
                type="text"
                placeholder="Type your message..."
                node_ref=input_ref
                prop:value=input
                on:input=move |ev| set_input.set(event_target_value(&ev))
                on:keydown=on_keydown
                disabled=is_sending
            />
            <div class="actions-row">
                <button
                    class="send-btn"
                    on:click=move |_| send()
                    disabled=move || is_sending() || input.get().trim().is_empty()
                >
                    "Send"
                </button>
                <button class="upload-btn" on:click=on_upload_click>
                    "Upload"
                </button>
                <button class="download-btn" on:click=move |_| state.download_transcript()>
                    "Download"
                </button>
            </div>
            <input type="file" class="file-picker" node_ref=file_ref on:change=on_file_change />
        </div>
    }
}

/// True when a pending reply has just finished.
fn should_refocus(was_typing: Option<bool>, typing: bool) -> bool {
    was_typing == Some(true) && !typing
}
