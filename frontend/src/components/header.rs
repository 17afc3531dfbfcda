use leptos::prelude::*;

use crate::state::AppState;

/// Top bar with the app title and the light/dark toggle.
#[component]
pub fn Header() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <header class="app-bar">
            <div class="app-logo">"CDAC"</div>
            <h1 class="app-title">"CDAC-CHATBOT"</h1>
            <button
                class="theme-toggle"
                title="Toggle light/dark theme"
                on:click=move |_| state.toggle_theme()
            >
                {move || if state.dark_theme.get() { "☀" } else { "☾" }}
            </button>
        </header>
    }
}
