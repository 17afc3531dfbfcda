mod api;
mod components;
mod download;
mod state;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use components::alert::AlertSnackbar;
use components::chat::ChatArea;
use components::header::Header;
use state::AppState;

/// Root application component.
#[component]
fn App() -> impl IntoView {
    let state = AppState::provide();

    view! {
        <div class="app-container" class:dark=move || state.dark_theme.get()>
            <Header />
            <ChatArea />
            <AlertSnackbar />
        </div>
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}
