use leptos::prelude::*;

use crate::state::AppState;

/// Upload notice; hides itself after a few seconds.
#[component]
pub fn AlertSnackbar() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <Show when=move || state.alert.with(|a| a.visible)>
            <div class="snackbar" role="status" on:click=move |_| state.dismiss_alert()>
                {move || state.alert.with(|a| a.message.clone())}
            </div>
        </Show>
    }
}
