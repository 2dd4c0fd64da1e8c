mod api;
mod browser;
mod components;
mod state;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use browser::{current_path, LOGIN_PATH, REGISTER_PATH};
use components::auth::{LoginPage, RegisterPage};
use components::chat::ChatArea;
use components::sidebar::Sidebar;
use state::AppState;

/// Root application component. The page follows the path; the chat needs a session.
#[component]
fn App() -> impl IntoView {
    let state = AppState::provide();

    match current_path().as_str() {
        LOGIN_PATH => view! { <LoginPage /> }.into_any(),
        REGISTER_PATH => view! { <RegisterPage /> }.into_any(),
        _ if !state.is_authenticated() => view! { <LoginPage /> }.into_any(),
        _ => {
            state.start();
            view! {
                <div class="app-container">
                    <Sidebar />
                    <ChatArea />
                </div>
            }
            .into_any()
        }
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}
