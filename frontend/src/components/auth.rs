use gloo_timers::callback::Timeout;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;

use persona_chat::service::REGISTER_REDIRECT_DELAY;

use crate::browser::{go_to, CHAT_PATH, LOGIN_PATH, REGISTER_PATH};
use crate::state::AppState;

#[component]
pub fn LoginPage() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (username, set_username) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal(None::<String>);
    let (pending, set_pending) = signal(false);

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if pending.get_untracked() {
            return;
        }
        set_pending.set(true);
        set_error.set(None);

        let auth = state.auth();
        let (user, pass) = (username.get_untracked(), password.get_untracked());
        spawn_local(async move {
            match auth.login(&user, &pass).await {
                Ok(_) => go_to(CHAT_PATH),
                Err(e) => {
                    set_error.set(Some(e.to_string()));
                    set_pending.set(false);
                }
            }
        });
    };

    view! {
        <div class="auth-page">
            <form class="auth-card" on:submit=on_submit>
                <h2>"Log in"</h2>
                {move || error.get().map(|err| view! { <div class="error-banner">{err}</div> })}
                <input
                    type="text"
                    placeholder="Username"
                    prop:value=username
                    on:input=move |ev| set_username.set(event_target_value(&ev))
                />
                <input
                    type="password"
                    placeholder="Password"
                    prop:value=password
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                />
                <button type="submit" class="send-btn" disabled=pending>
                    {move || if pending.get() { "Logging in…" } else { "Log in" }}
                </button>
                <a href=REGISTER_PATH>"No account? Register"</a>
            </form>
        </div>
    }
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (username, set_username) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal(None::<String>);
    let (pending, set_pending) = signal(false);
    let (done, set_done) = signal(false);

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if pending.get_untracked() || done.get_untracked() {
            return;
        }
        set_pending.set(true);
        set_error.set(None);

        let auth = state.auth();
        let (user, mail, pass) = (username.get_untracked(), email.get_untracked(), password.get_untracked());
        spawn_local(async move {
            match auth.register(&user, &pass, &mail).await {
                Ok(()) => {
                    set_done.set(true);
                    Timeout::new(REGISTER_REDIRECT_DELAY.as_millis() as u32, || go_to(LOGIN_PATH)).forget();
                }
                Err(e) => set_error.set(Some(e.to_string())),
            }
            set_pending.set(false);
        });
    };

    view! {
        <div class="auth-page">
            {move || {
                if done.get() {
                    view! {
                        <div class="auth-card">
                            <h2>"Registration successful"</h2>
                            <p>"Redirecting to the login page…"</p>
                        </div>
                    }.into_any()
                } else {
                    view! {
                        <form class="auth-card" on:submit=on_submit>
                            <h2>"Register"</h2>
                            {move || error.get().map(|err| view! { <div class="error-banner">{err}</div> })}
                            <input
                                type="text"
                                placeholder="Username"
                                prop:value=username
                                on:input=move |ev| set_username.set(event_target_value(&ev))
                            />
                            <input
                                type="email"
                                placeholder="Email"
                                prop:value=email
                                on:input=move |ev| set_email.set(event_target_value(&ev))
                            />
                            <input
                                type="password"
                                placeholder="Password"
                                prop:value=password
                                on:input=move |ev| set_password.set(event_target_value(&ev))
                            />
                            <button type="submit" class="send-btn" disabled=pending>
                                {move || if pending.get() { "Registering…" } else { "Register" }}
                            </button>
                            <a href=LOGIN_PATH>"Already registered? Log in"</a>
                        </form>
                    }.into_any()
                }
            }}
        </div>
    }
}
