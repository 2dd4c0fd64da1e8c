use leptos::ev;
use leptos::prelude::*;

use persona_chat::models::MessageRole;
use persona_chat::service::NoticeKind;

use crate::state::AppState;

/// Main chat area with notices, message history and input.
#[component]
pub fn ChatArea() -> impl IntoView {
    let state = expect_context::<AppState>();
    let chat = state.chat;

    view! {
        <main class="chat-area">
            <Toast />

            <div class="chat-header">
                {move || {
                    match chat.with(|s| s.active_conversation.clone()) {
                        Some(id) => format!("Conversation: {}", short_id(&id)),
                        None => "New conversation".to_string(),
                    }
                }}
            </div>

            <div class="messages-container">
                {move || {
                    if chat.with(|s| s.is_loading_history) {
                        view! { <div class="empty-state">"Loading conversation…"</div> }.into_any()
                    } else if chat.with(|s| s.messages.is_empty()) {
                        view! {
                            <div class="empty-state">
                                "Send a message to start chatting"
                            </div>
                        }.into_any()
                    } else {
                        view! {
                            <For
                                each=move || chat.with(|s| s.messages.clone())
                                key=|m| m.id.clone()
                                let:msg
                            >
                                <MessageBubble role=msg.role content=msg.content />
                            </For>
                        }.into_any()
                    }
                }}
                // Reply pending
                {move || {
                    chat.with(|s| s.is_sending).then(|| {
                        view! {
                            <div class="message assistant">
                                <div class="role-label">"assistant"</div>
                                <div class="streaming-cursor">"Thinking…"</div>
                            </div>
                        }
                    })
                }}
            </div>

            <ChatInput />
        </main>
    }
}

/// Transient success / error notice. Click to dismiss early.
#[component]
fn Toast() -> impl IntoView {
    let state = expect_context::<AppState>();

    move || {
        state.chat.with(|s| s.notice.clone()).map(|notice| {
            let class = match notice.kind {
                NoticeKind::Success => "toast success",
                NoticeKind::Error => "toast error-banner",
            };
            let id = notice.id;
            view! {
                <div class=class on:click=move |_| state.dismiss_notice(id)>
                    {notice.text}
                </div>
            }
        })
    }
}

#[component]
fn MessageBubble(role: MessageRole, content: String) -> impl IntoView {
    let css_class = match role {
        MessageRole::User => "message user",
        _ => "message assistant",
    };

    view! {
        <div class=css_class>
            <div class="role-label">{role.as_str()}</div>
            <div>{content}</div>
        </div>
    }
}

/// Input bound to the manager's draft, so a failed create keeps the text.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let chat = state.chat;

    let busy = move || chat.with(|s| !s.can_send());

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            state.send();
        }
    };

    view! {
        <div class="input-area">
            <div class="input-row">
                <textarea
                    rows="1"
                    placeholder="Type a message… (Enter to send, Shift+Enter for newline)"
                    prop:value=move || chat.with(|s| s.draft.clone())
                    on:input=move |ev| state.set_draft(event_target_value(&ev))
                    on:keydown=on_keydown
                    disabled=busy
                />
                <button
                    class="send-btn"
                    on:click=move |_| state.send()
                    disabled=move || busy() || chat.with(|s| s.draft.trim().is_empty())
                >
                    {move || {
                        chat.with(|s| {
                            if s.is_creating {
                                "Creating…"
                            } else if s.is_sending {
                                "Sending…"
                            } else {
                                "Send"
                            }
                        })
                    }}
                </button>
            </div>
        </div>
    }
}

/// First eight characters of an id, for the header.
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}
