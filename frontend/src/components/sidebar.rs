use leptos::ev;
use leptos::prelude::*;

use crate::state::AppState;

/// Sidebar: account, persona picker, conversation list and actions.
#[component]
pub fn Sidebar() -> impl IntoView {
    let state = expect_context::<AppState>();
    let chat = state.chat;
    let username = state.username().unwrap_or_default();

    let on_persona = move |ev: ev::Event| {
        let id = event_target_value(&ev);
        state.select_persona((!id.is_empty()).then_some(id));
    };

    view! {
        <aside class="sidebar">
            <div class="sidebar-header">
                <h2>"Persona Chat"</h2>
                <div class="username">{username}</div>
                <button
                    class="new-chat-btn"
                    on:click=move |_| state.new_conversation()
                    disabled=move || chat.with(|s| s.is_busy())
                >
                    {move || if chat.with(|s| s.is_creating) { "Creating…" } else { "+ New Chat" }}
                </button>
                <select class="persona-select" on:change=on_persona>
                    <option value="">"Assistant"</option>
                    <For
                        each=move || state.personas.get()
                        key=|p| p.id.clone()
                        let:persona
                    >
                        <option value=persona.id.clone()>{persona.name}</option>
                    </For>
                </select>
            </div>
            <div class="conversation-list">
                {move || {
                    if chat.with(|s| s.conversations.is_empty()) {
                        view! {
                            <div style="padding:1rem;color:var(--text-secondary);font-size:0.85rem">
                                "No conversations yet"
                            </div>
                        }.into_any()
                    } else {
                        view! {
                            <For
                                each=move || chat.with(|s| s.conversations.clone())
                                key=|c| c.id.clone()
                                let:conv
                            >
                                {
                                    let id_click = conv.id.clone();
                                    let id_active = conv.id.clone();
                                    let title = if conv.title.is_empty() {
                                        "Untitled chat".to_string()
                                    } else {
                                        conv.title
                                    };
                                    view! {
                                        <div
                                            class="conversation-item"
                                            class:active=move || {
                                                chat.with(|s| s.active_conversation.as_deref() == Some(id_active.as_str()))
                                            }
                                            on:click=move |_| state.switch_conversation(id_click.clone())
                                        >
                                            {title}
                                        </div>
                                    }
                                }
                            </For>
                        }.into_any()
                    }
                }}
            </div>
            <div class="sidebar-footer">
                <button
                    on:click=move |_| state.test_connectivity()
                    disabled=move || chat.with(|s| s.is_testing)
                >
                    {move || if chat.with(|s| s.is_testing) { "Testing…" } else { "Test API" }}
                </button>
                <button on:click=move |_| state.logout()>"Log out"</button>
            </div>
        </aside>
    }
}
