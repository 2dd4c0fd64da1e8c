//! Terminal host: argument parsing, wiring and the interactive chat loop.

use std::io::Write;
use std::rc::Rc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::{ApiClient, ReqwestTransport};
use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::models::{MemoryKind, MessageRole, NewPersona, PersonaMode};
use crate::navigation::LoginRedirect;
use crate::service::{AuthService, ChatState, ConversationManager, NoticeKind};
use crate::session::SessionStore;
use crate::storage::FileStorage;

#[derive(Debug, Parser)]
#[command(name = "persona-chat", version, about = "Terminal client for the persona chat service")]
pub struct Cli {
    /// Overrides CHAT_API_BASE_URL.
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "CHAT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long, env = "CHAT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        email: String,
    },
    /// Sign out and forget the session
    Logout,
    /// Connectivity test
    Ping,
    /// List your conversations
    Conversations,
    /// Interactive chat
    Chat {
        /// Resume this conversation instead of starting a new one
        #[arg(long)]
        conversation: Option<String>,
        /// Talk to this persona
        #[arg(long)]
        persona: Option<String>,
    },
    Personas {
        #[command(subcommand)]
        action: PersonaCommand,
    },
    Memories {
        #[command(subcommand)]
        action: MemoryCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum PersonaCommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        system_prompt: String,
        #[arg(long, value_enum, default_value_t = ModeArg::Custom)]
        mode: ModeArg,
        #[arg(long, default_value = "")]
        avatar: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum MemoryCommand {
    List {
        #[arg(long)]
        persona: String,
    },
    Add {
        #[arg(long)]
        persona: String,
        /// fact, preference, event, emotion or relationship
        #[arg(long)]
        kind: MemoryKind,
        #[arg(long)]
        content: String,
    },
    Edit {
        #[arg(long)]
        persona: String,
        #[arg(long)]
        memory: String,
        #[arg(long)]
        content: String,
    },
    Delete {
        #[arg(long)]
        persona: String,
        #[arg(long)]
        memory: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Custom,
    Simulation,
}

impl From<ModeArg> for PersonaMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Custom => PersonaMode::Custom,
            ModeArg::Simulation => PersonaMode::Simulation,
        }
    }
}

/// Everything a command needs, wired once per process.
pub struct App {
    pub session: Rc<SessionStore>,
    pub api: Rc<ApiClient>,
    pub auth: AuthService,
    pub redirect: Rc<LoginRedirect>,
}

impl App {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let storage = Rc::new(FileStorage::open(&config.state_file)?);
        let session = Rc::new(SessionStore::load(storage));
        let redirect = Rc::new(LoginRedirect::new());
        let transport = Rc::new(ReqwestTransport::new(&config.api_base_url, config.request_timeout)?);
        let api = Rc::new(ApiClient::new(transport, session.clone(), redirect.clone()));
        let auth = AuthService::new(api.clone(), session.clone(), redirect.clone());
        Ok(Self { session, api, auth, redirect })
    }

    fn require_login(&self) -> anyhow::Result<()> {
        if !self.session.is_authenticated() {
            bail!("Not logged in. Run `persona-chat login` first.");
        }
        Ok(())
    }
}

pub async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    let result = dispatch(app, command).await;
    if app.redirect.take() {
        bail!("Session expired. Run `persona-chat login` to sign in again.");
    }
    result
}

async fn dispatch(app: &App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => {
            let session = app.auth.login(&username, &password).await?;
            println!("Logged in as {}", session.username);
        }
        Command::Register { username, password, email } => {
            app.auth.register(&username, &password, &email).await?;
            println!("Registered {username}. Log in with `persona-chat login`.");
        }
        Command::Logout => {
            app.auth.logout().await;
            // Logging out is the one redirect we asked for.
            app.redirect.take();
            println!("Logged out");
        }
        Command::Ping => {
            app.require_login()?;
            app.api.ping().await.context("Connectivity test failed")?;
            println!("API connectivity test succeeded");
        }
        Command::Conversations => {
            app.require_login()?;
            let conversations = app.api.list_conversations().await?;
            if conversations.is_empty() {
                println!("No conversations yet");
            }
            for c in conversations {
                println!("{}  {}  {}", c.id, c.created_at.format("%Y-%m-%d %H:%M"), c.title);
            }
        }
        Command::Chat { conversation, persona } => {
            app.require_login()?;
            chat(app, conversation, persona).await?;
        }
        Command::Personas { action } => {
            app.require_login()?;
            personas(app, action).await?;
        }
        Command::Memories { action } => {
            app.require_login()?;
            memories(app, action).await?;
        }
    }
    Ok(())
}

async fn personas(app: &App, action: PersonaCommand) -> anyhow::Result<()> {
    match action {
        PersonaCommand::List => {
            let personas = app.api.list_personas().await?;
            if personas.is_empty() {
                println!("No personas yet");
            }
            for p in personas {
                println!("{}  {}  {:?}  {}", p.id, p.name, p.mode, p.description);
            }
        }
        PersonaCommand::Create { name, description, system_prompt, mode, avatar } => {
            let persona = app
                .api
                .create_persona(&NewPersona {
                    name,
                    description,
                    system_prompt,
                    mode: mode.into(),
                    avatar,
                })
                .await?;
            println!("Created persona {} ({})", persona.name, persona.id);
        }
    }
    Ok(())
}

async fn memories(app: &App, action: MemoryCommand) -> anyhow::Result<()> {
    match action {
        MemoryCommand::List { persona } => {
            let memories = app.api.list_memories(&persona).await?;
            if memories.is_empty() {
                println!("No memories for {persona}");
            }
            for m in memories {
                println!("{}  [{}]  {}", m.id, m.kind, m.content);
            }
        }
        MemoryCommand::Add { persona, kind, content } => {
            let memory = app.api.create_memory(&persona, kind, &content).await?;
            println!("Created memory {}", memory.id);
        }
        MemoryCommand::Edit { persona, memory, content } => {
            let memory = app.api.update_memory(&persona, &memory, &content).await?;
            println!("Updated memory {}", memory.id);
        }
        MemoryCommand::Delete { persona, memory } => {
            app.api.delete_memory(&persona, &memory).await?;
            println!("Deleted memory {memory}");
        }
    }
    Ok(())
}

// ── Interactive chat ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Say(String),
    New,
    Switch(String),
    List,
    Persona(Option<String>),
    Ping,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Input::Say(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::to_string);
    match (command, arg) {
        ("quit" | "exit", _) => Input::Quit,
        ("new", _) => Input::New,
        ("switch", Some(id)) => Input::Switch(id),
        ("list", _) => Input::List,
        ("persona", arg) => Input::Persona(arg),
        ("ping", _) => Input::Ping,
        ("help", _) => Input::Help,
        _ => Input::Unknown(line.trim().to_string()),
    }
}

const HELP: &str = "Type a message and press Enter. Commands:
  /new           start a new conversation
  /switch ID     open an existing conversation
  /list          list conversations
  /persona [ID]  talk to a persona (no ID: plain assistant)
  /ping          connectivity test
  /quit          leave";

/// Tracks what has already been printed so each render only emits what changed.
#[derive(Debug, Default)]
pub struct Transcript {
    conversation: Option<String>,
    shown: usize,
    last_notice: Option<u64>,
}

impl Transcript {
    pub fn render(&mut self, state: &ChatState) -> Vec<String> {
        let mut lines = Vec::new();

        if state.active_conversation != self.conversation || state.messages.len() < self.shown {
            self.conversation = state.active_conversation.clone();
            self.shown = 0;
            if let Some(id) = &self.conversation {
                lines.push(format!("── conversation {id} ──"));
            }
        }

        for message in &state.messages[self.shown..] {
            let who = match message.role {
                MessageRole::User => "you",
                MessageRole::Assistant => "assistant",
                MessageRole::System => "system",
            };
            lines.push(format!("{who}> {}", message.content));
        }
        self.shown = state.messages.len();

        if let Some(notice) = &state.notice {
            if self.last_notice != Some(notice.id) {
                self.last_notice = Some(notice.id);
                let marker = match notice.kind {
                    NoticeKind::Success => "✓",
                    NoticeKind::Error => "!",
                };
                lines.push(format!("{marker} {}", notice.text));
            }
        }
        lines
    }
}

async fn chat(app: &App, conversation: Option<String>, persona: Option<String>) -> anyhow::Result<()> {
    let manager = ConversationManager::new(app.api.clone());
    manager.select_persona(persona);
    manager.initialize().await;
    if let Some(id) = conversation {
        manager.switch_conversation(&id).await;
    }

    let mut transcript = Transcript::default();
    print_lines(transcript.render(&manager.state()));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Unknown(text) => println!("Unknown command: {text} (try /help)"),
            Input::New => {
                manager.create_conversation(None).await;
            }
            Input::Switch(id) => {
                manager.switch_conversation(&id).await;
            }
            Input::List => {
                for c in manager.state().conversations {
                    println!("  {}  {}", c.id, c.title);
                }
            }
            Input::Persona(id) => {
                match &id {
                    Some(id) => println!("Talking to persona {id}"),
                    None => println!("Talking to the plain assistant"),
                }
                manager.select_persona(id);
            }
            Input::Ping => {
                manager.test_connectivity().await;
            }
            Input::Say(text) => {
                manager.send_message(&text).await;
            }
        }

        let state = manager.state();
        print_lines(transcript.render(&state));
        if let Some(notice) = state.notice {
            manager.dismiss_notice(notice.id);
        }
        if app.redirect.is_requested() {
            break;
        }
    }
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}
