use clap::Parser;

use persona_chat::cli::{self, App, Cli};
use persona_chat::config::ClientConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never mix with the chat transcript
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "persona_chat=error".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?.with_api_base_url(cli.api_base_url.clone());
    let app = App::new(&config)?;

    cli::run(&app, cli.command).await
}
