use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voice_relay::{ApiServerBuilder, Config, Persona, ProviderAdapter, ReplyGenerator};

/// Voice Relay - session relay for a browser voice assistant
#[derive(Parser)]
#[command(name = "voice-relay", version, about)]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind (overrides `VOICE_RELAY_HOST`)
    #[arg(long)]
    host: Option<String>,

    /// Directory with the browser UI (overrides `VOICE_RELAY_STATIC_DIR`)
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Persona file, JSON or TOML (overrides `VOICE_RELAY_PERSONA`)
    #[arg(long)]
    persona: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send one query to the provider and print the reply
    Ask {
        /// Query text
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Set up logging based on verbosity, RUST_LOG wins when set
    let filter = match cli.verbose {
        0 => "info,voice_relay=info",
        1 => "info,voice_relay=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.api_server.port = port;
    }
    if let Some(host) = cli.host {
        config.api_server.host = host;
    }
    if cli.static_dir.is_some() {
        config.api_server.static_dir = cli.static_dir;
    }
    if cli.persona.is_some() {
        config.persona_path = cli.persona;
    }
    tracing::debug!(?config, "loaded configuration");

    let persona = Arc::new(Persona::load(config.persona_path.as_deref())?);
    let adapter = ProviderAdapter::new(&config.provider, persona.clone())?;

    if let Some(Command::Ask { text }) = cli.command {
        println!("{}", adapter.generate(&text).await);
        return Ok(());
    }

    tracing::info!(
        persona = %persona.id,
        model = %config.provider.model,
        provider = adapter.mode(),
        "starting voice relay"
    );

    ApiServerBuilder::new(Arc::new(adapter), config.api_server.port)
        .host(config.api_server.host)
        .model(config.provider.model)
        .static_dir(config.api_server.static_dir)
        .build()
        .run()
        .await?;

    Ok(())
}
