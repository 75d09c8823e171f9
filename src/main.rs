//! DisasterConnect - disaster relief chat assistant
//!
//! Main entry point for the CLI application.

use clap::Parser;
use disasterconnect::cli::{commands, Cli, Command, ServeArgs};
use disasterconnect::Config;
use tracing_subscriber::EnvFilter;

fn init_tracing(debug: bool) {
    let default = if debug {
        "warn,disasterconnect=debug,tower_http=debug"
    } else {
        "warn,disasterconnect=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging first so configuration loading is visible
    let _ = dotenvy::dotenv();
    init_tracing(cli.debug_requested());

    let mut config = Config::load();
    cli.apply(&mut config);

    match cli.command {
        None => {
            ServeArgs::default().apply(&mut config);
            commands::serve(config).await?;
        }
        Some(Command::Serve(args)) => {
            args.apply(&mut config);
            commands::serve(config).await?;
        }
        Some(Command::Ingest(args)) => {
            args.apply(&mut config);
            let written = commands::ingest(&config, &args.file).await?;
            println!(
                "Ingested {} chunks from {} into namespace '{}'",
                written,
                args.file.display(),
                config.pinecone.namespace
            );
        }
        Some(Command::Config { save }) => {
            println!("{}", commands::config(save)?);
        }
    }

    Ok(())
}
