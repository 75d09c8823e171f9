//! CLI module - command-line interface
//!
//! Argument parsing and the `serve`, `ingest` and `config` commands.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::Config;

/// DisasterConnect - disaster relief chat assistant
#[derive(Parser, Debug)]
#[command(name = "disasterconnect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the chat server (default)
    Serve(ServeArgs),
    /// Chunk a text file and load it into the vector index
    Ingest(IngestArgs),
    /// Print the default configuration as TOML
    Config {
        /// Write the defaults to the config file instead of printing them
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Chat completion model
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Skip the retrieval step even when an index is configured
    #[arg(long)]
    pub no_retrieval: bool,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Text file to ingest
    pub file: PathBuf,

    /// Characters per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Index namespace to write into
    #[arg(long)]
    pub namespace: Option<String>,
}

impl Cli {
    /// Whether debug logging is wanted before any configuration is read
    ///
    /// Only the flag and `DC_DEBUG` are consulted; a `debug` key in the
    /// config file applies to the conversation loop, not the log level.
    pub fn debug_requested(&self) -> bool {
        self.debug
            || std::env::var("DC_DEBUG").is_ok_and(|v| v == "true" || v == "1")
    }

    /// Apply global flags to a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if self.debug {
            config.agent.debug = true;
        }
    }
}

impl ServeArgs {
    /// Apply serve flags to a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref model) = self.model {
            config.openai.model = model.clone();
        }
        if self.no_retrieval {
            config.pinecone.enabled = false;
        }
    }
}

impl IngestArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(size) = self.chunk_size {
            config.pinecone.chunk_size = size;
        }
        if let Some(ref namespace) = self.namespace {
            config.pinecone.namespace = namespace.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["disasterconnect"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_debug_flag_known_before_config_load() {
        let cli = Cli::try_parse_from(["disasterconnect", "ingest", "notes.txt", "-d"]).unwrap();
        assert!(cli.debug_requested());
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "disasterconnect",
            "serve",
            "--port",
            "8080",
            "--model",
            "gpt-4o",
            "--no-retrieval",
            "--debug",
        ])
        .unwrap();
        let mut config = Config::default();
        config.pinecone.enabled = true;
        cli.apply(&mut config);
        match cli.command {
            Some(Command::Serve(ref args)) => args.apply(&mut config),
            other => panic!("unexpected command: {:?}", other),
        }

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.openai.model, "gpt-4o");
        assert!(!config.pinecone.enabled);
        assert!(config.agent.debug);
    }

    #[test]
    fn test_ingest_args() {
        let cli = Cli::try_parse_from([
            "disasterconnect",
            "ingest",
            "data/relief.txt",
            "--chunk-size",
            "250",
            "--namespace",
            "drill",
        ])
        .unwrap();
        let mut config = Config::default();
        match cli.command {
            Some(Command::Ingest(ref args)) => {
                assert_eq!(args.file, PathBuf::from("data/relief.txt"));
                args.apply(&mut config);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(config.pinecone.chunk_size, 250);
        assert_eq!(config.pinecone.namespace, "drill");
    }
}
