use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use knerrors::config::{Config, ResourceTarget};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// knerrors - explain Kubernetes and Knative API failures
///
/// Probes the Knative APIs of a cluster and turns the failures into messages
/// you can act on: missing CRDs, missing kubeconfig, unreachable clusters and
/// denied access.
#[derive(Parser)]
#[command(name = "knerrors")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe API resources on the cluster and explain any failure
    Check {
        /// Kubernetes context to use (overrides config file)
        #[arg(short, long, env = "KNERRORS_CONTEXT")]
        context: Option<String>,

        /// Namespace to probe in (overrides config file)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Resource to probe as group/version/kind/plural (repeatable)
        #[arg(short, long = "resource", value_name = "GVKP")]
        resources: Vec<ResourceTarget>,
    },

    /// Classify an error message or a Status document without a cluster
    Classify {
        /// Error message to classify
        #[arg(value_name = "MESSAGE", required_unless_present = "status")]
        message: Option<String>,

        /// Read a Status document (YAML or JSON) instead of a message
        #[arg(long, value_name = "FILE")]
        status: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Initialize configuration file
    Init {
        /// Kubernetes context to use by default
        #[arg(short, long)]
        context: Option<String>,

        /// Namespace to probe by default
        #[arg(short, long, default_value = "default")]
        namespace: String,
    },
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Check {
            context,
            namespace,
            resources,
        } => {
            let config = Config::load()?;
            commands::check::execute(&config, context, namespace, resources).await
        }
        Commands::Classify {
            message,
            status,
            output,
        } => commands::classify::execute(message, status.as_deref(), &output).await,
        Commands::Init { context, namespace } => commands::init::execute(context, namespace).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "knerrors=debug"
    } else {
        "knerrors=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Install default crypto provider for rustls
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Execute command
    let result = run(cli.command).await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bad_config_is_returned_from_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "namespace = [").unwrap();
        std::env::set_var("KNERRORS_CONFIG_FILE", &path);

        let err = run(Commands::Check {
            context: None,
            namespace: None,
            resources: Vec::new(),
        })
        .await
        .unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
