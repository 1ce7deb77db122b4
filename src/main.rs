use anyhow::Context;
use clap::{Parser, Subcommand};
use issueblog::build::{build_site, DataSource};
use issueblog::config::Config;
use issueblog::{check, serve};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// The project directory; blog.yaml is searched for here and in its
    /// parents
    #[arg(short = 'C', long, default_value = ".", global = true)]
    directory: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the site (default if no command specified)
    Build,

    /// Build the site, then serve it locally
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, default_value_t = serve::DEFAULT_PORT)]
        port: u16,
    },

    /// Check that a built site contains everything a deployment needs
    Check,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(
            EnvFilter::try_from_env("ISSUEBLOG_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let directory = std::fs::canonicalize(&cli.directory)
        .with_context(|| format!("resolving '{}'", cli.directory.display()))?;
    let config = Config::from_directory(&directory)
        .with_context(|| format!("loading configuration from '{}'", directory.display()))?;

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            build(config).await?;
        }
        Command::Serve { host, port } => {
            let output = build(config).await?;
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("invalid address '{}:{}'", host, port))?;
            serve::serve(output, addr).await?;
        }
        Command::Check => {
            let report = check::check(&config.build.output_directory);
            report.log();
            if !report.is_ok() {
                anyhow::bail!(
                    "'{}' is missing {}",
                    report.output_directory.display(),
                    report.missing.join(", ")
                );
            }
        }
    }
    Ok(())
}

/// Builds the site and returns the output directory.
async fn build(config: Config) -> anyhow::Result<PathBuf> {
    let report = build_site(config).await?;
    if let DataSource::Fallback { reason } = &report.source {
        tracing::warn!(%reason, "built with sample posts");
    }
    for path in report.removed.iter() {
        tracing::debug!(path = %path.display(), "removed");
    }
    Ok(report.output_directory)
}
