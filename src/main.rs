//! CLI entry point for bytefeed

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bytefeed")]
#[command(version)]
#[command(about = "Aggregates blog posts and tips into an RSS feed", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the feed and display metadata
    #[command(alias = "b")]
    Build,

    /// List entries in feed order
    List {
        /// Category to list (post, tip, all)
        #[arg(default_value = "all")]
        r#type: String,
    },

    /// Remove generated outputs
    Clean,

    /// Start the relay server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Build before serving
        #[arg(long)]
        build: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "bytefeed=debug,info"
    } else {
        "bytefeed=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Build => {
            let site = bytefeed::Site::new(&base_dir)?;
            let report = bytefeed::commands::build::run(&site)?;
            println!(
                "Built {} feed items into {}",
                report.feed_items,
                report.feed_path.display()
            );
        }

        Commands::List { r#type } => {
            let site = bytefeed::Site::new(&base_dir)?;
            bytefeed::commands::list::run(&site, &r#type)?;
        }

        Commands::Clean => {
            let site = bytefeed::Site::new(&base_dir)?;
            tracing::info!("Cleaning generated outputs...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Serve { port, ip, build } => {
            let site = bytefeed::Site::new(&base_dir)?;

            if build {
                bytefeed::commands::build::run(&site)?;
            }

            tracing::info!("Starting server at http://{}:{}", ip, port);
            bytefeed::server::start(&site, &ip, port).await?;
        }

        Commands::Version => {
            println!("bytefeed version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
