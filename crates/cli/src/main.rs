//! CampusDesk CLI — the main entry point.
//!
//! Commands:
//! - `serve`     — Start the HTTP chat gateway
//! - `chat`      — Terminal chat with one in-process session
//! - `classify`  — Show how a line of text is classified
//! - `hash-pin`  — Produce a PIN hash for seeding the student table
//! - `doctor`    — Diagnose configuration, database and catalog

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "campusdesk",
    about = "CampusDesk — student records assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the assistant in the terminal
    Chat,

    /// Print the tag and confidence the classifier assigns to TEXT
    Classify {
        /// The text to classify
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Print a PIN hash suitable for the students table
    HashPin {
        /// The PIN to hash
        pin: String,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat => commands::chat::run().await?,
        Commands::Classify { text } => commands::classify::run(&text.join(" ")).await?,
        Commands::HashPin { pin } => commands::hash_pin::run(&pin)?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
