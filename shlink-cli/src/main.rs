use anyhow::Result;
use clap::{Parser, Subcommand};
use shlink_cli::commands::{self, create::CreateOptions};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "shlink")]
#[command(about = "Shlink - Inspect, create and recover Windows shell links", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every field of a .lnk file
    Dump {
        /// Input .lnk file
        #[arg(short, long)]
        input: String,

        /// Print a JSON summary instead of the text rendering
        #[arg(long)]
        json: bool,
    },

    /// Recover shell links embedded in a jump list
    Scan {
        /// Input file to scan
        #[arg(short, long)]
        input: String,

        /// Output JSON file for recovered links
        #[arg(short, long)]
        output: Option<String>,

        /// Show statistics only
        #[arg(long)]
        stats_only: bool,
    },

    /// Create a .lnk file pointing at a target
    Create {
        /// Target path
        #[arg(short, long)]
        target: String,

        /// Output .lnk file
        #[arg(short, long)]
        output: String,

        /// Store the target relative to this directory
        #[arg(long)]
        base: Option<String>,

        /// Command line arguments
        #[arg(long)]
        args: Option<String>,

        /// Description
        #[arg(long)]
        name: Option<String>,

        /// Icon location
        #[arg(long)]
        icon: Option<String>,

        /// Icon index
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        icon_index: i32,

        /// Store strings as UTF-16
        #[arg(long)]
        unicode: bool,
    },

    /// Decode a time-based identifier
    Identifier {
        /// Identifier, with or without hyphens
        value: String,

        /// Fail on malformed input instead of printing empty fields
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Dump { input, json } => commands::dump::execute(&input, json),

        Commands::Scan {
            input,
            output,
            stats_only,
        } => commands::scan::execute(&input, output.as_deref(), stats_only),

        Commands::Create {
            target,
            output,
            base,
            args,
            name,
            icon,
            icon_index,
            unicode,
        } => {
            let options = CreateOptions {
                base,
                arguments: args,
                name,
                icon_location: icon,
                icon_index,
                unicode,
            };
            commands::create::execute(&target, &output, &options)
        }

        Commands::Identifier { value, strict } => commands::identifier::execute(&value, strict),
    }
}
