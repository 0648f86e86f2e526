use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "facetry-cmd")]
#[command(about = "Command-line utility for facet document operations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build newline-delimited JSON documents and print the resulting index fields
    Build {
        /// Path to the JSON file with per-dimension settings
        #[arg(long)]
        config: Option<String>,

        /// Source file with one JSON document per line
        #[arg(short, long)]
        file: String,

        /// Keep going when a document is rejected
        #[arg(long)]
        skip_invalid: bool,
    },

    /// Encode path components into a single drill-down term
    EncodePath {
        /// Components, dimension first
        #[arg(required = true)]
        components: Vec<String>,
    },

    /// Split an encoded drill-down term into its components
    DecodePath {
        /// Encoded term (delimiter and escape characters may be given as \x1f and \x1e)
        encoded: String,
    },

    /// Decode a hex-encoded ordinal set blob
    DecodeOrdinals {
        /// Hex string, as printed by the build command
        hex: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            file,
            skip_invalid,
        } => commands::build::run(config, file, skip_invalid),
        Commands::EncodePath { components } => commands::path::run_encode(components),
        Commands::DecodePath { encoded } => commands::path::run_decode(encoded),
        Commands::DecodeOrdinals { hex } => commands::ordinals::run(hex),
    }
}
