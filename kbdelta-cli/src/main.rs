//! # kbdelta CLI
//!
//! Command-line interface for editing and annotating a JSON knowledge base
//! while persisting only the delta against its baseline.

mod commands;
mod envelope;
mod workspace;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kbdelta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "kbdelta.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the resulting change set instead of saving it
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the top-level sections of the knowledge base
    Sections {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the value (and notes) at a path
    Show {
        /// Dotted path, e.g. `Care Team.members[2]`
        path: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Set the value at a path
    Set {
        /// Dotted path, e.g. `Care Team.lead`
        path: String,

        /// New value (a string unless --json is given)
        value: String,

        /// Parse the value as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage notes attached to a field
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },

    /// Manage the general note of a section
    GeneralNote {
        #[command(subcommand)]
        command: GeneralNoteCommands,
    },

    /// Search string values in the knowledge base
    Search {
        /// Search query (case-insensitive substring)
        query: String,

        /// Show every hit instead of one per distinct value
        #[arg(long)]
        all: bool,

        /// Maximum results to return
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Summarize unsaved and saved changes against the baseline
    Status {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Discard every change and clear the store
    Undo,

    /// Write the changed fragment of the knowledge base
    Export {
        /// Output file (defaults to `export.file` from the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Apply a change set file on top of the current changes
    Apply {
        /// JSON file with `modifications` and/or `notes`
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Append a note to a field
    Add {
        /// Field path
        path: String,

        /// Note text
        text: String,
    },

    /// Replace the text of a note
    Edit {
        /// Field path
        path: String,

        /// Note number as shown by `note list`
        index: usize,

        /// New note text
        text: String,
    },

    /// Delete a note
    Rm {
        /// Field path
        path: String,

        /// Note number as shown by `note list`
        index: usize,
    },

    /// List the notes of a field
    List {
        /// Field path
        path: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum GeneralNoteCommands {
    /// Set the general note of a section (empty text clears it)
    Set {
        /// Top-level section name
        section: String,

        /// Note text
        text: String,
    },

    /// Remove the general note of a section
    Clear {
        /// Top-level section name
        section: String,
    },

    /// Print the general note of a section
    Show {
        /// Top-level section name
        section: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.config.as_path();
    let dry_run = cli.dry_run;

    match cli.command {
        Commands::Sections { json } => commands::list_sections(config, json).await,
        Commands::Show { path, json } => commands::show_path(config, &path, json).await,
        Commands::Set { path, value, json } => {
            commands::set_value(config, &path, &value, json, dry_run).await
        }
        Commands::Note { command } => commands::note(config, command, dry_run).await,
        Commands::GeneralNote { command } => {
            commands::general_note(config, command, dry_run).await
        }
        Commands::Search {
            query,
            all,
            limit,
            json,
        } => {
            let opts = commands::SearchOptions { all, limit, json };
            commands::search_values(config, &query, opts).await
        }
        Commands::Status { json } => commands::status(config, json).await,
        Commands::Undo => commands::undo(config, dry_run).await,
        Commands::Export { output, stdout } => {
            commands::export_changes(config, output.as_deref(), stdout).await
        }
        Commands::Apply { file } => commands::apply_file(config, &file, dry_run).await,
    }
}
