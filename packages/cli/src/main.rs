#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for campus fares.
//!
//! Submit fares, inspect per-place statistics, judge a quoted fare, bulk
//! import CSV files, or start the API server. Run without a subcommand to
//! pick an action from an interactive menu.
//!
//! Uses `indicatif-log-bridge` (via [`campus_fares_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod interactive;

use std::path::PathBuf;

use campus_fares_analytics::summary::{assess, places_with_data, summarize};
use clap::{Parser, Subcommand};

use crate::commands::{
    Session, import, render_assessment, render_fares, render_places, render_record,
    render_summary, serve, submit,
};

#[derive(Parser)]
#[command(name = "campus_fares", about = "Crowd-sourced campus fare tracker")]
struct Cli {
    /// Identity whose fare partition to use (defaults to `anonymous`)
    #[arg(long, global = true)]
    identity: Option<String>,
    /// Analytics TOML config (overrides `CAMPUS_FARES_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Keep fares in memory for this run only
    #[arg(long, global = true)]
    memory: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a fare paid to reach a place
    Submit {
        /// Place identifier (e.g. "sangam")
        place: String,
        /// Amount paid
        amount: f64,
        /// Submitter recorded on the fare (defaults to `anonymous`)
        #[arg(long)]
        submitter: Option<String>,
    },
    /// List the raw fares for a place
    Fares {
        /// Place identifier
        place: String,
    },
    /// Show statistics, insight and a histogram for a place
    Summary {
        /// Place identifier
        place: String,
        /// Print the full summary, including the smoothed curve, as JSON
        #[arg(long)]
        json: bool,
    },
    /// Judge whether a quoted fare is typical for a place
    Verdict {
        /// Place identifier
        place: String,
        /// Quoted amount
        amount: f64,
    },
    /// List places with at least one fare
    Places,
    /// Delete every fare in the partition
    Clear,
    /// Import fares from a CSV file (`place_key,amount[,submitter_id]`)
    Import {
        /// Path to the CSV file
        path: PathBuf,
    },
    /// Start the API server
    Serve {
        /// Address to bind (overrides `BIND_ADDR`)
        #[arg(long)]
        bind: Option<String>,
        /// Port to bind (overrides `PORT`)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = campus_fares_cli_utils::init_logger();
    let cli = Cli::parse();

    let session = Session::open(cli.identity.as_deref(), cli.config.as_deref(), cli.memory)?;

    let Some(command) = cli.command else {
        return interactive::run(session, &multi).await;
    };

    match command {
        Commands::Submit {
            place,
            amount,
            submitter,
        } => {
            let record = submit(&session, &place, amount, submitter.as_deref())?;
            println!("{}", render_record(&record));
        }
        Commands::Fares { place } => {
            let records = session.store.list_by_place(&place)?;
            print!("{}", ensure_newline(render_fares(&place, &records)));
        }
        Commands::Summary { place, json } => {
            let summary = summarize(session.store.as_ref(), &place, &session.config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", ensure_newline(render_summary(&summary)));
            }
        }
        Commands::Verdict { place, amount } => {
            if !amount.is_finite() || amount <= 0.0 {
                return Err(format!("amount must be a positive number, got {amount}").into());
            }
            let assessment = assess(session.store.as_ref(), &place, amount, &session.config)?;
            println!("{}", render_assessment(&assessment));
        }
        Commands::Places => {
            let places = places_with_data(session.store.as_ref())?;
            print!("{}", ensure_newline(render_places(&places)));
        }
        Commands::Clear => {
            session.store.clear()?;
            println!("Cleared all fares for '{}'.", session.identity);
        }
        Commands::Import { path } => {
            let stats = import(&session, &multi, &path)?;
            println!(
                "Imported {} fare(s) from {} ({} skipped).",
                stats.imported,
                path.display(),
                stats.skipped
            );
        }
        Commands::Serve { bind, port } => {
            serve(session, bind, port).await?;
        }
    }

    Ok(())
}

fn ensure_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
