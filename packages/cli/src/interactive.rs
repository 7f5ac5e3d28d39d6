//! Interactive menu shown when no subcommand is given.

use std::path::PathBuf;

use campus_fares_analytics::summary::{assess, places_with_data, summarize};
use campus_fares_cli_utils::MultiProgress;
use dialoguer::{Confirm, Input, Select};

use crate::commands::{
    CliResult, Session, import, render_assessment, render_places, render_record, render_summary,
    submit,
};

enum Action {
    Submit,
    Summary,
    Verdict,
    Places,
    Import,
    Clear,
    Serve,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Submit,
        Self::Summary,
        Self::Verdict,
        Self::Places,
        Self::Import,
        Self::Clear,
        Self::Serve,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Submit => "Submit a fare",
            Self::Summary => "Show a place summary",
            Self::Verdict => "Check a quoted fare",
            Self::Places => "List places with fares",
            Self::Import => "Import fares from CSV",
            Self::Clear => "Clear my fares",
            Self::Serve => "Start server",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the menu until the user quits or starts the server.
///
/// Starting the server hands over to the server's own prompts.
///
/// # Errors
///
/// Returns an error if a prompt fails or a store operation fails with
/// anything other than invalid input.
pub async fn run(session: Session, multi: &MultiProgress) -> CliResult<()> {
    println!("Campus Fares (partition '{}')", session.identity);
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::Submit => {
                let place: String = Input::new().with_prompt("Place").interact_text()?;
                let amount: f64 = Input::new().with_prompt("Amount paid").interact_text()?;
                match submit(&session, &place, amount, None) {
                    Ok(record) => println!("Saved: {}", render_record(&record)),
                    Err(e) => println!("Not saved: {e}"),
                }
            }
            Action::Summary => {
                let place: String = Input::new().with_prompt("Place").interact_text()?;
                let summary = summarize(session.store.as_ref(), &place, &session.config)?;
                println!("{}", render_summary(&summary));
            }
            Action::Verdict => {
                let place: String = Input::new().with_prompt("Place").interact_text()?;
                let amount: f64 = Input::new().with_prompt("Quoted fare").interact_text()?;
                if amount.is_finite() && amount > 0.0 {
                    let assessment =
                        assess(session.store.as_ref(), &place, amount, &session.config)?;
                    println!("{}", render_assessment(&assessment));
                } else {
                    println!("The quoted fare must be a positive number.");
                }
            }
            Action::Places => {
                let places = places_with_data(session.store.as_ref())?;
                println!("{}", render_places(&places));
            }
            Action::Import => {
                let path: String = Input::new().with_prompt("CSV file").interact_text()?;
                match import(&session, multi, &PathBuf::from(path)) {
                    Ok(stats) => println!(
                        "Imported {} fare(s), skipped {}.",
                        stats.imported, stats.skipped
                    ),
                    Err(e) => println!("Import failed: {e}"),
                }
            }
            Action::Clear => {
                if Confirm::new()
                    .with_prompt(format!(
                        "Delete every fare in partition '{}'?",
                        session.identity
                    ))
                    .default(false)
                    .interact()?
                {
                    session.store.clear()?;
                    println!("Cleared.");
                }
            }
            Action::Serve => {
                // The server opens its own partitions; release this one's file first.
                drop(session);

                // The server uses actix-web's runtime, so we need to run it
                // in a blocking task to avoid nesting tokio runtimes.
                tokio::task::spawn_blocking(|| {
                    actix_web::rt::System::new()
                        .block_on(campus_fares_server::interactive::run())
                })
                .await??;
                return Ok(());
            }
            Action::Quit => return Ok(()),
        }
        println!();
    }
}
