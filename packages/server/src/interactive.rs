//! Interactive mode for the server.
//!
//! Prompts for bind address, port and storage backend before starting.

use campus_fares_store::partitions::StoreBackend;
use dialoguer::{Confirm, Input, Select};

use crate::ServerOptions;

/// Runs the server in interactive mode, prompting for configuration.
///
/// Starts from [`ServerOptions::from_env`] so environment settings become
/// the prompt defaults, then delegates to [`super::run_server_with`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the environment is invalid or
/// the underlying server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Campus Fares Server");
    println!();

    let mut options = ServerOptions::from_env()?;

    options.bind_addr = Input::new()
        .with_prompt("Bind address")
        .default(options.bind_addr.clone())
        .interact_text()
        .unwrap_or(options.bind_addr);

    options.port = Input::new()
        .with_prompt("Port")
        .default(options.port)
        .interact_text()
        .unwrap_or(options.port);

    let backends = ["DuckDB (persistent)", "In-memory"];
    let current = usize::from(options.backend == StoreBackend::Memory);
    let choice = Select::new()
        .with_prompt("Fare storage")
        .items(&backends)
        .default(current)
        .interact()
        .unwrap_or(current);
    if choice != current {
        options.backend = if choice == 1 {
            StoreBackend::Memory
        } else {
            StoreBackend::default_duckdb()
        };
    }

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{}?",
            options.bind_addr, options.port
        ))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server_with(options).await
}
