//! Tilehunt - hidden tile board game for tabs sharing a local store
//!
//! Each running terminal is one tab. Tabs on the same machine share the
//! SQLite store and see each other's rooms through its change log.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tilehunt_core::{ChangeBus, ClientId, Config, SqliteBackend, StoragePoller, Tab};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod clipboard;
mod commands;
mod render;
mod shell;

use commands::{Command, HELP};
use shell::Shell;

/// How long to wait for input before checking the store for changes
const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Tilehunt");

    let config = match Config::load_default() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let backend = match open_store(&config) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!("Failed to open local storage: {}", e);
            std::process::exit(1);
        }
    };

    let bus = ChangeBus::new();
    let mut poller = StoragePoller::new(backend.clone(), bus.clone());
    let tab = Tab::new(ClientId::generate(), backend, bus);
    tracing::info!(client_id = %tab.client_id(), "Tab ready");

    let mut shell = Shell::new(
        &tab,
        config.room.capacity,
        config.app.origin.clone(),
        clipboard::copy_to_clipboard,
    );
    let input = spawn_stdin_reader();
    println!("{HELP}");

    loop {
        match input.recv_timeout(POLL_INTERVAL) {
            Ok(line) => match Command::parse(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => print_lines(&shell.execute(command)),
                Ok(None) => {}
                Err(e) => println!("{e}"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if poller.poll() > 0 {
            print_lines(&shell.refresh());
        }
    }

    // leaves the current room
    shell.execute(Command::Quit);
    tracing::info!("Tilehunt stopped");
}

fn open_store(config: &Config) -> tilehunt_core::Result<SqliteBackend> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    SqliteBackend::open(&path)
}

/// Feed stdin lines to the main loop so it can poll between them
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
