use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::state::AppState;
use crate::table;
use crate::types::Command;

/// Drives the table from stdin, one command per line.
/// For testing without the mini-app: "low 500", "h 1000", "reset",
/// "balance", "quit". The HTTP surface stays up either way.
pub async fn run_stdin(app: Arc<AppState>) {
    tracing::info!("console started (stdin mode)");
    tracing::info!("enter commands: low <stake>, high <stake>, reset, balance, quit");

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let raw = line.trim().to_string();
                if raw.is_empty() {
                    continue;
                }

                match Command::parse(&raw) {
                    Some(Command::Play { side, stake }) => {
                        if let Err(e) = table::play(&app, side, stake) {
                            tracing::warn!("bet refused: {e}");
                        }
                    }
                    Some(Command::Reset) => {
                        if let Err(e) = table::reset(&app) {
                            tracing::warn!("reset refused: {e}");
                        }
                    }
                    Some(Command::Balance) => {
                        let summary = app.wallet.lock().unwrap().summary();
                        tracing::info!("{summary}");
                    }
                    Some(Command::Quit) => {
                        tracing::info!("quit — console stopping");
                        return;
                    }
                    None => {
                        tracing::warn!(input = %raw, "unknown command, ignoring");
                    }
                }
            }
            Ok(None) => {
                tracing::info!("stdin closed — console stopping");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "stdin read error");
                return;
            }
        }
    }
}
