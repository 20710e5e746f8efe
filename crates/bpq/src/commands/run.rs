//! Run command implementation
//!
//! Reads one JSON trigger per line from stdin and applies them strictly in
//! arrival order:
//!
//! ```text
//! {"event":"participant_connected","holder":7}
//! {"event":"resource_acquired","holder":7,"key":"rifle.ak"}
//! {"event":"manual_revoke","holder":7,"key":"rifle.ak"}
//! {"event":"checkpoint"}
//! ```
//!
//! A single task owns the engine, so triggers never interleave. On start
//! every holder marked online in the ledger is reconciled. End of input or
//! Ctrl+C saves and exits.

use anyhow::{Context, Result};
use bpq_core::{Engine, JsonFileSnapshotStore, NotificationSink, PossessionLedger, Trigger};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use super::{describe, Output};
use crate::{notify::ConsoleNotifier, state::DataDir};

const CHANNEL_CAPACITY: usize = 64;

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
}

/// Process stdin until it closes or Ctrl+C
///
/// # Errors
///
/// Returns an error if the ledger cannot be read or written, or the final
/// save fails.
pub async fn run(data: &DataDir, output: Output) -> Result<RunSummary> {
    let stdin = BufReader::new(tokio::io::stdin());
    run_with_input(stdin, data, output).await
}

/// Process triggers from `input`
///
/// # Errors
///
/// Returns an error if the ledger cannot be read or written, or the final
/// save fails.
pub async fn run_with_input<R>(input: R, data: &DataDir, output: Output) -> Result<RunSummary>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let config = data.config(true)?;
    let ledger = data.load_ledger()?;
    let online = ledger.online();
    let engine = Engine::start(
        config,
        ledger,
        ConsoleNotifier::new(output.json),
        JsonFileSnapshotStore::new(data.snapshot_path()),
        &online,
    );
    tracing::info!(online = online.len(), "Trigger loop started");

    let (tx, rx) = mpsc::channel::<Trigger>(CHANNEL_CAPACITY);
    let reader = tokio::spawn(read_triggers(input, tx));
    let (engine, applied) = apply_triggers(engine, rx, data, output).await;

    let read = reader.await.context("Trigger reader panicked");

    // flush before reporting a reader failure so the ledger matches the snapshot
    let (ledger, _, _) = engine.shutdown().context("Failed to save queue snapshot")?;
    data.save_ledger(&ledger)?;
    let rejected = read??;
    tracing::info!(applied, rejected, "Trigger loop stopped");
    Ok(RunSummary { applied, rejected })
}

/// Parse lines into triggers until input ends, Ctrl+C, or the consumer is gone.
/// Lines that are not UTF-8 or not a trigger are skipped and counted.
async fn read_triggers<R>(input: R, tx: mpsc::Sender<Trigger>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.split(b'\n');
    let mut rejected = 0;

    loop {
        let line = tokio::select! {
            line = lines.next_segment() => line.context("Failed to read trigger input")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                None
            }
        };
        let Some(bytes) = line else { break };
        let Ok(line) = std::str::from_utf8(&bytes) else {
            tracing::warn!("Ignoring trigger line that is not UTF-8");
            rejected += 1;
            continue;
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match serde_json::from_str::<Trigger>(line) {
            Ok(trigger) => {
                let is_shutdown = trigger == Trigger::Shutdown;
                if tx.send(trigger).await.is_err() || is_shutdown {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed trigger {line:?}: {e}");
                rejected += 1;
            }
        }
    }
    Ok(rejected)
}

async fn apply_triggers<N: NotificationSink>(
    mut engine: Engine<PossessionLedger, N, JsonFileSnapshotStore>,
    mut rx: mpsc::Receiver<Trigger>,
    data: &DataDir,
    output: Output,
) -> (Engine<PossessionLedger, N, JsonFileSnapshotStore>, usize) {
    let mut applied = 0;

    while let Some(trigger) = rx.recv().await {
        // the ledger mirrors what the host reports
        match &trigger {
            Trigger::ParticipantConnected { holder } => engine.authority_mut().connect(*holder),
            Trigger::ResourceAcquired { holder, key } => engine.authority_mut().grant(*holder, key),
            _ => {}
        }

        let outcome = engine.handle(&trigger);
        let (text, value) = describe(&outcome);
        output.emit(&text, &value);
        applied += 1;

        if trigger == Trigger::Checkpoint {
            if let Err(e) = data.save_ledger(engine.authority()) {
                tracing::warn!("Failed to save ledger at checkpoint: {e}");
            }
        }
    }
    (engine, applied)
}
