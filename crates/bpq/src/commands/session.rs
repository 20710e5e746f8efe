//! Connect/disconnect command implementation
//!
//! A connecting holder is reconciled: any managed blueprint they hold
//! without a queue slot is taken away.

use anyhow::{Context, Result};
use bpq_core::{HolderId, Trigger};
use serde_json::json;

use super::{describe, Output};
use crate::{notify::ConsoleNotifier, state::DataDir};

/// Mark `holder` online and reconcile them
///
/// # Errors
///
/// Returns an error if the ledger cannot be read or written.
pub fn connect(holder: HolderId, data: &DataDir, output: Output) -> Result<()> {
    let mut engine = data.engine(ConsoleNotifier::new(output.json), true)?;
    engine.authority_mut().connect(holder);

    let outcome = engine.handle(&Trigger::ParticipantConnected { holder });
    let (text, value) = describe(&outcome);
    output.emit(&text, &value);

    let (ledger, _, _) = engine.shutdown().context("Failed to save queue snapshot")?;
    data.save_ledger(&ledger)?;
    Ok(())
}

/// Mark `holder` offline
///
/// # Errors
///
/// Returns an error if the ledger cannot be read or written.
pub fn disconnect(holder: HolderId, data: &DataDir, output: Output) -> Result<()> {
    let mut ledger = data.load_ledger()?;
    ledger.disconnect(holder);
    data.save_ledger(&ledger)?;

    output.emit(
        &format!("Holder {holder} is offline"),
        &json!({ "type": "disconnected", "holder": holder }),
    );
    Ok(())
}
