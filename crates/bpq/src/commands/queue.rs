//! Queue command implementation
//!
//! Admits holders to, and removes them from, blueprint queues.

use std::{fmt::Write as _, num::NonZeroUsize};

use anyhow::{Context, Result};
use bpq_core::{CapacityProvider, HolderId, ResourceAuthority, ResourceKey, Trigger};
use serde_json::json;

use super::{describe, Output};
use crate::{notify::ConsoleNotifier, state::DataDir};

/// Which queue change to make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    /// Administrative admission
    Learn,
    /// Administrative removal
    Unlearn,
    /// Holder studied the blueprint in game
    Study,
}

/// Queue command options
#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub action: QueueAction,
    pub holder: HolderId,
    pub key: ResourceKey,
}

/// Run a learn/unlearn/study command
///
/// # Errors
///
/// Returns an error if the ledger cannot be read or written, or the final
/// snapshot save fails.
pub fn run(options: &QueueOptions, data: &DataDir, output: Output) -> Result<()> {
    let mut engine = data.engine(ConsoleNotifier::new(output.json), true)?;

    let trigger = match options.action {
        QueueAction::Learn => Trigger::ManualAdmit {
            holder: options.holder,
            key: options.key.clone(),
        },
        QueueAction::Unlearn => Trigger::ManualRevoke {
            holder: options.holder,
            key: options.key.clone(),
        },
        QueueAction::Study => {
            // the item engine hands out the blueprint before we hear about it
            engine.authority_mut().grant(options.holder, &options.key);
            Trigger::ResourceAcquired {
                holder: options.holder,
                key: options.key.clone(),
            }
        }
    };

    let outcome = engine.handle(&trigger);
    let (text, value) = describe(&outcome);
    output.emit(&text, &value);

    let (ledger, _, _) = engine.shutdown().context("Failed to save queue snapshot")?;
    data.save_ledger(&ledger)?;
    Ok(())
}

/// List queues, oldest holder first
///
/// # Errors
///
/// Returns an error if the ledger cannot be read.
pub fn list(key: Option<&ResourceKey>, data: &DataDir, output: Output) -> Result<()> {
    let engine = data.engine(ConsoleNotifier::new(output.json), false)?;
    let config = engine.config();

    let keys: Vec<ResourceKey> = match key {
        Some(key) => vec![key.clone()],
        None => config.resources(),
    };

    for key in keys {
        let holders: Vec<HolderId> = engine
            .store()
            .get(&key)
            .map(|q| q.iter().collect())
            .unwrap_or_default();
        let capacity = config.capacity(&key).map(NonZeroUsize::get);

        let online: Vec<bool> = holders
            .iter()
            .map(|h| engine.authority().is_reachable(*h))
            .collect();
        let text = format_queue(&key, capacity, &holders, &online);
        let value = json!({
            "type": "queue",
            "key": key,
            "capacity": capacity,
            "holders": holders,
        });
        output.emit(&text, &value);
    }
    Ok(())
}

fn format_queue(
    key: &ResourceKey,
    capacity: Option<usize>,
    holders: &[HolderId],
    online: &[bool],
) -> String {
    let capacity = capacity.map_or_else(|| "unmanaged".to_string(), |c| c.to_string());
    let mut text = format!("{key} ({}/{capacity})", holders.len());
    if holders.is_empty() {
        text.push_str("\n  (empty)");
    }
    for (position, (holder, online)) in holders.iter().zip(online).enumerate() {
        let marker = if *online { "" } else { " [offline]" };
        let _ = write!(text, "\n  {}. {holder}{marker}", position + 1);
    }
    text
}
