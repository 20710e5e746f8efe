//! Commands module for bpq CLI
//!
//! Provides command implementations for queue, session, config and run operations.

pub mod config;
pub mod queue;
pub mod run;
pub mod session;

use std::fmt::Write as _;

use bpq_core::{AdmitOutcome, Enforcement, RevokeOutcome, TriggerOutcome};
use serde_json::{json, Value};

/// Where command results go
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    #[must_use]
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `text`, or `value` as one JSON line in JSON mode
    pub fn emit(self, text: &str, value: &Value) {
        if self.json {
            println!("{value}");
        } else {
            println!("{text}");
        }
    }
}

/// Human and JSON renderings of a trigger outcome
#[must_use]
pub fn describe(outcome: &TriggerOutcome) -> (String, Value) {
    match outcome {
        TriggerOutcome::Reconciled(report) => {
            let text = if report.is_clean() {
                format!("Holder {} is in sync", report.holder)
            } else {
                let keys: Vec<&str> = report.enforced.iter().map(|k| k.as_str()).collect();
                format!("Holder {} lost: {}", report.holder, keys.join(", "))
            };
            (
                text,
                json!({ "type": "reconciled", "holder": report.holder, "enforced": report.enforced }),
            )
        }
        TriggerOutcome::Admit(AdmitOutcome::Admitted { evicted }) => {
            let mut text = "Admitted".to_string();
            for eviction in evicted {
                let how = match eviction.enforcement {
                    Enforcement::Revoked => "blueprint revoked",
                    Enforcement::AlreadyLost => "blueprint already gone",
                    Enforcement::Deferred => "offline, revoked on next connect",
                };
                let _ = write!(text, "\n  evicted {} ({how})", eviction.victim);
            }
            let evicted: Vec<Value> = evicted
                .iter()
                .map(|e| json!({ "holder": e.victim, "enforcement": enforcement_name(e.enforcement) }))
                .collect();
            (text, json!({ "type": "admitted", "evicted": evicted }))
        }
        TriggerOutcome::Admit(AdmitOutcome::AlreadyAdmitted) => (
            "Already in the queue".to_string(),
            json!({ "type": "already_admitted" }),
        ),
        TriggerOutcome::Admit(AdmitOutcome::NotConfigured)
        | TriggerOutcome::Revoke(RevokeOutcome::NotConfigured) => (
            "Item is not managed".to_string(),
            json!({ "type": "not_configured" }),
        ),
        TriggerOutcome::Revoke(RevokeOutcome::Removed) => (
            "Removed from the queue".to_string(),
            json!({ "type": "removed" }),
        ),
        TriggerOutcome::Revoke(RevokeOutcome::NotQueued) => (
            "Not in the queue".to_string(),
            json!({ "type": "not_queued" }),
        ),
        TriggerOutcome::Ignored => ("Ignored".to_string(), json!({ "type": "ignored" })),
        TriggerOutcome::Saved => ("Saved".to_string(), json!({ "type": "saved" })),
        TriggerOutcome::Failed(reason) => (
            format!("Failed: {reason}"),
            json!({ "type": "failed", "reason": reason }),
        ),
    }
}

const fn enforcement_name(enforcement: Enforcement) -> &'static str {
    match enforcement {
        Enforcement::Revoked => "revoked",
        Enforcement::AlreadyLost => "already_lost",
        Enforcement::Deferred => "deferred",
    }
}
