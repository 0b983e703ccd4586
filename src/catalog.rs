//! Workflow catalog: the built-in incident-response workflow definitions and
//! the repository that retrieves them.
//!
//! The catalog is read-only after construction. The repository simulates the
//! latency of a real storage or API fetch so the UI exercises its loading
//! stage, and supports cooperative cancellation while the fetch is pending.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

/// A single guided action a responder should take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub title: String,
    pub prompt: String,
    pub placeholder: String,
}

/// A named, ordered sequence of guided steps for an incident-response scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub title: String,
    pub description: String,
    pub steps: Vec<Step>,
}

/// Error surfaced by a catalog load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The load was cancelled before the catalog became available.
    Cancelled,
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Cancelled => write!(f, "workflow load cancelled"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Outcome of a catalog load, delivered exactly once into the event loop.
pub type LoadOutcome = Result<Vec<Workflow>, CatalogError>;

/// Handle for cooperatively cancelling an in-flight catalog load.
///
/// Dropping the handle also cancels the load; a loader whose caller is gone
/// has nobody left to deliver to.
pub struct CancelHandle {
    tx: Sender<()>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(());
    }
}

/// Retrieves workflow definitions. In a real deployment this would front a
/// database or API client; here it serves the built-in catalog after a fixed
/// simulated latency.
pub struct Repository {
    delay: Duration,
}

impl Repository {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Blocking load. Races the simulated latency against the cancellation
    /// channel: a message on the channel, or the sender going away, wins the
    /// race and aborts the load.
    pub fn load(&self, cancel: &Receiver<()>) -> LoadOutcome {
        match cancel.recv_timeout(self.delay) {
            Err(RecvTimeoutError::Timeout) => {
                let workflows = builtin_workflows();
                debug!(count = workflows.len(), "catalog_loaded");
                Ok(workflows)
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                info!("catalog_load_cancelled");
                Err(CatalogError::Cancelled)
            }
        }
    }

    /// Runs the load on a background thread, handing exactly one completion
    /// message back through the returned receiver.
    pub fn spawn_load(self) -> (Receiver<LoadOutcome>, CancelHandle) {
        let (cancel_tx, cancel_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = result_tx.send(self.load(&cancel_rx));
        });
        (result_rx, CancelHandle { tx: cancel_tx })
    }
}

fn step(title: &str, prompt: &str, placeholder: &str) -> Step {
    Step {
        title: title.to_string(),
        prompt: prompt.to_string(),
        placeholder: placeholder.to_string(),
    }
}

/// The built-in workflow catalog. Hardcoded by design.
pub fn builtin_workflows() -> Vec<Workflow> {
    vec![
        Workflow {
            title: "Ransomware Triage".to_string(),
            description: "Identify scope, contain systems, and gather intel.".to_string(),
            steps: vec![
                step("Identify", "Impacted hostnames", "host1, host2"),
                step("Contain", "Containment actions taken", "Isolated VLAN"),
                step("Collect", "Artifacts collected", "Memory dump, logs"),
            ],
        },
        Workflow {
            title: "Phishing Investigation".to_string(),
            description: "Validate, scope, and respond to reported phishing messages.".to_string(),
            steps: vec![
                step("Validate", "Reporter and channel", "Jane Doe via email"),
                step("Scope", "Recipients", "Distribution list"),
                step("Respond", "Response actions", "Blocked sender"),
            ],
        },
        Workflow {
            title: "Credential Theft".to_string(),
            description: "Reset credentials and evaluate blast radius.".to_string(),
            steps: vec![
                step("Reset", "Accounts reset", "user@example.com"),
                step("Investigate", "Suspicious activity", "Unusual logins"),
                step("Notify", "Stakeholders notified", "Security leadership"),
            ],
        },
    ]
}
