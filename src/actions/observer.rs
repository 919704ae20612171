//! Hooks for actions that were dropped instead of applied.

use std::sync::Mutex;

use super::Action;

/// Receives every candidate the protocol skips.
///
/// Production code logs; test harnesses record. Nothing an observer does can
/// change the resulting graph.
pub trait ActionObserver: Send + Sync {
    /// A candidate could not be decoded into an [`Action`].
    fn on_unparsable(&self, candidate: &str, reason: &str);

    /// An action names a label that is not in the graph.
    fn on_unresolved(&self, action: &Action, label: &str);

    /// An action would only recreate something that already exists.
    fn on_duplicate(&self, _action: &Action) {}
}

/// Logs skipped actions through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ActionObserver for TracingObserver {
    fn on_unparsable(&self, candidate: &str, reason: &str) {
        tracing::warn!(candidate, reason, "action_unparsable");
    }

    fn on_unresolved(&self, action: &Action, label: &str) {
        tracing::warn!(action = action.name(), label, "action_unresolved");
    }

    fn on_duplicate(&self, action: &Action) {
        tracing::debug!(action = action.name(), "action_duplicate");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkippedAction {
    Unparsable { candidate: String, reason: String },
    Unresolved { action: Action, label: String },
    Duplicate { action: Action },
}

/// Collects skipped actions in the order they were reported.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    skipped: Mutex<Vec<SkippedAction>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn skipped(&self) -> Vec<SkippedAction> {
        self.skipped
            .lock()
            .map(|skipped| skipped.clone())
            .unwrap_or_default()
    }

    fn record(&self, entry: SkippedAction) {
        if let Ok(mut skipped) = self.skipped.lock() {
            skipped.push(entry);
        }
    }
}

impl ActionObserver for RecordingObserver {
    fn on_unparsable(&self, candidate: &str, reason: &str) {
        self.record(SkippedAction::Unparsable {
            candidate: candidate.to_string(),
            reason: reason.to_string(),
        });
    }

    fn on_unresolved(&self, action: &Action, label: &str) {
        self.record(SkippedAction::Unresolved {
            action: action.clone(),
            label: label.to_string(),
        });
    }

    fn on_duplicate(&self, action: &Action) {
        self.record(SkippedAction::Duplicate {
            action: action.clone(),
        });
    }
}
