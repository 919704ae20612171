//! Best-effort extraction of [`Action`]s from assistant text.
//!
//! Candidates are taken, in priority order, from:
//!
//! 1. each fenced block tagged `json`, read as one value (an object or an
//!    array of objects),
//! 2. the lines of a block that failed step 1 and start with `{`,
//! 3. when no block produced an action, any `{"action": "...", ...}` shaped
//!    substring of the whole text.
//!
//! A candidate that cannot be decoded is handed to the observer and skipped.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{observer::ActionObserver, Action};
use crate::config::ActionSettings;

fn fenced_json_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)```[ \t]*json[ \t]*\r?\n(.*?)```").expect("valid regex")
    })
}

fn inline_action_object() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{\s*"action"\s*:\s*"[^"]*"[^{}]*\}"#).expect("valid regex")
    })
}

fn has_action(value: &Value) -> bool {
    value.get("action").is_some()
}

pub struct ActionParser<'a> {
    settings: &'a ActionSettings,
    observer: &'a dyn ActionObserver,
}

impl<'a> ActionParser<'a> {
    #[must_use]
    pub fn new(settings: &'a ActionSettings, observer: &'a dyn ActionObserver) -> Self {
        Self { settings, observer }
    }

    /// Returns the actions found in `text`, in the order they appear.
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        for captures in fenced_json_block().captures_iter(text) {
            if let Some(block) = captures.get(1) {
                self.parse_block(block.as_str(), &mut actions);
            }
        }

        if actions.is_empty() && self.settings.scan_raw_text {
            for candidate in inline_action_object().find_iter(text) {
                let candidate = candidate.as_str();
                match serde_json::from_str::<Value>(candidate) {
                    Ok(value) => self.decode(candidate, value, &mut actions),
                    Err(err) => self.observer.on_unparsable(candidate, &err.to_string()),
                }
            }
        }

        actions
    }

    fn parse_block(&self, block: &str, actions: &mut Vec<Action>) {
        let block = block.trim();
        match serde_json::from_str::<Value>(block) {
            Ok(Value::Array(items)) => {
                for item in items.into_iter().filter(has_action) {
                    let candidate = item.to_string();
                    self.decode(&candidate, item, actions);
                }
            }
            Ok(value) => {
                if has_action(&value) {
                    self.decode(block, value, actions);
                }
            }
            Err(block_err) => {
                let mut candidates = block
                    .lines()
                    .map(|line| line.trim().trim_end_matches(','))
                    .filter(|line| line.starts_with('{'))
                    .peekable();
                if candidates.peek().is_none() {
                    self.observer.on_unparsable(block, &block_err.to_string());
                    return;
                }
                for line in candidates {
                    match serde_json::from_str::<Value>(line) {
                        Ok(value) if has_action(&value) => self.decode(line, value, actions),
                        Ok(_) => {}
                        Err(err) => self.observer.on_unparsable(line, &err.to_string()),
                    }
                }
            }
        }
    }

    fn decode(&self, candidate: &str, value: Value, actions: &mut Vec<Action>) {
        match serde_json::from_value::<Action>(value) {
            Ok(action) => actions.push(action),
            Err(err) => self.observer.on_unparsable(candidate, &err.to_string()),
        }
    }
}
