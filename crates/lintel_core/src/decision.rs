//! Select/ignore resolution for diagnostic codes.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::RunOptions;

/// How a code relates to the select list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selected {
    Explicitly,
    Implicitly,
}

/// How a code relates to the ignore list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    Explicitly,
    Implicitly,
}

/// The final verdict for a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Selected,
    Ignored,
}

/// Either outcome of a membership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Selected(Selected),
    Ignored(Ignored),
}

/// Decides whether a code is reported, from a read-only snapshot of the
/// select, ignore and enable-extension configuration.
///
/// Decisions are memoized per code for the engine's lifetime.
#[derive(Debug)]
pub struct DecisionEngine {
    /// Selections the user wrote: `select` and `extend_select`.
    explicit_select: Vec<String>,
    /// Selections from plugin defaults and enabled extensions.
    soft_select: Vec<String>,
    ignore: Vec<String>,
    cache: Mutex<HashMap<String, Decision>>,
}

impl DecisionEngine {
    /// Builds the engine from the run options and the soft default-select
    /// set, which is only consulted when the user gave no `select`.
    pub fn new(options: &RunOptions, default_select: &[String]) -> Self {
        let explicit_select = options
            .select
            .iter()
            .flatten()
            .chain(&options.extend_select)
            .cloned()
            .collect();

        let defaults = if options.select.is_none() {
            default_select
        } else {
            &[]
        };
        let soft_select = defaults
            .iter()
            .chain(&options.enable_extensions)
            .cloned()
            .collect();

        let ignore = options
            .ignore
            .iter()
            .chain(&options.extend_ignore)
            .cloned()
            .collect();

        Self {
            explicit_select,
            soft_select,
            ignore,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn has_select(&self) -> bool {
        !self.explicit_select.is_empty() || !self.soft_select.is_empty()
    }

    /// Classifies `code` against the select lists.
    pub fn was_selected(&self, code: &str) -> Membership {
        if longest_match(code, &self.explicit_select).is_some()
            || longest_match(code, &self.soft_select).is_some()
        {
            Membership::Selected(Selected::Explicitly)
        } else if self.has_select() {
            Membership::Ignored(Ignored::Implicitly)
        } else {
            Membership::Selected(Selected::Implicitly)
        }
    }

    /// Classifies `code` against the ignore list.
    pub fn was_ignored(&self, code: &str) -> Membership {
        if longest_match(code, &self.ignore).is_some() {
            Membership::Ignored(Ignored::Explicitly)
        } else {
            Membership::Selected(Selected::Implicitly)
        }
    }

    /// Resolves a code that matched both a select and an ignore pattern:
    /// the longer pattern wins. On a tie, a user-written selection beats
    /// the ignore, a plugin default does not.
    fn more_specific_decision_for(&self, code: &str) -> Decision {
        let explicit = longest_match(code, &self.explicit_select).unwrap_or(0);
        let soft = longest_match(code, &self.soft_select).unwrap_or(0);
        let ignore = longest_match(code, &self.ignore).unwrap_or(0);

        if explicit > ignore || soft > ignore || (explicit > 0 && explicit == ignore) {
            Decision::Selected
        } else {
            Decision::Ignored
        }
    }

    fn make_decision(&self, code: &str) -> Decision {
        match (self.was_selected(code), self.was_ignored(code)) {
            (Membership::Ignored(Ignored::Implicitly), _) => Decision::Ignored,
            (
                Membership::Selected(Selected::Explicitly),
                Membership::Ignored(Ignored::Explicitly),
            ) => self.more_specific_decision_for(code),
            (Membership::Selected(_), Membership::Selected(_)) => Decision::Selected,
            _ => Decision::Ignored,
        }
    }

    /// Returns the decision for `code`, computing it on first use.
    pub fn decision_for(&self, code: &str) -> Decision {
        let mut cache = self.cache.lock();
        if let Some(decision) = cache.get(code) {
            return *decision;
        }
        let decision = self.make_decision(code);
        debug!("The user configured {code:?} to be {decision:?}");
        cache.insert(code.to_string(), decision);
        decision
    }
}

/// Length of the longest pattern `code` starts with.
fn longest_match(code: &str, patterns: &[String]) -> Option<usize> {
    patterns
        .iter()
        .filter(|pattern| code.starts_with(pattern.as_str()))
        .map(String::len)
        .max()
}
