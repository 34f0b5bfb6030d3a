//! Local, network-free classifier.
//!
//! Works only from a [`SignalSet`], so it always has an answer: an empty
//! or signal-free description lands on `general` / `medium`.

use super::patterns::PatternRegistry;
use super::signals::SignalSet;
use super::{Category, Priority};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Distinct urgency terms that force `critical` on their own.
const CRITICAL_URGENCY_TERMS: usize = 3;

/// How the fallback path picks labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Keyword and urgency heuristics.
    #[default]
    Heuristic,
    /// Legacy behavior: always `general` / `medium`.
    Fixed,
}

impl FromStr for FallbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" => Ok(Self::Heuristic),
            "fixed" => Ok(Self::Fixed),
            other => Err(format!(
                "unknown fallback mode '{other}' (expected 'heuristic' or 'fixed')"
            )),
        }
    }
}

pub fn classify_fallback(
    registry: &PatternRegistry,
    signals: &SignalSet,
    mode: FallbackMode,
) -> (Category, Priority) {
    match mode {
        FallbackMode::Fixed => (Category::General, Priority::Medium),
        FallbackMode::Heuristic => (pick_category(signals), pick_priority(registry, signals)),
    }
}

/// Highest keyword score wins; ties go to the earlier declared category.
fn pick_category(signals: &SignalSet) -> Category {
    let mut best = Category::General;
    let mut best_score = 0;
    for category in Category::ALL {
        let score = signals.score(category);
        if score > best_score {
            best = category;
            best_score = score;
        }
    }
    best
}

fn pick_priority(registry: &PatternRegistry, signals: &SignalSet) -> Priority {
    // Rules in order; first hit wins.
    critical_urgency(registry, signals)
        .or_else(|| any_urgency(signals))
        .or_else(|| failure_wording(signals))
        .unwrap_or(Priority::Medium)
}

fn critical_urgency(registry: &PatternRegistry, signals: &SignalSet) -> Option<Priority> {
    let extreme = signals
        .urgency_matches
        .iter()
        .any(|term| registry.is_extreme(term));
    (extreme || signals.urgency_matches.len() >= CRITICAL_URGENCY_TERMS)
        .then_some(Priority::Critical)
}

fn any_urgency(signals: &SignalSet) -> Option<Priority> {
    (!signals.urgency_matches.is_empty()).then_some(Priority::High)
}

fn failure_wording(signals: &SignalSet) -> Option<Priority> {
    (signals.failure_matches > 0).then_some(Priority::High)
}
