//! Structured hints pulled out of a ticket description before any model call.

use super::patterns::PatternRegistry;
use super::Category;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalSet {
    /// Distinct canonical urgency terms, in order of first appearance.
    pub urgency_matches: Vec<String>,
    /// Keyword hit count per category. Always holds all four categories.
    pub category_scores: BTreeMap<Category, usize>,
    /// Generic failure wording ("broken", "crash", "can't", ...).
    pub failure_matches: usize,
}

impl SignalSet {
    pub fn score(&self, category: Category) -> usize {
        self.category_scores.get(&category).copied().unwrap_or(0)
    }

    /// Categories with at least one keyword hit, in declaration order.
    pub fn matched_categories(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.category_scores
            .iter()
            .filter(|&(_, &n)| n > 0)
            .map(|(&c, &n)| (c, n))
    }

    pub fn is_empty(&self) -> bool {
        self.urgency_matches.is_empty() && self.matched_categories().next().is_none()
    }
}

/// Scan `description` against the registry. Pure and deterministic.
pub fn extract_signals(registry: &PatternRegistry, description: &str) -> SignalSet {
    let category_scores = Category::ALL
        .into_iter()
        .map(|c| (c, registry.count_category(c, description)))
        .collect();

    SignalSet {
        urgency_matches: registry
            .urgency_matches(description)
            .into_iter()
            .map(str::to_owned)
            .collect(),
        category_scores,
        failure_matches: registry.failure_count(description),
    }
}
