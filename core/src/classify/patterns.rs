//! Fixed keyword and urgency vocabularies used for signal extraction.
//!
//! Each vocabulary is compiled once into a single case-insensitive,
//! word-bounded alternation so matches never overlap. The process-wide
//! instance is built lazily on first use and never mutated afterwards.

use super::Category;
use regex::Regex;
use std::sync::LazyLock;

/// One urgency phrase: the canonical term reported in signals, the regex
/// fragment that recognizes it, and whether it alone forces `critical`.
#[derive(Debug, Clone, Copy)]
pub struct UrgencyTerm {
    pub term: &'static str,
    pub pattern: &'static str,
    pub extreme: bool,
}

const fn urgency(term: &'static str, pattern: &'static str, extreme: bool) -> UrgencyTerm {
    UrgencyTerm {
        term,
        pattern,
        extreme,
    }
}

// Longer phrases come before their substrings ("production down" before
// "down") because alternation is leftmost-first.
const URGENCY_TERMS: &[UrgencyTerm] = &[
    urgency("production down", r"prod(?:uction)?\s+(?:is\s+|went\s+)?down", true),
    urgency("someone can die", r"someone\s+(?:can|could|may|might)\s+die", true),
    urgency("life-threatening", r"life[\s-]?threatening", true),
    urgency("death", r"death|dying|die", true),
    urgency("emergency", r"emergenc(?:y|ies)", true),
    urgency("data loss", r"data[\s-]?loss|lost\s+(?:all\s+)?(?:our\s+|my\s+)?data", true),
    urgency("security breach", r"security\s+breach|breach(?:ed|es)?", true),
    urgency("outage", r"outages?", true),
    urgency("urgent", r"urgent(?:ly)?", false),
    urgency("critical", r"critical", false),
    urgency("asap", r"asap", false),
    urgency("immediately", r"immediate(?:ly)?", false),
    urgency("very important", r"very[\s,]+(?:very\s+)?important", false),
    urgency("deadline", r"deadlines?", false),
    urgency("cannot wait", r"(?:cannot|can't|can\s+not)\s+wait", false),
    urgency("right now", r"right\s+now", false),
    urgency("end of day", r"end\s+of\s+(?:the\s+)?day|eod", false),
    urgency("blocking", r"blocking|blocker", false),
    urgency("down", r"down", false),
];

const BILLING_KEYWORDS: &[&str] = &[
    r"payments?",
    r"invoices?",
    r"refund(?:s|ed)?",
    r"charge[sd]?",
    r"billed|billing|bill",
    r"subscriptions?",
    r"pricing|price",
    r"credit[\s-]?card",
    r"transactions?",
    r"receipts?",
    r"plan",
    r"upgrade|downgrade",
    r"costs?",
    r"fees?",
];

const TECHNICAL_KEYWORDS: &[&str] = &[
    r"bugs?",
    r"errors?",
    r"crash(?:es|ed|ing)?",
    r"slow",
    r"performance",
    r"api",
    r"integration",
    r"not\s+(?:working|loading|starting)",
    r"broken",
    r"fail(?:s|ed|ing|ure)?",
    r"exception",
    r"time[\s-]?outs?|timed\s+out",
    r"500|404",
    r"deploy(?:ment)?",
    r"servers?",
    r"database",
    r"app|application",
    r"software",
    r"platform",
    r"production",
    r"down",
    r"outages?",
];

const ACCOUNT_KEYWORDS: &[&str] = &[
    r"log[\s-]?in|login",
    r"passwords?",
    r"reset",
    r"accounts?",
    r"profile",
    r"permissions?",
    r"access",
    r"sign[\s-]?(?:in|up)",
    r"register",
    r"two[\s-]?factor|2fa|mfa",
    r"username",
    r"locked\s+out",
    r"verify|verification",
    r"auth|authenticate",
];

const GENERAL_KEYWORDS: &[&str] = &[
    r"questions?",
    r"feedback",
    r"suggestions?",
    r"feature\s+requests?",
    r"documentation|docs",
    r"how\s+do\s+i",
    r"would\s+be\s+nice",
    r"roadmap",
];

/// Generic failure vocabulary; raises priority even without urgency words.
const FAILURE_KEYWORDS: &[&str] = &[
    r"not\s+working",
    r"doesn't\s+work",
    r"broken",
    r"fail(?:s|ed|ing|ure)?",
    r"crash(?:es|ed|ing)?",
    r"errors?",
    r"cannot|can't|can\s+not",
    r"won't",
];

static GLOBAL: LazyLock<PatternRegistry> = LazyLock::new(|| {
    PatternRegistry::new().expect("built-in pattern vocabularies are valid regexes")
});

/// Compiled vocabularies, shared read-only across all classifications.
#[derive(Debug)]
pub struct PatternRegistry {
    categories: Vec<(Category, &'static [&'static str], Regex)>,
    urgency: Regex,
    failure: Regex,
}

fn builtin_keywords(category: Category) -> &'static [&'static str] {
    match category {
        Category::Billing => BILLING_KEYWORDS,
        Category::Technical => TECHNICAL_KEYWORDS,
        Category::Account => ACCOUNT_KEYWORDS,
        Category::General => GENERAL_KEYWORDS,
    }
}

fn keyword_alternation(fragments: &[&str]) -> Result<Regex, regex::Error> {
    let body = fragments
        .iter()
        .map(|f| format!("(?:{f})"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{body})\b"))
}

impl PatternRegistry {
    /// Compile the built-in vocabularies.
    pub fn new() -> Result<Self, regex::Error> {
        let mut categories = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let keywords = builtin_keywords(category);
            categories.push((category, keywords, keyword_alternation(keywords)?));
        }

        // One capture group per term, in declaration order.
        let body = URGENCY_TERMS
            .iter()
            .map(|t| format!("({})", t.pattern))
            .collect::<Vec<_>>()
            .join("|");
        let urgency = Regex::new(&format!(r"(?i)\b(?:{body})\b"))?;

        Ok(Self {
            categories,
            urgency,
            failure: keyword_alternation(FAILURE_KEYWORDS)?,
        })
    }

    /// The process-wide registry.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Replace one category's keyword fragments, keeping everything else.
    pub fn with_category_keywords(
        mut self,
        category: Category,
        keywords: &'static [&'static str],
    ) -> Result<Self, regex::Error> {
        let regex = keyword_alternation(keywords)?;
        if let Some(entry) = self.categories.iter_mut().find(|(c, _, _)| *c == category) {
            *entry = (category, keywords, regex);
        }
        Ok(self)
    }

    pub fn category_keywords(&self, category: Category) -> &'static [&'static str] {
        self.categories
            .iter()
            .find(|(c, _, _)| *c == category)
            .map(|(_, keywords, _)| *keywords)
            .unwrap_or_default()
    }

    pub fn urgency_terms(&self) -> &'static [UrgencyTerm] {
        URGENCY_TERMS
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.iter().map(|(c, _, _)| *c)
    }

    /// Number of non-overlapping keyword hits for `category`.
    pub fn count_category(&self, category: Category, text: &str) -> usize {
        self.categories
            .iter()
            .find(|(c, _, _)| *c == category)
            .map_or(0, |(_, _, re)| re.find_iter(text).count())
    }

    /// Distinct canonical urgency terms, in order of first appearance.
    pub fn urgency_matches(&self, text: &str) -> Vec<&'static str> {
        let mut found: Vec<&'static str> = Vec::new();
        for caps in self.urgency.captures_iter(text) {
            let Some(idx) = caps.iter().skip(1).position(|m| m.is_some()) else {
                continue;
            };
            let term = URGENCY_TERMS[idx].term;
            if !found.contains(&term) {
                found.push(term);
            }
        }
        found
    }

    pub fn is_extreme(&self, term: &str) -> bool {
        URGENCY_TERMS.iter().any(|t| t.extreme && t.term == term)
    }

    pub fn failure_count(&self, text: &str) -> usize {
        self.failure.find_iter(text).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_compile() {
        let registry = PatternRegistry::new().unwrap();
        let order: Vec<Category> = registry.categories().collect();
        assert_eq!(order, Category::ALL.to_vec());
    }

    #[test]
    fn test_category_matching_is_case_insensitive_and_word_bounded() {
        let registry = PatternRegistry::global();
        assert_eq!(
            registry.count_category(Category::Billing, "REFUND my Invoice"),
            2
        );
        // "application" must not also count as "app"
        assert_eq!(
            registry.count_category(Category::Technical, "the application"),
            1
        );
        assert_eq!(registry.count_category(Category::Billing, "billboard"), 0);
    }

    #[test]
    fn test_urgency_prefers_longest_phrase() {
        let registry = PatternRegistry::global();
        assert_eq!(
            registry.urgency_matches("Production is down right now"),
            vec!["production down", "right now"]
        );
        assert_eq!(registry.urgency_matches("the server is down"), vec!["down"]);
    }

    #[test]
    fn test_urgency_matches_are_distinct() {
        let registry = PatternRegistry::global();
        assert_eq!(
            registry.urgency_matches("Urgent! URGENT! asap, urgently"),
            vec!["urgent", "asap"]
        );
    }

    #[test]
    fn test_deadline_is_not_death() {
        let registry = PatternRegistry::global();
        assert_eq!(registry.urgency_matches("the deadline is friday"), vec!["deadline"]);
    }

    #[test]
    fn test_extreme_subset() {
        let registry = PatternRegistry::global();
        assert!(registry.is_extreme("outage"));
        assert!(registry.is_extreme("security breach"));
        assert!(registry.is_extreme("death"));
        assert!(!registry.is_extreme("urgent"));
        assert!(!registry.is_extreme("down"));
    }

    #[test]
    fn test_override_category_keywords() {
        let registry = PatternRegistry::new()
            .unwrap()
            .with_category_keywords(Category::Billing, &[r"vouchers?"])
            .unwrap();
        assert_eq!(registry.category_keywords(Category::Billing), &[r"vouchers?"]);
        assert_eq!(
            registry.count_category(Category::Billing, "my voucher and refund"),
            1
        );
        assert_eq!(
            registry.category_keywords(Category::Technical),
            PatternRegistry::global().category_keywords(Category::Technical)
        );
    }

    #[test]
    fn test_failure_vocabulary() {
        let registry = PatternRegistry::global();
        assert_eq!(registry.failure_count("search is broken"), 1);
        assert_eq!(registry.failure_count("it crashes and I can't log in"), 2);
        assert_eq!(registry.failure_count("please add dark mode"), 0);
    }
}
