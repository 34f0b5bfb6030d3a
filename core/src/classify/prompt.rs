use super::signals::SignalSet;
use super::{Category, Priority};
use std::fmt::Write;

/// Field names the model must answer with.
pub const CATEGORY_FIELD: &str = "suggested_category";
pub const PRIORITY_FIELD: &str = "suggested_priority";

/// A worked example embedded in the prompt.
#[derive(Debug, Clone, Copy)]
pub struct FewShotExample {
    pub input: &'static str,
    pub analysis: &'static str,
    pub category: Category,
    pub priority: Priority,
}

/// Immutable prompt template plus its few-shot examples.
#[derive(Debug)]
pub struct PromptSpec {
    pub instructions: &'static str,
    pub examples: &'static [FewShotExample],
}

const INSTRUCTIONS: &str = r"You classify customer support tickets. Assign exactly one category and exactly one priority.

# Categories

- `billing`: payments, invoices, refunds, charges, subscriptions, pricing, payment methods
- `technical`: bugs, errors, crashes, slowness, the app or API not working, downtime
- `account`: login, passwords, profile, permissions, access control, 2FA, account management
- `general`: questions, feedback, feature requests, documentation; use ONLY when nothing else fits

# Priorities

- `critical`: system down, data loss, security breach, risk to someone's safety, all users affected
- `high`: a major feature is broken with no workaround, or the customer expresses urgency
- `medium`: degraded experience with a workaround, or only some users affected
- `low`: cosmetic issues, feature requests, general questions with no urgency

# Escalation rules

1. Any urgency wording (urgent, ASAP, deadline, blocking, cannot wait, emergency) means at least `high`.
2. Production down, outage, data loss, security breach, or risk to life means `critical`.
3. Something broken or not working with no workaround means at least `high`.
4. Feature requests and questions without urgency are `low`.
5. When torn between two priorities, choose the higher one.";

const EXAMPLES: &[FewShotExample] = &[
    FewShotExample {
        input: "I was charged twice for my subscription this month. Please refund the duplicate charge.",
        analysis: "Duplicate charge is a payment issue, so billing. Money is affected but nothing is urgent, so medium.",
        category: Category::Billing,
        priority: Priority::Medium,
    },
    FewShotExample {
        input: "The app crashes every time I open the dashboard. Restarting did not help.",
        analysis: "A crash is a technical fault. No workaround exists, so high.",
        category: Category::Technical,
        priority: Priority::High,
    },
    FewShotExample {
        input: "I can't log in since I changed my password yesterday and the reset link shows an error.",
        analysis: "Login and password trouble is an account issue. The customer is locked out, so high.",
        category: Category::Account,
        priority: Priority::High,
    },
    FewShotExample {
        input: "It would be nice to have a dark mode in the settings page.",
        analysis: "A feature request fits general. Nothing is broken, so low.",
        category: Category::General,
        priority: Priority::Low,
    },
    FewShotExample {
        input: "Our whole team cannot reach the platform. Production is down and we need help immediately!",
        analysis: "Platform unreachable is technical. Production down plus urgency wording is critical.",
        category: Category::Technical,
        priority: Priority::Critical,
    },
];

static DEFAULT_SPEC: PromptSpec = PromptSpec {
    instructions: INSTRUCTIONS,
    examples: EXAMPLES,
};

impl PromptSpec {
    /// The built-in template used by the classifier.
    pub fn builtin() -> &'static Self {
        &DEFAULT_SPEC
    }
}

/// The exact JSON line the model is expected to produce.
pub fn expected_output(category: Category, priority: Priority) -> String {
    format!(r#"{{"{CATEGORY_FIELD}": "{category}", "{PRIORITY_FIELD}": "{priority}"}}"#)
}

fn render_examples(examples: &[FewShotExample]) -> String {
    let mut out = String::new();
    for (i, example) in examples.iter().enumerate() {
        let _ = write!(
            out,
            "### Example {}\nInput: \"{}\"\nAnalysis: {}\nOutput: {}\n\n",
            i + 1,
            example.input,
            example.analysis,
            expected_output(example.category, example.priority)
        );
    }
    out
}

/// Render the hint block, or an empty string when nothing matched.
fn render_signals(signals: &SignalSet) -> String {
    if signals.is_empty() {
        return String::new();
    }

    let mut out = String::from("# Extracted Signals\n\n");
    if !signals.urgency_matches.is_empty() {
        let _ = writeln!(
            out,
            "- Urgency terms: {}",
            signals.urgency_matches.join(", ")
        );
    }
    for (category, count) in signals.matched_categories() {
        let _ = writeln!(
            out,
            "- {} keywords: {count}",
            category.as_str().to_uppercase()
        );
    }
    out.push('\n');
    out
}

/// Compose the full prompt for one description.
pub fn build_prompt(spec: &PromptSpec, signals: &SignalSet, description: &str) -> String {
    let examples = render_examples(spec.examples);
    let signal_block = render_signals(signals);

    format!(
        r#"{instructions}

# Examples

{examples}{signal_block}# Ticket Description

{description}

# Response

First write one sentence of analysis. Then output ONLY a JSON object on its own line, using exactly these two fields and nothing else:
{{"{CATEGORY_FIELD}": "<billing|technical|account|general>", "{PRIORITY_FIELD}": "<low|medium|high|critical>"}}"#,
        instructions = spec.instructions,
    )
}
