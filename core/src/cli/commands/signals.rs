use crate::classify::{extract_signals, PatternRegistry};
use crate::cli::OutputFormat;
use crate::error::AppError;
use colored::Colorize;

pub fn run(description: &str, format: OutputFormat) -> Result<(), AppError> {
    let registry = PatternRegistry::global();
    let signals = extract_signals(registry, description);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&signals)?);
        return Ok(());
    }

    if signals.urgency_matches.is_empty() {
        println!("{}", "No urgency terms".dimmed());
    } else {
        println!("{}", "Urgency terms:".bold());
        for term in &signals.urgency_matches {
            let marker = if registry.is_extreme(term) {
                " (extreme)".red().to_string()
            } else {
                String::new()
            };
            println!("  {term}{marker}");
        }
    }

    println!("{}", "Category keyword hits:".bold());
    for (category, count) in &signals.category_scores {
        println!("  {:<10} {count}", category.as_str());
    }
    println!("{} {}", "Failure wording:".bold(), signals.failure_matches);

    Ok(())
}
