use crate::classify::{Category, PatternRegistry};
use crate::cli::OutputFormat;
use crate::error::AppError;
use colored::Colorize;
use serde_json::json;

pub fn run(category: Option<&str>, format: OutputFormat) -> Result<(), AppError> {
    let categories = select_categories(category)?;
    let registry = PatternRegistry::global();

    if format == OutputFormat::Json {
        let keywords: serde_json::Map<String, serde_json::Value> = categories
            .iter()
            .map(|cat| {
                (
                    cat.as_str().to_owned(),
                    json!(registry.category_keywords(*cat)),
                )
            })
            .collect();
        let urgency: Vec<_> = registry
            .urgency_terms()
            .iter()
            .map(|t| json!({ "term": t.term, "extreme": t.extreme }))
            .collect();
        let output = json!({ "categories": keywords, "urgency": urgency });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for cat in &categories {
        println!("{}", cat.as_str().bold().cyan());
        for keyword in registry.category_keywords(*cat) {
            println!("  {}", keyword.green());
        }
        println!();
    }

    if category.is_none() {
        println!("{}", "urgency".bold().cyan());
        for term in registry.urgency_terms() {
            if term.extreme {
                println!("  {} {}", term.term.red(), "(critical)".dimmed());
            } else {
                println!("  {}", term.term.yellow());
            }
        }
    }

    Ok(())
}

fn select_categories(filter: Option<&str>) -> Result<Vec<Category>, AppError> {
    match filter {
        None => Ok(Category::ALL.to_vec()),
        Some(name) => name
            .parse::<Category>()
            .map(|cat| vec![cat])
            .map_err(|_| AppError::input(format!("Category '{name}' not found"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_categories() {
        assert_eq!(select_categories(None).unwrap(), Category::ALL.to_vec());
    }

    #[test]
    fn test_select_single_category_case_insensitive() {
        assert_eq!(
            select_categories(Some("Billing")).unwrap(),
            vec![Category::Billing]
        );
    }

    #[test]
    fn test_unknown_category_is_input_error() {
        let err = select_categories(Some("hardware")).unwrap_err();
        assert!(matches!(err, AppError::Input { .. }));
        assert!(err.to_string().contains("'hardware' not found"));
    }
}
