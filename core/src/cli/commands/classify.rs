use crate::ai::ModelClient;
use crate::classify::{ClassificationRequest, Classifier, Outcome};
use crate::cli::OutputFormat;
use crate::config::Settings;
use crate::error::AppError;
use crate::Source;
use colored::Colorize;
use std::io::BufRead;
use std::sync::Arc;

pub fn run(
    settings: &Settings,
    descriptions: Vec<String>,
    read_stdin: bool,
    offline: bool,
    concurrency: usize,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mut inputs = descriptions;
    if read_stdin {
        inputs.extend(read_descriptions(std::io::stdin().lock())?);
    }
    if inputs.is_empty() {
        return Err(AppError::input(
            "No descriptions given. Pass them as arguments or use --stdin.",
        ));
    }

    let use_model = !offline && settings.api_key.is_some();
    if format == OutputFormat::Text && !use_model {
        eprintln!("{}", "Using keyword heuristics (no model)".dimmed());
    }

    let rt = tokio::runtime::Runtime::new()?;
    let outcomes = if use_model {
        rt.block_on(classify_all(
            Classifier::from_settings(settings),
            inputs.clone(),
            concurrency,
        ))
    } else {
        rt.block_on(classify_all(
            Classifier::offline().with_fallback_mode(settings.fallback_mode),
            inputs.clone(),
            concurrency,
        ))
    };

    if format == OutputFormat::Json {
        let results: Vec<_> = outcomes.into_iter().map(Outcome::into_result).collect();
        let output = if results.len() == 1 {
            serde_json::to_string_pretty(&results[0])?
        } else {
            serde_json::to_string_pretty(&results)?
        };
        println!("{output}");
        return Ok(());
    }

    for (description, outcome) in inputs.iter().zip(&outcomes) {
        let result = outcome.result();
        let source = match result.source {
            Source::Model => "model".green(),
            Source::Fallback => "fallback".yellow(),
        };
        println!(
            "{} / {}  [{}]  {}",
            result.category.as_str().cyan(),
            result.priority.as_str().bold(),
            source,
            preview(description, 60).as_str().dimmed()
        );
        if let Some(warning) = &result.warning {
            println!("  {} {}", "warning:".yellow(), warning);
        }
    }

    Ok(())
}

async fn classify_all<M: ModelClient + 'static>(
    classifier: Classifier<M>,
    inputs: Vec<String>,
    concurrency: usize,
) -> Vec<Outcome> {
    Arc::new(classifier).classify_many(inputs, concurrency).await
}

/// One description per non-blank line; JSON request objects are unwrapped.
fn read_descriptions(reader: impl BufRead) -> Result<Vec<String>, AppError> {
    let mut out = Vec::new();
    for line in reader.lines() {
        if let Some(description) = parse_line(&line?) {
            out.push(description);
        }
    }
    Ok(out)
}

fn parse_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('{') {
        if let Ok(request) = serde_json::from_str::<ClassificationRequest>(trimmed) {
            return Some(request.description);
        }
    }
    Some(trimmed.to_owned())
}

fn preview(text: &str, max: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max {
        single_line
    } else {
        let cut: String = single_line.chars().take(max).collect();
        format!("{cut}...")
    }
}
