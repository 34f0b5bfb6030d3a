use crate::classify::Classifier;
use crate::error::AppError;

/// Print the exact prompt the model would receive.
pub fn run(description: &str) -> Result<(), AppError> {
    if description.trim().is_empty() {
        return Err(AppError::input("Description is empty"));
    }
    println!("{}", Classifier::offline().prompt(description));
    Ok(())
}
